//!
//! # Technology Generation
//! The core logic for `gentech`.
//!

// Std-Lib Imports
use std::error::Error;
use std::path::{Path, PathBuf};

// Crates.io Imports
use log::{debug, info};

// Local Imports
use tech21::{Format, TechResult, Technology, ValidationMode};
use tech21pdks::Pdk;
use tech21utils::EnumStr;

/// # Generation Options
pub struct GenOptions {
    /// Output Directory
    pub output_dir: PathBuf,
    /// PDKs to generate. Empty means all bundled PDKs.
    pub pdks: Vec<Pdk>,
}
impl GenOptions {
    /// Options generating every bundled PDK into `output_dir`
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            pdks: Vec::new(),
        }
    }
    fn pdks(&self) -> &[Pdk] {
        if self.pdks.is_empty() {
            Pdk::variants()
        } else {
            &self.pdks
        }
    }
}

/// Path of `tech`'s output file in `format`, within `dir`
pub fn output_path(dir: impl AsRef<Path>, tech: &Technology, format: Format) -> PathBuf {
    dir.as_ref()
        .join(format!("{}_tech.{}", tech.name, format.extension()))
}

/// Write `tech` to `dir` in every [Format]. Returns the written paths.
pub fn write_all_formats(tech: &Technology, dir: impl AsRef<Path>) -> TechResult<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(Format::variants().len());
    for format in Format::variants() {
        let path = output_path(&dir, tech, *format);
        tech.write(&path, *format)?;
        paths.push(path);
    }
    Ok(paths)
}

/// Core implementation: build, strictly validate and write each requested PDK.
/// Returns the written paths, in PDK then format order.
pub fn generate(options: &GenOptions) -> Result<Vec<PathBuf>, Box<dyn Error>> {
    let dir = &options.output_dir;
    if dir.exists() && !dir.is_dir() {
        return Err(format!(
            "Output path '{}' exists, but is not a directory",
            dir.display()
        )
        .into());
    }
    std::fs::create_dir_all(dir)?;
    info!("Generating technology files in '{}'", dir.display());

    let mut written = Vec::new();
    for pdk in options.pdks() {
        let tech = pdk.build()?;
        tech.check(ValidationMode::Strict)?;
        debug!("Technology `{}` validated", tech.name);
        written.extend(write_all_formats(&tech, dir)?);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generates_every_pdk() -> Result<(), Box<dyn Error>> {
        let scratch = tempfile::tempdir()?;
        let dir = scratch.path().join("nested").join("out");
        let written = generate(&GenOptions::new(&dir))?;
        assert_eq!(written.len(), Pdk::variants().len() * Format::variants().len());
        for fname in [
            "sky130A_tech.pb.json",
            "sky130A_tech.binpb",
            "sky130A_tech.txtpb",
            "ihp_sg13g2_tech.pb.json",
            "gf180mcuD_tech.txtpb",
        ] {
            assert!(dir.join(fname).is_file(), "missing {}", fname);
        }
        let back = Technology::read(dir.join("ihp_sg13g2_tech.binpb"), Format::Binary)?;
        assert_eq!(back, Pdk::IhpSg13g2.build()?);
        Ok(())
    }

    #[test]
    fn selected_pdks_only() -> Result<(), Box<dyn Error>> {
        let scratch = tempfile::tempdir()?;
        let mut options = GenOptions::new(scratch.path());
        options.pdks = vec![Pdk::Gf180mcuD];
        let written = generate(&options)?;
        assert_eq!(written.len(), 3);
        assert!(!scratch.path().join("sky130A_tech.pb.json").exists());
        Ok(())
    }

    #[test]
    fn output_path_is_a_file() -> Result<(), Box<dyn Error>> {
        let scratch = tempfile::tempdir()?;
        let file = scratch.path().join("taken");
        std::fs::write(&file, "occupied")?;
        let err = generate(&GenOptions::new(&file)).unwrap_err();
        assert!(err.to_string().contains("not a directory"));
        assert_eq!(std::fs::read_to_string(&file)?, "occupied");
        Ok(())
    }
}
