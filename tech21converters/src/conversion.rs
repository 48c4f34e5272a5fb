//!
//! # Technology Format Conversion
//! The core logic for `techconv`.
//!

// Std-Lib Imports
use std::error::Error;
use std::path::{Path, PathBuf};

// Local Imports
use tech21::Format;
use tech21utils::EnumStr;

/// # Conversion Options
///
/// Formats left as `None` are inferred from file extensions.
///
pub struct ConvOptions {
    /// Input File
    pub input: PathBuf,
    /// Input Format
    pub input_format: Option<Format>,
    /// Output File
    pub output: PathBuf,
    /// Output Format
    pub output_format: Option<Format>,
    /// Verbose Output Mode
    pub verbose: bool,
}

/// Core implementation, converting an on-disk technology file between formats.
pub fn convert(options: &ConvOptions) -> Result<(), Box<dyn Error>> {
    let input_format = resolve_format(&options.input, options.input_format)?;
    let output_format = resolve_format(&options.output, options.output_format)?;
    tech21::format::convert(&options.input, input_format, &options.output, output_format)?;

    if options.verbose {
        println!(
            "wrote {:?} ({})",
            &options.output,
            output_format.describe()
        );
    }
    Ok(())
}

/// Use `explicit` if provided, otherwise infer from the extension of `path`
pub fn resolve_format(path: &Path, explicit: Option<Format>) -> Result<Format, Box<dyn Error>> {
    match explicit.or_else(|| Format::from_path(path)) {
        Some(format) => Ok(format),
        None => Err(format!(
            "Cannot infer the format of '{}'. Specify one of ({}).",
            path.display(),
            format_names()
        )
        .into()),
    }
}

/// Parse a [Format] from its name. Suitable as a `clap` value-parser.
pub fn parse_format(name: &str) -> Result<Format, String> {
    Format::from_str(&name.to_lowercase())
        .ok_or_else(|| format!("Invalid format: {}. Must be one of ({}).", name, format_names()))
}

fn format_names() -> String {
    Format::variants()
        .iter()
        .map(|f| f.to_str())
        .collect::<Vec<_>>()
        .join(", ")
}
