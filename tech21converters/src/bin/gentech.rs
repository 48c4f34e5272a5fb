//!
//! # gentech
//!
//! Generates the technology files of every bundled PDK.
//!

use clap::Parser;
use log::info;
use std::error::Error;
use std::path::PathBuf;

use tech21converters::generate::{generate, GenOptions};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// Technology File Generator.
/// Writes `<pdk>_tech.pb.json`, `<pdk>_tech.binpb` and `<pdk>_tech.txtpb` for each bundled PDK.
#[derive(Parser)]
struct ProgramOptions {
    /// Output Directory. Created if it does not exist.
    output_dir: PathBuf,
}

impl From<&ProgramOptions> for GenOptions {
    fn from(options: &ProgramOptions) -> Self {
        GenOptions::new(&options.output_dir)
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let options = ProgramOptions::parse();
    _main(&options)
}

fn _main(options: &ProgramOptions) -> Result<(), Box<dyn Error>> {
    let written = generate(&options.into())?;
    info!("Generated {} technology files", written.len());
    Ok(())
}
