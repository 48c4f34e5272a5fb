//!
//! # techconv
//!
//! Converts a technology file between its JSON, protobuf-binary and protobuf-text forms.
//!

use clap::Parser;
use std::error::Error;
use std::path::PathBuf;

use tech21::Format;
use tech21converters::conversion::{convert, parse_format, ConvOptions};

// => The doc-comment on `ProgramOptions` here is displayed by the `clap`-generated help docs =>

/// Technology File Format Converter.
/// Formats not given are inferred from the file extensions (`.pb.json`, `.binpb`, `.txtpb`).
#[derive(Parser)]
struct ProgramOptions {
    /// Input File
    #[arg(short = 'i', long)]
    input: PathBuf,
    /// Output File
    #[arg(short = 'o', long)]
    output: PathBuf,
    /// Input Format. One of (json, binary, text)
    #[arg(long, value_parser = parse_format)]
    input_format: Option<Format>,
    /// Output Format. One of (json, binary, text)
    #[arg(long, value_parser = parse_format)]
    output_format: Option<Format>,
    /// Verbose Output Mode
    #[arg(short, long)]
    verbose: bool,
}

impl Into<ConvOptions> for ProgramOptions {
    fn into(self) -> ConvOptions {
        ConvOptions {
            input: self.input,
            input_format: self.input_format,
            output: self.output,
            output_format: self.output_format,
            verbose: self.verbose,
        }
    }
}

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::init();
    let options = ProgramOptions::parse();
    convert(&options.into())
}
