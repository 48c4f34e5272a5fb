//!
//! # Build Module
//!
//! Expands the protobuf definitions, and saves their encoded descriptors
//! for the reflection-based text format.
//!

use std::path::PathBuf;

fn main() {
    let out_dir = PathBuf::from(std::env::var("OUT_DIR").unwrap());

    // Create the Prost config
    let mut config = prost_build::Config::new();
    config.file_descriptor_set_path(out_dir.join("tech_descriptor.bin"));

    // And build!
    config
        .compile_protos(&["proto/tech.proto"], &["proto/"])
        .unwrap();
    println!("cargo:rerun-if-changed=proto/tech.proto");
}
