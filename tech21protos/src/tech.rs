//!
//! # Technology Protobuf Definitions
//!
//! Prost message types for `proto/tech.proto`, package `kpex.tech`,
//! expanded at build time.
//!

// Include the prost-expanded proto-file content
include!(concat!(env!("OUT_DIR"), "/kpex.tech.rs"));

/// Full name of the top-level message
pub const TECHNOLOGY_MESSAGE: &str = "kpex.tech.Technology";

/// Encoded `FileDescriptorSet` of `proto/tech.proto`
pub const FILE_DESCRIPTOR_SET: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/tech_descriptor.bin"));
