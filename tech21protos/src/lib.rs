//!
//! # Tech21 ProtoBuf Definitions
//!
//! Message types for the `kpex.tech` process-technology schema (`proto/tech.proto`),
//! plus conversions to and from its binary and text encodings.
//!

pub mod conv;
pub mod tech;

// Public re-exports
pub use conv::{from_bytes, from_text, message_descriptor, to_bytes, to_text, TextFormatError};
pub use tech::*;
