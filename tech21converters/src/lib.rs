//!
//! # Tech21 Converters
//!
//! The core logic behind the `gentech` and `techconv` programs.
//! Each lives in a library module so that it can be tested without a process boundary.
//!

pub mod conversion;
pub mod generate;
