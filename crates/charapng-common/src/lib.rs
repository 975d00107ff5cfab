//! Common utilities for charapng.
//!
//! This crate provides the foundational pieces shared by the other charapng crates:
//!
//! - [`BinaryReader`] - Zero-copy big-endian reading from byte slices
//! - [`crc`] - PNG CRC-32 hashing utilities

mod error;
mod reader;

pub mod crc;

pub use error::{Error, Result};
pub use reader::BinaryReader;

/// Re-export memchr for fast byte searching
pub use memchr;
