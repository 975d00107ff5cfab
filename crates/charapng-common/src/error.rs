//! Error types for charapng-common.

use thiserror::Error;

/// Common error type for charapng operations.
#[derive(Debug, Error)]
pub enum Error {
    /// End of buffer reached while reading.
    #[error("unexpected end of buffer at offset {offset}: needed {needed} bytes but only {available} available")]
    UnexpectedEof {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// Missing null separator in a byte string.
    #[error("missing null separator")]
    MissingNullSeparator,
}

/// Result type alias using the common Error type.
pub type Result<T> = std::result::Result<T, Error>;
