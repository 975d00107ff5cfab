//! Error types for PNG chunk handling.

use thiserror::Error;

/// Errors that can occur when reading or rewriting PNG chunks.
#[derive(Debug, Error)]
pub enum Error {
    /// Common library error.
    #[error("{0}")]
    Common(#[from] charapng_common::Error),

    /// The 8-byte PNG signature did not match.
    #[error("invalid PNG signature: got {actual:02x?}")]
    InvalidSignature { actual: Vec<u8> },

    /// A chunk header or declared chunk length runs past the end of the data.
    #[error("truncated chunk at offset {offset}: needed {needed} bytes but only {available} available")]
    Truncated {
        offset: usize,
        needed: usize,
        available: usize,
    },

    /// The chunk sequence ended without an IEND chunk.
    #[error("PNG stream has no IEND chunk")]
    MissingIend,

    /// A text chunk has no null byte separating keyword and text.
    #[error("text chunk has no keyword separator")]
    MissingKeywordSeparator,

    /// A text chunk is shorter than its fixed fields require.
    #[error("malformed {chunk_type} chunk: {reason}")]
    MalformedText {
        chunk_type: &'static str,
        reason: &'static str,
    },

    /// Unsupported text compression method.
    #[error("unsupported compression method: {0}")]
    UnsupportedCompression(u8),

    /// Decompression error.
    #[error("decompression error: {0}")]
    Decompression(String),

    /// UTF-8 decoding error.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl Error {
    /// Whether this error describes a malformed chunk sequence.
    ///
    /// Writers must refuse to produce output when this is true.
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Truncated { .. } | Error::MissingIend)
    }
}

/// Result type for PNG chunk operations.
pub type Result<T> = std::result::Result<T, Error>;
