//! Error types for card encoding and file operations.

use thiserror::Error;

/// Errors that can occur when writing or exporting character cards.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// PNG chunk error.
    #[error("{0}")]
    Png(#[from] charapng_png::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// The record came from Stable Diffusion parameters and cannot be saved.
    #[error("Stable Diffusion cards are read-only and cannot be saved")]
    ReadOnly,

    /// The record has no character book to export.
    #[error("character has no world book")]
    NoBook,
}

impl Error {
    /// Whether the source PNG was malformed (truncated chunk or missing IEND).
    pub fn is_structural(&self) -> bool {
        matches!(self, Error::Png(e) if e.is_structural())
    }
}

/// Result type for card operations.
pub type Result<T> = std::result::Result<T, Error>;
