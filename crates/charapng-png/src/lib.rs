//! PNG chunk handling for charapng.
//!
//! This crate works purely at the chunk level; pixel data is never decoded.
//! It provides:
//!
//! - [`ChunkStream`] - lazy, signature-checked iteration over raw chunks
//! - [`TextChunk`] - parsing of `tEXt`, `zTXt` and `iTXt` payloads
//! - [`ChunkSurgeon`] - replacement of text metadata chunks with every other
//!   chunk preserved byte-for-byte
//!
//! # File Format
//!
//! A PNG is an 8-byte signature followed by chunks of the form:
//! - 4 bytes: data length (big-endian)
//! - 4 bytes: chunk type (ASCII)
//! - N bytes: data
//! - 4 bytes: CRC-32 over type and data (big-endian)
//!
//! The last chunk is always `IEND`.
//!
//! # Example
//!
//! ```no_run
//! use charapng_png::{ChunkStream, TextChunk};
//!
//! let data = std::fs::read("card.png")?;
//!
//! for chunk in ChunkStream::open(&data)? {
//!     let chunk = chunk?;
//!     if let Ok(Some(text)) = TextChunk::parse(&chunk) {
//!         println!("{}: {} bytes", text.keyword_str(), chunk.data().len());
//!     }
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod chunk;
mod error;
mod surgery;
mod write;

pub mod inflate;
pub mod text;

pub use chunk::{is_png, read_chunks, ChunkStream, ChunkType, RawChunk};
pub use error::{Error, Result};
pub use surgery::{ChunkSurgeon, Rewritten};
pub use text::{text_payload, TextChunk};
pub use write::write_chunk;

/// The 8-byte PNG file signature.
pub const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];
