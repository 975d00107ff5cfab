//! Charapng - character card reading and writing for PNG images.
//!
//! This crate provides a unified interface to the charapng crates.
//!
//! # Crates
//!
//! - [`charapng_common`] - Common utilities (big-endian reading, CRC-32)
//! - [`charapng_png`] - PNG chunk streaming, text chunks and chunk surgery
//! - [`charapng_card`] - Card detection, decoding, embedding and batch tools
//!
//! # Example
//!
//! ```no_run
//! use charapng::prelude::*;
//!
//! match decode_file("Aria.png") {
//!     DecodeOutcome::Card(card) => {
//!         println!("{} [{}]", card.record.display_name(), card.variant);
//!
//!         if card.record.character_book().is_some() {
//!             let path = export_book(&card.record, "World_Books")?;
//!             println!("World book written to {}", path.display());
//!         }
//!     }
//!     DecodeOutcome::NoData => println!("Plain image"),
//!     DecodeOutcome::InvalidImage(reason) => println!("Not a PNG: {}", reason),
//! }
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

// Re-export all sub-crates
pub use charapng_card as card;
pub use charapng_common as common;
pub use charapng_png as png;

/// Prelude module for convenient imports.
pub mod prelude {
    pub use charapng_card::{
        collect_pngs, decode_bytes, decode_file, encode_bytes, export_book, export_card,
        export_cards, scan_cards, to_pretty_json, write_card, BookEntry, CardData, CardEntry,
        CardWorkspace, CharacterBook, CharacterRecord, DecodeOutcome, DecodedCard, ExportStats,
        FormatVariant,
    };
    pub use charapng_common::{crc, BinaryReader};
    pub use charapng_png::{ChunkStream, ChunkSurgeon, ChunkType, TextChunk};
}

// Re-export commonly used types at the crate root
pub use charapng_card::{CharacterRecord, DecodeOutcome, Error, Result};

/// Version information.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
