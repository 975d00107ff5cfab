//! Character card detection, decoding and embedding for PNG images.
//!
//! A character card is a PNG whose text metadata carries a JSON character
//! record. Four encodings are recognised, tried in this order:
//!
//! - **V3**: base64 JSON in a `tEXt`/`zTXt` chunk with keyword `ccv3`
//! - **V2**: base64 JSON in a `tEXt`/`zTXt` chunk with keyword `chara`
//! - **Legacy V1**: plain JSON under `chara` in the image's text metadata
//! - **Stable Diffusion**: a `parameters` text entry, turned into a
//!   read-only record
//!
//! Writing always produces a V2 `tEXt` chunk. All other chunks are kept
//! byte-for-byte.
//!
//! # Quick Start
//!
//! ```no_run
//! use charapng_card::{decode_file, write_card, DecodeOutcome};
//!
//! if let DecodeOutcome::Card(mut card) = decode_file("Aria.png") {
//!     println!("{} ({})", card.record.display_name(), card.variant);
//!
//!     if let Some(data) = card.record.data.as_mut() {
//!         data.creator = Some("me".to_string());
//!     }
//!     write_card("Aria.png", &card.record)?;
//! }
//! # Ok::<(), charapng_card::Error>(())
//! ```
//!
//! # Batch Operations
//!
//! ```no_run
//! use charapng_card::{collect_pngs, scan_cards};
//!
//! let paths = collect_pngs("cards/");
//! for entry in scan_cards(&paths, |done, total| eprintln!("{done}/{total}")) {
//!     println!("{}: {}", entry.path.display(), entry.display_name());
//! }
//! ```

mod batch;
mod book;
mod decode;
mod encode;
mod error;
mod lenient;
mod naming;
mod persist;
mod record;
mod variant;
mod workspace;

pub mod fallback;

pub use batch::{collect_pngs, export_cards, scan_cards, CardEntry, ExportStats};
pub use book::{book_file_name, export_book, to_pretty_json, write_pretty_json};
pub use decode::{
    decode_bytes, decode_card_text, decode_file, fallback_candidate, scan_chunks,
    CandidateError, CardDecoder, ChunkScan, DecodeOutcome, DecodedCard,
};
pub use encode::{
    card_payload, encode_bytes, export_card, write_card, CCV3_KEYWORD, CHARA_KEYWORD,
};
pub use error::{Error, Result};
pub use fallback::{ChunkTextMetadata, TextMetadata, TextMetadataSource};
pub use naming::{safe_file_stem, unique_path};
pub use record::{
    split_lines, split_tags, BookEntry, CardData, CharacterBook, CharacterRecord, SPEC_V2,
    SPEC_VERSION_V2,
};
pub use variant::FormatVariant;
pub use workspace::{CardWorkspace, BOOKS_DIR, CARDS_DIR};

// Re-export the chunk layer for callers that need raw access
pub use charapng_png as png;
