//! Card embedding.
//!
//! Cards are always written as a V2 `tEXt` chunk with keyword `chara`
//! holding base64 of compact JSON, whatever variant they were read from.
//! Existing `chara` and `ccv3` chunks are removed so the written card is the
//! only one a reader can find.

use std::fs;
use std::path::Path;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use charapng_png::{text_payload, ChunkSurgeon, Rewritten};
use tracing::{info, warn};

use crate::persist::write_atomic;
use crate::record::CharacterRecord;
use crate::{Error, Result};

/// Keyword of V2 card chunks.
pub const CHARA_KEYWORD: &str = "chara";

/// Keyword of V3 card chunks.
pub const CCV3_KEYWORD: &str = "ccv3";

/// The surgeon that strips every existing card chunk.
fn card_surgeon() -> ChunkSurgeon {
    ChunkSurgeon::new([CHARA_KEYWORD, CCV3_KEYWORD])
}

/// Build the `tEXt` payload (keyword, NUL, base64 JSON) for a record.
pub fn card_payload(record: &CharacterRecord) -> Result<Vec<u8>> {
    if record.is_read_only() {
        return Err(Error::ReadOnly);
    }

    let json = serde_json::to_string(record)?;
    let encoded = STANDARD.encode(json.as_bytes());

    Ok(text_payload(CHARA_KEYWORD, encoded.as_bytes()))
}

/// Embed `record` into an in-memory PNG, returning the new file bytes.
pub fn encode_bytes(png: &[u8], record: &CharacterRecord) -> Result<Rewritten> {
    let payload = card_payload(record)?;
    Ok(card_surgeon().rewrite(png, &payload)?)
}

/// Embed `record` into the PNG at `path`, replacing the file.
///
/// The new bytes are fully built first and then swapped in by rename, so a
/// failure at any step leaves the original file unmodified.
pub fn write_card<P: AsRef<Path>>(path: P, record: &CharacterRecord) -> Result<()> {
    let path = path.as_ref();

    if record.is_read_only() {
        return Err(Error::ReadOnly);
    }

    let png = fs::read(path)?;
    let rewritten = encode_bytes(&png, record)?;
    write_atomic(path, &rewritten.bytes)?;

    info!(
        path = %path.display(),
        name = record.display_name(),
        replaced = rewritten.dropped,
        bytes = rewritten.bytes.len(),
        "wrote card"
    );

    Ok(())
}

/// Write `record` into a copy of `source` at `dest`.
///
/// The source file is never modified. If embedding fails, `dest` is removed.
pub fn export_card<P: AsRef<Path>, Q: AsRef<Path>>(
    source: P,
    dest: Q,
    record: &CharacterRecord,
) -> Result<()> {
    let source = source.as_ref();
    let dest = dest.as_ref();

    if record.is_read_only() {
        return Err(Error::ReadOnly);
    }

    if same_file(source, dest) {
        return write_card(dest, record);
    }

    fs::copy(source, dest)?;

    if let Err(e) = write_card(dest, record) {
        if let Err(remove) = fs::remove_file(dest) {
            warn!(path = %dest.display(), error = %remove, "failed to remove partial export");
        }
        return Err(e);
    }

    Ok(())
}

fn same_file(a: &Path, b: &Path) -> bool {
    match (fs::canonicalize(a), fs::canonicalize(b)) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
