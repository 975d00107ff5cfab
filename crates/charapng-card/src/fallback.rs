//! Fallback sources: legacy V1 cards and Stable Diffusion parameters.
//!
//! When no base64 card chunk decodes, the detector looks at the image's
//! general text metadata, a keyword to text map like the one an image library
//! exposes. `chara` there holds plain legacy JSON and `parameters` holds
//! Stable Diffusion generation settings.

use std::collections::BTreeMap;

use charapng_png::{ChunkStream, TextChunk};
use tracing::{debug, warn};

use crate::record::{CardData, CharacterRecord};

/// Keyword to text map of an image's textual metadata.
pub type TextMetadata = BTreeMap<String, String>;

/// Fallback metadata key holding legacy card JSON.
pub const LEGACY_KEY: &str = "chara";

/// Fallback metadata key holding Stable Diffusion parameters.
pub const PARAMETERS_KEY: &str = "parameters";

/// Characters of the first parameter field kept in a synthesized name.
const SD_NAME_LIMIT: usize = 30;

/// Supplies the general text metadata of a PNG.
pub trait TextMetadataSource {
    /// Read the text metadata of `png`. Errors only if the data is not a PNG.
    fn text_metadata(&self, png: &[u8]) -> charapng_png::Result<TextMetadata>;
}

/// Builds text metadata from `tEXt`, `zTXt` and `iTXt` chunks.
///
/// Keywords are kept as written; a later chunk with the same keyword
/// replaces an earlier one. Chunks that fail to decode are skipped.
#[derive(Debug, Clone, Copy, Default)]
pub struct ChunkTextMetadata;

impl TextMetadataSource for ChunkTextMetadata {
    fn text_metadata(&self, png: &[u8]) -> charapng_png::Result<TextMetadata> {
        let mut metadata = TextMetadata::new();

        for chunk in ChunkStream::open(png)? {
            let chunk = match chunk {
                Ok(chunk) => chunk,
                Err(e) => {
                    warn!(error = %e, "text metadata scan stopped early");
                    break;
                }
            };

            let text = match TextChunk::parse(&chunk) {
                Ok(Some(text)) => text,
                Ok(None) => continue,
                Err(e) => {
                    debug!(offset = chunk.offset(), error = %e, "skipping malformed text chunk");
                    continue;
                }
            };

            match text.text() {
                Ok(value) => {
                    metadata.insert(text.keyword_str(), value);
                }
                Err(e) => {
                    debug!(keyword = %text.keyword_str(), error = %e, "skipping undecodable text chunk");
                }
            }
        }

        Ok(metadata)
    }
}

/// Decode a legacy card stored as plain JSON.
///
/// Cards without a nested `data` object get one built from their top-level
/// narrative fields. A non-object `data` value is replaced.
pub fn legacy_v1_record(json: &str) -> serde_json::Result<CharacterRecord> {
    let mut record: CharacterRecord = serde_json::from_str(json)?;

    if record.data.is_none() {
        record.extra.remove("data");
        record.data = Some(record.narrative_as_data());
    }

    Ok(record)
}

/// Synthesize a read-only record from Stable Diffusion parameter text.
pub fn stable_diffusion_record(parameters: &str) -> CharacterRecord {
    let name_hint: String = parameters
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .chars()
        .take(SD_NAME_LIMIT)
        .collect();

    CharacterRecord {
        name: Some(format!("[SD] {}...", name_hint)),
        description: Some(format!(
            "This image contains Stable Diffusion generation parameters.\n\n--- Parameters ---\n{}",
            parameters
        )),
        personality: Some(String::new()),
        scenario: Some(String::new()),
        first_mes: Some(String::new()),
        mes_example: Some(String::new()),
        data: Some(CardData {
            is_sd_card: Some(true),
            parameters: Some(parameters.to_string()),
            ..CardData::default()
        }),
        ..CharacterRecord::default()
    }
}
