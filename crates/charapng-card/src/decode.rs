//! Card detection and decoding.
//!
//! Decoding tries every [`FormatVariant`] in precedence order and returns the
//! first that yields a record:
//!
//! 1. `ccv3` and 2. `chara` text chunks, found by a single manual chunk scan.
//!    `tEXt` bodies are base64; `zTXt` bodies are zlib-compressed base64.
//! 3. Legacy JSON and 4. Stable Diffusion parameters, read from the image's
//!    general text metadata.
//!
//! A failure on one chunk only discards that candidate. Decoding itself
//! never fails: every input maps to a [`DecodeOutcome`].

use std::fs;
use std::path::Path;
use std::string::FromUtf8Error;

use base64::alphabet;
use base64::engine::general_purpose::{GeneralPurpose, GeneralPurposeConfig};
use base64::engine::DecodePaddingMode;
use base64::Engine;
use charapng_png::{ChunkStream, ChunkType, TextChunk};
use thiserror::Error;
use tracing::{debug, warn};

use crate::fallback::{
    legacy_v1_record, stable_diffusion_record, ChunkTextMetadata, TextMetadata,
    TextMetadataSource, LEGACY_KEY, PARAMETERS_KEY,
};
use crate::record::CharacterRecord;
use crate::variant::FormatVariant;
use crate::{CCV3_KEYWORD, CHARA_KEYWORD};

/// Base64 engine for reading card chunks. Accepts missing padding.
const LENIENT_BASE64: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new()
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// Why a single candidate chunk was discarded.
#[derive(Debug, Error)]
pub enum CandidateError {
    /// The chunk could not be parsed or inflated.
    #[error("{0}")]
    Png(#[from] charapng_png::Error),

    /// The body is not valid base64.
    #[error("base64 error: {0}")]
    Base64(#[from] base64::DecodeError),

    /// The decoded bytes are not UTF-8.
    #[error("UTF-8 error: {0}")]
    Utf8(#[from] FromUtf8Error),

    /// The text is not a card JSON object.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// A successfully decoded card.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedCard {
    pub record: CharacterRecord,
    pub variant: FormatVariant,
}

/// The result of decoding a file.
#[derive(Debug, Clone, PartialEq)]
pub enum DecodeOutcome {
    /// A card was found.
    Card(DecodedCard),
    /// The file is a readable PNG without any character metadata.
    NoData,
    /// The file could not be read or is not a PNG.
    InvalidImage(String),
}

impl DecodeOutcome {
    /// Take the decoded card, if any.
    pub fn into_card(self) -> Option<DecodedCard> {
        match self {
            DecodeOutcome::Card(card) => Some(card),
            _ => None,
        }
    }

    /// Short description of the outcome.
    pub fn label(&self) -> &'static str {
        match self {
            DecodeOutcome::Card(card) => card.variant.label(),
            DecodeOutcome::NoData => "No character data",
            DecodeOutcome::InvalidImage(_) => "Invalid image",
        }
    }
}

/// Card candidates found by the manual chunk scan.
///
/// When a keyword appears more than once, the last chunk that decodes wins.
#[derive(Debug, Clone, Default)]
pub struct ChunkScan {
    pub v3: Option<CharacterRecord>,
    pub v2: Option<CharacterRecord>,
}

impl ChunkScan {
    /// Take the candidate found for a chunk variant. Fallback variants have none.
    pub fn take(&mut self, variant: FormatVariant) -> Option<CharacterRecord> {
        match variant {
            FormatVariant::V3 => self.v3.take(),
            FormatVariant::V2 => self.v2.take(),
            FormatVariant::LegacyV1 | FormatVariant::StableDiffusion => None,
        }
    }
}

/// Scan all `tEXt`/`zTXt` chunks for `ccv3` and `chara` cards.
///
/// Only an invalid signature is an error. A truncated chunk ends the scan and
/// keeps whatever was found before it.
pub fn scan_chunks(png: &[u8]) -> charapng_png::Result<ChunkScan> {
    let mut scan = ChunkScan::default();

    for chunk in ChunkStream::open(png)? {
        let chunk = match chunk {
            Ok(chunk) => chunk,
            Err(e) => {
                warn!(error = %e, "chunk scan stopped early, keeping candidates found so far");
                break;
            }
        };

        let chunk_type = chunk.chunk_type();
        if chunk_type != ChunkType::tEXt && chunk_type != ChunkType::zTXt {
            continue;
        }

        let text = match TextChunk::parse(&chunk) {
            Ok(Some(text)) => text,
            Ok(None) => continue,
            Err(e) => {
                debug!(offset = chunk.offset(), error = %e, "skipping malformed text chunk");
                continue;
            }
        };

        let slot = if text.keyword_is(CCV3_KEYWORD) {
            &mut scan.v3
        } else if text.keyword_is(CHARA_KEYWORD) {
            &mut scan.v2
        } else {
            continue;
        };

        match decode_card_text(&text) {
            Ok(record) => *slot = Some(record),
            Err(e) => debug!(
                offset = chunk.offset(),
                keyword = %text.keyword_str(),
                chunk_type = %chunk_type,
                error = %e,
                "discarding card candidate"
            ),
        }
    }

    Ok(scan)
}

/// Decode one card chunk: (inflate), base64, UTF-8, JSON.
///
/// Bytes outside the base64 alphabet are ignored.
pub fn decode_card_text(text: &TextChunk<'_>) -> Result<CharacterRecord, CandidateError> {
    let body = text.body()?;

    let encoded: Vec<u8> = body
        .iter()
        .copied()
        .filter(|&b| is_base64_byte(b))
        .collect();
    let json = String::from_utf8(LENIENT_BASE64.decode(encoded)?)?;

    Ok(serde_json::from_str(&json)?)
}

fn is_base64_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'+' | b'/' | b'=')
}

/// Decodes character cards, using `M` for the text-metadata fallback.
#[derive(Debug, Clone, Default)]
pub struct CardDecoder<M = ChunkTextMetadata> {
    metadata: M,
}

impl CardDecoder<ChunkTextMetadata> {
    /// Create a decoder with the built-in chunk metadata reader.
    pub fn new() -> Self {
        Self::default()
    }
}

impl<M: TextMetadataSource> CardDecoder<M> {
    /// Create a decoder with a custom text-metadata collaborator.
    pub fn with_metadata_source(metadata: M) -> Self {
        Self { metadata }
    }

    /// Decode a PNG held in memory.
    pub fn decode_bytes(&self, png: &[u8]) -> DecodeOutcome {
        let mut scan = match scan_chunks(png) {
            Ok(scan) => scan,
            Err(e) => return DecodeOutcome::InvalidImage(e.to_string()),
        };

        let mut metadata: Option<TextMetadata> = None;

        for variant in FormatVariant::PRECEDENCE {
            let record = if variant.is_chunk_variant() {
                scan.take(variant)
            } else {
                let metadata = metadata.get_or_insert_with(|| self.read_metadata(png));
                fallback_candidate(variant, metadata)
            };

            if let Some(record) = record {
                debug!(variant = %variant, name = record.display_name(), "decoded card");
                return DecodeOutcome::Card(DecodedCard { record, variant });
            }
        }

        DecodeOutcome::NoData
    }

    /// Read and decode a PNG file.
    ///
    /// Unreadable files map to [`DecodeOutcome::InvalidImage`].
    pub fn decode_file<P: AsRef<Path>>(&self, path: P) -> DecodeOutcome {
        let path = path.as_ref();

        match fs::read(path) {
            Ok(data) => self.decode_bytes(&data),
            Err(e) => {
                debug!(path = %path.display(), error = %e, "cannot read card file");
                DecodeOutcome::InvalidImage(format!("failed to read {}: {}", path.display(), e))
            }
        }
    }

    fn read_metadata(&self, png: &[u8]) -> TextMetadata {
        self.metadata.text_metadata(png).unwrap_or_else(|e| {
            warn!(error = %e, "text metadata unavailable");
            TextMetadata::new()
        })
    }
}

/// Try one fallback variant against the text metadata.
pub fn fallback_candidate(
    variant: FormatVariant,
    metadata: &TextMetadata,
) -> Option<CharacterRecord> {
    match variant {
        FormatVariant::LegacyV1 => {
            let json = metadata.get(LEGACY_KEY)?;
            legacy_v1_record(json)
                .map_err(|e| debug!(error = %e, "discarding legacy card candidate"))
                .ok()
        }
        FormatVariant::StableDiffusion => metadata
            .get(PARAMETERS_KEY)
            .map(|text| stable_diffusion_record(text)),
        FormatVariant::V3 | FormatVariant::V2 => None,
    }
}

/// Decode a PNG held in memory with the default decoder.
pub fn decode_bytes(png: &[u8]) -> DecodeOutcome {
    CardDecoder::new().decode_bytes(png)
}

/// Decode a PNG file with the default decoder.
pub fn decode_file<P: AsRef<Path>>(path: P) -> DecodeOutcome {
    CardDecoder::new().decode_file(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use charapng_png::{text_payload, write_chunk, PNG_SIGNATURE};
    use serde_json::json;

    fn b64(value: &serde_json::Value) -> Vec<u8> {
        STANDARD.encode(value.to_string()).into_bytes()
    }

    fn png_with(chunks: &[(ChunkType, Vec<u8>)]) -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        write_chunk(&mut png, ChunkType::IHDR, &[0; 13]);
        for (chunk_type, data) in chunks {
            write_chunk(&mut png, *chunk_type, data);
        }
        write_chunk(&mut png, ChunkType::IEND, &[]);
        png
    }

    struct FixedMetadata(TextMetadata);

    impl TextMetadataSource for FixedMetadata {
        fn text_metadata(&self, _png: &[u8]) -> charapng_png::Result<TextMetadata> {
            Ok(self.0.clone())
        }
    }

    #[test]
    fn test_keyword_case_insensitive() {
        let card = json!({"data": {"name": "Upper"}});
        let png = png_with(&[(ChunkType::tEXt, text_payload("Chara", &b64(&card)))]);

        let decoded = decode_bytes(&png).into_card().unwrap();
        assert_eq!(decoded.variant, FormatVariant::V2);
        assert_eq!(decoded.record.display_name(), "Upper");
    }

    #[test]
    fn test_last_valid_duplicate_wins() {
        let first = json!({"data": {"name": "First"}});
        let second = json!({"data": {"name": "Second"}});
        let png = png_with(&[
            (ChunkType::tEXt, text_payload("chara", &b64(&first))),
            (ChunkType::tEXt, text_payload("chara", &b64(&second))),
            (ChunkType::tEXt, text_payload("chara", b"!!not base64!!")),
        ]);

        let decoded = decode_bytes(&png).into_card().unwrap();
        assert_eq!(decoded.record.display_name(), "Second");
    }

    #[test]
    fn test_base64_without_padding_and_with_newlines() {
        let card = json!({"data": {"name": "Pad"}});
        let mut encoded = b64(&card);
        while encoded.last() == Some(&b'=') {
            encoded.pop();
        }
        encoded.insert(4, b'\n');

        let png = png_with(&[(ChunkType::tEXt, text_payload("chara", &encoded))]);
        assert_eq!(
            decode_bytes(&png).into_card().unwrap().record.display_name(),
            "Pad"
        );
    }

    #[test]
    fn test_non_alphabet_bytes_ignored() {
        let card = json!({"data": {"name": "Noisy"}});
        let mut encoded = b64(&card);
        encoded.insert(3, b'*');
        encoded.insert(9, 0xFF);
        encoded.extend_from_slice(b"\t\0");

        let png = png_with(&[(ChunkType::tEXt, text_payload("chara", &encoded))]);
        assert_eq!(
            decode_bytes(&png).into_card().unwrap().record.display_name(),
            "Noisy"
        );
    }

    #[test]
    fn test_scan_take_by_variant() {
        let mut scan = ChunkScan {
            v3: Some(CharacterRecord::default()),
            v2: None,
        };
        assert!(scan.take(FormatVariant::LegacyV1).is_none());
        assert!(scan.take(FormatVariant::V3).is_some());
        assert!(scan.take(FormatVariant::V3).is_none());
    }

    #[test]
    fn test_non_object_json_discarded() {
        let png = png_with(&[(ChunkType::tEXt, text_payload("chara", &b64(&json!([1, 2]))))]);
        assert_eq!(decode_bytes(&png), DecodeOutcome::NoData);
    }

    #[test]
    fn test_bad_utf8_discarded() {
        let encoded = STANDARD.encode([0xFF, 0xFE, b'{', b'}']).into_bytes();
        let png = png_with(&[(ChunkType::tEXt, text_payload("ccv3", &encoded))]);
        assert_eq!(decode_bytes(&png), DecodeOutcome::NoData);
    }

    #[test]
    fn test_other_keywords_ignored() {
        let card = json!({"data": {"name": "Hidden"}});
        let png = png_with(&[(ChunkType::tEXt, text_payload("comment", &b64(&card)))]);
        assert_eq!(decode_bytes(&png), DecodeOutcome::NoData);
    }

    #[test]
    fn test_itxt_card_only_seen_by_fallback() {
        // iTXt is not scanned manually; as text metadata it is plain legacy JSON
        let mut payload = b"chara\0\0\0\0\0".to_vec();
        payload.extend_from_slice(br#"{"name":"Intl"}"#);
        let png = png_with(&[(ChunkType::iTXt, payload)]);

        let decoded = decode_bytes(&png).into_card().unwrap();
        assert_eq!(decoded.variant, FormatVariant::LegacyV1);
        assert_eq!(decoded.record.display_name(), "Intl");
    }

    #[test]
    fn test_fallback_precedence_with_custom_source() {
        let mut metadata = TextMetadata::new();
        metadata.insert("parameters".into(), "portrait, 4k".into());
        metadata.insert("chara".into(), r#"{"name":"Legacy"}"#.into());

        let decoder = CardDecoder::with_metadata_source(FixedMetadata(metadata.clone()));
        let png = png_with(&[]);
        let decoded = decoder.decode_bytes(&png).into_card().unwrap();
        assert_eq!(decoded.variant, FormatVariant::LegacyV1);

        metadata.insert("chara".into(), "{broken".into());
        let decoder = CardDecoder::with_metadata_source(FixedMetadata(metadata));
        let decoded = decoder.decode_bytes(&png).into_card().unwrap();
        assert_eq!(decoded.variant, FormatVariant::StableDiffusion);
        assert!(decoded.record.is_read_only());
    }

    #[test]
    fn test_fallback_candidate_ignores_chunk_variants() {
        let mut metadata = TextMetadata::new();
        metadata.insert("chara".into(), r#"{"name":"X"}"#.into());
        assert!(fallback_candidate(FormatVariant::V2, &metadata).is_none());
        assert!(fallback_candidate(FormatVariant::LegacyV1, &metadata).is_some());
        assert!(fallback_candidate(FormatVariant::StableDiffusion, &metadata).is_none());
    }

    #[test]
    fn test_truncated_stream_keeps_earlier_candidates() {
        let card = json!({"data": {"name": "Early"}});
        let mut png = PNG_SIGNATURE.to_vec();
        write_chunk(&mut png, ChunkType::IHDR, &[0; 13]);
        write_chunk(&mut png, ChunkType::tEXt, &text_payload("chara", &b64(&card)));
        png.extend_from_slice(&9999u32.to_be_bytes());
        png.extend_from_slice(b"IDAT");

        let decoded = decode_bytes(&png).into_card().unwrap();
        assert_eq!(decoded.record.display_name(), "Early");
    }

    #[test]
    fn test_missing_file_is_invalid_image() {
        let outcome = decode_file("/definitely/not/here.png");
        assert!(matches!(outcome, DecodeOutcome::InvalidImage(_)));
        assert_eq!(outcome.label(), "Invalid image");
    }
}
