//! Chunk-level rewriting of PNG metadata.
//!
//! The surgeon walks the original chunk sequence once. Text chunks carrying
//! one of its keywords are dropped, every other chunk is copied byte-for-byte
//! (CRC included), and the replacement chunk is inserted just before IEND.
//! The whole output is built in memory; nothing is returned unless the input
//! parsed completely.

use tracing::debug;

use crate::text::split_keyword;
use crate::{write_chunk, ChunkStream, ChunkType, Error, RawChunk, Result, PNG_SIGNATURE};

/// Rewrites the text metadata of a PNG without touching any other chunk.
#[derive(Debug, Clone)]
pub struct ChunkSurgeon {
    keywords: Vec<String>,
}

/// The result of a rewrite.
#[derive(Debug, Clone)]
pub struct Rewritten {
    /// The complete new PNG.
    pub bytes: Vec<u8>,
    /// Number of chunks copied unchanged (IEND included).
    pub kept: usize,
    /// Number of metadata chunks removed.
    pub dropped: usize,
}

impl ChunkSurgeon {
    /// Create a surgeon that replaces `tEXt`/`zTXt` chunks with any of the given keywords.
    ///
    /// Keywords are matched case-insensitively.
    pub fn new<I, S>(keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }

    /// Whether the chunk is a metadata chunk this surgeon replaces.
    pub fn is_target(&self, chunk: &RawChunk<'_>) -> bool {
        let chunk_type = chunk.chunk_type();
        if chunk_type != ChunkType::tEXt && chunk_type != ChunkType::zTXt {
            return false;
        }

        match split_keyword(chunk.data()) {
            Some((keyword, _)) => self
                .keywords
                .iter()
                .any(|k| keyword.eq_ignore_ascii_case(k.as_bytes())),
            None => false,
        }
    }

    /// Rebuild `png` with all target chunks removed and a new `tEXt` chunk
    /// holding `payload` placed immediately before IEND.
    ///
    /// Fails with a structural error if a chunk is truncated or IEND is missing.
    pub fn rewrite(&self, png: &[u8], payload: &[u8]) -> Result<Rewritten> {
        let mut stream = ChunkStream::open(png)?;

        let mut bytes = Vec::with_capacity(png.len() + payload.len() + 12);
        bytes.extend_from_slice(&PNG_SIGNATURE);

        let mut kept = 0;
        let mut dropped = 0;
        let mut iend = None;

        for chunk in stream.by_ref() {
            let chunk = chunk?;

            if chunk.chunk_type() == ChunkType::IEND {
                iend = Some(chunk);
                break;
            }

            if self.is_target(&chunk) {
                debug!(
                    offset = chunk.offset(),
                    chunk_type = %chunk.chunk_type(),
                    "dropping metadata chunk"
                );
                dropped += 1;
                continue;
            }

            bytes.extend_from_slice(chunk.raw());
            kept += 1;
        }

        let iend = iend.ok_or(Error::MissingIend)?;
        if stream.position() < png.len() {
            debug!(
                trailing = png.len() - stream.position(),
                "discarding bytes after IEND"
            );
        }

        write_chunk(&mut bytes, ChunkType::tEXt, payload);
        bytes.extend_from_slice(iend.raw());
        kept += 1;

        Ok(Rewritten {
            bytes,
            kept,
            dropped,
        })
    }
}
