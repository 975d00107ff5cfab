//! Textual chunks: `tEXt`, `zTXt` and `iTXt`.
//!
//! All three start with a keyword terminated by a null byte. What follows is:
//!
//! - `tEXt`: Latin-1 text
//! - `zTXt`: one compression-method byte, then a zlib stream of Latin-1 text
//! - `iTXt`: compression flag, compression method, language tag + null,
//!   translated keyword + null, then (optionally compressed) UTF-8 text

use std::borrow::Cow;

use charapng_common::BinaryReader;

use crate::inflate::inflate_text;
use crate::{ChunkType, Error, RawChunk, Result};

/// A parsed textual chunk borrowing from the PNG bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextChunk<'a> {
    /// Uncompressed Latin-1 text.
    Plain { keyword: &'a [u8], text: &'a [u8] },

    /// Compressed Latin-1 text.
    Compressed {
        keyword: &'a [u8],
        method: u8,
        stream: &'a [u8],
    },

    /// International UTF-8 text.
    International {
        keyword: &'a [u8],
        compressed: bool,
        method: u8,
        language: &'a [u8],
        translated_keyword: &'a [u8],
        text: &'a [u8],
    },
}

/// Split a text payload on its first null byte into keyword and remainder.
#[inline]
pub fn split_keyword(data: &[u8]) -> Option<(&[u8], &[u8])> {
    let null_pos = charapng_common::memchr::memchr(0, data)?;
    Some((&data[..null_pos], &data[null_pos + 1..]))
}

/// Decode Latin-1 bytes, where every byte maps to the code point of the same value.
pub fn latin1_to_string(bytes: &[u8]) -> String {
    bytes.iter().map(|&b| b as char).collect()
}

impl<'a> TextChunk<'a> {
    /// Parse a raw chunk. Returns `Ok(None)` for non-text chunk types.
    pub fn parse(chunk: &RawChunk<'a>) -> Result<Option<Self>> {
        let chunk_type = chunk.chunk_type();
        if !chunk_type.is_text() {
            return Ok(None);
        }

        let (keyword, rest) = split_keyword(chunk.data()).ok_or(Error::MissingKeywordSeparator)?;

        let parsed = if chunk_type == ChunkType::tEXt {
            TextChunk::Plain { keyword, text: rest }
        } else if chunk_type == ChunkType::zTXt {
            let (&method, stream) = rest.split_first().ok_or(Error::MalformedText {
                chunk_type: "zTXt",
                reason: "missing compression method",
            })?;
            TextChunk::Compressed {
                keyword,
                method,
                stream,
            }
        } else {
            Self::parse_international(keyword, rest)?
        };

        Ok(Some(parsed))
    }

    fn parse_international(keyword: &'a [u8], rest: &'a [u8]) -> Result<Self> {
        let malformed = |reason| Error::MalformedText {
            chunk_type: "iTXt",
            reason,
        };

        let mut reader = BinaryReader::new(rest);
        let compressed = reader
            .read_u8()
            .map_err(|_| malformed("missing compression flag"))?
            != 0;
        let method = reader
            .read_u8()
            .map_err(|_| malformed("missing compression method"))?;
        let language = reader
            .read_until_null()
            .map_err(|_| malformed("unterminated language tag"))?;
        let translated_keyword = reader
            .read_until_null()
            .map_err(|_| malformed("unterminated translated keyword"))?;

        Ok(TextChunk::International {
            keyword,
            compressed,
            method,
            language,
            translated_keyword,
            text: reader.remaining_bytes(),
        })
    }

    /// The raw keyword bytes.
    pub fn keyword(&self) -> &'a [u8] {
        match *self {
            TextChunk::Plain { keyword, .. }
            | TextChunk::Compressed { keyword, .. }
            | TextChunk::International { keyword, .. } => keyword,
        }
    }

    /// The keyword decoded as Latin-1.
    pub fn keyword_str(&self) -> String {
        latin1_to_string(self.keyword())
    }

    /// Case-insensitive keyword comparison.
    pub fn keyword_is(&self, expected: &str) -> bool {
        self.keyword().eq_ignore_ascii_case(expected.as_bytes())
    }

    /// The text body bytes, inflated if the chunk is compressed.
    pub fn body(&self) -> Result<Cow<'a, [u8]>> {
        match *self {
            TextChunk::Plain { text, .. } => Ok(Cow::Borrowed(text)),
            TextChunk::Compressed { method, stream, .. } => {
                inflate_text(method, stream).map(Cow::Owned)
            }
            TextChunk::International {
                compressed: false,
                text,
                ..
            } => Ok(Cow::Borrowed(text)),
            TextChunk::International { method, text, .. } => {
                inflate_text(method, text).map(Cow::Owned)
            }
        }
    }

    /// The text body as a string: Latin-1 for `tEXt`/`zTXt`, UTF-8 for `iTXt`.
    pub fn text(&self) -> Result<String> {
        let body = self.body()?;
        match self {
            TextChunk::International { .. } => Ok(String::from_utf8(body.into_owned())?),
            _ => Ok(latin1_to_string(&body)),
        }
    }
}

/// Build a text chunk payload: keyword, null separator, text.
pub fn text_payload(keyword: &str, text: &[u8]) -> Vec<u8> {
    let mut payload = Vec::with_capacity(keyword.len() + 1 + text.len());
    payload.extend_from_slice(keyword.as_bytes());
    payload.push(0);
    payload.extend_from_slice(text);
    payload
}
