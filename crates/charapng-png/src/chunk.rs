//! Raw chunk reading.

use std::fmt;

use charapng_common::{crc, BinaryReader};

use crate::{Error, Result, PNG_SIGNATURE};

/// A four-byte PNG chunk type code.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkType(pub [u8; 4]);

#[allow(non_upper_case_globals)]
impl ChunkType {
    pub const IHDR: Self = Self(*b"IHDR");
    pub const PLTE: Self = Self(*b"PLTE");
    pub const IDAT: Self = Self(*b"IDAT");
    pub const IEND: Self = Self(*b"IEND");
    pub const tEXt: Self = Self(*b"tEXt");
    pub const zTXt: Self = Self(*b"zTXt");
    pub const iTXt: Self = Self(*b"iTXt");

    /// Get the type code bytes.
    #[inline]
    pub const fn as_bytes(&self) -> &[u8; 4] {
        &self.0
    }

    /// Whether this is one of the textual chunk types.
    #[inline]
    pub fn is_text(&self) -> bool {
        *self == Self::tEXt || *self == Self::zTXt || *self == Self::iTXt
    }
}

impl fmt::Debug for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for ChunkType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &b in &self.0 {
            if b.is_ascii_graphic() {
                write!(f, "{}", b as char)?;
            } else {
                write!(f, "\\x{:02x}", b)?;
            }
        }
        Ok(())
    }
}

/// An unparsed chunk, borrowed from the PNG bytes.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct RawChunk<'a> {
    chunk_type: ChunkType,
    data: &'a [u8],
    declared_crc: u32,
    offset: usize,
    raw: &'a [u8],
}

impl<'a> RawChunk<'a> {
    /// The chunk type.
    #[inline]
    pub fn chunk_type(&self) -> ChunkType {
        self.chunk_type
    }

    /// The chunk payload.
    #[inline]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// The CRC stored in the file. Never verified on read.
    #[inline]
    pub fn declared_crc(&self) -> u32 {
        self.declared_crc
    }

    /// Byte offset of the length field within the PNG.
    #[inline]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// The complete on-disk chunk: length, type, data and CRC.
    #[inline]
    pub fn raw(&self) -> &'a [u8] {
        self.raw
    }

    /// Recompute the CRC over type and data.
    pub fn computed_crc(&self) -> u32 {
        crc::chunk_crc(self.chunk_type.as_bytes(), self.data)
    }

    /// Whether the stored CRC matches the chunk contents.
    pub fn crc_matches(&self) -> bool {
        self.computed_crc() == self.declared_crc
    }
}

impl fmt::Debug for RawChunk<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RawChunk")
            .field("chunk_type", &self.chunk_type)
            .field("len", &self.data.len())
            .field("offset", &self.offset)
            .field("declared_crc", &format_args!("{:#010x}", self.declared_crc))
            .finish()
    }
}

/// Check if data starts with the PNG signature.
pub fn is_png(data: &[u8]) -> bool {
    data.starts_with(&PNG_SIGNATURE)
}

/// A lazy, non-restartable sequence of chunks.
///
/// Iteration stops after IEND has been yielded or the bytes run out at a
/// chunk boundary. A chunk that does not fit in the remaining bytes yields a
/// single [`Error::Truncated`] and ends the stream; everything yielded before
/// it stays valid.
///
/// # Example
///
/// ```
/// use charapng_png::{ChunkStream, ChunkType};
///
/// let mut png = charapng_png::PNG_SIGNATURE.to_vec();
/// charapng_png::write_chunk(&mut png, ChunkType::IEND, &[]);
///
/// let types: Vec<_> = ChunkStream::open(&png)?
///     .map(|chunk| chunk.map(|c| c.chunk_type()))
///     .collect::<Result<_, _>>()?;
/// assert_eq!(types, vec![ChunkType::IEND]);
/// # Ok::<(), charapng_png::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ChunkStream<'a> {
    reader: BinaryReader<'a>,
    finished: bool,
}

impl<'a> ChunkStream<'a> {
    /// Validate the PNG signature and position the stream at the first chunk.
    pub fn open(data: &'a [u8]) -> Result<Self> {
        if !is_png(data) {
            return Err(Error::InvalidSignature {
                actual: data[..PNG_SIGNATURE.len().min(data.len())].to_vec(),
            });
        }

        let mut reader = BinaryReader::new(data);
        reader.advance(PNG_SIGNATURE.len());

        Ok(Self {
            reader,
            finished: false,
        })
    }

    /// Byte offset of the next chunk to be read.
    #[inline]
    pub fn position(&self) -> usize {
        self.reader.position()
    }

    /// Whether the stream has ended, either at IEND, at end of data, or on error.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished || self.reader.is_empty()
    }

    fn read_chunk(&mut self) -> Result<RawChunk<'a>> {
        let offset = self.reader.position();
        let truncated = move |e: charapng_common::Error| match e {
            charapng_common::Error::UnexpectedEof {
                needed, available, ..
            } => Error::Truncated {
                offset,
                needed,
                available,
            },
            other => Error::Common(other),
        };

        let length = self.reader.read_u32().map_err(truncated)? as usize;
        let chunk_type = ChunkType(self.reader.read_array::<4>().map_err(truncated)?);
        let data = self.reader.read_bytes(length).map_err(truncated)?;
        let declared_crc = self.reader.read_u32().map_err(truncated)?;

        Ok(RawChunk {
            chunk_type,
            data,
            declared_crc,
            offset,
            raw: &self.reader.data()[offset..self.reader.position()],
        })
    }
}

impl<'a> Iterator for ChunkStream<'a> {
    type Item = Result<RawChunk<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.is_finished() {
            return None;
        }

        match self.read_chunk() {
            Ok(chunk) => {
                if chunk.chunk_type == ChunkType::IEND {
                    self.finished = true;
                }
                Some(Ok(chunk))
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl std::iter::FusedIterator for ChunkStream<'_> {}

/// Read every chunk of a PNG up to and including IEND.
pub fn read_chunks(data: &[u8]) -> Result<Vec<RawChunk<'_>>> {
    ChunkStream::open(data)?.collect()
}
