//! PNG fixtures for integration tests.

#![allow(dead_code)]

use std::io::Write;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use charapng_card::png::{text_payload, write_chunk, ChunkType, PNG_SIGNATURE};
use flate2::write::ZlibEncoder;
use flate2::Compression;
use serde_json::Value;

/// Builds small but structurally valid PNGs chunk by chunk.
#[derive(Debug, Clone)]
pub struct PngBuilder {
    chunks: Vec<(ChunkType, Vec<u8>)>,
    trailing: Vec<u8>,
}

impl PngBuilder {
    /// A 1x1 palette image: IHDR, PLTE, IDAT. IEND is added by `build`.
    pub fn new() -> Self {
        let ihdr = [
            0, 0, 0, 1, // width
            0, 0, 0, 1, // height
            8, 3, 0, 0, 0, // depth, palette colour, compression, filter, interlace
        ];
        let idat = zlib(&[0, 0]);

        Self {
            chunks: vec![
                (ChunkType::IHDR, ihdr.to_vec()),
                (ChunkType::PLTE, vec![0xFF, 0x00, 0x00]),
                (ChunkType::IDAT, idat),
            ],
            trailing: Vec::new(),
        }
    }

    pub fn chunk(mut self, chunk_type: ChunkType, data: Vec<u8>) -> Self {
        self.chunks.push((chunk_type, data));
        self
    }

    pub fn text(self, keyword: &str, text: &[u8]) -> Self {
        self.chunk(ChunkType::tEXt, text_payload(keyword, text))
    }

    pub fn ztext(self, keyword: &str, text: &[u8]) -> Self {
        let mut data = keyword.as_bytes().to_vec();
        data.push(0);
        data.push(0);
        data.extend_from_slice(&zlib(text));
        self.chunk(ChunkType::zTXt, data)
    }

    pub fn itext(self, keyword: &str, text: &str) -> Self {
        let mut data = keyword.as_bytes().to_vec();
        data.extend_from_slice(&[0, 0, 0, 0, 0]);
        data.extend_from_slice(text.as_bytes());
        self.chunk(ChunkType::iTXt, data)
    }

    /// A base64 card in a `tEXt` chunk.
    pub fn card(self, keyword: &str, card: &Value) -> Self {
        self.text(keyword, b64(card).as_bytes())
    }

    /// Bytes appended after IEND.
    pub fn trailing(mut self, bytes: &[u8]) -> Self {
        self.trailing.extend_from_slice(bytes);
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        for (chunk_type, data) in &self.chunks {
            write_chunk(&mut png, *chunk_type, data);
        }
        write_chunk(&mut png, ChunkType::IEND, &[]);
        png.extend_from_slice(&self.trailing);
        png
    }

    /// Build without IEND.
    pub fn build_without_iend(&self) -> Vec<u8> {
        let mut png = PNG_SIGNATURE.to_vec();
        for (chunk_type, data) in &self.chunks {
            write_chunk(&mut png, *chunk_type, data);
        }
        png
    }
}

pub fn b64(value: &Value) -> String {
    STANDARD.encode(value.to_string())
}

pub fn zlib(data: &[u8]) -> Vec<u8> {
    let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data).unwrap();
    encoder.finish().unwrap()
}
