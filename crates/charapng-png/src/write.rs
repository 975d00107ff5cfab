//! Chunk serialization.

use charapng_common::crc;

use crate::ChunkType;

/// Append a complete chunk to `out`: big-endian length, type, data and CRC-32.
pub fn write_chunk(out: &mut Vec<u8>, chunk_type: ChunkType, data: &[u8]) {
    out.reserve(12 + data.len());
    out.extend_from_slice(&(data.len() as u32).to_be_bytes());
    out.extend_from_slice(chunk_type.as_bytes());
    out.extend_from_slice(data);
    out.extend_from_slice(&crc::chunk_crc(chunk_type.as_bytes(), data).to_be_bytes());
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iend_bytes() {
        let mut out = Vec::new();
        write_chunk(&mut out, ChunkType::IEND, &[]);
        assert_eq!(
            out,
            [0, 0, 0, 0, b'I', b'E', b'N', b'D', 0xAE, 0x42, 0x60, 0x82]
        );
    }

    #[test]
    fn test_length_prefix() {
        let mut out = Vec::new();
        write_chunk(&mut out, ChunkType::tEXt, b"chara\0e30=");
        assert_eq!(&out[..4], &10u32.to_be_bytes());
        assert_eq!(&out[4..8], b"tEXt");
        assert_eq!(out.len(), 12 + 10);
    }
}
