//! PNG CRC-32 hashing utilities.
//!
//! PNG chunks carry a CRC-32 (ISO-HDLC polynomial `0xEDB88320`, reflected)
//! computed over the chunk type followed by the chunk data.

/// Compute the CRC-32 of a byte slice.
#[inline]
pub fn hash_bytes(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Compute the CRC-32 of a PNG chunk from its type and data.
///
/// This is the value stored big-endian after the chunk data.
#[inline]
pub fn chunk_crc(chunk_type: &[u8; 4], data: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(chunk_type);
    hasher.update(data);
    hasher.finalize()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_hash() {
        assert_eq!(hash_bytes(&[]), 0);
    }

    #[test]
    fn test_known_hash() {
        // Standard CRC-32 check value
        assert_eq!(hash_bytes(b"123456789"), 0xCBF4_3926);
    }

    #[test]
    fn test_iend_crc() {
        // Every PNG ends with the same IEND chunk CRC
        assert_eq!(chunk_crc(b"IEND", &[]), 0xAE42_6082);
    }

    #[test]
    fn test_chunk_crc_matches_concatenation() {
        let mut joined = b"tEXt".to_vec();
        joined.extend_from_slice(b"chara\0abc");
        assert_eq!(chunk_crc(b"tEXt", b"chara\0abc"), hash_bytes(&joined));
    }
}
