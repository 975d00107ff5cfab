//! zlib inflation for compressed text chunks.

use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::{Error, Result};

/// The only compression method PNG defines: zlib deflate.
pub const COMPRESSION_DEFLATE: u8 = 0;

/// Inflate a zlib stream into `output`.
pub fn inflate_zlib(data: &[u8], output: &mut Vec<u8>) -> Result<()> {
    let mut decoder = ZlibDecoder::new(data);

    output.clear();
    decoder
        .read_to_end(output)
        .map_err(|e| Error::Decompression(e.to_string()))?;

    Ok(())
}

/// Inflate a compressed text body after checking its compression method.
pub fn inflate_text(method: u8, data: &[u8]) -> Result<Vec<u8>> {
    if method != COMPRESSION_DEFLATE {
        return Err(Error::UnsupportedCompression(method));
    }

    let mut output = Vec::with_capacity(data.len() * 2);
    inflate_zlib(data, &mut output)?;
    Ok(output)
}
