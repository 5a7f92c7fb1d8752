//! Codec dispatch for compressed blocks

use super::algorithms::{bzip2, zlib};
use super::methods::CompressionMethod;
use crate::{Error, Result};

/// Decompress one block into `out`
///
/// `data` starts with the method byte. The codec must produce exactly
/// `out.len()` bytes. Unsupported methods fail before `out` is touched.
pub fn decompress(data: &[u8], out: &mut [u8]) -> Result<()> {
    let (&method, payload) = data
        .split_first()
        .ok_or_else(|| Error::compression("Empty compressed data"))?;

    let codec = CompressionMethod::from_byte(method);
    log::trace!(
        "Decompressing {} bytes with {codec:?} into {} bytes",
        payload.len(),
        out.len()
    );

    match codec {
        CompressionMethod::Zlib => zlib::decompress_into(payload, out),
        CompressionMethod::BZip2 => bzip2::decompress_into(payload, out),
        CompressionMethod::Unsupported { method, name } => {
            log::debug!("Unsupported compression method 0x{method:02X} ({name})");
            Err(Error::UnsupportedCodec { method, name })
        }
    }
}

/// Decompress a block held at the front of its own destination buffer
///
/// The first `compressed_len` bytes of `buffer` are the compressed block;
/// the whole buffer receives the output.
pub fn decompress_in_place(buffer: &mut [u8], compressed_len: usize) -> Result<()> {
    let compressed = buffer
        .get(..compressed_len)
        .ok_or_else(|| {
            Error::compression(format!(
                "Compressed length {compressed_len} exceeds buffer of {} bytes",
                buffer.len()
            ))
        })?
        .to_vec();

    decompress(&compressed, buffer)
}
