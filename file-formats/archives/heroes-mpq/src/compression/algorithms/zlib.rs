//! Zlib decompression

use crate::{Error, Result};
use flate2::read::ZlibDecoder;
use std::io::{ErrorKind, Read};

/// Decompress zlib data into `out`, which must be filled exactly
pub(crate) fn decompress_into(data: &[u8], out: &mut [u8]) -> Result<()> {
    let mut decoder = ZlibDecoder::new(data);

    if let Err(e) = decoder.read_exact(out) {
        log::debug!("Zlib decompression failed: {e}");
        log::trace!(
            "First 16 bytes of data: {:02X?}",
            &data[..16.min(data.len())]
        );
        return Err(if e.kind() == ErrorKind::UnexpectedEof {
            Error::compression(format!("zlib stream shorter than {} bytes", out.len()))
        } else {
            Error::compression(format!("zlib: {e}"))
        });
    }

    let mut probe = [0u8; 1];
    match decoder.read(&mut probe) {
        Ok(0) => Ok(()),
        Ok(_) => Err(Error::compression(format!(
            "zlib stream holds more than {} bytes",
            out.len()
        ))),
        Err(e) => Err(Error::compression(format!("zlib: {e}"))),
    }
}
