//! BZip2 decompression
//!
//! A self-contained decoder for the bzip2 stream format. Decoding undoes
//! the encoder's stages in reverse:
//!
//! - Huffman decoding, with the coding table switched every 50 symbols
//!   according to the block's selector list
//! - RLE2: expansion of the RUNA/RUNB runs of the front byte
//! - Move-to-front: mapping indices back to byte values
//! - Inverse Burrows-Wheeler transform, following the transform vector from
//!   the block's origin pointer
//! - Derandomisation of blocks written by very old encoders
//! - RLE1: expansion of runs of 4+ identical bytes
//!
//! Every block carries a CRC-32 of its output and the stream ends with a
//! CRC combining all of them. Both are checked, and any mismatch or
//! structural problem is reported as [`Error::CorruptStream`].

mod bit_reader;
mod crc;
mod decoder;
mod huffman;
mod rand;

pub use decoder::{BLOCK_SIZE_MULTIPLE, Bzip2Decoder, Scratch};

use crate::{Error, Result};

/// Decompress a complete bzip2 stream
pub fn decompress(data: &[u8]) -> Result<Vec<u8>> {
    let mut decoder = Bzip2Decoder::new(data);
    let mut output = Vec::new();
    let mut chunk = vec![0u8; 64 * 1024];

    loop {
        let n = decoder.decode(&mut chunk)?;
        if n == 0 {
            break;
        }
        output.extend_from_slice(&chunk[..n]);
    }

    Ok(output)
}

/// Decompress a bzip2 stream that must produce exactly `out.len()` bytes
pub fn decompress_into(data: &[u8], out: &mut [u8]) -> Result<()> {
    let mut decoder = Bzip2Decoder::new(data);

    let mut filled = 0;
    while filled < out.len() {
        let n = decoder.decode(&mut out[filled..])?;
        if n == 0 {
            return Err(Error::compression(format!(
                "bzip2 stream ended after {filled} of {} bytes",
                out.len()
            )));
        }
        filled += n;
    }

    // Consume the end of stream so the stream CRC is checked
    let mut probe = [0u8; 1];
    if decoder.decode(&mut probe)? != 0 {
        return Err(Error::compression(format!(
            "bzip2 stream holds more than {} bytes",
            out.len()
        )));
    }

    Ok(())
}
