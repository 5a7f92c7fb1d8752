//! Canonical Huffman decode tables

use super::bit_reader::BitReader;
use crate::{Error, Result};
use std::io::Read;

/// Largest alphabet: 256 byte values, RUNA/RUNB, end of block, less one unused slot
pub(crate) const MAX_ALPHA_SIZE: usize = 258;

/// Size of the per-length arrays
pub(crate) const MAX_CODE_LEN: usize = 23;

/// Longest code length a stream may declare
pub(crate) const MAX_DECODE_LEN: u32 = 20;

/// Decode table for one coding group
///
/// `limit[len]` is the largest code of length `len`, `base[len]` maps a
/// code of that length to its rank in `perm`, and `perm` lists symbols
/// ordered by (code length, symbol).
#[derive(Debug, Clone)]
pub(crate) struct HuffmanTable {
    limit: [i32; MAX_CODE_LEN],
    base: [i32; MAX_CODE_LEN],
    perm: [u16; MAX_ALPHA_SIZE],
    min_len: u32,
}

impl HuffmanTable {
    pub(crate) fn new() -> Self {
        Self {
            limit: [0; MAX_CODE_LEN],
            base: [0; MAX_CODE_LEN],
            perm: [0; MAX_ALPHA_SIZE],
            min_len: 0,
        }
    }

    /// Rebuild the table from per-symbol code lengths (each 1..=20)
    pub(crate) fn build(&mut self, lengths: &[u8]) {
        let min_len = lengths.iter().copied().min().unwrap_or(1) as usize;
        let max_len = lengths.iter().copied().max().unwrap_or(1) as usize;

        let mut pp = 0;
        for len in min_len..=max_len {
            for (symbol, _) in lengths
                .iter()
                .enumerate()
                .filter(|&(_, &l)| l as usize == len)
            {
                self.perm[pp] = symbol as u16;
                pp += 1;
            }
        }

        self.base = [0; MAX_CODE_LEN];
        for &len in lengths {
            self.base[len as usize + 1] += 1;
        }
        for i in 1..MAX_CODE_LEN {
            self.base[i] += self.base[i - 1];
        }

        self.limit = [0; MAX_CODE_LEN];
        let mut vec = 0i32;
        for i in min_len..=max_len {
            vec += self.base[i + 1] - self.base[i];
            self.limit[i] = vec - 1;
            vec <<= 1;
        }
        for i in min_len + 1..=max_len {
            self.base[i] = ((self.limit[i - 1] + 1) << 1) - self.base[i];
        }

        self.min_len = min_len as u32;
    }

    /// Decode one symbol
    pub(crate) fn decode<R: Read>(&self, bits: &mut BitReader<R>) -> Result<u16> {
        let mut len = self.min_len;
        let mut code = bits.read_bits(len)? as i32;

        while code > self.limit[len as usize] {
            len += 1;
            if len > MAX_DECODE_LEN {
                return Err(Error::corrupt("Huffman code longer than 20 bits"));
            }
            code = (code << 1) | bits.read_bits(1)? as i32;
        }

        let rank = code - self.base[len as usize];
        if !(0..MAX_ALPHA_SIZE as i32).contains(&rank) {
            return Err(Error::corrupt("Huffman code out of range"));
        }

        Ok(self.perm[rank as usize])
    }
}
