//! MSB-first bit reader over a byte source

use crate::{Error, Result};
use std::io::{ErrorKind, Read};

const CHUNK_SIZE: usize = 4096;

/// Reads bits most-significant first, as the bzip2 bitstream packs them
#[derive(Debug)]
pub(crate) struct BitReader<R> {
    inner: R,
    chunk: Box<[u8]>,
    chunk_pos: usize,
    chunk_len: usize,
    buffer: u64,
    available: u32,
}

impl<R: Read> BitReader<R> {
    pub(crate) fn new(inner: R) -> Self {
        Self {
            inner,
            chunk: vec![0u8; CHUNK_SIZE].into_boxed_slice(),
            chunk_pos: 0,
            chunk_len: 0,
            buffer: 0,
            available: 0,
        }
    }

    fn next_byte(&mut self) -> Result<u8> {
        if self.chunk_pos == self.chunk_len {
            self.chunk_pos = 0;
            self.chunk_len = loop {
                match self.inner.read(&mut self.chunk) {
                    Ok(0) => return Err(Error::corrupt("unexpected end of stream")),
                    Ok(n) => break n,
                    Err(e) if e.kind() == ErrorKind::Interrupted => {}
                    Err(e) => return Err(e.into()),
                }
            };
        }

        let byte = self.chunk[self.chunk_pos];
        self.chunk_pos += 1;
        Ok(byte)
    }

    /// Read `count` bits (at most 32) as an unsigned value
    pub(crate) fn read_bits(&mut self, count: u32) -> Result<u32> {
        debug_assert!(count <= 32);
        while self.available < count {
            self.buffer = (self.buffer << 8) | self.next_byte()? as u64;
            self.available += 8;
        }

        self.available -= count;
        let mask = (1u64 << count) - 1;
        Ok(((self.buffer >> self.available) & mask) as u32)
    }

    pub(crate) fn read_bit(&mut self) -> Result<bool> {
        Ok(self.read_bits(1)? == 1)
    }

    pub(crate) fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bits(8)? as u8)
    }

    pub(crate) fn read_u32(&mut self) -> Result<u32> {
        self.read_bits(32)
    }

    /// Read a 48-bit block or end-of-stream magic
    pub(crate) fn read_u48(&mut self) -> Result<u64> {
        let high = self.read_bits(24)? as u64;
        let low = self.read_bits(24)? as u64;
        Ok((high << 24) | low)
    }
}
