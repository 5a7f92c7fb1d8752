//! Block decoding and output state machine

use super::bit_reader::BitReader;
use super::crc::{BlockCrc, combine};
use super::huffman::{HuffmanTable, MAX_ALPHA_SIZE};
use super::rand::Derandomizer;
use crate::{Error, Result};
use std::io::{self, Read};

const STREAM_MAGIC: &[u8; 3] = b"BZh";
const BLOCK_MAGIC: u64 = 0x3141_5926_5359;
const END_OF_STREAM_MAGIC: u64 = 0x1772_4538_5090;

/// Bytes per block-size step of the stream header digit
pub const BLOCK_SIZE_MULTIPLE: usize = 100_000;

const MIN_GROUPS: usize = 2;
const MAX_GROUPS: usize = 6;
const GROUP_SIZE: u32 = 50;
const MAX_SELECTORS: usize = 2 + 900_000 / GROUP_SIZE as usize;
const RUNA: u16 = 0;
const RUNB: u16 = 1;
const MAX_RUN: u32 = 2 * 1024 * 1024;

/// Reusable per-block working memory
///
/// Buffers grow to the largest block seen and are cleared, never shrunk,
/// between blocks. A scratch arena may be handed from one decoder to the
/// next; nothing decoded earlier survives into a new block.
#[derive(Debug, Clone)]
pub struct Scratch {
    ll8: Vec<u8>,
    tt: Vec<u32>,
    seq_to_unseq: Vec<u8>,
    selectors: Vec<u8>,
    lengths: Vec<u8>,
    tables: Vec<HuffmanTable>,
}

impl Scratch {
    /// Create an empty arena
    pub fn new() -> Self {
        Self {
            ll8: Vec::new(),
            tt: Vec::new(),
            seq_to_unseq: Vec::with_capacity(256),
            selectors: Vec::new(),
            lengths: vec![0; MAX_ALPHA_SIZE],
            tables: vec![HuffmanTable::new(); MAX_GROUPS],
        }
    }

    /// Number of block bytes the arena can hold without reallocating
    pub fn capacity(&self) -> usize {
        self.ll8.capacity().min(self.tt.capacity())
    }
}

impl Default for Scratch {
    fn default() -> Self {
        Self::new()
    }
}

/// Output side of a decoded block: BWT traversal, derandomisation and the
/// initial run-length stage
#[derive(Debug)]
struct Drain {
    t_pos: u32,
    remaining: u32,
    rand: Option<Derandomizer>,
    last: u8,
    run: u8,
    repeat: u8,
    crc: BlockCrc,
    expected_crc: u32,
}

impl Drain {
    fn fill(&mut self, scratch: &Scratch, out: &mut [u8]) -> usize {
        let mut written = 0;

        while written < out.len() {
            if self.repeat > 0 {
                self.repeat -= 1;
                self.emit(self.last, &mut out[written]);
                written += 1;
                continue;
            }

            if self.remaining == 0 {
                break;
            }

            let pos = self.t_pos as usize;
            let mut byte = scratch.ll8[pos];
            self.t_pos = scratch.tt[pos];
            self.remaining -= 1;
            if let Some(rand) = self.rand.as_mut() {
                byte ^= rand.next_mask();
            }

            if self.run == 4 {
                // Fifth byte of a run is a repeat count
                self.repeat = byte;
                self.run = 0;
                continue;
            }

            if self.run > 0 && byte == self.last {
                self.run += 1;
            } else {
                self.last = byte;
                self.run = 1;
            }

            self.emit(byte, &mut out[written]);
            written += 1;
        }

        written
    }

    #[inline]
    fn emit(&mut self, byte: u8, slot: &mut u8) {
        self.crc.update(byte);
        *slot = byte;
    }

    fn is_done(&self) -> bool {
        self.remaining == 0 && self.repeat == 0
    }
}

#[derive(Debug)]
enum State {
    StreamHeader,
    NextBlock,
    Draining(Drain),
    Finished,
}

/// Streaming bzip2 decoder
///
/// Pulls compressed bytes from `R` and hands out decompressed bytes on
/// demand. One block is decoded eagerly into the scratch arena; its
/// output is produced as the caller reads. Every block checksum and the
/// final stream checksum are verified.
#[derive(Debug)]
pub struct Bzip2Decoder<R> {
    bits: BitReader<R>,
    scratch: Scratch,
    state: State,
    block_size_max: usize,
    combined_crc: u32,
    blocks: usize,
}

impl<R: Read> Bzip2Decoder<R> {
    /// Create a decoder with a fresh scratch arena
    pub fn new(reader: R) -> Self {
        Self::with_scratch(reader, Scratch::new())
    }

    /// Create a decoder that reuses an existing scratch arena
    pub fn with_scratch(reader: R, scratch: Scratch) -> Self {
        Self {
            bits: BitReader::new(reader),
            scratch,
            state: State::StreamHeader,
            block_size_max: 0,
            combined_crc: 0,
            blocks: 0,
        }
    }

    /// Give back the scratch arena for reuse
    pub fn into_scratch(self) -> Scratch {
        self.scratch
    }

    /// Block size multiplier from the stream header (1-9), once read
    pub fn level(&self) -> Option<u8> {
        match self.block_size_max {
            0 => None,
            max => Some((max / BLOCK_SIZE_MULTIPLE) as u8),
        }
    }

    /// Whether the end-of-stream marker and checksum have been consumed
    pub fn is_finished(&self) -> bool {
        matches!(self.state, State::Finished)
    }

    /// Decompress into `out`, returning the number of bytes written.
    ///
    /// Returns 0 only once the stream is finished (or `out` is empty).
    pub fn decode(&mut self, out: &mut [u8]) -> Result<usize> {
        let mut written = 0;

        while written < out.len() {
            match &mut self.state {
                State::StreamHeader => {
                    self.read_stream_header()?;
                    self.state = State::NextBlock;
                }
                State::NextBlock => {
                    self.state = match self.read_block()? {
                        Some(drain) => State::Draining(drain),
                        None => State::Finished,
                    };
                }
                State::Draining(drain) => {
                    written += drain.fill(&self.scratch, &mut out[written..]);
                    if drain.is_done() {
                        let (actual, expected) = (drain.crc.finish(), drain.expected_crc);
                        if actual != expected {
                            return Err(Error::corrupt(format!(
                                "block {} CRC mismatch: stored 0x{expected:08X}, computed 0x{actual:08X}",
                                self.blocks
                            )));
                        }
                        self.combined_crc = combine(self.combined_crc, actual);
                        self.state = State::NextBlock;
                    }
                }
                State::Finished => break,
            }
        }

        Ok(written)
    }

    fn read_stream_header(&mut self) -> Result<()> {
        let mut magic = [0u8; 3];
        for byte in &mut magic {
            *byte = self.bits.read_u8()?;
        }
        if &magic != STREAM_MAGIC {
            return Err(Error::corrupt("bad bzip2 stream magic"));
        }

        let level = self.bits.read_u8()?;
        if !(b'1'..=b'9').contains(&level) {
            return Err(Error::corrupt(format!(
                "bad block size digit 0x{level:02X}"
            )));
        }

        self.block_size_max = (level - b'0') as usize * BLOCK_SIZE_MULTIPLE;
        log::trace!("bzip2 stream with {} byte blocks", self.block_size_max);
        Ok(())
    }

    /// Decode the next block into the scratch arena, or consume the end of stream
    fn read_block(&mut self) -> Result<Option<Drain>> {
        match self.bits.read_u48()? {
            BLOCK_MAGIC => {}
            END_OF_STREAM_MAGIC => {
                let stored = self.bits.read_u32()?;
                if stored != self.combined_crc {
                    return Err(Error::corrupt(format!(
                        "stream CRC mismatch: stored 0x{stored:08X}, computed 0x{:08X}",
                        self.combined_crc
                    )));
                }
                log::trace!("bzip2 stream finished after {} blocks", self.blocks);
                return Ok(None);
            }
            other => {
                return Err(Error::corrupt(format!("bad block magic 0x{other:012X}")));
            }
        }

        self.blocks += 1;
        let expected_crc = self.bits.read_u32()?;
        let randomised = self.bits.read_bit()?;
        let orig_ptr = self.bits.read_bits(24)?;

        let n_in_use = self.read_symbol_map()?;
        let alpha_size = n_in_use + 2;
        let n_groups = self.read_selectors()?;
        self.read_coding_tables(n_groups, alpha_size)?;
        self.read_symbols(n_in_use)?;

        let block_len = self.scratch.ll8.len();
        if orig_ptr as usize >= block_len {
            return Err(Error::corrupt(format!(
                "origin pointer {orig_ptr} outside block of {block_len} bytes"
            )));
        }

        self.inverse_bwt()?;

        log::trace!(
            "bzip2 block {}: {block_len} bytes, {n_groups} groups, randomised={randomised}",
            self.blocks
        );

        Ok(Some(Drain {
            t_pos: self.scratch.tt[orig_ptr as usize],
            remaining: block_len as u32,
            rand: randomised.then(Derandomizer::default),
            last: 0,
            run: 0,
            repeat: 0,
            crc: BlockCrc::new(),
            expected_crc,
        }))
    }

    /// Read the used-byte bitmap; returns the number of bytes in use
    fn read_symbol_map(&mut self) -> Result<usize> {
        let scratch = &mut self.scratch;
        scratch.seq_to_unseq.clear();

        let in_use16 = self.bits.read_bits(16)?;
        for i in 0..16u32 {
            if in_use16 & (0x8000 >> i) == 0 {
                continue;
            }
            let in_use = self.bits.read_bits(16)?;
            for j in 0..16u32 {
                if in_use & (0x8000 >> j) != 0 {
                    scratch.seq_to_unseq.push((i * 16 + j) as u8);
                }
            }
        }

        if scratch.seq_to_unseq.is_empty() {
            return Err(Error::corrupt("block uses no symbols"));
        }
        Ok(scratch.seq_to_unseq.len())
    }

    /// Read and un-MTF the selector list; returns the number of groups
    fn read_selectors(&mut self) -> Result<usize> {
        let n_groups = self.bits.read_bits(3)? as usize;
        if !(MIN_GROUPS..=MAX_GROUPS).contains(&n_groups) {
            return Err(Error::corrupt(format!("invalid group count {n_groups}")));
        }

        let n_selectors = self.bits.read_bits(15)? as usize;
        if n_selectors == 0 {
            return Err(Error::corrupt("block has no selectors"));
        }

        let mut order: [u8; MAX_GROUPS] = [0, 1, 2, 3, 4, 5];
        let selectors = &mut self.scratch.selectors;
        selectors.clear();

        for _ in 0..n_selectors {
            let mut index = 0usize;
            while self.bits.read_bit()? {
                index += 1;
                if index >= n_groups {
                    return Err(Error::corrupt("selector index out of range"));
                }
            }

            // Selectors past the maximum are read but ignored
            if selectors.len() < MAX_SELECTORS {
                let group = order[index];
                order.copy_within(0..index, 1);
                order[0] = group;
                selectors.push(group);
            }
        }

        Ok(n_groups)
    }

    fn read_coding_tables(&mut self, n_groups: usize, alpha_size: usize) -> Result<()> {
        for t in 0..n_groups {
            let lengths = &mut self.scratch.lengths[..alpha_size];
            let mut current = self.bits.read_bits(5)? as i32;

            for length in lengths.iter_mut() {
                loop {
                    if !(1..=20).contains(&current) {
                        return Err(Error::corrupt(format!(
                            "code length {current} out of range"
                        )));
                    }
                    if !self.bits.read_bit()? {
                        break;
                    }
                    if self.bits.read_bit()? {
                        current -= 1;
                    } else {
                        current += 1;
                    }
                }
                *length = current as u8;
            }

            self.scratch.tables[t].build(&self.scratch.lengths[..alpha_size]);
        }

        Ok(())
    }

    /// Huffman, run-length and move-to-front decode into `ll8`
    fn read_symbols(&mut self, n_in_use: usize) -> Result<()> {
        let end_of_block = (n_in_use + 1) as u16;
        let block_size_max = self.block_size_max;
        let Scratch {
            ll8,
            seq_to_unseq,
            selectors,
            tables,
            ..
        } = &mut self.scratch;
        let bits = &mut self.bits;

        ll8.clear();
        let mut mtf: [u8; 256] = std::array::from_fn(|i| i as u8);

        let mut group_index = 0usize;
        let mut group_left = 0u32;
        let mut current = 0usize;

        let mut next_symbol = || -> Result<u16> {
            if group_left == 0 {
                let group = *selectors
                    .get(group_index)
                    .ok_or_else(|| Error::corrupt("ran out of selectors"))?;
                current = group as usize;
                group_index += 1;
                group_left = GROUP_SIZE;
            }
            group_left -= 1;

            let symbol = tables[current].decode(&mut *bits)?;
            if symbol > end_of_block {
                return Err(Error::corrupt(format!("symbol {symbol} past end of block")));
            }
            Ok(symbol)
        };

        let mut symbol = next_symbol()?;
        loop {
            if symbol == end_of_block {
                break;
            }

            if symbol == RUNA || symbol == RUNB {
                let mut run = 0u32;
                let mut weight = 1u32;
                while symbol == RUNA || symbol == RUNB {
                    if weight >= MAX_RUN {
                        return Err(Error::corrupt("run length too long"));
                    }
                    run += if symbol == RUNA { weight } else { weight << 1 };
                    weight <<= 1;
                    symbol = next_symbol()?;
                }

                let byte = seq_to_unseq[mtf[0] as usize];
                if ll8.len() + run as usize > block_size_max {
                    return Err(Error::corrupt("block overruns its declared size"));
                }
                ll8.resize(ll8.len() + run as usize, byte);
                continue;
            }

            if ll8.len() >= block_size_max {
                return Err(Error::corrupt("block overruns its declared size"));
            }

            let index = (symbol - 1) as usize;
            let value = mtf[index];
            mtf.copy_within(0..index, 1);
            mtf[0] = value;
            ll8.push(seq_to_unseq[value as usize]);

            symbol = next_symbol()?;
        }

        Ok(())
    }

    /// Build the inverse Burrows-Wheeler transform vector in `tt`
    fn inverse_bwt(&mut self) -> Result<()> {
        let Scratch { ll8, tt, .. } = &mut self.scratch;
        let block_len = ll8.len();

        let mut counts = [0u32; 256];
        for &byte in ll8.iter() {
            counts[byte as usize] += 1;
        }

        let mut cftab = [0u32; 257];
        for i in 1..=256 {
            cftab[i] = cftab[i - 1] + counts[i - 1];
        }
        if cftab
            .windows(2)
            .any(|w| w[0] > w[1] || w[1] as usize > block_len)
        {
            return Err(Error::corrupt("cumulative frequency table out of range"));
        }

        tt.clear();
        tt.resize(block_len, 0);
        for (i, &byte) in ll8.iter().enumerate() {
            let slot = &mut cftab[byte as usize];
            tt[*slot as usize] = i as u32;
            *slot += 1;
        }

        Ok(())
    }
}

impl<R: Read> Read for Bzip2Decoder<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decode(buf).map_err(|e| match e {
            Error::Io(io_err) => io_err,
            other => io::Error::new(io::ErrorKind::InvalidData, other),
        })
    }
}
