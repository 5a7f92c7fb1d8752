//! Block table implementation for MPQ archives

use super::common::{BLOCK_TABLE_KEY, le_u32, read_encrypted_table};
use crate::Result;
use crate::header::TABLE_ENTRY_SIZE;
use bitflags::bitflags;
use std::io::{Read, Seek};

bitflags! {
    /// Storage flags of a block table record
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileFlags: u32 {
        /// PKWARE implode compression
        const IMPLODE = 0x0000_0100;
        /// Per-block compression with a method byte in front of every block
        const COMPRESS = 0x0000_0200;
        /// Any compression
        const COMPRESSED = 0x0000_FF00;
        /// File is encrypted
        const ENCRYPTED = 0x0001_0000;
        /// Encryption key is adjusted by block offset and file size
        const FIX_KEY = 0x0002_0000;
        /// File is stored as a single unit rather than split into blocks
        const SINGLE_UNIT = 0x0100_0000;
        /// File has a trailing checksum slot in its block-position table
        const SECTOR_CRC = 0x0400_0000;
        /// File exists
        const EXISTS = 0x8000_0000;
    }
}

/// Block table entry (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockEntry {
    /// Offset of the file data, relative to the archive header
    pub file_pos: u32,
    /// Compressed file size
    pub compressed_size: u32,
    /// Uncompressed file size
    pub file_size: u32,
    /// File flags
    pub flags: FileFlags,
}

impl BlockEntry {
    /// Decode a record from 16 decrypted bytes
    fn from_record(record: &[u8]) -> Self {
        Self {
            file_pos: le_u32(record, 0),
            compressed_size: le_u32(record, 4),
            file_size: le_u32(record, 8),
            flags: FileFlags::from_bits_retain(le_u32(record, 12)),
        }
    }

    /// Check if the file is compressed
    pub fn is_compressed(&self) -> bool {
        self.flags.intersects(FileFlags::COMPRESSED)
    }

    /// Check if the file is encrypted
    pub fn is_encrypted(&self) -> bool {
        self.flags.contains(FileFlags::ENCRYPTED)
    }

    /// Check if the file is stored as a single unit
    pub fn is_single_unit(&self) -> bool {
        self.flags.contains(FileFlags::SINGLE_UNIT)
    }

    /// Check if the block-position table carries a checksum slot
    pub fn has_sector_crc(&self) -> bool {
        self.flags.contains(FileFlags::SECTOR_CRC)
    }

    /// Check if the encryption key is adjusted by offset and size
    pub fn has_fix_key(&self) -> bool {
        self.flags.contains(FileFlags::FIX_KEY)
    }

    /// Check if the record describes a file at all
    ///
    /// Any nonzero flag word counts; freed records are zeroed.
    pub fn exists(&self) -> bool {
        !self.flags.is_empty()
    }
}

/// Block table
#[derive(Debug, Clone)]
pub struct BlockTable {
    entries: Vec<BlockEntry>,
}

impl BlockTable {
    /// Read and decrypt a block table from the archive
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        let raw_data = read_encrypted_table(reader, offset, size, BLOCK_TABLE_KEY)?;

        let entries: Vec<BlockEntry> = raw_data
            .chunks_exact(TABLE_ENTRY_SIZE as usize)
            .map(BlockEntry::from_record)
            .collect();

        log::debug!("Loaded block table with {} entries", entries.len());
        Ok(Self { entries })
    }

    /// Get all entries
    pub fn entries(&self) -> &[BlockEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&BlockEntry> {
        self.entries.get(index)
    }

    /// Get the number of entries
    pub fn size(&self) -> usize {
        self.entries.len()
    }
}
