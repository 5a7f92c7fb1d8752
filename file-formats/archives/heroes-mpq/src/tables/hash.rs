//! Hash table implementation for MPQ archives

use super::common::{HASH_TABLE_KEY, le_u32, read_encrypted_table};
use crate::crypto::{decrypt_bytes, hash_string, hash_type};
use crate::header::TABLE_ENTRY_SIZE;
use crate::{Error, Result};
use std::io::{Read, Seek};

/// Hash table entry (16 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HashEntry {
    /// The hash of the full file name (part A)
    pub name_1: u32,
    /// The hash of the full file name (part B)
    pub name_2: u32,
    /// The language of the file (Windows LANGID)
    pub locale: u16,
    /// The platform the file is used for
    pub platform: u16,
    /// Block table index or special value
    pub block_index: u32,
}

impl HashEntry {
    /// Value indicating the hash entry has never been used
    pub const EMPTY_NEVER_USED: u32 = 0xFFFFFFFF;
    /// Value indicating the hash entry was deleted
    pub const EMPTY_DELETED: u32 = 0xFFFFFFFE;

    /// Check if this entry has never been used
    pub fn is_empty(&self) -> bool {
        self.block_index == Self::EMPTY_NEVER_USED
    }

    /// Check if this entry was deleted
    pub fn is_deleted(&self) -> bool {
        self.block_index == Self::EMPTY_DELETED
    }

    /// Decode a record from 16 decrypted bytes
    fn from_record(record: &[u8]) -> Self {
        Self {
            name_1: le_u32(record, 0),
            name_2: le_u32(record, 4),
            locale: u16::from_le_bytes([record[8], record[9]]),
            platform: u16::from_le_bytes([record[10], record[11]]),
            block_index: le_u32(record, 12),
        }
    }
}

/// Hash table
#[derive(Debug, Clone)]
pub struct HashTable {
    entries: Vec<HashEntry>,
    mask: usize,
}

impl HashTable {
    /// Read and decrypt a hash table from the archive
    pub fn read<R: Read + Seek>(reader: &mut R, offset: u64, size: u32) -> Result<Self> {
        if !size.is_power_of_two() {
            return Err(Error::invalid_format("Hash table size must be power of 2"));
        }

        let raw_data = read_encrypted_table(reader, offset, size, HASH_TABLE_KEY)?;
        Ok(Self::decode(&raw_data))
    }

    /// Create a hash table from encrypted bytes
    pub fn from_bytes(data: &[u8], size: u32) -> Result<Self> {
        if !size.is_power_of_two() {
            return Err(Error::invalid_format("Hash table size must be power of 2"));
        }

        let expected_size = size as usize * TABLE_ENTRY_SIZE as usize;
        if data.len() < expected_size {
            return Err(Error::invalid_format("Insufficient data for hash table"));
        }

        let mut raw_data = data[..expected_size].to_vec();
        decrypt_bytes(&mut raw_data, hash_string(HASH_TABLE_KEY, hash_type::FILE_KEY));
        Ok(Self::decode(&raw_data))
    }

    fn decode(raw_data: &[u8]) -> Self {
        let entries: Vec<HashEntry> = raw_data
            .chunks_exact(TABLE_ENTRY_SIZE as usize)
            .map(HashEntry::from_record)
            .collect();
        let mask = entries.len().saturating_sub(1);

        log::debug!("Loaded hash table with {} entries", entries.len());
        Self { entries, mask }
    }

    /// Get all entries
    pub fn entries(&self) -> &[HashEntry] {
        &self.entries
    }

    /// Get a specific entry
    pub fn get(&self, index: usize) -> Option<&HashEntry> {
        self.entries.get(index)
    }

    /// Get the size of the hash table
    pub fn size(&self) -> usize {
        self.entries.len()
    }

    /// Find a file in the hash table
    ///
    /// Scans forward from the name's home slot to the end of the table, then
    /// from the start back up to the home slot, and returns the first entry
    /// whose two name hashes match. Every slot is visited at most once.
    /// Empty and deleted slots do not stop the scan.
    pub fn find_file(&self, filename: &str) -> Option<(usize, &HashEntry)> {
        let name_a = hash_string(filename, hash_type::NAME_A);
        let name_b = hash_string(filename, hash_type::NAME_B);
        let home = hash_string(filename, hash_type::TABLE_OFFSET) as usize & self.mask;

        (home..self.entries.len())
            .chain(0..home)
            .map(|index| (index, &self.entries[index]))
            .find(|(_, entry)| entry.name_1 == name_a && entry.name_2 == name_b)
    }
}
