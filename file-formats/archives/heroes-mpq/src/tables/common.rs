//! Common utilities for MPQ tables

use crate::crypto::{decrypt_bytes, hash_string, hash_type};
use crate::header::TABLE_ENTRY_SIZE;
use crate::Result;
use std::io::{Read, Seek, SeekFrom};

/// Key name of the hash table
pub(crate) const HASH_TABLE_KEY: &str = "(hash table)";

/// Key name of the block table
pub(crate) const BLOCK_TABLE_KEY: &str = "(block table)";

/// Read `count` encrypted 16-byte records at `offset` and decrypt them with the key named `key_name`
pub(crate) fn read_encrypted_table<R: Read + Seek>(
    reader: &mut R,
    offset: u64,
    count: u32,
    key_name: &str,
) -> Result<Vec<u8>> {
    reader.seek(SeekFrom::Start(offset))?;

    let mut raw_data = vec![0u8; count as usize * TABLE_ENTRY_SIZE as usize];
    reader.read_exact(&mut raw_data)?;

    decrypt_table_data(&mut raw_data, key_name);
    Ok(raw_data)
}

/// Decrypt table data in place with the key named `key_name`
pub(crate) fn decrypt_table_data(data: &mut [u8], key_name: &str) {
    decrypt_bytes(data, hash_string(key_name, hash_type::FILE_KEY));
}

/// Little-endian u32 at `pos` of a 16-byte record
#[inline]
pub(crate) fn le_u32(record: &[u8], pos: usize) -> u32 {
    u32::from_le_bytes([
        record[pos],
        record[pos + 1],
        record[pos + 2],
        record[pos + 3],
    ])
}
