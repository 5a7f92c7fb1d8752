//! Hash algorithm for MPQ file name hashing

use super::keys::{CryptTable, ENCRYPTION_TABLE};
use super::types::SEED2_INIT;

/// Hash a string using the MPQ hash algorithm
///
/// ASCII letters are folded to upper case, so the hash is case-insensitive.
/// Path separators are hashed as-is.
pub fn hash_string(filename: &str, hash_type: u32) -> u32 {
    hash_string_with(&ENCRYPTION_TABLE, filename, hash_type)
}

/// Hash a string against an explicit table
///
/// Only the low two bits of `hash_type` select the salt block.
pub fn hash_string_with(table: &CryptTable, filename: &str, hash_type: u32) -> u32 {
    let salt = (hash_type as usize & 0x3) * 0x100;
    let mut seed1: u32 = 0x7FED_7FED;
    let mut seed2: u32 = SEED2_INIT;

    for &byte in filename.as_bytes() {
        let ch = byte.to_ascii_uppercase();

        seed1 = table.get(salt + ch as usize) ^ seed1.wrapping_add(seed2);
        seed2 = (ch as u32)
            .wrapping_add(seed1)
            .wrapping_add(seed2)
            .wrapping_add(seed2 << 5)
            .wrapping_add(3);
    }

    seed1
}

/// The last path component of an archive name.
///
/// Both `\` and `/` count as separators.
pub fn base_name(filename: &str) -> &str {
    filename
        .rfind(['\\', '/'])
        .map_or(filename, |pos| &filename[pos + 1..])
}
