//! Cryptographic operations for MPQ files
//!
//! A single 0x500-entry table drives two things:
//!
//! - **Hashing**: the salted name hash used to index the hash table, to
//!   check both name halves, and to derive encryption keys
//! - **Encryption/Decryption**: the keystream cipher protecting the hash
//!   table, the block table, block-position tables and file blocks
//!
//! ## Examples
//!
//! ```
//! use heroes_mpq::crypto::{hash_string, hash_type};
//!
//! let table_hash = hash_string("(listfile)", hash_type::TABLE_OFFSET);
//! assert_eq!(table_hash, 0x5F3D_E859);
//!
//! // Table keys are hashes of fixed names
//! assert_eq!(hash_string("(hash table)", hash_type::FILE_KEY), 0xC3AF_3770);
//! ```

mod decryption;
mod encryption;
mod hash;
mod keys;
mod types;

// Re-export public API
pub use decryption::{decrypt_block, decrypt_bytes, decrypt_dword, detect_file_seed};
pub use encryption::{encrypt_block, encrypt_bytes};
pub use hash::{base_name, hash_string, hash_string_with};
pub use keys::{CryptTable, ENCRYPTION_TABLE, ENCRYPTION_TABLE_LEN};
pub use types::hash_type;

/// Calculate the three lookup hashes for a filename.
///
/// Returns `(hash_a, hash_b, hash_offset)`.
pub fn calculate_mpq_hashes(filename: &str) -> (u32, u32, u32) {
    let hash_a = hash_string(filename, hash_type::NAME_A);
    let hash_b = hash_string(filename, hash_type::NAME_B);
    let hash_offset = hash_string(filename, hash_type::TABLE_OFFSET);
    (hash_a, hash_b, hash_offset)
}

/// Derive the encryption key of a stored file
///
/// The key hashes the base name of `filename`. Entries flagged
/// key-adjusted mix in their offset and logical size.
pub fn file_key(filename: &str, file_offset: u32, file_size: u32, adjusted: bool) -> u32 {
    let key = hash_string(base_name(filename), hash_type::FILE_KEY);
    if adjusted {
        key.wrapping_add(file_offset) ^ file_size
    } else {
        key
    }
}
