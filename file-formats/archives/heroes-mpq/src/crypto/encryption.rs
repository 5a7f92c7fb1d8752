//! Encryption operations for MPQ files
//!
//! The reader never writes archives; encryption exists so callers can build
//! fixtures and check that the cipher inverts.

use super::decryption::Keystream;
use super::keys::ENCRYPTION_TABLE;

/// Encrypt a block of data
pub fn encrypt_block(data: &mut [u32], key: u32) {
    let mut stream = Keystream::new(&ENCRYPTION_TABLE, key);
    for value in data.iter_mut() {
        *value = stream.encrypt(*value);
    }
}

/// Encrypt a byte buffer in place, leaving a trailing 1-3 byte remainder untouched
pub fn encrypt_bytes(data: &mut [u8], key: u32) {
    let mut stream = Keystream::new(&ENCRYPTION_TABLE, key);
    for chunk in data.chunks_exact_mut(4) {
        let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&stream.encrypt(value).to_le_bytes());
    }
}
