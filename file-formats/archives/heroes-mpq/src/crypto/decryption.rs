//! Decryption operations for MPQ files

use super::keys::{CryptTable, ENCRYPTION_TABLE};
use super::types::SEED2_INIT;

/// Running state of the keystream cipher
///
/// Encryption and decryption advance the key identically; they differ only
/// in whether the plaintext or the ciphertext feeds the second accumulator,
/// and in both cases that value is the plaintext.
#[derive(Debug, Clone)]
pub(crate) struct Keystream<'t> {
    table: &'t CryptTable,
    key: u32,
    seed: u32,
}

impl<'t> Keystream<'t> {
    pub(crate) fn new(table: &'t CryptTable, key: u32) -> Self {
        Self {
            table,
            key,
            seed: SEED2_INIT,
        }
    }

    #[inline]
    fn mask(&mut self) -> u32 {
        self.seed = self.seed.wrapping_add(self.table.keystream(self.key));
        let mask = self.key.wrapping_add(self.seed);
        self.key = (!self.key << 0x15).wrapping_add(0x1111_1111) | (self.key >> 0x0B);
        mask
    }

    #[inline]
    fn absorb(&mut self, plain: u32) {
        self.seed = plain
            .wrapping_add(self.seed)
            .wrapping_add(self.seed << 5)
            .wrapping_add(3);
    }

    #[inline]
    pub(crate) fn decrypt(&mut self, value: u32) -> u32 {
        let plain = value ^ self.mask();
        self.absorb(plain);
        plain
    }

    #[inline]
    pub(crate) fn encrypt(&mut self, plain: u32) -> u32 {
        let value = plain ^ self.mask();
        self.absorb(plain);
        value
    }
}

/// Decrypt a block of data
pub fn decrypt_block(data: &mut [u32], key: u32) {
    let mut stream = Keystream::new(&ENCRYPTION_TABLE, key);
    for value in data.iter_mut() {
        *value = stream.decrypt(*value);
    }
}

/// Decrypt a byte buffer in place
///
/// The buffer is processed as little-endian 32-bit words. A trailing
/// remainder of 1-3 bytes is left untouched.
pub fn decrypt_bytes(data: &mut [u8], key: u32) {
    let mut stream = Keystream::new(&ENCRYPTION_TABLE, key);
    for chunk in data.chunks_exact_mut(4) {
        let value = u32::from_le_bytes([chunk[0], chunk[1], chunk[2], chunk[3]]);
        chunk.copy_from_slice(&stream.decrypt(value).to_le_bytes());
    }
}

/// Decrypt a single DWORD value
pub fn decrypt_dword(value: u32, key: u32) -> u32 {
    Keystream::new(&ENCRYPTION_TABLE, key).decrypt(value)
}

/// Recover a file key from two encrypted words and the known plaintext of the first.
///
/// Tries all 256 keystream rows for the low byte of the key and accepts a
/// candidate when the second word decrypts to a value below `0x40000`,
/// which holds for the first entries of a block-position table. Returns
/// `None` if no candidate fits.
pub fn detect_file_seed(value0: u32, value1: u32, decrypted: u32) -> Option<u32> {
    let table = &ENCRYPTION_TABLE;
    let temp = (value0 ^ decrypted).wrapping_sub(SEED2_INIT);

    for row in 0..0x100 {
        let candidate = temp.wrapping_sub(table.get(0x400 + row));
        let mut stream = Keystream::new(table, candidate);

        if stream.decrypt(value0) != decrypted {
            continue;
        }

        if stream.decrypt(value1) & 0xFFFC_0000 == 0 {
            return Some(candidate);
        }
    }

    None
}
