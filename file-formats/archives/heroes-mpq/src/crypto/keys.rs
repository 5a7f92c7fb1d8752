//! The shared encryption table

/// Number of entries in the encryption table
pub const ENCRYPTION_TABLE_LEN: usize = 0x500;

/// Offset of the block within the table that drives the keystream
pub(crate) const KEYSTREAM_OFFSET: usize = 0x400;

/// Immutable lookup table behind both the name hash and the keystream cipher.
///
/// The table is five 256-entry blocks derived from a fixed linear
/// congruential generator. Blocks 0..=3 salt the name hash, block 4 feeds
/// the cipher.
#[derive(Clone)]
pub struct CryptTable([u32; ENCRYPTION_TABLE_LEN]);

impl CryptTable {
    /// Build the table from the fixed generator seed
    pub const fn new() -> Self {
        let mut table = [0u32; ENCRYPTION_TABLE_LEN];
        let mut seed: u32 = 0x0010_0001;

        let mut index1 = 0;
        while index1 < 0x100 {
            let mut index2 = index1;
            let mut i = 0;
            while i < 5 {
                seed = (seed * 125 + 3) % 0x002A_AAAB;
                let high = (seed & 0xFFFF) << 16;
                seed = (seed * 125 + 3) % 0x002A_AAAB;
                table[index2] = high | (seed & 0xFFFF);

                i += 1;
                index2 += 0x100;
            }
            index1 += 1;
        }

        CryptTable(table)
    }

    /// Look up a single entry
    #[inline]
    pub const fn get(&self, index: usize) -> u32 {
        self.0[index]
    }

    /// Entry of the keystream block selected by the low byte of `seed`
    #[inline]
    pub(crate) const fn keystream(&self, seed: u32) -> u32 {
        self.0[KEYSTREAM_OFFSET + (seed & 0xFF) as usize]
    }

    /// View the raw table
    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }
}

impl Default for CryptTable {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CryptTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CryptTable")
            .field("len", &self.0.len())
            .finish_non_exhaustive()
    }
}

/// The table, evaluated at compile time and shared read-only
pub static ENCRYPTION_TABLE: CryptTable = CryptTable::new();
