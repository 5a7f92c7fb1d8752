//! Cryptographic types and constants

/// Hash types for MPQ operations
///
/// Each value selects a 256-entry block of the encryption table; the salt
/// offset into the table is `hash_type * 0x100`.
pub mod hash_type {
    /// Hash for table offset calculation
    pub const TABLE_OFFSET: u32 = 0;
    /// First part of filename hash
    pub const NAME_A: u32 = 1;
    /// Second part of filename hash
    pub const NAME_B: u32 = 2;
    /// File encryption key generation
    pub const FILE_KEY: u32 = 3;
}

/// Initial value of the second keystream accumulator
pub(crate) const SEED2_INIT: u32 = 0xEEEE_EEEE;
