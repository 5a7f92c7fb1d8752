//! # heroes_mpq - Replay MPQ Reader
//!
//! A safe Rust reader for the legacy MPQ (Mo'PaQ) archive format as used by
//! Heroes of the Storm and StarCraft II replay files.
//!
//! ## Features
//!
//! - Archives embedded behind a user data header (`MPQ\x1B`)
//! - Encrypted hash and block tables, encrypted files
//! - File naming from the archive's `(listfile)`
//! - Single-unit and multi-block files
//! - Zlib and bzip2 decompression, with a self-contained bzip2 decoder
//!
//! ## Examples
//!
//! ```no_run
//! use heroes_mpq::Archive;
//!
//! # fn main() -> Result<(), heroes_mpq::Error> {
//! let mut archive = Archive::open("example.StormReplay")?;
//!
//! // Entries named by the (listfile)
//! for entry in archive.entries() {
//!     println!("{entry}: {} bytes", entry.file_size());
//! }
//!
//! // Extract a specific file
//! let details = archive.read_file("replay.details")?;
//! # Ok(())
//! # }
//! ```

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(
    missing_docs,
    missing_debug_implementations,
    rust_2018_idioms,
    unreachable_pub
)]

pub mod archive;
pub mod compression;
pub mod crypto;
pub mod entry;
pub mod error;
pub mod header;
pub mod special_files;
pub mod tables;

// Re-export commonly used types
pub use archive::{Archive, OpenOptions};
pub use compression::CompressionMethod;
pub use entry::ArchiveEntry;
pub use error::{Error, Result};
pub use header::{MpqHeader, UserDataHeader};
pub use tables::{BlockEntry, BlockTable, FileFlags, HashEntry, HashTable};

pub use crypto::{decrypt_block, encrypt_block, hash_string, hash_type};

/// MPQ signature constants
pub mod signatures {
    /// Standard MPQ archive signature ('MPQ\x1A')
    pub const MPQ_ARCHIVE: u32 = crate::header::MPQ_HEADER_SIGNATURE;

    /// MPQ user data signature ('MPQ\x1B')
    pub const MPQ_USERDATA: u32 = crate::header::MPQ_USERDATA_SIGNATURE;

    /// BZip2 stream magic ('BZh')
    pub const BZIP2_STREAM: [u8; 3] = *b"BZh";
}

/// Block size calculation
#[inline]
pub fn calculate_sector_size(block_size_shift: u16) -> usize {
    512 << block_size_shift
}
