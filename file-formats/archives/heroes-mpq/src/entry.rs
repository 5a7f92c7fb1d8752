//! Archive entries: block table records with their resolved names

use crate::crypto::file_key;
use crate::tables::{BlockEntry, FileFlags};
use std::fmt;

/// A stored file, as seen by callers
///
/// Entries start out anonymous and are named either by the listfile or by
/// an explicit lookup. Naming an entry derives its encryption seed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveEntry {
    index: usize,
    file_offset: u32,
    file_position: u64,
    compressed_size: u32,
    file_size: u32,
    flags: FileFlags,
    name: Option<String>,
    encryption_seed: u32,
}

impl ArchiveEntry {
    /// Build an anonymous entry from block table record `index`
    pub(crate) fn new(index: usize, block: &BlockEntry, header_offset: u64) -> Self {
        Self {
            index,
            file_offset: block.file_pos,
            file_position: header_offset + block.file_pos as u64,
            compressed_size: block.compressed_size,
            file_size: block.file_size,
            flags: block.flags,
            name: None,
            encryption_seed: 0,
        }
    }

    /// Attach a name and derive the encryption seed from it
    pub(crate) fn set_name(&mut self, name: impl Into<String>) {
        let name = name.into();
        self.encryption_seed = file_key(
            &name,
            self.file_offset,
            self.file_size,
            self.flags.contains(FileFlags::FIX_KEY),
        );
        self.name = Some(name);
    }

    /// Position in the block table
    pub fn index(&self) -> usize {
        self.index
    }

    /// Resolved file name, if known
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Offset of the data relative to the archive header
    pub fn file_offset(&self) -> u32 {
        self.file_offset
    }

    /// Absolute offset of the data in the byte source
    pub fn file_position(&self) -> u64 {
        self.file_position
    }

    /// Stored size
    pub fn compressed_size(&self) -> u32 {
        self.compressed_size
    }

    /// Logical (decompressed) size
    pub fn file_size(&self) -> u32 {
        self.file_size
    }

    /// Raw storage flags
    pub fn flags(&self) -> FileFlags {
        self.flags
    }

    /// Encryption seed, 0 while the name is unknown
    pub fn encryption_seed(&self) -> u32 {
        self.encryption_seed
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

    /// Check if the record describes a file at all
    pub fn exists(&self) -> bool {
        !self.flags.is_empty()
    }
}

impl fmt::Display for ArchiveEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.name {
            Some(name) => f.write_str(name),
            None if !self.exists() => f.write_str("(Deleted file)"),
            None => write!(f, "Unknown file @ {}", self.file_position),
        }
    }
}
