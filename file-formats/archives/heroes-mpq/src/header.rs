//! MPQ header structures and parsing

use crate::{Error, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use std::io::{Read, Seek, SeekFrom};

/// MPQ archive header signature ('MPQ\x1A')
pub const MPQ_HEADER_SIGNATURE: u32 = 0x1A51504D;

/// MPQ user data header signature ('MPQ\x1B')
pub const MPQ_USERDATA_SIGNATURE: u32 = 0x1B51504D;

/// Default number of leading bytes returned by header dumps
pub const HEADER_BYTES: usize = 0x100;

/// Size of the fixed legacy header
pub const LEGACY_HEADER_SIZE: u32 = 0x20;

/// Size of the header once the extended offset fields are present
pub const EXTENDED_HEADER_SIZE: u32 = 0x2C;

/// Largest accepted block size exponent (16 MiB blocks)
pub const MAX_BLOCK_SIZE_SHIFT: u16 = 15;

/// Size in bytes of one hash- or block-table record
pub const TABLE_ENTRY_SIZE: u64 = 16;

/// MPQ user data header (optional, appears before main header)
///
/// Replay files keep their own metadata in the user data area and point to
/// the archive proper through `header_offset`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserDataHeader {
    /// Maximum size of the user data
    pub user_data_size: u32,
    /// Offset of the MPQ header, relative to the beginning of this header
    pub header_offset: u32,
    /// Size of user data header
    pub user_data_header_size: u32,
}

impl UserDataHeader {
    /// Read the fields following the user data signature
    fn read_body<R: Read>(reader: &mut R) -> Result<Self> {
        Ok(Self {
            user_data_size: reader.read_u32::<LittleEndian>()?,
            header_offset: reader.read_u32::<LittleEndian>()?,
            user_data_header_size: reader.read_u32::<LittleEndian>()?,
        })
    }
}

/// Main MPQ header structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpqHeader {
    /// Size of the archive header
    pub header_size: u32,
    /// Size of MPQ archive
    pub archive_size: u32,
    /// Format version
    pub format_version: u16,
    /// Block size (power of two exponent)
    pub block_size: u16,
    /// Offset to the hash table, relative to the header
    pub hash_table_pos: u32,
    /// Offset to the block table, relative to the header
    pub block_table_pos: u32,
    /// Number of entries in the hash table
    pub hash_table_size: u32,
    /// Number of entries in the block table
    pub block_table_size: u32,

    // Extended fields, present from format version 1
    /// Extended block table position
    pub hi_block_table_pos: Option<u64>,
    /// High 16 bits of hash table offset
    pub hash_table_pos_hi: Option<u16>,
    /// High 16 bits of block table offset
    pub block_table_pos_hi: Option<u16>,
}

impl MpqHeader {
    /// Read an MPQ header, starting at its signature
    pub fn read<R: Read>(reader: &mut R) -> Result<Self> {
        let signature = read_signature(reader)?;
        if signature != MPQ_HEADER_SIGNATURE {
            return Err(Error::invalid_format(format!(
                "Expected archive header, found signature 0x{signature:08X}"
            )));
        }
        Self::read_body(reader)
    }

    fn read_body<R: Read>(reader: &mut R) -> Result<Self> {
        let header_size = reader.read_u32::<LittleEndian>()?;
        let archive_size = reader.read_u32::<LittleEndian>()?;
        let format_version = reader.read_u16::<LittleEndian>()?;
        let block_size = reader.read_u16::<LittleEndian>()?;
        let hash_table_pos = reader.read_u32::<LittleEndian>()?;
        let block_table_pos = reader.read_u32::<LittleEndian>()?;
        let hash_table_size = reader.read_u32::<LittleEndian>()?;
        let block_table_size = reader.read_u32::<LittleEndian>()?;

        let mut header = MpqHeader {
            header_size,
            archive_size,
            format_version,
            block_size,
            hash_table_pos,
            block_table_pos,
            hash_table_size,
            block_table_size,
            hi_block_table_pos: None,
            hash_table_pos_hi: None,
            block_table_pos_hi: None,
        };

        if format_version >= 1 && header_size >= EXTENDED_HEADER_SIZE {
            header.hi_block_table_pos = Some(reader.read_u64::<LittleEndian>()?);
            header.hash_table_pos_hi = Some(reader.read_u16::<LittleEndian>()?);
            header.block_table_pos_hi = Some(reader.read_u16::<LittleEndian>()?);
        }

        header.validate()?;
        Ok(header)
    }

    /// Check the fields that do not depend on the size of the byte source
    pub fn validate(&self) -> Result<()> {
        if self.uses_extended_offsets() {
            return Err(Error::invalid_format(
                "Extended (64-bit) table offsets are not supported",
            ));
        }

        if self.hash_table_size == 0 || !self.hash_table_size.is_power_of_two() {
            return Err(Error::invalid_format(format!(
                "Hash table size {} is not a power of two",
                self.hash_table_size
            )));
        }

        if self.block_size > MAX_BLOCK_SIZE_SHIFT {
            return Err(Error::invalid_format(format!(
                "Block size exponent {} exceeds {MAX_BLOCK_SIZE_SHIFT}",
                self.block_size
            )));
        }

        Ok(())
    }

    /// Whether any of the extended offset fields is in use
    pub fn uses_extended_offsets(&self) -> bool {
        self.hi_block_table_pos.is_some_and(|pos| pos != 0)
            || self.hash_table_pos_hi.is_some_and(|hi| hi != 0)
            || self.block_table_pos_hi.is_some_and(|hi| hi != 0)
    }

    /// Calculate the sector size from block size
    pub fn sector_size(&self) -> usize {
        crate::calculate_sector_size(self.block_size)
    }

    /// Byte length of the encrypted hash table
    pub fn hash_table_len(&self) -> u64 {
        self.hash_table_size as u64 * TABLE_ENTRY_SIZE
    }

    /// Byte length of the encrypted block table
    pub fn block_table_len(&self) -> u64 {
        self.block_table_size as u64 * TABLE_ENTRY_SIZE
    }
}

/// Where the archive starts inside its byte source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveStart {
    /// Absolute offset of the MPQ header; every relative position is rooted here
    pub header_offset: u64,
    /// User data header, when the archive is embedded behind one
    pub user_data: Option<UserDataHeader>,
    /// The archive header
    pub header: MpqHeader,
}

impl ArchiveStart {
    /// Absolute offset of the hash table
    pub fn hash_table_offset(&self) -> u64 {
        self.header_offset + self.header.hash_table_pos as u64
    }

    /// Absolute offset of the block table
    pub fn block_table_offset(&self) -> u64 {
        self.header_offset + self.header.block_table_pos as u64
    }

    /// Check that both tables lie inside a byte source of `stream_len` bytes
    pub fn validate_extents(&self, stream_len: u64) -> Result<()> {
        let tables = [
            ("hash", self.hash_table_offset(), self.header.hash_table_len()),
            ("block", self.block_table_offset(), self.header.block_table_len()),
        ];

        for (name, offset, len) in tables {
            let end = offset.checked_add(len).ok_or_else(|| {
                Error::invalid_format(format!("{name} table extent overflows"))
            })?;
            if end > stream_len {
                return Err(Error::invalid_format(format!(
                    "{name} table ends at {end}, past the end of the archive ({stream_len} bytes)"
                )));
            }
        }

        Ok(())
    }
}

/// Locate and read the archive header
///
/// The byte source must start with either the archive header or a user
/// data header pointing at it.
pub fn find_header<R: Read + Seek>(reader: &mut R) -> Result<ArchiveStart> {
    reader.seek(SeekFrom::Start(0))?;

    match read_signature(reader)? {
        MPQ_HEADER_SIGNATURE => {
            let header = MpqHeader::read_body(reader)?;
            log::debug!(
                "Found MPQ header at offset 0: version {}, {} hash entries, {} block entries",
                header.format_version,
                header.hash_table_size,
                header.block_table_size
            );
            Ok(ArchiveStart {
                header_offset: 0,
                user_data: None,
                header,
            })
        }
        MPQ_USERDATA_SIGNATURE => {
            let user_data = UserDataHeader::read_body(reader)?;
            let header_offset = user_data.header_offset as u64;
            log::debug!(
                "User data header: {} bytes of user data, archive header at 0x{header_offset:X}",
                user_data.user_data_size
            );

            reader.seek(SeekFrom::Start(header_offset))?;
            let header = MpqHeader::read(reader)?;
            log::debug!(
                "Found MPQ header at offset 0x{header_offset:X}: version {}, {} hash entries, {} block entries",
                header.format_version,
                header.hash_table_size,
                header.block_table_size
            );

            Ok(ArchiveStart {
                header_offset,
                user_data: Some(user_data),
                header,
            })
        }
        other => Err(Error::invalid_format(format!(
            "Unknown MPQ signature 0x{other:08X}"
        ))),
    }
}

/// Read a four byte signature, rejecting anything not starting with "MPQ"
fn read_signature<R: Read>(reader: &mut R) -> Result<u32> {
    let mut magic = [0u8; 4];
    reader.read_exact(&mut magic)?;

    if &magic[..3] != b"MPQ" {
        return Err(Error::invalid_format("Missing MPQ magic"));
    }

    Ok(u32::from_le_bytes(magic))
}
