//! MPQ archive handling
//!
//! This module provides the main Archive type for reading MPQ files.
//! It supports:
//! - Archives embedded behind a user data header
//! - Name lookup through the hash table, with (listfile) naming on open
//! - Single-unit and multi-block files, zlib or bzip2 compressed
//! - Encrypted files whose name is known

use crate::{
    Error, Result,
    compression::{self, flags as method_flags},
    crypto::decrypt_bytes,
    entry::ArchiveEntry,
    header::{self, ArchiveStart, HEADER_BYTES, MpqHeader, UserDataHeader},
    special_files::{LISTFILE_NAME, parse_listfile},
    tables::{BlockTable, FileFlags, HashTable},
};
use byteorder::{ByteOrder, LittleEndian};
use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

/// Options for opening MPQ archives
///
/// # Examples
///
/// ```no_run
/// use heroes_mpq::{Archive, OpenOptions};
///
/// // Open with default options
/// let archive = Archive::open("replay.StormReplay")?;
///
/// // Skip naming entries from the (listfile)
/// let archive = OpenOptions::new()
///     .load_listfile(false)
///     .open("replay.StormReplay")?;
/// # Ok::<(), heroes_mpq::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct OpenOptions {
    /// Whether to read the (listfile) and name entries while opening.
    ///
    /// When `false`, entries stay anonymous until looked up by name.
    pub load_listfile: bool,
}

impl OpenOptions {
    /// Create new default options
    pub fn new() -> Self {
        Self {
            load_listfile: true,
        }
    }

    /// Set whether to name entries from the (listfile) when opening
    pub fn load_listfile(mut self, load: bool) -> Self {
        self.load_listfile = load;
        self
    }

    /// Open an archive file with these options
    ///
    /// # Errors
    /// - `Error::Io` if the file cannot be opened or is truncated
    /// - `Error::InvalidFormat` if the file is not a supported MPQ archive
    pub fn open<P: AsRef<Path>>(self, path: P) -> Result<Archive<BufReader<File>>> {
        let path = path.as_ref();
        log::debug!("Opening MPQ archive {}", path.display());

        let file = File::open(path)?;
        self.open_reader(BufReader::new(file))
    }

    /// Open an archive held by any seekable byte source
    pub fn open_reader<R: Read + Seek>(self, reader: R) -> Result<Archive<R>> {
        Archive::load(reader, self)
    }
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// An open MPQ archive
///
/// The archive owns its byte source. Reads seek it, so reading takes
/// `&mut self`; lookups only need `&self`.
#[derive(Debug)]
pub struct Archive<R> {
    reader: R,
    start: ArchiveStart,
    hash_table: HashTable,
    entries: Vec<ArchiveEntry>,
    block_size: usize,
}

impl Archive<BufReader<File>> {
    /// Open an archive file with default options
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        OpenOptions::new().open(path)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Open an archive from a seekable byte source with default options
    pub fn from_reader(reader: R) -> Result<Self> {
        OpenOptions::new().open_reader(reader)
    }

    fn load(mut reader: R, options: OpenOptions) -> Result<Self> {
        let start = header::find_header(&mut reader)?;

        let stream_len = reader.seek(SeekFrom::End(0))?;
        start.validate_extents(stream_len)?;

        let hash_table = HashTable::read(
            &mut reader,
            start.hash_table_offset(),
            start.header.hash_table_size,
        )?;
        let block_table = BlockTable::read(
            &mut reader,
            start.block_table_offset(),
            start.header.block_table_size,
        )?;

        let entries: Vec<ArchiveEntry> = block_table
            .entries()
            .iter()
            .enumerate()
            .map(|(index, block)| ArchiveEntry::new(index, block, start.header_offset))
            .collect();
        let block_size = start.header.sector_size();

        log::debug!(
            "Archive at 0x{:X}: {} hash slots, {} entries, {} byte blocks",
            start.header_offset,
            hash_table.size(),
            entries.len(),
            block_size
        );

        let mut archive = Self {
            reader,
            start,
            hash_table,
            entries,
            block_size,
        };

        if options.load_listfile {
            if let Err(e) = archive.load_listfile() {
                log::warn!("Failed to load (listfile): {e}");
            }
        }

        Ok(archive)
    }

    /// Name entries from the archive's (listfile)
    ///
    /// Every listed name that resolves through the hash table is attached to
    /// its entry. Names that do not resolve are dropped. Returns the number
    /// of entries named, or 0 when the archive has no (listfile).
    pub fn load_listfile(&mut self) -> Result<usize> {
        let Some(listfile) = self.find_file(LISTFILE_NAME) else {
            log::debug!("Archive has no (listfile)");
            return Ok(0);
        };

        if let Some(stored) = self.entries.get_mut(listfile.index()) {
            if stored.name().is_none() {
                stored.set_name(LISTFILE_NAME);
            }
        }

        let data = self.read_entry(&listfile)?;
        let names = parse_listfile(&data);
        let listed = names.len();

        let mut named = 0;
        for name in names {
            let Some((_, hash_entry)) = self.hash_table.find_file(&name) else {
                log::trace!("(listfile) name {name:?} is not in the archive");
                continue;
            };

            if let Some(entry) = self.entries.get_mut(hash_entry.block_index as usize) {
                entry.set_name(name);
                named += 1;
            }
        }

        log::debug!("Named {named} entries from {listed} (listfile) lines");
        Ok(named)
    }

    /// All entries, in block table order
    pub fn entries(&self) -> &[ArchiveEntry] {
        &self.entries
    }

    /// Look up a file by name
    ///
    /// The returned entry carries the looked-up name when the stored entry
    /// is still anonymous, so encrypted files can be read without a
    /// (listfile).
    pub fn find_file(&self, name: &str) -> Option<ArchiveEntry> {
        let (slot, hash_entry) = self.hash_table.find_file(name)?;

        let Some(entry) = self.entries.get(hash_entry.block_index as usize) else {
            log::debug!(
                "Hash slot {slot} for {name:?} points past the block table (index {})",
                hash_entry.block_index
            );
            return None;
        };

        let mut entry = entry.clone();
        if entry.name().is_none() {
            entry.set_name(name);
        }
        Some(entry)
    }

    /// Look up a file by name, failing with `Error::FileNotFound`
    pub fn entry(&self, name: &str) -> Result<ArchiveEntry> {
        self.find_file(name)
            .ok_or_else(|| Error::FileNotFound(name.to_string()))
    }

    /// Check if a file exists in the archive
    pub fn has_file(&self, name: &str) -> bool {
        self.find_file(name).is_some()
    }

    /// Read and decompress a file by name
    pub fn read_file(&mut self, name: &str) -> Result<Vec<u8>> {
        let entry = self.entry(name)?;
        self.read_entry(&entry)
    }

    /// Read and decompress an entry
    pub fn read_entry(&mut self, entry: &ArchiveEntry) -> Result<Vec<u8>> {
        let mut data = vec![0u8; entry.file_size() as usize];
        self.read_entry_into(entry, &mut data)?;
        Ok(data)
    }

    /// Read and decompress an entry into a buffer of exactly its file size
    ///
    /// On error the buffer contents are unspecified.
    pub fn read_entry_into(&mut self, entry: &ArchiveEntry, out: &mut [u8]) -> Result<()> {
        if out.len() as u64 != entry.file_size() as u64 {
            return Err(Error::InvalidFileSize {
                expected: entry.file_size() as u64,
                actual: out.len() as u64,
            });
        }

        if out.is_empty() {
            return Ok(());
        }

        log::debug!(
            "Reading {entry}: {} -> {} bytes, flags {:?}",
            entry.compressed_size(),
            entry.file_size(),
            entry.flags()
        );

        if entry.is_single_unit() || !entry.is_compressed() {
            self.read_single_unit(entry, out)
        } else {
            self.read_blocks(entry, out)
        }
    }

    /// Entries stored as one piece: single-unit files and uncompressed files
    fn read_single_unit(&mut self, entry: &ArchiveEntry, out: &mut [u8]) -> Result<()> {
        let compressed_len = entry.compressed_size() as usize;
        if compressed_len > out.len() {
            return Err(Error::corrupt(format!(
                "{entry}: stored size {compressed_len} exceeds file size {}",
                out.len()
            )));
        }

        self.reader.seek(SeekFrom::Start(entry.file_position()))?;
        self.reader.read_exact(&mut out[..compressed_len])?;

        // The cipher leaves anything shorter than a word untouched
        if entry.is_encrypted() && compressed_len >= 4 {
            let seed = known_seed(entry)?;
            if entry.is_single_unit() {
                decrypt_bytes(&mut out[..compressed_len], seed);
            } else {
                for (i, block) in out[..compressed_len]
                    .chunks_mut(self.block_size)
                    .enumerate()
                {
                    decrypt_bytes(block, seed.wrapping_add(i as u32));
                }
            }
        }

        if compressed_len != out.len() {
            check_compressed(entry, compressed_len, out.len())?;
            compression::decompress_in_place(out, compressed_len)?;
        }

        Ok(())
    }

    /// Entries split into blocks behind a block position table
    fn read_blocks(&mut self, entry: &ArchiveEntry, out: &mut [u8]) -> Result<()> {
        let block_count = out.len().div_ceil(self.block_size);
        let slots = block_count + 1 + usize::from(entry.flags().contains(FileFlags::SECTOR_CRC));

        let positions = self.read_block_positions(entry, slots)?;
        validate_block_positions(entry, &positions[..=block_count], self.block_size, out.len())?;

        log::trace!(
            "{entry}: {block_count} blocks, data from {} to {}",
            positions[0],
            positions[block_count]
        );

        let seed = entry.encryption_seed();
        let decrypt = entry.is_encrypted() && out.len() > 3;
        let mut block = Vec::with_capacity(self.block_size);

        for (i, out_block) in out.chunks_mut(self.block_size).enumerate() {
            let start = positions[i];
            let extent = (positions[i + 1] - start) as usize;

            block.clear();
            block.resize(extent, 0);
            self.reader
                .seek(SeekFrom::Start(entry.file_position() + start as u64))?;
            self.reader.read_exact(&mut block)?;

            if decrypt {
                decrypt_bytes(&mut block, seed.wrapping_add(i as u32));
            }

            if extent == out_block.len() {
                out_block.copy_from_slice(&block);
            } else {
                check_compressed(entry, extent, out_block.len())?;
                compression::decompress(&block, out_block)?;
            }
        }

        Ok(())
    }

    fn read_block_positions(&mut self, entry: &ArchiveEntry, slots: usize) -> Result<Vec<u32>> {
        let mut table = vec![0u8; slots * 4];
        self.reader.seek(SeekFrom::Start(entry.file_position()))?;
        self.reader.read_exact(&mut table)?;

        if entry.is_encrypted() {
            decrypt_bytes(&mut table, known_seed(entry)?.wrapping_sub(1));
        }

        let mut positions = vec![0u32; slots];
        LittleEndian::read_u32_into(&table, &mut positions);
        Ok(positions)
    }

    /// Read the first `n` bytes of the byte source
    pub fn header_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut data = vec![0u8; n];
        self.header_bytes_into(&mut data)?;
        Ok(data)
    }

    /// Read the first [`HEADER_BYTES`] bytes of the byte source
    pub fn header_bytes_default(&mut self) -> Result<Vec<u8>> {
        self.header_bytes(HEADER_BYTES)
    }

    /// Fill `buffer` from the start of the byte source
    pub fn header_bytes_into(&mut self, buffer: &mut [u8]) -> Result<()> {
        if buffer.is_empty() {
            return Err(Error::invalid_format("Header byte count must be nonzero"));
        }

        self.reader.seek(SeekFrom::Start(0))?;
        self.reader.read_exact(buffer)?;
        Ok(())
    }
}

impl<R> Archive<R> {
    /// Get the archive header
    pub fn header(&self) -> &MpqHeader {
        &self.start.header
    }

    /// Get the user data header, if the archive has one
    pub fn user_data(&self) -> Option<&UserDataHeader> {
        self.start.user_data.as_ref()
    }

    /// Absolute offset of the archive header in the byte source
    pub fn header_offset(&self) -> u64 {
        self.start.header_offset
    }

    /// Get the hash table
    pub fn hash_table(&self) -> &HashTable {
        &self.hash_table
    }

    /// Size of one data block in bytes
    pub fn block_size(&self) -> usize {
        self.block_size
    }

    /// Close the archive, returning its byte source
    pub fn into_inner(self) -> R {
        self.reader
    }
}

/// Seed of an encrypted entry, or an error when no name supplied one
fn known_seed(entry: &ArchiveEntry) -> Result<u32> {
    match entry.encryption_seed() {
        0 => Err(Error::key_unknown(entry.to_string())),
        seed => Ok(seed),
    }
}

/// Decide whether a stored unit whose size differs from its output may be decoded
fn check_compressed(entry: &ArchiveEntry, stored: usize, expected: usize) -> Result<()> {
    let flags = entry.flags();
    if flags.contains(FileFlags::COMPRESS) {
        Ok(())
    } else if flags.contains(FileFlags::IMPLODE) {
        Err(Error::UnsupportedCodec {
            method: method_flags::PKWARE,
            name: "PKWARE implode",
        })
    } else {
        Err(Error::corrupt(format!(
            "{entry}: stored {stored} bytes for a {expected} byte uncompressed unit"
        )))
    }
}

/// Check that block positions ascend, stay inside the entry and never
/// describe a block longer than its output
fn validate_block_positions(
    entry: &ArchiveEntry,
    positions: &[u32],
    block_size: usize,
    file_size: usize,
) -> Result<()> {
    let compressed_size = entry.compressed_size();

    for (i, pair) in positions.windows(2).enumerate() {
        let (start, end) = (pair[0], pair[1]);
        if end < start || end > compressed_size {
            return Err(Error::corrupt(format!(
                "{entry}: block {i} spans {start}..{end}, outside 0..{compressed_size}"
            )));
        }

        let expected = (file_size - i * block_size).min(block_size);
        if (end - start) as usize > expected {
            return Err(Error::corrupt(format!(
                "{entry}: block {i} stores {} bytes for {expected} bytes of output",
                end - start
            )));
        }
    }

    Ok(())
}
