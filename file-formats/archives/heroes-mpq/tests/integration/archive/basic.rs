//! Basic archive reading tests

use crate::common::{
    Codec, Storage, TestArchiveBuilder, TestFile, generate_noise, generate_repetitive_data,
    generate_test_data, init_logging,
};
use heroes_mpq::header::HEADER_BYTES;
use heroes_mpq::{Archive, Error, FileFlags, OpenOptions};
use pretty_assertions::assert_eq;
use std::io::Write;

fn text(len: usize) -> Vec<u8> {
    generate_repetitive_data(b"Heroes of the Storm replay data. ", len)
}

#[test]
fn test_read_every_storage_kind() {
    init_logging();

    let files = [
        TestFile::new("stored.bin", generate_test_data(1500), Storage::Stored),
        TestFile::new("unit_zlib.txt", text(3000), Storage::SingleUnit(Codec::Zlib)),
        TestFile::new("unit_bzip2.txt", text(3000), Storage::SingleUnit(Codec::Bzip2)),
        TestFile::new("blocks_zlib.txt", text(5000), Storage::Blocks(Codec::Zlib)),
        TestFile::new("blocks_bzip2.txt", text(5000), Storage::Blocks(Codec::Bzip2)),
    ];

    let mut builder = TestArchiveBuilder::new();
    for file in files.iter().cloned() {
        builder = builder.file(file);
    }
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    for file in &files {
        let data = archive.read_file(&file.name).unwrap();
        assert_eq!(data.len(), file.data.len(), "{}", file.name);
        assert!(data == file.data, "{} differs", file.name);
    }
}

#[test]
fn test_entry_sizes_and_flags() {
    let data = text(5000);
    let builder = TestArchiveBuilder::new()
        .file(TestFile::new("single.txt", data.clone(), Storage::SingleUnit(Codec::Zlib)))
        .file(TestFile::new("blocks.txt", data.clone(), Storage::Blocks(Codec::Zlib)));
    let archive = Archive::from_reader(builder.build_cursor()).unwrap();

    let single = archive.entry("single.txt").unwrap();
    assert_eq!(single.index(), 0);
    assert_eq!(single.file_size(), 5000);
    assert!(single.compressed_size() < 5000);
    assert!(single.is_single_unit());
    assert!(single.is_compressed());
    assert_eq!(single.file_offset(), 0x20);
    assert_eq!(single.file_position(), 0x20);

    let blocks = archive.entry("blocks.txt").unwrap();
    assert_eq!(blocks.index(), 1);
    assert!(!blocks.is_single_unit());
    assert!(blocks.flags().contains(FileFlags::COMPRESS | FileFlags::EXISTS));
}

#[test]
fn test_incompressible_blocks_are_stored_raw() {
    // Noise blocks do not shrink and are kept uncompressed next to compressed ones
    let mut data = generate_noise(1024, 5);
    data.extend(text(1024));
    data.extend(generate_noise(700, 6));

    let builder = TestArchiveBuilder::new().file(TestFile::new(
        "mixed.bin",
        data.clone(),
        Storage::Blocks(Codec::Bzip2),
    ));
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    assert!(archive.read_file("mixed.bin").unwrap() == data);
}

#[test]
fn test_sector_crc_slot() {
    let data = text(4000);
    let builder = TestArchiveBuilder::new().file(
        TestFile::new("crc.txt", data.clone(), Storage::Blocks(Codec::Zlib)).sector_crc(),
    );
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    let entry = archive.entry("crc.txt").unwrap();
    assert!(entry.flags().contains(FileFlags::SECTOR_CRC));
    assert_eq!(archive.read_entry(&entry).unwrap(), data);
}

#[test]
fn test_large_block_size() {
    let data = text(100_000);
    let builder = TestArchiveBuilder::new()
        .block_size_shift(3)
        .file(TestFile::new("big.txt", data.clone(), Storage::Blocks(Codec::Bzip2)));
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    assert_eq!(archive.block_size(), 4096);
    assert_eq!(archive.header().block_size, 3);
    assert!(archive.read_file("big.txt").unwrap() == data);
}

#[test]
fn test_empty_file() {
    let builder = TestArchiveBuilder::new()
        .file(TestFile::new("empty.txt", Vec::new(), Storage::Blocks(Codec::Zlib)));
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    assert!(archive.read_file("empty.txt").unwrap().is_empty());
}

#[test]
fn test_read_entry_into() {
    let data = text(2000);
    let builder = TestArchiveBuilder::new()
        .file(TestFile::new("file.txt", data.clone(), Storage::Blocks(Codec::Zlib)));
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();
    let entry = archive.entry("file.txt").unwrap();

    let mut out = vec![0u8; 2000];
    archive.read_entry_into(&entry, &mut out).unwrap();
    assert_eq!(out, data);

    let mut wrong = vec![0u8; 1999];
    assert!(matches!(
        archive.read_entry_into(&entry, &mut wrong),
        Err(Error::InvalidFileSize {
            expected: 2000,
            actual: 1999
        })
    ));
}

#[test]
fn test_lookup_is_case_insensitive() {
    let builder = TestArchiveBuilder::new()
        .file(TestFile::new("Replay.Details", b"details".to_vec(), Storage::Stored));
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    assert!(archive.has_file("replay.details"));
    assert!(archive.has_file("REPLAY.DETAILS"));
    assert_eq!(archive.read_file("rEpLaY.dEtAiLs").unwrap(), b"details".to_vec());
}

#[test]
fn test_user_data_header() {
    let builder = TestArchiveBuilder::new()
        .user_data(b"replay header bytes")
        .file(TestFile::new("a.txt", text(3000), Storage::Blocks(Codec::Zlib)));
    let mut archive = Archive::from_reader(builder.build_cursor()).unwrap();

    assert_eq!(archive.header_offset(), 0x200);
    let user_data = archive.user_data().unwrap();
    assert_eq!(user_data.header_offset, 0x200);
    assert_eq!(user_data.user_data_size, 19);

    let entry = archive.entry("a.txt").unwrap();
    assert_eq!(entry.file_offset(), 0x20);
    assert_eq!(entry.file_position(), 0x220);
    assert_eq!(archive.read_entry(&entry).unwrap(), text(3000));
}

#[test]
fn test_header_bytes() {
    let builder = TestArchiveBuilder::new()
        .user_data(b"replay header bytes")
        .file(TestFile::new("a.txt", text(3000), Storage::Stored));
    let raw = builder.build();
    let mut archive = Archive::from_reader(std::io::Cursor::new(raw.clone())).unwrap();

    assert_eq!(archive.header_bytes(4).unwrap(), b"MPQ\x1B".to_vec());
    assert_eq!(
        archive.header_bytes_default().unwrap(),
        raw[..HEADER_BYTES].to_vec()
    );

    let mut buffer = [0u8; 0x40];
    archive.header_bytes_into(&mut buffer).unwrap();
    assert_eq!(&buffer[..], &raw[..0x40]);

    assert!(matches!(
        archive.header_bytes(0),
        Err(Error::InvalidFormat(_))
    ));

    // Diagnostics do not disturb later reads
    assert_eq!(archive.read_file("a.txt").unwrap(), text(3000));
}

#[test]
fn test_open_path() {
    let data = text(6000);
    let raw = TestArchiveBuilder::new()
        .file(TestFile::new("on_disk.txt", data.clone(), Storage::Blocks(Codec::Bzip2)))
        .build();

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(&raw).unwrap();
    file.flush().unwrap();

    let mut archive = Archive::open(file.path()).unwrap();
    assert_eq!(archive.read_file("on_disk.txt").unwrap(), data);

    let mut archive = OpenOptions::new()
        .load_listfile(false)
        .open(file.path())
        .unwrap();
    assert!(archive.entries()[0].name().is_none());
    assert_eq!(archive.read_file("on_disk.txt").unwrap(), data);
}

#[test]
fn test_open_missing_path() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Archive::open(dir.path().join("missing.StormReplay")),
        Err(Error::Io(_))
    ));
}

#[test]
fn test_into_inner_returns_source() {
    let raw = TestArchiveBuilder::new()
        .file(TestFile::new("a.txt", b"abc".to_vec(), Storage::Stored))
        .build();
    let archive = Archive::from_reader(std::io::Cursor::new(raw.clone())).unwrap();

    assert_eq!(archive.into_inner().into_inner(), raw);
}

#[test]
fn test_deleted_entries() {
    let builder = TestArchiveBuilder::new()
        .file(TestFile::new("a.txt", b"abc".to_vec(), Storage::Stored))
        .deleted_entries(2);
    let archive = Archive::from_reader(builder.build_cursor()).unwrap();

    // a.txt, (listfile), two deleted records
    assert_eq!(archive.entries().len(), 4);
    assert!(!archive.entries()[2].exists());
    assert_eq!(archive.entries()[3].to_string(), "(Deleted file)");
}
