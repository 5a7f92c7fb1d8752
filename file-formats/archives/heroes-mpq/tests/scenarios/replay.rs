//! Replay-shaped archives read end to end

use crate::common::{REPLAY_FILES, init_logging, replay_archive, replay_file_data};
use heroes_mpq::{Archive, signatures};
use pretty_assertions::assert_eq;
use std::io::Write;

#[test]
fn test_replay_entries_named_from_listfile() {
    init_logging();

    let archive = Archive::from_reader(replay_archive().build_cursor()).unwrap();
    let entries = archive.entries();

    assert_eq!(entries.len(), 14);
    assert_eq!(entries[0].name(), Some("replay.details"));
    assert_eq!(entries[1].name(), Some("replay.initData"));
    assert!(archive.has_file("(listfile)"));
    assert!(!archive.has_file("nonexistent"));
}

#[test]
fn test_replay_files_round_trip() {
    let mut archive = Archive::from_reader(replay_archive().build_cursor()).unwrap();

    for name in REPLAY_FILES {
        let entry = archive.entry(name).unwrap();
        let data = archive.read_entry(&entry).unwrap();

        assert_eq!(data.len(), entry.file_size() as usize, "{name}");
        assert!(data == replay_file_data(name), "{name} differs");
    }
}

#[test]
fn test_replay_sizes_are_stable() {
    let archive = Archive::from_reader(replay_archive().build_cursor()).unwrap();

    let details = archive.entry("replay.details").unwrap();
    assert_eq!(details.file_size(), 1000 + 14 * 700);
    assert!(details.compressed_size() < details.file_size());

    let init = archive.entry("replay.initData").unwrap();
    assert!(init.is_single_unit());
    assert_eq!(init.file_size(), 1000 + 15 * 700);
}

#[test]
fn test_replay_layout() {
    let mut archive = Archive::from_reader(replay_archive().build_cursor()).unwrap();

    assert_eq!(archive.header_offset(), 0x200);
    assert_eq!(archive.block_size(), 4096);
    assert_eq!(archive.hash_table().size(), 32);

    let head = archive.header_bytes(4).unwrap();
    assert_eq!(head, signatures::MPQ_USERDATA.to_le_bytes().to_vec());
}

#[test]
fn test_replay_read_twice() {
    let mut archive = Archive::from_reader(replay_archive().build_cursor()).unwrap();

    let first = archive.read_file("replay.tracker.events").unwrap();
    let second = archive.read_file("replay.tracker.events").unwrap();
    assert!(first == second);
}

#[test]
fn test_replay_from_disk() {
    let raw = replay_archive().build();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("match.StormReplay");
    std::fs::File::create(&path)
        .unwrap()
        .write_all(&raw)
        .unwrap();

    let mut archive = Archive::open(&path).unwrap();
    assert_eq!(archive.entries().len(), 14);

    let names: Vec<String> = archive
        .entries()
        .iter()
        .filter_map(|e| e.name().map(str::to_string))
        .collect();
    for name in names {
        let entry = archive.entry(&name).unwrap();
        let data = archive.read_entry(&entry).unwrap();
        assert_eq!(data.len(), entry.file_size() as usize, "{name}");
    }
}
