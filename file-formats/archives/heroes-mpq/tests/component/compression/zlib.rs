//! Zlib dispatch tests

use crate::common::{generate_noise, generate_repetitive_data, zlib_block};
use heroes_mpq::Error;
use heroes_mpq::compression::decompress;
use pretty_assertions::assert_eq;

#[test]
fn test_zlib_block() {
    let data = generate_repetitive_data(b"replay.tracker.events", 4096);
    let block = zlib_block(&data);
    assert!(block.len() < data.len());

    let mut out = vec![0u8; data.len()];
    decompress(&block, &mut out).unwrap();
    assert_eq!(out, data);
}

#[test]
fn test_zlib_noise() {
    let data = generate_noise(4096, 11);
    let block = zlib_block(&data);

    let mut out = vec![0u8; data.len()];
    decompress(&block, &mut out).unwrap();
    assert!(out == data);
}

#[test]
fn test_zlib_wrong_size() {
    let data = generate_repetitive_data(b"abc", 300);
    let block = zlib_block(&data);

    let mut out = vec![0u8; 299];
    assert!(matches!(
        decompress(&block, &mut out),
        Err(Error::Compression(_))
    ));
}

#[test]
fn test_zlib_corrupt_payload() {
    let data = generate_repetitive_data(b"abc", 300);
    let mut block = zlib_block(&data);
    // Zlib header byte after the method byte
    block[1] ^= 0xFF;

    let mut out = vec![0u8; data.len()];
    assert!(decompress(&block, &mut out).is_err());
}
