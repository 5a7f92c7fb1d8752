//! BZip2 decoder tests against streams written by libbzip2

use crate::common::{bzip2_stream, generate_noise, generate_repetitive_data};
use heroes_mpq::Error;
use heroes_mpq::compression::algorithms::bzip2::{
    BLOCK_SIZE_MULTIPLE, Bzip2Decoder, Scratch, decompress, decompress_into,
};
use pretty_assertions::assert_eq;
use std::io::Read;

const PANGRAM: &[u8] = b"The quick brown fox jumps over the lazy dog. ";

#[test]
fn test_bzip2_text_all_levels() {
    let data = generate_repetitive_data(PANGRAM, 32 * 1024);

    for level in 1..=9 {
        let compressed = bzip2_stream(&data, level);
        assert_eq!(decompress(&compressed).unwrap(), data, "level {level}");
    }
}

#[test]
fn test_bzip2_multiple_blocks() {
    // Level 1 blocks hold 100k bytes, so this spans three blocks
    let data = generate_noise(BLOCK_SIZE_MULTIPLE * 5 / 2, 0xC0FFEE);
    let compressed = bzip2_stream(&data, 1);

    let mut out = vec![0u8; data.len()];
    decompress_into(&compressed, &mut out).unwrap();
    assert!(out == data, "multi-block output differs");
}

#[test]
fn test_bzip2_runs() {
    let mut data = vec![b'a'; 5000];
    data.extend_from_slice(b"bbb");
    for _ in 0..4 {
        data.extend(0..=255u8);
    }
    data.extend(std::iter::repeat_n(b'c', 300));
    data.extend(std::iter::repeat_n(0u8, 70_000));

    let compressed = bzip2_stream(&data, 9);
    assert!(compressed.len() < 1000);
    assert_eq!(decompress(&compressed).unwrap(), data);
}

#[test]
fn test_bzip2_single_byte_and_empty() {
    assert_eq!(decompress(&bzip2_stream(b"x", 9)).unwrap(), b"x".to_vec());
    assert!(decompress(&bzip2_stream(b"", 9)).unwrap().is_empty());
}

#[test]
fn test_bzip2_redecode_is_identical() {
    let data = generate_noise(20_000, 7);
    let compressed = bzip2_stream(&data, 9);

    let first = decompress(&compressed).unwrap();
    let second = decompress(&compressed).unwrap();
    assert_eq!(first, data);
    assert_eq!(first, second);
}

#[test]
fn test_bzip2_scratch_shared_between_streams() {
    let a = generate_repetitive_data(PANGRAM, 50_000);
    let b = generate_noise(3_000, 99);

    let mut scratch = Scratch::new();
    for data in [&a, &b, &a] {
        let compressed = bzip2_stream(data, 9);
        let mut decoder = Bzip2Decoder::with_scratch(&compressed[..], scratch);
        let mut out = Vec::new();
        decoder.read_to_end(&mut out).unwrap();
        assert!(&out == data);
        scratch = decoder.into_scratch();
    }
    assert!(scratch.capacity() >= 50_000);
}

#[test]
fn test_bzip2_incremental_reads() {
    let data = generate_repetitive_data(PANGRAM, 10_000);
    let compressed = bzip2_stream(&data, 9);

    let mut decoder = Bzip2Decoder::new(&compressed[..]);
    let mut out = Vec::new();
    let mut chunk = [0u8; 7];
    loop {
        let n = decoder.decode(&mut chunk).unwrap();
        if n == 0 {
            break;
        }
        out.extend_from_slice(&chunk[..n]);
    }

    assert_eq!(out, data);
    assert!(decoder.is_finished());
    assert_eq!(decoder.decode(&mut chunk).unwrap(), 0);
}

#[test]
fn test_bzip2_flipped_text_bytes_fail() {
    let data = generate_repetitive_data(PANGRAM, 4096);

    for level in [1, 9] {
        let compressed = bzip2_stream(&data, level);
        for i in 0..compressed.len() {
            let mut corrupted = compressed.clone();
            corrupted[i] ^= 0xFF;
            assert!(
                matches!(decompress(&corrupted), Err(Error::CorruptStream(_))),
                "level {level}, byte {i} flipped"
            );
        }
    }
}

#[test]
fn test_bzip2_flipped_noise_bytes_fail() {
    let data = generate_noise(2000, 0x1234);
    let compressed = bzip2_stream(&data, 9);

    for i in 0..compressed.len() {
        let mut corrupted = compressed.clone();
        corrupted[i] ^= 0xFF;
        assert!(
            matches!(decompress(&corrupted), Err(Error::CorruptStream(_))),
            "byte {i} flipped"
        );
    }
}

#[test]
fn test_bzip2_truncated_stream_fails() {
    let data = generate_noise(5000, 3);
    let compressed = bzip2_stream(&data, 9);

    for len in (0..compressed.len()).step_by(97) {
        assert!(
            matches!(decompress(&compressed[..len]), Err(Error::CorruptStream(_))),
            "truncated at {len}"
        );
    }
}

#[test]
fn test_bzip2_decompress_into_requires_exact_size() {
    let data = generate_repetitive_data(PANGRAM, 1000);
    let compressed = bzip2_stream(&data, 9);

    let mut short = vec![0u8; 999];
    assert!(matches!(
        decompress_into(&compressed, &mut short),
        Err(Error::Compression(_))
    ));

    let mut long = vec![0u8; 1001];
    assert!(matches!(
        decompress_into(&compressed, &mut long),
        Err(Error::Compression(_))
    ));
}
