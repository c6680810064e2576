//! Shared test utilities for integration tests.
//!
//! Note: `#![allow(dead_code)]` is required because each integration test file
//! compiles as a separate crate and may only use a subset of these helpers.

#![allow(dead_code)]

use std::io::Cursor;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use zipwright::read::{Archive, ParseOptions, ParseReport};
use zipwright::{ArchivePath, EntryMeta, WriteOptions, WriteResult, Writer};

/// A fixed modification time (2023-11-14 22:13:20 UTC) so archives are
/// reproducible apart from encryption randomness.
pub const MTIME: i64 = 1_700_000_000;

/// Creates an in-memory archive, returning its bytes and the write result.
pub fn create_archive_with_result(
    options: Option<WriteOptions>,
    entries: &[(&str, &[u8])],
) -> zipwright::Result<(Vec<u8>, WriteResult)> {
    let writer = Writer::create(Cursor::new(Vec::new()))?;
    let mut writer = match options {
        Some(opts) => writer.options(opts),
        None => writer,
    };
    for (name, data) in entries {
        let path = ArchivePath::new(name)?;
        if path.is_directory() {
            writer.add_directory(path, EntryMeta::directory().modification_time(MTIME))?;
        } else {
            writer.add_bytes_with_meta(path, data, EntryMeta::file().modification_time(MTIME))?;
        }
    }
    let (result, sink) = writer.finish_into_inner()?;
    Ok((sink.into_inner(), result))
}

/// Creates an in-memory archive.
pub fn create_archive(options: Option<WriteOptions>, entries: &[(&str, &[u8])]) -> Vec<u8> {
    create_archive_with_result(options, entries)
        .expect("Failed to create test archive")
        .0
}

/// Opens an archive from bytes.
pub fn open(bytes: Vec<u8>, options: ParseOptions) -> Archive<Cursor<Vec<u8>>> {
    Archive::open_with_options(Cursor::new(bytes), options).expect("Failed to open archive")
}

/// Parses with payload verification enabled.
pub fn parse_verified(bytes: Vec<u8>) -> ParseReport {
    zipwright::parse(Cursor::new(bytes), ParseOptions::new().verify_crc(true))
        .expect("Failed to parse archive")
}

/// Parses with payload verification and a password.
pub fn parse_verified_with(bytes: Vec<u8>, password: &str) -> ParseReport {
    let options = ParseOptions::new().verify_crc(true).password(password);
    zipwright::parse(Cursor::new(bytes), options).expect("Failed to parse archive")
}

/// Asserts that every entry decodes to the expected contents.
pub fn verify_archive_contents(
    archive: &mut Archive<Cursor<Vec<u8>>>,
    expected: &[(&str, &[u8])],
) {
    assert_eq!(archive.len(), expected.len());
    for (name, data) in expected {
        if name.ends_with('/') {
            assert!(archive.entry_index(name).is_some(), "missing directory {name}");
            continue;
        }
        let content = archive
            .read_entry_by_name(name)
            .unwrap_or_else(|e| panic!("Failed to read {name}: {e}"));
        assert_eq!(content, *data, "contents of {name}");
    }
}

/// Highly compressible text.
pub fn text_payload(len: usize) -> Vec<u8> {
    b"The quick brown fox jumps over the lazy dog. "
        .iter()
        .copied()
        .cycle()
        .take(len)
        .collect()
}

/// Incompressible bytes, reproducible from `seed`.
pub fn random_payload(len: usize, seed: u64) -> Vec<u8> {
    let mut data = vec![0u8; len];
    StdRng::seed_from_u64(seed).fill(&mut data[..]);
    data
}

/// Finds the offset of the first occurrence of `needle`.
pub fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}
