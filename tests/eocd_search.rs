//! End of central directory search: comments of every length, signatures
//! hidden in comments, and data surrounding the archive.

mod common;

use std::io::Cursor;

use common::{create_archive, open};
use zipwright::read::{MAX_SEARCH, ParseOptions};
use zipwright::{Archive, Error, WriteOptions};

fn with_comment(comment: &str) -> Vec<u8> {
    create_archive(Some(WriteOptions::new().comment(comment)), &[("f.txt", b"content")])
}

#[test]
fn test_signature_inside_comment() {
    let comment = "look: PK\u{5}\u{6} is the end record signature";
    let bytes = with_comment(comment);
    let mut archive = open(bytes, ParseOptions::new().verify_crc(true));
    assert!(archive.report().is_valid());
    assert_eq!(archive.comment(), comment.as_bytes());
    assert!(archive.report().eocd.as_ref().unwrap().confirmed);
    assert_eq!(archive.read_entry(0).unwrap(), b"content");
}

#[test]
fn test_comment_of_every_window_boundary() {
    for len in [0usize, 1, 9, 10, 11, 31, 32, 33, 64, 1000] {
        let comment = "c".repeat(len);
        let archive = open(with_comment(&comment), ParseOptions::default());
        assert_eq!(archive.comment().len(), len, "comment length {len}");
        assert_eq!(archive.len(), 1);
    }
}

#[test]
fn test_maximum_comment() {
    let comment = "m".repeat(u16::MAX as usize);
    let bytes = with_comment(&comment);
    let archive = open(bytes, ParseOptions::default());
    assert_eq!(archive.comment().len(), u16::MAX as usize);
}

#[test]
fn test_oversized_comment_is_truncated() {
    let comment = "o".repeat(u16::MAX as usize + 100);
    let bytes = with_comment(&comment);
    let archive = open(bytes, ParseOptions::default());
    assert_eq!(archive.comment().len(), u16::MAX as usize);
    assert!(archive.report().eocd.as_ref().unwrap().confirmed);
}

#[test]
fn test_trailing_garbage_falls_back() {
    let mut bytes = with_comment("");
    bytes.extend_from_slice(b"garbage after the archive");
    let mut archive = open(bytes, ParseOptions::default());
    assert!(!archive.report().eocd.as_ref().unwrap().confirmed);
    assert_eq!(archive.read_entry(0).unwrap(), b"content");
}

#[test]
fn test_end_record_beyond_search_range() {
    let mut bytes = with_comment("");
    bytes.extend(vec![0u8; 70_000]);
    let err = Archive::open(Cursor::new(bytes)).unwrap_err();
    match err {
        Error::EndOfCentralDirectoryNotFound { searched } => assert_eq!(searched, MAX_SEARCH),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn test_prepended_data_breaks_offsets() {
    let mut bytes = vec![0xEEu8; 100];
    bytes.extend(with_comment(""));
    let err = Archive::open(Cursor::new(bytes)).unwrap_err();
    assert!(err.is_structural(), "unexpected error: {err}");
}

#[test]
fn test_too_short_input() {
    for len in [0usize, 1, 21] {
        let err = Archive::open(Cursor::new(vec![0u8; len])).unwrap_err();
        assert!(matches!(err, Error::EndOfCentralDirectoryNotFound { .. }));
    }
}
