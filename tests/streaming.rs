//! Streaming pipeline tests: stage order, chunked sources, and archives
//! written and read back with very small buffers.

mod common;

use std::io::{Cursor, Write};

use common::{open, text_payload, verify_archive_contents};
use zipwright::checksum::crc32;
use zipwright::read::ParseOptions;
use zipwright::streaming::{Pipeline, Source, StreamingConfig, WritePlan};
use zipwright::{EncryptionMethod, WriteOptions};

#[test]
fn test_write_stage_order() {
    let plan = WritePlan {
        checksum: true,
        ..Default::default()
    };
    let pipeline = Pipeline::for_write(1024, plan, None).unwrap();
    assert_eq!(pipeline.stage_names(), vec!["checksum", "count"]);

    let method = EncryptionMethod::zip_crypto("pw");
    let mut sink = Vec::new();
    let plan = WritePlan {
        checksum: true,
        compression_level: None,
        encryption: Some((&method, 0x42)),
    };
    let pipeline = Pipeline::for_write(1024, plan, Some(&mut sink as &mut dyn Write)).unwrap();
    assert_eq!(
        pipeline.stage_names(),
        vec!["checksum", "encrypt", "mirror", "count"]
    );
}

#[cfg(feature = "deflate")]
#[test]
fn test_compressed_write_stage_order() {
    let method = EncryptionMethod::zip_crypto("pw");
    let plan = WritePlan {
        checksum: true,
        compression_level: Some(6),
        encryption: Some((&method, 0)),
    };
    let pipeline = Pipeline::for_write(1024, plan, None).unwrap();
    assert_eq!(
        pipeline.stage_names(),
        vec!["checksum", "compress", "encrypt", "count"]
    );
}

#[test]
fn test_read_stage_order() {
    let mut sink = Vec::new();
    let pipeline = Pipeline::for_read(1024, None, false, Some(&mut sink as &mut dyn Write)).unwrap();
    assert_eq!(pipeline.stage_names(), vec!["checksum", "mirror", "count"]);
}

#[test]
fn test_chunk_size_does_not_change_results() {
    let data = text_payload(10_007);
    let expected = crc32(&data);
    for buffer_size in [1usize, 7, 4096, 1 << 20] {
        let plan = WritePlan {
            checksum: true,
            ..Default::default()
        };
        let out = Pipeline::for_write(buffer_size, plan, None)
            .unwrap()
            .run(Source::Bytes(&data))
            .unwrap();
        assert_eq!(out.bytes_in, data.len() as u64, "buffer {buffer_size}");
        assert_eq!(out.bytes_out, Some(data.len() as u64));
        assert_eq!(out.crc32, Some(expected));
    }
}

#[test]
fn test_range_source_reads_only_its_window() {
    let data = b"0123456789abcdef".to_vec();
    let mut reader = Cursor::new(data);
    let mut sink = Vec::new();
    let out = Pipeline::for_read(3, None, false, Some(&mut sink as &mut dyn Write))
        .unwrap()
        .run(Source::Range {
            reader: &mut reader,
            offset: 4,
            len: 8,
        })
        .unwrap();
    assert_eq!(out.bytes_in, 8);
    assert_eq!(sink, b"456789ab");
    assert_eq!(out.crc32, Some(crc32(b"456789ab")));
}

#[test]
fn test_path_source() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("input.bin");
    std::fs::write(&path, b"from a file").unwrap();

    let plan = WritePlan {
        checksum: true,
        ..Default::default()
    };
    let out = Pipeline::for_write(4, plan, None)
        .unwrap()
        .run(Source::Path(&path))
        .unwrap();
    assert_eq!(out.bytes_out, Some(11));
    assert_eq!(out.crc32, Some(crc32(b"from a file")));
}

#[test]
fn test_missing_path_source_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let missing = dir.path().join("missing");
    let plan = WritePlan::default();
    let err = Pipeline::for_write(16, plan, None)
        .unwrap()
        .run(Source::Path(&missing))
        .unwrap_err();
    assert!(matches!(err, zipwright::Error::Io(_)));
}

#[test]
fn test_tiny_buffers_roundtrip() {
    let big = text_payload(50_000);
    let noise = common::random_payload(20_000, 7);
    let entries: Vec<(&str, &[u8])> = vec![
        ("a.txt", &big),
        ("noise.bin", &noise),
        ("b/", b""),
        ("b/c.bin", b"\x00\x01\x02\x03"),
    ];
    let opts = WriteOptions::new().streaming(StreamingConfig::new().write_buffer_size(13));
    let bytes = common::create_archive(Some(opts), &entries);

    let mut archive = open(
        bytes,
        ParseOptions::new().verify_crc(true).read_buffer_size(5),
    );
    assert!(archive.report().is_valid());
    verify_archive_contents(&mut archive, &entries);
}

#[test]
fn test_tiny_buffers_with_encryption() {
    let payload = text_payload(3_000);
    let entries: Vec<(&str, &[u8])> = vec![("secret.txt", &payload)];
    let opts = WriteOptions::new()
        .encryption(EncryptionMethod::zip_crypto("tiny"))
        .streaming(StreamingConfig::low_memory().write_buffer_size(3));
    let bytes = common::create_archive(Some(opts), &entries);

    let options = ParseOptions::new()
        .verify_crc(true)
        .password("tiny")
        .read_buffer_size(1);
    let mut archive = open(bytes, options);
    assert!(archive.report().is_valid());
    verify_archive_contents(&mut archive, &entries);
}
