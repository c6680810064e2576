//! Property-based tests using proptest.
//!
//! These tests check invariants of the writer and the parser over randomly
//! generated entry sets and arbitrary input bytes.

mod common;

use std::collections::HashSet;
use std::io::Cursor;

use proptest::prelude::*;
use zipwright::read::ParseOptions;
use zipwright::{ArchivePath, EntryMeta, WriteOptions, Writer};

/// Strategy for path strings accepted by `ArchivePath::new`.
fn valid_path_strategy() -> impl Strategy<Value = String> {
    proptest::collection::vec("[a-zA-Z0-9][a-zA-Z0-9_-]{0,9}", 1..4).prop_map(|parts| parts.join("/"))
}

/// Up to eight entries with distinct names.
fn entries_strategy() -> impl Strategy<Value = Vec<(String, Vec<u8>)>> {
    proptest::collection::vec(
        (valid_path_strategy(), proptest::collection::vec(any::<u8>(), 0..2048)),
        0..8,
    )
    .prop_map(|entries| {
        let mut seen = HashSet::new();
        entries
            .into_iter()
            .filter(|(name, _)| seen.insert(name.to_lowercase()))
            .collect()
    })
}

fn options_strategy() -> impl Strategy<Value = WriteOptions> {
    (any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>(), any::<bool>()).prop_map(
        |(compress, descriptor, ntfs, unix, unicode)| {
            WriteOptions::new()
                .compress(compress && cfg!(feature = "deflate"))
                .data_descriptor(descriptor)
                .ntfs_times(ntfs)
                .unix_times(unix)
                .unicode_path(unicode)
        },
    )
}

fn write(options: WriteOptions, entries: &[(String, Vec<u8>)]) -> (Vec<u8>, u64) {
    let mut writer = Writer::create(Cursor::new(Vec::new())).unwrap().options(options);
    for (name, data) in entries {
        writer
            .add_bytes_with_meta(
                ArchivePath::new(name).unwrap(),
                data,
                EntryMeta::file().modification_time(common::MTIME),
            )
            .unwrap();
    }
    let predicted = writer.archive_len().unwrap();
    let (_, sink) = writer.finish_into_inner().unwrap();
    (sink.into_inner(), predicted)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    #[test]
    fn prop_archives_roundtrip(entries in entries_strategy(), options in options_strategy()) {
        let (bytes, predicted) = write(options, &entries);
        prop_assert_eq!(bytes.len() as u64, predicted);

        let mut archive = common::open(bytes, ParseOptions::new().verify_crc(true));
        prop_assert!(archive.report().is_valid());
        prop_assert_eq!(archive.len(), entries.len());
        for (i, (name, data)) in entries.iter().enumerate() {
            prop_assert_eq!(&archive.entries()[i].name, name);
            prop_assert_eq!(&archive.read_entry(i).unwrap(), data);
        }
    }

    #[test]
    fn prop_comment_roundtrip(comment in "[ -~]{0,300}") {
        let bytes = common::create_archive(
            Some(WriteOptions::new().comment(comment.clone())),
            &[("x", b"x")],
        );
        let archive = common::open(bytes, ParseOptions::default());
        prop_assert_eq!(archive.comment(), comment.as_bytes());
    }

    #[test]
    fn prop_parse_never_panics(bytes in proptest::collection::vec(any::<u8>(), 0..512)) {
        let _ = zipwright::parse(Cursor::new(bytes), ParseOptions::new().verify_crc(true));
    }

    #[test]
    fn prop_damaged_archives_never_panic(
        entries in entries_strategy(),
        position in any::<prop::sample::Index>(),
        value in any::<u8>(),
    ) {
        let (mut bytes, _) = write(WriteOptions::new(), &entries);
        let i = position.index(bytes.len());
        bytes[i] = value;
        let _ = zipwright::parse(Cursor::new(bytes), ParseOptions::new().verify_crc(true));
    }

    #[test]
    fn prop_valid_paths_accepted(path in valid_path_strategy()) {
        let parsed = ArchivePath::new(&path);
        prop_assert!(parsed.is_ok(), "rejected {}", path);
        let parsed = parsed.unwrap();
        prop_assert_eq!(parsed.as_str(), path.as_str());
    }

    #[test]
    fn prop_traversal_rejected(prefix in "[a-z]{0,5}", suffix in "[a-z]{1,5}") {
        let path = if prefix.is_empty() {
            format!("../{suffix}")
        } else {
            format!("{prefix}/../{suffix}")
        };
        prop_assert!(ArchivePath::new(&path).is_err());
    }
}
