//! Extra field tests: which fields each writer option emits into the local
//! and central headers, and how the reader decodes them back.

mod common;

use std::io::Cursor;

use common::{MTIME, create_archive, open};
use zipwright::checksum::crc32;
use zipwright::format::extra_field::{
    ExtendedTimestamp, ExtraField, NtfsTimes, UnixIds, UnixTimes,
};
use zipwright::read::ParseOptions;
use zipwright::{ArchivePath, EntryMeta, WriteOptions, Writer};

fn single(options: WriteOptions) -> zipwright::Archive<Cursor<Vec<u8>>> {
    open(
        create_archive(Some(options), &[("docs/a.txt", b"alpha")]),
        ParseOptions::new().verify_crc(true),
    )
}

#[test]
fn test_defaults_emit_no_fields() {
    let archive = single(WriteOptions::new());
    assert!(archive.entries()[0].extra_fields.is_empty());
    assert!(archive.report().central[0].extra_fields.is_empty());
    assert_eq!(archive.report().central[0].header.version_made_by, 0x003F);
}

#[test]
fn test_ntfs_times_central_only() {
    let archive = single(WriteOptions::new().ntfs_times(true));
    assert!(archive.entries()[0].extra_fields.is_empty());
    assert_eq!(
        archive.report().central[0].extra_fields,
        vec![ExtraField::Ntfs(NtfsTimes::from_unix(MTIME, None, None))]
    );
    assert_eq!(archive.report().central[0].header.version_made_by, 0x003F);
}

#[test]
fn test_unix_times_local_only_and_marks_host() {
    let archive = single(WriteOptions::new().unix_times(true));
    assert_eq!(
        archive.entries()[0].extra_fields,
        vec![ExtraField::Unix(UnixTimes {
            atime: MTIME as u32,
            mtime: MTIME as u32,
            uid: 32_767,
            gid: 0,
        })]
    );
    let central = &archive.report().central[0];
    assert!(central.extra_fields.is_empty());
    assert_eq!(central.header.version_made_by & 0xFF00, 0x0300);
    assert_eq!(central.header.external_attributes >> 16, 0o100_644);
}

#[test]
fn test_unix_ids_local_only() {
    let archive = single(WriteOptions::new().unix_ids(true));
    assert_eq!(
        archive.entries()[0].extra_fields,
        vec![ExtraField::UnixIds(Some(UnixIds { uid: 65_534, gid: 0 }))]
    );
    let central = &archive.report().central[0];
    assert!(central.extra_fields.is_empty());
    assert_eq!(central.header.version_made_by, 0x033F);
}

#[test]
fn test_extended_timestamp_variants() {
    let archive = single(WriteOptions::new().extended_timestamp(true));
    let t = MTIME as u32;
    assert_eq!(
        archive.entries()[0].extra_fields,
        vec![ExtraField::ExtendedTimestamp(ExtendedTimestamp {
            flags: 7,
            mtime: Some(t),
            atime: Some(t),
            ctime: Some(t),
        })]
    );
    assert_eq!(
        archive.report().central[0].extra_fields,
        vec![ExtraField::ExtendedTimestamp(ExtendedTimestamp {
            flags: 7,
            mtime: Some(t),
            atime: None,
            ctime: None,
        })]
    );
}

#[test]
fn test_extended_timestamp_uses_access_time() {
    let mut writer = Writer::create(Cursor::new(Vec::new()))
        .unwrap()
        .options(WriteOptions::new().extended_timestamp(true));
    writer
        .add_bytes_with_meta(
            ArchivePath::new("t.txt").unwrap(),
            b"t",
            EntryMeta::file()
                .modification_time(MTIME)
                .access_time(MTIME + 60),
        )
        .unwrap();
    let (_, sink) = writer.finish_into_inner().unwrap();

    let archive = open(sink.into_inner(), ParseOptions::default());
    let Some(ExtraField::ExtendedTimestamp(ts)) = archive.entries()[0].extra_fields.first().cloned()
    else {
        panic!("expected an extended timestamp");
    };
    assert_eq!(ts.mtime, Some(MTIME as u32));
    assert_eq!(ts.atime, Some(MTIME as u32 + 60));
    // creation time falls back to access time
    assert_eq!(ts.ctime, Some(MTIME as u32 + 60));
}

#[test]
fn test_unicode_path_in_both_headers() {
    let archive = single(WriteOptions::new().unicode_path(true));
    for fields in [
        &archive.entries()[0].extra_fields,
        &archive.report().central[0].extra_fields,
    ] {
        let [ExtraField::UnicodePath(path)] = fields.as_slice() else {
            panic!("expected a single unicode path field, got {fields:?}");
        };
        assert_eq!(path.version, 1);
        assert_eq!(path.name_crc32, crc32(b"docs/a.txt"));
        assert_eq!(path.name, b"docs/a.txt");
    }
    assert!(archive.report().central[0].header.version_needed >= 20);
}

#[test]
fn test_unicode_path_restores_legacy_name() {
    let name = "日本語/ファイル.txt";
    let opts = WriteOptions::new().utf8_names(false).unicode_path(true);
    let bytes = create_archive(Some(opts), &[(name, b"kana")]);

    let mut archive = open(bytes, ParseOptions::new().verify_crc(true));
    let entry = &archive.entries()[0];
    assert_eq!(entry.header.flags & 0x0800, 0);
    assert_ne!(entry.header.file_name, name.as_bytes());
    assert_eq!(entry.name, name);
    assert_eq!(archive.read_entry_by_name(name).unwrap(), b"kana");
}

#[test]
fn test_all_fields_together() {
    let opts = WriteOptions::new()
        .ntfs_times(true)
        .unix_times(true)
        .unix_ids(true)
        .extended_timestamp(true)
        .unicode_path(true);
    let entries: &[(&str, &[u8])] = &[("dir/", b""), ("dir/f.txt", b"payload")];
    let (bytes, result) = common::create_archive_with_result(Some(opts), entries).unwrap();
    assert_eq!(result.archive_size, bytes.len() as u64);

    let mut archive = open(bytes, ParseOptions::new().verify_crc(true));
    assert!(archive.report().is_valid());

    let local_ids: Vec<u16> = archive.entries()[1]
        .extra_fields
        .iter()
        .map(ExtraField::header_id)
        .collect();
    assert_eq!(local_ids, vec![0x000d, 0x7855, 0x5455, 0x7075]);

    let central_ids: Vec<u16> = archive.report().central[1]
        .extra_fields
        .iter()
        .map(ExtraField::header_id)
        .collect();
    assert_eq!(central_ids, vec![0x000a, 0x5455, 0x7075]);

    let dir = &archive.report().central[0];
    assert_eq!(dir.header.external_attributes >> 16, 0o040_755);
    assert_eq!(dir.header.external_attributes & 0x10, 0x10);

    common::verify_archive_contents(&mut archive, entries);
}

#[test]
fn test_archive_len_accounts_for_fields() {
    let opts = WriteOptions::new()
        .ntfs_times(true)
        .extended_timestamp(true)
        .unicode_path(true);
    let mut writer = Writer::create(Cursor::new(Vec::new())).unwrap().options(opts);
    for name in ["a", "bb/", "bb/ccc.txt"] {
        let path = ArchivePath::new(name).unwrap();
        if path.is_directory() {
            writer.add_directory(path, EntryMeta::directory()).unwrap();
        } else {
            writer.add_bytes(path, name.as_bytes()).unwrap();
        }
    }
    let predicted = writer.archive_len().unwrap();
    let (_, sink) = writer.finish_into_inner().unwrap();
    assert_eq!(sink.into_inner().len() as u64, predicted);
}

#[test]
fn test_unicode_path_dropped_for_near_limit_names() {
    let name = "n".repeat(65_530);
    let payload = b"payload next to a very long name";
    let options = WriteOptions::new().compress(false).unicode_path(true);
    let bytes = create_archive(Some(options), &[(name.as_str(), payload)]);

    let mut archive = open(bytes, ParseOptions::new().verify_crc(true));
    assert!(archive.report().is_valid(), "errors: {:?}", archive.report().errors);
    assert_eq!(archive.entries()[0].name, name);
    assert!(archive.entries()[0].extra_fields.is_empty());
    assert!(archive.report().central[0].extra_fields.is_empty());
    assert_eq!(archive.read_entry(0).unwrap(), payload);
}
