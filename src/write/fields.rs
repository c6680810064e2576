//! Extra-field builders applied to every entry.
//!
//! The archive options select an ordered list of builders once; each
//! builder then produces the local and central variant of its field for
//! any entry. Injection clears the previous set first, so re-emitting an
//! entry yields the same fields. A field that would overflow the 16-bit
//! extra field length is left out.

use log::warn;

use crate::checksum::crc32;
use crate::format::extra_field::{
    AexInfo, ExtendedTimestamp, ExtraField, NtfsTimes, UnicodePath, UnixIds, UnixTimes,
};
use crate::layout::{CentralDirectoryRecord, FileEntry};

use super::options::WriteOptions;

/// Owner id written to the PKWARE Unix field.
const UNIX_V1_UID: u16 = 32_767;
/// Owner id written to the Info-ZIP Unix field ("nobody").
const UNIX_V2_UID: u16 = 65_534;
const EXTENDED_TIMESTAMP_ALL: u8 = 0b111;
/// Largest ZIP64 field a local header may gain once sizes are known.
const LOCAL_ZIP64_ROOM: usize = 4 + 16;
/// Largest ZIP64 field a central record may gain.
const CENTRAL_ZIP64_ROOM: usize = 4 + 24;

/// One extra field the writer attaches to entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldBuilder {
    /// NTFS timestamps, central directory only.
    NtfsTimes,
    /// PKWARE Unix times and ids, local header only.
    UnixTimes,
    /// Info-ZIP Unix ids, local header only.
    UnixIds,
    /// Extended timestamp: all times locally, mtime centrally.
    ExtendedTimestamp,
    /// Info-ZIP Unicode path, both headers.
    UnicodePath,
    /// AE-x parameters, both headers, for AE-x entries.
    Aex,
}

impl FieldBuilder {
    /// The builders selected by `options`, in emission order.
    pub fn for_options(options: &WriteOptions) -> Vec<Self> {
        [
            (options.ntfs_times, Self::NtfsTimes),
            (options.unix_times, Self::UnixTimes),
            (options.unix_ids, Self::UnixIds),
            (options.extended_timestamp, Self::ExtendedTimestamp),
            (options.unicode_path, Self::UnicodePath),
            (true, Self::Aex),
        ]
        .into_iter()
        .filter_map(|(enabled, builder)| enabled.then_some(builder))
        .collect()
    }

    /// Whether the central record is marked as made on a Unix host.
    pub fn marks_unix_host(self) -> bool {
        matches!(self, Self::UnixTimes | Self::UnixIds)
    }

    /// The local header variant, if this builder has one for `entry`.
    pub fn local(self, entry: &FileEntry) -> Option<ExtraField> {
        let times = entry.times();
        match self {
            Self::NtfsTimes => None,
            Self::UnixTimes => Some(ExtraField::Unix(UnixTimes {
                atime: unix_u32(times.atime_or_mtime()),
                mtime: unix_u32(times.mtime),
                uid: UNIX_V1_UID,
                gid: 0,
            })),
            Self::UnixIds => Some(ExtraField::UnixIds(Some(UnixIds {
                uid: UNIX_V2_UID,
                gid: 0,
            }))),
            Self::ExtendedTimestamp => Some(ExtraField::ExtendedTimestamp(ExtendedTimestamp {
                flags: EXTENDED_TIMESTAMP_ALL,
                mtime: Some(unix_u32(times.mtime)),
                atime: Some(unix_u32(times.atime_or_mtime())),
                ctime: Some(unix_u32(times.ctime_or_atime())),
            })),
            Self::UnicodePath => Some(unicode_path(entry)),
            Self::Aex => aex(entry),
        }
    }

    /// The central directory variant, if this builder has one for `entry`.
    pub fn central(self, entry: &FileEntry) -> Option<ExtraField> {
        let times = entry.times();
        match self {
            Self::NtfsTimes => Some(ExtraField::Ntfs(NtfsTimes::from_unix(
                times.mtime,
                times.atime,
                times.ctime,
            ))),
            Self::UnixTimes | Self::UnixIds => None,
            Self::ExtendedTimestamp => Some(ExtraField::ExtendedTimestamp(ExtendedTimestamp {
                flags: EXTENDED_TIMESTAMP_ALL,
                mtime: Some(unix_u32(times.mtime)),
                atime: None,
                ctime: None,
            })),
            Self::UnicodePath => Some(unicode_path(entry)),
            Self::Aex => aex(entry),
        }
    }
}

/// Replaces the local extra fields of `entry`.
pub fn inject_local(builders: &[FieldBuilder], entry: &mut FileEntry) {
    entry.clear_extra_fields();
    let mut used = LOCAL_ZIP64_ROOM;
    for builder in builders {
        if let Some(field) = builder.local(entry) {
            if !fits(&mut used, &field) {
                warn!(
                    "'{}': no room for extra field {:#06x} in the local header",
                    entry.path(),
                    field.header_id()
                );
                continue;
            }
            entry.push_extra_field(field);
        }
    }
}

/// Replaces the central extra fields of `record`, mirrored from `entry`.
pub fn inject_central(builders: &[FieldBuilder], entry: &FileEntry, record: &mut CentralDirectoryRecord) {
    record.clear_extra_fields();
    let mut used = CENTRAL_ZIP64_ROOM;
    for builder in builders {
        if builder.marks_unix_host() {
            record.set_unix_host();
        }
        if let Some(field) = builder.central(entry) {
            if !fits(&mut used, &field) {
                warn!(
                    "'{}': no room for extra field {:#06x} in the central directory",
                    entry.path(),
                    field.header_id()
                );
                continue;
            }
            record.push_extra_field(field);
        }
    }
}

/// Adds `field` to the running block length if the block stays within
/// the 16-bit length field.
fn fits(used: &mut usize, field: &ExtraField) -> bool {
    let total = *used + field.byte_length();
    if total > u16::MAX as usize {
        return false;
    }
    *used = total;
    true
}

fn unix_u32(secs: i64) -> u32 {
    secs.clamp(0, u32::MAX as i64) as u32
}

fn unicode_path(entry: &FileEntry) -> ExtraField {
    ExtraField::UnicodePath(UnicodePath {
        version: 1,
        name_crc32: crc32(entry.name_bytes()),
        name: entry.path().as_str().as_bytes().to_vec(),
    })
}

fn aex(entry: &FileEntry) -> Option<ExtraField> {
    entry.aes_strength().map(|strength| {
        ExtraField::Aex(AexInfo {
            vendor_version: 2,
            strength: strength.code(),
            method: entry.compression_method(),
        })
    })
}
