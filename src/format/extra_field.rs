//! Extra field codec.
//!
//! An extra field is a list of tagged records, each `id: u16, len: u16`
//! followed by `len` bytes of data. [`ExtraField`] is a closed variant
//! over the records this crate writes; anything else round-trips as
//! [`ExtraField::Unknown`].
//!
//! The ZIP64 record is context dependent. Its data is a sequence of the
//! values whose 32-bit header fields hold the sentinel, always in the order
//! size, compressed size, offset, disk start. Parsing therefore takes a
//! [`Zip64Fields`] mask describing which header fields hold the sentinel.
//! A header field may also hold `0xFFFFFFFF` as its literal value; a record
//! shorter than the mask is matched to the values it can hold with
//! [`Zip64Fields::narrow_to`].
//!
//! Malformed optional records never fail parsing: they are kept as
//! `Unknown` and a warning is logged.

use crate::timestamp::Timestamp;

use super::reader::SliceReader;
use super::{PutLe, U16_LIMIT, U32_LIMIT, clamp_u16, extra_id};

/// Which header fields hold a ZIP64 sentinel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64Fields {
    /// Uncompressed size overflowed.
    pub size: bool,
    /// Compressed size overflowed.
    pub compressed_size: bool,
    /// Local header offset overflowed (central directory only).
    pub offset: bool,
    /// Disk start number overflowed (central directory only).
    pub disk_start: bool,
}

impl Zip64Fields {
    /// Returns `true` if any field overflowed.
    pub fn any(&self) -> bool {
        self.size || self.compressed_size || self.offset || self.disk_start
    }

    /// Encoded length of the values this mask selects.
    pub fn data_len(&self) -> usize {
        8 * (self.size as usize + self.compressed_size as usize + self.offset as usize)
            + 4 * self.disk_start as usize
    }

    fn from_bits(bits: u8) -> Self {
        Self {
            size: bits & 0b1000 != 0,
            compressed_size: bits & 0b0100 != 0,
            offset: bits & 0b0010 != 0,
            disk_start: bits & 0b0001 != 0,
        }
    }

    fn contains(&self, other: &Self) -> bool {
        (self.size || !other.size)
            && (self.compressed_size || !other.compressed_size)
            && (self.offset || !other.offset)
            && (self.disk_start || !other.disk_start)
    }

    /// The values a ZIP64 record of `len` bytes holds, given the header
    /// fields that read as sentinels.
    ///
    /// A record at least as long as the mask holds every value. A shorter
    /// one holds a subset whose length matches exactly; the remaining
    /// fields carried their literal value. When several subsets match, the
    /// earliest fields in record order are the literal ones. Returns `None`
    /// if no subset matches.
    pub fn narrow_to(self, len: usize) -> Option<Self> {
        if len >= self.data_len() {
            return Some(self);
        }
        (0u8..16)
            .map(Self::from_bits)
            .find(|mask| self.contains(mask) && mask.data_len() == len)
    }
}

/// ZIP64 extended information (0x0001).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zip64ExtendedInfo {
    /// Uncompressed size.
    pub size: Option<u64>,
    /// Compressed size.
    pub compressed_size: Option<u64>,
    /// Local header offset.
    pub offset: Option<u64>,
    /// Disk start number.
    pub disk_start: Option<u32>,
}

impl Zip64ExtendedInfo {
    /// Fixed 16-byte form used in local headers: both sizes, always.
    pub fn local(size: u64, compressed_size: u64) -> Self {
        Self {
            size: Some(size),
            compressed_size: Some(compressed_size),
            offset: None,
            disk_start: None,
        }
    }

    /// Variable form used in central directory headers.
    ///
    /// Only the values that do not fit their header field are included.
    /// Returns `None` when nothing overflows.
    pub fn central(size: u64, compressed_size: u64, offset: u64, disk_start: u32) -> Option<Self> {
        let info = Self {
            size: (size > U32_LIMIT).then_some(size),
            compressed_size: (compressed_size > U32_LIMIT).then_some(compressed_size),
            offset: (offset > U32_LIMIT).then_some(offset),
            disk_start: (disk_start as u64 > U16_LIMIT).then_some(disk_start),
        };
        info.fields().any().then_some(info)
    }

    /// Which values are present.
    pub fn fields(&self) -> Zip64Fields {
        Zip64Fields {
            size: self.size.is_some(),
            compressed_size: self.compressed_size.is_some(),
            offset: self.offset.is_some(),
            disk_start: self.disk_start.is_some(),
        }
    }

    fn data_len(&self) -> usize {
        self.fields().data_len()
    }

    fn serialize_data(&self, out: &mut Vec<u8>) {
        if let Some(v) = self.size {
            out.put_u64(v);
        }
        if let Some(v) = self.compressed_size {
            out.put_u64(v);
        }
        if let Some(v) = self.offset {
            out.put_u64(v);
        }
        if let Some(v) = self.disk_start {
            out.put_u32(v);
        }
    }

    /// Reads the values selected by `wanted`, in the fixed order.
    ///
    /// Values missing from a short record stay `None`.
    pub fn parse(data: &[u8], wanted: Zip64Fields) -> Self {
        let mut r = SliceReader::new(data);
        let mut info = Self::default();
        if wanted.size {
            info.size = r.u64();
        }
        if wanted.compressed_size {
            info.compressed_size = r.u64();
        }
        if wanted.offset {
            info.offset = r.u64();
        }
        if wanted.disk_start {
            info.disk_start = r.u32();
        }
        if info.fields() != wanted {
            log::warn!(
                "ZIP64 extra field of {} bytes is too short for {:?}",
                data.len(),
                wanted
            );
        }
        info
    }
}

/// NTFS timestamps (0x000a) as FILETIME values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NtfsTimes {
    /// Last modification.
    pub mtime: u64,
    /// Last access.
    pub atime: u64,
    /// Creation.
    pub ctime: u64,
}

impl NtfsTimes {
    const TAG: u16 = 0x0001;
    const TAG_SIZE: u16 = 24;
    const DATA_LEN: usize = 32;

    /// Converts Unix seconds. Access time defaults to modification time and
    /// creation time to access time.
    pub fn from_unix(mtime: i64, atime: Option<i64>, ctime: Option<i64>) -> Self {
        let atime = atime.unwrap_or(mtime);
        let ctime = ctime.unwrap_or(atime);
        let ft = |t: i64| Timestamp::from_unix_secs(t).map_or(0, |ts| ts.as_filetime());
        Self {
            mtime: ft(mtime),
            atime: ft(atime),
            ctime: ft(ctime),
        }
    }

    fn parse(data: &[u8]) -> Option<Self> {
        let mut r = SliceReader::new(data);
        let _reserved = r.u32()?;
        while r.remaining() >= 4 {
            let tag = r.u16()?;
            let size = r.u16()?;
            let body = r.bytes(size as usize)?;
            if tag == Self::TAG && size == Self::TAG_SIZE {
                let mut t = SliceReader::new(body);
                return Some(Self {
                    mtime: t.u64()?,
                    atime: t.u64()?,
                    ctime: t.u64()?,
                });
            }
        }
        None
    }
}

/// PKWARE Unix field (0x000d): times and ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnixTimes {
    /// Last access, Unix seconds.
    pub atime: u32,
    /// Last modification, Unix seconds.
    pub mtime: u32,
    /// Owner id.
    pub uid: u16,
    /// Group id.
    pub gid: u16,
}

/// Info-ZIP Unix type 2 field (0x7855): owner and group.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnixIds {
    /// Owner id.
    pub uid: u16,
    /// Group id.
    pub gid: u16,
}

/// Extended timestamp field (0x5455).
///
/// `flags` announces which times exist (bit 0 mtime, bit 1 atime, bit 2
/// ctime), but the central directory variant conventionally carries only
/// the modification time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExtendedTimestamp {
    /// Presence flags.
    pub flags: u8,
    /// Last modification, Unix seconds.
    pub mtime: Option<u32>,
    /// Last access, Unix seconds.
    pub atime: Option<u32>,
    /// Creation, Unix seconds.
    pub ctime: Option<u32>,
}

/// Info-ZIP Unicode path field (0x7075).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnicodePath {
    /// Field version, always 1.
    pub version: u8,
    /// CRC-32 of the name as stored in the header.
    pub name_crc32: u32,
    /// UTF-8 name.
    pub name: Vec<u8>,
}

/// WinZip AE-x field (0x9901).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AexInfo {
    /// 1 for AE-1 (CRC stored), 2 for AE-2 (CRC zeroed).
    pub vendor_version: u16,
    /// Strength code: 1, 2 or 3.
    pub strength: u8,
    /// The compression method replaced by 99 in the header.
    pub method: u16,
}

impl AexInfo {
    /// The vendor id bytes, "AE".
    pub const VENDOR_ID: [u8; 2] = *b"AE";
    const DATA_LEN: usize = 7;
}

/// One extra field record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExtraField {
    /// ZIP64 extended information.
    Zip64(Zip64ExtendedInfo),
    /// NTFS timestamps.
    Ntfs(NtfsTimes),
    /// PKWARE Unix times and ids.
    Unix(UnixTimes),
    /// Info-ZIP Unix ids; `None` for the empty central directory form.
    UnixIds(Option<UnixIds>),
    /// Extended timestamp.
    ExtendedTimestamp(ExtendedTimestamp),
    /// Unicode path.
    UnicodePath(UnicodePath),
    /// AE-x parameters.
    Aex(AexInfo),
    /// Any other record, kept verbatim.
    Unknown {
        /// Header id.
        id: u16,
        /// Raw data.
        data: Vec<u8>,
    },
}

impl ExtraField {
    /// Returns the 2-byte header id.
    pub fn header_id(&self) -> u16 {
        match self {
            Self::Zip64(_) => extra_id::ZIP64,
            Self::Ntfs(_) => extra_id::NTFS,
            Self::Unix(_) => extra_id::UNIX,
            Self::UnixIds(_) => extra_id::UNIX2,
            Self::ExtendedTimestamp(_) => extra_id::EXTENDED_TIMESTAMP,
            Self::UnicodePath(_) => extra_id::UNICODE_PATH,
            Self::Aex(_) => extra_id::AEX,
            Self::Unknown { id, .. } => *id,
        }
    }

    /// Length of the data part.
    pub fn data_len(&self) -> usize {
        match self {
            Self::Zip64(info) => info.data_len(),
            Self::Ntfs(_) => NtfsTimes::DATA_LEN,
            Self::Unix(_) => 12,
            Self::UnixIds(ids) => ids.map_or(0, |_| 4),
            Self::ExtendedTimestamp(ts) => {
                1 + 4 * (ts.mtime.is_some() as usize
                    + ts.atime.is_some() as usize
                    + ts.ctime.is_some() as usize)
            }
            Self::UnicodePath(p) => 5 + p.name.len(),
            Self::Aex(_) => AexInfo::DATA_LEN,
            Self::Unknown { data, .. } => data.len(),
        }
    }

    /// Serialized length including the 4-byte id/length prefix.
    pub fn byte_length(&self) -> usize {
        4 + self.data_len()
    }

    /// Appends the serialized record to `out`.
    pub fn serialize(&self, out: &mut Vec<u8>) {
        out.put_u16(self.header_id());
        // A record this long overflows the block, which header encoding rejects.
        out.put_u16(clamp_u16(self.data_len() as u64));
        match self {
            Self::Zip64(info) => info.serialize_data(out),
            Self::Ntfs(t) => {
                out.put_u32(0);
                out.put_u16(NtfsTimes::TAG);
                out.put_u16(NtfsTimes::TAG_SIZE);
                out.put_u64(t.mtime);
                out.put_u64(t.atime);
                out.put_u64(t.ctime);
            }
            Self::Unix(u) => {
                out.put_u32(u.atime);
                out.put_u32(u.mtime);
                out.put_u16(u.uid);
                out.put_u16(u.gid);
            }
            Self::UnixIds(ids) => {
                if let Some(ids) = ids {
                    out.put_u16(ids.uid);
                    out.put_u16(ids.gid);
                }
            }
            Self::ExtendedTimestamp(ts) => {
                out.put_u8(ts.flags);
                for t in [ts.mtime, ts.atime, ts.ctime].into_iter().flatten() {
                    out.put_u32(t);
                }
            }
            Self::UnicodePath(p) => {
                out.put_u8(p.version);
                out.put_u32(p.name_crc32);
                out.extend_from_slice(&p.name);
            }
            Self::Aex(a) => {
                out.put_u16(a.vendor_version);
                out.extend_from_slice(&AexInfo::VENDOR_ID);
                out.put_u8(a.strength);
                out.put_u16(a.method);
            }
            Self::Unknown { data, .. } => out.extend_from_slice(data),
        }
    }

    /// Decodes one record.
    pub fn parse(id: u16, data: &[u8], zip64: Zip64Fields) -> Self {
        let parsed = match id {
            extra_id::ZIP64 => {
                let present = zip64.narrow_to(data.len()).unwrap_or(zip64);
                Some(Self::Zip64(Zip64ExtendedInfo::parse(data, present)))
            }
            extra_id::NTFS => NtfsTimes::parse(data).map(Self::Ntfs),
            extra_id::UNIX => parse_unix(data),
            extra_id::UNIX2 => parse_unix_ids(data),
            extra_id::EXTENDED_TIMESTAMP => parse_extended_timestamp(data),
            extra_id::UNICODE_PATH => parse_unicode_path(data),
            extra_id::AEX => parse_aex(data),
            _ => {
                return Self::Unknown {
                    id,
                    data: data.to_vec(),
                };
            }
        };
        parsed.unwrap_or_else(|| {
            log::warn!(
                "skipping malformed extra field {:#06x} ({} bytes)",
                id,
                data.len()
            );
            Self::Unknown {
                id,
                data: data.to_vec(),
            }
        })
    }
}

fn parse_unix(data: &[u8]) -> Option<ExtraField> {
    let mut r = SliceReader::new(data);
    Some(ExtraField::Unix(UnixTimes {
        atime: r.u32()?,
        mtime: r.u32()?,
        uid: r.u16()?,
        gid: r.u16()?,
    }))
}

fn parse_unix_ids(data: &[u8]) -> Option<ExtraField> {
    if data.is_empty() {
        return Some(ExtraField::UnixIds(None));
    }
    let mut r = SliceReader::new(data);
    Some(ExtraField::UnixIds(Some(UnixIds {
        uid: r.u16()?,
        gid: r.u16()?,
    })))
}

fn parse_extended_timestamp(data: &[u8]) -> Option<ExtraField> {
    let mut r = SliceReader::new(data);
    let flags = r.u8()?;
    let mut next = |bit: u8| if flags & bit != 0 { r.u32() } else { None };
    let mtime = next(1);
    let atime = next(2);
    let ctime = next(4);
    Some(ExtraField::ExtendedTimestamp(ExtendedTimestamp {
        flags,
        mtime,
        atime,
        ctime,
    }))
}

fn parse_unicode_path(data: &[u8]) -> Option<ExtraField> {
    let mut r = SliceReader::new(data);
    let version = r.u8()?;
    let name_crc32 = r.u32()?;
    Some(ExtraField::UnicodePath(UnicodePath {
        version,
        name_crc32,
        name: r.rest().to_vec(),
    }))
}

fn parse_aex(data: &[u8]) -> Option<ExtraField> {
    if data.len() != AexInfo::DATA_LEN {
        return None;
    }
    let mut r = SliceReader::new(data);
    let vendor_version = r.u16()?;
    if r.bytes(2)? != AexInfo::VENDOR_ID {
        return None;
    }
    Some(ExtraField::Aex(AexInfo {
        vendor_version,
        strength: r.u8()?,
        method: r.u16()?,
    }))
}

/// Splits a raw extra field block into records.
///
/// A record whose declared length runs past the block ends parsing; the
/// remaining bytes are ignored with a warning.
pub fn parse_extra_fields(bytes: &[u8], zip64: Zip64Fields) -> Vec<ExtraField> {
    let mut fields = Vec::new();
    let mut r = SliceReader::new(bytes);
    while r.remaining() >= 4 {
        let (Some(id), Some(len)) = (r.u16(), r.u16()) else {
            break;
        };
        let Some(data) = r.bytes(len as usize) else {
            log::warn!(
                "extra field {:#06x} declares {} bytes but only {} remain",
                id,
                len,
                r.remaining()
            );
            break;
        };
        fields.push(ExtraField::parse(id, data, zip64));
    }
    fields
}

/// Serializes records back to back.
pub fn serialize_extra_fields(fields: &[ExtraField]) -> Vec<u8> {
    let mut out = Vec::with_capacity(extra_fields_len(fields));
    for field in fields {
        field.serialize(&mut out);
    }
    out
}

/// Total serialized length of the records.
pub fn extra_fields_len(fields: &[ExtraField]) -> usize {
    fields.iter().map(ExtraField::byte_length).sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bytes(field: &ExtraField) -> Vec<u8> {
        let mut out = Vec::new();
        field.serialize(&mut out);
        assert_eq!(out.len(), field.byte_length());
        out
    }

    #[test]
    fn test_zip64_local_form_is_fixed() {
        let field = ExtraField::Zip64(Zip64ExtendedInfo::local(5, 0x1_0000_0000));
        let out = bytes(&field);
        assert_eq!(out.len(), 20);
        assert_eq!(&out[..4], &[0x01, 0x00, 16, 0]);
        assert_eq!(&out[4..12], &5u64.to_le_bytes());
        assert_eq!(&out[12..20], &0x1_0000_0000u64.to_le_bytes());
    }

    #[test]
    fn test_zip64_central_form_lists_only_overflow() {
        assert!(Zip64ExtendedInfo::central(1, 2, 3, 0).is_none());
        assert!(Zip64ExtendedInfo::central(0xFFFF_FFFF, 0xFFFF_FFFF, 0xFFFF_FFFF, 0).is_none());

        let info = Zip64ExtendedInfo::central(10, 20, 0x2_0000_0000, 0).unwrap();
        assert_eq!(info.size, None);
        assert_eq!(info.offset, Some(0x2_0000_0000));
        assert_eq!(bytes(&ExtraField::Zip64(info)).len(), 12);

        let info = Zip64ExtendedInfo::central(0x1_0000_0000, 5, 6, 0x1_0000).unwrap();
        assert_eq!(info.data_len(), 12);
    }

    #[test]
    fn test_zip64_parse_uses_mask_order() {
        let mut data = Vec::new();
        data.put_u64(0x1_0000_0001);
        data.put_u64(0x3_0000_0000);
        let wanted = Zip64Fields {
            compressed_size: true,
            offset: true,
            ..Default::default()
        };
        let info = Zip64ExtendedInfo::parse(&data, wanted);
        assert_eq!(info.size, None);
        assert_eq!(info.compressed_size, Some(0x1_0000_0001));
        assert_eq!(info.offset, Some(0x3_0000_0000));
    }

    #[test]
    fn test_zip64_mask_narrowing() {
        let both = Zip64Fields {
            size: true,
            compressed_size: true,
            ..Default::default()
        };
        assert_eq!(both.data_len(), 16);
        assert_eq!(both.narrow_to(16), Some(both));
        assert_eq!(both.narrow_to(24), Some(both));
        assert_eq!(both.narrow_to(0), Some(Zip64Fields::default()));
        assert_eq!(
            both.narrow_to(8),
            Some(Zip64Fields {
                compressed_size: true,
                ..Default::default()
            })
        );
        assert_eq!(both.narrow_to(4), None);

        let with_offset = Zip64Fields {
            offset: true,
            ..both
        };
        assert_eq!(
            with_offset.narrow_to(16),
            Some(Zip64Fields {
                compressed_size: true,
                offset: true,
                ..Default::default()
            })
        );
    }

    #[test]
    fn test_literal_sentinel_left_out_of_record() {
        // Size is exactly 0xFFFFFFFF, only the compressed size overflowed.
        let info = Zip64ExtendedInfo::central(0xFFFF_FFFF, 0x1_0000_000B, 0, 0).unwrap();
        let block = serialize_extra_fields(&[ExtraField::Zip64(info.clone())]);
        let wanted = Zip64Fields {
            size: true,
            compressed_size: true,
            ..Default::default()
        };
        assert_eq!(parse_extra_fields(&block, wanted), vec![ExtraField::Zip64(info)]);
    }

    #[test]
    fn test_zip64_parse_short_record() {
        let info = Zip64ExtendedInfo::parse(
            &7u64.to_le_bytes(),
            Zip64Fields {
                size: true,
                compressed_size: true,
                ..Default::default()
            },
        );
        assert_eq!(info.size, Some(7));
        assert_eq!(info.compressed_size, None);
    }

    #[test]
    fn test_ntfs_layout() {
        let times = NtfsTimes::from_unix(1_000, None, None);
        assert_eq!(times.atime, times.mtime);
        assert_eq!(times.ctime, times.mtime);
        assert_eq!(times.mtime, (1_000 + 11_644_473_600) * 10_000_000);

        let field = ExtraField::Ntfs(times);
        let out = bytes(&field);
        assert_eq!(out.len(), 36);
        assert_eq!(&out[..4], &[0x0a, 0x00, 32, 0]);
        assert_eq!(&out[8..12], &[1, 0, 24, 0]);
        let parsed = parse_extra_fields(&out, Zip64Fields::default());
        assert_eq!(parsed, vec![field]);
    }

    #[test]
    fn test_extended_timestamp_forms() {
        let local = ExtraField::ExtendedTimestamp(ExtendedTimestamp {
            flags: 7,
            mtime: Some(1),
            atime: Some(2),
            ctime: Some(3),
        });
        assert_eq!(local.data_len(), 13);
        let central = ExtraField::ExtendedTimestamp(ExtendedTimestamp {
            flags: 7,
            mtime: Some(1),
            atime: None,
            ctime: None,
        });
        assert_eq!(central.data_len(), 5);
        let parsed = parse_extra_fields(&bytes(&central), Zip64Fields::default());
        assert_eq!(parsed, vec![central]);
    }

    #[test]
    fn test_unicode_path_and_aex() {
        let upath = ExtraField::UnicodePath(UnicodePath {
            version: 1,
            name_crc32: 0xDEADBEEF,
            name: "日本".as_bytes().to_vec(),
        });
        assert_eq!(upath.data_len(), 5 + 6);
        let aex = ExtraField::Aex(AexInfo {
            vendor_version: 2,
            strength: 3,
            method: 8,
        });
        let mut block = bytes(&upath);
        let aex_bytes = bytes(&aex);
        assert_eq!(aex_bytes, [0x01, 0x99, 7, 0, 2, 0, b'A', b'E', 3, 8, 0]);
        block.extend_from_slice(&aex_bytes);

        let parsed = parse_extra_fields(&block, Zip64Fields::default());
        assert_eq!(parsed, vec![upath, aex]);
    }

    #[test]
    fn test_unix_fields() {
        let unix = ExtraField::Unix(UnixTimes {
            atime: 10,
            mtime: 20,
            uid: 32767,
            gid: 0,
        });
        assert_eq!(bytes(&unix).len(), 16);
        assert_eq!(ExtraField::UnixIds(None).byte_length(), 4);
        let ids = ExtraField::UnixIds(Some(UnixIds { uid: 65534, gid: 0 }));
        let parsed = parse_extra_fields(&bytes(&ids), Zip64Fields::default());
        assert_eq!(parsed, vec![ids]);
    }

    #[test]
    fn test_malformed_and_unknown_fields() {
        // AE-x field with wrong vendor id, then an unknown id.
        let block = [
            0x01, 0x99, 7, 0, 2, 0, b'X', b'Y', 3, 8, 0, //
            0x34, 0x12, 2, 0, 0xAA, 0xBB,
        ];
        let parsed = parse_extra_fields(&block, Zip64Fields::default());
        assert_eq!(parsed.len(), 2);
        assert!(matches!(parsed[0], ExtraField::Unknown { id: 0x9901, .. }));
        assert_eq!(
            parsed[1],
            ExtraField::Unknown {
                id: 0x1234,
                data: vec![0xAA, 0xBB]
            }
        );
        assert_eq!(serialize_extra_fields(&parsed), block);
    }

    #[test]
    fn test_truncated_record_stops_parsing() {
        let block = [0x55, 0x54, 20, 0, 1, 2, 3];
        assert!(parse_extra_fields(&block, Zip64Fields::default()).is_empty());
    }
}
