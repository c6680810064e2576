//! Central directory records mirrored from written entries.

use std::io::Write;

use crate::Result;
use crate::format::extra_field::{ExtraField, Zip64ExtendedInfo, extra_fields_len, serialize_extra_fields};
use crate::format::records::{CentralDirectoryHeader, write_record};
use crate::format::{U32_LIMIT, clamp_u32, length_u16, version};

use super::entry::{EntrySizes, FileEntry};

/// MS-DOS directory attribute bit.
const DOS_DIRECTORY: u32 = 0x10;
/// MS-DOS archive attribute bit.
const DOS_ARCHIVE: u32 = 0x20;
const UNIX_FILE_MODE: u32 = 0o100644;
const UNIX_DIR_MODE: u32 = 0o040755;
const CENTRAL_HEADER: &str = "central directory header";

/// The central directory record of one entry.
///
/// Built from a finalized [`FileEntry`]; it carries its own extra-field
/// list, which differs from the local one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralDirectoryRecord {
    name: Vec<u8>,
    flags: u16,
    method: u16,
    version_needed_base: u16,
    unix_host: bool,
    is_directory: bool,
    dos_time: u16,
    dos_date: u16,
    crc32: u32,
    sizes: EntrySizes,
    local_header_offset: u64,
    comment: Vec<u8>,
    extra_fields: Vec<ExtraField>,
    offset: u64,
}

impl CentralDirectoryRecord {
    /// Mirrors a finalized entry.
    pub fn from_entry(entry: &FileEntry, sizes: EntrySizes) -> Self {
        let dos = entry.dos_time();
        Self {
            name: entry.name_bytes().to_vec(),
            flags: entry.flags(),
            method: entry.header_method(),
            version_needed_base: entry.version_needed(false, &[]),
            unix_host: false,
            is_directory: entry.is_directory(),
            dos_time: dos.time,
            dos_date: dos.date,
            crc32: entry.recorded_crc(&sizes),
            sizes,
            local_header_offset: entry.offset(),
            comment: entry.comment().to_vec(),
            extra_fields: Vec::new(),
            offset: 0,
        }
    }

    /// Offset of this record within the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stamps the record offset.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Offset of the entry's local header.
    pub fn local_header_offset(&self) -> u64 {
        self.local_header_offset
    }

    /// Injected extra fields.
    pub fn extra_fields(&self) -> &[ExtraField] {
        &self.extra_fields
    }

    /// Removes all injected extra fields.
    pub fn clear_extra_fields(&mut self) {
        self.extra_fields.clear();
        self.unix_host = false;
    }

    /// Appends an extra field.
    pub fn push_extra_field(&mut self, field: ExtraField) {
        self.extra_fields.push(field);
    }

    /// Marks the record as made on a Unix host.
    pub fn set_unix_host(&mut self) {
        self.unix_host = true;
    }

    /// Whether the record needs ZIP64 treatment: the entry's sizes, or its
    /// offset, overflow.
    pub fn is_zip64(&self) -> bool {
        self.sizes.needs_zip64() || self.local_header_offset > U32_LIMIT
    }

    fn zip64_field(&self) -> Option<ExtraField> {
        Zip64ExtendedInfo::central(
            self.sizes.size,
            self.sizes.compressed_size,
            self.local_header_offset,
            0,
        )
        .map(ExtraField::Zip64)
    }

    fn all_extra_fields(&self) -> Vec<ExtraField> {
        self.zip64_field()
            .into_iter()
            .chain(self.extra_fields.iter().cloned())
            .collect()
    }

    fn version_made_by(&self) -> u16 {
        if self.unix_host {
            version::MADE_BY | version::MADE_BY_UNIX
        } else {
            version::MADE_BY
        }
    }

    fn version_needed(&self) -> u16 {
        let has_unicode_path = self
            .extra_fields
            .iter()
            .any(|f| matches!(f, ExtraField::UnicodePath(_)));
        let mut needed = self.version_needed_base;
        if has_unicode_path {
            needed = needed.max(version::DEFLATE);
        }
        if self.is_zip64() {
            needed = needed.max(version::ZIP64);
        }
        needed
    }

    fn external_attributes(&self) -> u32 {
        let dos = if self.is_directory { DOS_DIRECTORY } else { DOS_ARCHIVE };
        if self.unix_host {
            let mode = if self.is_directory { UNIX_DIR_MODE } else { UNIX_FILE_MODE };
            (mode << 16) | dos
        } else {
            dos
        }
    }

    /// Builds the on-disk header.
    pub fn header(&self) -> CentralDirectoryHeader {
        CentralDirectoryHeader {
            version_made_by: self.version_made_by(),
            version_needed: self.version_needed(),
            flags: self.flags,
            method: self.method,
            last_mod_time: self.dos_time,
            last_mod_date: self.dos_date,
            crc32: self.crc32,
            compressed_size: clamp_u32(self.sizes.compressed_size),
            uncompressed_size: clamp_u32(self.sizes.size),
            disk_start: 0,
            internal_attributes: 0,
            external_attributes: self.external_attributes(),
            local_header_offset: clamp_u32(self.local_header_offset),
            file_name: self.name.clone(),
            extra_field: serialize_extra_fields(&self.all_extra_fields()),
            comment: self.comment.clone(),
        }
    }

    /// Serialized length.
    ///
    /// Fails if the name, extra field block or comment does not fit its
    /// 16-bit length field.
    pub fn byte_length(&self) -> Result<u64> {
        let extra_len = extra_fields_len(&self.all_extra_fields());
        length_u16(self.name.len(), CENTRAL_HEADER, "file name")?;
        length_u16(extra_len, CENTRAL_HEADER, "extra field")?;
        length_u16(self.comment.len(), CENTRAL_HEADER, "comment")?;
        Ok((CentralDirectoryHeader::FIXED_LEN + self.name.len() + extra_len + self.comment.len()) as u64)
    }

    /// Writes the record.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<u64> {
        write_record(sink, &self.header().to_bytes()?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive_path::ArchivePath;
    use crate::format::U32_SENTINEL;
    use crate::format::extra_field::{Zip64Fields, parse_extra_fields};
    use crate::layout::entry::{EntryConfig, EntryData, EntryTimes};

    fn record(sizes: EntrySizes, offset: u64) -> CentralDirectoryRecord {
        let mut entry = FileEntry::new(
            ArchivePath::new("file.bin").unwrap(),
            EntryData::Bytes(Vec::new()),
            EntryTimes::modified(1_600_000_000),
            EntryConfig::default(),
        );
        entry.set_offset(offset);
        CentralDirectoryRecord::from_entry(&entry, sizes)
    }

    #[test]
    fn test_small_record() {
        let sizes = EntrySizes {
            size: 10,
            compressed_size: 10,
            crc32: 0xABCD,
        };
        let rec = record(sizes, 100);
        let header = rec.header();
        assert_eq!(header.compressed_size, 10);
        assert_eq!(header.local_header_offset, 100);
        assert_eq!(header.version_needed, 10);
        assert_eq!(header.version_made_by, 0x003F);
        assert!(header.extra_field.is_empty());
        assert_eq!(rec.byte_length().unwrap(), 46 + 8);
        assert_eq!(header.to_bytes().unwrap().len() as u64, rec.byte_length().unwrap());
    }

    #[test]
    fn test_only_overflowing_fields_promoted() {
        let sizes = EntrySizes {
            size: 0xFFFF_FFFF,
            compressed_size: 0x1_0000_0005,
            crc32: 1,
        };
        let rec = record(sizes, 0x2_0000_0000);
        assert!(rec.is_zip64());
        let header = rec.header();
        assert_eq!(header.uncompressed_size, 0xFFFF_FFFF);
        assert_eq!(header.compressed_size, U32_SENTINEL);
        assert_eq!(header.local_header_offset, U32_SENTINEL);
        assert_eq!(header.version_needed, 45);
        // compressed size and offset only
        assert_eq!(header.extra_field.len(), 4 + 16);
        let mask = Zip64Fields {
            compressed_size: true,
            offset: true,
            ..Default::default()
        };
        let parsed = parse_extra_fields(&header.extra_field, mask);
        assert_eq!(
            parsed,
            vec![ExtraField::Zip64(Zip64ExtendedInfo {
                size: None,
                compressed_size: Some(0x1_0000_0005),
                offset: Some(0x2_0000_0000),
                disk_start: None,
            })]
        );
    }

    #[test]
    fn test_offset_alone_makes_zip64() {
        let rec = record(EntrySizes::default(), 0x1_0000_0000);
        assert!(rec.is_zip64());
        assert_eq!(rec.header().extra_field.len(), 12);
    }

    #[test]
    fn test_unix_host_bits() {
        let mut rec = record(EntrySizes::default(), 0);
        rec.set_unix_host();
        let header = rec.header();
        assert_eq!(header.version_made_by, 0x033F);
        assert_eq!(header.external_attributes >> 16, 0o100644);
        rec.clear_extra_fields();
        assert_eq!(rec.header().version_made_by, 0x003F);
    }
}
