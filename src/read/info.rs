//! Structural report of a parsed archive.

use crate::Error;
use crate::crypto::AesStrength;
use crate::format::extra_field::{AexInfo, ExtraField};
use crate::format::records::{
    CentralDirectoryHeader, DataDescriptor, EndOfCentralDirectory, LocalFileHeader,
    Zip64EndLocator, Zip64EndOfCentralDirectory,
};
use crate::format::{flags, method};
use crate::timestamp::DosDateTime;

/// The located end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EocdInfo {
    /// Offset of the record.
    pub offset: u64,
    /// The record as read, comment included.
    pub record: EndOfCentralDirectory,
    /// Whether the declared comment length reaches exactly the end of the
    /// input. `false` means the record was accepted as the last signature
    /// match without structural confirmation.
    pub confirmed: bool,
}

impl EocdInfo {
    /// Whether any field holds an overflow sentinel.
    pub fn has_sentinel(&self) -> bool {
        let r = &self.record;
        r.disk_number == u16::MAX
            || r.central_directory_disk == u16::MAX
            || r.disk_entries == u16::MAX
            || r.total_entries == u16::MAX
            || r.central_directory_size == u32::MAX
            || r.central_directory_offset == u32::MAX
    }
}

/// ZIP64 end structures, when present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64Info {
    /// Offset of the locator.
    pub locator_offset: u64,
    /// The locator.
    pub locator: Zip64EndLocator,
    /// The ZIP64 end record it points at.
    pub record: Zip64EndOfCentralDirectory,
}

/// One central directory record with ZIP64 values resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CentralEntryInfo {
    /// Position in the central directory.
    pub index: usize,
    /// Offset of the record.
    pub offset: u64,
    /// The raw header.
    pub header: CentralDirectoryHeader,
    /// Decoded name.
    pub name: String,
    /// Uncompressed size.
    pub size: u64,
    /// Stored payload size.
    pub compressed_size: u64,
    /// Offset of the local header.
    pub local_header_offset: u64,
    /// Disk of the local header.
    pub disk_start: u32,
    /// Parsed extra fields.
    pub extra_fields: Vec<ExtraField>,
}

impl CentralEntryInfo {
    /// Whether the encrypted flag is set.
    pub fn is_encrypted(&self) -> bool {
        self.header.flags & flags::ENCRYPTED != 0
    }

    /// Entry comment bytes.
    pub fn comment(&self) -> &[u8] {
        &self.header.comment
    }
}

/// One local entry with its sizes and CRC resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalEntryInfo {
    /// Position in the central directory.
    pub index: usize,
    /// Offset of the local header.
    pub offset: u64,
    /// The raw header.
    pub header: LocalFileHeader,
    /// Decoded name.
    pub name: String,
    /// Parsed extra fields.
    pub extra_fields: Vec<ExtraField>,
    /// The 12-byte ZipCrypto header, or AE-x salt and verifier.
    pub encryption_header: Option<Vec<u8>>,
    /// Offset of the first payload byte.
    pub data_offset: u64,
    /// Uncompressed size.
    pub size: u64,
    /// Stored payload size, including encryption overhead.
    pub compressed_size: u64,
    /// CRC-32 as recorded (0 for AE-2 entries).
    pub crc32: u32,
    /// The trailer, for entries with flag bit 3.
    pub data_descriptor: Option<DataDescriptor>,
}

impl LocalEntryInfo {
    /// Whether the name denotes a directory.
    pub fn is_directory(&self) -> bool {
        self.name.ends_with('/')
    }

    /// Whether the encrypted flag is set.
    pub fn is_encrypted(&self) -> bool {
        self.header.flags & flags::ENCRYPTED != 0
    }

    /// Whether flag bit 3 is set.
    pub fn uses_data_descriptor(&self) -> bool {
        self.header.flags & flags::DATA_DESCRIPTOR != 0
    }

    /// AE-x parameters from the extra field.
    pub fn aex_info(&self) -> Option<AexInfo> {
        self.extra_fields.iter().find_map(|f| match f {
            ExtraField::Aex(info) => Some(*info),
            _ => None,
        })
    }

    /// Whether the payload uses AE-x.
    pub fn is_aex(&self) -> bool {
        self.header.method == method::AEX
    }

    /// AE-x key strength, if the entry uses AE-x with a known code.
    pub fn aes_strength(&self) -> Option<AesStrength> {
        self.aex_info().and_then(|info| AesStrength::from_code(info.strength))
    }

    /// The compression method of the plaintext, looking through AE-x.
    pub fn compression_method(&self) -> u16 {
        match self.aex_info() {
            Some(info) if self.is_aex() => info.method,
            _ => self.header.method,
        }
    }

    /// Whether the recorded CRC is meaningful: AE-2 stores zero.
    pub fn has_crc(&self) -> bool {
        !(self.is_aex() && self.aex_info().is_none_or(|info| info.vendor_version == 2))
    }

    /// Modification time from the DOS fields, as Unix seconds.
    pub fn modified(&self) -> i64 {
        DosDateTime {
            date: self.header.last_mod_date,
            time: self.header.last_mod_time,
        }
        .to_unix_secs()
    }
}

/// Everything learned from parsing an archive.
#[derive(Debug, Default)]
pub struct ParseReport {
    /// Length of the input.
    pub file_size: u64,
    /// The end of central directory record.
    pub eocd: Option<EocdInfo>,
    /// ZIP64 end structures.
    pub zip64: Option<Zip64Info>,
    /// Central directory records in order.
    pub central: Vec<CentralEntryInfo>,
    /// Local entries, one per central record.
    pub entries: Vec<LocalEntryInfo>,
    /// Integrity failures found while verifying payloads.
    pub errors: Vec<Error>,
}

impl ParseReport {
    /// Whether no integrity error was recorded.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Archive comment bytes.
    pub fn comment(&self) -> &[u8] {
        self.eocd.as_ref().map_or(&[][..], |e| e.record.comment.as_slice())
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Finds an entry by decoded name.
    pub fn find(&self, name: &str) -> Option<&LocalEntryInfo> {
        self.entries.iter().find(|e| e.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn local(method: u16, extra_fields: Vec<ExtraField>) -> LocalEntryInfo {
        LocalEntryInfo {
            index: 0,
            offset: 0,
            header: LocalFileHeader {
                method,
                ..Default::default()
            },
            name: "a".into(),
            extra_fields,
            encryption_header: None,
            data_offset: 31,
            size: 0,
            compressed_size: 0,
            crc32: 0,
            data_descriptor: None,
        }
    }

    #[test]
    fn test_aex_method_resolution() {
        let info = AexInfo {
            vendor_version: 2,
            strength: 3,
            method: 8,
        };
        let entry = local(99, vec![ExtraField::Aex(info)]);
        assert!(entry.is_aex());
        assert_eq!(entry.compression_method(), 8);
        assert_eq!(entry.aes_strength(), Some(AesStrength::Aes256));
        assert!(!entry.has_crc());

        let ae1 = local(99, vec![ExtraField::Aex(AexInfo { vendor_version: 1, ..info })]);
        assert!(ae1.has_crc());
        assert!(local(8, Vec::new()).has_crc());
    }

    #[test]
    fn test_eocd_sentinels() {
        let mut eocd = EocdInfo {
            offset: 0,
            record: EndOfCentralDirectory::default(),
            confirmed: true,
        };
        assert!(!eocd.has_sentinel());
        eocd.record.central_directory_offset = u32::MAX;
        assert!(eocd.has_sentinel());
    }

    #[test]
    fn test_report_defaults() {
        let report = ParseReport::default();
        assert!(report.is_valid());
        assert!(report.is_empty());
        assert!(report.comment().is_empty());
        assert!(report.find("x").is_none());
    }
}
