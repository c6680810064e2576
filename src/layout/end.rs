//! End of central directory records.

use std::io::Write;

use crate::Result;
use crate::format::records::{
    EndOfCentralDirectory, Zip64EndLocator, Zip64EndOfCentralDirectory, write_record,
};
use crate::format::{clamp_u16, clamp_u32, version};

/// Totals describing the central directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CentralDirectorySummary {
    /// Number of entries.
    pub entries: u64,
    /// Byte size of the central directory.
    pub size: u64,
    /// Offset where the central directory starts.
    pub offset: u64,
}

/// Classic end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndRecord {
    summary: CentralDirectorySummary,
    comment: Vec<u8>,
    offset: u64,
}

impl EndRecord {
    /// Creates the record; values that overflow are clamped to sentinels.
    pub fn new(summary: CentralDirectorySummary, comment: Vec<u8>) -> Self {
        Self {
            summary,
            comment,
            offset: 0,
        }
    }

    /// Offset of this record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stamps the record offset.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Builds the on-disk record.
    pub fn record(&self) -> EndOfCentralDirectory {
        let count = clamp_u16(self.summary.entries);
        EndOfCentralDirectory {
            disk_number: 0,
            central_directory_disk: 0,
            disk_entries: count,
            total_entries: count,
            central_directory_size: clamp_u32(self.summary.size),
            central_directory_offset: clamp_u32(self.summary.offset),
            comment: self.comment.clone(),
        }
    }

    /// Serialized length.
    pub fn byte_length(&self) -> u64 {
        (EndOfCentralDirectory::FIXED_LEN + self.comment.len()) as u64
    }

    /// Writes the record.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<u64> {
        write_record(sink, &self.record().to_bytes()?)
    }
}

/// ZIP64 end of central directory record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Zip64EndRecord {
    summary: CentralDirectorySummary,
    offset: u64,
}

impl Zip64EndRecord {
    /// Creates the record.
    pub fn new(summary: CentralDirectorySummary) -> Self {
        Self { summary, offset: 0 }
    }

    /// Offset of this record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stamps the record offset.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Builds the on-disk record.
    pub fn record(&self) -> Zip64EndOfCentralDirectory {
        Zip64EndOfCentralDirectory {
            version_made_by: version::ZIP64,
            version_needed: version::ZIP64,
            disk_number: 0,
            central_directory_disk: 0,
            disk_entries: self.summary.entries,
            total_entries: self.summary.entries,
            central_directory_size: self.summary.size,
            central_directory_offset: self.summary.offset,
            extensible_data: Vec::new(),
        }
    }

    /// Serialized length.
    pub fn byte_length(&self) -> u64 {
        Zip64EndOfCentralDirectory::FIXED_LEN as u64
    }

    /// Writes the record.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<u64> {
        write_record(sink, &self.record().to_bytes())
    }
}

/// ZIP64 end of central directory locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Zip64Locator {
    end_record_offset: u64,
    offset: u64,
}

impl Zip64Locator {
    /// Points at the ZIP64 end record written at `end_record_offset`.
    pub fn new(end_record_offset: u64) -> Self {
        Self {
            end_record_offset,
            offset: 0,
        }
    }

    /// Offset of this record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stamps the record offset.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Builds the on-disk locator.
    pub fn record(&self) -> Zip64EndLocator {
        Zip64EndLocator {
            end_record_disk: 0,
            end_record_offset: self.end_record_offset,
            total_disks: 1,
        }
    }

    /// Serialized length.
    pub fn byte_length(&self) -> u64 {
        Zip64EndLocator::LEN as u64
    }

    /// Writes the locator.
    pub fn write_to(&self, sink: &mut dyn Write) -> Result<u64> {
        write_record(sink, &self.record().to_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_end_record_clamps() {
        let summary = CentralDirectorySummary {
            entries: 70_000,
            size: 0x1_0000_0000,
            offset: 12,
        };
        let record = EndRecord::new(summary, b"hi".to_vec()).record();
        assert_eq!(record.total_entries, 0xFFFF);
        assert_eq!(record.disk_entries, 0xFFFF);
        assert_eq!(record.central_directory_size, 0xFFFF_FFFF);
        assert_eq!(record.central_directory_offset, 12);
        assert_eq!(record.disk_number, 0);
    }

    #[test]
    fn test_lengths() {
        let summary = CentralDirectorySummary::default();
        assert_eq!(EndRecord::new(summary, b"abc".to_vec()).byte_length(), 25);
        assert_eq!(Zip64EndRecord::new(summary).byte_length(), 56);
        assert_eq!(Zip64Locator::new(0).byte_length(), 20);
    }

    #[test]
    fn test_zip64_record_values() {
        let summary = CentralDirectorySummary {
            entries: 65_536,
            size: 5,
            offset: 0x1_2345_6789,
        };
        let mut out = Vec::new();
        Zip64EndRecord::new(summary).write_to(&mut out).unwrap();
        let parsed = Zip64EndOfCentralDirectory::read_from(&mut &out[..], 0).unwrap();
        assert_eq!(parsed.total_entries, 65_536);
        assert_eq!(parsed.central_directory_offset, 0x1_2345_6789);
        assert_eq!(parsed.version_needed, 45);

        let locator = Zip64Locator::new(777).record();
        assert_eq!(locator.total_disks, 1);
        assert_eq!(locator.end_record_offset, 777);
    }
}
