//! Lazy sequence of records forming an archive.
//!
//! For `n` entries the positions are:
//!
//! | position | record |
//! |---|---|
//! | `0..n` | file entries |
//! | `n..2n` | central directory records |
//! | `2n` | ZIP64 end record |
//! | `2n + 1` | ZIP64 locator |
//! | `2n + 2` | end record |
//!
//! The sequence tracks the running offset. Reaching `n` fixes where the
//! central directory starts; reaching `2n` fixes its size and decides,
//! once, whether the two ZIP64 positions are skipped.

use log::{debug, trace};

use crate::Result;
use crate::format::records::Zip64EndLocator;
use crate::layout::{
    CentralDirectoryRecord, CentralDirectorySummary, EndRecord, FileEntry, Record, Zip64EndRecord,
    Zip64Locator, zip64_end_required,
};

use super::fields::{FieldBuilder, inject_central, inject_local};

/// Restartable walk over the records of an archive.
#[derive(Debug)]
pub struct RecordSequence<'a> {
    entries: &'a mut [FileEntry],
    builders: &'a [FieldBuilder],
    comment: &'a [u8],
    position: usize,
    offset: u64,
    cd_start: u64,
    cd_size: u64,
    zip64_end: Option<u64>,
}

impl<'a> RecordSequence<'a> {
    /// Starts a sequence over `entries`.
    pub fn new(entries: &'a mut [FileEntry], builders: &'a [FieldBuilder], comment: &'a [u8]) -> Self {
        let mut seq = Self {
            entries,
            builders,
            comment,
            position: 0,
            offset: 0,
            cd_start: 0,
            cd_size: 0,
            zip64_end: None,
        };
        seq.settle();
        seq
    }

    /// Returns to the first record.
    pub fn rewind(&mut self) {
        self.position = 0;
        self.offset = 0;
        self.cd_start = 0;
        self.cd_size = 0;
        self.zip64_end = None;
        self.settle();
    }

    /// Current position.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Offset of the current record, or the archive length once exhausted.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Whether the ZIP64 end records are part of the archive. Known once
    /// the sequence has passed the central directory.
    pub fn uses_zip64_end(&self) -> Option<bool> {
        (self.position >= self.end_start()).then_some(self.zip64_end.is_some())
    }

    fn entry_count(&self) -> usize {
        self.entries.len()
    }

    fn end_start(&self) -> usize {
        2 * self.entry_count()
    }

    /// Whether all records have been yielded.
    pub fn is_done(&self) -> bool {
        self.position > self.end_start() + 2
    }

    fn summary(&self) -> CentralDirectorySummary {
        CentralDirectorySummary {
            entries: self.entry_count() as u64,
            size: self.cd_size,
            offset: self.cd_start,
        }
    }

    fn prepare_entry(&mut self, index: usize) {
        let entry = &mut self.entries[index];
        entry.set_offset(self.offset);
        inject_local(self.builders, entry);
    }

    fn central_record(&mut self, index: usize) -> Result<CentralDirectoryRecord> {
        let entry = &mut self.entries[index];
        let sizes = entry.finalize()?;
        let mut record = CentralDirectoryRecord::from_entry(entry, sizes);
        inject_central(self.builders, entry, &mut record);
        record.set_offset(self.offset);
        Ok(record)
    }

    /// Applies the boundary decisions for the current position.
    fn settle(&mut self) {
        let n = self.entry_count();
        if self.position == n {
            self.cd_start = self.offset;
        }
        if self.position == 2 * n {
            self.cd_size = self.offset - self.cd_start;
            let required = zip64_end_required(n as u64, self.cd_start, self.cd_size);
            debug!(
                "central directory: {} entries, {} bytes at {}, zip64 end {}",
                n,
                self.cd_size,
                self.cd_start,
                if required { "required" } else { "skipped" }
            );
            if required {
                self.zip64_end = Some(self.offset);
            } else {
                self.zip64_end = None;
                self.position += 2;
            }
        }
    }

    /// Materializes the record at the current position, stamped with its
    /// offset and carrying its extra fields. `None` once exhausted.
    pub fn current(&mut self) -> Result<Option<Record<'_>>> {
        let n = self.entry_count();
        let end = self.end_start();
        let position = self.position;
        let record = if position < n {
            self.prepare_entry(position);
            Record::Entry(&mut self.entries[position])
        } else if position < end {
            Record::Central(self.central_record(position - n)?)
        } else if position == end {
            let mut record = Zip64EndRecord::new(self.summary());
            record.set_offset(self.offset);
            Record::Zip64End(record)
        } else if position == end + 1 {
            let mut record = Zip64Locator::new(self.zip64_end.unwrap_or_default());
            record.set_offset(self.offset);
            Record::Zip64Locator(record)
        } else if position == end + 2 {
            let mut record = EndRecord::new(self.summary(), self.comment.to_vec());
            record.set_offset(self.offset);
            Record::End(record)
        } else {
            return Ok(None);
        };
        trace!("record {} ({}) at offset {}", position, record.kind(), self.offset);
        Ok(Some(record))
    }

    /// Moves past the current record, adding its length to the offset.
    pub fn advance(&mut self) -> Result<()> {
        let n = self.entry_count();
        let end = self.end_start();
        let position = self.position;
        let len = if position < n {
            self.prepare_entry(position);
            self.entries[position].byte_length()?
        } else if position < end {
            self.central_record(position - n)?.byte_length()?
        } else if position == end {
            Zip64EndRecord::new(self.summary()).byte_length()
        } else if position == end + 1 {
            Zip64EndLocator::LEN as u64
        } else if position == end + 2 {
            EndRecord::new(self.summary(), self.comment.to_vec()).byte_length()
        } else {
            return Ok(());
        };
        self.offset += len;
        self.position += 1;
        self.settle();
        Ok(())
    }

    /// Walks the remaining records without writing, returning the final
    /// archive length.
    pub fn measure(&mut self) -> Result<u64> {
        while !self.is_done() {
            self.advance()?;
        }
        Ok(self.offset)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive_path::ArchivePath;
    use crate::layout::{EntryConfig, EntryData, EntrySizes, EntryTimes, LayoutRecord};

    fn entry(name: &str, data: &[u8]) -> FileEntry {
        FileEntry::new(
            ArchivePath::new(name).unwrap(),
            EntryData::Bytes(data.to_vec()),
            EntryTimes::modified(1_700_000_000),
            EntryConfig::default(),
        )
    }

    fn kinds(seq: &mut RecordSequence<'_>) -> Vec<&'static str> {
        let mut kinds = Vec::new();
        loop {
            let kind = match seq.current().unwrap() {
                Some(record) => record.kind(),
                None => break,
            };
            kinds.push(kind);
            seq.advance().unwrap();
        }
        kinds
    }

    #[test]
    fn test_empty_archive() {
        let mut entries: Vec<FileEntry> = Vec::new();
        let mut seq = RecordSequence::new(&mut entries, &[], b"");
        assert_eq!(seq.position(), 2);
        assert_eq!(seq.uses_zip64_end(), Some(false));
        assert_eq!(kinds(&mut seq), vec!["end record"]);
        assert_eq!(seq.offset(), 22);
    }

    #[test]
    fn test_small_archive_skips_zip64() {
        let mut entries = vec![entry("a", b"abc"), entry("b", b"")];
        let mut seq = RecordSequence::new(&mut entries, &[], b"");
        assert_eq!(
            kinds(&mut seq),
            vec![
                "entry",
                "entry",
                "central directory record",
                "central directory record",
                "end record"
            ]
        );
        let entries_len = (30 + 1 + 3) + (30 + 1);
        let cd_len = 2 * (46 + 1);
        assert_eq!(seq.offset(), (entries_len + cd_len + 22) as u64);
    }

    #[test]
    fn test_offsets_are_stamped() {
        let mut entries = vec![entry("a", b"abc"), entry("b", b"xy")];
        let mut seq = RecordSequence::new(&mut entries, &[], b"");
        seq.advance().unwrap();
        {
            let record = seq.current().unwrap().unwrap();
            assert_eq!(record.offset(), 34);
        }
        seq.advance().unwrap();
        let Some(Record::Central(central)) = seq.current().unwrap() else {
            panic!("expected central record");
        };
        assert_eq!(central.offset(), 34 + 33);
        assert_eq!(central.local_header_offset(), 0);
    }

    #[test]
    fn test_rewind_restarts() {
        let mut entries = vec![entry("a", b"abc")];
        let mut seq = RecordSequence::new(&mut entries, &[], b"note");
        let first = seq.measure().unwrap();
        assert!(seq.is_done());
        seq.rewind();
        assert_eq!(seq.position(), 0);
        assert_eq!(seq.measure().unwrap(), first);
        assert_eq!(first, 34 + 47 + 26);
    }

    #[test]
    fn test_entry_count_threshold() {
        let empty = |name: String| {
            FileEntry::new(
                ArchivePath::new(&name).unwrap(),
                EntryData::Empty,
                EntryTimes::modified(0),
                EntryConfig::default(),
            )
        };
        let mut entries: Vec<FileEntry> = (0..65_535).map(|i| empty(format!("f{i}"))).collect();
        let mut seq = RecordSequence::new(&mut entries, &[], b"");
        seq.measure().unwrap();
        assert_eq!(seq.uses_zip64_end(), Some(false));

        entries.push(empty("last".to_string()));
        let mut seq = RecordSequence::new(&mut entries, &[], b"");
        seq.measure().unwrap();
        assert_eq!(seq.uses_zip64_end(), Some(true));
    }

    #[test]
    fn test_large_offsets_promote_central_records() {
        let big = EntrySizes {
            size: 0x1_0000_0000,
            compressed_size: 0x1_0000_0000,
            crc32: 7,
        };
        let mut first = entry("big.bin", b"");
        first.apply_precomputed(big).unwrap();
        let mut entries = vec![first, entry("after", b"z")];
        let mut seq = RecordSequence::new(&mut entries, &[], b"");

        let first_len = 30 + 7 + 20 + 0x1_0000_0000u64;
        seq.advance().unwrap();
        assert_eq!(seq.offset(), first_len);
        seq.advance().unwrap();
        seq.advance().unwrap();
        let Some(Record::Central(second)) = seq.current().unwrap() else {
            panic!("expected central record");
        };
        assert_eq!(second.local_header_offset(), first_len);
        assert!(second.is_zip64());
        seq.measure().unwrap();
        assert_eq!(seq.uses_zip64_end(), Some(true));
    }

    #[test]
    fn test_zip64_end_points_at_itself() {
        let mut big = entry("big.bin", b"");
        big.apply_precomputed(EntrySizes {
            size: 0x1_0000_0000,
            compressed_size: 0x1_0000_0000,
            crc32: 0,
        })
        .unwrap();
        let mut entries = vec![big];
        let mut seq = RecordSequence::new(&mut entries, &[], b"");
        seq.advance().unwrap();
        seq.advance().unwrap();
        let zip64_offset = seq.offset();
        let Some(Record::Zip64End(_)) = seq.current().unwrap() else {
            panic!("expected ZIP64 end record");
        };
        seq.advance().unwrap();
        let Some(Record::Zip64Locator(locator)) = seq.current().unwrap() else {
            panic!("expected locator");
        };
        assert_eq!(locator.record().end_record_offset, zip64_offset);
    }
}
