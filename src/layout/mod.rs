//! Archive layout model.
//!
//! An archive is a fixed sequence of records: every entry, then one
//! central directory record per entry, then the end records. Each record
//! implements [`LayoutRecord`]: it has a byte length, an offset, and can
//! write itself. [`Record`] is the closed set of record kinds.
//!
//! Whether the ZIP64 end record and locator are needed is decided once per
//! archive by [`zip64_end_required`], after every entry size is known.

mod central;
mod end;
mod entry;

use std::io::Write;

pub use central::CentralDirectoryRecord;
pub use end::{CentralDirectorySummary, EndRecord, Zip64EndRecord, Zip64Locator};
pub use entry::{EntryConfig, EntryData, EntrySizes, EntryTimes, FileEntry};

use crate::Result;
use crate::format::{U16_LIMIT, U32_LIMIT};

/// Common contract of everything the writer emits.
pub trait LayoutRecord {
    /// Serialized length. Entries may finalize their sizes here.
    fn byte_length(&mut self) -> Result<u64>;

    /// Offset within the archive.
    fn offset(&self) -> u64;

    /// Stamps the offset within the archive.
    fn set_offset(&mut self, offset: u64);

    /// Writes the record, returning the number of bytes written.
    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64>;
}

impl LayoutRecord for FileEntry {
    fn byte_length(&mut self) -> Result<u64> {
        FileEntry::byte_length(self)
    }

    fn offset(&self) -> u64 {
        FileEntry::offset(self)
    }

    fn set_offset(&mut self, offset: u64) {
        FileEntry::set_offset(self, offset)
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
        FileEntry::write_to(self, sink)
    }
}

macro_rules! plain_record {
    ($($ty:ty),*) => {$(
        impl LayoutRecord for $ty {
            fn byte_length(&mut self) -> Result<u64> {
                Ok(<$ty>::byte_length(self))
            }

            fn offset(&self) -> u64 {
                <$ty>::offset(self)
            }

            fn set_offset(&mut self, offset: u64) {
                <$ty>::set_offset(self, offset)
            }

            fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
                <$ty>::write_to(self, sink)
            }
        }
    )*};
}

plain_record!(Zip64EndRecord, Zip64Locator, EndRecord);

impl LayoutRecord for CentralDirectoryRecord {
    fn byte_length(&mut self) -> Result<u64> {
        CentralDirectoryRecord::byte_length(self)
    }

    fn offset(&self) -> u64 {
        CentralDirectoryRecord::offset(self)
    }

    fn set_offset(&mut self, offset: u64) {
        CentralDirectoryRecord::set_offset(self, offset)
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
        CentralDirectoryRecord::write_to(self, sink)
    }
}

/// One record of the archive, as yielded by the writer's sequence.
#[derive(Debug)]
pub enum Record<'e> {
    /// A local header with payload, borrowed from the writer.
    Entry(&'e mut FileEntry),
    /// A central directory record.
    Central(CentralDirectoryRecord),
    /// The ZIP64 end of central directory record.
    Zip64End(Zip64EndRecord),
    /// The ZIP64 end of central directory locator.
    Zip64Locator(Zip64Locator),
    /// The classic end of central directory record.
    End(EndRecord),
}

impl Record<'_> {
    /// Short name used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Entry(_) => "entry",
            Self::Central(_) => "central directory record",
            Self::Zip64End(_) => "ZIP64 end record",
            Self::Zip64Locator(_) => "ZIP64 locator",
            Self::End(_) => "end record",
        }
    }

    fn inner(&mut self) -> &mut dyn LayoutRecord {
        match self {
            Self::Entry(e) => &mut **e,
            Self::Central(r) => r,
            Self::Zip64End(r) => r,
            Self::Zip64Locator(r) => r,
            Self::End(r) => r,
        }
    }
}

impl LayoutRecord for Record<'_> {
    fn byte_length(&mut self) -> Result<u64> {
        self.inner().byte_length()
    }

    fn offset(&self) -> u64 {
        match self {
            Self::Entry(e) => e.offset(),
            Self::Central(r) => r.offset(),
            Self::Zip64End(r) => r.offset(),
            Self::Zip64Locator(r) => r.offset(),
            Self::End(r) => r.offset(),
        }
    }

    fn set_offset(&mut self, offset: u64) {
        self.inner().set_offset(offset)
    }

    fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
        self.inner().write_to(sink)
    }
}

/// Whether the ZIP64 end record and locator must be written.
///
/// Required when the entry count does not fit 16 bits, or the central
/// directory's start or size does not fit 32 bits. Values exactly at the
/// limit still fit.
pub fn zip64_end_required(entries: u64, cd_start: u64, cd_size: u64) -> bool {
    entries > U16_LIMIT || cd_start > U32_LIMIT || cd_size > U32_LIMIT
}
