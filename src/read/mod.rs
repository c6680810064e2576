//! Archive parsing and validation.
//!
//! Parsing follows the structure from the end: the end of central
//! directory record is located by a backward scan, the optional ZIP64 end
//! record through its locator, then every central directory record and the
//! local entry it points at. The result is a [`ParseReport`].
//!
//! Structural damage (a missing end record, a signature mismatch, a header
//! cut short) aborts parsing. Payload integrity is only checked on request:
//! with [`ParseOptions::verify_crc`] every entry is decoded and failures are
//! collected in [`ParseReport::errors`], while [`Archive::read_entry`]
//! returns them as hard errors.
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use zipwright::read::{Archive, ParseOptions};
//! use zipwright::{ArchivePath, Writer};
//!
//! let mut writer = Writer::create(Cursor::new(Vec::new()))?;
//! writer.add_bytes(ArchivePath::new("hello.txt")?, b"Hello, World!")?;
//! let (_, sink) = writer.finish_into_inner()?;
//! let bytes = sink.into_inner();
//!
//! let mut archive = Archive::open_with_options(
//!     Cursor::new(bytes),
//!     ParseOptions::new().verify_crc(true),
//! )?;
//! assert!(archive.report().is_valid());
//! assert_eq!(archive.read_entry_by_name("hello.txt")?, b"Hello, World!");
//! # Ok::<(), zipwright::Error>(())
//! ```

mod central;
mod eocd;
mod extract;
mod info;
mod names;
mod options;
mod verify;

pub use central::{read_central_directory, read_local_entry};
pub use eocd::{MAX_SEARCH, locate, locate_zip64};
pub use info::{CentralEntryInfo, EocdInfo, LocalEntryInfo, ParseReport, Zip64Info};
pub use names::decode_name;
pub use options::ParseOptions;
pub use verify::decode_entry;

use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;

use log::{debug, warn};

use crate::{Error, Result};

/// An opened archive: its structure plus the reader it came from.
pub struct Archive<R> {
    reader: R,
    options: ParseOptions,
    report: ParseReport,
}

impl<R> std::fmt::Debug for Archive<R> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Archive")
            .field("entries", &self.report.entries.len())
            .field("file_size", &self.report.file_size)
            .field("errors", &self.report.errors.len())
            .finish_non_exhaustive()
    }
}

impl Archive<BufReader<File>> {
    /// Opens an archive file with default options.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open_path_with_options(path, ParseOptions::default())
    }

    /// Opens an archive file.
    pub fn open_path_with_options(path: impl AsRef<Path>, options: ParseOptions) -> Result<Self> {
        let path = path.as_ref();
        debug!("opening archive {}", path.display());
        let file = File::open(path)?;
        Self::open_with_options(BufReader::new(file), options)
    }
}

impl<R: Read + Seek> Archive<R> {
    /// Opens an archive with default options.
    pub fn open(reader: R) -> Result<Self> {
        Self::open_with_options(reader, ParseOptions::default())
    }

    /// Parses the archive structure, and verifies every payload when
    /// [`ParseOptions::verify_crc`] is set.
    pub fn open_with_options(mut reader: R, options: ParseOptions) -> Result<Self> {
        let report = parse_structure(&mut reader)?;
        let mut archive = Self {
            reader,
            options,
            report,
        };
        if archive.options.verify_crc {
            let errors = archive.verify();
            if !errors.is_empty() {
                warn!("{} entries failed verification", errors.len());
            }
            archive.report.errors = errors;
        }
        Ok(archive)
    }

    /// The structural report.
    pub fn report(&self) -> &ParseReport {
        &self.report
    }

    /// Consumes the archive, returning its report.
    pub fn into_report(self) -> ParseReport {
        self.report
    }

    /// Consumes the archive, returning the reader.
    pub fn into_inner(self) -> R {
        self.reader
    }

    /// Local entries in central directory order.
    pub fn entries(&self) -> &[LocalEntryInfo] {
        &self.report.entries
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.report.len()
    }

    /// Whether the archive has no entries.
    pub fn is_empty(&self) -> bool {
        self.report.is_empty()
    }

    /// Archive comment bytes.
    pub fn comment(&self) -> &[u8] {
        self.report.comment()
    }

    /// Index of the first entry named `name`.
    pub fn entry_index(&self, name: &str) -> Option<usize> {
        self.report.entries.iter().position(|e| e.name == name)
    }
}

/// Parses an archive into a report.
///
/// Equivalent to opening an [`Archive`] and taking its report.
pub fn parse<R: Read + Seek>(reader: R, options: ParseOptions) -> Result<ParseReport> {
    Ok(Archive::open_with_options(reader, options)?.into_report())
}

/// Parses an archive file into a report.
pub fn parse_path(path: impl AsRef<Path>, options: ParseOptions) -> Result<ParseReport> {
    Ok(Archive::open_path_with_options(path, options)?.into_report())
}

fn parse_structure<R: Read + Seek + ?Sized>(reader: &mut R) -> Result<ParseReport> {
    let file_size = reader.seek(SeekFrom::End(0))?;
    let eocd = locate(reader, file_size)?;
    let zip64 = locate_zip64(reader, &eocd)?;

    let (count, cd_start, cd_size) = match &zip64 {
        Some(z) => (
            z.record.total_entries,
            z.record.central_directory_offset,
            z.record.central_directory_size,
        ),
        None => (
            eocd.record.total_entries as u64,
            eocd.record.central_directory_offset as u64,
            eocd.record.central_directory_size as u64,
        ),
    };
    let cd_limit = zip64.as_ref().map_or(eocd.offset, |z| z.locator.end_record_offset);
    if cd_start > cd_limit {
        return Err(Error::corrupt_header(
            eocd.offset,
            format!("central directory offset {:#x} lies past the end records", cd_start),
        ));
    }
    debug!(
        "central directory: {} entries, {} bytes at {:#x}",
        count, cd_size, cd_start
    );

    let central = read_central_directory(reader, cd_start, count)?;
    let entries = central
        .iter()
        .map(|record| read_local_entry(reader, record))
        .collect::<Result<Vec<_>>>()?;

    Ok(ParseReport {
        file_size,
        eocd: Some(eocd),
        zip64,
        central,
        entries,
        errors: Vec::new(),
    })
}
