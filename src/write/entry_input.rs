//! Entry input methods.
//!
//! Entries are only recorded here; payloads are read when the archive is
//! written (or precomputed). Files added by path are streamed from disk at
//! that point and must not change in between.

use std::io::{Read, Write};
use std::path::Path;

use crate::layout::{EntryData, FileEntry};
use crate::{ArchivePath, Error, Result};

use super::Writer;
use super::options::EntryMeta;

impl<W: Write> Writer<W> {
    /// Adds a file or directory from a filesystem path.
    ///
    /// Timestamps come from the file's metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the path cannot be inspected or if the writer is
    /// in an invalid state.
    pub fn add_path(&mut self, disk_path: impl AsRef<Path>, archive_path: ArchivePath) -> Result<()> {
        self.ensure_accepting_entries()?;

        let disk_path = disk_path.as_ref();
        let meta = EntryMeta::from_path(disk_path)?;

        if meta.is_directory {
            self.add_directory(archive_path, meta)
        } else {
            self.push(archive_path, EntryData::Path(disk_path.to_path_buf()), meta)
        }
    }

    /// Adds a directory entry. A trailing `/` is added to the name if
    /// missing.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer is in an invalid state.
    pub fn add_directory(&mut self, archive_path: ArchivePath, meta: EntryMeta) -> Result<()> {
        self.ensure_accepting_entries()?;
        let meta = EntryMeta {
            is_directory: true,
            ..meta
        };
        self.push(archive_path.as_directory(), EntryData::Empty, meta)
    }

    /// Adds an in-memory file with default metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer is in an invalid state.
    pub fn add_bytes(&mut self, archive_path: ArchivePath, data: &[u8]) -> Result<()> {
        self.add_bytes_with_meta(archive_path, data, EntryMeta::file())
    }

    /// Adds an in-memory file with explicit metadata.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer is in an invalid state or the path
    /// names a directory.
    pub fn add_bytes_with_meta(&mut self, archive_path: ArchivePath, data: &[u8], meta: EntryMeta) -> Result<()> {
        self.ensure_accepting_entries()?;
        if archive_path.is_directory() {
            return Err(Error::InvalidArchivePath(format!(
                "'{}' names a directory but has a payload",
                archive_path
            )));
        }
        self.push(archive_path, EntryData::Bytes(data.to_vec()), meta)
    }

    /// Adds a file by draining `reader` into memory.
    ///
    /// # Errors
    ///
    /// Returns an error if reading fails or the writer is in an invalid state.
    pub fn add_stream<R: Read>(&mut self, archive_path: ArchivePath, reader: &mut R, meta: EntryMeta) -> Result<()> {
        self.ensure_accepting_entries()?;
        let mut data = Vec::new();
        reader.read_to_end(&mut data).map_err(Error::Io)?;
        self.add_bytes_with_meta(archive_path, &data, meta)
    }

    /// Adds a prepared entry as is.
    ///
    /// # Errors
    ///
    /// Returns an error if the writer is in an invalid state.
    pub fn add_entry(&mut self, entry: FileEntry) -> Result<()> {
        self.ensure_accepting_entries()?;
        self.entries.push(entry);
        Ok(())
    }

    fn push(&mut self, archive_path: ArchivePath, data: EntryData, meta: EntryMeta) -> Result<()> {
        let config = self.options.entry_config(&meta);
        let entry = FileEntry::new(archive_path, data, meta.times(), config);
        self.entries.push(entry);
        Ok(())
    }
}
