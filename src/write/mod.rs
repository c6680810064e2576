//! Archive writing API.
//!
//! [`Writer`] collects entries and emits the archive in one forward pass
//! when finished: local headers with payloads, the central directory, and
//! the end records. The sink only needs [`Write`]; every offset is known
//! ahead of time because entries finalize their sizes before their headers
//! are written (or defer them to a data descriptor).
//!
//! # Example
//!
//! ```rust
//! use std::io::Cursor;
//! use zipwright::{ArchivePath, Writer, WriteOptions};
//!
//! let mut writer = Writer::create(Cursor::new(Vec::new()))?
//!     .options(WriteOptions::new().level(9)?);
//! writer.add_bytes(ArchivePath::new("hello.txt")?, b"Hello, World!")?;
//! let (result, sink) = writer.finish_into_inner()?;
//! assert_eq!(result.entries_written, 1);
//! assert_eq!(&sink.get_ref()[..4], b"PK\x03\x04");
//! # Ok::<(), zipwright::Error>(())
//! ```

mod entry_input;
mod fields;
mod options;
mod sequence;
mod writer_init;

use std::io::Write;

use log::debug;

pub use fields::{FieldBuilder, inject_central, inject_local};
pub use options::{DEFAULT_LEVEL, EntryMeta, WriteOptions, WriteResult};
pub use sequence::RecordSequence;

use crate::layout::{EntrySizes, FileEntry};
use crate::{Error, Result};

/// Writer state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WriterState {
    /// Accepting new entries.
    AcceptingEntries,
    /// Emitting records.
    Building,
    /// Archive is complete.
    Finished,
}

/// ZIP archive writer.
pub struct Writer<W: Write> {
    sink: W,
    options: WriteOptions,
    state: WriterState,
    entries: Vec<FileEntry>,
}

impl<W: Write> std::fmt::Debug for Writer<W> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Writer")
            .field("options", &self.options)
            .field("state", &self.state)
            .field("entries", &self.entries.len())
            .finish_non_exhaustive()
    }
}

impl<W: Write> Writer<W> {
    /// Ensures the writer is accepting entries.
    fn ensure_accepting_entries(&self) -> Result<()> {
        match self.state {
            WriterState::AcceptingEntries => Ok(()),
            WriterState::Building | WriterState::Finished => Err(Error::WriterFinished),
        }
    }

    /// Number of entries added so far.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if no entries have been added.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The entries added so far.
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    /// The builders selected by the current options.
    fn field_builders(&self) -> Vec<FieldBuilder> {
        FieldBuilder::for_options(&self.options)
    }

    fn comment_bytes(&self) -> Vec<u8> {
        self.options
            .comment
            .as_deref()
            .map(options::comment_field)
            .unwrap_or_default()
    }

    /// Computes the final length of the archive without writing it.
    ///
    /// Finalizes every entry, which streams each payload once.
    pub fn archive_len(&mut self) -> Result<u64> {
        let builders = self.field_builders();
        let comment = self.comment_bytes();
        RecordSequence::new(&mut self.entries, &builders, &comment).measure()
    }

    /// Finalizes sizes and CRCs of all entries ahead of writing.
    ///
    /// With the `parallel` feature the payloads are processed concurrently;
    /// the archive itself is still written sequentially. Entries using a
    /// data descriptor are left alone.
    pub fn precompute(&mut self) -> Result<()> {
        let pending: Vec<usize> = self
            .entries
            .iter()
            .enumerate()
            .filter(|(_, e)| e.sizes().is_none() && !e.uses_data_descriptor())
            .map(|(i, _)| i)
            .collect();
        debug!("precomputing {} of {} entries", pending.len(), self.entries.len());

        let computed = compute_all(&self.entries, &pending);
        for (index, sizes) in pending.into_iter().zip(computed) {
            self.entries[index].apply_precomputed(sizes?)?;
        }
        Ok(())
    }
}

#[cfg(feature = "parallel")]
fn compute_all(entries: &[FileEntry], indices: &[usize]) -> Vec<Result<EntrySizes>> {
    use rayon::prelude::*;

    indices
        .par_iter()
        .map(|&i| entries[i].compute_sizes())
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn compute_all(entries: &[FileEntry], indices: &[usize]) -> Vec<Result<EntrySizes>> {
    indices.iter().map(|&i| entries[i].compute_sizes()).collect()
}
