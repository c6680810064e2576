//! Writer initialization and finalization.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use log::{debug, trace};

use crate::layout::LayoutRecord;
use crate::{Error, Result};

use super::options::{WriteOptions, WriteResult};
use super::sequence::RecordSequence;
use super::{Writer, WriterState};

impl Writer<BufWriter<File>> {
    /// Creates a new archive file at the given path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be created.
    pub fn create_path(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::create(path.as_ref()).map_err(Error::Io)?;
        Self::create(BufWriter::new(file))
    }
}

impl<W: Write> Writer<W> {
    /// Creates a new archive writer. Nothing is written until
    /// [`finish`](Self::finish).
    pub fn create(sink: W) -> Result<Self> {
        Ok(Self {
            sink,
            options: WriteOptions::default(),
            state: WriterState::AcceptingEntries,
            entries: Vec::new(),
        })
    }

    /// Sets the write options.
    ///
    /// Options apply to entries added afterwards; the extra-field toggles
    /// and comment apply to the whole archive.
    pub fn options(mut self, options: WriteOptions) -> Self {
        self.options = options;
        self
    }

    /// Writes the archive.
    ///
    /// # Errors
    ///
    /// Returns an error if a payload cannot be read or the sink fails.
    pub fn finish(self) -> Result<WriteResult> {
        let (result, _sink) = self.finish_into_inner()?;
        Ok(result)
    }

    /// Writes the archive and returns the underlying sink.
    pub fn finish_into_inner(mut self) -> Result<(WriteResult, W)> {
        self.ensure_accepting_entries()?;
        self.options.streaming.validate()?;
        self.state = WriterState::Building;

        let builders = self.field_builders();
        let comment = self.comment_bytes();
        let mut seq = RecordSequence::new(&mut self.entries, &builders, &comment);
        let mut written = 0u64;
        loop {
            let record_len = match seq.current()? {
                Some(mut record) => {
                    trace!("writing {} at {}", record.kind(), record.offset());
                    record.write_to(&mut self.sink)?
                }
                None => break,
            };
            written += record_len;
            seq.advance()?;
            if written != seq.offset() {
                return Err(Error::InvalidFormat(format!(
                    "layout drift: wrote {} bytes but expected {}",
                    written,
                    seq.offset()
                )));
            }
        }
        let zip64 = seq.uses_zip64_end().unwrap_or(false);
        self.sink.flush().map_err(Error::Io)?;
        self.state = WriterState::Finished;

        let mut result = WriteResult {
            archive_size: written,
            zip64,
            ..Default::default()
        };
        for entry in &self.entries {
            if entry.is_directory() {
                result.directories_written += 1;
                continue;
            }
            result.entries_written += 1;
            if let Some(sizes) = entry.sizes() {
                result.total_size += sizes.size;
                result.compressed_size += sizes.compressed_size;
            }
        }
        debug!(
            "wrote {} entries and {} directories, {} bytes",
            result.entries_written, result.directories_written, result.archive_size
        );
        Ok((result, self.sink))
    }
}
