//! Payload sources fed into the transform pipeline.

use std::fs::File;
use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::Path;

use crate::Result;

/// Object-safe combination of [`Read`] and [`Seek`].
pub trait ReadSeek: Read + Seek {}

impl<T: Read + Seek + ?Sized> ReadSeek for T {}

/// Where a pipeline reads its input from.
///
/// All three sources are consumed the same way: in chunks no larger than
/// the configured buffer.
pub enum Source<'a> {
    /// An in-memory buffer.
    Bytes(&'a [u8]),
    /// A file on disk, opened when the pipeline starts.
    Path(&'a Path),
    /// A byte range of an already-open stream, typically an archive.
    Range {
        /// The stream.
        reader: &'a mut dyn ReadSeek,
        /// Absolute start offset.
        offset: u64,
        /// Number of bytes to read.
        len: u64,
    },
}

impl std::fmt::Debug for Source<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Bytes(data) => f.debug_tuple("Bytes").field(&data.len()).finish(),
            Self::Path(path) => f.debug_tuple("Path").field(path).finish(),
            Self::Range { offset, len, .. } => f
                .debug_struct("Range")
                .field("offset", offset)
                .field("len", len)
                .finish_non_exhaustive(),
        }
    }
}

impl<'a> Source<'a> {
    /// Opens the source for sequential reading.
    pub fn open(self) -> Result<Box<dyn Read + 'a>> {
        Ok(match self {
            Self::Bytes(data) => Box::new(Cursor::new(data)),
            Self::Path(path) => Box::new(File::open(path)?),
            Self::Range {
                reader,
                offset,
                len,
            } => {
                reader.seek(SeekFrom::Start(offset))?;
                Box::new(reader.take(len))
            }
        })
    }
}

/// Fills `buf` as far as possible, returning the number of bytes read.
///
/// Unlike a single `read` call this only returns a short count at end of
/// input, so chunk boundaries stay aligned to the buffer size.
pub(crate) fn read_chunk<R: Read + ?Sized>(reader: &mut R, buf: &mut [u8]) -> Result<usize> {
    let mut filled = 0;
    while filled < buf.len() {
        match reader.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}
