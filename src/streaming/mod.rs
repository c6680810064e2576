//! Bounded-memory payload streaming.
//!
//! Every payload, whether written or read back, flows through a
//! [`Pipeline`]: an explicit, ordered list of [`Stage`]s built when the
//! pipeline is constructed. Input comes from a [`Source`] (memory, a file,
//! or a byte range of an open archive) and is consumed in chunks sized by
//! [`StreamingConfig`].
//!
//! # Example
//!
//! ```rust
//! use zipwright::streaming::{Pipeline, Source, WritePlan};
//!
//! let plan = WritePlan { checksum: true, ..Default::default() };
//! let out = Pipeline::for_write(64 * 1024, plan, None)?.run(Source::Bytes(b"hello"))?;
//! assert_eq!(out.bytes_out, Some(5));
//! assert_eq!(out.crc32, Some(0x3610a686));
//! # Ok::<(), zipwright::Error>(())
//! ```

mod config;
mod pipeline;
mod source;
mod transform;

pub use config::{DEFAULT_READ_BUFFER_SIZE, DEFAULT_WRITE_BUFFER_SIZE, StreamingConfig};
pub use pipeline::{Pipeline, PipelineOutput, Stage, WritePlan};
pub use source::{ReadSeek, Source};
pub use transform::{
    ChecksumStage, Compressor, CountStage, Decompressor, Decryptor, Encryptor, MirrorStage,
    Transform,
};
