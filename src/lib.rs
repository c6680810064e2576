//! # zipwright
//!
//! A pure-Rust library for building and validating ZIP archives.
//!
//! Archives are written as a lazy sequence of records whose offsets are
//! known before any payload byte is produced, so the total size of an
//! archive can be computed up front. Payloads stream through a bounded
//! buffer. Sizes beyond 4 GiB and more than 65535 entries switch to ZIP64
//! automatically.
//!
//! ## Quick Start
//!
//! ### Creating an Archive
//!
//! ```rust,no_run
//! use zipwright::{ArchivePath, Result, WriteOptions, Writer};
//!
//! fn main() -> Result<()> {
//!     let mut writer = Writer::create_path("new.zip")?
//!         .options(WriteOptions::new().comment("nightly build"));
//!
//!     // Add files from disk
//!     writer.add_path("file.txt", ArchivePath::new("file.txt")?)?;
//!
//!     // Add data from memory
//!     writer.add_bytes(ArchivePath::new("hello.txt")?, b"Hello, World!")?;
//!
//!     // Size of the finished archive, before writing it
//!     println!("archive will be {} bytes", writer.archive_len()?);
//!
//!     let result = writer.finish()?;
//!     println!("Wrote {} entries ({:.1}% saved)",
//!         result.entries_written,
//!         result.space_savings() * 100.0);
//!     Ok(())
//! }
//! ```
//!
//! ### Validating an Archive
//!
//! ```rust,no_run
//! use zipwright::{Archive, ParseOptions, Result};
//!
//! fn main() -> Result<()> {
//!     let archive = Archive::open_path_with_options(
//!         "archive.zip",
//!         ParseOptions::new().verify_crc(true),
//!     )?;
//!     for entry in archive.entries() {
//!         println!("{}: {} bytes", entry.name, entry.size);
//!     }
//!     for error in &archive.report().errors {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ### Encrypted Archives
//!
//! ```rust
//! # #[cfg(all(feature = "aes", feature = "deflate"))]
//! # fn main() -> zipwright::Result<()> {
//! use std::io::Cursor;
//! use zipwright::{Archive, ArchivePath, ParseOptions, WriteOptions, Writer};
//!
//! let mut writer = Writer::create(Cursor::new(Vec::new()))?
//!     .options(WriteOptions::new().password("secret"));
//! writer.add_bytes(ArchivePath::new("private.txt")?, b"top secret")?;
//! let (_, sink) = writer.finish_into_inner()?;
//!
//! let mut archive = Archive::open_with_options(
//!     Cursor::new(sink.into_inner()),
//!     ParseOptions::new().password("secret"),
//! )?;
//! assert_eq!(archive.read_entry(0)?, b"top secret");
//! # Ok(())
//! # }
//! # #[cfg(not(all(feature = "aes", feature = "deflate")))]
//! # fn main() {}
//! ```
//!
//! ## Feature Flags
//!
//! | Feature | Default | Description |
//! |---------|---------|-------------|
//! | `deflate` | Yes | Deflate compression (method 8) via `flate2` |
//! | `aes` | Yes | WinZip AE-x encryption |
//! | `parallel` | Yes | Precomputes entry CRCs and sizes on a thread pool |
//!
//! Stored entries and ZipCrypto are always available.
//!
//! ### Disabling Default Features
//!
//! ```toml
//! [dependencies]
//! zipwright = { version = "0.1", default-features = false, features = ["deflate"] }
//! ```
//!
//! ## Error Handling
//!
//! All fallible operations return [`Result<T>`], an alias for
//! `std::result::Result<T, Error>`. [`Error::is_structural`] tells damage
//! to the archive layout apart from [`Error::is_integrity`] failures of a
//! single entry.
//!
//! ```rust
//! use std::io::Cursor;
//! use zipwright::{Archive, Error};
//!
//! match Archive::open(Cursor::new(b"not a zip".to_vec())) {
//!     Err(Error::EndOfCentralDirectoryNotFound { searched }) => {
//!         assert_eq!(searched, 9);
//!     }
//!     other => panic!("unexpected: {other:?}"),
//! }
//! ```
//!
//! ## Logging
//!
//! Diagnostics go through the [`log`](https://docs.rs/log) facade; the
//! crate never installs a logger. Recoverable oddities such as an
//! unconfirmed end record are reported at `warn` level.
//!
//! ## Minimum Supported Rust Version (MSRV)
//!
//! This crate requires Rust 1.85 or later.

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_op_in_unsafe_fn)]

/// Default buffer size for read operations (32 KiB).
pub(crate) const READ_BUFFER_SIZE: usize = 32 * 1024;

/// Default buffer size for write operations (1 MiB).
pub(crate) const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

pub mod archive_path;
pub mod checksum;
pub mod crypto;
pub mod error;
pub mod format;
pub mod layout;
pub mod read;
pub mod streaming;
pub mod timestamp;
pub mod write;

pub use archive_path::ArchivePath;
pub use crypto::{AesStrength, EncryptionMethod, Password};
pub use error::{Error, PasswordDetectionMethod, Result};
pub use timestamp::DosDateTime;

// Re-export reading API at crate root for convenience
pub use read::{Archive, LocalEntryInfo, ParseOptions, ParseReport, parse, parse_path};

// Re-export writing API at crate root for convenience
pub use write::{EntryMeta, WriteOptions, WriteResult, Writer};

pub use streaming::StreamingConfig;
