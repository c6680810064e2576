//! Error types for ZIP archive operations.
//!
//! This module provides the [`Error`] enum which represents all possible
//! failure modes when building or parsing ZIP archives, along with a
//! convenient [`Result<T>`] type alias.
//!
//! # Error Categories
//!
//! Errors fall into three broad groups:
//!
//! - **Structural** errors (missing or mismatched signatures, a missing end of
//!   central directory record, truncated reads) abort parsing immediately.
//! - **Integrity** errors (CRC mismatch, authentication tag mismatch, bad
//!   password verification value) are collected into
//!   [`ParseReport::errors`](crate::read::ParseReport::errors) during
//!   validation, but are returned as hard failures when extracting
//!   plaintext.
//! - Everything else: I/O failures while writing, unsupported methods,
//!   invalid paths and options.
//!
//! Sizes and offsets that exceed 32-bit range are not errors. They are
//! promoted to ZIP64 representation silently.
//!
//! ```rust
//! use zipwright::Error;
//!
//! fn describe(error: &Error) -> &'static str {
//!     if error.is_structural() {
//!         "the archive structure is damaged"
//!     } else if error.is_integrity() {
//!         "an entry failed its integrity check"
//!     } else {
//!         "the operation failed"
//!     }
//! }
//! ```

use std::io;

/// How a wrong password was detected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum PasswordDetectionMethod {
    /// The last byte of the decrypted 12-byte ZipCrypto header did not match
    /// the high byte of the entry's CRC-32 (or DOS time).
    ///
    /// A wrong password passes this check with probability 1/256, in which
    /// case the CRC comparison after decryption catches it.
    HeaderCheckByte,

    /// The 2-byte AE-x password verification value did not match.
    VerificationValue,
}

impl std::fmt::Display for PasswordDetectionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::HeaderCheckByte => write!(f, "encryption header check byte"),
            Self::VerificationValue => write!(f, "password verification value"),
        }
    }
}

/// Helper struct for formatting errors that carry optional entry context.
struct EntryContext<'a> {
    entry_index: Option<usize>,
    entry_name: Option<&'a str>,
}

impl std::fmt::Display for EntryContext<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match (self.entry_index, self.entry_name) {
            (Some(idx), Some(name)) => write!(f, " for entry {} ({})", idx, name),
            (Some(idx), None) => write!(f, " for entry {}", idx),
            (None, Some(name)) => write!(f, " for entry '{}'", name),
            (None, None) => Ok(()),
        }
    }
}

/// Helper struct for formatting CrcMismatch error messages.
struct CrcMismatchDisplay<'a> {
    entry_index: usize,
    entry_name: Option<&'a str>,
    expected: u32,
    actual: u32,
}

impl std::fmt::Display for CrcMismatchDisplay<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CRC mismatch for entry {}", self.entry_index)?;
        if let Some(name) = self.entry_name {
            write!(f, " ({})", name)?;
        }
        write!(f, ": expected {:#010x}, got {:#010x}", self.expected, self.actual)
    }
}

/// The main error type for ZIP archive operations.
///
/// | Category | Variants |
/// |----------|----------|
/// | I/O | [`Io`][Self::Io] |
/// | Structural | [`InvalidFormat`][Self::InvalidFormat], [`CorruptHeader`][Self::CorruptHeader], [`SignatureMismatch`][Self::SignatureMismatch], [`EndOfCentralDirectoryNotFound`][Self::EndOfCentralDirectoryNotFound], [`Truncated`][Self::Truncated] |
/// | Integrity | [`CrcMismatch`][Self::CrcMismatch], [`WrongPassword`][Self::WrongPassword], [`AuthenticationFailed`][Self::AuthenticationFailed] |
/// | Compatibility | [`UnsupportedMethod`][Self::UnsupportedMethod], [`UnsupportedFeature`][Self::UnsupportedFeature] |
/// | Usage | [`InvalidArchivePath`][Self::InvalidArchivePath], [`InvalidCompressionLevel`][Self::InvalidCompressionLevel], [`EntryNotFound`][Self::EntryNotFound], [`WriterFinished`][Self::WriterFinished] |
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An I/O error occurred while reading a source or writing the sink.
    ///
    /// Writer-side I/O failures are fatal: no partial-archive recovery is
    /// attempted and a partially written output must be treated as invalid.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The data is not a ZIP archive or violates a structural rule.
    #[error("Invalid ZIP format: {0}")]
    InvalidFormat(String),

    /// A header field holds a value that cannot be right.
    #[error("Corrupt header at offset {offset:#x}: {reason}")]
    CorruptHeader {
        /// The byte offset of the header.
        offset: u64,
        /// A description of the corruption.
        reason: String,
    },

    /// A record did not start with its expected signature.
    #[error(
        "Invalid {structure} signature at offset {offset:#x}: expected {expected:#010x}, found {actual:#010x}"
    )]
    SignatureMismatch {
        /// The record kind that was expected.
        structure: &'static str,
        /// The byte offset of the record.
        offset: u64,
        /// The expected signature.
        expected: u32,
        /// The signature actually found.
        actual: u32,
    },

    /// The backward search did not find an end of central directory record.
    ///
    /// The search covers the fixed record plus the largest possible comment
    /// (65535 bytes) from the end of the input.
    #[error("EOCD not found in the last {searched} bytes")]
    EndOfCentralDirectoryNotFound {
        /// How many bytes from the end were searched.
        searched: u64,
    },

    /// The input ended in the middle of a record.
    #[error("Truncated {structure} at offset {offset:#x}")]
    Truncated {
        /// The record kind being read.
        structure: &'static str,
        /// The byte offset of the record.
        offset: u64,
    },

    /// The entry uses a compression method this build cannot handle.
    ///
    /// Method 0 (stored) is always available; method 8 (deflate) requires
    /// the `deflate` feature.
    #[error("Unsupported compression method: {method_id}")]
    UnsupportedMethod {
        /// The method id from the header.
        method_id: u16,
    },

    /// A feature needed by the entry is not supported by this build.
    #[error("Unsupported feature: {feature}")]
    UnsupportedFeature {
        /// The name of the unsupported feature.
        feature: &'static str,
    },

    /// The password is incorrect.
    ///
    /// # Recovery
    ///
    /// Retry with a different password. When parsing with
    /// [`ParseOptions::verify_crc`](crate::read::ParseOptions::verify_crc)
    /// the error is recorded in the report and the remaining entries are
    /// still checked.
    #[error("Wrong password{} (detected by {detection_method})", EntryContext { entry_index: *entry_index, entry_name: entry_name.as_deref() })]
    WrongPassword {
        /// The entry index where the wrong password was detected (if known).
        entry_index: Option<usize>,
        /// The entry name where the wrong password was detected (if known).
        entry_name: Option<String>,
        /// How the wrong password was detected.
        detection_method: PasswordDetectionMethod,
    },

    /// The AE-x authentication code did not match the ciphertext.
    ///
    /// The ciphertext was modified or truncated after encryption. Plaintext
    /// of an entry failing this check is never returned.
    #[error("Authentication code mismatch{}", EntryContext { entry_index: *entry_index, entry_name: entry_name.as_deref() })]
    AuthenticationFailed {
        /// The entry index (if known).
        entry_index: Option<usize>,
        /// The entry name (if known).
        entry_name: Option<String>,
    },

    /// A cryptographic primitive rejected its input.
    ///
    /// This indicates an internal error such as an invalid key length,
    /// or a failure of the system random source.
    #[error("Cryptographic error: {0}")]
    CryptoError(String),

    /// The CRC-32 of the decoded payload does not match the recorded value.
    #[error("{}", CrcMismatchDisplay { entry_index: *entry_index, entry_name: entry_name.as_deref(), expected: *expected, actual: *actual })]
    CrcMismatch {
        /// The entry index with the CRC mismatch.
        entry_index: usize,
        /// The entry name (if known).
        entry_name: Option<String>,
        /// The CRC recorded in the archive.
        expected: u32,
        /// The CRC of the decoded payload.
        actual: u32,
    },

    /// An encrypted entry was read without a password.
    #[error("Password required to decrypt '{entry_name}'")]
    PasswordRequired {
        /// The encrypted entry.
        entry_name: String,
    },

    /// A virtual path was rejected.
    #[error("Invalid archive path: {0}")]
    InvalidArchivePath(String),

    /// The deflate level is outside `0..=9`.
    #[error("Invalid compression level {level}: expected 0-9")]
    InvalidCompressionLevel {
        /// The rejected level.
        level: u32,
    },

    /// No entry with the given name exists in the archive.
    #[error("Entry not found: {path}")]
    EntryNotFound {
        /// The requested name.
        path: String,
    },

    /// Entries were added after the archive was written.
    #[error("Writer is not accepting entries")]
    WriterFinished,
}

impl Error {
    /// Returns `true` if this error means the archive structure could not be
    /// read.
    ///
    /// Structural errors are fatal to parsing: no report is produced.
    pub fn is_structural(&self) -> bool {
        match self {
            Error::InvalidFormat(_)
            | Error::CorruptHeader { .. }
            | Error::SignatureMismatch { .. }
            | Error::EndOfCentralDirectoryNotFound { .. }
            | Error::Truncated { .. } => true,
            Error::Io(e) => e.kind() == io::ErrorKind::UnexpectedEof,
            _ => false,
        }
    }

    /// Returns `true` if this error is an integrity failure of an entry
    /// payload.
    ///
    /// ```rust
    /// use zipwright::Error;
    ///
    /// let err = Error::crc_mismatch(0, None, 1, 2);
    /// assert!(err.is_integrity());
    /// ```
    pub fn is_integrity(&self) -> bool {
        matches!(
            self,
            Error::CrcMismatch { .. }
                | Error::WrongPassword { .. }
                | Error::AuthenticationFailed { .. }
        )
    }

    /// Returns `true` if this is an encryption-related error.
    pub fn is_encryption_error(&self) -> bool {
        matches!(
            self,
            Error::WrongPassword { .. }
                | Error::AuthenticationFailed { .. }
                | Error::CryptoError(_)
                | Error::PasswordRequired { .. }
        )
    }

    /// Returns `true` if this error is related to unsupported features or methods.
    pub fn is_unsupported(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedMethod { .. } | Error::UnsupportedFeature { .. }
        )
    }

    /// Returns the entry index associated with this error, if any.
    pub fn entry_index(&self) -> Option<usize> {
        match self {
            Error::WrongPassword { entry_index, .. } => *entry_index,
            Error::AuthenticationFailed { entry_index, .. } => *entry_index,
            Error::CrcMismatch { entry_index, .. } => Some(*entry_index),
            _ => None,
        }
    }

    /// Returns the entry name associated with this error, if any.
    pub fn entry_name(&self) -> Option<&str> {
        match self {
            Error::WrongPassword { entry_name, .. } => entry_name.as_deref(),
            Error::AuthenticationFailed { entry_name, .. } => entry_name.as_deref(),
            Error::CrcMismatch { entry_name, .. } => entry_name.as_deref(),
            Error::PasswordRequired { entry_name } => Some(entry_name.as_str()),
            Error::EntryNotFound { path } => Some(path.as_str()),
            _ => None,
        }
    }

    /// Attaches entry context to an integrity error raised by a cipher.
    ///
    /// Ciphers do not know which entry they are processing, so the reader
    /// fills the index and name in afterwards. Other errors pass through
    /// unchanged.
    pub fn with_entry(self, index: usize, name: &str) -> Self {
        match self {
            Error::WrongPassword {
                detection_method, ..
            } => Error::WrongPassword {
                entry_index: Some(index),
                entry_name: Some(name.to_string()),
                detection_method,
            },
            Error::AuthenticationFailed { .. } => Error::AuthenticationFailed {
                entry_index: Some(index),
                entry_name: Some(name.to_string()),
            },
            Error::CrcMismatch {
                expected, actual, ..
            } => Error::CrcMismatch {
                entry_index: index,
                entry_name: Some(name.to_string()),
                expected,
                actual,
            },
            other => other,
        }
    }

    /// Creates a WrongPassword error without entry context.
    pub fn wrong_password(detection_method: PasswordDetectionMethod) -> Self {
        Error::WrongPassword {
            entry_index: None,
            entry_name: None,
            detection_method,
        }
    }

    /// Creates a CrcMismatch error.
    pub fn crc_mismatch(
        entry_index: usize,
        entry_name: Option<String>,
        expected: u32,
        actual: u32,
    ) -> Self {
        Error::CrcMismatch {
            entry_index,
            entry_name,
            expected,
            actual,
        }
    }

    /// Creates a CorruptHeader error.
    pub fn corrupt_header(offset: u64, reason: impl Into<String>) -> Self {
        Error::CorruptHeader {
            offset,
            reason: reason.into(),
        }
    }

    /// Maps an unexpected end of input to [`Error::Truncated`].
    ///
    /// Any other I/O error is passed through as [`Error::Io`].
    pub(crate) fn truncated_or_io(err: io::Error, structure: &'static str, offset: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            Error::Truncated { structure, offset }
        } else {
            Error::Io(err)
        }
    }
}

/// A specialized Result type for ZIP operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_from() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_invalid_format() {
        let err = Error::InvalidFormat("missing signature".into());
        assert_eq!(err.to_string(), "Invalid ZIP format: missing signature");
        assert!(err.is_structural());
    }

    #[test]
    fn test_signature_mismatch_display() {
        let err = Error::SignatureMismatch {
            structure: "local file header",
            offset: 0x40,
            expected: 0x04034b50,
            actual: 0,
        };
        let msg = err.to_string();
        assert!(msg.contains("local file header"));
        assert!(msg.contains("0x40"));
        assert!(msg.contains("0x04034b50"));
        assert!(err.is_structural());
    }

    #[test]
    fn test_eocd_not_found_display() {
        let err = Error::EndOfCentralDirectoryNotFound { searched: 65557 };
        assert!(err.to_string().contains("EOCD not found"));
        assert!(err.is_structural());
        assert!(!err.is_integrity());
    }

    #[test]
    fn test_wrong_password() {
        let err = Error::wrong_password(PasswordDetectionMethod::HeaderCheckByte);
        assert!(err.to_string().starts_with("Wrong password"));
        assert!(err.is_integrity());
        assert!(err.is_encryption_error());

        let err = err.with_entry(3, "file.txt");
        let msg = err.to_string();
        assert!(msg.contains("entry 3"));
        assert!(msg.contains("file.txt"));
        assert_eq!(err.entry_index(), Some(3));
        assert_eq!(err.entry_name(), Some("file.txt"));
    }

    #[test]
    fn test_authentication_failed_with_entry() {
        let err = Error::AuthenticationFailed {
            entry_index: None,
            entry_name: None,
        }
        .with_entry(7, "secret.bin");
        assert!(err.to_string().contains("secret.bin"));
        assert!(err.is_integrity());
    }

    #[test]
    fn test_crc_mismatch() {
        let err = Error::crc_mismatch(5, Some("path/to/file.txt".into()), 0xDEADBEEF, 0xCAFEBABE);
        let msg = err.to_string();
        assert!(msg.contains("entry 5"));
        assert!(msg.contains("path/to/file.txt"));
        assert!(msg.contains("0xdeadbeef"));
        assert!(msg.contains("0xcafebabe"));
    }

    #[test]
    fn test_with_entry_leaves_other_errors_alone() {
        let err = Error::WriterFinished.with_entry(1, "a");
        assert!(matches!(err, Error::WriterFinished));
    }

    #[test]
    fn test_truncated_or_io() {
        let eof = io::Error::new(io::ErrorKind::UnexpectedEof, "eof");
        assert!(matches!(
            Error::truncated_or_io(eof, "central directory record", 10),
            Error::Truncated { offset: 10, .. }
        ));

        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        assert!(matches!(
            Error::truncated_or_io(denied, "central directory record", 10),
            Error::Io(_)
        ));
    }

    #[test]
    fn test_is_unsupported() {
        assert!(Error::UnsupportedMethod { method_id: 14 }.is_unsupported());
        assert!(Error::UnsupportedFeature { feature: "aes" }.is_unsupported());
        assert!(!Error::WriterFinished.is_unsupported());
    }

    #[test]
    fn test_error_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Error>();
    }
}
