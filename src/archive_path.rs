//! Validated virtual path of an archive entry.
//!
//! ZIP stores names as forward-slash separated byte strings whose length
//! must fit the 16-bit name length field. [`ArchivePath`] enforces that,
//! and rejects names that would escape an extraction root.

use crate::{Error, Result};
use std::fmt;

/// Longest name a ZIP header can carry.
pub const MAX_NAME_LENGTH: usize = u16::MAX as usize;

/// A validated entry path.
///
/// # Rules
///
/// - not empty, no NUL bytes, at most 65535 bytes of UTF-8
/// - `/` separated; backslashes are rejected
/// - not absolute (`/etc`) and no drive prefix (`C:`)
/// - no empty, `.` or `..` segments
/// - a single trailing `/` is allowed and marks a directory
///
/// # Example
///
/// ```rust
/// use zipwright::ArchivePath;
///
/// let path = ArchivePath::new("docs/readme.txt").unwrap();
/// assert_eq!(path.file_name(), "readme.txt");
/// assert!(!path.is_directory());
///
/// let dir = ArchivePath::new("docs").unwrap().as_directory();
/// assert_eq!(dir.as_str(), "docs/");
///
/// assert!(ArchivePath::new("../escape").is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ArchivePath(String);

impl ArchivePath {
    /// Validates and wraps a path.
    pub fn new(s: &str) -> Result<Self> {
        Self::validate(s)?;
        Ok(Self(s.to_string()))
    }

    fn validate(s: &str) -> Result<()> {
        if s.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }
        if s.contains('\0') {
            return Err(Error::InvalidArchivePath("contains NUL byte".into()));
        }
        if s.len() > MAX_NAME_LENGTH {
            return Err(Error::InvalidArchivePath(format!(
                "path exceeds maximum length of {} bytes",
                MAX_NAME_LENGTH
            )));
        }
        if s.contains('\\') {
            return Err(Error::InvalidArchivePath(
                "backslash separator not allowed".into(),
            ));
        }
        if s.starts_with('/') {
            return Err(Error::InvalidArchivePath(
                "absolute path not allowed".into(),
            ));
        }
        let bytes = s.as_bytes();
        if bytes.len() >= 2 && bytes[1] == b':' && bytes[0].is_ascii_alphabetic() {
            return Err(Error::InvalidArchivePath("drive prefix not allowed".into()));
        }

        let body = s.strip_suffix('/').unwrap_or(s);
        if body.is_empty() {
            return Err(Error::InvalidArchivePath("empty path".into()));
        }
        for segment in body.split('/') {
            match segment {
                "" => {
                    return Err(Error::InvalidArchivePath(
                        "empty segment (consecutive slashes)".into(),
                    ));
                }
                "." => {
                    return Err(Error::InvalidArchivePath("'.' segment not allowed".into()));
                }
                ".." => {
                    return Err(Error::InvalidArchivePath(
                        "'..' segment not allowed (path traversal)".into(),
                    ));
                }
                _ => {}
            }
        }
        Ok(())
    }

    /// Returns the path as a string slice.
    #[inline]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if the path ends with `/`.
    pub fn is_directory(&self) -> bool {
        self.0.ends_with('/')
    }

    /// Returns the same path with a trailing `/`.
    pub fn as_directory(&self) -> Self {
        if self.is_directory() {
            self.clone()
        } else {
            Self(format!("{}/", self.0))
        }
    }

    /// Returns the last segment, without a trailing `/`.
    pub fn file_name(&self) -> &str {
        let body = self.0.strip_suffix('/').unwrap_or(&self.0);
        body.rsplit('/').next().unwrap_or(body)
    }

    /// Appends a segment.
    pub fn join(&self, other: &str) -> Result<Self> {
        let base = self.0.strip_suffix('/').unwrap_or(&self.0);
        Self::new(&format!("{}/{}", base, other))
    }
}

impl AsRef<str> for ArchivePath {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ArchivePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for ArchivePath {
    type Error = Error;

    fn try_from(s: &str) -> Result<Self> {
        Self::new(s)
    }
}

impl TryFrom<String> for ArchivePath {
    type Error = Error;

    fn try_from(s: String) -> Result<Self> {
        Self::validate(&s)?;
        Ok(Self(s))
    }
}
