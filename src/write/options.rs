//! Write options and result types.

use std::path::Path;

use filetime::FileTime;
use log::warn;

use crate::crypto::{EncryptionMethod, Password};
use crate::layout::{EntryConfig, EntryTimes};
use crate::streaming::StreamingConfig;
use crate::timestamp::unix_now;

/// Default DEFLATE level.
pub const DEFAULT_LEVEL: u32 = 6;

/// Options for creating archives.
///
/// The extra-field toggles decide which metadata records every entry gets;
/// all of them are off by default.
#[derive(Debug, Clone)]
pub struct WriteOptions {
    /// Whether to DEFLATE payloads. Stored when off; defaults to on when
    /// the `deflate` feature is enabled.
    pub compress: bool,
    /// DEFLATE level (0-9).
    pub level: u32,
    /// Whether to write CRC and sizes in a trailer after each payload.
    pub data_descriptor: bool,
    /// Whether data descriptors start with their optional signature.
    pub data_descriptor_signature: bool,
    /// Whether names are stored as UTF-8 (flag bit 11) or CP932.
    pub utf8_names: bool,
    /// Add NTFS timestamps (central directory).
    pub ntfs_times: bool,
    /// Add PKWARE Unix times and ids (local header).
    pub unix_times: bool,
    /// Add Info-ZIP Unix ids (local header).
    pub unix_ids: bool,
    /// Add extended timestamps (both headers).
    pub extended_timestamp: bool,
    /// Add the Info-ZIP Unicode path (both headers).
    pub unicode_path: bool,
    /// Default encryption of every entry.
    pub encryption: Option<EncryptionMethod>,
    /// Archive comment.
    pub comment: Option<String>,
    /// Buffer sizes.
    pub streaming: StreamingConfig,
}

impl Default for WriteOptions {
    fn default() -> Self {
        Self {
            compress: cfg!(feature = "deflate"),
            level: DEFAULT_LEVEL,
            data_descriptor: false,
            data_descriptor_signature: true,
            utf8_names: true,
            ntfs_times: false,
            unix_times: false,
            unix_ids: false,
            extended_timestamp: false,
            unicode_path: false,
            encryption: None,
            comment: None,
            streaming: StreamingConfig::default(),
        }
    }
}

impl WriteOptions {
    /// Creates new write options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables DEFLATE.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = compress;
        self
    }

    /// Sets the compression level (strict validation).
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCompressionLevel`] if level is greater than 9.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use zipwright::write::WriteOptions;
    ///
    /// let opts = WriteOptions::new().level(9)?;
    /// assert_eq!(opts.level, 9);
    ///
    /// assert!(WriteOptions::new().level(15).is_err());
    /// # Ok::<(), zipwright::Error>(())
    /// ```
    ///
    /// [`Error::InvalidCompressionLevel`]: crate::Error::InvalidCompressionLevel
    pub fn level(mut self, level: u32) -> crate::Result<Self> {
        if level > 9 {
            return Err(crate::Error::InvalidCompressionLevel { level });
        }
        self.level = level;
        Ok(self)
    }

    /// Sets the compression level, clamping values above 9.
    pub fn level_clamped(mut self, level: u32) -> Self {
        self.level = level.min(9);
        self
    }

    /// Writes a data descriptor after every payload.
    pub fn data_descriptor(mut self, enabled: bool) -> Self {
        self.data_descriptor = enabled;
        self
    }

    /// Whether data descriptors carry their signature.
    pub fn data_descriptor_signature(mut self, enabled: bool) -> Self {
        self.data_descriptor_signature = enabled;
        self
    }

    /// Stores names as UTF-8 (default) or as CP932.
    pub fn utf8_names(mut self, enabled: bool) -> Self {
        self.utf8_names = enabled;
        self
    }

    /// Adds NTFS timestamps.
    pub fn ntfs_times(mut self, enabled: bool) -> Self {
        self.ntfs_times = enabled;
        self
    }

    /// Adds PKWARE Unix times and ids.
    pub fn unix_times(mut self, enabled: bool) -> Self {
        self.unix_times = enabled;
        self
    }

    /// Adds Info-ZIP Unix ids.
    pub fn unix_ids(mut self, enabled: bool) -> Self {
        self.unix_ids = enabled;
        self
    }

    /// Adds extended timestamps.
    pub fn extended_timestamp(mut self, enabled: bool) -> Self {
        self.extended_timestamp = enabled;
        self
    }

    /// Adds Info-ZIP Unicode paths.
    pub fn unicode_path(mut self, enabled: bool) -> Self {
        self.unicode_path = enabled;
        self
    }

    /// Encrypts every entry with `method` unless the entry overrides it.
    pub fn encryption(mut self, method: EncryptionMethod) -> Self {
        self.encryption = Some(method);
        self
    }

    /// Shorthand for AE-2 with AES-256.
    pub fn password(self, password: impl Into<Password>) -> Self {
        self.encryption(EncryptionMethod::aes(password))
    }

    /// Sets the archive comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Sets buffer sizes.
    pub fn streaming(mut self, config: StreamingConfig) -> Self {
        self.streaming = config;
        self
    }

    /// Returns `true` if entries are encrypted by default.
    pub fn is_encrypted(&self) -> bool {
        self.encryption.is_some()
    }

    /// Resolves how an entry with `meta` is encoded.
    pub(crate) fn entry_config(&self, meta: &EntryMeta) -> EntryConfig {
        let compress = meta.compress.unwrap_or(self.compress);
        let encryption = if meta.unencrypted {
            None
        } else {
            meta.encryption.clone().or_else(|| self.encryption.clone())
        };
        EntryConfig {
            compression_level: compress.then_some(self.level),
            encryption,
            data_descriptor: self.data_descriptor,
            data_descriptor_signature: self.data_descriptor_signature,
            utf8_name: self.utf8_names,
            comment: meta.comment.as_deref().map(comment_field).unwrap_or_default(),
            buffer_size: self.streaming.write_buffer_size,
        }
    }
}

/// Encodes a comment, cutting it to the 65535 bytes its length field
/// can describe.
pub(crate) fn comment_field(text: &str) -> Vec<u8> {
    let mut bytes = text.as_bytes().to_vec();
    if bytes.len() > u16::MAX as usize {
        warn!("comment of {} bytes truncated to {}", bytes.len(), u16::MAX);
        bytes.truncate(u16::MAX as usize);
    }
    bytes
}

/// Metadata for an entry being written.
#[derive(Debug, Clone, Default)]
pub struct EntryMeta {
    /// Whether this is a directory.
    pub is_directory: bool,
    /// Modification time, Unix seconds. Defaults to now.
    pub modification_time: Option<i64>,
    /// Access time, Unix seconds.
    pub access_time: Option<i64>,
    /// Creation time, Unix seconds.
    pub creation_time: Option<i64>,
    /// Entry comment.
    pub comment: Option<String>,
    /// Overrides [`WriteOptions::compress`].
    pub compress: Option<bool>,
    /// Overrides [`WriteOptions::encryption`].
    pub encryption: Option<EncryptionMethod>,
    /// Stores the entry unencrypted even if the archive default encrypts.
    pub unencrypted: bool,
}

impl EntryMeta {
    /// Creates metadata for a file.
    pub fn file() -> Self {
        Self::default()
    }

    /// Creates metadata for a directory.
    pub fn directory() -> Self {
        Self {
            is_directory: true,
            ..Default::default()
        }
    }

    /// Creates metadata from a filesystem path.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the path cannot be read.
    ///
    /// [`Error::Io`]: crate::Error::Io
    pub fn from_path(path: impl AsRef<Path>) -> crate::Result<Self> {
        let metadata = std::fs::metadata(path)?;
        Ok(Self::from_metadata(&metadata))
    }

    /// Creates metadata from std::fs::Metadata.
    pub fn from_metadata(metadata: &std::fs::Metadata) -> Self {
        Self {
            is_directory: metadata.is_dir(),
            modification_time: Some(FileTime::from_last_modification_time(metadata).unix_seconds()),
            access_time: Some(FileTime::from_last_access_time(metadata).unix_seconds()),
            creation_time: FileTime::from_creation_time(metadata).map(|t| t.unix_seconds()),
            ..Default::default()
        }
    }

    /// Sets the modification time.
    pub fn modification_time(mut self, secs: i64) -> Self {
        self.modification_time = Some(secs);
        self
    }

    /// Sets the access time.
    pub fn access_time(mut self, secs: i64) -> Self {
        self.access_time = Some(secs);
        self
    }

    /// Sets the creation time.
    pub fn creation_time(mut self, secs: i64) -> Self {
        self.creation_time = Some(secs);
        self
    }

    /// Sets the entry comment.
    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    /// Overrides compression for this entry.
    pub fn compress(mut self, compress: bool) -> Self {
        self.compress = Some(compress);
        self
    }

    /// Encrypts this entry with `method`.
    pub fn encryption(mut self, method: EncryptionMethod) -> Self {
        self.encryption = Some(method);
        self.unencrypted = false;
        self
    }

    /// Stores this entry unencrypted.
    pub fn unencrypted(mut self) -> Self {
        self.encryption = None;
        self.unencrypted = true;
        self
    }

    pub(crate) fn times(&self) -> EntryTimes {
        EntryTimes {
            mtime: self.modification_time.unwrap_or_else(unix_now),
            atime: self.access_time,
            ctime: self.creation_time,
        }
    }
}

/// Result of writing an archive.
#[must_use = "write results should be checked to ensure archive was created successfully"]
#[derive(Debug, Clone, Default)]
pub struct WriteResult {
    /// Number of file entries written.
    pub entries_written: usize,
    /// Number of directories written.
    pub directories_written: usize,
    /// Total uncompressed bytes.
    pub total_size: u64,
    /// Total stored payload bytes, including encryption overhead.
    pub compressed_size: u64,
    /// Length of the whole archive.
    pub archive_size: u64,
    /// Whether the ZIP64 end record was written.
    pub zip64: bool,
}

impl WriteResult {
    /// Returns the compression ratio (compressed / uncompressed).
    pub fn compression_ratio(&self) -> f64 {
        if self.total_size == 0 {
            1.0
        } else {
            self.compressed_size as f64 / self.total_size as f64
        }
    }

    /// Returns the space savings percentage.
    pub fn space_savings(&self) -> f64 {
        if self.total_size == 0 {
            0.0
        } else {
            1.0 - self.compression_ratio()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opts = WriteOptions::default();
        assert_eq!(opts.compress, cfg!(feature = "deflate"));
        assert_eq!(opts.level, 6);
        assert!(opts.utf8_names);
        assert!(opts.data_descriptor_signature);
        assert!(!opts.data_descriptor);
        assert!(!opts.is_encrypted());
    }

    #[test]
    fn test_level_validation() {
        assert_eq!(WriteOptions::new().level(0).unwrap().level, 0);
        assert!(matches!(
            WriteOptions::new().level(10),
            Err(crate::Error::InvalidCompressionLevel { level: 10 })
        ));
        assert_eq!(WriteOptions::new().level_clamped(42).level, 9);
    }

    #[test]
    fn test_debug_hides_password() {
        let opts = WriteOptions::new().password("hunter2");
        assert!(!format!("{:?}", opts).contains("hunter2"));
    }

    #[test]
    fn test_entry_overrides() {
        let opts = WriteOptions::new()
            .encryption(EncryptionMethod::zip_crypto("pw"))
            .compress(true);
        let config = opts.entry_config(&EntryMeta::file().unencrypted().compress(false));
        assert!(config.encryption.is_none());
        assert_eq!(config.compression_level, None);

        let config = opts.entry_config(&EntryMeta::file().comment("note"));
        assert!(config.encryption.is_some());
        assert_eq!(config.compression_level, Some(6));
        assert_eq!(config.comment, b"note");
    }

    #[test]
    fn test_meta_from_path() {
        let file = tempfile::NamedTempFile::new().unwrap();
        let meta = EntryMeta::from_path(file.path()).unwrap();
        assert!(!meta.is_directory);
        assert!(meta.modification_time.unwrap() > 1_000_000_000);

        let dir = tempfile::tempdir().unwrap();
        assert!(EntryMeta::from_path(dir.path()).unwrap().is_directory);
    }

    #[test]
    fn test_write_result_ratio() {
        let result = WriteResult {
            total_size: 100,
            compressed_size: 25,
            ..Default::default()
        };
        assert!((result.compression_ratio() - 0.25).abs() < 1e-9);
        assert!((result.space_savings() - 0.75).abs() < 1e-9);
    }
}
