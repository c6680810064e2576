//! Buffer configuration for payload streaming.
//!
//! This module provides [`StreamingConfig`], which bounds the memory a
//! single entry needs regardless of its size.

use crate::{Error, Result};

/// Default working buffer for write paths (1 MiB).
pub const DEFAULT_WRITE_BUFFER_SIZE: usize = crate::WRITE_BUFFER_SIZE;

/// Default working buffer for read paths (32 KiB).
pub const DEFAULT_READ_BUFFER_SIZE: usize = crate::READ_BUFFER_SIZE;

/// Buffer sizes used by the transform pipeline.
///
/// # Example
///
/// ```rust
/// use zipwright::streaming::StreamingConfig;
///
/// // Default configuration (1 MiB write buffer, 32 KiB read buffer)
/// let config = StreamingConfig::default();
///
/// // Custom configuration for constrained environments
/// let config = StreamingConfig::new()
///     .write_buffer_size(64 * 1024)
///     .read_buffer_size(8 * 1024);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamingConfig {
    /// Chunk size used when feeding payloads into the write pipeline.
    ///
    /// Default: 1 MiB.
    pub write_buffer_size: usize,

    /// Chunk size used when reading payloads back for verification or
    /// extraction.
    ///
    /// Default: 32 KiB.
    pub read_buffer_size: usize,
}

impl Default for StreamingConfig {
    fn default() -> Self {
        Self {
            write_buffer_size: DEFAULT_WRITE_BUFFER_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

impl StreamingConfig {
    /// Creates a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a configuration optimized for low memory usage.
    pub fn low_memory() -> Self {
        Self {
            write_buffer_size: 64 * 1024, // 64 KiB
            read_buffer_size: 8 * 1024,   // 8 KiB
        }
    }

    /// Creates a configuration optimized for throughput.
    pub fn high_performance() -> Self {
        Self {
            write_buffer_size: 8 * 1024 * 1024, // 8 MiB
            read_buffer_size: 256 * 1024,       // 256 KiB
        }
    }

    /// Sets the write buffer size.
    pub fn write_buffer_size(mut self, bytes: usize) -> Self {
        self.write_buffer_size = bytes;
        self
    }

    /// Sets the read buffer size.
    pub fn read_buffer_size(mut self, bytes: usize) -> Self {
        self.read_buffer_size = bytes;
        self
    }

    /// Validates the configuration.
    ///
    /// Returns an error if any buffer size is zero.
    pub fn validate(&self) -> Result<()> {
        if self.write_buffer_size == 0 {
            return Err(Error::InvalidFormat(
                "write_buffer_size must be greater than 0".into(),
            ));
        }

        if self.read_buffer_size == 0 {
            return Err(Error::InvalidFormat(
                "read_buffer_size must be greater than 0".into(),
            ));
        }

        Ok(())
    }
}
