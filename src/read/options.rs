//! Options for parsing and extraction.

use crate::crypto::Password;

/// Options controlling how an archive is parsed.
#[derive(Debug, Clone)]
pub struct ParseOptions {
    /// Re-read every payload and compare its CRC-32 (or AE-x
    /// authentication code) while parsing. Failures are collected in
    /// [`ParseReport::errors`](super::ParseReport::errors).
    pub verify_crc: bool,
    /// Password for encrypted entries.
    pub password: Option<Password>,
    /// Chunk size used when streaming payloads.
    pub read_buffer_size: usize,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            verify_crc: false,
            password: None,
            read_buffer_size: crate::READ_BUFFER_SIZE,
        }
    }
}

impl ParseOptions {
    /// Creates parse options with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enables or disables payload verification.
    pub fn verify_crc(mut self, verify: bool) -> Self {
        self.verify_crc = verify;
        self
    }

    /// Sets the password for encrypted entries.
    pub fn password(mut self, password: impl Into<Password>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the chunk size; zero is raised to one byte.
    pub fn read_buffer_size(mut self, size: usize) -> Self {
        self.read_buffer_size = size.max(1);
        self
    }
}
