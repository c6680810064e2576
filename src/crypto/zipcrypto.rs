//! Traditional PKWARE encryption ("ZipCrypto").
//!
//! The cipher keeps three 32-bit keys. Each plaintext byte is folded into
//! the keys after it is XORed with a keystream byte derived from key 2.
//! Every encrypted payload starts with a 12-byte header: 11 random bytes and
//! a check byte equal to the high byte of the entry CRC-32. After
//! decrypting the header the check byte tells a wrong password apart with
//! probability 255/256.
//!
//! # Example
//!
//! ```rust
//! use zipwright::crypto::{Password, zipcrypto};
//!
//! let password = Password::new("secret");
//! let crc = zipwright::checksum::crc32(b"payload");
//! let sealed = zipcrypto::encrypt(b"payload", &password, crc).unwrap();
//! assert_eq!(sealed.len(), 7 + zipcrypto::HEADER_LEN);
//! assert_eq!(zipcrypto::decrypt(&sealed, &password, crc).unwrap(), b"payload");
//! ```

use crate::checksum::crc32_update_byte;
use crate::error::PasswordDetectionMethod;
use crate::{Error, Result};

use super::{Password, random_bytes};

/// Length of the encryption header prepended to the payload.
pub const HEADER_LEN: usize = 12;

const KEY0_INIT: u32 = 0x1234_5678;
const KEY1_INIT: u32 = 0x2345_6789;
const KEY2_INIT: u32 = 0x3456_7890;
const KEY1_MULTIPLIER: u32 = 134_775_813;

/// The three-key cipher state.
#[derive(Clone, PartialEq, Eq)]
pub struct ZipCryptoKeys {
    key0: u32,
    key1: u32,
    key2: u32,
}

impl std::fmt::Debug for ZipCryptoKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ZipCryptoKeys").finish_non_exhaustive()
    }
}

impl Default for ZipCryptoKeys {
    fn default() -> Self {
        Self {
            key0: KEY0_INIT,
            key1: KEY1_INIT,
            key2: KEY2_INIT,
        }
    }
}

impl ZipCryptoKeys {
    /// Initializes the keys from a password.
    pub fn from_password(password: &[u8]) -> Self {
        let mut keys = Self::default();
        for &b in password {
            keys.update_keys(b);
        }
        keys
    }

    /// Folds one plaintext byte into the key state.
    pub fn update_keys(&mut self, byte: u8) {
        self.key0 = crc32_update_byte(self.key0, byte);
        self.key1 = self
            .key1
            .wrapping_add(self.key0 & 0xff)
            .wrapping_mul(KEY1_MULTIPLIER)
            .wrapping_add(1);
        self.key2 = crc32_update_byte(self.key2, (self.key1 >> 24) as u8);
    }

    fn stream_byte(&self) -> u8 {
        let t = (self.key2 | 2) & 0xffff;
        ((t.wrapping_mul(t ^ 1)) >> 8) as u8
    }

    /// Encrypts one byte, updating keys with the plaintext.
    #[inline]
    pub fn encrypt_byte(&mut self, plain: u8) -> u8 {
        let cipher = plain ^ self.stream_byte();
        self.update_keys(plain);
        cipher
    }

    /// Decrypts one byte, updating keys with the recovered plaintext.
    #[inline]
    pub fn decrypt_byte(&mut self, cipher: u8) -> u8 {
        let plain = cipher ^ self.stream_byte();
        self.update_keys(plain);
        plain
    }

    /// Encrypts a buffer in place.
    pub fn encrypt_in_place(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.encrypt_byte(*b);
        }
    }

    /// Decrypts a buffer in place.
    pub fn decrypt_in_place(&mut self, buf: &mut [u8]) {
        for b in buf.iter_mut() {
            *b = self.decrypt_byte(*b);
        }
    }
}

/// Streaming encryptor.
///
/// The 12-byte header is emitted in front of the first output, or by
/// [`finish`](Self::finish) for an empty payload.
#[derive(Debug)]
pub struct ZipCryptoEncryptor {
    keys: ZipCryptoKeys,
    header: Option<[u8; HEADER_LEN]>,
}

impl ZipCryptoEncryptor {
    /// Creates an encryptor whose header carries `check_byte`.
    ///
    /// `check_byte` is normally `(crc32 >> 24) as u8`.
    pub fn new(password: &Password, check_byte: u8) -> Result<Self> {
        let mut header = [0u8; HEADER_LEN];
        random_bytes(&mut header[..HEADER_LEN - 1])?;
        header[HEADER_LEN - 1] = check_byte;
        Ok(Self::with_header(password, header))
    }

    /// Creates an encryptor with a fixed header instead of random bytes.
    pub fn with_header(password: &Password, header: [u8; HEADER_LEN]) -> Self {
        Self {
            keys: ZipCryptoKeys::from_password(password.as_bytes()),
            header: Some(header),
        }
    }

    fn emit_header(&mut self, output: &mut Vec<u8>) {
        if let Some(mut header) = self.header.take() {
            self.keys.encrypt_in_place(&mut header);
            output.extend_from_slice(&header);
        }
    }

    /// Encrypts `input`, appending ciphertext to `output`.
    pub fn update(&mut self, input: &[u8], output: &mut Vec<u8>) {
        self.emit_header(output);
        let start = output.len();
        output.extend_from_slice(input);
        self.keys.encrypt_in_place(&mut output[start..]);
    }

    /// Flushes the header if no payload byte was ever encrypted.
    pub fn finish(&mut self, output: &mut Vec<u8>) {
        self.emit_header(output);
    }
}

/// Streaming decryptor.
///
/// Consumes the 12-byte header first and fails with
/// [`Error::WrongPassword`] if its check byte matches none of the accepted
/// values.
#[derive(Debug)]
pub struct ZipCryptoDecryptor {
    keys: ZipCryptoKeys,
    header: Vec<u8>,
    accepted: Vec<u8>,
}

impl ZipCryptoDecryptor {
    /// Creates a decryptor accepting any of the given check bytes.
    ///
    /// Writers that use a data descriptor may store the high byte of the
    /// DOS time instead of the CRC, so readers usually pass both.
    pub fn new(password: &Password, accepted_check_bytes: &[u8]) -> Self {
        Self {
            keys: ZipCryptoKeys::from_password(password.as_bytes()),
            header: Vec::with_capacity(HEADER_LEN),
            accepted: accepted_check_bytes.to_vec(),
        }
    }

    /// Decrypts `input`, appending plaintext to `output`.
    pub fn update(&mut self, mut input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        if self.header.len() < HEADER_LEN {
            let take = (HEADER_LEN - self.header.len()).min(input.len());
            let start = self.header.len();
            self.header.extend_from_slice(&input[..take]);
            self.keys.decrypt_in_place(&mut self.header[start..]);
            input = &input[take..];
            if self.header.len() == HEADER_LEN {
                let check = self.header[HEADER_LEN - 1];
                if !self.accepted.contains(&check) {
                    return Err(Error::wrong_password(
                        PasswordDetectionMethod::HeaderCheckByte,
                    ));
                }
            }
        }
        let start = output.len();
        output.extend_from_slice(input);
        self.keys.decrypt_in_place(&mut output[start..]);
        Ok(())
    }

    /// Fails if the payload ended before the header was complete.
    pub fn finish(&mut self) -> Result<()> {
        if self.header.len() < HEADER_LEN {
            return Err(Error::InvalidFormat(format!(
                "encrypted payload shorter than its {}-byte header",
                HEADER_LEN
            )));
        }
        Ok(())
    }
}

/// Encrypts a whole payload with a random header.
pub fn encrypt(data: &[u8], password: &Password, crc32: u32) -> Result<Vec<u8>> {
    let mut enc = ZipCryptoEncryptor::new(password, (crc32 >> 24) as u8)?;
    let mut out = Vec::with_capacity(data.len() + HEADER_LEN);
    enc.update(data, &mut out);
    enc.finish(&mut out);
    Ok(out)
}

/// Decrypts a whole payload, checking the header against `crc32`.
pub fn decrypt(data: &[u8], password: &Password, crc32: u32) -> Result<Vec<u8>> {
    let mut dec = ZipCryptoDecryptor::new(password, &[(crc32 >> 24) as u8]);
    let mut out = Vec::with_capacity(data.len().saturating_sub(HEADER_LEN));
    dec.update(data, &mut out)?;
    dec.finish()?;
    Ok(out)
}
