//! Entry encryption.
//!
//! Two schemes are supported:
//!
//! - [`zipcrypto`]: the traditional PKWARE stream cipher. Weak, but readable
//!   by every ZIP tool.
//! - [`aex`]: WinZip AE-2 (AES-CTR with HMAC-SHA1 authentication and
//!   PBKDF2 key derivation). Requires the `aes` feature.
//!
//! A cipher state is created per entry and never shared: each entry gets
//! its own random header or salt.

mod password;

#[cfg(feature = "aes")]
#[cfg_attr(docsrs, doc(cfg(feature = "aes")))]
pub mod aex;
pub mod zipcrypto;

pub use password::Password;

use crate::{Error, Result};

/// AES key strength of an AE-x entry.
///
/// The numeric code is what the AE-x extra field stores.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AesStrength {
    /// AES-128 (code 1).
    Aes128,
    /// AES-192 (code 2).
    Aes192,
    /// AES-256 (code 3).
    #[default]
    Aes256,
}

impl AesStrength {
    /// Parses the extra-field strength code.
    pub fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::Aes128),
            2 => Some(Self::Aes192),
            3 => Some(Self::Aes256),
            _ => None,
        }
    }

    /// Returns the extra-field strength code.
    pub fn code(self) -> u8 {
        match self {
            Self::Aes128 => 1,
            Self::Aes192 => 2,
            Self::Aes256 => 3,
        }
    }

    /// AES key length in bytes.
    pub fn key_len(self) -> usize {
        match self {
            Self::Aes128 => 16,
            Self::Aes192 => 24,
            Self::Aes256 => 32,
        }
    }

    /// Salt length in bytes: `4 + 4 * code`.
    pub fn salt_len(self) -> usize {
        4 + 4 * self.code() as usize
    }

    /// Bytes added to the payload: salt, verifier and authentication code.
    pub fn overhead(self) -> u64 {
        (self.salt_len() + 2 + 10) as u64
    }
}

/// How an entry payload is encrypted.
#[derive(Clone)]
pub enum EncryptionMethod {
    /// Traditional PKWARE encryption.
    ZipCrypto(Password),
    /// WinZip AE-2 with the given key strength.
    Aex {
        /// The password.
        password: Password,
        /// AES key strength.
        strength: AesStrength,
    },
}

impl std::fmt::Debug for EncryptionMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ZipCrypto(_) => f.write_str("ZipCrypto"),
            Self::Aex { strength, .. } => f.debug_struct("Aex").field("strength", strength).finish(),
        }
    }
}

impl EncryptionMethod {
    /// ZipCrypto with the given password.
    pub fn zip_crypto(password: impl Into<Password>) -> Self {
        Self::ZipCrypto(password.into())
    }

    /// AE-2 with AES-256.
    pub fn aes(password: impl Into<Password>) -> Self {
        Self::Aex {
            password: password.into(),
            strength: AesStrength::Aes256,
        }
    }

    /// AE-2 with an explicit key strength.
    pub fn aes_with_strength(password: impl Into<Password>, strength: AesStrength) -> Self {
        Self::Aex {
            password: password.into(),
            strength,
        }
    }

    /// Returns the password.
    pub fn password(&self) -> &Password {
        match self {
            Self::ZipCrypto(password) => password,
            Self::Aex { password, .. } => password,
        }
    }

    /// Returns the AES strength for AE-x, `None` for ZipCrypto.
    pub fn aes_strength(&self) -> Option<AesStrength> {
        match self {
            Self::ZipCrypto(_) => None,
            Self::Aex { strength, .. } => Some(*strength),
        }
    }

    /// Bytes the scheme adds on top of the (compressed) payload.
    pub fn overhead(&self) -> u64 {
        match self {
            Self::ZipCrypto(_) => zipcrypto::HEADER_LEN as u64,
            Self::Aex { strength, .. } => strength.overhead(),
        }
    }
}

/// Fills `buf` from the operating system's secure random source.
pub(crate) fn random_bytes(buf: &mut [u8]) -> Result<()> {
    getrandom::getrandom(buf).map_err(|e| Error::CryptoError(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strength_parameters() {
        let expected = [(1u8, 16usize, 8usize, 20u64), (2, 24, 12, 24), (3, 32, 16, 28)];
        for (code, key, salt, overhead) in expected {
            let s = AesStrength::from_code(code).unwrap();
            assert_eq!(s.code(), code);
            assert_eq!(s.key_len(), key);
            assert_eq!(s.salt_len(), salt);
            assert_eq!(s.overhead(), overhead);
        }
        assert_eq!(AesStrength::from_code(0), None);
        assert_eq!(AesStrength::from_code(4), None);
    }

    #[test]
    fn test_method_overhead() {
        assert_eq!(EncryptionMethod::zip_crypto("pw").overhead(), 12);
        assert_eq!(EncryptionMethod::aes("pw").overhead(), 28);
        assert_eq!(
            EncryptionMethod::aes_with_strength("pw", AesStrength::Aes128).overhead(),
            20
        );
    }

    #[test]
    fn test_debug_hides_password() {
        let method = EncryptionMethod::aes("topsecret");
        assert!(!format!("{:?}", method).contains("topsecret"));
    }

    #[test]
    fn test_random_bytes_fills_buffer() {
        let mut a = [0u8; 32];
        let mut b = [0u8; 32];
        random_bytes(&mut a).unwrap();
        random_bytes(&mut b).unwrap();
        assert_ne!(a, b);
    }
}
