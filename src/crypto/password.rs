//! Entry passwords.

use zeroize::Zeroizing;

/// A password for entry encryption and decryption.
///
/// ZIP feeds passwords to both ciphers as raw bytes with no declared
/// encoding. Strings are taken as UTF-8; [`Password::from_bytes`] accepts
/// anything else, such as a legacy codepage password. The buffer is wiped
/// on drop.
#[derive(Clone, PartialEq, Eq)]
pub struct Password {
    bytes: Zeroizing<Vec<u8>>,
}

impl Password {
    /// Creates a password from a string, encoded as UTF-8.
    pub fn new<S: Into<String>>(password: S) -> Self {
        Self {
            bytes: Zeroizing::new(password.into().into_bytes()),
        }
    }

    /// Creates a password from raw bytes.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self {
            bytes: Zeroizing::new(bytes.to_vec()),
        }
    }

    /// The bytes fed to the key schedule.
    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns `true` for the empty password.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Length in bytes.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }
}

impl std::fmt::Debug for Password {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Password").finish_non_exhaustive()
    }
}

impl From<&str> for Password {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Password {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&[u8]> for Password {
    fn from(bytes: &[u8]) -> Self {
        Self::from_bytes(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strings_are_utf8() {
        assert_eq!(Password::new("test").as_bytes(), b"test");
        assert_eq!(Password::new("пароль").len(), 12);
    }

    #[test]
    fn test_raw_bytes_kept_verbatim() {
        let raw = [0x83u8, 0x70, 0x83, 0x58];
        let password = Password::from_bytes(&raw);
        assert_eq!(password.as_bytes(), raw);
        assert_eq!(Password::from(&raw[..]), password);
    }

    #[test]
    fn test_debug_hides_secret() {
        let debug = format!("{:?}", Password::new("secret"));
        assert!(!debug.contains("secret"));
        assert!(!debug.contains('6'));
    }

    #[test]
    fn test_conversions() {
        let a: Password = "test".into();
        let b: Password = String::from("test").into();
        assert_eq!(a, b);
        assert!(!a.is_empty());
        assert!(Password::new("").is_empty());
    }
}
