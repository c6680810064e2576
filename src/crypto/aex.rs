//! WinZip AE-x authenticated encryption.
//!
//! Key material comes from PBKDF2-HMAC-SHA1 (1000 iterations) over the
//! password and a random salt, yielding `2 * key_len + 2` bytes: the AES
//! key, the HMAC key and a 2-byte password verifier. The payload is
//! encrypted with AES in counter mode, where the 16-byte counter block is
//! four little-endian 32-bit words incremented before each block (the
//! first block uses counter 1). HMAC-SHA1 runs over the ciphertext and its
//! first 10 bytes are appended as the authentication code.
//!
//! Stored layout: `salt | verifier | ciphertext | auth code`.

use aes::cipher::{BlockEncrypt, KeyInit};
use aes::{Aes128, Aes192, Aes256, Block};
use hmac::{Hmac, Mac};
use sha1::Sha1;
use zeroize::Zeroizing;

use crate::error::PasswordDetectionMethod;
use crate::{Error, Result};

use super::{AesStrength, Password, random_bytes};

type HmacSha1 = Hmac<Sha1>;

/// Length of the password verification value.
pub const PASSWORD_VERIFIER_LEN: usize = 2;

/// Length of the truncated HMAC-SHA1 authentication code.
pub const AUTH_CODE_LEN: usize = 10;

/// PBKDF2 iteration count.
pub const ITERATION_COUNT: u32 = 1000;

const BLOCK_SIZE: usize = 16;

enum BlockCipher {
    Aes128(Box<Aes128>),
    Aes192(Box<Aes192>),
    Aes256(Box<Aes256>),
}

impl BlockCipher {
    fn new(strength: AesStrength, key: &[u8]) -> Result<Self> {
        let invalid = |e: aes::cipher::InvalidLength| Error::CryptoError(e.to_string());
        Ok(match strength {
            AesStrength::Aes128 => Self::Aes128(Box::new(Aes128::new_from_slice(key).map_err(invalid)?)),
            AesStrength::Aes192 => Self::Aes192(Box::new(Aes192::new_from_slice(key).map_err(invalid)?)),
            AesStrength::Aes256 => Self::Aes256(Box::new(Aes256::new_from_slice(key).map_err(invalid)?)),
        })
    }

    fn encrypt_block(&self, block: &mut Block) {
        match self {
            Self::Aes128(c) => c.encrypt_block(block),
            Self::Aes192(c) => c.encrypt_block(block),
            Self::Aes256(c) => c.encrypt_block(block),
        }
    }
}

/// AES-CTR keystream with the AE-x little-endian word counter.
struct CtrKeystream {
    cipher: BlockCipher,
    counter: [u32; 4],
}

impl CtrKeystream {
    fn new(cipher: BlockCipher) -> Self {
        Self {
            cipher,
            counter: [0; 4],
        }
    }

    /// Increments word 0, carrying into words 1, 2 and 3.
    fn increment(&mut self) {
        for word in self.counter.iter_mut() {
            *word = word.wrapping_add(1);
            if *word != 0 {
                break;
            }
        }
    }

    fn next_block(&mut self) -> Block {
        self.increment();
        let mut bytes = [0u8; BLOCK_SIZE];
        for (chunk, word) in bytes.chunks_exact_mut(4).zip(self.counter.iter()) {
            chunk.copy_from_slice(&word.to_le_bytes());
        }
        let mut block = Block::from(bytes);
        self.cipher.encrypt_block(&mut block);
        block
    }

    /// XORs the keystream into `data`, one counter block per 16 bytes.
    ///
    /// A trailing partial block consumes a whole counter value, so callers
    /// only pass one at the end of the payload.
    fn apply(&mut self, data: &mut [u8]) {
        for chunk in data.chunks_mut(BLOCK_SIZE) {
            let ks = self.next_block();
            for (b, k) in chunk.iter_mut().zip(ks.iter()) {
                *b ^= k;
            }
        }
    }
}

/// Keys derived from a password and salt.
pub struct DerivedKeys {
    encryption: Zeroizing<Vec<u8>>,
    authentication: Zeroizing<Vec<u8>>,
    verifier: [u8; PASSWORD_VERIFIER_LEN],
}

impl std::fmt::Debug for DerivedKeys {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedKeys").finish_non_exhaustive()
    }
}

impl DerivedKeys {
    /// Returns the password verification value.
    pub fn verifier(&self) -> [u8; PASSWORD_VERIFIER_LEN] {
        self.verifier
    }
}

/// Derives the encryption key, authentication key and verifier.
pub fn derive_keys(password: &Password, salt: &[u8], strength: AesStrength) -> Result<DerivedKeys> {
    if salt.len() != strength.salt_len() {
        return Err(Error::CryptoError(format!(
            "salt length {} does not match AES-{} (expected {})",
            salt.len(),
            strength.key_len() * 8,
            strength.salt_len()
        )));
    }
    let key_len = strength.key_len();
    let mut derived = Zeroizing::new(vec![0u8; 2 * key_len + PASSWORD_VERIFIER_LEN]);
    pbkdf2::pbkdf2::<HmacSha1>(password.as_bytes(), salt, ITERATION_COUNT, &mut derived)
        .map_err(|e| Error::CryptoError(e.to_string()))?;
    let mut verifier = [0u8; PASSWORD_VERIFIER_LEN];
    verifier.copy_from_slice(&derived[2 * key_len..]);
    Ok(DerivedKeys {
        encryption: Zeroizing::new(derived[..key_len].to_vec()),
        authentication: Zeroizing::new(derived[key_len..2 * key_len].to_vec()),
        verifier,
    })
}

fn cipher_and_mac(keys: &DerivedKeys, strength: AesStrength) -> Result<(CtrKeystream, HmacSha1)> {
    let cipher = BlockCipher::new(strength, &keys.encryption)?;
    let mac = <HmacSha1 as Mac>::new_from_slice(&keys.authentication)
        .map_err(|e| Error::CryptoError(e.to_string()))?;
    Ok((CtrKeystream::new(cipher), mac))
}

/// Streaming AE-x encryptor.
///
/// Complete blocks are encrypted as input arrives; a final partial block
/// stays buffered until [`finish`](Self::finish), which also appends the
/// authentication code.
pub struct AexEncryptor {
    keystream: CtrKeystream,
    mac: HmacSha1,
    header: Option<Vec<u8>>,
    pending: Vec<u8>,
}

impl std::fmt::Debug for AexEncryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AexEncryptor")
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

impl AexEncryptor {
    /// Creates an encryptor with a fresh random salt.
    pub fn new(password: &Password, strength: AesStrength) -> Result<Self> {
        let mut salt = vec![0u8; strength.salt_len()];
        random_bytes(&mut salt)?;
        Self::with_salt(password, strength, &salt)
    }

    /// Creates an encryptor with a caller-chosen salt.
    pub fn with_salt(password: &Password, strength: AesStrength, salt: &[u8]) -> Result<Self> {
        let keys = derive_keys(password, salt, strength)?;
        let (keystream, mac) = cipher_and_mac(&keys, strength)?;
        let mut header = Vec::with_capacity(salt.len() + PASSWORD_VERIFIER_LEN);
        header.extend_from_slice(salt);
        header.extend_from_slice(&keys.verifier);
        Ok(Self {
            keystream,
            mac,
            header: Some(header),
            pending: Vec::with_capacity(BLOCK_SIZE),
        })
    }

    fn seal(&mut self, len: usize, output: &mut Vec<u8>) {
        let start = output.len();
        output.extend_from_slice(&self.pending[..len]);
        self.keystream.apply(&mut output[start..]);
        self.mac.update(&output[start..]);
        self.pending.drain(..len);
    }

    /// Encrypts `input`, appending whole ciphertext blocks to `output`.
    pub fn update(&mut self, input: &[u8], output: &mut Vec<u8>) {
        if let Some(header) = self.header.take() {
            output.extend_from_slice(&header);
        }
        self.pending.extend_from_slice(input);
        let full = self.pending.len() / BLOCK_SIZE * BLOCK_SIZE;
        if full > 0 {
            self.seal(full, output);
        }
    }

    /// Encrypts the buffered tail and appends the authentication code.
    pub fn finish(&mut self, output: &mut Vec<u8>) {
        if let Some(header) = self.header.take() {
            output.extend_from_slice(&header);
        }
        let rest = self.pending.len();
        if rest > 0 {
            self.seal(rest, output);
        }
        let code = self.mac.clone().finalize().into_bytes();
        output.extend_from_slice(&code[..AUTH_CODE_LEN]);
    }
}

/// Streaming AE-x decryptor.
///
/// The salt and verifier are consumed first; a mismatching verifier fails
/// with [`Error::WrongPassword`]. The last 10 bytes of the stream are held
/// back as the authentication code and compared in constant time by
/// [`finish`](Self::finish).
pub struct AexDecryptor {
    password: Password,
    strength: AesStrength,
    header: Vec<u8>,
    state: Option<(CtrKeystream, HmacSha1)>,
    held: Vec<u8>,
}

impl std::fmt::Debug for AexDecryptor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AexDecryptor")
            .field("strength", &self.strength)
            .field("held", &self.held.len())
            .finish_non_exhaustive()
    }
}

impl AexDecryptor {
    /// Creates a decryptor for the given key strength.
    pub fn new(password: &Password, strength: AesStrength) -> Self {
        Self {
            password: password.clone(),
            strength,
            header: Vec::with_capacity(strength.salt_len() + PASSWORD_VERIFIER_LEN),
            state: None,
            held: Vec::new(),
        }
    }

    fn header_len(&self) -> usize {
        self.strength.salt_len() + PASSWORD_VERIFIER_LEN
    }

    fn open(&mut self) -> Result<()> {
        let salt_len = self.strength.salt_len();
        let keys = derive_keys(&self.password, &self.header[..salt_len], self.strength)?;
        if keys.verifier[..] != self.header[salt_len..] {
            return Err(Error::wrong_password(
                PasswordDetectionMethod::VerificationValue,
            ));
        }
        self.state = Some(cipher_and_mac(&keys, self.strength)?);
        Ok(())
    }

    /// Decrypts `input`, appending plaintext blocks to `output`.
    pub fn update(&mut self, mut input: &[u8], output: &mut Vec<u8>) -> Result<()> {
        let header_len = self.header_len();
        if self.header.len() < header_len {
            let take = (header_len - self.header.len()).min(input.len());
            self.header.extend_from_slice(&input[..take]);
            input = &input[take..];
            if self.header.len() < header_len {
                return Ok(());
            }
            self.open()?;
        }
        self.held.extend_from_slice(input);
        let available = self.held.len().saturating_sub(AUTH_CODE_LEN);
        let full = available / BLOCK_SIZE * BLOCK_SIZE;
        if full > 0 {
            self.unseal(full, output)?;
        }
        Ok(())
    }

    fn unseal(&mut self, len: usize, output: &mut Vec<u8>) -> Result<()> {
        let (keystream, mac) = self
            .state
            .as_mut()
            .ok_or_else(|| Error::CryptoError("decryptor used before key setup".into()))?;
        mac.update(&self.held[..len]);
        let start = output.len();
        output.extend_from_slice(&self.held[..len]);
        keystream.apply(&mut output[start..]);
        self.held.drain(..len);
        Ok(())
    }

    /// Decrypts the tail and verifies the authentication code.
    pub fn finish(&mut self, output: &mut Vec<u8>) -> Result<()> {
        if self.state.is_none() || self.held.len() < AUTH_CODE_LEN {
            return Err(Error::InvalidFormat(
                "AE-x payload shorter than its salt, verifier and authentication code".into(),
            ));
        }
        let rest = self.held.len() - AUTH_CODE_LEN;
        if rest > 0 {
            self.unseal(rest, output)?;
        }
        let (_, mac) = self
            .state
            .as_ref()
            .ok_or_else(|| Error::CryptoError("decryptor used before key setup".into()))?;
        let code = mac.clone().finalize().into_bytes();
        if !constant_time_eq::constant_time_eq(&code[..AUTH_CODE_LEN], &self.held) {
            return Err(Error::AuthenticationFailed {
                entry_index: None,
                entry_name: None,
            });
        }
        Ok(())
    }
}

/// Encrypts a whole payload with a random salt.
pub fn encrypt(data: &[u8], password: &Password, strength: AesStrength) -> Result<Vec<u8>> {
    let mut enc = AexEncryptor::new(password, strength)?;
    let mut out = Vec::with_capacity(data.len() + strength.overhead() as usize);
    enc.update(data, &mut out);
    enc.finish(&mut out);
    Ok(out)
}

/// Decrypts and authenticates a whole payload.
///
/// Plaintext is returned only after the authentication code matched.
pub fn decrypt(data: &[u8], password: &Password, strength: AesStrength) -> Result<Vec<u8>> {
    let mut dec = AexDecryptor::new(password, strength);
    let mut out = Vec::with_capacity(data.len());
    dec.update(data, &mut out)?;
    dec.finish(&mut out)?;
    Ok(out)
}
