//! Transform stages of the payload pipeline.
//!
//! A stage consumes a chunk and appends its output to a buffer. Stages that
//! hold state across chunks (DEFLATE, AE-x partial blocks) release it in
//! [`Transform::finish`].

use std::io::Write;

use crate::checksum::Crc32;
use crate::crypto::zipcrypto::{ZipCryptoDecryptor, ZipCryptoEncryptor};
use crate::crypto::{AesStrength, EncryptionMethod, Password};
use crate::{Error, Result};

#[cfg(feature = "aes")]
use crate::crypto::aex::{AexDecryptor, AexEncryptor};

/// One step of a pipeline.
pub trait Transform {
    /// Processes a chunk, appending output to `out`.
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()>;

    /// Flushes buffered state once the input is exhausted.
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()>;
}

/// Running CRC-32 over the bytes passing through.
#[derive(Debug, Default, Clone)]
pub struct ChecksumStage {
    crc: Crc32,
}

impl ChecksumStage {
    /// Creates a fresh accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// CRC-32 of everything seen so far.
    pub fn value(&self) -> u32 {
        self.crc.value()
    }
}

impl Transform for ChecksumStage {
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.crc.update(input);
        out.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Running byte count of the bytes passing through.
#[derive(Debug, Default, Clone, Copy)]
pub struct CountStage {
    bytes: u64,
}

impl CountStage {
    /// Creates a zeroed counter.
    pub fn new() -> Self {
        Self::default()
    }

    /// Bytes seen so far.
    pub fn value(&self) -> u64 {
        self.bytes
    }
}

impl Transform for CountStage {
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.bytes += input.len() as u64;
        out.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Copies every chunk to a destination and passes it on unchanged.
pub struct MirrorStage<'a> {
    sink: &'a mut dyn Write,
}

impl<'a> MirrorStage<'a> {
    /// Mirrors into `sink`.
    pub fn new(sink: &'a mut dyn Write) -> Self {
        Self { sink }
    }
}

impl std::fmt::Debug for MirrorStage<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MirrorStage").finish_non_exhaustive()
    }
}

impl Transform for MirrorStage<'_> {
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.sink.write_all(input)?;
        out.extend_from_slice(input);
        Ok(())
    }

    fn finish(&mut self, _out: &mut Vec<u8>) -> Result<()> {
        self.sink.flush()?;
        Ok(())
    }
}

/// Raw DEFLATE compressor.
pub struct Compressor {
    #[cfg(feature = "deflate")]
    encoder: flate2::write::DeflateEncoder<Vec<u8>>,
}

impl std::fmt::Debug for Compressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Compressor").finish_non_exhaustive()
    }
}

impl Compressor {
    /// Creates a compressor at `level` (0..=9).
    #[cfg(feature = "deflate")]
    pub fn new(level: u32) -> Result<Self> {
        if level > 9 {
            return Err(Error::InvalidCompressionLevel { level });
        }
        Ok(Self {
            encoder: flate2::write::DeflateEncoder::new(
                Vec::new(),
                flate2::Compression::new(level),
            ),
        })
    }

    /// Creates a compressor at `level` (0..=9).
    #[cfg(not(feature = "deflate"))]
    pub fn new(_level: u32) -> Result<Self> {
        Err(Error::UnsupportedMethod {
            method_id: crate::format::method::DEFLATE,
        })
    }
}

impl Transform for Compressor {
    #[cfg(feature = "deflate")]
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.encoder.write_all(input)?;
        out.append(self.encoder.get_mut());
        Ok(())
    }

    #[cfg(feature = "deflate")]
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.encoder.try_finish()?;
        out.append(self.encoder.get_mut());
        Ok(())
    }

    #[cfg(not(feature = "deflate"))]
    fn update(&mut self, _input: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }

    #[cfg(not(feature = "deflate"))]
    fn finish(&mut self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Raw DEFLATE decompressor.
pub struct Decompressor {
    #[cfg(feature = "deflate")]
    decoder: flate2::write::DeflateDecoder<Vec<u8>>,
}

impl std::fmt::Debug for Decompressor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Decompressor").finish_non_exhaustive()
    }
}

impl Decompressor {
    /// Creates a decompressor.
    #[cfg(feature = "deflate")]
    pub fn new() -> Result<Self> {
        Ok(Self {
            decoder: flate2::write::DeflateDecoder::new(Vec::new()),
        })
    }

    /// Creates a decompressor.
    #[cfg(not(feature = "deflate"))]
    pub fn new() -> Result<Self> {
        Err(Error::UnsupportedMethod {
            method_id: crate::format::method::DEFLATE,
        })
    }
}

impl Transform for Decompressor {
    #[cfg(feature = "deflate")]
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        self.decoder
            .write_all(input)
            .map_err(|e| Error::InvalidFormat(format!("deflate stream: {}", e)))?;
        out.append(self.decoder.get_mut());
        Ok(())
    }

    #[cfg(feature = "deflate")]
    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        self.decoder
            .try_finish()
            .map_err(|e| Error::InvalidFormat(format!("deflate stream: {}", e)))?;
        out.append(self.decoder.get_mut());
        Ok(())
    }

    #[cfg(not(feature = "deflate"))]
    fn update(&mut self, _input: &[u8], _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }

    #[cfg(not(feature = "deflate"))]
    fn finish(&mut self, _out: &mut Vec<u8>) -> Result<()> {
        Ok(())
    }
}

/// Encrypting stage for either scheme.
#[derive(Debug)]
pub enum Encryptor {
    /// Traditional PKWARE cipher.
    ZipCrypto(ZipCryptoEncryptor),
    /// WinZip AE-x.
    #[cfg(feature = "aes")]
    Aex(AexEncryptor),
}

impl Encryptor {
    /// Creates the encryptor for `method`.
    ///
    /// `check_byte` is the last byte of the ZipCrypto header, the high byte
    /// of the entry's CRC-32.
    pub fn new(method: &EncryptionMethod, check_byte: u8) -> Result<Self> {
        match method {
            EncryptionMethod::ZipCrypto(password) => Ok(Self::ZipCrypto(
                ZipCryptoEncryptor::new(password, check_byte)?,
            )),
            #[cfg(feature = "aes")]
            EncryptionMethod::Aex { password, strength } => {
                Ok(Self::Aex(AexEncryptor::new(password, *strength)?))
            }
            #[cfg(not(feature = "aes"))]
            EncryptionMethod::Aex { .. } => Err(Error::UnsupportedFeature {
                feature: "AE-x encryption (enable the `aes` feature)",
            }),
        }
    }
}

impl Transform for Encryptor {
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::ZipCrypto(e) => e.update(input, out),
            #[cfg(feature = "aes")]
            Self::Aex(e) => e.update(input, out),
        }
        Ok(())
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::ZipCrypto(e) => e.finish(out),
            #[cfg(feature = "aes")]
            Self::Aex(e) => e.finish(out),
        }
        Ok(())
    }
}

/// Decrypting stage for either scheme.
#[derive(Debug)]
pub enum Decryptor {
    /// Traditional PKWARE cipher.
    ZipCrypto(ZipCryptoDecryptor),
    /// WinZip AE-x.
    #[cfg(feature = "aes")]
    Aex(AexDecryptor),
}

impl Decryptor {
    /// ZipCrypto decryptor accepting any of `check_bytes`.
    pub fn zip_crypto(password: &Password, check_bytes: &[u8]) -> Self {
        Self::ZipCrypto(ZipCryptoDecryptor::new(password, check_bytes))
    }

    /// AE-x decryptor for `strength`.
    #[cfg(feature = "aes")]
    pub fn aex(password: &Password, strength: AesStrength) -> Result<Self> {
        Ok(Self::Aex(AexDecryptor::new(password, strength)))
    }

    /// AE-x decryptor for `strength`.
    #[cfg(not(feature = "aes"))]
    pub fn aex(_password: &Password, _strength: AesStrength) -> Result<Self> {
        Err(Error::UnsupportedFeature {
            feature: "AE-x encryption (enable the `aes` feature)",
        })
    }
}

impl Transform for Decryptor {
    fn update(&mut self, input: &[u8], out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::ZipCrypto(d) => d.update(input, out),
            #[cfg(feature = "aes")]
            Self::Aex(d) => d.update(input, out),
        }
    }

    fn finish(&mut self, out: &mut Vec<u8>) -> Result<()> {
        match self {
            Self::ZipCrypto(d) => d.finish(),
            #[cfg(feature = "aes")]
            Self::Aex(d) => d.finish(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn run<T: Transform>(stage: &mut T, chunks: &[&[u8]]) -> Vec<u8> {
        let mut out = Vec::new();
        for chunk in chunks {
            stage.update(chunk, &mut out).unwrap();
        }
        stage.finish(&mut out).unwrap();
        out
    }

    #[test]
    fn test_checksum_passes_through() {
        let mut stage = ChecksumStage::new();
        let out = run(&mut stage, &[b"1234", b"56789"]);
        assert_eq!(out, b"123456789");
        assert_eq!(stage.value(), 0xCBF43926);
    }

    #[test]
    fn test_count_stage() {
        let mut stage = CountStage::new();
        run(&mut stage, &[b"abc", b"", b"de"]);
        assert_eq!(stage.value(), 5);
    }

    #[test]
    fn test_mirror_stage() {
        let mut sink = Vec::new();
        {
            let mut stage = MirrorStage::new(&mut sink);
            let out = run(&mut stage, &[b"ab", b"cd"]);
            assert_eq!(out, b"abcd");
        }
        assert_eq!(sink, b"abcd");
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_deflate_round_trip() {
        let data = b"abcabcabcabcabcabcabcabcabcabc".repeat(100);
        let mut compressor = Compressor::new(6).unwrap();
        let compressed = run(&mut compressor, &[&data[..1000], &data[1000..]]);
        assert!(compressed.len() < data.len());

        let mut decompressor = Decompressor::new().unwrap();
        let restored = run(&mut decompressor, &[&compressed[..3], &compressed[3..]]);
        assert_eq!(restored, data);
    }

    #[cfg(feature = "deflate")]
    #[test]
    fn test_invalid_level() {
        assert!(matches!(
            Compressor::new(10),
            Err(Error::InvalidCompressionLevel { level: 10 })
        ));
    }

    #[test]
    fn test_zipcrypto_stage_round_trip() {
        let password = Password::new("pw");
        let method = EncryptionMethod::ZipCrypto(password.clone());
        let mut enc = Encryptor::new(&method, 0xAB).unwrap();
        let sealed = run(&mut enc, &[b"secret ", b"payload"]);
        assert_eq!(sealed.len(), 12 + 14);

        let mut dec = Decryptor::zip_crypto(&password, &[0xAB]);
        assert_eq!(run(&mut dec, &[&sealed[..5], &sealed[5..]]), b"secret payload");
    }

    #[cfg(feature = "aes")]
    #[test]
    fn test_aex_stage_round_trip() {
        let password = Password::new("pw");
        let method = EncryptionMethod::aes_with_strength(password.clone(), AesStrength::Aes128);
        let mut enc = Encryptor::new(&method, 0).unwrap();
        let sealed = run(&mut enc, &[b"0123456789abcdefXYZ"]);
        assert_eq!(sealed.len(), 19 + 20);

        let mut dec = Decryptor::aex(&password, AesStrength::Aes128).unwrap();
        assert_eq!(run(&mut dec, &[&sealed]), b"0123456789abcdefXYZ");
    }
}
