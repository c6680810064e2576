//! CRC-32 computation.
//!
//! ZIP records a CRC-32 (IEEE 802.3, reflected polynomial `0xEDB88320`) of
//! every entry's uncompressed payload. Bulk hashing goes through
//! [`crc32fast`]; the single-byte [`crc32_update_byte`] used by the
//! ZipCrypto key schedule reads a table computed at compile time, so it is
//! immutable shared data with no initialization at run time.
//!
//! # Example
//!
//! ```rust
//! use zipwright::checksum::{Crc32, crc32};
//!
//! let mut crc = Crc32::new();
//! crc.update(b"Hello, ");
//! crc.update(b"World!");
//! assert_eq!(crc.value(), 0xEC4AC3D0);
//! assert_eq!(crc.len(), 13);
//!
//! assert_eq!(crc32(b"Hello, World!"), 0xEC4AC3D0);
//! ```

/// The reflected CRC-32 polynomial.
pub const CRC32_POLYNOMIAL: u32 = 0xEDB8_8320;

/// Byte-indexed CRC-32 lookup table.
pub static CRC32_TABLE: [u32; 256] = build_table();

const fn build_table() -> [u32; 256] {
    let mut table = [0u32; 256];
    let mut n = 0;
    while n < 256 {
        let mut c = n as u32;
        let mut k = 0;
        while k < 8 {
            c = if c & 1 != 0 {
                CRC32_POLYNOMIAL ^ (c >> 1)
            } else {
                c >> 1
            };
            k += 1;
        }
        table[n] = c;
        n += 1;
    }
    table
}

/// Folds one byte into a raw (non-inverted) CRC-32 register.
///
/// This is the bare table step without the pre/post inversion of a full
/// checksum, as required by the ZipCrypto key schedule.
#[inline]
pub fn crc32_update_byte(crc: u32, byte: u8) -> u32 {
    CRC32_TABLE[((crc ^ byte as u32) & 0xff) as usize] ^ (crc >> 8)
}

/// Computes the CRC-32 of `data` in one call.
pub fn crc32(data: &[u8]) -> u32 {
    crc32fast::hash(data)
}

/// Running CRC-32 of an entry payload, with the number of bytes it covers.
#[derive(Clone, Default)]
pub struct Crc32 {
    hasher: crc32fast::Hasher,
    len: u64,
}

impl Crc32 {
    /// Starts an empty checksum.
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds `data` into the checksum.
    pub fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
        self.len += data.len() as u64;
    }

    /// CRC-32 of everything folded in so far.
    pub fn value(&self) -> u32 {
        self.hasher.clone().finalize()
    }

    /// Number of bytes folded in so far.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Returns `true` if nothing has been folded in.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl std::fmt::Debug for Crc32 {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Crc32")
            .field("value", &format_args!("{:#010x}", self.value()))
            .field("len", &self.len)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_crc32_known_values() {
        assert_eq!(crc32(b""), 0);
        assert_eq!(crc32(b"123456789"), 0xCBF43926);
        assert_eq!(crc32(b"hello"), 0x3610A686);
    }

    #[test]
    fn test_table_matches_crc32fast() {
        // A full CRC is the table step wrapped in pre/post inversion.
        let data = b"The quick brown fox jumps over the lazy dog";
        let mut reg = 0xFFFF_FFFFu32;
        for &b in data.iter() {
            reg = crc32_update_byte(reg, b);
        }
        assert_eq!(!reg, crc32(data));
    }

    #[test]
    fn test_table_first_entries() {
        assert_eq!(CRC32_TABLE[0], 0);
        assert_eq!(CRC32_TABLE[1], 0x77073096);
        assert_eq!(CRC32_TABLE[255], 0x2D02EF8D);
    }

    #[test]
    fn test_accumulator_split_points() {
        let data = b"split anywhere, same checksum";
        for split in 0..=data.len() {
            let mut crc = Crc32::new();
            crc.update(&data[..split]);
            crc.update(&data[split..]);
            assert_eq!(crc.value(), crc32(data), "split at {split}");
            assert_eq!(crc.len(), data.len() as u64);
        }
    }

    #[test]
    fn test_empty_accumulator() {
        let crc = Crc32::new();
        assert!(crc.is_empty());
        assert_eq!(crc.value(), 0);
        assert!(format!("{crc:?}").contains("0x00000000"));
    }
}
