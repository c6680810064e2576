//! ZIP format constants, fixed records and low-level parsing utilities.
//!
//! All multi-byte integers in a ZIP archive are little-endian.
//!
//! | Record | Fixed size | Signature |
//! |---|---|---|
//! | Local file header | 30 + name + extra | `0x04034b50` |
//! | Data descriptor | 12/16/20/24 | `0x08074b50` (optional) |
//! | Central directory header | 46 + name + extra + comment | `0x02014b50` |
//! | End of central directory | 22 + comment | `0x06054b50` |
//! | ZIP64 end of central directory | 56 | `0x06064b50` |
//! | ZIP64 end of central directory locator | 20 | `0x07064b50` |

pub mod extra_field;
pub mod reader;
pub mod records;

/// Record signatures.
pub mod signature {
    /// Local file header.
    pub const LOCAL_FILE_HEADER: u32 = 0x0403_4b50;
    /// Data descriptor (optional in front of the trailer).
    pub const DATA_DESCRIPTOR: u32 = 0x0807_4b50;
    /// Central directory file header.
    pub const CENTRAL_DIRECTORY_HEADER: u32 = 0x0201_4b50;
    /// End of central directory record.
    pub const END_OF_CENTRAL_DIRECTORY: u32 = 0x0605_4b50;
    /// ZIP64 end of central directory record.
    pub const ZIP64_END_OF_CENTRAL_DIRECTORY: u32 = 0x0606_4b50;
    /// ZIP64 end of central directory locator.
    pub const ZIP64_END_LOCATOR: u32 = 0x0706_4b50;
}

/// Extra field header ids.
pub mod extra_id {
    /// ZIP64 extended information.
    pub const ZIP64: u16 = 0x0001;
    /// NTFS timestamps.
    pub const NTFS: u16 = 0x000a;
    /// Unix (PKWARE) timestamps and ids.
    pub const UNIX: u16 = 0x000d;
    /// Extended timestamp.
    pub const EXTENDED_TIMESTAMP: u16 = 0x5455;
    /// Info-ZIP Unicode path.
    pub const UNICODE_PATH: u16 = 0x7075;
    /// Info-ZIP Unix ids (type 2).
    pub const UNIX2: u16 = 0x7855;
    /// WinZip AE-x parameters.
    pub const AEX: u16 = 0x9901;
}

/// General-purpose flag bits.
pub mod flags {
    /// Payload is encrypted.
    pub const ENCRYPTED: u16 = 1 << 0;
    /// CRC and sizes follow the payload in a data descriptor.
    pub const DATA_DESCRIPTOR: u16 = 1 << 3;
    /// Name and comment are UTF-8.
    pub const UTF8: u16 = 1 << 11;
}

/// Compression method ids.
pub mod method {
    /// No compression.
    pub const STORED: u16 = 0;
    /// Raw DEFLATE.
    pub const DEFLATE: u16 = 8;
    /// Placeholder method of AE-x entries; the real one is in the extra field.
    pub const AEX: u16 = 99;
}

/// "Version needed to extract" and "version made by" values.
pub mod version {
    /// Baseline.
    pub const DEFAULT: u16 = 10;
    /// Deflate, directories and Unicode path fields.
    pub const DEFLATE: u16 = 20;
    /// ZIP64 structures.
    pub const ZIP64: u16 = 45;
    /// AE-x encryption.
    pub const AEX: u16 = 51;
    /// Version made by: MS-DOS host, specification 6.3.
    pub const MADE_BY: u16 = 0x003F;
    /// Host bits OR'ed into "made by" for Unix metadata.
    pub const MADE_BY_UNIX: u16 = 0x0300;
}

/// Sentinel stored in a 32-bit field whose value lives in the ZIP64 field.
pub const U32_SENTINEL: u32 = 0xFFFF_FFFF;

/// Sentinel stored in a 16-bit field whose value lives in the ZIP64 record.
pub const U16_SENTINEL: u16 = 0xFFFF;

/// Largest value a 32-bit size or offset field holds literally.
pub const U32_LIMIT: u64 = U32_SENTINEL as u64;

/// Largest entry count the classic end record holds literally.
pub const U16_LIMIT: u64 = U16_SENTINEL as u64;

/// Clamps a 64-bit value into a 32-bit field, substituting the sentinel.
#[inline]
pub fn clamp_u32(value: u64) -> u32 {
    if value > U32_LIMIT {
        U32_SENTINEL
    } else {
        value as u32
    }
}

/// Clamps a count into a 16-bit field, substituting the sentinel.
#[inline]
pub fn clamp_u16(value: u64) -> u16 {
    if value > U16_LIMIT {
        U16_SENTINEL
    } else {
        value as u16
    }
}

/// Converts the length of a variable-size part into its 16-bit length
/// field, failing instead of wrapping.
pub fn length_u16(len: usize, structure: &'static str, part: &'static str) -> crate::Result<u16> {
    u16::try_from(len).map_err(|_| {
        crate::Error::InvalidFormat(format!(
            "{} of {} bytes does not fit the {} length field",
            part, len, structure
        ))
    })
}

/// Little-endian append helpers for building records in memory.
pub(crate) trait PutLe {
    fn put_u8(&mut self, v: u8);
    fn put_u16(&mut self, v: u16);
    fn put_u32(&mut self, v: u32);
    fn put_u64(&mut self, v: u64);
}

impl PutLe for Vec<u8> {
    fn put_u8(&mut self, v: u8) {
        self.push(v);
    }

    fn put_u16(&mut self, v: u16) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u32(&mut self, v: u32) {
        self.extend_from_slice(&v.to_le_bytes());
    }

    fn put_u64(&mut self, v: u64) {
        self.extend_from_slice(&v.to_le_bytes());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clamp_boundaries() {
        assert_eq!(clamp_u32(0xFFFF_FFFE), 0xFFFF_FFFE);
        assert_eq!(clamp_u32(0xFFFF_FFFF), 0xFFFF_FFFF);
        assert_eq!(clamp_u32(0x1_0000_0000), U32_SENTINEL);
        assert_eq!(clamp_u16(65_535), 0xFFFF);
        assert_eq!(clamp_u16(65_536), U16_SENTINEL);
        assert_eq!(clamp_u16(3), 3);
    }

    #[test]
    fn test_length_u16() {
        assert_eq!(length_u16(65_535, "local file header", "name").unwrap(), 65_535);
        let err = length_u16(65_536, "local file header", "extra field").unwrap_err();
        assert!(matches!(err, crate::Error::InvalidFormat(ref m) if m.contains("extra field")));
    }

    #[test]
    fn test_signatures_are_pk() {
        for sig in [
            signature::LOCAL_FILE_HEADER,
            signature::DATA_DESCRIPTOR,
            signature::CENTRAL_DIRECTORY_HEADER,
            signature::END_OF_CENTRAL_DIRECTORY,
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY,
            signature::ZIP64_END_LOCATOR,
        ] {
            assert_eq!(&sig.to_le_bytes()[..2], b"PK");
        }
    }
}
