//! Fixed-layout ZIP records.
//!
//! Each record knows its serialized length, how to write itself and how to
//! read itself back. Size and offset fields are stored exactly as they
//! appear on disk (32-bit, possibly a sentinel); resolving ZIP64 values is
//! the caller's job.

use std::io::{Read, Write};

use crate::{Error, Result};

use super::reader::{SliceReader, read_bytes};
use super::{PutLe, length_u16, signature};

fn read_fixed<R: Read + ?Sized, const N: usize>(
    r: &mut R,
    structure: &'static str,
    offset: u64,
) -> Result<[u8; N]> {
    let mut buf = [0u8; N];
    r.read_exact(&mut buf)
        .map_err(|e| Error::truncated_or_io(e, structure, offset))?;
    Ok(buf)
}

fn read_var<R: Read + ?Sized>(
    r: &mut R,
    len: usize,
    structure: &'static str,
    offset: u64,
) -> Result<Vec<u8>> {
    read_bytes(r, len).map_err(|e| Error::truncated_or_io(e, structure, offset))
}

fn check_signature(actual: u32, expected: u32, structure: &'static str, offset: u64) -> Result<()> {
    if actual != expected {
        return Err(Error::SignatureMismatch {
            structure,
            offset,
            expected,
            actual,
        });
    }
    Ok(())
}

fn field<T>(value: Option<T>, structure: &'static str, offset: u64) -> Result<T> {
    value.ok_or(Error::Truncated { structure, offset })
}

/// Local file header (`PK\x03\x04`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LocalFileHeader {
    /// Version needed to extract.
    pub version_needed: u16,
    /// General-purpose flags.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// DOS time.
    pub last_mod_time: u16,
    /// DOS date.
    pub last_mod_date: u16,
    /// CRC-32 or 0.
    pub crc32: u32,
    /// Compressed size, possibly a sentinel.
    pub compressed_size: u32,
    /// Uncompressed size, possibly a sentinel.
    pub uncompressed_size: u32,
    /// Raw name bytes.
    pub file_name: Vec<u8>,
    /// Raw extra field block.
    pub extra_field: Vec<u8>,
}

impl LocalFileHeader {
    /// Length without name and extra field.
    pub const FIXED_LEN: usize = 30;
    const NAME: &'static str = "local file header";

    /// Serialized length.
    pub fn byte_length(&self) -> usize {
        Self::FIXED_LEN + self.file_name.len() + self.extra_field.len()
    }

    /// Serializes the header.
    ///
    /// Fails if the name or the extra field block overflows its length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let name_len = length_u16(self.file_name.len(), Self::NAME, "file name")?;
        let extra_len = length_u16(self.extra_field.len(), Self::NAME, "extra field")?;
        let mut out = Vec::with_capacity(self.byte_length());
        out.put_u32(signature::LOCAL_FILE_HEADER);
        out.put_u16(self.version_needed);
        out.put_u16(self.flags);
        out.put_u16(self.method);
        out.put_u16(self.last_mod_time);
        out.put_u16(self.last_mod_date);
        out.put_u32(self.crc32);
        out.put_u32(self.compressed_size);
        out.put_u32(self.uncompressed_size);
        out.put_u16(name_len);
        out.put_u16(extra_len);
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        Ok(out)
    }

    /// Reads a header whose signature starts at `offset`.
    pub fn read_from<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let fixed: [u8; Self::FIXED_LEN] = read_fixed(r, Self::NAME, offset)?;
        let mut s = SliceReader::new(&fixed);
        let structure = Self::NAME;
        macro_rules! t {
            ($value:expr) => {
                field($value, structure, offset)
            };
        }
        check_signature(t!(s.u32())?, signature::LOCAL_FILE_HEADER, Self::NAME, offset)?;
        let mut header = Self {
            version_needed: t!(s.u16())?,
            flags: t!(s.u16())?,
            method: t!(s.u16())?,
            last_mod_time: t!(s.u16())?,
            last_mod_date: t!(s.u16())?,
            crc32: t!(s.u32())?,
            compressed_size: t!(s.u32())?,
            uncompressed_size: t!(s.u32())?,
            ..Default::default()
        };
        let name_len = t!(s.u16())? as usize;
        let extra_len = t!(s.u16())? as usize;
        header.file_name = read_var(r, name_len, Self::NAME, offset)?;
        header.extra_field = read_var(r, extra_len, Self::NAME, offset)?;
        Ok(header)
    }
}

/// Central directory file header (`PK\x01\x02`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CentralDirectoryHeader {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// General-purpose flags.
    pub flags: u16,
    /// Compression method.
    pub method: u16,
    /// DOS time.
    pub last_mod_time: u16,
    /// DOS date.
    pub last_mod_date: u16,
    /// CRC-32 or 0.
    pub crc32: u32,
    /// Compressed size, possibly a sentinel.
    pub compressed_size: u32,
    /// Uncompressed size, possibly a sentinel.
    pub uncompressed_size: u32,
    /// Disk number where the entry starts, possibly a sentinel.
    pub disk_start: u16,
    /// Internal file attributes.
    pub internal_attributes: u16,
    /// External file attributes.
    pub external_attributes: u32,
    /// Offset of the local header, possibly a sentinel.
    pub local_header_offset: u32,
    /// Raw name bytes.
    pub file_name: Vec<u8>,
    /// Raw extra field block.
    pub extra_field: Vec<u8>,
    /// Entry comment.
    pub comment: Vec<u8>,
}

impl CentralDirectoryHeader {
    /// Length without name, extra field and comment.
    pub const FIXED_LEN: usize = 46;
    const NAME: &'static str = "central directory header";

    /// Serialized length.
    pub fn byte_length(&self) -> usize {
        Self::FIXED_LEN + self.file_name.len() + self.extra_field.len() + self.comment.len()
    }

    /// Serializes the header.
    ///
    /// Fails if the name, extra field block or comment overflows its
    /// length field.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let name_len = length_u16(self.file_name.len(), Self::NAME, "file name")?;
        let extra_len = length_u16(self.extra_field.len(), Self::NAME, "extra field")?;
        let comment_len = length_u16(self.comment.len(), Self::NAME, "comment")?;
        let mut out = Vec::with_capacity(self.byte_length());
        out.put_u32(signature::CENTRAL_DIRECTORY_HEADER);
        out.put_u16(self.version_made_by);
        out.put_u16(self.version_needed);
        out.put_u16(self.flags);
        out.put_u16(self.method);
        out.put_u16(self.last_mod_time);
        out.put_u16(self.last_mod_date);
        out.put_u32(self.crc32);
        out.put_u32(self.compressed_size);
        out.put_u32(self.uncompressed_size);
        out.put_u16(name_len);
        out.put_u16(extra_len);
        out.put_u16(comment_len);
        out.put_u16(self.disk_start);
        out.put_u16(self.internal_attributes);
        out.put_u32(self.external_attributes);
        out.put_u32(self.local_header_offset);
        out.extend_from_slice(&self.file_name);
        out.extend_from_slice(&self.extra_field);
        out.extend_from_slice(&self.comment);
        Ok(out)
    }

    /// Reads a header whose signature starts at `offset`.
    pub fn read_from<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let fixed: [u8; Self::FIXED_LEN] = read_fixed(r, Self::NAME, offset)?;
        let mut s = SliceReader::new(&fixed);
        let structure = Self::NAME;
        macro_rules! t {
            ($value:expr) => {
                field($value, structure, offset)
            };
        }
        check_signature(
            t!(s.u32())?,
            signature::CENTRAL_DIRECTORY_HEADER,
            Self::NAME,
            offset,
        )?;
        let mut header = Self {
            version_made_by: t!(s.u16())?,
            version_needed: t!(s.u16())?,
            flags: t!(s.u16())?,
            method: t!(s.u16())?,
            last_mod_time: t!(s.u16())?,
            last_mod_date: t!(s.u16())?,
            crc32: t!(s.u32())?,
            compressed_size: t!(s.u32())?,
            uncompressed_size: t!(s.u32())?,
            ..Default::default()
        };
        let name_len = t!(s.u16())? as usize;
        let extra_len = t!(s.u16())? as usize;
        let comment_len = t!(s.u16())? as usize;
        header.disk_start = t!(s.u16())?;
        header.internal_attributes = t!(s.u16())?;
        header.external_attributes = t!(s.u32())?;
        header.local_header_offset = t!(s.u32())?;
        header.file_name = read_var(r, name_len, Self::NAME, offset)?;
        header.extra_field = read_var(r, extra_len, Self::NAME, offset)?;
        header.comment = read_var(r, comment_len, Self::NAME, offset)?;
        Ok(header)
    }
}

/// Classic end of central directory record (`PK\x05\x06`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndOfCentralDirectory {
    /// Number of this disk.
    pub disk_number: u16,
    /// Disk where the central directory starts.
    pub central_directory_disk: u16,
    /// Entries on this disk, possibly a sentinel.
    pub disk_entries: u16,
    /// Total entries, possibly a sentinel.
    pub total_entries: u16,
    /// Central directory size, possibly a sentinel.
    pub central_directory_size: u32,
    /// Central directory offset, possibly a sentinel.
    pub central_directory_offset: u32,
    /// Archive comment.
    pub comment: Vec<u8>,
}

impl EndOfCentralDirectory {
    /// Length without the comment.
    pub const FIXED_LEN: usize = 22;
    const NAME: &'static str = "end of central directory record";

    /// Serialized length.
    pub fn byte_length(&self) -> usize {
        Self::FIXED_LEN + self.comment.len()
    }

    /// Serializes the record. Fails if the comment is too long.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        let comment_len = length_u16(self.comment.len(), Self::NAME, "comment")?;
        let mut out = Vec::with_capacity(self.byte_length());
        out.put_u32(signature::END_OF_CENTRAL_DIRECTORY);
        out.put_u16(self.disk_number);
        out.put_u16(self.central_directory_disk);
        out.put_u16(self.disk_entries);
        out.put_u16(self.total_entries);
        out.put_u32(self.central_directory_size);
        out.put_u32(self.central_directory_offset);
        out.put_u16(comment_len);
        out.extend_from_slice(&self.comment);
        Ok(out)
    }

    /// Reads the fixed part and returns it with the declared comment length.
    ///
    /// The comment itself is left unread so a locator can validate the
    /// length against the end of the input first.
    pub fn parse_fixed(buf: &[u8], offset: u64) -> Result<(Self, usize)> {
        let mut s = SliceReader::new(buf);
        let structure = Self::NAME;
        macro_rules! t {
            ($value:expr) => {
                field($value, structure, offset)
            };
        }
        check_signature(
            t!(s.u32())?,
            signature::END_OF_CENTRAL_DIRECTORY,
            Self::NAME,
            offset,
        )?;
        let record = Self {
            disk_number: t!(s.u16())?,
            central_directory_disk: t!(s.u16())?,
            disk_entries: t!(s.u16())?,
            total_entries: t!(s.u16())?,
            central_directory_size: t!(s.u32())?,
            central_directory_offset: t!(s.u32())?,
            comment: Vec::new(),
        };
        let comment_len = t!(s.u16())? as usize;
        Ok((record, comment_len))
    }
}

/// ZIP64 end of central directory record (`PK\x06\x06`).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Zip64EndOfCentralDirectory {
    /// Version made by.
    pub version_made_by: u16,
    /// Version needed to extract.
    pub version_needed: u16,
    /// Number of this disk.
    pub disk_number: u32,
    /// Disk where the central directory starts.
    pub central_directory_disk: u32,
    /// Entries on this disk.
    pub disk_entries: u64,
    /// Total entries.
    pub total_entries: u64,
    /// Central directory size.
    pub central_directory_size: u64,
    /// Central directory offset.
    pub central_directory_offset: u64,
    /// Extensible data sector.
    pub extensible_data: Vec<u8>,
}

impl Zip64EndOfCentralDirectory {
    /// Length without the extensible data.
    pub const FIXED_LEN: usize = 56;
    /// Bytes not counted by the record-size field (signature and the field itself).
    const UNCOUNTED_LEN: u64 = 12;
    const NAME: &'static str = "ZIP64 end of central directory record";

    /// Serialized length.
    pub fn byte_length(&self) -> usize {
        Self::FIXED_LEN + self.extensible_data.len()
    }

    /// Serializes the record.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_length());
        out.put_u32(signature::ZIP64_END_OF_CENTRAL_DIRECTORY);
        out.put_u64(self.byte_length() as u64 - Self::UNCOUNTED_LEN);
        out.put_u16(self.version_made_by);
        out.put_u16(self.version_needed);
        out.put_u32(self.disk_number);
        out.put_u32(self.central_directory_disk);
        out.put_u64(self.disk_entries);
        out.put_u64(self.total_entries);
        out.put_u64(self.central_directory_size);
        out.put_u64(self.central_directory_offset);
        out.extend_from_slice(&self.extensible_data);
        out
    }

    /// Reads a record whose signature starts at `offset`.
    pub fn read_from<R: Read + ?Sized>(r: &mut R, offset: u64) -> Result<Self> {
        let fixed: [u8; Self::FIXED_LEN] = read_fixed(r, Self::NAME, offset)?;
        let mut s = SliceReader::new(&fixed);
        let structure = Self::NAME;
        macro_rules! t {
            ($value:expr) => {
                field($value, structure, offset)
            };
        }
        check_signature(
            t!(s.u32())?,
            signature::ZIP64_END_OF_CENTRAL_DIRECTORY,
            Self::NAME,
            offset,
        )?;
        let record_size = t!(s.u64())?;
        let mut record = Self {
            version_made_by: t!(s.u16())?,
            version_needed: t!(s.u16())?,
            disk_number: t!(s.u32())?,
            central_directory_disk: t!(s.u32())?,
            disk_entries: t!(s.u64())?,
            total_entries: t!(s.u64())?,
            central_directory_size: t!(s.u64())?,
            central_directory_offset: t!(s.u64())?,
            extensible_data: Vec::new(),
        };
        let fixed_counted = (Self::FIXED_LEN as u64) - Self::UNCOUNTED_LEN;
        let extra = record_size.checked_sub(fixed_counted).ok_or_else(|| {
            Error::corrupt_header(offset, format!("ZIP64 record size {} too small", record_size))
        })?;
        if extra > u16::MAX as u64 {
            return Err(Error::corrupt_header(
                offset,
                format!("ZIP64 extensible data of {} bytes", extra),
            ));
        }
        record.extensible_data = read_var(r, extra as usize, Self::NAME, offset)?;
        Ok(record)
    }
}

/// ZIP64 end of central directory locator (`PK\x06\x07`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Zip64EndLocator {
    /// Disk holding the ZIP64 end record.
    pub end_record_disk: u32,
    /// Offset of the ZIP64 end record.
    pub end_record_offset: u64,
    /// Total number of disks.
    pub total_disks: u32,
}

impl Zip64EndLocator {
    /// Serialized length.
    pub const LEN: usize = 20;
    const NAME: &'static str = "ZIP64 end of central directory locator";

    /// Serializes the locator.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(Self::LEN);
        out.put_u32(signature::ZIP64_END_LOCATOR);
        out.put_u32(self.end_record_disk);
        out.put_u64(self.end_record_offset);
        out.put_u32(self.total_disks);
        out
    }

    /// Parses a locator from a 20-byte buffer.
    ///
    /// Returns `Ok(None)` if the signature does not match, which simply
    /// means the archive has no ZIP64 end structures.
    pub fn parse(buf: &[u8], offset: u64) -> Result<Option<Self>> {
        let mut s = SliceReader::new(buf);
        let structure = Self::NAME;
        macro_rules! t {
            ($value:expr) => {
                field($value, structure, offset)
            };
        }
        if t!(s.u32())? != signature::ZIP64_END_LOCATOR {
            return Ok(None);
        }
        Ok(Some(Self {
            end_record_disk: t!(s.u32())?,
            end_record_offset: t!(s.u64())?,
            total_disks: t!(s.u32())?,
        }))
    }
}

/// Data descriptor trailer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DataDescriptor {
    /// Whether the optional signature precedes the values.
    pub has_signature: bool,
    /// CRC-32 or 0.
    pub crc32: u32,
    /// Compressed size.
    pub compressed_size: u64,
    /// Uncompressed size.
    pub uncompressed_size: u64,
    /// Whether sizes are 8 bytes wide.
    pub zip64: bool,
}

impl DataDescriptor {
    const NAME: &'static str = "data descriptor";

    /// Serialized length: 12, 16, 20 or 24 bytes.
    pub fn byte_length(&self) -> usize {
        Self::len_for(self.has_signature, self.zip64)
    }

    /// Length of a descriptor with the given shape.
    pub fn len_for(has_signature: bool, zip64: bool) -> usize {
        (if has_signature { 4 } else { 0 }) + 4 + if zip64 { 16 } else { 8 }
    }

    /// Serializes the descriptor: signature, CRC, compressed size, size.
    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.byte_length());
        if self.has_signature {
            out.put_u32(signature::DATA_DESCRIPTOR);
        }
        out.put_u32(self.crc32);
        if self.zip64 {
            out.put_u64(self.compressed_size);
            out.put_u64(self.uncompressed_size);
        } else {
            out.put_u32(self.compressed_size as u32);
            out.put_u32(self.uncompressed_size as u32);
        }
        out
    }

    /// Reads a descriptor starting at `offset`.
    ///
    /// The signature is optional: a first word equal to it is taken as the
    /// signature.
    pub fn read_from<R: Read + ?Sized>(r: &mut R, offset: u64, zip64: bool) -> Result<Self> {
        let first: [u8; 4] = read_fixed(r, Self::NAME, offset)?;
        let first = u32::from_le_bytes(first);
        let has_signature = first == signature::DATA_DESCRIPTOR;
        let crc32 = if has_signature {
            u32::from_le_bytes(read_fixed(r, Self::NAME, offset)?)
        } else {
            first
        };
        let (compressed_size, uncompressed_size) = if zip64 {
            let buf: [u8; 16] = read_fixed(r, Self::NAME, offset)?;
            let mut s = SliceReader::new(&buf);
            (field(s.u64(), Self::NAME, offset)?, field(s.u64(), Self::NAME, offset)?)
        } else {
            let buf: [u8; 8] = read_fixed(r, Self::NAME, offset)?;
            let mut s = SliceReader::new(&buf);
            (
                field(s.u32(), Self::NAME, offset)? as u64,
                field(s.u32(), Self::NAME, offset)? as u64,
            )
        };
        Ok(Self {
            has_signature,
            crc32,
            compressed_size,
            uncompressed_size,
            zip64,
        })
    }
}

/// Writes a serialized record, mapping failures to [`Error::Io`].
pub(crate) fn write_record<W: Write + ?Sized>(w: &mut W, bytes: &[u8]) -> Result<u64> {
    w.write_all(bytes)?;
    Ok(bytes.len() as u64)
}
