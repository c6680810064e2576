//! A file entry: local header, payload and optional data descriptor.
//!
//! Sizes and CRC of a compressible or encryptable payload are unknown until
//! it has been streamed once. An entry therefore finalizes lazily: the
//! first call that needs them runs the payload through the pipeline, and
//! the result is fixed from then on. Entries using a data descriptor skip
//! that pass and take their values from the write itself, unless ZipCrypto
//! needs the CRC for its header up front.

use std::io::Write;
use std::path::PathBuf;

use log::{debug, warn};

use crate::archive_path::ArchivePath;
use crate::crypto::{AesStrength, EncryptionMethod};
use crate::format::extra_field::{ExtraField, Zip64ExtendedInfo, extra_fields_len, serialize_extra_fields};
use crate::format::records::{DataDescriptor, LocalFileHeader, write_record};
use crate::format::{U32_LIMIT, U32_SENTINEL, flags, length_u16, method, version};
use crate::streaming::{Pipeline, Source, WritePlan};
use crate::timestamp::DosDateTime;
use crate::{Error, Result};

const LOCAL_HEADER: &str = "local file header";

/// Payload of an entry.
#[derive(Debug, Clone)]
pub enum EntryData {
    /// In-memory bytes.
    Bytes(Vec<u8>),
    /// A file streamed from disk when needed.
    Path(PathBuf),
    /// No payload (directories).
    Empty,
}

impl EntryData {
    fn source(&self) -> Source<'_> {
        match self {
            Self::Bytes(data) => Source::Bytes(data),
            Self::Path(path) => Source::Path(path),
            Self::Empty => Source::Bytes(&[]),
        }
    }
}

/// Final sizes and checksum of an entry.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntrySizes {
    /// Uncompressed size.
    pub size: u64,
    /// Stored payload size, including encryption overhead.
    pub compressed_size: u64,
    /// CRC-32 of the uncompressed plaintext.
    pub crc32: u32,
}

impl EntrySizes {
    /// Whether either size needs a ZIP64 field.
    ///
    /// A value of exactly `0xFFFFFFFF` still fits.
    pub fn needs_zip64(&self) -> bool {
        self.size > U32_LIMIT || self.compressed_size > U32_LIMIT
    }
}

/// Timestamps of an entry, in Unix seconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EntryTimes {
    /// Last modification.
    pub mtime: i64,
    /// Last access, if known.
    pub atime: Option<i64>,
    /// Creation, if known.
    pub ctime: Option<i64>,
}

impl EntryTimes {
    /// Only a modification time.
    pub fn modified(mtime: i64) -> Self {
        Self {
            mtime,
            atime: None,
            ctime: None,
        }
    }

    /// Access time, falling back to the modification time.
    pub fn atime_or_mtime(&self) -> i64 {
        self.atime.unwrap_or(self.mtime)
    }

    /// Creation time, falling back to the access time.
    pub fn ctime_or_atime(&self) -> i64 {
        self.ctime.unwrap_or_else(|| self.atime_or_mtime())
    }
}

/// How an entry is encoded.
#[derive(Debug, Clone)]
pub struct EntryConfig {
    /// DEFLATE level, `None` to store.
    pub compression_level: Option<u32>,
    /// Encryption of the payload.
    pub encryption: Option<EncryptionMethod>,
    /// Write CRC and sizes after the payload.
    pub data_descriptor: bool,
    /// Precede the descriptor with its signature.
    pub data_descriptor_signature: bool,
    /// Store the name as UTF-8 and set flag bit 11.
    pub utf8_name: bool,
    /// Entry comment (central directory only).
    pub comment: Vec<u8>,
    /// Chunk size for streaming the payload.
    pub buffer_size: usize,
}

impl Default for EntryConfig {
    fn default() -> Self {
        Self {
            compression_level: None,
            encryption: None,
            data_descriptor: false,
            data_descriptor_signature: true,
            utf8_name: true,
            comment: Vec::new(),
            buffer_size: crate::WRITE_BUFFER_SIZE,
        }
    }
}

/// One entry of an archive being written.
#[derive(Debug, Clone)]
pub struct FileEntry {
    path: ArchivePath,
    name: Vec<u8>,
    utf8: bool,
    data: EntryData,
    config: EntryConfig,
    times: EntryTimes,
    dos_time: DosDateTime,
    extra_fields: Vec<ExtraField>,
    offset: u64,
    sizes: Option<EntrySizes>,
}

impl FileEntry {
    /// Creates an entry. Directories drop compression, encryption and the
    /// data descriptor.
    pub fn new(path: ArchivePath, data: EntryData, times: EntryTimes, mut config: EntryConfig) -> Self {
        if path.is_directory() {
            config.compression_level = None;
            config.encryption = None;
            config.data_descriptor = false;
        }
        let (name, utf8) = encode_name(path.as_str(), config.utf8_name);
        Self {
            dos_time: DosDateTime::from_unix_secs(times.mtime),
            path,
            name,
            utf8,
            data,
            config,
            times,
            extra_fields: Vec::new(),
            offset: 0,
            sizes: None,
        }
    }

    /// The virtual path.
    pub fn path(&self) -> &ArchivePath {
        &self.path
    }

    /// The name exactly as stored in the headers.
    pub fn name_bytes(&self) -> &[u8] {
        &self.name
    }

    /// Whether the stored name is UTF-8.
    pub fn is_utf8(&self) -> bool {
        self.utf8
    }

    /// Whether this is a directory entry.
    pub fn is_directory(&self) -> bool {
        self.path.is_directory()
    }

    /// The timestamps.
    pub fn times(&self) -> EntryTimes {
        self.times
    }

    /// The MS-DOS date and time stored in the headers.
    pub fn dos_time(&self) -> DosDateTime {
        self.dos_time
    }

    /// Entry comment.
    pub fn comment(&self) -> &[u8] {
        &self.config.comment
    }

    /// Encryption of the payload.
    pub fn encryption(&self) -> Option<&EncryptionMethod> {
        self.config.encryption.as_ref()
    }

    /// AE-x strength, if the entry uses AE-x.
    pub fn aes_strength(&self) -> Option<AesStrength> {
        self.encryption().and_then(EncryptionMethod::aes_strength)
    }

    /// Whether CRC and sizes follow the payload.
    pub fn uses_data_descriptor(&self) -> bool {
        self.config.data_descriptor
    }

    /// The real compression method.
    pub fn compression_method(&self) -> u16 {
        if self.config.compression_level.is_some() {
            method::DEFLATE
        } else {
            method::STORED
        }
    }

    /// The method written to the headers: 99 for AE-x.
    pub fn header_method(&self) -> u16 {
        if self.aes_strength().is_some() {
            method::AEX
        } else {
            self.compression_method()
        }
    }

    /// General-purpose flags.
    pub fn flags(&self) -> u16 {
        let mut bits = 0;
        if self.config.encryption.is_some() {
            bits |= flags::ENCRYPTED;
        }
        if self.config.data_descriptor {
            bits |= flags::DATA_DESCRIPTOR;
        }
        if self.utf8 {
            bits |= flags::UTF8;
        }
        bits
    }

    /// CRC as recorded in headers and descriptors: AE-2 stores zero.
    pub fn recorded_crc(&self, sizes: &EntrySizes) -> u32 {
        if self.aes_strength().is_some() { 0 } else { sizes.crc32 }
    }

    /// Version needed to extract, given whether ZIP64 fields are used and
    /// which extra fields are attached.
    pub fn version_needed(&self, zip64: bool, extra_fields: &[ExtraField]) -> u16 {
        let mut needed = version::DEFAULT;
        let has_unicode_path = extra_fields
            .iter()
            .any(|f| matches!(f, ExtraField::UnicodePath(_)));
        if self.compression_method() == method::DEFLATE || self.is_directory() || has_unicode_path {
            needed = needed.max(version::DEFLATE);
        }
        if zip64 {
            needed = needed.max(version::ZIP64);
        }
        if self.aes_strength().is_some() {
            needed = needed.max(version::AEX);
        }
        needed
    }

    /// Offset of the local header within the archive.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Stamps the local header offset.
    pub fn set_offset(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Injected extra fields of the local header.
    pub fn extra_fields(&self) -> &[ExtraField] {
        &self.extra_fields
    }

    /// Removes all injected extra fields.
    pub fn clear_extra_fields(&mut self) {
        self.extra_fields.clear();
    }

    /// Appends an extra field to the local header.
    pub fn push_extra_field(&mut self, field: ExtraField) {
        self.extra_fields.push(field);
    }

    /// Sizes, if already finalized.
    pub fn sizes(&self) -> Option<EntrySizes> {
        self.sizes
    }

    /// Fixes sizes computed elsewhere, for example in parallel.
    ///
    /// Fails if the entry was already finalized with different values.
    pub fn apply_precomputed(&mut self, sizes: EntrySizes) -> Result<()> {
        match self.sizes {
            Some(existing) if existing != sizes => Err(Error::InvalidFormat(format!(
                "precomputed sizes of '{}' disagree with the finalized ones",
                self.path
            ))),
            _ => {
                self.sizes = Some(sizes);
                Ok(())
            }
        }
    }

    /// Computes sizes and CRC without writing anything.
    ///
    /// Takes `&self` so callers can run it on many entries concurrently.
    pub fn compute_sizes(&self) -> Result<EntrySizes> {
        if let EntryData::Empty = self.data {
            return Ok(EntrySizes::default());
        }
        let plan = WritePlan {
            checksum: true,
            compression_level: self.config.compression_level,
            encryption: None,
        };
        let out = Pipeline::for_write(self.config.buffer_size, plan, None)?.run(self.data.source())?;
        let overhead = self.encryption().map_or(0, EncryptionMethod::overhead);
        Ok(EntrySizes {
            size: out.bytes_in,
            compressed_size: out.bytes_out.unwrap_or(0) + overhead,
            crc32: out.crc32.unwrap_or(0),
        })
    }

    /// Returns the final sizes, computing them on first use.
    pub fn finalize(&mut self) -> Result<EntrySizes> {
        if let Some(sizes) = self.sizes {
            return Ok(sizes);
        }
        let sizes = self.compute_sizes()?;
        debug!(
            "finalized '{}': size {}, compressed {}, crc {:#010x}",
            self.path, sizes.size, sizes.compressed_size, sizes.crc32
        );
        self.sizes = Some(sizes);
        Ok(sizes)
    }

    /// Whether the local header carries ZIP64 sizes.
    fn local_zip64(&self, sizes: Option<&EntrySizes>) -> bool {
        !self.config.data_descriptor && sizes.is_some_and(EntrySizes::needs_zip64)
    }

    fn local_extra_fields(&self, sizes: Option<&EntrySizes>) -> Vec<ExtraField> {
        let mut fields = Vec::with_capacity(self.extra_fields.len() + 1);
        if let Some(sizes) = sizes.filter(|_| self.local_zip64(sizes)) {
            fields.push(ExtraField::Zip64(Zip64ExtendedInfo::local(
                sizes.size,
                sizes.compressed_size,
            )));
        }
        fields.extend(self.extra_fields.iter().cloned());
        fields
    }

    /// Builds the local header. `sizes` may be `None` only with a data
    /// descriptor.
    pub fn local_header(&self, sizes: Option<&EntrySizes>) -> LocalFileHeader {
        let zip64 = self.local_zip64(sizes);
        let extra = self.local_extra_fields(sizes);
        let (crc32, compressed_size, uncompressed_size) = match sizes {
            Some(s) if !self.config.data_descriptor => {
                if zip64 {
                    (self.recorded_crc(s), U32_SENTINEL, U32_SENTINEL)
                } else {
                    (self.recorded_crc(s), s.compressed_size as u32, s.size as u32)
                }
            }
            _ => (0, 0, 0),
        };
        LocalFileHeader {
            version_needed: self.version_needed(zip64, &extra),
            flags: self.flags(),
            method: self.header_method(),
            last_mod_time: self.dos_time.time,
            last_mod_date: self.dos_time.date,
            crc32,
            compressed_size,
            uncompressed_size,
            file_name: self.name.clone(),
            extra_field: serialize_extra_fields(&extra),
        }
    }

    /// Length of the local header.
    ///
    /// Fails if the name or the extra field block does not fit its 16-bit
    /// length field.
    pub fn local_header_len(&self, sizes: Option<&EntrySizes>) -> Result<u64> {
        let extra_len = extra_fields_len(&self.local_extra_fields(sizes));
        length_u16(self.name.len(), LOCAL_HEADER, "file name")?;
        length_u16(extra_len, LOCAL_HEADER, "extra field")?;
        Ok((LocalFileHeader::FIXED_LEN + self.name.len() + extra_len) as u64)
    }

    fn data_descriptor(&self, sizes: &EntrySizes) -> DataDescriptor {
        DataDescriptor {
            has_signature: self.config.data_descriptor_signature,
            crc32: self.recorded_crc(sizes),
            compressed_size: sizes.compressed_size,
            uncompressed_size: sizes.size,
            zip64: sizes.needs_zip64(),
        }
    }

    /// Serialized length: header, payload and descriptor.
    pub fn byte_length(&mut self) -> Result<u64> {
        let sizes = self.finalize()?;
        let mut len = self.local_header_len(Some(&sizes))? + sizes.compressed_size;
        if self.config.data_descriptor {
            len += self.data_descriptor(&sizes).byte_length() as u64;
        }
        Ok(len)
    }

    /// Writes header, payload and descriptor, returning the bytes written.
    pub fn write_to(&mut self, sink: &mut dyn Write) -> Result<u64> {
        let known = if self.config.data_descriptor {
            None
        } else {
            Some(self.finalize()?)
        };
        // The ZipCrypto check byte is the CRC's high byte, so the CRC must be
        // known before any payload byte is encrypted.
        let zip_crypto = matches!(self.config.encryption, Some(EncryptionMethod::ZipCrypto(_)));
        let check_byte = match known {
            Some(sizes) => (sizes.crc32 >> 24) as u8,
            None if zip_crypto => (self.finalize()?.crc32 >> 24) as u8,
            None => 0,
        };

        let mut written = write_record(sink, &self.local_header(known.as_ref()).to_bytes()?)?;

        let plan = WritePlan {
            checksum: true,
            compression_level: self.config.compression_level,
            encryption: self.config.encryption.as_ref().map(|e| (e, check_byte)),
        };
        let out = match self.data {
            EntryData::Empty => Default::default(),
            _ => Pipeline::for_write(self.config.buffer_size, plan, Some(&mut *sink))?
                .run(self.data.source())?,
        };
        let streamed = EntrySizes {
            size: out.bytes_in,
            compressed_size: out.bytes_out.unwrap_or(0),
            crc32: out.crc32.unwrap_or(0),
        };
        written += streamed.compressed_size;

        match known {
            Some(sizes) if sizes != streamed => {
                return Err(Error::InvalidFormat(format!(
                    "payload of '{}' changed after its sizes were fixed",
                    self.path
                )));
            }
            Some(_) => {}
            None => {
                self.apply_precomputed(streamed)?;
                written += write_record(sink, &self.data_descriptor(&streamed).to_bytes())?;
            }
        }
        Ok(written)
    }
}

/// Encodes a name as UTF-8 or as the legacy CP932 codepage.
///
/// Returns the bytes and whether they are UTF-8. A name the codepage cannot
/// represent falls back to UTF-8.
pub(crate) fn encode_name(name: &str, utf8: bool) -> (Vec<u8>, bool) {
    if utf8 || name.is_ascii() {
        return (name.as_bytes().to_vec(), utf8);
    }
    let (encoded, _, had_errors) = encoding_rs::SHIFT_JIS.encode(name);
    if had_errors {
        warn!("'{}' is not representable in CP932, storing it as UTF-8", name);
        return (name.as_bytes().to_vec(), true);
    }
    (encoded.into_owned(), false)
}
