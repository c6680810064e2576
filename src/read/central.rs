//! Central directory and local header parsing.
//!
//! Both header kinds store sizes and offsets in 32 bits (16 for the disk
//! number) and replace overflowing values with an all-ones sentinel. The
//! real values then sit in the ZIP64 extra field, holding exactly the
//! overflowing fields in the fixed order size, compressed size, offset,
//! disk.

use std::io::{BufReader, Read, Seek, SeekFrom};

use log::{debug, trace, warn};

use crate::crypto::AesStrength;
use crate::format::extra_field::{ExtraField, Zip64ExtendedInfo, Zip64Fields, parse_extra_fields};
use crate::format::records::{CentralDirectoryHeader, DataDescriptor, LocalFileHeader};
use crate::format::{U16_SENTINEL, U32_LIMIT, U32_SENTINEL, flags, method};
use crate::{Error, Result};

use super::info::{CentralEntryInfo, LocalEntryInfo};
use super::names::decode_name;

/// Upper bound on entries preallocated from an untrusted count.
const MAX_PREALLOCATED: u64 = 4096;
/// Length of the ZipCrypto encryption header.
const ZIPCRYPTO_HEADER_LEN: usize = 12;
/// Length of the AE-x password verification value.
const AEX_VERIFIER_LEN: usize = 2;

/// Resolves the ZIP64 values for the header fields in `wanted`, which read
/// as sentinels.
///
/// A sentinel field is a literal `0xFFFFFFFF` unless the ZIP64 record holds
/// its value, so a missing record leaves every field literal. A record that
/// matches none of the sentinel fields is corrupt.
fn zip64_values(fields: &[ExtraField], wanted: Zip64Fields, offset: u64) -> Result<Zip64ExtendedInfo> {
    if !wanted.any() {
        return Ok(Zip64ExtendedInfo::default());
    }
    let Some(info) = fields.iter().find_map(|f| match f {
        ExtraField::Zip64(info) => Some(info.clone()),
        _ => None,
    }) else {
        debug!("no ZIP64 extra field at {:#x}, sentinel values are literal", offset);
        return Ok(Zip64ExtendedInfo::default());
    };
    let present = info.fields();
    if !present.any() || wanted.narrow_to(present.data_len()) != Some(present) {
        return Err(Error::corrupt_header(
            offset,
            "ZIP64 extra field lacks values for its sentinel fields",
        ));
    }
    Ok(info)
}

/// Reads `count` central directory records starting at `start`.
pub fn read_central_directory<R: Read + Seek + ?Sized>(
    reader: &mut R,
    start: u64,
    count: u64,
) -> Result<Vec<CentralEntryInfo>> {
    reader.seek(SeekFrom::Start(start))?;
    let mut buffered = BufReader::new(reader);
    let mut records = Vec::with_capacity(count.min(MAX_PREALLOCATED) as usize);
    let mut offset = start;
    for index in 0..count as usize {
        let header = CentralDirectoryHeader::read_from(&mut buffered, offset)?;
        let len = header.byte_length() as u64;
        let record = resolve_central(index, offset, header)?;
        trace!(
            "central record {} at {:#x}: '{}' local header at {:#x}",
            index, offset, record.name, record.local_header_offset
        );
        records.push(record);
        offset += len;
    }
    Ok(records)
}

fn resolve_central(index: usize, offset: u64, header: CentralDirectoryHeader) -> Result<CentralEntryInfo> {
    let wanted = Zip64Fields {
        size: header.uncompressed_size == U32_SENTINEL,
        compressed_size: header.compressed_size == U32_SENTINEL,
        offset: header.local_header_offset == U32_SENTINEL,
        disk_start: header.disk_start == U16_SENTINEL,
    };
    let extra_fields = parse_extra_fields(&header.extra_field, wanted);
    let zip64 = zip64_values(&extra_fields, wanted, offset)?;
    let name = decode_name(&header.file_name, header.flags, &extra_fields);
    Ok(CentralEntryInfo {
        index,
        offset,
        name,
        size: zip64.size.unwrap_or(header.uncompressed_size as u64),
        compressed_size: zip64.compressed_size.unwrap_or(header.compressed_size as u64),
        local_header_offset: zip64.offset.unwrap_or(header.local_header_offset as u64),
        disk_start: zip64.disk_start.unwrap_or(header.disk_start as u32),
        extra_fields,
        header,
    })
}

/// Reads the local header, encryption header and data descriptor of the
/// entry described by `central`.
pub fn read_local_entry<R: Read + Seek + ?Sized>(reader: &mut R, central: &CentralEntryInfo) -> Result<LocalEntryInfo> {
    let offset = central.local_header_offset;
    reader.seek(SeekFrom::Start(offset))?;
    let header = LocalFileHeader::read_from(reader, offset)?;

    let wanted = Zip64Fields {
        size: header.uncompressed_size == U32_SENTINEL,
        compressed_size: header.compressed_size == U32_SENTINEL,
        ..Default::default()
    };
    let extra_fields = parse_extra_fields(&header.extra_field, wanted);
    let zip64 = zip64_values(&extra_fields, wanted, offset)?;
    let name = decode_name(&header.file_name, header.flags, &extra_fields);
    let data_offset = offset + header.byte_length() as u64;

    let deferred = header.flags & flags::DATA_DESCRIPTOR != 0;
    let mut size = zip64.size.unwrap_or(header.uncompressed_size as u64);
    let mut compressed_size = zip64.compressed_size.unwrap_or(header.compressed_size as u64);
    let mut crc32 = header.crc32;
    if deferred {
        if size == 0 {
            size = central.size;
        }
        if compressed_size == 0 {
            compressed_size = central.compressed_size;
        }
        if crc32 == 0 {
            crc32 = central.header.crc32;
        }
    }

    let encryption_header = if header.flags & flags::ENCRYPTED != 0 {
        let len = encryption_header_len(&header, &extra_fields, central);
        if (len as u64) > compressed_size {
            return Err(Error::corrupt_header(
                offset,
                format!(
                    "encrypted payload of {} bytes cannot hold a {}-byte header",
                    compressed_size, len
                ),
            ));
        }
        let mut buf = vec![0u8; len];
        reader
            .read_exact(&mut buf)
            .map_err(|e| Error::truncated_or_io(e, "encryption header", data_offset))?;
        Some(buf)
    } else {
        None
    };

    let mut entry = LocalEntryInfo {
        index: central.index,
        offset,
        header,
        name,
        extra_fields,
        encryption_header,
        data_offset,
        size,
        compressed_size,
        crc32,
        data_descriptor: None,
    };

    if deferred && !entry.is_directory() {
        let dd_offset = data_offset + compressed_size;
        let wide = size > U32_LIMIT || compressed_size > U32_LIMIT;
        reader.seek(SeekFrom::Start(dd_offset))?;
        let dd = DataDescriptor::read_from(reader, dd_offset, wide)?;
        trace!(
            "data descriptor of '{}' at {:#x}: {} bytes",
            entry.name,
            dd_offset,
            dd.byte_length()
        );
        entry.crc32 = dd.crc32;
        entry.size = dd.uncompressed_size;
        entry.compressed_size = dd.compressed_size;
        entry.data_descriptor = Some(dd);
    }

    trace!(
        "local entry {} at {:#x}: '{}' method {} size {} compressed {}",
        entry.index, offset, entry.name, entry.header.method, entry.size, entry.compressed_size
    );
    Ok(entry)
}

/// AE-x key strength from the local or central extra field, falling back
/// to AES-256 when it is missing or unknown.
pub fn aex_strength(local: &[ExtraField], central: &[ExtraField], name: &str) -> AesStrength {
    let code = local.iter().chain(central).find_map(|f| match f {
        ExtraField::Aex(info) => Some(info.strength),
        _ => None,
    });
    match code.and_then(AesStrength::from_code) {
        Some(strength) => strength,
        None => {
            warn!("'{}' has no usable AE-x strength ({:?}), assuming AES-256", name, code);
            AesStrength::Aes256
        }
    }
}

fn encryption_header_len(header: &LocalFileHeader, extra_fields: &[ExtraField], central: &CentralEntryInfo) -> usize {
    if header.method == method::AEX {
        let name = String::from_utf8_lossy(&header.file_name);
        aex_strength(extra_fields, &central.extra_fields, &name).salt_len() + AEX_VERIFIER_LEN
    } else {
        ZIPCRYPTO_HEADER_LEN
    }
}
