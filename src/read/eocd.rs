//! Locating the end of central directory.
//!
//! The record sits at the very end of the archive, followed only by its
//! comment. It is found by scanning backward in small windows, checking
//! every signature occurrence from the end towards the front. A candidate
//! whose declared comment length reaches exactly the end of the input is
//! accepted at once. The first candidate met is kept as a fallback.
//!
//! A comment can embed a complete, self-consistent end record. No scan can
//! tell that apart from the real one; this is an ambiguity of the format.

use std::io::{Read, Seek, SeekFrom};

use log::{debug, warn};

use crate::format::records::{
    EndOfCentralDirectory, Zip64EndLocator, Zip64EndOfCentralDirectory,
};
use crate::format::signature;
use crate::{Error, Result};

use super::info::{EocdInfo, Zip64Info};

/// Bytes read per backward step.
const WINDOW: u64 = 32;
/// Furthest distance from the end the record can start at.
pub const MAX_SEARCH: u64 = EndOfCentralDirectory::FIXED_LEN as u64 + u16::MAX as u64;

/// Scans backward from `file_len` for the end record.
pub fn locate<R: Read + Seek + ?Sized>(reader: &mut R, file_len: u64) -> Result<EocdInfo> {
    let fixed = EndOfCentralDirectory::FIXED_LEN as u64;
    let limit = file_len.min(MAX_SEARCH);
    if file_len < fixed {
        return Err(Error::EndOfCentralDirectoryNotFound { searched: file_len });
    }

    let base = file_len - limit;
    let mut tail = vec![0u8; limit as usize];
    let mut covered = 0u64;
    let mut next = file_len - fixed;
    let mut fallback: Option<EocdInfo> = None;
    let needle = signature::END_OF_CENTRAL_DIRECTORY.to_le_bytes();

    while covered < limit {
        let step = WINDOW.min(limit - covered);
        let start = file_len - covered - step;
        reader.seek(SeekFrom::Start(start))?;
        let rel = (start - base) as usize;
        reader
            .read_exact(&mut tail[rel..rel + step as usize])
            .map_err(|e| Error::truncated_or_io(e, "archive tail", start))?;
        covered += step;

        let mut candidate = next;
        while candidate >= start {
            let at = (candidate - base) as usize;
            if tail[at..at + 4] == needle {
                let info = read_candidate(&tail[at..], candidate, file_len)?;
                if info.confirmed {
                    debug!("end of central directory at {:#x}", candidate);
                    return Ok(info);
                }
                if fallback.is_none() {
                    debug!("end record candidate at {:#x} does not reach end of input", candidate);
                    fallback = Some(info);
                }
            }
            if candidate == 0 {
                break;
            }
            candidate -= 1;
        }
        if start == 0 {
            break;
        }
        next = start - 1;
    }

    match fallback {
        Some(info) => {
            warn!(
                "no end record's comment length matches the input length; using the last signature at {:#x}",
                info.offset
            );
            Ok(info)
        }
        None => Err(Error::EndOfCentralDirectoryNotFound { searched: covered }),
    }
}

/// Parses a candidate whose signature starts `buf`.
fn read_candidate(buf: &[u8], offset: u64, file_len: u64) -> Result<EocdInfo> {
    let (mut record, comment_len) = EndOfCentralDirectory::parse_fixed(buf, offset)?;
    let fixed = EndOfCentralDirectory::FIXED_LEN;
    let available = buf.len() - fixed;
    let confirmed = offset + (fixed + comment_len) as u64 == file_len;
    record.comment = buf[fixed..fixed + comment_len.min(available)].to_vec();
    Ok(EocdInfo {
        offset,
        record,
        confirmed,
    })
}

/// Reads the ZIP64 locator and end record for `eocd`, if the classic
/// record has overflowed fields and a locator precedes it.
///
/// A missing locator is not an error: the classic values are used as is.
/// A locator pointing at anything but a ZIP64 end record is.
pub fn locate_zip64<R: Read + Seek + ?Sized>(reader: &mut R, eocd: &EocdInfo) -> Result<Option<Zip64Info>> {
    let locator_len = Zip64EndLocator::LEN as u64;
    if !eocd.has_sentinel() || eocd.offset < locator_len {
        return Ok(None);
    }
    let locator_offset = eocd.offset - locator_len;
    reader.seek(SeekFrom::Start(locator_offset))?;
    let mut buf = [0u8; Zip64EndLocator::LEN];
    reader
        .read_exact(&mut buf)
        .map_err(|e| Error::truncated_or_io(e, "ZIP64 end of central directory locator", locator_offset))?;
    let Some(locator) = Zip64EndLocator::parse(&buf, locator_offset)? else {
        debug!("end record has sentinels but no ZIP64 locator precedes it");
        return Ok(None);
    };
    if locator.end_record_offset >= locator_offset {
        return Err(Error::corrupt_header(
            locator_offset,
            format!(
                "ZIP64 end record offset {:#x} is not before its locator",
                locator.end_record_offset
            ),
        ));
    }
    reader.seek(SeekFrom::Start(locator.end_record_offset))?;
    let record = Zip64EndOfCentralDirectory::read_from(reader, locator.end_record_offset)?;
    debug!(
        "ZIP64 end record at {:#x}: {} entries, central directory at {:#x}",
        locator.end_record_offset, record.total_entries, record.central_directory_offset
    );
    Ok(Some(Zip64Info {
        locator_offset,
        locator,
        record,
    }))
}
