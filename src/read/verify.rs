//! Payload decoding and integrity checks.

use std::io::{Read, Seek, Write};

use log::trace;

use crate::crypto::Password;
use crate::format::method;
use crate::streaming::{Decryptor, Pipeline, PipelineOutput, Source};
use crate::{Error, Result};

use super::central::aex_strength;
use super::info::LocalEntryInfo;

/// Builds the decryption stage for `entry`, if it is encrypted.
fn decryptor_for(entry: &LocalEntryInfo, password: Option<&Password>) -> Result<Option<Decryptor>> {
    if !entry.is_encrypted() {
        return Ok(None);
    }
    let password = password.ok_or_else(|| Error::PasswordRequired {
        entry_name: entry.name.clone(),
    })?;
    if entry.is_aex() {
        let strength = aex_strength(&entry.extra_fields, &[], &entry.name);
        return Decryptor::aex(password, strength).map(Some);
    }
    // The check byte is the CRC's high byte, or the DOS time's high byte
    // when the CRC was not known before the payload was written.
    let mut check_bytes = vec![(entry.crc32 >> 24) as u8];
    if entry.uses_data_descriptor() {
        check_bytes.push((entry.header.last_mod_time >> 8) as u8);
    }
    Ok(Some(Decryptor::zip_crypto(password, &check_bytes)))
}

/// Streams the payload of `entry` through decryption and decompression,
/// mirroring plaintext into `sink`, and checks the result.
///
/// Plaintext reaches `sink` before the CRC or AE-x authentication code is
/// compared. A caller keeping the output must discard it on error.
pub fn decode_entry<R: Read + Seek>(
    reader: &mut R,
    entry: &LocalEntryInfo,
    password: Option<&Password>,
    buffer_size: usize,
    sink: Option<&mut dyn Write>,
) -> Result<PipelineOutput> {
    let decompress = match entry.compression_method() {
        method::STORED => false,
        method::DEFLATE => true,
        other => return Err(Error::UnsupportedMethod { method_id: other }),
    };
    let decryptor = decryptor_for(entry, password)?;
    let output = Pipeline::for_read(buffer_size, decryptor, decompress, sink)?
        .run(Source::Range {
            reader,
            offset: entry.data_offset,
            len: entry.compressed_size,
        })
        .map_err(|e| e.with_entry(entry.index, &entry.name))?;
    check_output(entry, &output)?;
    trace!(
        "decoded '{}': {} stored bytes, {:?} plaintext bytes",
        entry.name, output.bytes_in, output.bytes_out
    );
    Ok(output)
}

fn check_output(entry: &LocalEntryInfo, output: &PipelineOutput) -> Result<()> {
    if output.bytes_in != entry.compressed_size {
        return Err(Error::Truncated {
            structure: "entry payload",
            offset: entry.data_offset,
        });
    }
    if entry.has_crc() {
        let actual = output.crc32.unwrap_or_default();
        if actual != entry.crc32 {
            return Err(Error::crc_mismatch(
                entry.index,
                Some(entry.name.clone()),
                entry.crc32,
                actual,
            ));
        }
    }
    let produced = output.bytes_out.unwrap_or_default();
    if produced != entry.size {
        return Err(Error::corrupt_header(
            entry.offset,
            format!(
                "'{}' decodes to {} bytes but records {}",
                entry.name, produced, entry.size
            ),
        ));
    }
    Ok(())
}
