//! Reading entry payloads: into memory, onto disk, or just to verify them.

use std::fs::{self, File};
use std::io::{BufWriter, Read, Seek, Write};
use std::path::Path;

use filetime::FileTime;
use log::{debug, warn};

use crate::{ArchivePath, Error, Result};

use super::Archive;
use super::verify::decode_entry;

impl<R: Read + Seek> Archive<R> {
    /// Decodes entry `index` into memory.
    ///
    /// # Errors
    ///
    /// CRC mismatches, wrong passwords and failed AE-x authentication are
    /// returned as errors: plaintext that failed its check is never handed
    /// out.
    pub fn read_entry(&mut self, index: usize) -> Result<Vec<u8>> {
        let entry = self.report.entries.get(index).ok_or_else(|| Error::EntryNotFound {
            path: format!("#{index}"),
        })?;
        let mut out = Vec::with_capacity(entry.size.min(1 << 24) as usize);
        decode_entry(
            &mut self.reader,
            entry,
            self.options.password.as_ref(),
            self.options.read_buffer_size,
            Some(&mut out as &mut dyn Write),
        )?;
        Ok(out)
    }

    /// Decodes the first entry named `name` into memory.
    pub fn read_entry_by_name(&mut self, name: &str) -> Result<Vec<u8>> {
        let index = self.entry_index(name).ok_or_else(|| Error::EntryNotFound {
            path: name.to_string(),
        })?;
        self.read_entry(index)
    }

    /// Decodes every file entry without keeping the plaintext, returning
    /// the failures.
    ///
    /// Directories are skipped. Every other entry is checked even after a
    /// failure.
    pub fn verify(&mut self) -> Vec<Error> {
        let mut errors = Vec::new();
        for entry in self.report.entries.iter().filter(|e| !e.is_directory()) {
            let result = decode_entry(
                &mut self.reader,
                entry,
                self.options.password.as_ref(),
                self.options.read_buffer_size,
                None,
            );
            if let Err(e) = result {
                debug!("entry '{}' failed verification: {}", entry.name, e);
                errors.push(e);
            }
        }
        errors
    }

    /// Extracts every entry below `dest`, returning the number of files
    /// written.
    ///
    /// Names are validated before anything is created: absolute paths and
    /// `..` components are rejected. A file whose payload fails its check
    /// is removed again.
    pub fn extract_to(&mut self, dest: impl AsRef<Path>) -> Result<usize> {
        let dest = dest.as_ref();
        let targets = self
            .report
            .entries
            .iter()
            .map(|e| ArchivePath::new(&e.name).map(|p| dest.join(p.as_str().trim_end_matches('/'))))
            .collect::<Result<Vec<_>>>()?;

        fs::create_dir_all(dest)?;
        let mut files = 0;
        for (entry, target) in self.report.entries.iter().zip(&targets) {
            if entry.is_directory() {
                fs::create_dir_all(target)?;
                continue;
            }
            if let Some(parent) = target.parent() {
                fs::create_dir_all(parent)?;
            }
            let mut out = BufWriter::new(File::create(target)?);
            let result = decode_entry(
                &mut self.reader,
                entry,
                self.options.password.as_ref(),
                self.options.read_buffer_size,
                Some(&mut out as &mut dyn Write),
            )
            .and_then(|_| out.flush().map_err(Error::from));
            drop(out);
            if let Err(e) = result {
                if let Err(remove) = fs::remove_file(target) {
                    warn!("could not remove {}: {}", target.display(), remove);
                }
                return Err(e);
            }
            let mtime = FileTime::from_unix_time(entry.modified(), 0);
            filetime::set_file_mtime(target, mtime)?;
            files += 1;
        }
        debug!("extracted {} files to {}", files, dest.display());
        Ok(files)
    }
}
