//! Fuzz target for parsing arbitrary bytes as an archive.
//!
//! Run with: cargo +nightly fuzz run archive_parse
//!
//! Parsing must never panic, and a report that claims to be valid must be
//! able to read back every entry it lists.

#![no_main]

use std::io::Cursor;

use libfuzzer_sys::fuzz_target;
use zipwright::read::{Archive, ParseOptions};

fuzz_target!(|data: &[u8]| {
    let options = ParseOptions::new().verify_crc(true).password("fuzz");
    let Ok(mut archive) = Archive::open_with_options(Cursor::new(data.to_vec()), options) else {
        return;
    };
    if !archive.report().is_valid() {
        return;
    }
    for index in 0..archive.len() {
        if archive.entries()[index].is_directory() {
            continue;
        }
        assert!(
            archive.read_entry(index).is_ok(),
            "verified entry {index} failed to read"
        );
    }
});
