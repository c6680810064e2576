//! Fuzz target for the extra field codec.
//!
//! Run with: cargo +nightly fuzz run extra_fields
//!
//! Any byte block must split into records without panicking, and records
//! that decode to a known variant must re-encode to a block that decodes
//! to the same records.

#![no_main]

use libfuzzer_sys::fuzz_target;
use zipwright::format::extra_field::{
    ExtraField, Zip64Fields, extra_fields_len, parse_extra_fields, serialize_extra_fields,
};

fuzz_target!(|data: &[u8]| {
    let wanted = Zip64Fields {
        size: data.first().is_some_and(|b| b & 1 != 0),
        compressed_size: data.first().is_some_and(|b| b & 2 != 0),
        offset: data.first().is_some_and(|b| b & 4 != 0),
        disk_start: data.first().is_some_and(|b| b & 8 != 0),
    };
    let fields = parse_extra_fields(data, wanted);

    let known: Vec<ExtraField> = fields
        .into_iter()
        .filter(|f| !matches!(f, ExtraField::Unknown { .. } | ExtraField::Zip64(_)))
        .collect();
    let encoded = serialize_extra_fields(&known);
    assert_eq!(encoded.len(), extra_fields_len(&known));
    assert_eq!(parse_extra_fields(&encoded, wanted), known);
});
