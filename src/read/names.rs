//! Entry name decoding.

use log::debug;

use crate::checksum::crc32;
use crate::format::extra_field::ExtraField;
use crate::format::flags;

/// Decodes a stored name.
///
/// A Unicode path field whose CRC matches the stored bytes wins. Otherwise
/// the name is UTF-8 when flag bit 11 is set, and CP932 when it is not.
pub fn decode_name(raw: &[u8], general_flags: u16, extra_fields: &[ExtraField]) -> String {
    let unicode = extra_fields.iter().find_map(|f| match f {
        ExtraField::UnicodePath(path) => Some(path),
        _ => None,
    });
    if let Some(path) = unicode {
        if path.name_crc32 == crc32(raw) {
            return String::from_utf8_lossy(&path.name).into_owned();
        }
        debug!("ignoring stale Unicode path field for {:?}", String::from_utf8_lossy(raw));
    }
    if general_flags & flags::UTF8 != 0 || raw.is_ascii() {
        return String::from_utf8_lossy(raw).into_owned();
    }
    let (decoded, _, _) = encoding_rs::SHIFT_JIS.decode(raw);
    decoded.into_owned()
}
