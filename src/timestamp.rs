//! Timestamp conversions used by ZIP headers.
//!
//! Headers carry time in three encodings:
//!
//! - packed MS-DOS date and time (2-second resolution) in every local and
//!   central header,
//! - Unix seconds in the Unix and extended timestamp extra fields,
//! - Windows FILETIME (100-nanosecond ticks since 1601-01-01 UTC) in the
//!   NTFS extra field.
//!
//! Entries keep their times as Unix seconds; [`Timestamp`] and
//! [`DosDateTime`] convert on demand. DOS values are computed in UTC.
//!
//! # Example
//!
//! ```rust
//! use zipwright::timestamp::{DosDateTime, Timestamp};
//!
//! let ts = Timestamp::from_unix_secs(0).unwrap();
//! assert_eq!(ts.as_filetime(), 116_444_736_000_000_000);
//!
//! let dos = DosDateTime::from_unix_secs(315_532_800); // 1980-01-01
//! assert_eq!(dos.date, 0x0021);
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

/// Seconds between 1601-01-01 and 1970-01-01.
pub const FILETIME_EPOCH_OFFSET_SECS: u64 = 11_644_473_600;

/// Number of 100-nanosecond intervals per second.
const INTERVALS_PER_SECOND: u64 = 10_000_000;

/// A Windows FILETIME value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    filetime: u64,
}

impl Timestamp {
    /// Creates a timestamp from a raw FILETIME value.
    #[inline]
    pub const fn from_filetime(filetime: u64) -> Self {
        Self { filetime }
    }

    /// Creates a timestamp from Unix seconds.
    ///
    /// Computes `(secs + 11644473600) * 10_000_000` in full 64-bit
    /// precision. Returns `None` for times before 1601 or after the year
    /// 60056.
    pub fn from_unix_secs(secs: i64) -> Option<Self> {
        let shifted = (FILETIME_EPOCH_OFFSET_SECS as i64).checked_add(secs)?;
        let shifted = u64::try_from(shifted).ok()?;
        shifted
            .checked_mul(INTERVALS_PER_SECOND)
            .map(Self::from_filetime)
    }

    /// Returns the raw FILETIME value.
    #[inline]
    pub const fn as_filetime(&self) -> u64 {
        self.filetime
    }

    /// Returns the time as Unix seconds, rounding toward negative infinity.
    pub fn as_unix_secs(&self) -> i64 {
        (self.filetime / INTERVALS_PER_SECOND) as i64 - FILETIME_EPOCH_OFFSET_SECS as i64
    }
}

/// Packed MS-DOS date and time as stored in ZIP headers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DosDateTime {
    /// `((year - 1980) << 9) | (month << 5) | day`
    pub date: u16,
    /// `(hour << 11) | (minute << 5) | ceil(second / 2)`
    pub time: u16,
}

impl DosDateTime {
    /// Earliest representable instant, 1980-01-01 00:00:00 UTC.
    pub const MIN_UNIX_SECS: i64 = 315_532_800;

    /// Packs Unix seconds into DOS date and time.
    ///
    /// Times before 1980 clamp to 1980-01-01 00:00:00 and times after 2107
    /// clamp to 2107-12-31 23:59:58. Odd seconds round up to the next
    /// 2-second step.
    pub fn from_unix_secs(secs: i64) -> Self {
        let (year, month, day, hour, minute, second) = civil_from_unix(secs);
        if year < 1980 {
            return Self {
                date: (1 << 5) | 1,
                time: 0,
            };
        }
        if year > 2107 {
            return Self {
                date: (127 << 9) | (12 << 5) | 31,
                time: (23 << 11) | (59 << 5) | 29,
            };
        }
        let date = (((year - 1980) as u16) << 9) | ((month as u16) << 5) | day as u16;
        let time = ((hour as u16) << 11) | ((minute as u16) << 5) | second.div_ceil(2) as u16;
        Self { date, time }
    }

    /// Packs the current system time.
    pub fn now() -> Self {
        Self::from_unix_secs(unix_now())
    }

    /// Unpacks to Unix seconds.
    ///
    /// Out-of-range month or day values found in foreign archives are
    /// clamped rather than rejected.
    pub fn to_unix_secs(self) -> i64 {
        let year = 1980 + (self.date >> 9) as i64;
        let month = ((self.date >> 5) & 0x0f).clamp(1, 12) as i64;
        let day = (self.date & 0x1f).max(1) as i64;
        let hour = (self.time >> 11) as i64;
        let minute = ((self.time >> 5) & 0x3f) as i64;
        let second = ((self.time & 0x1f) * 2) as i64;
        days_from_civil(year, month, day) * 86_400 + hour * 3600 + minute * 60 + second
    }
}

/// Returns the current time as Unix seconds.
pub fn unix_now() -> i64 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => -(e.duration().as_secs() as i64),
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: i64, day: i64) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = (if y >= 0 { y } else { y - 399 }) / 400;
    let yoe = y - era * 400;
    let mp = (month + 9) % 12;
    let doy = (153 * mp + 2) / 5 + day - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Splits Unix seconds into (year, month, day, hour, minute, second) in UTC.
fn civil_from_unix(secs: i64) -> (i64, u32, u32, u32, u32, u32) {
    let days = secs.div_euclid(86_400);
    let rem = secs.rem_euclid(86_400);
    let z = days + 719_468;
    let era = (if z >= 0 { z } else { z - 146_096 }) / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (
        year,
        month,
        day,
        (rem / 3600) as u32,
        ((rem % 3600) / 60) as u32,
        (rem % 60) as u32,
    )
}
