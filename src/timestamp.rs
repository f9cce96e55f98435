//! MS-DOS date/time handling.
//!
//! ZIP headers store modification times as two 16-bit MS-DOS fields:
//!
//! - date: `(year - 1980) << 9 | month << 5 | day`
//! - time: `hour << 11 | minute << 5 | second / 2`
//!
//! The representable range is 1980-01-01 00:00:00 to 2107-12-31 23:59:58
//! and seconds have a granularity of two. Conversions from [`SystemTime`]
//! are performed in UTC.
//!
//! # Example
//!
//! ```rust
//! use zipcore::DosDateTime;
//!
//! let ts = DosDateTime::new(2024, 2, 29, 13, 45, 10).unwrap();
//! let (time, date) = ts.to_dos();
//! assert_eq!(DosDateTime::from_dos(time, date), ts);
//! ```

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use crate::{Error, Result};

/// Earliest year representable in an MS-DOS date.
pub const MIN_YEAR: u16 = 1980;

/// Latest year representable in an MS-DOS date.
pub const MAX_YEAR: u16 = 2107;

const SECS_PER_DAY: u64 = 86_400;

/// A timestamp as stored in ZIP headers.
///
/// Fields are kept as decoded, so a value read from a damaged header may
/// hold out-of-range components. Values built with [`DosDateTime::new`] are
/// validated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DosDateTime {
    year: u16,
    month: u8,
    day: u8,
    hour: u8,
    minute: u8,
    second: u8,
}

impl DosDateTime {
    /// The earliest representable timestamp, 1980-01-01 00:00:00.
    pub const MIN: DosDateTime = DosDateTime {
        year: MIN_YEAR,
        month: 1,
        day: 1,
        hour: 0,
        minute: 0,
        second: 0,
    };

    /// The latest representable timestamp, 2107-12-31 23:59:59.
    pub const MAX: DosDateTime = DosDateTime {
        year: MAX_YEAR,
        month: 12,
        day: 31,
        hour: 23,
        minute: 59,
        second: 59,
    };

    /// Creates a validated timestamp.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidTimestamp`] for years outside 1980..=2107 or
    /// out-of-range components.
    pub fn new(year: u16, month: u8, day: u8, hour: u8, minute: u8, second: u8) -> Result<Self> {
        if year < MIN_YEAR {
            return Err(Error::InvalidTimestamp(format!(
                "ZIP does not support timestamps before {MIN_YEAR} (got {year})"
            )));
        }
        if year > MAX_YEAR {
            return Err(Error::InvalidTimestamp(format!(
                "ZIP does not support timestamps after {MAX_YEAR} (got {year})"
            )));
        }
        if !(1..=12).contains(&month)
            || day == 0
            || day > days_in_month(year, month)
            || hour > 23
            || minute > 59
            || second > 59
        {
            return Err(Error::InvalidTimestamp(format!(
                "{year:04}-{month:02}-{day:02} {hour:02}:{minute:02}:{second:02} is not a valid date/time"
            )));
        }
        Ok(Self {
            year,
            month,
            day,
            hour,
            minute,
            second,
        })
    }

    /// Decodes the MS-DOS `time` and `date` header fields.
    pub fn from_dos(time: u16, date: u16) -> Self {
        Self {
            year: (date >> 9) + MIN_YEAR,
            month: ((date >> 5) & 0x0F) as u8,
            day: (date & 0x1F) as u8,
            hour: (time >> 11) as u8,
            minute: ((time >> 5) & 0x3F) as u8,
            second: ((time & 0x1F) * 2) as u8,
        }
    }

    /// Encodes the timestamp as MS-DOS `(time, date)` header fields.
    ///
    /// Odd seconds are rounded down.
    pub fn to_dos(&self) -> (u16, u16) {
        let date = ((self.year.saturating_sub(MIN_YEAR) & 0x7F) << 9)
            | ((self.month as u16 & 0x0F) << 5)
            | (self.day as u16 & 0x1F);
        let time = ((self.hour as u16 & 0x1F) << 11)
            | ((self.minute as u16 & 0x3F) << 5)
            | ((self.second as u16 / 2) & 0x1F);
        (time, date)
    }

    /// Converts a [`SystemTime`] (interpreted as UTC).
    ///
    /// With `strict` set, times outside the representable range are an
    /// error; otherwise they are clamped to [`DosDateTime::MIN`] or
    /// [`DosDateTime::MAX`].
    pub fn from_system_time(time: SystemTime, strict: bool) -> Result<Self> {
        let secs = match time.duration_since(UNIX_EPOCH) {
            Ok(d) => d.as_secs(),
            Err(_) if strict => {
                return Err(Error::InvalidTimestamp(
                    "ZIP does not support timestamps before 1980".into(),
                ));
            }
            Err(_) => return Ok(Self::MIN),
        };
        let days = secs / SECS_PER_DAY;
        let rem = secs % SECS_PER_DAY;
        let (year, month, day) = civil_from_days(days as i64);
        if year < MIN_YEAR as i64 || year > MAX_YEAR as i64 {
            if strict {
                return Err(Error::InvalidTimestamp(format!(
                    "year {year} is outside the ZIP range {MIN_YEAR}..={MAX_YEAR}"
                )));
            }
            return Ok(if year < MIN_YEAR as i64 {
                Self::MIN
            } else {
                Self::MAX
            });
        }
        Ok(Self {
            year: year as u16,
            month,
            day,
            hour: (rem / 3600) as u8,
            minute: ((rem % 3600) / 60) as u8,
            second: (rem % 60) as u8,
        })
    }

    /// Returns the current time, clamped to the representable range.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now(), false).unwrap_or(Self::MIN)
    }

    /// Converts to a [`SystemTime`], interpreting the fields as UTC.
    ///
    /// Returns `None` for out-of-range components read from a damaged header.
    pub fn to_system_time(&self) -> Option<SystemTime> {
        if !(1..=12).contains(&self.month)
            || self.day == 0
            || self.day > days_in_month(self.year, self.month)
            || self.hour > 23
            || self.minute > 59
            || self.second > 59
        {
            return None;
        }
        let days = days_from_civil(self.year as i64, self.month, self.day);
        let secs = days as u64 * SECS_PER_DAY
            + self.hour as u64 * 3600
            + self.minute as u64 * 60
            + self.second as u64;
        UNIX_EPOCH.checked_add(Duration::from_secs(secs))
    }

    /// Returns the year.
    pub fn year(&self) -> u16 {
        self.year
    }

    /// Returns the month (1-12).
    pub fn month(&self) -> u8 {
        self.month
    }

    /// Returns the day of the month (1-31).
    pub fn day(&self) -> u8 {
        self.day
    }

    /// Returns the hour (0-23).
    pub fn hour(&self) -> u8 {
        self.hour
    }

    /// Returns the minute (0-59).
    pub fn minute(&self) -> u8 {
        self.minute
    }

    /// Returns the second (0-59).
    pub fn second(&self) -> u8 {
        self.second
    }
}

impl Default for DosDateTime {
    fn default() -> Self {
        Self::MIN
    }
}

impl std::fmt::Display for DosDateTime {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}-{:02}-{:02} {:02}:{:02}:{:02}",
            self.year, self.month, self.day, self.hour, self.minute, self.second
        )
    }
}

fn is_leap_year(year: u16) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

fn days_in_month(year: u16, month: u8) -> u8 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Days since 1970-01-01 for a proleptic Gregorian date.
fn days_from_civil(year: i64, month: u8, day: u8) -> i64 {
    let y = if month <= 2 { year - 1 } else { year };
    let era = y.div_euclid(400);
    let yoe = y - era * 400;
    let m = month as i64;
    let doy = (153 * (if m > 2 { m - 3 } else { m + 9 }) + 2) / 5 + day as i64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    era * 146_097 + doe - 719_468
}

/// Inverse of [`days_from_civil`].
fn civil_from_days(days: i64) -> (i64, u8, u8) {
    let z = days + 719_468;
    let era = z.div_euclid(146_097);
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = (doy - (153 * mp + 2) / 5 + 1) as u8;
    let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u8;
    let year = yoe + era * 400 + if month <= 2 { 1 } else { 0 };
    (year, month, day)
}
