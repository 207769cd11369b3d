//! UTC datetime utilities without timezone dependencies.
//!
//! Provides a lightweight `DateTimeUtc` struct for rendering photo
//! timestamps and log clocks.
//!
//! # Examples
//!
//! ```ignore
//! let dt = DateTimeUtc::from_unix_millis(1_700_000_000_123);
//! assert_eq!(dt.to_rfc3339_millis(), "2023-11-14T22:13:20.123Z");
//! assert_eq!(dt.clock(), "22:13:20");
//! ```

use std::time::{SystemTime, UNIX_EPOCH};

const MILLIS_PER_DAY: u64 = 86_400_000;

/// UTC datetime without timezone complexity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateTimeUtc {
    pub year: u16,
    pub month: u8,
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
    pub second: u8,
    pub millis: u16,
}

impl DateTimeUtc {
    /// Convert milliseconds since the Unix epoch.
    #[allow(clippy::cast_possible_truncation)] // all components are range-checked by construction
    pub fn from_unix_millis(millis: u64) -> Self {
        let days = millis / MILLIS_PER_DAY;
        let rem = millis % MILLIS_PER_DAY;
        let (year, month, day) = civil_from_days(days);

        Self {
            year,
            month,
            day,
            hour: (rem / 3_600_000) as u8,
            minute: ((rem / 60_000) % 60) as u8,
            second: ((rem / 1000) % 60) as u8,
            millis: (rem % 1000) as u16,
        }
    }

    /// Convert a `SystemTime`. Times before the epoch clamp to the epoch.
    pub fn from_system_time(time: SystemTime) -> Self {
        Self::from_unix_millis(unix_millis(time))
    }

    /// Current UTC time.
    pub fn now() -> Self {
        Self::from_system_time(SystemTime::now())
    }

    /// Format as `YYYY-MM-DDTHH:MM:SS.mmmZ` (the JSON date form browsers parse).
    pub fn to_rfc3339_millis(self) -> String {
        format!(
            "{:04}-{:02}-{:02}T{:02}:{:02}:{:02}.{:03}Z",
            self.year, self.month, self.day, self.hour, self.minute, self.second, self.millis
        )
    }

    /// Format as `HH:MM:SS`.
    pub fn clock(self) -> String {
        format!("{:02}:{:02}:{:02}", self.hour, self.minute, self.second)
    }
}

/// Milliseconds since the Unix epoch, clamped at zero.
#[allow(clippy::cast_possible_truncation)] // u64 millis covers ~584 million years
pub fn unix_millis(time: SystemTime) -> u64 {
    time.duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Days since 1970-01-01 to (year, month, day), proleptic Gregorian.
#[allow(clippy::cast_possible_truncation)]
fn civil_from_days(days: u64) -> (u16, u8, u8) {
    // Shift epoch to 0000-03-01 so leap days fall at the end of each year.
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z - era * 146_097;
    let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);

    (year as u16, month as u8, day as u8)
}
