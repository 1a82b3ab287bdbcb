//! Civil-date helpers for the lifecycle filter.
//!
//! Lifecycle gating only needs day resolution, so dates are plain
//! `YYYY-MM-DD` values with ordinal comparison. The UTC day is read once
//! per classification call and threaded through as data.

use crate::core::error::CarapaceError;
use serde::{Deserialize, Serialize};

/// A calendar date with day resolution. Ordering is chronological.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct CivilDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CivilDate {
    /// Parse a `YYYY-MM-DD` string.
    pub fn parse(s: &str) -> Result<Self, CarapaceError> {
        let parse_err =
            || CarapaceError::ValidationError(format!("invalid date '{}': expected YYYY-MM-DD", s));
        let mut parts = s.trim().splitn(3, '-');
        let (y, m, d) = match (parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d)) => (y, m, d),
            _ => return Err(parse_err()),
        };
        let year: i32 = y.parse().map_err(|_| parse_err())?;
        let month: u32 = m.parse().map_err(|_| parse_err())?;
        let day: u32 = d.parse().map_err(|_| parse_err())?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(parse_err());
        }
        Ok(CivilDate { year, month, day })
    }

    /// Current UTC day, derived from unix-epoch seconds.
    pub fn today_utc() -> Self {
        use std::time::{SystemTime, UNIX_EPOCH};
        let secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        Self::from_epoch_days((secs / 86_400) as i64)
    }

    /// Convert days since 1970-01-01 to a civil date (proleptic Gregorian).
    pub fn from_epoch_days(days: i64) -> Self {
        let z = days + 719_468;
        let era = if z >= 0 { z } else { z - 146_096 } / 146_097;
        let doe = z - era * 146_097;
        let yoe = (doe - doe / 1460 + doe / 36_524 - doe / 146_096) / 365;
        let y = yoe + era * 400;
        let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
        let mp = (5 * doy + 2) / 153;
        let day = (doy - (153 * mp + 2) / 5 + 1) as u32;
        let month = (if mp < 10 { mp + 3 } else { mp - 9 }) as u32;
        let year = (if month <= 2 { y + 1 } else { y }) as i32;
        CivilDate { year, month, day }
    }
}

impl std::fmt::Display for CivilDate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

impl TryFrom<String> for CivilDate {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        CivilDate::parse(&s).map_err(|e| e.to_string())
    }
}

impl From<CivilDate> for String {
    fn from(d: CivilDate) -> Self {
        d.to_string()
    }
}
