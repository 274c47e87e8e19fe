//! Daily sweep schedule in UTC.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Duration, NaiveTime, Utc};

use crate::domain::RecallError;

/// Time of day (UTC) at which the daily sweep fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepTime(NaiveTime);

impl SweepTime {
    pub fn new(hour: u32, minute: u32) -> Option<Self> {
        NaiveTime::from_hms_opt(hour, minute, 0).map(Self)
    }

    /// First firing strictly after `now`.
    pub fn next_after(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let today = now.date_naive().and_time(self.0).and_utc();
        if today > now {
            today
        } else {
            today + Duration::days(1)
        }
    }
}

impl Default for SweepTime {
    /// 02:00 UTC.
    fn default() -> Self {
        Self(NaiveTime::from_hms_opt(2, 0, 0).unwrap_or_default())
    }
}

impl FromStr for SweepTime {
    type Err = RecallError;

    /// Parses `HH:MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveTime::parse_from_str(s.trim(), "%H:%M")
            .map(Self)
            .map_err(|_| RecallError::invalid(format!("sweep time must be HH:MM, got '{s}'")))
    }
}

impl fmt::Display for SweepTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M"))
    }
}
