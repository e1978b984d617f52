use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum WindowError {
    #[error("window start {start} is after end {end}")]
    Inverted { start: i64, end: i64 },

    #[error("unix timestamp out of range: {0}")]
    OutOfRange(i64),

    #[error("trailing window of {days} days is out of range")]
    DaysOutOfRange { days: u32 },
}

/// Time range over which every asset's prices are fetched.
///
/// All series of one run share the same window so that they can be compared
/// position-wise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, WindowError> {
        if start > end {
            return Err(WindowError::Inverted {
                start: start.timestamp(),
                end: end.timestamp(),
            });
        }
        Ok(Self { start, end })
    }

    /// Window from unix seconds.
    pub fn from_unix(start: i64, end: i64) -> Result<Self, WindowError> {
        let s = DateTime::from_timestamp(start, 0).ok_or(WindowError::OutOfRange(start))?;
        let e = DateTime::from_timestamp(end, 0).ok_or(WindowError::OutOfRange(end))?;
        Self::new(s, e)
    }

    /// The trailing `days` ending at `now`.
    pub fn trailing_days(now: DateTime<Utc>, days: u32) -> Result<Self, WindowError> {
        let start = Duration::try_days(i64::from(days))
            .and_then(|span| now.checked_sub_signed(span))
            .ok_or(WindowError::DaysOutOfRange { days })?;
        Ok(Self { start, end: now })
    }

    pub fn start_unix(&self) -> i64 {
        self.start.timestamp()
    }

    pub fn end_unix(&self) -> i64 {
        self.end.timestamp()
    }
}
