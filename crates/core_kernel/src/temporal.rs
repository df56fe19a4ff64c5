//! Time helpers for rentals and auctions
//!
//! - [`DateRange`]: a borrow period, billed per calendar month spanned
//! - [`TimeLeft`]: the countdown shown on a running auction

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Errors related to temporal operations
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemporalError {
    #[error("Invalid period: start {start} must not be after end {end}")]
    InvalidPeriod {
        start: String,
        end: String,
    },

    #[error("Date {0} is not in the future")]
    NotInFuture(String),
}

/// A closed period between two instants, such as a borrow period
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    /// Start of the period (inclusive)
    pub start: DateTime<Utc>,
    /// End of the period (inclusive)
    pub end: DateTime<Utc>,
}

impl DateRange {
    /// Creates a new range, rejecting an end that precedes the start
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TemporalError> {
        if end < start {
            return Err(TemporalError::InvalidPeriod {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Creates a range of `days` days starting at `start`
    pub fn days_from(start: DateTime<Utc>, days: i64) -> Self {
        Self {
            start,
            end: start + Duration::days(days.max(0)),
        }
    }

    /// Number of calendar months the range touches, never less than one
    ///
    /// Only the year and month components count: a rental from 31 January
    /// to 1 February spans one month, the same as 1 to 28 January.
    pub fn months_spanned(&self) -> u32 {
        let years = self.end.year() - self.start.year();
        let months = years * 12 + self.end.month() as i32 - self.start.month() as i32;
        months.max(1) as u32
    }

    /// Returns true if the instant lies within the range
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        instant >= self.start && instant <= self.end
    }

    /// Length of the range
    pub fn duration(&self) -> Duration {
        self.end - self.start
    }
}

/// Remaining time until a deadline, as shown on auction listings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeLeft {
    Remaining(Duration),
    Ended,
}

impl TimeLeft {
    /// Computes the time left from `now` until `deadline`
    pub fn until(deadline: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now >= deadline {
            TimeLeft::Ended
        } else {
            TimeLeft::Remaining(deadline - now)
        }
    }

    /// Returns true once the deadline has passed
    pub fn is_ended(&self) -> bool {
        matches!(self, TimeLeft::Ended)
    }
}

impl fmt::Display for TimeLeft {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeLeft::Ended => write!(f, "Auction Ended"),
            TimeLeft::Remaining(left) => {
                let total = left.num_seconds();
                let days = total / 86_400;
                let hours = (total % 86_400) / 3_600;
                let minutes = (total % 3_600) / 60;
                let seconds = total % 60;
                write!(f, "{:02}:{:02}:{:02}:{:02}", days, hours, minutes, seconds)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_months_spanned_minimum_one() {
        let range = DateRange::new(at(2025, 3, 1), at(2025, 3, 20)).unwrap();
        assert_eq!(range.months_spanned(), 1);
    }

    #[test]
    fn test_months_spanned_across_year() {
        let range = DateRange::new(at(2024, 11, 15), at(2025, 2, 1)).unwrap();
        assert_eq!(range.months_spanned(), 3);
    }

    #[test]
    fn test_inverted_range_rejected() {
        assert!(DateRange::new(at(2025, 3, 2), at(2025, 3, 1)).is_err());
    }

    #[test]
    fn test_time_left_format() {
        let now = at(2025, 1, 1);
        let deadline = now + Duration::days(2) + Duration::hours(3) + Duration::seconds(65);
        assert_eq!(TimeLeft::until(deadline, now).to_string(), "02:03:01:05");
    }

    #[test]
    fn test_time_left_ended() {
        let now = at(2025, 1, 1);
        assert_eq!(TimeLeft::until(now, now).to_string(), "Auction Ended");
    }
}
