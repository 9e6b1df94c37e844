//! Calendar-day ranges that drive one fetch per day

use chrono::{Days, NaiveDate, NaiveTime};
use std::fmt;
use thiserror::Error;

/// Wire format for dates in URLs and CLI arguments
pub const DATE_FORMAT: &str = "%Y-%m-%d";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DateRangeError {
    #[error("Invalid format for start_date [{0}]. It should be YYYY-MM-DD.")]
    InvalidStartDate(String),

    #[error("Invalid format for end_date [{0}]. It should be YYYY-MM-DD.")]
    InvalidEndDate(String),

    #[error("end_date {end} cannot be before start_date {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },

    #[error("date range must contain at least one day")]
    Empty,

    #[error("dates must be strictly ascending: {previous} is followed by {next}")]
    NotAscending { previous: NaiveDate, next: NaiveDate },

    #[error("looking back {days} days from {from} leaves the supported calendar")]
    LookbackOutOfRange { from: NaiveDate, days: u64 },
}

/// Ascending, duplicate-free, non-empty sequence of calendar days
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DateRange {
    days: Vec<NaiveDate>,
}

impl DateRange {
    /// Build from explicit days, rejecting empty, unsorted or duplicated input
    pub fn from_days(days: Vec<NaiveDate>) -> Result<Self, DateRangeError> {
        if days.is_empty() {
            return Err(DateRangeError::Empty);
        }

        for pair in days.windows(2) {
            if pair[1] <= pair[0] {
                return Err(DateRangeError::NotAscending {
                    previous: pair[0],
                    next: pair[1],
                });
            }
        }

        Ok(Self { days })
    }

    /// Inclusive daily range `[start, end]`
    pub fn inclusive(start: NaiveDate, end: NaiveDate) -> Result<Self, DateRangeError> {
        if end < start {
            return Err(DateRangeError::EndBeforeStart { start, end });
        }

        let days = start.iter_days().take_while(|day| *day <= end).collect();
        Ok(Self { days })
    }

    /// Resolve optional CLI dates against `today` (UTC).
    ///
    /// A missing end defaults to yesterday, a missing start to
    /// `end - lookback_days`.
    pub fn resolve(
        start: Option<&str>,
        end: Option<&str>,
        lookback_days: u32,
        today: NaiveDate,
    ) -> Result<Self, DateRangeError> {
        let end = match end {
            Some(raw) => parse_day(raw).ok_or_else(|| DateRangeError::InvalidEndDate(raw.to_string()))?,
            None => days_before(today, 1)?,
        };

        let start = match start {
            Some(raw) => {
                parse_day(raw).ok_or_else(|| DateRangeError::InvalidStartDate(raw.to_string()))?
            }
            None => days_before(end, u64::from(lookback_days))?,
        };

        Self::inclusive(start, end)
    }

    pub fn first(&self) -> NaiveDate {
        self.days[0]
    }

    pub fn last(&self) -> NaiveDate {
        self.days[self.days.len() - 1]
    }

    pub fn len(&self) -> usize {
        self.days.len()
    }

    /// Always false; kept for API symmetry with `len`
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    pub fn days(&self) -> &[NaiveDate] {
        &self.days
    }

    pub fn iter(&self) -> impl Iterator<Item = NaiveDate> + '_ {
        self.days.iter().copied()
    }

    /// Sorted union of both ranges
    pub fn union(&self, other: &DateRange) -> DateRange {
        let mut days: Vec<NaiveDate> = self.days.iter().chain(other.days.iter()).copied().collect();
        days.sort_unstable();
        days.dedup();
        DateRange { days }
    }

    /// UTC epoch seconds of the first day at midnight
    pub fn start_timestamp(&self) -> i64 {
        midnight_utc(self.first())
    }

    /// UTC epoch seconds of the last day at midnight
    pub fn end_timestamp(&self) -> i64 {
        midnight_utc(self.last())
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.first().format(DATE_FORMAT),
            self.last().format(DATE_FORMAT)
        )
    }
}

fn parse_day(raw: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), DATE_FORMAT).ok()
}

fn days_before(from: NaiveDate, days: u64) -> Result<NaiveDate, DateRangeError> {
    from.checked_sub_days(Days::new(days))
        .ok_or(DateRangeError::LookbackOutOfRange { from, days })
}

fn midnight_utc(day: NaiveDate) -> i64 {
    day.and_time(NaiveTime::MIN).and_utc().timestamp()
}
