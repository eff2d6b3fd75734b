use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Length of the default reporting window ending at the latest record date.
const TRAILING_WINDOW_DAYS: i64 = 365;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PeriodError {
    #[error("Date range start {start} is after end {end}")]
    Inverted { start: NaiveDate, end: NaiveDate },
    #[error("Year {0} is out of range")]
    InvalidYear(i32),
}

/// Inclusive calendar-date range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} to {}", self.start, self.end)
    }
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        DateRange { start, end }
    }

    /// Like [`DateRange::new`] but rejects a start that falls after the end.
    pub fn checked(start: NaiveDate, end: NaiveDate) -> Result<Self, PeriodError> {
        if start > end {
            return Err(PeriodError::Inverted { start, end });
        }
        Ok(DateRange { start, end })
    }

    /// January 1 through December 31 of `year`.
    pub fn calendar_year(year: i32) -> Result<Self, PeriodError> {
        let start = NaiveDate::from_ymd_opt(year, 1, 1).ok_or(PeriodError::InvalidYear(year))?;
        let end = NaiveDate::from_ymd_opt(year, 12, 31).ok_or(PeriodError::InvalidYear(year))?;
        Ok(DateRange { start, end })
    }

    /// The 365 days leading up to and including `end`.
    pub fn trailing_year(end: NaiveDate) -> Self {
        DateRange {
            start: end - Duration::days(TRAILING_WINDOW_DAYS),
            end,
        }
    }

    pub fn contains(self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }

    /// Clamps both ends into `bounds`, keeping the range non-inverted.
    pub fn clamp_to(self, bounds: DateRange) -> Self {
        let start = self.start.clamp(bounds.start, bounds.end);
        let end = self.end.clamp(start, bounds.end.max(start));
        DateRange { start, end }
    }
}
