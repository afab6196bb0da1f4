//! UTC calendar-day keys.
//!
//! A `DateKey` names one published day. It serializes as `YEAR_MONTH_DAY`
//! with no zero padding on month or day (`2022_11_23`, `2023_1_5`) and is
//! used verbatim both as a URL path segment and as a directory name under
//! the data root.

use chrono::{Datelike, NaiveDate, Utc};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// One UTC calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DateKey(NaiveDate);

impl DateKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    /// Key for the current UTC date.
    pub fn today_utc() -> Self {
        Self(Utc::now().date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// Every day from `start` to `end` inclusive, ascending. Empty when
    /// `start` is after `end`.
    pub fn range(start: DateKey, end: DateKey) -> DateKeyRange {
        DateKeyRange {
            next: (start <= end).then_some(start.0),
            end: end.0,
        }
    }
}

impl fmt::Display for DateKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.0.year(), self.0.month(), self.0.day())
    }
}

/// Ascending iterator over a closed range of days.
#[derive(Debug, Clone)]
pub struct DateKeyRange {
    next: Option<NaiveDate>,
    end: NaiveDate,
}

impl Iterator for DateKeyRange {
    type Item = DateKey;

    fn next(&mut self) -> Option<DateKey> {
        let current = self.next?;
        self.next = if current < self.end {
            current.succ_opt()
        } else {
            None
        };
        Some(DateKey(current))
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseDateKeyError {
    #[error("expected YEAR_MONTH_DAY, got {0:?}")]
    Malformed(String),

    #[error("no such calendar day: {0:?}")]
    OutOfRange(String),
}

impl FromStr for DateKey {
    type Err = ParseDateKeyError;

    /// Parses `YEAR_MONTH_DAY`. Zero padding on month/day is accepted on
    /// input (`2023_01_05`); formatting always emits the unpadded form.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('_');
        let (year, month, day) = match (parts.next(), parts.next(), parts.next(), parts.next()) {
            (Some(y), Some(m), Some(d), None) => (y, m, d),
            _ => return Err(ParseDateKeyError::Malformed(s.to_string())),
        };

        let year: i32 = year
            .parse()
            .map_err(|_| ParseDateKeyError::Malformed(s.to_string()))?;
        let month: u32 = month
            .parse()
            .map_err(|_| ParseDateKeyError::Malformed(s.to_string()))?;
        let day: u32 = day
            .parse()
            .map_err(|_| ParseDateKeyError::Malformed(s.to_string()))?;

        NaiveDate::from_ymd_opt(year, month, day)
            .map(DateKey)
            .ok_or_else(|| ParseDateKeyError::OutOfRange(s.to_string()))
    }
}
