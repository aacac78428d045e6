//! Date range resolution
//!
//! Turns user supplied text into an inclusive [`DateRange`]. Two input modes
//! are supported:
//! - an explicit start date with an optional end date (`mm-dd-yyyy`)
//! - a single month token such as `february-2024`, `feb 2024` or `02-2024`
//!
//! Input is fully validated before anything is returned; a malformed value
//! never produces a partially resolved range.

use crate::error::{Error, Result};
use chrono::{Datelike, Local, NaiveDate, NaiveDateTime, NaiveTime};
use std::fmt;

/// Calendar date format accepted for explicit dates
pub const DATE_FORMAT: &str = "%m-%d-%Y";

const MONTH_NAMES: [&str; 12] = [
    "january",
    "february",
    "march",
    "april",
    "may",
    "june",
    "july",
    "august",
    "september",
    "october",
    "november",
    "december",
];

/// Inclusive time window `[start, end]`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl DateRange {
    /// Build a range from two instants, rejecting `start > end`
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        if start > end {
            return Err(Error::StartAfterEnd {
                start: start.to_string(),
                end: end.to_string(),
            });
        }
        Ok(Self { start, end })
    }

    /// Range covering whole calendar days from `first` through `last`
    pub fn from_days(first: NaiveDate, last: NaiveDate) -> Result<Self> {
        Self::new(start_of_day(first), end_of_day(last))
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Whether `instant` falls inside the range (both ends inclusive)
    pub fn contains(&self, instant: &NaiveDateTime) -> bool {
        *instant >= self.start && *instant <= self.end
    }
}

impl fmt::Display for DateRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} to {}",
            self.start.format(DATE_FORMAT),
            self.end.format(DATE_FORMAT)
        )
    }
}

/// Resolve an explicit start/end pair, defaulting a missing end to today
pub fn resolve_explicit(start: Option<&str>, end: Option<&str>) -> Result<DateRange> {
    resolve_explicit_at(start, end, Local::now().date_naive())
}

/// Same as [`resolve_explicit`] with a caller supplied "today"
pub fn resolve_explicit_at(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange> {
    let start = match start.map(str::trim) {
        Some(s) if !s.is_empty() => parse_date(s)?,
        _ => return Err(Error::MissingStartDate),
    };

    let end = match end.map(str::trim) {
        Some(e) if !e.is_empty() => parse_date(e)?,
        _ => today,
    };

    DateRange::from_days(start, end)
}

/// Resolve a month token to the first and last instant of that month
pub fn resolve_month(token: &str) -> Result<DateRange> {
    let invalid = || Error::InvalidMonth {
        input: token.to_string(),
    };

    let parts: Vec<&str> = token
        .trim()
        .split(|c: char| c == '-' || c == '/' || c.is_whitespace())
        .filter(|p| !p.is_empty())
        .collect();
    let [month, year] = parts.as_slice() else {
        return Err(invalid());
    };

    let month = parse_month(month).ok_or_else(invalid)?;
    let year: i32 = year
        .parse()
        .ok()
        .filter(|y| (1000..=9999).contains(y))
        .ok_or_else(invalid)?;

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let last = last_day_of_month(first).ok_or_else(invalid)?;
    DateRange::from_days(first, last)
}

/// Parse a `mm-dd-yyyy` calendar date
pub fn parse_date(input: &str) -> Result<NaiveDate> {
    let trimmed = input.trim();
    // chrono accepts unpadded fields, the format is fixed-width
    if trimmed.len() != 10 {
        return Err(Error::InvalidDate {
            input: input.to_string(),
        });
    }
    NaiveDate::parse_from_str(trimmed, DATE_FORMAT).map_err(|_| Error::InvalidDate {
        input: input.to_string(),
    })
}

fn parse_month(token: &str) -> Option<u32> {
    if let Ok(n) = token.parse::<u32>() {
        return (1..=12).contains(&n).then_some(n);
    }

    let lower = token.to_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTH_NAMES
        .iter()
        .position(|name| name.starts_with(&lower))
        .map(|i| i as u32 + 1)
}

fn last_day_of_month(first: NaiveDate) -> Option<NaiveDate> {
    let (year, month) = if first.month() == 12 {
        (first.year() + 1, 1)
    } else {
        (first.year(), first.month() + 1)
    };
    NaiveDate::from_ymd_opt(year, month, 1)?.pred_opt()
}

fn start_of_day(date: NaiveDate) -> NaiveDateTime {
    date.and_time(NaiveTime::MIN)
}

fn end_of_day(date: NaiveDate) -> NaiveDateTime {
    // 23:59:59.999999 is always a valid time of day
    date.and_time(NaiveTime::from_hms_micro_opt(23, 59, 59, 999_999).unwrap_or(NaiveTime::MIN))
}
