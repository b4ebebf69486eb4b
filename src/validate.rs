use std::fmt;

use chrono::{Days, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;
use thiserror::Error;

use crate::models::DateRange;

static DATE_FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid pattern"));

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bound {
    Start,
    End,
}

impl fmt::Display for Bound {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Bound::Start => f.write_str("startDate"),
            Bound::End => f.write_str("endDate"),
        }
    }
}

/// Why a requested range was refused. Messages never repeat the rejected input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RangeError {
    #[error("{0} must be in YYYY-MM-DD format")]
    InvalidFormat(Bound),
    #[error("{0} is not a valid date")]
    InvalidDate(Bound),
    #[error("{0} cannot be in the future")]
    FutureDate(Bound),
    #[error("startDate must be before or equal to endDate")]
    InvertedRange,
    #[error("lastDays reaches past the earliest supported date")]
    WindowTooLong,
}

impl RangeError {
    /// Short title, as returned in the `error` field of a rejected request.
    pub fn title(&self) -> String {
        match self {
            RangeError::InvalidFormat(bound) => format!("Invalid {bound} format"),
            RangeError::InvalidDate(bound) | RangeError::FutureDate(bound) => {
                format!("Invalid {bound}")
            }
            RangeError::InvertedRange | RangeError::WindowTooLong => {
                "Invalid date range".to_string()
            }
        }
    }
}

fn parse_bound(
    raw: Option<&str>,
    bound: Bound,
    today: NaiveDate,
) -> Result<Option<NaiveDate>, RangeError> {
    let Some(raw) = raw.filter(|raw| !raw.is_empty()) else {
        return Ok(None);
    };
    if !DATE_FORMAT.is_match(raw) {
        return Err(RangeError::InvalidFormat(bound));
    }
    let date =
        NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| RangeError::InvalidDate(bound))?;
    if date > today {
        return Err(RangeError::FutureDate(bound));
    }
    Ok(Some(date))
}

/// Turns raw query bounds into a [`DateRange`] the metrics can trust.
pub fn validate_range(
    start: Option<&str>,
    end: Option<&str>,
    today: NaiveDate,
) -> Result<DateRange, RangeError> {
    let start_date = parse_bound(start, Bound::Start, today)?;
    let end_date = parse_bound(end, Bound::End, today)?;

    if let (Some(start), Some(end)) = (start_date, end_date) {
        if start > end {
            return Err(RangeError::InvertedRange);
        }
    }

    Ok(DateRange::new(start_date, end_date))
}

impl DateRange {
    /// The last `days` days, ending today.
    pub fn last_days(days: u32, today: NaiveDate) -> Result<Self, RangeError> {
        let start = today
            .checked_sub_days(Days::new(u64::from(days)))
            .ok_or(RangeError::WindowTooLong)?;
        Ok(DateRange::new(Some(start), Some(today)))
    }
}
