//! Month and year ranges for BETWEEN filters.
//!
//! All instants are UTC and serialise as RFC 3339 with millisecond
//! precision (`2023-03-31T23:59:59.999Z`), which PostgreSQL accepts for both
//! `date` and `timestamp` parameters.

use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::config::RangeBoundaries;
use crate::error::ParseError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DateRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl DateRange {
    pub fn start_string(&self) -> String {
        format_instant(&self.start)
    }

    pub fn end_string(&self) -> String {
        format_instant(&self.end)
    }

    /// `(start, end)` as bindable parameter values.
    pub fn to_params(&self) -> (Value, Value) {
        (
            Value::String(self.start_string()),
            Value::String(self.end_string()),
        )
    }
}

pub fn format_instant(instant: &DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Range covering `month` (1-based) of `year`.
///
/// ```
/// use mapped_query::date_range::month_range;
/// use mapped_query::RangeBoundaries;
///
/// let range = month_range(2023, 3, RangeBoundaries::Legacy).unwrap();
/// assert_eq!(range.start_string(), "2023-02-28T23:59:59.999Z");
/// assert_eq!(range.end_string(), "2023-03-31T23:59:59.999Z");
/// ```
pub fn month_range(
    year: i32,
    month: u32,
    boundaries: RangeBoundaries,
) -> Result<DateRange, ParseError> {
    let invalid = || {
        ParseError::invalid_value(
            "monthYear",
            format!("{}-{:02} is not a valid month", year, month),
        )
    };

    let first = NaiveDate::from_ymd_opt(year, month, 1).ok_or_else(invalid)?;
    let next_first = if month == 12 {
        NaiveDate::from_ymd_opt(year + 1, 1, 1)
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(invalid)?;

    Ok(span(first, next_first, boundaries))
}

/// Range covering the calendar year.
///
/// ```
/// use mapped_query::date_range::year_range;
/// use mapped_query::RangeBoundaries;
///
/// let range = year_range(2023, RangeBoundaries::Inclusive).unwrap();
/// assert_eq!(range.start_string(), "2023-01-01T00:00:00.000Z");
/// assert_eq!(range.end_string(), "2023-12-31T23:59:59.999Z");
/// ```
pub fn year_range(year: i32, boundaries: RangeBoundaries) -> Result<DateRange, ParseError> {
    let invalid = || ParseError::invalid_value("year", format!("{} is out of range", year));

    let first = NaiveDate::from_ymd_opt(year, 1, 1).ok_or_else(invalid)?;
    let next_first = NaiveDate::from_ymd_opt(year + 1, 1, 1).ok_or_else(invalid)?;

    Ok(span(first, next_first, boundaries))
}

/// `[first, next_first)` expressed as inclusive millisecond bounds.
fn span(first: NaiveDate, next_first: NaiveDate, boundaries: RangeBoundaries) -> DateRange {
    let one_ms = Duration::milliseconds(1);
    let period_start = first.and_time(NaiveTime::MIN);
    let start = match boundaries {
        RangeBoundaries::Legacy => period_start - one_ms,
        RangeBoundaries::Inclusive => period_start,
    };
    let end = next_first.and_time(NaiveTime::MIN) - one_ms;

    DateRange {
        start: Utc.from_utc_datetime(&start),
        end: Utc.from_utc_datetime(&end),
    }
}
