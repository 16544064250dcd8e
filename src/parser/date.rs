use crate::error::ParseError;
use nom::{
    bytes::complete::take_while_m_n,
    character::complete::char,
    combinator::{all_consuming, map_res},
    sequence::separated_pair,
    IResult,
};
use serde_json::Value;

/// Parses a range value into `(start, end)`.
///
/// Accepts `"start,end"` (exactly two non-empty parts, trimmed) or an object
/// with `start` and `end` keys. The bounds are returned as given; they are
/// bound as parameters, not interpreted.
///
/// # Examples
///
/// ```
/// use mapped_query::parser::parse_date_range;
/// use serde_json::json;
///
/// let (start, end) = parse_date_range(&json!("2024-01-01, 2024-01-31")).unwrap();
/// assert_eq!(start, json!("2024-01-01"));
/// assert_eq!(end, json!("2024-01-31"));
///
/// let (start, _) = parse_date_range(&json!({"start": "2024-01-01", "end": "2024-02-01"})).unwrap();
/// assert_eq!(start, json!("2024-01-01"));
///
/// assert!(parse_date_range(&json!("2024-01-01")).is_err());
/// ```
pub fn parse_date_range(value: &Value) -> Result<(Value, Value), ParseError> {
    match value {
        Value::String(s) => {
            let parts: Vec<&str> = s.split(',').map(str::trim).collect();
            match parts.as_slice() {
                [start, end] if !start.is_empty() && !end.is_empty() => Ok((
                    Value::String(start.to_string()),
                    Value::String(end.to_string()),
                )),
                _ => Err(ParseError::InvalidRangeFormat(s.clone())),
            }
        }
        Value::Object(map) => match (map.get("start"), map.get("end")) {
            (Some(start), Some(end)) if !start.is_null() && !end.is_null() => {
                Ok((start.clone(), end.clone()))
            }
            _ => Err(ParseError::InvalidRangeFormat(value.to_string())),
        },
        other => Err(ParseError::InvalidRangeFormat(other.to_string())),
    }
}

fn year_digits(i: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(4, 4, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(i)
}

fn month_digits(i: &str) -> IResult<&str, u32> {
    map_res(take_while_m_n(1, 2, |c: char| c.is_ascii_digit()), |s: &str| {
        s.parse::<u32>()
    })(i)
}

fn month_year(i: &str) -> IResult<&str, (u32, u32)> {
    all_consuming(separated_pair(year_digits, char('-'), month_digits))(i)
}

/// Parses `"YYYY-MM"` into `(year, month)`. The month is range-checked when
/// the month range is computed, not here.
pub fn parse_month_year(value: &Value) -> Result<(i32, u32), ParseError> {
    let invalid = || {
        ParseError::invalid_value("monthYear", format!("expected YYYY-MM, got {}", value))
    };

    let text = value.as_str().ok_or_else(invalid)?;
    let (_, (year, month)) = month_year(text.trim()).map_err(|_| invalid())?;
    let year = i32::try_from(year).map_err(|_| invalid())?;
    Ok((year, month))
}

/// Parses a year given as an integer or a numeric string.
pub fn parse_year(value: &Value) -> Result<i32, ParseError> {
    let parsed = match value {
        Value::Number(n) => n.as_i64().and_then(|y| i32::try_from(y).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| ParseError::InvalidInteger(value.to_string()))
}
