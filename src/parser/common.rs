use crate::error::ParseError;
use nom::{
    bytes::complete::{take_while, take_while1},
    character::complete::char,
    combinator::{all_consuming, recognize},
    multi::many0,
    sequence::{pair, preceded},
    IResult,
};
use serde_json::{Map, Value};

fn is_ident_start(c: char) -> bool {
    c.is_ascii_alphabetic() || c == '_'
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`
pub fn identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(take_while1(is_ident_start), take_while(is_ident_char)))(i)
}

/// Dot-separated identifiers, e.g. `public.users` or `u.created_at`.
pub fn qualified_identifier(i: &str) -> IResult<&str, &str> {
    recognize(pair(identifier, many0(preceded(char('.'), identifier))))(i)
}

/// Rejects anything that is not a plain SQL identifier. Schema, table,
/// alias and CTE names are spliced into the statement, never bound.
pub fn validate_identifier(name: &str) -> Result<&str, ParseError> {
    all_consuming(identifier)(name)
        .map(|(_, ident)| ident)
        .map_err(|_| ParseError::InvalidIdentifier(name.to_string()))
}

pub fn validate_qualified_identifier(name: &str) -> Result<&str, ParseError> {
    all_consuming(qualified_identifier)(name)
        .map(|(_, ident)| ident)
        .map_err(|_| ParseError::InvalidIdentifier(name.to_string()))
}

/// Normalises list-valued input: arrays pass through, strings are split on
/// commas (trimmed, empties dropped), null is empty, other scalars become a
/// single-element list.
pub fn coerce_to_list(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        Value::String(s) => s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| Value::String(part.to_string()))
            .collect(),
        Value::Null => Vec::new(),
        other => vec![other.clone()],
    }
}

/// True for values a dynamic filter should ignore: null or the empty string.
pub fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.is_empty(),
        _ => false,
    }
}

/// Decodes an URL query string into an ordered parameter map. Repeated
/// keys keep the position of their first occurrence and the last value;
/// keys that decode to nothing are dropped.
pub fn parse_query_string(query_string: &str) -> Result<Map<String, Value>, ParseError> {
    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(query_string.trim_start_matches('?'))
            .map_err(|e| ParseError::InvalidQueryString(e.to_string()))?;

    Ok(pairs
        .into_iter()
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key, Value::String(value)))
        .collect())
}
