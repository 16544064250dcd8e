use crate::ast::{Direction, SortTerm};
use crate::error::ParseError;

pub fn parse_direction(s: &str) -> Result<Direction, ParseError> {
    match s.trim().to_ascii_lowercase().as_str() {
        "asc" => Ok(Direction::Asc),
        "desc" => Ok(Direction::Desc),
        _ => Err(ParseError::InvalidDirection(s.to_string())),
    }
}

/// Parses the `sort` / `sortField` query parameters into sort terms.
///
/// # Syntax
///
/// - `sortField=name&sort=desc`: one field, `sort` is the direction
/// - `sort=name`: ascending
/// - `sort=-createdAt`: descending
/// - `sort=createdAt:desc,name:asc`: explicit directions, several fields
///
/// # Examples
///
/// ```
/// use mapped_query::parser::parse_sort;
/// use mapped_query::Direction;
///
/// let terms = parse_sort(Some("-createdAt,name"), None).unwrap();
/// assert_eq!(terms.len(), 2);
/// assert_eq!(terms[0].direction, Direction::Desc);
///
/// let terms = parse_sort(Some("desc"), Some("name")).unwrap();
/// assert_eq!(terms[0].field, "name");
/// assert_eq!(terms[0].direction, Direction::Desc);
/// ```
pub fn parse_sort(
    sort: Option<&str>,
    sort_field: Option<&str>,
) -> Result<Vec<SortTerm>, ParseError> {
    if let Some(field) = sort_field.map(str::trim).filter(|f| !f.is_empty()) {
        let direction = match sort.map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) => parse_direction(dir)?,
            None => Direction::Asc,
        };
        return Ok(vec![SortTerm::new(field).with_direction(direction)]);
    }

    let Some(sort) = sort else {
        return Ok(Vec::new());
    };

    sort.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(parse_sort_term)
        .collect()
}

/// Parses `name`, `-name` or `name:desc`.
pub fn parse_sort_term(term: &str) -> Result<SortTerm, ParseError> {
    if let Some(field) = term.strip_prefix('-') {
        return Ok(SortTerm::new(field.trim()).desc());
    }

    match term.split_once(':') {
        Some((field, dir)) => Ok(SortTerm::new(field.trim()).with_direction(parse_direction(dir)?)),
        None => Ok(SortTerm::new(term)),
    }
}
