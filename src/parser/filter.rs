use crate::ast::{FieldType, Filter, FilterOperator};
use crate::error::ParseError;
use crate::field_registry::FieldRegistry;
use crate::operators::OperatorRegistry;
use nom::{character::complete::alpha1, combinator::all_consuming, IResult};
use serde_json::Value;

/// Keys that drive pagination, sorting and field selection rather than filtering.
pub fn reserved_key(key: &str) -> bool {
    matches!(key, "limit" | "offset" | "sort" | "sortField" | "fields")
}

fn operator_suffix(i: &str) -> IResult<&str, &str> {
    all_consuming(alpha1)(i)
}

/// Splits `<field>_<suffix>` at the last underscore when the suffix is
/// purely alphabetic. The suffix is not checked against the registry.
///
/// ```
/// use mapped_query::parser::split_operator_suffix;
///
/// assert_eq!(split_operator_suffix("age_gte"), Some(("age", "gte")));
/// assert_eq!(split_operator_suffix("created_at_dateRange"), Some(("created_at", "dateRange")));
/// assert_eq!(split_operator_suffix("page_2"), None);
/// assert_eq!(split_operator_suffix("name"), None);
/// ```
pub fn split_operator_suffix(key: &str) -> Option<(&str, &str)> {
    let (field, suffix) = key.rsplit_once('_')?;
    if field.is_empty() {
        return None;
    }
    operator_suffix(suffix).ok().map(|(_, op)| (field, op))
}

/// Resolves one query parameter into a filter.
///
/// A key naming a known field is a bare filter whose operator comes from
/// the field's declared type. Otherwise `<field>_<operator>` is tried.
/// Keys matching neither yield `Ok(None)` so mixed-purpose parameter maps
/// can pass through untouched.
///
/// # Errors
///
/// `UnsupportedOperator` when the field part is known but the suffix is not
/// a registered operator.
pub fn resolve_filter(
    key: &str,
    value: &Value,
    fields: &FieldRegistry,
) -> Result<Option<Filter>, ParseError> {
    if let Some(mapping) = fields.get(key) {
        let operator = default_operator(mapping.field_type, value);
        return Ok(Some(Filter::new(key, operator, value.clone())));
    }

    match split_operator_suffix(key) {
        Some((field, suffix)) if fields.contains(field) => {
            let spec = OperatorRegistry::global().get(suffix)?;
            Ok(Some(Filter::new(field, spec.operator, value.clone())))
        }
        _ => Ok(None),
    }
}

/// Type-driven operator for bare keys. Booleans pick `isFalse` for an
/// explicit false so `active=false` does not filter on true.
pub fn default_operator(field_type: FieldType, value: &Value) -> FilterOperator {
    if field_type == FieldType::Boolean && is_false(value) {
        return FilterOperator::IsFalse;
    }
    let name = field_type.default_operator();
    // Names returned by `FieldType::default_operator` are all registered.
    OperatorRegistry::global()
        .get(name)
        .map(|spec| spec.operator)
        .unwrap_or(FilterOperator::Eq)
}

fn is_false(value: &Value) -> bool {
    match value {
        Value::Bool(b) => !b,
        Value::String(s) => s.eq_ignore_ascii_case("false"),
        _ => false,
    }
}
