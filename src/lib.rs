//! # Mapped Query
//!
//! Parameterized PostgreSQL query construction driven by a field-mapping table.
//!
//! Callers declare once how logical field names map onto physical columns or
//! SQL expressions. Per request, free-form key/value parameters whose keys
//! carry an optional operator suffix (`age_gte`, `role_in`,
//! `meta_jsonContains`) become SQL predicates with positional parameters
//! (`$1, $2, ...`), and are wrapped into complete SELECT or COUNT statements.
//!
//! ## Features
//!
//! - **Field mapping**: logical names, physical expressions, declared types
//! - **50 filter operators**: comparison, pattern, list, range, date, JSON,
//!   array, full-text search, null and boolean checks
//! - **Type-driven defaults**: a bare `name=bob` becomes `ILIKE '%bob%'` for
//!   strings, `=` for ids and numbers, a date range for timestamps
//! - **Date helpers**: `monthYear` and `year` filters expand to BETWEEN ranges
//! - **Statement assembly**: CTEs, joins, field selection, sorting,
//!   aggregates, GROUP BY and LIMIT/OFFSET
//! - **Response mapping**: result columns back to logical names
//!
//! ## Quick Start
//!
//! ```rust
//! use mapped_query::{build_filter_clause, FieldRegistry, FieldType, FilterRequest};
//! use serde_json::json;
//!
//! let fields = FieldRegistry::new()
//!     .with_field("id", "t.id", FieldType::Uuid).unwrap()
//!     .with_field("name", "t.name", FieldType::String).unwrap()
//!     .with_field("age", "t.age", FieldType::Number).unwrap();
//!
//! let request = FilterRequest::new()
//!     .with_required("id", "X")
//!     .with_param("name_like", "bob")
//!     .with_param("limit", "10");
//!
//! let result = build_filter_clause(&fields, &request).unwrap();
//! assert_eq!(result.clause, "WHERE t.id = $1 AND t.name ILIKE $2");
//! assert_eq!(result.params, vec![json!("X"), json!("%bob%")]);
//! ```
//!
//! ## Filter Keys
//!
//! - `field=value`: operator chosen by the field's declared type
//! - `field_<operator>=value`: explicit operator, e.g. `age_gte=18`
//! - `limit`, `offset`, `sort`, `sortField` and `fields` are reserved
//! - keys naming no known field are ignored
//!
//! ### Full Statements
//! ```rust
//! use mapped_query::{query_string_to_sql, FieldRegistry, FieldType};
//!
//! let fields = FieldRegistry::new()
//!     .with_field("id", "u.id", FieldType::Uuid).unwrap()
//!     .with_field("createdAt", "u.created_at", FieldType::Timestamp).unwrap();
//!
//! let result = query_string_to_sql(
//!     "users",
//!     Some("u"),
//!     &fields,
//!     "createdAt_monthYear=2023-03&sort=-createdAt&limit=5",
//! ).unwrap();
//!
//! assert!(result.query.contains("WHERE u.created_at BETWEEN $1 AND $2"));
//! assert!(result.query.contains("ORDER BY u.created_at DESC LIMIT $3 OFFSET $4"));
//! ```

pub mod ast;
pub mod config;
pub mod date_range;
pub mod error;
pub mod field_registry;
pub mod operators;
pub mod parser;
pub mod sql;

pub use ast::{
    Aggregate, AggregateFn, Cte, Direction, FieldMapping, FieldType, Filter, FilterOperator,
    FilterRequest, Join, JoinKind, SortTerm,
};
pub use config::{BuilderConfig, RangeBoundaries};
pub use date_range::{month_range, year_range, DateRange};
pub use error::{Error, ParseError, SqlError};
pub use field_registry::FieldRegistry;
pub use operators::{OperatorRegistry, OperatorSpec};
pub use parser::parse_query_string;
#[cfg(feature = "postgres")]
pub use sql::bind_params;
pub use sql::{
    FilterBuilder, FilterClause, PageInfo, Pagination, QueryResult, ResponseMapper, SelectQuery,
};

/// Builds the WHERE clause for a request without the surrounding statement.
///
/// Required filters come first, then the dynamic filters from the query
/// parameters.
///
/// # Examples
///
/// ```
/// use mapped_query::{build_filter_clause, FieldRegistry, FieldType, FilterRequest};
///
/// let fields = FieldRegistry::new()
///     .with_field("role", "t.role", FieldType::String).unwrap();
/// let request = FilterRequest::new().with_param("role_in", "admin,editor");
///
/// let result = build_filter_clause(&fields, &request).unwrap();
/// assert_eq!(result.clause, "WHERE t.role IN ($1, $2)");
/// assert_eq!(result.params.len(), 2);
/// ```
pub fn build_filter_clause(
    fields: &FieldRegistry,
    request: &FilterRequest,
) -> Result<FilterClause, Error> {
    let mut builder = FilterBuilder::new(fields);
    builder.add_required_conditions(&request.required_filters)?;
    builder.add_dynamic_filters(&request.query_params, &[])?;
    Ok(builder.build())
}

/// Parses a raw query string and builds the paginated SELECT over `table`.
///
/// # Arguments
///
/// * `table` - Table name, optionally followed by an alias used in the mappings
/// * `fields` - The field mapping table
/// * `query_string` - `key=value` pairs joined by `&`
pub fn query_string_to_sql(
    table: &str,
    alias: Option<&str>,
    fields: &FieldRegistry,
    query_string: &str,
) -> Result<QueryResult, Error> {
    let request = FilterRequest::new().with_query_params(parse_query_string(query_string)?);
    SelectQuery::new(fields).from(table, alias).build(&request)
}
