use std::sync::Arc;

use serde_json::Value;

use crate::ast::{Aggregate, AggregateFn, Cte, FieldMapping, FilterRequest, Join, JoinKind, SortTerm};
use crate::config::BuilderConfig;
use crate::error::{Error, SqlError};
use crate::field_registry::FieldRegistry;
use crate::parser::{coerce_to_list, parse_sort, validate_identifier};
use crate::sql::builder::{CustomTransform, FilterBuilder};
use crate::sql::pagination::Pagination;

#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryResult {
    pub query: String,
    pub params: Vec<Value>,
}

/// Assembles a complete SELECT (or COUNT) statement around the filter
/// clause produced by [`FilterBuilder`].
///
/// Setters never fail; table, alias, CTE and field names are checked when
/// the statement is built.
///
/// ```
/// use mapped_query::{FieldRegistry, FieldType, FilterRequest, SelectQuery};
/// use serde_json::json;
///
/// let fields = FieldRegistry::new()
///     .with_field("id", "t.id", FieldType::Uuid).unwrap()
///     .with_field("name", "t.name", FieldType::String).unwrap();
///
/// let request = FilterRequest::new()
///     .with_param("name_like", "bob")
///     .with_param("limit", "10");
///
/// let result = SelectQuery::new(&fields).from("users", Some("t")).build(&request).unwrap();
/// assert_eq!(
///     result.query,
///     "SELECT t.id AS \"id\", t.name AS \"name\" FROM users t \
///      WHERE t.name ILIKE $1 LIMIT $2 OFFSET $3"
/// );
/// assert_eq!(result.params, vec![json!("%bob%"), json!(10), json!(0)]);
/// ```
pub struct SelectQuery<'a> {
    fields: &'a FieldRegistry,
    config: BuilderConfig,
    schema: Option<String>,
    table: String,
    alias: Option<String>,
    ctes: Vec<Cte>,
    joins: Vec<Join>,
    selected: Option<Vec<String>>,
    exclude_fields: Vec<String>,
    exclude_keys: Vec<String>,
    sort: Vec<SortTerm>,
    aggregates: Vec<Aggregate>,
    group_by: Vec<String>,
    transforms: Vec<(String, CustomTransform)>,
}

impl std::fmt::Debug for SelectQuery<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SelectQuery")
            .field("schema", &self.schema)
            .field("table", &self.table)
            .field("alias", &self.alias)
            .field("ctes", &self.ctes)
            .field("joins", &self.joins)
            .field("selected", &self.selected)
            .field("sort", &self.sort)
            .field("aggregates", &self.aggregates)
            .field("group_by", &self.group_by)
            .finish()
    }
}

impl<'a> SelectQuery<'a> {
    pub fn new(fields: &'a FieldRegistry) -> Self {
        Self {
            fields,
            config: BuilderConfig::default(),
            schema: None,
            table: String::new(),
            alias: None,
            ctes: Vec::new(),
            joins: Vec::new(),
            selected: None,
            exclude_fields: Vec::new(),
            exclude_keys: Vec::new(),
            sort: Vec::new(),
            aggregates: Vec::new(),
            group_by: Vec::new(),
            transforms: Vec::new(),
        }
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    pub fn from(mut self, table: impl Into<String>, alias: Option<&str>) -> Self {
        self.table = table.into();
        self.alias = alias.map(str::to_string);
        self
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    /// Adds `name AS (body)` to the WITH list. The body must not use
    /// positional placeholders.
    pub fn with_cte(mut self, name: impl Into<String>, body: impl Into<String>) -> Self {
        self.ctes.push(Cte {
            name: name.into(),
            body: body.into(),
        });
        self
    }

    pub fn join(
        mut self,
        kind: JoinKind,
        table: impl Into<String>,
        alias: Option<&str>,
        on: impl Into<String>,
    ) -> Self {
        self.joins.push(Join {
            kind,
            table: table.into(),
            alias: alias.map(str::to_string),
            on: on.into(),
        });
        self
    }

    /// Explicit SELECT list; overrides the `fields` query parameter.
    pub fn fields(mut self, names: &[&str]) -> Self {
        self.selected = Some(names.iter().map(|n| n.to_string()).collect());
        self
    }

    /// Fields left out of the default SELECT list.
    pub fn exclude_fields(mut self, names: &[&str]) -> Self {
        self.exclude_fields = names.iter().map(|n| n.to_string()).collect();
        self
    }

    /// Query parameters the filter pass must ignore.
    pub fn exclude_keys(mut self, keys: &[&str]) -> Self {
        self.exclude_keys = keys.iter().map(|k| k.to_string()).collect();
        self
    }

    /// Explicit ordering; overrides the `sort`/`sortField` query parameters.
    pub fn sort(mut self, term: SortTerm) -> Self {
        self.sort.push(term);
        self
    }

    pub fn aggregate(
        mut self,
        function: AggregateFn,
        field: Option<&str>,
        alias: impl Into<String>,
    ) -> Self {
        self.aggregates.push(Aggregate::new(function, field, alias));
        self
    }

    pub fn group_by(mut self, field: impl Into<String>) -> Self {
        self.group_by.push(field.into());
        self
    }

    pub fn register_transform<F>(mut self, expression: impl Into<String>, transform: F) -> Self
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.transforms.push((expression.into(), Arc::new(transform)));
        self
    }

    /// Builds the paginated SELECT for `request`.
    ///
    /// Placeholders are numbered filters first, then LIMIT and OFFSET.
    pub fn build(&self, request: &FilterRequest) -> Result<QueryResult, Error> {
        let from = self.from_clause()?;
        let columns = self.select_list(request)?;

        let mut builder = self.filter_builder();
        builder.add_required_conditions(&request.required_filters)?;
        let exclude: Vec<&str> = self.exclude_keys.iter().map(String::as_str).collect();
        builder.add_dynamic_filters(&request.query_params, &exclude)?;
        let filter = builder.build();

        let group_by = self.group_by_clause()?;
        let order_by = self.order_by_clause(request)?;
        let pagination = Pagination::from_params(&request.query_params, &self.config)?;

        let mut query = self.with_clause()?;
        query.push_str("SELECT ");
        query.push_str(&columns.join(", "));
        query.push_str(&from);
        push_clause(&mut query, &filter.clause);
        push_clause(&mut query, &group_by);
        push_clause(&mut query, &order_by);

        let limit = builder.add_param(Value::from(pagination.limit));
        let offset = builder.add_param(Value::from(pagination.offset));
        query.push_str(&format!(" LIMIT {} OFFSET {}", limit, offset));

        let params = builder.params().to_vec();
        tracing::debug!(
            table = %self.table,
            params = params.len(),
            "select query built"
        );

        Ok(QueryResult { query, params })
    }

    /// Builds `SELECT COUNT(*)` over the same source and filters, without
    /// grouping, ordering or pagination.
    pub fn build_count(&self, request: &FilterRequest) -> Result<QueryResult, Error> {
        let from = self.from_clause()?;

        let mut builder = self.filter_builder();
        builder.add_required_conditions(&request.required_filters)?;
        let exclude: Vec<&str> = self.exclude_keys.iter().map(String::as_str).collect();
        builder.add_dynamic_filters(&request.query_params, &exclude)?;
        let filter = builder.build();

        let mut query = self.with_clause()?;
        query.push_str("SELECT COUNT(*) AS \"total\"");
        query.push_str(&from);
        push_clause(&mut query, &filter.clause);

        tracing::debug!(table = %self.table, params = filter.params.len(), "count query built");

        Ok(QueryResult {
            query,
            params: filter.params,
        })
    }

    fn filter_builder(&self) -> FilterBuilder<'a> {
        let mut builder = FilterBuilder::new(self.fields).with_config(self.config.clone());
        for (expression, transform) in &self.transforms {
            builder.insert_transform(expression.clone(), Arc::clone(transform));
        }
        builder
    }

    fn is_computed(&self, mapping: &FieldMapping) -> bool {
        mapping.is_computed() || self.config.is_computed_name(&mapping.name)
    }

    fn with_clause(&self) -> Result<String, Error> {
        if self.ctes.is_empty() {
            return Ok(String::new());
        }
        let ctes = self
            .ctes
            .iter()
            .map(|cte| Ok(format!("{} AS ({})", validate_identifier(&cte.name)?, cte.body)))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(format!("WITH {} ", ctes.join(", ")))
    }

    /// ` FROM schema.table alias` followed by any joins.
    fn from_clause(&self) -> Result<String, Error> {
        if self.table.is_empty() {
            return Err(SqlError::EmptyTableName.into());
        }

        let mut sql = String::from(" FROM ");
        if let Some(schema) = &self.schema {
            sql.push_str(validate_identifier(schema)?);
            sql.push('.');
        }
        sql.push_str(validate_identifier(&self.table)?);
        if let Some(alias) = &self.alias {
            sql.push(' ');
            sql.push_str(validate_identifier(alias)?);
        }

        for join in &self.joins {
            if join.table.is_empty() {
                return Err(SqlError::EmptyTableName.into());
            }
            sql.push(' ');
            sql.push_str(join.kind.as_sql());
            sql.push(' ');
            sql.push_str(validate_identifier(&join.table)?);
            if let Some(alias) = &join.alias {
                sql.push(' ');
                sql.push_str(validate_identifier(alias)?);
            }
            sql.push_str(" ON ");
            sql.push_str(&join.on);
        }

        Ok(sql)
    }

    fn select_list(&self, request: &FilterRequest) -> Result<Vec<String>, Error> {
        if !self.aggregates.is_empty() {
            return self.aggregate_list();
        }

        let requested: Option<Vec<String>> = match &self.selected {
            Some(names) => Some(names.clone()),
            None => request.query_params.get("fields").map(|value| {
                coerce_to_list(value)
                    .iter()
                    .filter_map(|v| v.as_str().map(str::to_string))
                    .collect()
            }),
        };

        let columns: Vec<String> = match requested.filter(|names| !names.is_empty()) {
            Some(names) => names
                .iter()
                .map(|name| Ok(select_column(self.fields, self.fields.require(name)?)))
                .collect::<Result<_, Error>>()?,
            None => self
                .fields
                .iter()
                .filter(|mapping| !self.exclude_fields.contains(&mapping.name))
                .map(|mapping| select_column(self.fields, mapping))
                .collect(),
        };

        if columns.is_empty() {
            return Err(SqlError::NoSelectItems.into());
        }
        Ok(columns)
    }

    fn aggregate_list(&self) -> Result<Vec<String>, Error> {
        let mut columns = self
            .group_by
            .iter()
            .map(|name| Ok(select_column(self.fields, self.fields.require(name)?)))
            .collect::<Result<Vec<_>, Error>>()?;

        for aggregate in &self.aggregates {
            let argument = match &aggregate.field {
                Some(name) => self.fields.require(name)?.expression.clone(),
                None => "*".to_string(),
            };
            columns.push(format!(
                "{}({}) AS {}",
                aggregate.function.as_sql(),
                argument,
                quote_identifier(&aggregate.alias)
            ));
        }
        Ok(columns)
    }

    fn group_by_clause(&self) -> Result<String, Error> {
        if self.group_by.is_empty() {
            return Ok(String::new());
        }
        let expressions = self
            .group_by
            .iter()
            .map(|name| Ok(self.sortable(name)?.expression.clone()))
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(format!("GROUP BY {}", expressions.join(", ")))
    }

    fn order_by_clause(&self, request: &FilterRequest) -> Result<String, Error> {
        let terms = if self.sort.is_empty() {
            parse_sort(
                request.param_str("sort").as_deref(),
                request.param_str("sortField").as_deref(),
            )?
        } else {
            self.sort.clone()
        };

        if terms.is_empty() {
            return Ok(String::new());
        }

        let clauses = terms
            .iter()
            .map(|term| {
                let mapping = self.sortable(&term.field)?;
                Ok(format!("{} {}", mapping.expression, term.direction.as_sql()))
            })
            .collect::<Result<Vec<_>, Error>>()?;
        Ok(format!("ORDER BY {}", clauses.join(", ")))
    }

    /// Known, non-computed field usable in ORDER BY / GROUP BY.
    fn sortable(&self, name: &str) -> Result<&'a FieldMapping, Error> {
        let fields = self.fields;
        let mapping = fields.require(name)?;
        if self.is_computed(mapping) {
            return Err(SqlError::ComputedField(name.to_string()).into());
        }
        Ok(mapping)
    }
}

fn push_clause(query: &mut String, clause: &str) {
    if !clause.is_empty() {
        query.push(' ');
        query.push_str(clause);
    }
}

fn select_column(fields: &FieldRegistry, mapping: &FieldMapping) -> String {
    format!(
        "{} AS {}",
        mapping.expression,
        quote_identifier(fields.output_column(mapping))
    )
}

fn quote_identifier(name: &str) -> String {
    let escaped = name.replace('"', "\"\"");
    format!("\"{}\"", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::FieldType;
    use crate::error::ParseError;
    use serde_json::json;

    fn fields() -> FieldRegistry {
        FieldRegistry::from_mappings(vec![
            FieldMapping::new("id", "t.id", FieldType::Uuid),
            FieldMapping::new("name", "t.name", FieldType::String),
            FieldMapping::new("age", "t.age", FieldType::Number),
            FieldMapping::new("createdAt", "t.created_at", FieldType::Timestamp),
            FieldMapping::new("ownerEmail", "o.email", FieldType::String),
            FieldMapping::new(
                "ageGroup",
                "CASE WHEN t.age >= 18 THEN 'adult' ELSE 'minor' END",
                FieldType::String,
            ),
        ])
        .unwrap()
    }

    #[test]
    fn test_default_select_lists_all_fields() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .join(JoinKind::Left, "owners", Some("o"), "o.id = t.owner_id")
            .build(&FilterRequest::new())
            .unwrap();

        assert_eq!(
            result.query,
            "SELECT t.id AS \"id\", t.name AS \"name\", t.age AS \"age\", \
             t.created_at AS \"created_at\", o.email AS \"email\", \
             CASE WHEN t.age >= 18 THEN 'adult' ELSE 'minor' END AS \"ageGroup\" \
             FROM users t LEFT JOIN owners o ON o.id = t.owner_id LIMIT $1 OFFSET $2"
        );
        assert_eq!(result.params, vec![json!(20), json!(0)]);
    }

    #[test]
    fn test_fields_param_and_exclusions() {
        let fields = fields();
        let request = FilterRequest::new().with_param("fields", "id,name");
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .build(&request)
            .unwrap();
        assert!(result.query.starts_with("SELECT t.id AS \"id\", t.name AS \"name\" FROM"));

        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .exclude_fields(&["ageGroup", "ownerEmail", "createdAt"])
            .build(&FilterRequest::new())
            .unwrap();
        assert!(result
            .query
            .starts_with("SELECT t.id AS \"id\", t.name AS \"name\", t.age AS \"age\" FROM"));
    }

    #[test]
    fn test_unknown_selected_field() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .from("users", None)
            .fields(&["id", "ghost"])
            .build(&FilterRequest::new());
        assert_eq!(result, Err(Error::Sql(SqlError::UnknownField("ghost".to_string()))));
    }

    #[test]
    fn test_limit_offset_follow_filter_params() {
        let fields = fields();
        let request = FilterRequest::new()
            .with_required("id", "X")
            .with_param("age_between", "18,65")
            .with_param("limit", "5")
            .with_param("offset", "10");
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .fields(&["id"])
            .build(&request)
            .unwrap();

        assert_eq!(
            result.query,
            "SELECT t.id AS \"id\" FROM users t \
             WHERE t.id = $1 AND t.age BETWEEN $2 AND $3 LIMIT $4 OFFSET $5"
        );
        assert_eq!(
            result.params,
            vec![json!("X"), json!("18"), json!("65"), json!(5), json!(10)]
        );
    }

    #[test]
    fn test_sort_from_params() {
        let fields = fields();
        let request = FilterRequest::new().with_param("sort", "-createdAt,name");
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .fields(&["id"])
            .build(&request)
            .unwrap();
        assert!(result
            .query
            .contains("ORDER BY t.created_at DESC, t.name ASC LIMIT $1"));

        let request = FilterRequest::new()
            .with_param("sortField", "age")
            .with_param("sort", "desc");
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .fields(&["id"])
            .build(&request)
            .unwrap();
        assert!(result.query.contains("ORDER BY t.age DESC"));
    }

    #[test]
    fn test_explicit_sort_overrides_params() {
        let fields = fields();
        let request = FilterRequest::new().with_param("sort", "name");
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .fields(&["id"])
            .sort(SortTerm::new("age").desc())
            .build(&request)
            .unwrap();
        assert!(result.query.contains("ORDER BY t.age DESC"));
        assert!(!result.query.contains("t.name ASC"));
    }

    #[test]
    fn test_sort_errors() {
        let fields = fields();
        let query = SelectQuery::new(&fields).from("users", Some("t"));

        let request = FilterRequest::new().with_param("sort", "ghost");
        assert_eq!(
            query.build(&request),
            Err(Error::Sql(SqlError::UnknownField("ghost".to_string())))
        );

        let request = FilterRequest::new().with_param("sort", "ageGroup");
        assert_eq!(
            query.build(&request),
            Err(Error::Sql(SqlError::ComputedField("ageGroup".to_string())))
        );

        let request = FilterRequest::new()
            .with_param("sortField", "age")
            .with_param("sort", "sideways");
        assert_eq!(
            query.build(&request),
            Err(Error::Parse(ParseError::InvalidDirection("sideways".to_string())))
        );
    }

    #[test]
    fn test_aggregates_with_group_by() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .group_by("name")
            .aggregate(AggregateFn::Count, None, "total")
            .aggregate(AggregateFn::Avg, Some("age"), "avgAge")
            .build(&FilterRequest::new().with_param("age_gte", 18))
            .unwrap();

        assert_eq!(
            result.query,
            "SELECT t.name AS \"name\", COUNT(*) AS \"total\", AVG(t.age) AS \"avgAge\" \
             FROM users t WHERE t.age >= $1 GROUP BY t.name LIMIT $2 OFFSET $3"
        );
    }

    #[test]
    fn test_group_by_computed_field() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .group_by("ageGroup")
            .aggregate(AggregateFn::Count, None, "total")
            .build(&FilterRequest::new());
        assert_eq!(
            result,
            Err(Error::Sql(SqlError::ComputedField("ageGroup".to_string())))
        );
    }

    #[test]
    fn test_ctes_and_schema() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .with_cte("recent", "SELECT * FROM app.users WHERE created_at > now() - interval '1 day'")
            .schema("app")
            .from("users", Some("t"))
            .fields(&["id"])
            .build(&FilterRequest::new())
            .unwrap();
        assert_eq!(
            result.query,
            "WITH recent AS (SELECT * FROM app.users WHERE created_at > now() - interval '1 day') \
             SELECT t.id AS \"id\" FROM app.users t LIMIT $1 OFFSET $2"
        );
    }

    #[test]
    fn test_identifier_validation() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .from("users; DROP TABLE users", None)
            .build(&FilterRequest::new());
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::InvalidIdentifier(_)))
        ));

        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .with_cte("bad name", "SELECT 1")
            .build(&FilterRequest::new());
        assert!(matches!(
            result,
            Err(Error::Parse(ParseError::InvalidIdentifier(_)))
        ));
    }

    #[test]
    fn test_empty_table_name() {
        let fields = fields();
        let result = SelectQuery::new(&fields).build(&FilterRequest::new());
        assert_eq!(result, Err(Error::Sql(SqlError::EmptyTableName)));
    }

    #[test]
    fn test_no_select_items() {
        let fields = fields();
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .exclude_fields(&["id", "name", "age", "createdAt", "ownerEmail", "ageGroup"])
            .build(&FilterRequest::new());
        assert_eq!(result, Err(Error::Sql(SqlError::NoSelectItems)));
    }

    #[test]
    fn test_build_count() {
        let fields = fields();
        let request = FilterRequest::new()
            .with_required("id", "X")
            .with_param("name_like", "bob")
            .with_param("sort", "name")
            .with_param("limit", "5");
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .build_count(&request)
            .unwrap();
        assert_eq!(
            result.query,
            "SELECT COUNT(*) AS \"total\" FROM users t WHERE t.id = $1 AND t.name ILIKE $2"
        );
        assert_eq!(result.params, vec![json!("X"), json!("%bob%")]);
    }

    #[test]
    fn test_exclude_keys_and_transforms() {
        let fields = fields();
        let request = FilterRequest::new()
            .with_param("name", "bob")
            .with_param("age", 30);
        let result = SelectQuery::new(&fields)
            .from("users", Some("t"))
            .exclude_keys(&["age"])
            .register_transform("t.name", |v| json!(format!("{}%", v.as_str().unwrap_or(""))))
            .build_count(&request)
            .unwrap();
        assert_eq!(result.query, "SELECT COUNT(*) AS \"total\" FROM users t WHERE t.name ILIKE $1");
        assert_eq!(result.params, vec![json!("bob%")]);
    }

    #[test]
    fn test_shared_column_names_are_aliased_by_logical_name() {
        let fields = FieldRegistry::from_mappings(vec![
            FieldMapping::new("id", "t.id", FieldType::Uuid),
            FieldMapping::new("ownerId", "o.id", FieldType::Uuid),
            FieldMapping::new("title", "t.title", FieldType::String),
        ])
        .unwrap();
        let result = SelectQuery::new(&fields)
            .from("tasks", Some("t"))
            .join(JoinKind::Inner, "owners", Some("o"), "o.id = t.owner_id")
            .build(&FilterRequest::new())
            .unwrap();

        assert!(result.query.starts_with(
            "SELECT t.id AS \"id\", o.id AS \"ownerId\", t.title AS \"title\" FROM tasks t"
        ));
    }

    #[test]
    fn test_sort_on_keyword_like_column() {
        let fields = FieldRegistry::from_mappings(vec![
            FieldMapping::new("caseId", "t.case_id", FieldType::Uuid),
            FieldMapping::new("selectedAt", "t.selected_at", FieldType::Timestamp),
        ])
        .unwrap();
        let request = FilterRequest::new()
            .with_param("fields", "caseId,selectedAt")
            .with_param("sort", "-selectedAt");
        let result = SelectQuery::new(&fields)
            .from("picks", Some("t"))
            .build(&request)
            .unwrap();

        assert_eq!(
            result.query,
            "SELECT t.case_id AS \"case_id\", t.selected_at AS \"selected_at\" FROM picks t \
             ORDER BY t.selected_at DESC LIMIT $1 OFFSET $2"
        );
    }
}
