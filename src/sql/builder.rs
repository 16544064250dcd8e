use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::ast::{FieldMapping, Filter, FilterOperator};
use crate::config::BuilderConfig;
use crate::date_range::{month_range, year_range};
use crate::error::{Error, ParseError, SqlError};
use crate::field_registry::FieldRegistry;
use crate::operators::{value_text, OperatorRegistry, OperatorSpec};
use crate::parser::{
    coerce_to_list, is_blank, parse_date_range, parse_month_year, parse_year, reserved_key,
    resolve_filter, validate_qualified_identifier,
};

/// Per-field value rewrite, keyed by the field's physical expression.
pub type CustomTransform = Arc<dyn Fn(&Value) -> Value + Send + Sync>;

/// WHERE clause plus the values for its placeholders; `params[i - 1]`
/// binds `$i`.
#[derive(Debug, Clone, PartialEq, Default, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterClause {
    /// `WHERE a AND b ...`, or empty when no condition was added
    pub clause: String,
    pub params: Vec<Value>,
}

impl FilterClause {
    pub fn is_empty(&self) -> bool {
        self.clause.is_empty()
    }
}

/// Placeholders handed out while emitting one condition. Nothing reaches
/// the builder until the whole condition is emitted, so a failing
/// condition leaves no stray parameters behind.
struct Bindings {
    next: usize,
    values: Vec<Value>,
}

impl Bindings {
    fn starting_at(next: usize) -> Self {
        Self {
            next,
            values: Vec::new(),
        }
    }

    fn bind(&mut self, value: Value) -> String {
        let placeholder = format!("${}", self.next);
        self.next += 1;
        self.values.push(value);
        placeholder
    }
}

/// Accumulates filter conditions for a single query.
///
/// ```
/// use mapped_query::{FieldRegistry, FieldType, FilterBuilder};
/// use serde_json::{json, Map};
///
/// let fields = FieldRegistry::new()
///     .with_field("id", "t.id", FieldType::Uuid).unwrap()
///     .with_field("name", "t.name", FieldType::String).unwrap();
///
/// let mut required = Map::new();
/// required.insert("id".into(), json!("X"));
/// let mut params = Map::new();
/// params.insert("name_like".into(), json!("bob"));
///
/// let mut builder = FilterBuilder::new(&fields);
/// builder.add_required_conditions(&required).unwrap();
/// builder.add_dynamic_filters(&params, &[]).unwrap();
///
/// let result = builder.build();
/// assert_eq!(result.clause, "WHERE t.id = $1 AND t.name ILIKE $2");
/// assert_eq!(result.params, vec![json!("X"), json!("%bob%")]);
/// ```
pub struct FilterBuilder<'a> {
    fields: &'a FieldRegistry,
    config: BuilderConfig,
    conditions: Vec<String>,
    params: Vec<Value>,
    param_index: usize,
    transforms: HashMap<String, CustomTransform>,
}

impl std::fmt::Debug for FilterBuilder<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FilterBuilder")
            .field("conditions", &self.conditions)
            .field("params", &self.params)
            .field("param_index", &self.param_index)
            .field("transforms", &self.transforms.keys().collect::<Vec<_>>())
            .finish()
    }
}

impl<'a> FilterBuilder<'a> {
    pub fn new(fields: &'a FieldRegistry) -> Self {
        Self {
            fields,
            config: BuilderConfig::default(),
            conditions: Vec::new(),
            params: Vec::new(),
            param_index: 0,
            transforms: HashMap::new(),
        }
    }

    pub fn with_config(mut self, config: BuilderConfig) -> Self {
        self.config = config;
        self
    }

    /// Continues numbering after `offset` placeholders the caller already uses.
    pub fn with_param_offset(mut self, offset: usize) -> Self {
        self.param_index = offset;
        self
    }

    /// Overrides the operator transform for the field whose physical
    /// expression is `expression`.
    pub fn register_transform<F>(&mut self, expression: impl Into<String>, transform: F)
    where
        F: Fn(&Value) -> Value + Send + Sync + 'static,
    {
        self.insert_transform(expression.into(), Arc::new(transform));
    }

    pub(crate) fn insert_transform(&mut self, expression: String, transform: CustomTransform) {
        self.transforms.insert(expression, transform);
    }

    pub fn conditions(&self) -> &[String] {
        &self.conditions
    }

    pub fn params(&self) -> &[Value] {
        &self.params
    }

    /// Number of the next placeholder; callers appending their own
    /// parameters (LIMIT, OFFSET) continue from here.
    pub fn next_param_index(&self) -> usize {
        self.param_index + 1
    }

    pub fn add_param(&mut self, value: Value) -> String {
        let idx = self.param_index + 1;
        self.param_index = idx;
        self.params.push(value);
        format!("${}", idx)
    }

    /// Adds an equality condition per entry. Declared types are ignored and
    /// the entries are applied whatever the dynamic filters contain.
    pub fn add_required_conditions(&mut self, required: &Map<String, Value>) -> Result<(), Error> {
        for (field, value) in required {
            self.add_condition(field, FilterOperator::Eq.name(), value)?;
        }
        Ok(())
    }

    /// Adds filters parsed from free-form query parameters.
    ///
    /// Blank values, excluded keys, reserved keys, keys that name no known
    /// field and filters on computed fields are skipped and do not count
    /// towards the condition cap. Conditions are emitted grouped by operator (in
    /// order of each operator's first appearance), preserving input order
    /// within a group.
    pub fn add_dynamic_filters(
        &mut self,
        params: &Map<String, Value>,
        exclude_keys: &[&str],
    ) -> Result<(), Error> {
        let mut groups: Vec<(FilterOperator, Vec<Filter>)> = Vec::new();
        let mut resolved = 0;

        for (key, value) in params {
            if is_blank(value) || exclude_keys.contains(&key.as_str()) || reserved_key(key) {
                continue;
            }

            let Some(filter) = resolve_filter(key, value, self.fields)? else {
                tracing::debug!(key = %key, "skipping parameter that names no known field");
                continue;
            };

            if let Some(mapping) = self.fields.get(&filter.field) {
                if self.is_computed(mapping) {
                    tracing::debug!(field = %filter.field, "ignoring filter on computed field");
                    continue;
                }
            }

            resolved += 1;
            match groups.iter_mut().find(|(op, _)| *op == filter.operator) {
                Some((_, group)) => group.push(filter),
                None => groups.push((filter.operator, vec![filter])),
            }
        }

        if self.conditions.len() + resolved > self.config.max_conditions {
            return Err(SqlError::TooManyConditions {
                max: self.config.max_conditions,
            }
            .into());
        }

        for filter in groups.into_iter().flat_map(|(_, group)| group) {
            self.add_filter(&filter)?;
        }
        Ok(())
    }

    pub fn add_filter(&mut self, filter: &Filter) -> Result<(), Error> {
        self.add_condition(&filter.field, filter.operator.name(), &filter.value)
    }

    /// Adds one condition on a logical field.
    ///
    /// # Errors
    ///
    /// - `UnknownField` if `field` is not mapped
    /// - `UnsupportedOperator` if `operator` is not registered
    /// - `TooManyConditions` once the configured cap is reached
    /// - value-shape errors (`InvalidRangeFormat`, `InvalidValue`, ...)
    ///
    /// Computed fields are silently ignored.
    ///
    /// JSON path operators attach directly to the field: `jsonPath` emits
    /// `t.meta->>$1 = $2` and `jsonEq` emits `t.meta#>>$1 = $2`.
    /// `jsonPathText` emits `t.meta@? $1::jsonpath`, since `@?` takes a
    /// `jsonpath` operand.
    pub fn add_condition(&mut self, field: &str, operator: &str, value: &Value) -> Result<(), Error> {
        let fields = self.fields;
        let mapping = fields.require(field)?;

        if self.is_computed(mapping) {
            tracing::debug!(field = %field, "ignoring filter on computed field");
            return Ok(());
        }

        let spec = OperatorRegistry::global().get(operator)?;

        if self.conditions.len() >= self.config.max_conditions {
            return Err(SqlError::TooManyConditions {
                max: self.config.max_conditions,
            }
            .into());
        }

        let mut bindings = Bindings::starting_at(self.param_index + 1);
        let condition = self.emit(mapping, spec, value, &mut bindings)?;

        tracing::trace!(
            field = %field,
            operator = spec.name(),
            condition = %condition,
            params = bindings.values.len(),
            "filter condition added"
        );

        self.param_index += bindings.values.len();
        self.params.extend(bindings.values);
        self.conditions.push(condition);
        Ok(())
    }

    pub fn build(&self) -> FilterClause {
        let clause = if self.conditions.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", self.conditions.join(" AND "))
        };

        tracing::debug!(
            conditions = self.conditions.len(),
            params = self.params.len(),
            "filter clause built"
        );

        FilterClause {
            clause,
            params: self.params.clone(),
        }
    }

    fn is_computed(&self, mapping: &FieldMapping) -> bool {
        mapping.is_computed() || self.config.is_computed_name(&mapping.name)
    }

    fn transformed(&self, mapping: &FieldMapping, spec: &OperatorSpec, value: &Value) -> Value {
        match self.transforms.get(&mapping.expression) {
            Some(transform) => transform(value),
            None => spec.apply(value),
        }
    }

    fn emit(
        &self,
        mapping: &FieldMapping,
        spec: &OperatorSpec,
        value: &Value,
        bindings: &mut Bindings,
    ) -> Result<String, ParseError> {
        use FilterOperator as Op;

        let field = mapping.expression.as_str();
        let op = spec.sql;

        let condition = match spec.operator {
            Op::IsNull | Op::IsNotNull => format!("{} {}", field, op),

            Op::In | Op::NotIn => {
                let items = coerce_to_list(value);
                if items.is_empty() {
                    // IN () is not valid SQL
                    let constant = if spec.operator == Op::In { "FALSE" } else { "TRUE" };
                    return Ok(constant.to_string());
                }
                let placeholders: Vec<String> =
                    items.into_iter().map(|item| bindings.bind(item)).collect();
                format!("{} {} ({})", field, op, placeholders.join(", "))
            }

            Op::Between | Op::NotBetween => {
                let (start, end) = two_values(value)?;
                between(field, op, start, end, bindings)
            }

            Op::DateRange => {
                let (start, end) = parse_date_range(value)?;
                between(field, op, start, end, bindings)
            }

            Op::MonthYear => {
                let (year, month) = parse_month_year(value)?;
                let (start, end) =
                    month_range(year, month, self.config.range_boundaries)?.to_params();
                between(field, op, start, end, bindings)
            }

            Op::Year => {
                let year = parse_year(value)?;
                let (start, end) = year_range(year, self.config.range_boundaries)?.to_params();
                between(field, op, start, end, bindings)
            }

            Op::Any | Op::All => {
                let placeholder = bindings.bind(Value::Array(coerce_to_list(value)));
                format!("{} {} ({})", field, op, placeholder)
            }

            Op::Col => {
                let other = value_text(value);
                let other_sql = match self.fields.get(other.trim()) {
                    Some(mapping) => mapping.expression.clone(),
                    None => validate_qualified_identifier(other.trim())?.to_string(),
                };
                format!("{} {} {}", field, op, other_sql)
            }

            Op::JsonContains | Op::JsonContained => {
                let placeholder = bindings.bind(Value::String(value_text(value)));
                format!("{} {} {}::jsonb", field, op, placeholder)
            }

            Op::JsonKeyExists => {
                let key = match coerce_to_list(value).as_slice() {
                    [single] => value_text(single),
                    _ => {
                        return Err(ParseError::invalid_value(
                            spec.name(),
                            "expected a single key",
                        ))
                    }
                };
                let placeholder = bindings.bind(Value::String(key));
                format!("{} {} {}", field, op, placeholder)
            }

            Op::JsonAnyKeyExists | Op::JsonAllKeysExist => {
                let placeholder = bindings.bind(text_list(value));
                format!("{} {} {}", field, op, placeholder)
            }

            Op::JsonPath => {
                let (path, expected) = path_and_value(value, spec)?;
                let path = bindings.bind(Value::String(value_text(&path)));
                let expected = bindings.bind(Value::String(value_text(&expected)));
                format!("{}{}{} = {}", field, op, path, expected)
            }

            Op::JsonPathText => {
                let placeholder = bindings.bind(Value::String(value_text(value)));
                format!("{}{} {}::jsonpath", field, op, placeholder)
            }

            Op::JsonEq => {
                let (path, expected) = path_and_value(value, spec)?;
                let path = bindings.bind(text_list(&path));
                let expected = bindings.bind(Value::String(value_text(&expected)));
                format!("{}{}{} = {}", field, op, path, expected)
            }

            Op::Fts | Op::FtsPlain | Op::FtsPhrase | Op::FtsWeb => {
                let text = value_text(value);
                if self.config.fts_inline_compat {
                    let quoted = text.replace('\'', "''");
                    bindings.bind(Value::String(text));
                    format!("{} {}('{}')", field, op, quoted)
                } else {
                    let placeholder = bindings.bind(Value::String(text));
                    format!("{} {}({})", field, op, placeholder)
                }
            }

            Op::IsTrue | Op::IsFalse => {
                let placeholder = bindings.bind(Value::Bool(spec.operator == Op::IsTrue));
                format!("{} {} {}", field, op, placeholder)
            }

            Op::Is | Op::Not => {
                let keyword = is_keyword(value).ok_or_else(|| {
                    ParseError::invalid_value(
                        spec.name(),
                        format!("expected null, true, false or unknown, got {}", value),
                    )
                })?;
                format!("{} {} {}", field, op, keyword)
            }

            Op::CiEq | Op::CiNe => {
                let placeholder = bindings.bind(self.transformed(mapping, spec, value));
                format!("{} {} {}", field, op, placeholder)
            }

            Op::DistinctFrom | Op::NotDistinctFrom => {
                let placeholder = bindings.bind(value.clone());
                format!("{} {} {}", field, op, placeholder)
            }

            Op::Eq
            | Op::Ne
            | Op::Gt
            | Op::Gte
            | Op::Lt
            | Op::Lte
            | Op::Like
            | Op::StartsWith
            | Op::EndsWith
            | Op::Contains
            | Op::NotContains
            | Op::Regexp
            | Op::NotRegexp
            | Op::IRegexp
            | Op::NotIRegexp
            | Op::Overlap
            | Op::Contained
            | Op::ContainsArray => {
                let placeholder = bindings.bind(self.transformed(mapping, spec, value));
                format!(
                    "{}{} {} {}",
                    field,
                    mapping.field_type.cast_suffix(),
                    op,
                    placeholder
                )
            }
        };

        Ok(condition)
    }
}

fn between(field: &str, op: &str, start: Value, end: Value, bindings: &mut Bindings) -> String {
    let start = bindings.bind(start);
    let end = bindings.bind(end);
    format!("{} {} {} AND {}", field, op, start, end)
}

/// Two-element range input: `[a, b]`, `"a,b"` or `{start, end}`.
fn two_values(value: &Value) -> Result<(Value, Value), ParseError> {
    if value.is_object() {
        return parse_date_range(value);
    }
    match coerce_to_list(value).as_slice() {
        [start, end] => Ok((start.clone(), end.clone())),
        _ => Err(ParseError::InvalidRangeFormat(value.to_string())),
    }
}

/// `{path, value}` object or `[path, value]` pair.
fn path_and_value(value: &Value, spec: &OperatorSpec) -> Result<(Value, Value), ParseError> {
    match value {
        Value::Object(map) => match (map.get("path"), map.get("value")) {
            (Some(path), Some(expected)) => Ok((path.clone(), expected.clone())),
            _ => Err(ParseError::invalid_value(
                spec.name(),
                "expected an object with path and value",
            )),
        },
        Value::Array(items) if items.len() == 2 => Ok((items[0].clone(), items[1].clone())),
        _ => Err(ParseError::invalid_value(
            spec.name(),
            "expected {path, value} or [path, value]",
        )),
    }
}

fn text_list(value: &Value) -> Value {
    Value::Array(
        coerce_to_list(value)
            .iter()
            .map(|item| Value::String(value_text(item)))
            .collect(),
    )
}

fn is_keyword(value: &Value) -> Option<&'static str> {
    match value {
        Value::Null => Some("NULL"),
        Value::Bool(true) => Some("TRUE"),
        Value::Bool(false) => Some("FALSE"),
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "null" => Some("NULL"),
            "true" => Some("TRUE"),
            "false" => Some("FALSE"),
            "unknown" => Some("UNKNOWN"),
            _ => None,
        },
        _ => None,
    }
}
