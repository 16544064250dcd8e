//! Registry of filter operators: name → SQL text + optional value transform.
//!
//! The table is built once per process and never mutated afterwards, so
//! lookups from any number of builders need no synchronisation.

use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::Value;

use crate::ast::FilterOperator;
use crate::error::ParseError;

/// Rewrites a raw filter value before it is bound.
pub type ValueTransform = fn(&Value) -> Value;

#[derive(Clone, Copy)]
pub struct OperatorSpec {
    pub operator: FilterOperator,
    pub sql: &'static str,
    pub transform: Option<ValueTransform>,
}

impl std::fmt::Debug for OperatorSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperatorSpec")
            .field("operator", &self.operator)
            .field("sql", &self.sql)
            .field("has_transform", &self.transform.is_some())
            .finish()
    }
}

impl OperatorSpec {
    pub fn name(&self) -> &'static str {
        self.operator.name()
    }

    pub fn apply(&self, value: &Value) -> Value {
        match self.transform {
            Some(transform) => transform(value),
            None => value.clone(),
        }
    }
}

#[derive(Debug)]
pub struct OperatorRegistry {
    specs: HashMap<&'static str, OperatorSpec>,
}

static REGISTRY: OnceLock<OperatorRegistry> = OnceLock::new();

impl OperatorRegistry {
    pub fn global() -> &'static OperatorRegistry {
        REGISTRY.get_or_init(Self::build)
    }

    fn build() -> Self {
        let specs = FilterOperator::ALL
            .iter()
            .map(|&operator| {
                let (sql, transform) = definition(operator);
                (
                    operator.name(),
                    OperatorSpec {
                        operator,
                        sql,
                        transform,
                    },
                )
            })
            .collect();
        Self { specs }
    }

    pub fn get(&self, name: &str) -> Result<&OperatorSpec, ParseError> {
        self.specs
            .get(name)
            .ok_or_else(|| ParseError::UnsupportedOperator(name.to_string()))
    }

    pub fn spec(&self, operator: FilterOperator) -> &OperatorSpec {
        // Every variant is inserted by `build`.
        &self.specs[operator.name()]
    }

    pub fn contains(&self, name: &str) -> bool {
        self.specs.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

fn definition(operator: FilterOperator) -> (&'static str, Option<ValueTransform>) {
    use FilterOperator::*;

    match operator {
        Eq => ("=", None),
        Ne => ("!=", None),
        Gt => (">", None),
        Gte => (">=", None),
        Lt => ("<", None),
        Lte => ("<=", None),
        Like => ("ILIKE", Some(wrap_both)),
        StartsWith => ("ILIKE", Some(wrap_suffix)),
        EndsWith => ("ILIKE", Some(wrap_prefix)),
        Contains => ("LIKE", Some(wrap_both)),
        NotContains => ("NOT LIKE", Some(wrap_both)),
        In => ("IN", None),
        NotIn => ("NOT IN", None),
        Between | DateRange | MonthYear | Year => ("BETWEEN", None),
        NotBetween => ("NOT BETWEEN", None),
        IsNull => ("IS NULL", None),
        IsNotNull => ("IS NOT NULL", None),
        Regexp => ("~", None),
        NotRegexp => ("!~", None),
        IRegexp => ("~*", None),
        NotIRegexp => ("!~*", None),
        Any => ("= ANY", None),
        All => ("= ALL", None),
        Is => ("IS", None),
        Not => ("IS NOT", None),
        JsonContains => ("@>", None),
        JsonContained => ("<@", None),
        JsonKeyExists => ("?", None),
        JsonAnyKeyExists => ("?|", None),
        JsonAllKeysExist => ("?&", None),
        JsonPath => ("->>", None),
        JsonPathText => ("@?", None),
        JsonEq => ("#>>", None),
        Overlap => ("&&", None),
        Contained => ("<@", None),
        ContainsArray => ("@>", None),
        Fts => ("@@ to_tsquery", None),
        FtsPlain => ("@@ plainto_tsquery", None),
        FtsPhrase => ("@@ phraseto_tsquery", None),
        FtsWeb => ("@@ websearch_to_tsquery", None),
        CiEq => ("ILIKE", Some(escape_like)),
        CiNe => ("NOT ILIKE", Some(escape_like)),
        Col => ("=", None),
        IsTrue | IsFalse => ("=", None),
        DistinctFrom => ("IS DISTINCT FROM", None),
        NotDistinctFrom => ("IS NOT DISTINCT FROM", None),
    }
}

/// Text form of a scalar; strings are used as-is, everything else rendered as JSON.
pub(crate) fn value_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn wrap_both(value: &Value) -> Value {
    Value::String(format!("%{}%", value_text(value)))
}

fn wrap_suffix(value: &Value) -> Value {
    Value::String(format!("{}%", value_text(value)))
}

fn wrap_prefix(value: &Value) -> Value {
    Value::String(format!("%{}", value_text(value)))
}

fn escape_like(value: &Value) -> Value {
    let text = value_text(value);
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    Value::String(escaped)
}
