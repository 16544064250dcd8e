use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Per-query filter input: required filters the caller cannot bypass, plus
/// free-form query parameters (filters, pagination, sort, field selection).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterRequest {
    #[serde(default)]
    pub required_filters: Map<String, Value>,
    #[serde(default)]
    pub query_params: Map<String, Value>,
}

impl FilterRequest {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_required(mut self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        self.required_filters.insert(field.into(), value.into());
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.query_params.insert(key.into(), value.into());
        self
    }

    pub fn with_query_params(mut self, params: Map<String, Value>) -> Self {
        self.query_params = params;
        self
    }

    pub fn is_empty(&self) -> bool {
        self.required_filters.is_empty() && self.query_params.is_empty()
    }

    /// String form of a query parameter; numbers are rendered, other shapes ignored.
    pub fn param_str(&self, key: &str) -> Option<String> {
        match self.query_params.get(key)? {
            Value::String(s) if !s.is_empty() => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}
