use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::config::BuilderConfig;
use crate::error::ParseError;

/// LIMIT/OFFSET pair after defaults and clamping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pagination {
    pub limit: u64,
    pub offset: u64,
}

impl Pagination {
    pub fn new(limit: u64, offset: u64) -> Self {
        Self { limit, offset }
    }

    /// Reads `limit` and `offset` from query parameters.
    ///
    /// A missing, blank or zero limit falls back to `config.default_limit`;
    /// larger limits are clamped to `config.max_limit`.
    ///
    /// ```
    /// use mapped_query::{BuilderConfig, Pagination};
    /// use serde_json::{json, Map};
    ///
    /// let mut params = Map::new();
    /// params.insert("limit".into(), json!("5000"));
    /// params.insert("offset".into(), json!(40));
    ///
    /// let page = Pagination::from_params(&params, &BuilderConfig::default()).unwrap();
    /// assert_eq!(page, Pagination::new(1000, 40));
    /// ```
    pub fn from_params(
        params: &Map<String, Value>,
        config: &BuilderConfig,
    ) -> Result<Self, ParseError> {
        let limit = match params.get("limit") {
            Some(value) => parse_count(value).map_err(ParseError::InvalidLimit)?,
            None => None,
        };
        let offset = match params.get("offset") {
            Some(value) => parse_count(value).map_err(ParseError::InvalidOffset)?,
            None => None,
        };

        let limit = match limit {
            None | Some(0) => config.default_limit,
            Some(n) => n.min(config.max_limit),
        };

        Ok(Self {
            limit,
            offset: offset.unwrap_or(0),
        })
    }

    /// 1-based page number.
    pub fn page(&self) -> u64 {
        if self.limit == 0 {
            return 1;
        }
        self.offset / self.limit + 1
    }
}

/// Non-negative integer from a number or numeric string; `Ok(None)` when blank.
fn parse_count(value: &Value) -> Result<Option<u64>, String> {
    match value {
        Value::Null => Ok(None),
        Value::Number(n) => n.as_u64().map(Some).ok_or_else(|| n.to_string()),
        Value::String(s) if s.trim().is_empty() => Ok(None),
        Value::String(s) => s.trim().parse::<u64>().map(Some).map_err(|_| s.clone()),
        other => Err(other.to_string()),
    }
}

/// Page metadata returned alongside a result set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    pub total: u64,
    pub limit: u64,
    pub offset: u64,
    pub page: u64,
    pub total_pages: u64,
    pub has_more: bool,
}

impl PageInfo {
    pub fn new(total: u64, pagination: &Pagination) -> Self {
        let total_pages = if pagination.limit == 0 {
            0
        } else {
            total.div_ceil(pagination.limit)
        };

        Self {
            total,
            limit: pagination.limit,
            offset: pagination.offset,
            page: pagination.page(),
            total_pages,
            has_more: pagination.offset.saturating_add(pagination.limit) < total,
        }
    }
}
