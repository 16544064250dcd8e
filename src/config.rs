//! Builder configuration.
//!
//! Every knob has a default, so an empty JSON object is a valid config:
//!
//! ```
//! use mapped_query::BuilderConfig;
//!
//! let config = BuilderConfig::from_json(r#"{"maxConditions": 10}"#).unwrap();
//! assert_eq!(config.max_conditions, 10);
//! assert_eq!(config.default_limit, 20);
//! ```

use serde::{Deserialize, Serialize};

use crate::error::ParseError;

pub const DEFAULT_MAX_CONDITIONS: usize = 50;
pub const DEFAULT_LIMIT: u64 = 20;
pub const DEFAULT_MAX_LIMIT: u64 = 1000;

/// Where month/year ranges start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RangeBoundaries {
    /// Start at the last millisecond of the day before the period.
    #[default]
    Legacy,
    /// Start at the first millisecond of the period.
    Inclusive,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct BuilderConfig {
    pub max_conditions: usize,
    pub default_limit: u64,
    pub max_limit: u64,
    /// Logical names that are never filterable, regardless of expression.
    pub computed_field_names: Vec<String>,
    pub range_boundaries: RangeBoundaries,
    /// Inline full-text search terms as quoted literals and still push the
    /// value as a parameter. Only for consumers that depend on that layout.
    pub fts_inline_compat: bool,
}

impl Default for BuilderConfig {
    fn default() -> Self {
        Self {
            max_conditions: DEFAULT_MAX_CONDITIONS,
            default_limit: DEFAULT_LIMIT,
            max_limit: DEFAULT_MAX_LIMIT,
            computed_field_names: vec!["status".to_string(), "createdByUser".to_string()],
            range_boundaries: RangeBoundaries::default(),
            fts_inline_compat: false,
        }
    }
}

impl BuilderConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, ParseError> {
        let config: BuilderConfig =
            serde_json::from_str(json).map_err(|e| ParseError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if self.max_conditions == 0 {
            return Err(ParseError::InvalidConfig(
                "maxConditions must be greater than zero".to_string(),
            ));
        }
        if self.max_limit == 0 {
            return Err(ParseError::InvalidConfig(
                "maxLimit must be greater than zero".to_string(),
            ));
        }
        if self.default_limit > self.max_limit {
            return Err(ParseError::InvalidConfig(format!(
                "defaultLimit {} exceeds maxLimit {}",
                self.default_limit, self.max_limit
            )));
        }
        Ok(())
    }

    pub fn with_max_conditions(mut self, max: usize) -> Self {
        self.max_conditions = max;
        self
    }

    pub fn with_range_boundaries(mut self, boundaries: RangeBoundaries) -> Self {
        self.range_boundaries = boundaries;
        self
    }

    pub fn with_fts_inline_compat(mut self, enabled: bool) -> Self {
        self.fts_inline_compat = enabled;
        self
    }

    pub fn with_computed_field_names(mut self, names: Vec<String>) -> Self {
        self.computed_field_names = names;
        self
    }

    pub fn is_computed_name(&self, name: &str) -> bool {
        self.computed_field_names.iter().any(|n| n == name)
    }
}
