use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum ParseError {
    #[error("unsupported operator: {0}")]
    UnsupportedOperator(String),

    #[error("invalid range format: {0} (expected \"start,end\" or {{start, end}})")]
    InvalidRangeFormat(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("invalid value for {operator}: {reason}")]
    InvalidValue { operator: String, reason: String },

    #[error("invalid integer value: {0}")]
    InvalidInteger(String),

    #[error("invalid limit value: {0}")]
    InvalidLimit(String),

    #[error("invalid offset value: {0}")]
    InvalidOffset(String),

    #[error("invalid direction: {0}")]
    InvalidDirection(String),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("invalid query string: {0}")]
    InvalidQueryString(String),
}

impl ParseError {
    pub(crate) fn invalid_value(operator: &str, reason: impl Into<String>) -> Self {
        ParseError::InvalidValue {
            operator: operator.to_string(),
            reason: reason.into(),
        }
    }
}
