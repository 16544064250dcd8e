use thiserror::Error;

#[derive(Error, Debug, PartialEq, Clone)]
pub enum SqlError {
    #[error("unknown field: {0}")]
    UnknownField(String),

    #[error("computed field cannot be used here: {0}")]
    ComputedField(String),

    #[error("too many filter conditions: at most {max} allowed")]
    TooManyConditions { max: usize },

    #[error("duplicate field mapping: {0}")]
    DuplicateField(String),

    #[error("empty table name")]
    EmptyTableName,

    #[error("no select items specified")]
    NoSelectItems,
}
