pub mod parse;
pub mod sql;

pub use parse::ParseError;
pub use sql::SqlError;

use thiserror::Error;

/// Any failure while turning a request into SQL. Input-shape problems are
/// `Parse`; schema and statement problems are `Sql`.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum Error {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Sql(#[from] SqlError),
}
