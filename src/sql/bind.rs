use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;

use crate::operators::value_text;

/// Binds `params` in order onto a prepared sqlx query.
///
/// Integers bind as `int8`, other numbers as `float8`, arrays as `text[]`
/// and objects as `jsonb`. Null binds as a typed text NULL.
pub fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &[Value],
) -> Query<'q, Postgres, PgArguments> {
    for param in params {
        query = match param {
            Value::Null => query.bind(None::<String>),
            Value::Bool(b) => query.bind(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => query.bind(i),
                None => query.bind(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => query.bind(s.clone()),
            Value::Array(items) => query.bind(items.iter().map(value_text).collect::<Vec<String>>()),
            Value::Object(_) => query.bind(sqlx::types::Json(param.clone())),
        };
    }
    query
}
