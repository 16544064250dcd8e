pub mod common;
pub mod date;
pub mod filter;
pub mod order;

pub use common::{
    coerce_to_list, identifier, is_blank, parse_query_string, qualified_identifier,
    validate_identifier, validate_qualified_identifier,
};
pub use date::{parse_date_range, parse_month_year, parse_year};
pub use filter::{default_operator, reserved_key, resolve_filter, split_operator_suffix};
pub use order::{parse_direction, parse_sort, parse_sort_term};
