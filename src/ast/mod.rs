pub mod field;
pub mod filter;
pub mod order;
pub mod params;
pub mod select;

pub use field::{FieldMapping, FieldType};
pub use filter::{Filter, FilterOperator};
pub use order::{Direction, SortTerm};
pub use params::FilterRequest;
pub use select::{Aggregate, AggregateFn, Cte, Join, JoinKind};
