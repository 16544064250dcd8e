#[cfg(feature = "postgres")]
pub mod bind;
pub mod builder;
pub mod mapper;
pub mod pagination;
pub mod select;

#[cfg(feature = "postgres")]
pub use bind::bind_params;
pub use builder::{CustomTransform, FilterBuilder, FilterClause};
pub use mapper::ResponseMapper;
pub use pagination::{PageInfo, Pagination};
pub use select::{QueryResult, SelectQuery};
