// Query module - builds, parses and evaluates queries against the record store
pub mod builder;
pub mod executor;
pub mod filter;
pub mod parser;

pub use builder::{Columns, OrderBy, Query, QueryBuilder};
pub use executor::QueryExecutor;
pub use filter::{Filter, FilterOp};
pub use parser::{QueryParser, Statement};
