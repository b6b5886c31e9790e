// MockBase - an in-memory stand-in for a hosted database-and-auth backend
// This is the library root that exposes the public API

pub mod auth;
pub mod bucket;
pub mod client;
pub mod config;
pub mod error;
pub mod query;
pub mod realtime;
pub mod response;
pub mod storage;

// Re-export commonly used types for convenience
pub use auth::{AuthApi, Credentials, Session};
pub use client::{IntoRecords, MockClient, TableHandle};
pub use config::{MockConfig, SingleRowPolicy};
pub use error::{ApiError, MockError, MockResult};
pub use query::{Filter, FilterOp, Query, QueryBuilder, QueryExecutor, QueryParser, Statement};
pub use realtime::Channel;
pub use response::Response;
pub use storage::{store::RecordStore, Record};
