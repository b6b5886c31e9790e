// Error types
// Two channels exist: ApiError travels inside a Response (the backend's
// `{ data, error }` pair), MockError is a regular Rust error for the console
// and config loader.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result alias for operations that can fail outside the response channel
pub type MockResult<T> = std::result::Result<T, MockError>;

/// Errors raised by the SQL console and configuration loading
#[derive(Debug, Error)]
pub enum MockError {
    /// The SQL text could not be parsed at all
    #[error("SQL parsing error: {0}")]
    Parse(String),

    /// The SQL parsed but uses something the console cannot translate
    #[error("Unsupported SQL: {0}")]
    Unsupported(String),

    /// The configuration is inconsistent
    #[error("Invalid config: {0}")]
    Config(String),

    /// A seed file did not have the expected shape
    #[error("Invalid seed data: {0}")]
    Seed(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// The error half of a `{ data, error }` response pair
/// Serializes as `{ "message": "..." }`, the same shape the hosted backend uses
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ApiError {
    pub message: String,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
