//! Error types for merit-core

use thiserror::Error;

use crate::api::ApiError;

/// Result type alias using merit-core's Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in merit-core operations
#[derive(Error, Debug)]
pub enum Error {
    /// Key-value storage error
    #[error("Storage error: {0}")]
    Storage(String),

    /// SQLite error
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Remote API error
    #[error("Remote API error: {0}")]
    Api(#[from] ApiError),
}
