//! Unified error hierarchy for the adaptation engine.
//!
//! The computational core never fails: match misses, missing profiles and
//! missing planned workouts all have documented defaults. Errors exist only
//! at the I/O boundary (store reads and writes), and the public boundary
//! functions degrade to "no data" rather than surfacing them.

use thiserror::Error;

/// Top-level error type for all adaptrs operations
#[derive(Debug, Error)]
pub enum AdaptError {
    /// Store operation errors
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    /// Data validation errors
    #[error("Validation error: {0}")]
    Validation(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Generic internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Store operation errors
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Record not found: {table}.{id}")]
    NotFound { table: String, id: String },
}

impl From<serde_json::Error> for DatabaseError {
    fn from(err: serde_json::Error) -> Self {
        DatabaseError::Serialization(err.to_string())
    }
}

/// Result type alias using the unified error
pub type Result<T> = std::result::Result<T, AdaptError>;
