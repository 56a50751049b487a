//! Error types for aria-state

use thiserror::Error;

/// Errors that can occur in the memory persistence layer
#[derive(Error, Debug)]
pub enum StorageError {
    /// No record with the given id exists
    #[error("memory record not found: {id}")]
    RecordNotFound { id: String },

    /// A record with the given id was already saved
    #[error("memory record already exists: {id}")]
    DuplicateRecord { id: String },

    /// Category label that does not name one of the fixed categories
    #[error("unknown memory category: {label}")]
    UnknownCategory { label: String },

    /// Importance value outside the 1..=10 scale
    #[error("importance {value} is outside the 1..=10 scale")]
    InvalidImportance { value: i64 },

    /// Database connection error
    #[error("database connection failed: {0}")]
    Connection(String),

    /// Schema setup error
    #[error("schema setup failed: {0}")]
    SchemaSetup(String),

    /// Query or write rejected by the backend
    #[error("storage backend error: {0}")]
    Backend(String),

    /// Serialization error
    #[error("serialization failed: {0}")]
    Serialization(String),
}

impl From<surrealdb::Error> for StorageError {
    fn from(err: surrealdb::Error) -> Self {
        StorageError::Backend(err.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}
