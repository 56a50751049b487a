//! Error types for the retention engine.

use aria_state::{MemoryCategory, RecordId, StorageError};

/// Input that the engine refuses before classification.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationFailure {
    #[error("content must not be empty")]
    EmptyContent,
}

/// Errors produced by retention operations.
#[derive(Debug, thiserror::Error)]
pub enum RetentionError {
    #[error("invalid memory entry: {0}")]
    Validation(#[from] ValidationFailure),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("retention window of {retention_days} days for {category} is out of range")]
    ExpiryOutOfRange {
        category: MemoryCategory,
        retention_days: u32,
    },

    /// The record was saved and is active, but the category cap could not be
    /// enforced afterwards.
    #[error("record {record_id} stored but cap enforcement failed: {source}")]
    CapNotEnforced {
        record_id: RecordId,
        #[source]
        source: Box<RetentionError>,
    },
}

impl RetentionError {
    /// Id of a record that was persisted before the failure, if any.
    pub fn stored_record(&self) -> Option<&RecordId> {
        match self {
            RetentionError::CapNotEnforced { record_id, .. } => Some(record_id),
            _ => None,
        }
    }
}

/// Result type for retention operations.
pub type RetentionResult<T> = std::result::Result<T, RetentionError>;
