//! Memory retention: classification, importance scoring and capped storage.
//!
//! # Module layout
//!
//! - [`keywords`] — category and importance keyword tables
//! - [`scoring`] — importance score on the 1..=10 scale
//! - [`policy`] — `CategoryPolicy`, `PolicyTable`
//! - [`metadata`] — `RecordMetadata`, `Priority`
//! - [`classifier`] — `Classifier` port and the chat-completions client
//! - [`commands`] — commands in messages routed to the memory manager
//! - [`engine`] — `RetentionEngine`
//! - [`error`] — `RetentionError`, `ValidationFailure`

pub mod classifier;
pub mod commands;
pub mod engine;
pub mod error;
pub mod keywords;
pub mod metadata;
pub mod policy;
pub mod scoring;

pub use classifier::{ChatCompletionsClassifier, ClassificationError, Classifier, ClassifierConfig};
pub use commands::{MemoryCommand, MEMORY_MANAGER_HANDLER};
pub use engine::{
    Admission, Candidate, CategoryStatistics, MemoryResponse, MemoryStatistics, PurgeRequest,
    PurgeResult, RetentionEngine, RetrievalQuery, StoreOutcome, StoreStatus, DEFAULT_AGENT_NAME,
    DEFAULT_RETRIEVE_LIMIT,
};
pub use error::{RetentionError, RetentionResult, ValidationFailure};
pub use keywords::{category_scores, classify_by_keywords};
pub use metadata::{Priority, RecordMetadata};
pub use policy::{CategoryPolicy, PolicyTable, MAX_RETENTION_DAYS};
pub use scoring::score;
