//! ARIA Core Library
//!
//! Keyword routing of inbound messages to handlers, and the retention engine
//! that classifies, scores and stores memory records under per-category caps.

pub mod config;
pub mod memory;
pub mod metrics;
pub mod obs;
pub mod routing;
pub mod telemetry;

pub use config::{AriaConfig, ConfigError, DEFAULT_CONFIG};

pub use memory::{
    Admission, Candidate, CategoryPolicy, CategoryStatistics, ChatCompletionsClassifier,
    ClassificationError, Classifier, ClassifierConfig, MemoryCommand, MemoryResponse,
    MemoryStatistics, PolicyTable, Priority, PurgeRequest, PurgeResult, RecordMetadata,
    RetentionEngine, RetentionError, RetentionResult, RetrievalQuery, StoreOutcome, StoreStatus,
    ValidationFailure, MEMORY_MANAGER_HANDLER,
};

pub use routing::{
    HandlerRegistration, RegistrationReport, RouteDecision, RouteTarget, Router, RouterStatus,
    RoutingError, UNHANDLED,
};

pub use aria_state::{
    Importance, InMemoryStore, MemoryCategory, MemoryRecord, MemoryStore, RecordId, StorageError,
    StoreLocation, SurrealMemoryStore,
};

pub use telemetry::init_tracing;

/// Crate version, as recorded in `Cargo.toml`.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
