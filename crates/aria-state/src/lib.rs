//! aria-state: persistence layer for ARIA memory records
//!
//! ## Layer 0 - Data/Persistence
//!
//! Focus: record integrity and the soft-delete invariant. Records are saved
//! once, retired by flipping `active`, and never physically removed.
//!
//! ## Key Components
//!
//! - `MemoryStore`: the async persistence port used by the retention engine
//! - `MemoryRecord` / `MemoryCategory` / `Importance`: storage vocabulary
//! - `InMemoryStore`: dependency-free implementation (tests, ephemeral runs)
//! - `SurrealMemoryStore`: SurrealDB implementation (mem, SurrealKV, remote)

pub mod connection;
mod error;
pub mod fakes;
pub mod migrations;
mod schema;
pub mod storage_traits;
pub mod surreal_store;

pub use connection::{CloudConfig, StoreLocation};
pub use error::StorageError;
pub use fakes::InMemoryStore;
pub use schema::MemoryRow;
pub use storage_traits::{
    Importance, MemoryCategory, MemoryRecord, MemoryStore, RecordFilter, RecordId, RecordOrder,
    StorageResult,
};
pub use surreal_store::SurrealMemoryStore;
