//! SurrealDB schema initialization for memory records

use surrealdb::engine::any::Any;
use surrealdb::Surreal;
use tracing::{debug, info};

use crate::error::StorageError;
use crate::storage_traits::StorageResult;

/// Table holding every memory record, active or retired.
pub const MEMORY_TABLE: &str = "memory_entries";

/// Initialize all ARIA tables in SurrealDB.
///
/// Safe to call multiple times (idempotent).
pub async fn init_schema(db: &Surreal<Any>) -> StorageResult<()> {
    info!("Initializing ARIA memory schema");
    init_memory_entries_table(db).await?;
    Ok(())
}

/// Initialize `memory_entries`.
///
/// Schema:
/// ```text
/// TABLE memory_entries {
///   record_id:     STRING (unique)
///   category:      STRING (short_term | long_term | mission_specific | reflective)
///   agent_name:    STRING
///   mission_id:    STRING?
///   content:       STRING
///   metadata:      OBJECT
///   importance:    INT (1..=10)
///   access_count:  INT
///   created_at:    DATETIME
///   updated_at:    DATETIME?
///   expires_at:    DATETIME
///   active:        BOOL
/// }
/// ```
///
/// Rows are never deleted: retirement flips `active`.
async fn init_memory_entries_table(db: &Surreal<Any>) -> StorageResult<()> {
    debug!("Initializing memory_entries table");

    let sql = r#"
        DEFINE TABLE IF NOT EXISTS memory_entries SCHEMALESS;

        DEFINE INDEX IF NOT EXISTS idx_record_id ON TABLE memory_entries COLUMNS record_id UNIQUE;

        -- Cap enforcement and statistics scan active rows of one category
        DEFINE INDEX IF NOT EXISTS idx_category_active ON TABLE memory_entries COLUMNS category, active;

        DEFINE INDEX IF NOT EXISTS idx_importance ON TABLE memory_entries COLUMNS importance;
        DEFINE INDEX IF NOT EXISTS idx_created_at ON TABLE memory_entries COLUMNS created_at;
        DEFINE INDEX IF NOT EXISTS idx_expires_at ON TABLE memory_entries COLUMNS expires_at;
        DEFINE INDEX IF NOT EXISTS idx_mission_id ON TABLE memory_entries COLUMNS mission_id;
    "#;

    db.query(sql)
        .await
        .and_then(|response| response.check())
        .map_err(|e| StorageError::SchemaSetup(e.to_string()))?;
    info!("✓ {} table initialized", MEMORY_TABLE);
    Ok(())
}
