//! SurrealDB-backed MemoryStore implementation
//!
//! Uses `schema::MemoryRow` for persistence, converting to/from
//! `storage_traits::MemoryRecord` at the boundary.

use std::fmt::Write as _;

use async_trait::async_trait;
use surrealdb::engine::any::Any;
use surrealdb::sql::Datetime as SurrealDatetime;
use surrealdb::Surreal;
use tracing::debug;

use crate::connection::{self, StoreLocation};
use crate::error::StorageError;
use crate::migrations::MEMORY_TABLE;
use crate::schema::{CountRow, MemoryRow};
use crate::storage_traits::{
    MemoryCategory, MemoryRecord, MemoryStore, RecordFilter, RecordId, RecordOrder,
    StorageResult,
};

/// SurrealDB-backed implementation of [`MemoryStore`].
pub struct SurrealMemoryStore {
    db: Surreal<Any>,
}

impl SurrealMemoryStore {
    /// Create an in-memory instance (`mem://`), mostly for tests.
    pub async fn in_memory() -> StorageResult<Self> {
        Self::connect(&StoreLocation::Memory).await
    }

    /// Connect to an explicit location.
    pub async fn connect(location: &StoreLocation) -> StorageResult<Self> {
        let db = connection::connect(location).await?;
        Ok(Self { db })
    }

    /// Connect to the location resolved from the environment.
    ///
    /// See [`StoreLocation::from_env`].
    pub async fn from_env() -> StorageResult<Self> {
        Self::connect(&StoreLocation::from_env()).await
    }

    // -- private helpers -----------------------------------------------------

    async fn fetch_row(&self, rid: &str) -> StorageResult<Option<MemoryRow>> {
        let rid_owned = rid.to_string();
        let mut res = self
            .db
            .query("SELECT * FROM memory_entries WHERE record_id = $rid")
            .bind(("rid", rid_owned))
            .await?;

        let rows: Vec<MemoryRow> = res.take(0)?;
        Ok(rows.into_iter().next())
    }

    /// Render the SurrealQL for a filter. Values are bound separately in
    /// [`SurrealMemoryStore::query`]; only the limit is inlined.
    fn select_sql(filter: &RecordFilter) -> String {
        let mut clauses: Vec<&str> = Vec::new();
        if filter.category.is_some() {
            clauses.push("category = $category");
        }
        if filter.active_only {
            clauses.push("active = true");
        }
        if filter.min_importance.is_some() {
            clauses.push("importance >= $min_importance");
        }
        if filter.importance_below.is_some() {
            clauses.push("importance < $importance_below");
        }
        match (filter.created_before, filter.expired_before) {
            (Some(_), Some(_)) => {
                clauses.push("(created_at < $created_before OR expires_at < $expired_before)")
            }
            (Some(_), None) => clauses.push("created_at < $created_before"),
            (None, Some(_)) => clauses.push("expires_at < $expired_before"),
            (None, None) => {}
        }
        if filter.mission_id.is_some() {
            clauses.push("mission_id = $mission_id");
        }
        if filter.agent_name.is_some() {
            clauses.push("agent_name = $agent_name");
        }

        let mut sql = format!("SELECT * FROM {MEMORY_TABLE}");
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(match filter.order {
            RecordOrder::Oldest => " ORDER BY created_at ASC",
            RecordOrder::EvictionPriority => " ORDER BY importance ASC, created_at ASC",
            RecordOrder::Relevance => " ORDER BY importance DESC, created_at DESC",
        });
        if let Some(limit) = filter.limit {
            let _ = write!(sql, " LIMIT {limit}");
        }
        sql
    }

    fn ids_owned(ids: &[RecordId]) -> Vec<String> {
        ids.iter().map(|id| id.0.clone()).collect()
    }
}

#[async_trait]
impl MemoryStore for SurrealMemoryStore {
    async fn save(&self, record: &MemoryRecord) -> StorageResult<RecordId> {
        if self.fetch_row(record.id.as_str()).await?.is_some() {
            return Err(StorageError::DuplicateRecord {
                id: record.id.0.clone(),
            });
        }

        debug!(record_id = %record.id, category = %record.category, "saving memory record");

        let _created: Option<MemoryRow> = self
            .db
            .create(MEMORY_TABLE)
            .content(MemoryRow::from(record))
            .await?;

        Ok(record.id.clone())
    }

    async fn get(&self, id: &RecordId) -> StorageResult<MemoryRecord> {
        let row = self
            .fetch_row(id.as_str())
            .await?
            .ok_or_else(|| StorageError::RecordNotFound { id: id.0.clone() })?;
        MemoryRecord::try_from(row)
    }

    async fn query(&self, filter: &RecordFilter) -> StorageResult<Vec<MemoryRecord>> {
        let sql = Self::select_sql(filter);
        debug!(sql = %sql, "querying memory records");

        let mut query = self.db.query(sql);
        if let Some(category) = filter.category {
            query = query.bind(("category", category.as_str().to_string()));
        }
        if let Some(min) = filter.min_importance {
            query = query.bind(("min_importance", min.get()));
        }
        if let Some(bound) = filter.importance_below {
            query = query.bind(("importance_below", bound));
        }
        if let Some(ts) = filter.created_before {
            query = query.bind(("created_before", SurrealDatetime::from(ts)));
        }
        if let Some(ts) = filter.expired_before {
            query = query.bind(("expired_before", SurrealDatetime::from(ts)));
        }
        if let Some(ref mission) = filter.mission_id {
            query = query.bind(("mission_id", mission.clone()));
        }
        if let Some(ref agent) = filter.agent_name {
            query = query.bind(("agent_name", agent.clone()));
        }

        let mut res = query.await?;
        let rows: Vec<MemoryRow> = res.take(0)?;
        rows.into_iter().map(MemoryRecord::try_from).collect()
    }

    async fn mark_inactive(&self, ids: &[RecordId]) -> StorageResult<usize> {
        if ids.is_empty() {
            return Ok(0);
        }

        let mut res = self
            .db
            .query(
                "UPDATE memory_entries SET active = false, updated_at = time::now() \
                 WHERE record_id INSIDE $ids AND active = true",
            )
            .bind(("ids", Self::ids_owned(ids)))
            .await?;

        let updated: Vec<MemoryRow> = res.take(0)?;
        Ok(updated.len())
    }

    async fn count(&self, category: MemoryCategory, active_only: bool) -> StorageResult<usize> {
        let sql = if active_only {
            "SELECT count() AS total FROM memory_entries \
             WHERE category = $category AND active = true GROUP ALL"
        } else {
            "SELECT count() AS total FROM memory_entries WHERE category = $category GROUP ALL"
        };

        let mut res = self
            .db
            .query(sql)
            .bind(("category", category.as_str().to_string()))
            .await?;

        let rows: Vec<CountRow> = res.take(0)?;
        Ok(rows.first().map(|r| r.total).unwrap_or(0))
    }

    async fn record_access(&self, ids: &[RecordId]) -> StorageResult<()> {
        if ids.is_empty() {
            return Ok(());
        }

        self.db
            .query("UPDATE memory_entries SET access_count += 1 WHERE record_id INSIDE $ids")
            .bind(("ids", Self::ids_owned(ids)))
            .await?
            .check()?;
        Ok(())
    }
}
