//! In-memory `MemoryStore`
//!
//! Satisfies the `MemoryStore` contract without any external dependencies.
//! Used by tests and by the CLI's ephemeral `--store memory` mode.

use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::Utc;

use crate::error::StorageError;
use crate::storage_traits::*;

/// In-memory store backed by an insertion-ordered `Vec<MemoryRecord>`.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    records: Mutex<Vec<MemoryRecord>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> StorageResult<MutexGuard<'_, Vec<MemoryRecord>>> {
        self.records
            .lock()
            .map_err(|_| StorageError::Backend("in-memory store lock poisoned".to_string()))
    }
}

#[async_trait]
impl MemoryStore for InMemoryStore {
    async fn save(&self, record: &MemoryRecord) -> StorageResult<RecordId> {
        let mut records = self.lock()?;
        if records.iter().any(|r| r.id == record.id) {
            return Err(StorageError::DuplicateRecord {
                id: record.id.0.clone(),
            });
        }
        records.push(record.clone());
        Ok(record.id.clone())
    }

    async fn get(&self, id: &RecordId) -> StorageResult<MemoryRecord> {
        let records = self.lock()?;
        records
            .iter()
            .find(|r| &r.id == id)
            .cloned()
            .ok_or_else(|| StorageError::RecordNotFound { id: id.0.clone() })
    }

    async fn query(&self, filter: &RecordFilter) -> StorageResult<Vec<MemoryRecord>> {
        let records = self.lock()?;
        let mut matches: Vec<MemoryRecord> =
            records.iter().filter(|r| filter.matches(r)).cloned().collect();

        // Stable sort: equal keys keep insertion order.
        matches.sort_by(|a, b| filter.order.compare(a, b));

        if let Some(limit) = filter.limit {
            matches.truncate(limit);
        }
        Ok(matches)
    }

    async fn mark_inactive(&self, ids: &[RecordId]) -> StorageResult<usize> {
        let mut records = self.lock()?;
        let now = Utc::now();
        let mut affected = 0;
        for record in records.iter_mut().filter(|r| r.active && ids.contains(&r.id)) {
            record.active = false;
            record.updated_at = Some(now);
            affected += 1;
        }
        Ok(affected)
    }

    async fn count(&self, category: MemoryCategory, active_only: bool) -> StorageResult<usize> {
        let records = self.lock()?;
        Ok(records
            .iter()
            .filter(|r| r.category == category && (!active_only || r.active))
            .count())
    }

    async fn record_access(&self, ids: &[RecordId]) -> StorageResult<()> {
        let mut records = self.lock()?;
        for record in records.iter_mut().filter(|r| ids.contains(&r.id)) {
            record.access_count += 1;
        }
        Ok(())
    }
}
