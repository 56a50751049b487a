//! SurrealDB row types
//!
//! `MemoryRow` is the on-disk shape of a `storage_traits::MemoryRecord`:
//! category as its string label, importance as a bare integer, and datetimes
//! as native SurrealDB datetimes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;
use crate::storage_traits::{Importance, MemoryRecord, RecordId};

/// Module for serializing chrono DateTime to SurrealDB datetime format
mod surreal_datetime {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = SurrealDatetime::from(*date);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = SurrealDatetime::deserialize(deserializer)?;
        Ok(DateTime::from(sd))
    }
}

/// Module for serializing optional chrono DateTime to SurrealDB datetime format
mod surreal_datetime_opt {
    use chrono::{DateTime, Utc};
    use serde::{self, Deserialize, Deserializer, Serializer};
    use surrealdb::sql::Datetime as SurrealDatetime;

    pub fn serialize<S>(date: &Option<DateTime<Utc>>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let sd = date.map(SurrealDatetime::from);
        serde::Serialize::serialize(&sd, serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let sd = Option::<SurrealDatetime>::deserialize(deserializer)?;
        Ok(sd.map(DateTime::from))
    }
}

/// Row in the `memory_entries` table.
///
/// The SurrealDB record id (`memory_entries:xyz`) is not mapped; records are
/// addressed by `record_id`, which carries a unique index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MemoryRow {
    /// Application-level record id (UUID string)
    pub record_id: String,
    /// Category label: "short_term" | "long_term" | "mission_specific" | "reflective"
    pub category: String,
    pub agent_name: String,
    pub mission_id: Option<String>,
    pub content: String,
    /// Caller metadata (JSON object)
    pub metadata: serde_json::Value,
    /// Importance score, 1..=10
    pub importance: u8,
    pub access_count: u64,
    #[serde(with = "surreal_datetime")]
    pub created_at: DateTime<Utc>,
    #[serde(default, with = "surreal_datetime_opt")]
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(with = "surreal_datetime")]
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

impl From<&MemoryRecord> for MemoryRow {
    fn from(record: &MemoryRecord) -> Self {
        MemoryRow {
            record_id: record.id.0.clone(),
            category: record.category.as_str().to_string(),
            agent_name: record.agent_name.clone(),
            mission_id: record.mission_id.clone(),
            content: record.content.clone(),
            metadata: record.metadata.clone(),
            importance: record.importance.get(),
            access_count: record.access_count,
            created_at: record.created_at,
            updated_at: record.updated_at,
            expires_at: record.expires_at,
            active: record.active,
        }
    }
}

impl TryFrom<MemoryRow> for MemoryRecord {
    type Error = StorageError;

    fn try_from(row: MemoryRow) -> Result<Self, Self::Error> {
        Ok(MemoryRecord {
            id: RecordId(row.record_id),
            category: row.category.parse()?,
            agent_name: row.agent_name,
            mission_id: row.mission_id,
            content: row.content,
            metadata: row.metadata,
            importance: Importance::try_from(row.importance as i64)?,
            access_count: row.access_count,
            created_at: row.created_at,
            updated_at: row.updated_at,
            expires_at: row.expires_at,
            active: row.active,
        })
    }
}

/// Single-column aggregate row produced by `SELECT count() AS total ... GROUP ALL`.
#[derive(Debug, Clone, Deserialize)]
pub struct CountRow {
    pub total: usize,
}
