//! Storage vocabulary and the `MemoryStore` port.
//!
//! - `MemoryCategory`: the four fixed retention buckets
//! - `Importance`: 1..=10 score newtype
//! - `MemoryRecord`: a persisted memory entry (soft-deleted via `active`)
//! - `RecordFilter` / `RecordOrder`: backend-agnostic query description
//! - `MemoryStore`: async persistence port
//!
//! In-memory implementations live in the `fakes` module, the SurrealDB one in
//! `surreal_store`.

use std::cmp::Ordering;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::StorageError;

/// Result type for storage operations
pub type StorageResult<T> = std::result::Result<T, StorageError>;

// ---------------------------------------------------------------------------
// MemoryCategory
// ---------------------------------------------------------------------------

/// Retention bucket a memory record is classified into.
///
/// Declaration order is the tie-break priority used by classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemoryCategory {
    ShortTerm,
    LongTerm,
    MissionSpecific,
    Reflective,
}

impl MemoryCategory {
    /// All categories in tie-break priority order.
    pub const ALL: [MemoryCategory; 4] = [
        MemoryCategory::ShortTerm,
        MemoryCategory::LongTerm,
        MemoryCategory::MissionSpecific,
        MemoryCategory::Reflective,
    ];

    /// Stable storage / wire label.
    pub fn as_str(&self) -> &'static str {
        match self {
            MemoryCategory::ShortTerm => "short_term",
            MemoryCategory::LongTerm => "long_term",
            MemoryCategory::MissionSpecific => "mission_specific",
            MemoryCategory::Reflective => "reflective",
        }
    }
}

impl std::fmt::Display for MemoryCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MemoryCategory {
    type Err = StorageError;

    /// Accepts `short_term`, `short-term` and `short term` spellings, any case.
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace(['-', ' '], "_");
        MemoryCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .ok_or_else(|| StorageError::UnknownCategory {
                label: s.to_string(),
            })
    }
}

// ---------------------------------------------------------------------------
// Importance
// ---------------------------------------------------------------------------

/// Importance score on the 1..=10 scale.
///
/// Construction through [`Importance::clamped`] can never produce an
/// out-of-range value; deserialization rejects one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "u8")]
pub struct Importance(u8);

impl Importance {
    pub const MIN: Importance = Importance(1);
    pub const MAX: Importance = Importance(10);

    /// Clamp any integer into the 1..=10 scale.
    pub fn clamped(value: i64) -> Self {
        Importance(value.clamp(Self::MIN.0 as i64, Self::MAX.0 as i64) as u8)
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl TryFrom<i64> for Importance {
    type Error = StorageError;

    fn try_from(value: i64) -> std::result::Result<Self, Self::Error> {
        if (Self::MIN.0 as i64..=Self::MAX.0 as i64).contains(&value) {
            Ok(Importance(value as u8))
        } else {
            Err(StorageError::InvalidImportance { value })
        }
    }
}

impl From<Importance> for u8 {
    fn from(value: Importance) -> Self {
        value.0
    }
}

impl std::fmt::Display for Importance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// MemoryRecord
// ---------------------------------------------------------------------------

/// Opaque identifier of a memory record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(pub String);

impl RecordId {
    /// Generate a new random RecordId
    pub fn new() -> Self {
        RecordId(uuid::Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for RecordId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RecordId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        RecordId(s.to_string())
    }
}

/// A persisted memory entry.
///
/// Records are never physically deleted: eviction and purge flip `active` to
/// `false`, and inactive records stay readable for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: RecordId,
    pub category: MemoryCategory,
    /// Agent (or user) that produced the content
    pub agent_name: String,
    pub mission_id: Option<String>,
    pub content: String,
    /// Caller-supplied metadata, stored verbatim
    pub metadata: serde_json::Value,
    pub importance: Importance,
    /// Number of times the record was returned by a retrieval
    pub access_count: u64,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    pub expires_at: DateTime<Utc>,
    pub active: bool,
}

// ---------------------------------------------------------------------------
// RecordFilter
// ---------------------------------------------------------------------------

/// Result ordering for [`MemoryStore::query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecordOrder {
    /// Oldest first (insertion order for equal timestamps).
    #[default]
    Oldest,
    /// Least important first, then oldest. The eviction order.
    EvictionPriority,
    /// Most important first, then newest. The retrieval order.
    Relevance,
}

impl RecordOrder {
    /// Compare two records under this ordering.
    pub fn compare(&self, a: &MemoryRecord, b: &MemoryRecord) -> Ordering {
        match self {
            RecordOrder::Oldest => a.created_at.cmp(&b.created_at),
            RecordOrder::EvictionPriority => a
                .importance
                .cmp(&b.importance)
                .then_with(|| a.created_at.cmp(&b.created_at)),
            RecordOrder::Relevance => b
                .importance
                .cmp(&a.importance)
                .then_with(|| b.created_at.cmp(&a.created_at)),
        }
    }
}

/// Backend-agnostic record query.
///
/// All set criteria are AND-ed, except the two age bounds (`created_before`,
/// `expired_before`): a record satisfies the age criterion when it meets
/// *either* of the bounds that are set.
#[derive(Debug, Clone, Default)]
pub struct RecordFilter {
    pub category: Option<MemoryCategory>,
    pub active_only: bool,
    /// `importance >= min_importance`
    pub min_importance: Option<Importance>,
    /// `importance < importance_below` (may be 11 to match every score)
    pub importance_below: Option<u8>,
    /// `created_at < created_before`
    pub created_before: Option<DateTime<Utc>>,
    /// `expires_at < expired_before`
    pub expired_before: Option<DateTime<Utc>>,
    pub mission_id: Option<String>,
    pub agent_name: Option<String>,
    pub order: RecordOrder,
    pub limit: Option<usize>,
}

impl RecordFilter {
    /// Filter that matches every record, oldest first.
    pub fn all() -> Self {
        Self::default()
    }

    /// Active records of one category.
    pub fn active_in(category: MemoryCategory) -> Self {
        Self {
            category: Some(category),
            active_only: true,
            ..Self::default()
        }
    }

    pub fn with_category(mut self, category: MemoryCategory) -> Self {
        self.category = Some(category);
        self
    }

    pub fn active(mut self) -> Self {
        self.active_only = true;
        self
    }

    pub fn with_min_importance(mut self, min: Importance) -> Self {
        self.min_importance = Some(min);
        self
    }

    pub fn with_importance_below(mut self, bound: u8) -> Self {
        self.importance_below = Some(bound);
        self
    }

    pub fn created_before(mut self, ts: DateTime<Utc>) -> Self {
        self.created_before = Some(ts);
        self
    }

    pub fn expired_before(mut self, ts: DateTime<Utc>) -> Self {
        self.expired_before = Some(ts);
        self
    }

    pub fn with_mission(mut self, mission_id: &str) -> Self {
        self.mission_id = Some(mission_id.to_string());
        self
    }

    pub fn with_agent(mut self, agent_name: &str) -> Self {
        self.agent_name = Some(agent_name.to_string());
        self
    }

    pub fn ordered(mut self, order: RecordOrder) -> Self {
        self.order = order;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Whether `record` satisfies every criterion (ordering and limit aside).
    pub fn matches(&self, record: &MemoryRecord) -> bool {
        if let Some(category) = self.category {
            if record.category != category {
                return false;
            }
        }
        if self.active_only && !record.active {
            return false;
        }
        if let Some(min) = self.min_importance {
            if record.importance < min {
                return false;
            }
        }
        if let Some(bound) = self.importance_below {
            if record.importance.get() >= bound {
                return false;
            }
        }
        let age_ok = match (self.created_before, self.expired_before) {
            (None, None) => true,
            (Some(c), None) => record.created_at < c,
            (None, Some(e)) => record.expires_at < e,
            (Some(c), Some(e)) => record.created_at < c || record.expires_at < e,
        };
        if !age_ok {
            return false;
        }
        if let Some(ref mission) = self.mission_id {
            if record.mission_id.as_deref() != Some(mission.as_str()) {
                return false;
            }
        }
        if let Some(ref agent) = self.agent_name {
            if &record.agent_name != agent {
                return false;
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// MemoryStore — persistence port
// ---------------------------------------------------------------------------

/// Memory record persistence.
///
/// Guarantees:
/// - `save` never overwrites: a second save of the same id fails with
///   `StorageError::DuplicateRecord`.
/// - Records are never deleted; `mark_inactive` is the only way to retire one.
/// - `query` honours `RecordFilter::order`; ties keep insertion order.
/// - Each call is its own unit of work (no explicit commit).
#[async_trait]
pub trait MemoryStore: Send + Sync {
    /// Persist a new record and return its id.
    async fn save(&self, record: &MemoryRecord) -> StorageResult<RecordId>;

    /// Fetch a single record (active or not).
    async fn get(&self, id: &RecordId) -> StorageResult<MemoryRecord>;

    /// Records matching `filter`, ordered and limited as it requests.
    async fn query(&self, filter: &RecordFilter) -> StorageResult<Vec<MemoryRecord>>;

    /// Set `active = false` on the given records. Returns how many were
    /// active before the call. Unknown ids are ignored.
    async fn mark_inactive(&self, ids: &[RecordId]) -> StorageResult<usize>;

    /// Number of records in `category`, optionally only active ones.
    async fn count(&self, category: MemoryCategory, active_only: bool) -> StorageResult<usize>;

    /// Increment `access_count` on the given records.
    async fn record_access(&self, ids: &[RecordId]) -> StorageResult<()>;
}
