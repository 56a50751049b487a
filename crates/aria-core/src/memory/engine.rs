//! Retention engine: classify, score, admit, cap, purge and retrieve.
//!
//! A record moves proposed → classified → scored → admitted | rejected, and
//! an admitted record may later be retired (evicted or purged). Retirement is
//! a soft delete through [`MemoryStore::mark_inactive`].
//!
//! Admission and purge of one category are serialised by a per-category
//! mutex, so the active-count cap holds under concurrent callers.

use std::sync::Arc;

use aria_state::{
    Importance, MemoryCategory, MemoryRecord, MemoryStore, RecordFilter, RecordId, RecordOrder,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::classifier::Classifier;
use super::commands::{
    MemoryCommand, AVAILABLE_COMMANDS, COMMAND_RETRIEVE_LIMIT, INTERACTIVE_AGENT_NAME,
};
use super::error::{RetentionError, RetentionResult, ValidationFailure};
use super::keywords::classify_by_keywords;
use super::metadata::RecordMetadata;
use super::policy::{CategoryPolicy, PolicyTable};
use super::scoring;
use crate::metrics::METRICS;
use crate::obs;

/// Agent name recorded when the caller gives none.
pub const DEFAULT_AGENT_NAME: &str = "unknown";
/// Retrieval limit when the caller gives none.
pub const DEFAULT_RETRIEVE_LIMIT: usize = 100;

/// A classified and scored entry awaiting admission.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub content: String,
    pub category: MemoryCategory,
    pub importance: Importance,
    pub metadata: RecordMetadata,
}

/// Result of [`RetentionEngine::admit`].
#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Accepted {
        record: MemoryRecord,
        /// Records retired to keep the category under its cap.
        evicted: Vec<RecordId>,
    },
    Rejected {
        category: MemoryCategory,
        importance: Importance,
        threshold: u8,
    },
}

/// Criteria for [`RetentionEngine::purge`].
#[derive(Debug, Clone, PartialEq)]
pub struct PurgeRequest {
    pub category: MemoryCategory,
    /// Records created before this instant qualify by age.
    pub older_than: Option<DateTime<Utc>>,
    /// Only records scoring strictly below this are purged.
    pub min_importance: u8,
    /// Count matches without retiring them.
    pub dry_run: bool,
}

impl PurgeRequest {
    pub fn new(category: MemoryCategory, min_importance: u8) -> Self {
        Self {
            category,
            older_than: None,
            min_importance,
            dry_run: false,
        }
    }

    pub fn older_than(mut self, ts: DateTime<Utc>) -> Self {
        self.older_than = Some(ts);
        self
    }

    pub fn dry_run(mut self) -> Self {
        self.dry_run = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PurgeResult {
    pub category: MemoryCategory,
    pub dry_run: bool,
    /// Records matching the criteria.
    pub matched: usize,
    /// Records actually retired (0 on a dry run).
    pub purged: usize,
    pub record_ids: Vec<RecordId>,
}

/// Criteria for [`RetentionEngine::retrieve`].
#[derive(Debug, Clone, PartialEq)]
pub struct RetrievalQuery {
    pub category: MemoryCategory,
    pub min_importance: Importance,
    pub mission_id: Option<String>,
    pub agent_name: Option<String>,
    pub limit: usize,
}

impl RetrievalQuery {
    pub fn new(category: MemoryCategory) -> Self {
        Self {
            category,
            min_importance: Importance::MIN,
            mission_id: None,
            agent_name: None,
            limit: DEFAULT_RETRIEVE_LIMIT,
        }
    }

    pub fn with_min_importance(mut self, min: Importance) -> Self {
        self.min_importance = min;
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

    /// Zero is raised to one.
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryStatistics {
    pub category: MemoryCategory,
    pub active_count: usize,
    /// Mean importance of active records, two decimals; 0 when empty.
    pub average_importance: f64,
    pub max_active_entries: usize,
    pub retention_days: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MemoryStatistics {
    pub categories: Vec<CategoryStatistics>,
    pub total_active: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreStatus {
    Accepted,
    Rejected,
    Error,
}

/// Answer of [`RetentionEngine::handle`], tagged by the command that ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum MemoryResponse {
    Store(StoreOutcome),
    Retrieve {
        category: MemoryCategory,
        records: Vec<MemoryRecord>,
    },
    Statistics(MemoryStatistics),
    Help {
        available_commands: &'static [&'static str],
    },
    Failed {
        operation: &'static str,
        reason: String,
    },
}

impl MemoryResponse {
    fn failed(operation: &'static str, error: RetentionError) -> Self {
        warn!(operation, error = %error, "memory command failed");
        MemoryResponse::Failed {
            operation,
            reason: error.to_string(),
        }
    }
}

/// Answer of [`RetentionEngine::analyze_and_store`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StoreOutcome {
    pub status: StoreStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<MemoryCategory>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub importance: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record_id: Option<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expires_at: Option<DateTime<Utc>>,
    /// Records evicted by this admission.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub evicted: Vec<RecordId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StoreOutcome {
    fn rejected(reason: String) -> Self {
        Self {
            status: StoreStatus::Rejected,
            category: None,
            importance: None,
            record_id: None,
            expires_at: None,
            evicted: Vec::new(),
            reason: Some(reason),
        }
    }

    fn error(category: Option<MemoryCategory>, importance: Option<u8>, reason: String) -> Self {
        Self {
            status: StoreStatus::Error,
            category,
            importance,
            record_id: None,
            expires_at: None,
            evicted: Vec::new(),
            reason: Some(reason),
        }
    }
}

/// Classifies, scores and retains memory records.
pub struct RetentionEngine {
    store: Arc<dyn MemoryStore>,
    policies: PolicyTable,
    classifier: Option<Arc<dyn Classifier>>,
    /// One lock per category, indexed by `MemoryCategory as usize`.
    locks: [Mutex<()>; 4],
}

impl RetentionEngine {
    pub fn new(store: Arc<dyn MemoryStore>, policies: PolicyTable) -> Self {
        Self {
            store,
            policies,
            classifier: None,
            locks: Default::default(),
        }
    }

    /// Consult `classifier` when no category keyword matches.
    pub fn with_classifier(mut self, classifier: Arc<dyn Classifier>) -> Self {
        self.classifier = Some(classifier);
        self
    }

    pub fn policies(&self) -> &PolicyTable {
        &self.policies
    }

    pub fn policy(&self, category: MemoryCategory) -> &CategoryPolicy {
        self.policies.get(category)
    }

    pub fn store(&self) -> &Arc<dyn MemoryStore> {
        &self.store
    }

    fn lock_for(&self, category: MemoryCategory) -> &Mutex<()> {
        &self.locks[category as usize]
    }

    // -- classification & scoring -------------------------------------------

    /// Category for `content`.
    ///
    /// A non-empty mission id wins outright. Otherwise the keyword tables
    /// decide; when nothing matches the classifier is asked, and any failure
    /// (or no classifier) yields `short_term`.
    pub async fn classify(&self, content: &str, metadata: &RecordMetadata) -> MemoryCategory {
        if metadata.mission().is_some() {
            return MemoryCategory::MissionSpecific;
        }
        if let Some(category) = classify_by_keywords(content) {
            return category;
        }
        let Some(ref classifier) = self.classifier else {
            return MemoryCategory::ShortTerm;
        };
        match classifier.classify(content).await {
            Ok(category) => {
                debug!(category = %category, "classified by external classifier");
                category
            }
            Err(e) => {
                METRICS.inc_classifier_fallbacks();
                obs::emit_classifier_fallback(&e);
                MemoryCategory::ShortTerm
            }
        }
    }

    pub fn score(
        &self,
        content: &str,
        category: MemoryCategory,
        metadata: &RecordMetadata,
    ) -> Importance {
        scoring::score(content, category, metadata)
    }

    // -- admission ----------------------------------------------------------

    /// Store `candidate` if it meets its category threshold, then enforce the
    /// category cap. Both steps run under the category lock.
    ///
    /// The save is not rolled back when cap enforcement fails: the error is
    /// [`RetentionError::CapNotEnforced`] carrying the stored record's id, and
    /// the category may stay above its cap until the next admission or an
    /// explicit [`RetentionEngine::enforce_cap`].
    pub async fn admit(&self, candidate: Candidate) -> RetentionResult<Admission> {
        let policy = *self.policy(candidate.category);
        if candidate.importance.get() < policy.importance_threshold {
            METRICS.inc_rejected();
            obs::emit_memory_rejected(
                candidate.category.as_str(),
                candidate.importance.get(),
                policy.importance_threshold,
            );
            return Ok(Admission::Rejected {
                category: candidate.category,
                importance: candidate.importance,
                threshold: policy.importance_threshold,
            });
        }

        let _guard = self.lock_for(candidate.category).lock().await;

        let now = Utc::now();
        let expires_at = now.checked_add_signed(policy.retention()).ok_or(
            RetentionError::ExpiryOutOfRange {
                category: candidate.category,
                retention_days: policy.retention_days,
            },
        )?;
        let record = MemoryRecord {
            id: RecordId::new(),
            category: candidate.category,
            agent_name: candidate
                .metadata
                .agent_name
                .clone()
                .unwrap_or_else(|| DEFAULT_AGENT_NAME.to_string()),
            mission_id: candidate.metadata.mission().map(str::to_string),
            metadata: candidate.metadata.to_value(),
            content: candidate.content,
            importance: candidate.importance,
            access_count: 0,
            created_at: now,
            updated_at: None,
            expires_at,
            active: true,
        };

        self.store.save(&record).await?;
        METRICS.inc_admitted();
        obs::emit_memory_admitted(
            record.id.as_str(),
            record.category.as_str(),
            record.importance.get(),
        );

        let evicted = self
            .enforce_cap_locked(record.category, &policy)
            .await
            .map_err(|e| RetentionError::CapNotEnforced {
                record_id: record.id.clone(),
                source: Box::new(e),
            })?;
        Ok(Admission::Accepted { record, evicted })
    }

    /// Retire the lowest-importance, oldest active records above the cap.
    pub async fn enforce_cap(&self, category: MemoryCategory) -> RetentionResult<Vec<RecordId>> {
        let policy = *self.policy(category);
        let _guard = self.lock_for(category).lock().await;
        self.enforce_cap_locked(category, &policy).await
    }

    async fn enforce_cap_locked(
        &self,
        category: MemoryCategory,
        policy: &CategoryPolicy,
    ) -> RetentionResult<Vec<RecordId>> {
        let active = self.store.count(category, true).await?;
        if active <= policy.max_active_entries {
            return Ok(Vec::new());
        }

        let excess = active - policy.max_active_entries;
        let victims: Vec<RecordId> = self
            .store
            .query(
                &RecordFilter::active_in(category)
                    .ordered(RecordOrder::EvictionPriority)
                    .with_limit(excess),
            )
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let retired = self.store.mark_inactive(&victims).await?;
        METRICS.add_evicted(retired as u64);
        obs::emit_memory_evicted(category.as_str(), retired, policy.max_active_entries);
        Ok(victims)
    }

    // -- purge / retrieval / statistics -------------------------------------

    /// Retire active records of a category that are old or expired and score
    /// below `min_importance`.
    ///
    /// A record qualifies by age when it was created before `older_than` or
    /// its `expires_at` has passed.
    pub async fn purge(&self, request: &PurgeRequest) -> RetentionResult<PurgeResult> {
        let _guard = self.lock_for(request.category).lock().await;

        let mut filter = RecordFilter::active_in(request.category)
            .with_importance_below(request.min_importance)
            .expired_before(Utc::now());
        if let Some(ts) = request.older_than {
            filter = filter.created_before(ts);
        }

        let record_ids: Vec<RecordId> = self
            .store
            .query(&filter)
            .await?
            .into_iter()
            .map(|r| r.id)
            .collect();

        let purged = if request.dry_run {
            0
        } else {
            self.store.mark_inactive(&record_ids).await?
        };

        METRICS.add_purged(purged as u64);
        obs::emit_memory_purged(request.category.as_str(), record_ids.len(), request.dry_run);
        Ok(PurgeResult {
            category: request.category,
            dry_run: request.dry_run,
            matched: record_ids.len(),
            purged,
            record_ids,
        })
    }

    /// Active records matching `query`, most important then newest first.
    ///
    /// Each returned record's `access_count` is incremented; the returned
    /// values already include the increment.
    pub async fn retrieve(&self, query: &RetrievalQuery) -> RetentionResult<Vec<MemoryRecord>> {
        let mut filter = RecordFilter::active_in(query.category)
            .with_min_importance(query.min_importance)
            .ordered(RecordOrder::Relevance)
            .with_limit(query.limit.max(1));
        if let Some(ref mission) = query.mission_id {
            filter = filter.with_mission(mission);
        }
        if let Some(ref agent) = query.agent_name {
            filter = filter.with_agent(agent);
        }

        let mut records = self.store.query(&filter).await?;
        let ids: Vec<RecordId> = records.iter().map(|r| r.id.clone()).collect();
        self.store.record_access(&ids).await?;
        for record in &mut records {
            record.access_count += 1;
        }

        info!(
            category = %query.category,
            returned = records.len(),
            "memory records retrieved"
        );
        Ok(records)
    }

    /// Active count and mean importance per category.
    pub async fn statistics(&self) -> RetentionResult<MemoryStatistics> {
        let mut categories = Vec::with_capacity(MemoryCategory::ALL.len());
        for (category, policy) in self.policies.iter() {
            let active = self.store.query(&RecordFilter::active_in(category)).await?;
            let average_importance = if active.is_empty() {
                0.0
            } else {
                let sum: u64 = active.iter().map(|r| u64::from(r.importance.get())).sum();
                round2(sum as f64 / active.len() as f64)
            };
            categories.push(CategoryStatistics {
                category,
                active_count: active.len(),
                average_importance,
                max_active_entries: policy.max_active_entries,
                retention_days: policy.retention_days,
            });
        }
        let total_active = categories.iter().map(|c| c.active_count).sum();
        Ok(MemoryStatistics {
            categories,
            total_active,
        })
    }

    // -- inbound entry point ------------------------------------------------

    /// Validate, classify, score and admit `content`.
    ///
    /// Never fails: validation problems and threshold misses come back as
    /// `rejected`, storage failures as `error`.
    pub async fn analyze_and_store(&self, content: &str, metadata: RecordMetadata) -> StoreOutcome {
        if content.trim().is_empty() {
            return StoreOutcome::rejected(ValidationFailure::EmptyContent.to_string());
        }

        let category = self.classify(content, &metadata).await;
        let importance = self.score(content, category, &metadata);
        let candidate = Candidate {
            content: content.to_string(),
            category,
            importance,
            metadata,
        };

        match self.admit(candidate).await {
            Ok(Admission::Accepted { record, evicted }) => StoreOutcome {
                status: StoreStatus::Accepted,
                category: Some(record.category),
                importance: Some(record.importance.get()),
                record_id: Some(record.id),
                expires_at: Some(record.expires_at),
                evicted,
                reason: None,
            },
            Ok(Admission::Rejected {
                category,
                importance,
                threshold,
            }) => StoreOutcome {
                category: Some(category),
                importance: Some(importance.get()),
                ..StoreOutcome::rejected(format!(
                    "importance score {importance} below threshold {threshold}"
                ))
            },
            Err(e) => {
                obs::emit_store_failed(&e);
                StoreOutcome {
                    record_id: e.stored_record().cloned(),
                    ..StoreOutcome::error(Some(category), Some(importance.get()), e.to_string())
                }
            }
        }
    }

    /// Run the command in a message routed to the memory manager.
    ///
    /// Store keeps the whole message (agent `user` unless the metadata names
    /// one); retrieve lists up to ten records of the category named in the
    /// message. Never fails: storage errors come back as `Failed`.
    pub async fn handle(&self, message: &str, metadata: RecordMetadata) -> MemoryResponse {
        let command = MemoryCommand::parse(message);
        debug!(?command, "memory command");
        match command {
            MemoryCommand::Store => {
                let metadata = if metadata.agent_name.is_some() {
                    metadata
                } else {
                    metadata.with_agent(INTERACTIVE_AGENT_NAME)
                };
                MemoryResponse::Store(self.analyze_and_store(message, metadata).await)
            }
            MemoryCommand::Retrieve { category } => {
                let query = RetrievalQuery::new(category).with_limit(COMMAND_RETRIEVE_LIMIT);
                match self.retrieve(&query).await {
                    Ok(records) => MemoryResponse::Retrieve { category, records },
                    Err(e) => MemoryResponse::failed("retrieve", e),
                }
            }
            MemoryCommand::Statistics => match self.statistics().await {
                Ok(stats) => MemoryResponse::Statistics(stats),
                Err(e) => MemoryResponse::failed("statistics", e),
            },
            MemoryCommand::Help => MemoryResponse::Help {
                available_commands: AVAILABLE_COMMANDS,
            },
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
