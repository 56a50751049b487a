//! End-to-end tests for admission, cap enforcement, purge and retrieval.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{Duration, Utc};

use aria_core::memory::{
    Admission, Candidate, CategoryPolicy, PolicyTable, PurgeRequest, RecordMetadata,
    RetentionEngine, RetrievalQuery, StoreStatus,
};
use aria_state::{
    Importance, InMemoryStore, MemoryCategory, MemoryRecord, MemoryStore, RecordFilter, RecordId,
    StorageError, StorageResult,
};

fn engine(policies: PolicyTable) -> RetentionEngine {
    RetentionEngine::new(Arc::new(InMemoryStore::new()), policies)
}

fn capped(category: MemoryCategory, max_active: usize) -> PolicyTable {
    PolicyTable::default().with(category, CategoryPolicy::new(7, max_active, 1))
}

fn candidate(category: MemoryCategory, importance: i64) -> Candidate {
    Candidate {
        content: format!("entry scored {importance}"),
        category,
        importance: Importance::clamped(importance),
        metadata: RecordMetadata::new(),
    }
}

async fn admit_ok(engine: &RetentionEngine, c: Candidate) -> MemoryRecord {
    match engine.admit(c).await.unwrap() {
        Admission::Accepted { record, .. } => record,
        other => panic!("expected acceptance, got {other:?}"),
    }
}

async fn active_scores(engine: &RetentionEngine, category: MemoryCategory) -> Vec<u8> {
    let mut scores: Vec<u8> = engine
        .store()
        .query(&RecordFilter::active_in(category))
        .await
        .unwrap()
        .into_iter()
        .map(|r| r.importance.get())
        .collect();
    scores.sort();
    scores
}

fn aged_record(category: MemoryCategory, importance: i64, age_days: i64, retention_days: i64) -> MemoryRecord {
    let created_at = Utc::now() - Duration::days(age_days);
    MemoryRecord {
        id: RecordId::new(),
        category,
        agent_name: "seed".into(),
        mission_id: None,
        content: format!("seeded {importance}"),
        metadata: serde_json::json!({}),
        importance: Importance::clamped(importance),
        access_count: 0,
        created_at,
        updated_at: None,
        expires_at: created_at + Duration::days(retention_days),
        active: true,
    }
}

// ---------------------------------------------------------------------------
// Cap enforcement
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cap_keeps_highest_scores() {
    let engine = engine(capped(MemoryCategory::ShortTerm, 2));
    for score in [8, 3, 9] {
        admit_ok(&engine, candidate(MemoryCategory::ShortTerm, score)).await;
    }
    assert_eq!(active_scores(&engine, MemoryCategory::ShortTerm).await, vec![8, 9]);
    assert_eq!(
        engine
            .store()
            .count(MemoryCategory::ShortTerm, false)
            .await
            .unwrap(),
        3,
        "evicted records are retired, not deleted"
    );
}

#[tokio::test]
async fn test_equal_importance_evicts_oldest() {
    let engine = engine(capped(MemoryCategory::LongTerm, 2));
    let first = admit_ok(&engine, candidate(MemoryCategory::LongTerm, 5)).await;
    let second = admit_ok(&engine, candidate(MemoryCategory::LongTerm, 5)).await;

    let Admission::Accepted { record: third, evicted } = engine
        .admit(candidate(MemoryCategory::LongTerm, 5))
        .await
        .unwrap()
    else {
        panic!("expected acceptance");
    };

    assert_eq!(evicted, vec![first.id.clone()]);
    assert!(!engine.store().get(&first.id).await.unwrap().active);
    assert!(engine.store().get(&second.id).await.unwrap().active);
    assert!(engine.store().get(&third.id).await.unwrap().active);
}

#[tokio::test]
async fn test_new_low_score_record_can_evict_itself() {
    let engine = engine(capped(MemoryCategory::Reflective, 1));
    admit_ok(&engine, candidate(MemoryCategory::Reflective, 9)).await;
    let Admission::Accepted { record, evicted } = engine
        .admit(candidate(MemoryCategory::Reflective, 2))
        .await
        .unwrap()
    else {
        panic!("expected acceptance");
    };
    assert_eq!(evicted, vec![record.id]);
    assert_eq!(active_scores(&engine, MemoryCategory::Reflective).await, vec![9]);
}

#[tokio::test]
async fn test_enforce_cap_after_direct_inserts() {
    let engine = engine(capped(MemoryCategory::ShortTerm, 2));
    for (score, age) in [(4, 3), (4, 2), (7, 1), (6, 0)] {
        engine
            .store()
            .save(&aged_record(MemoryCategory::ShortTerm, score, age, 7))
            .await
            .unwrap();
    }
    let evicted = engine.enforce_cap(MemoryCategory::ShortTerm).await.unwrap();
    assert_eq!(evicted.len(), 2);
    assert_eq!(active_scores(&engine, MemoryCategory::ShortTerm).await, vec![6, 7]);
    assert!(engine.enforce_cap(MemoryCategory::ShortTerm).await.unwrap().is_empty());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cap_holds_under_concurrent_admission() {
    let engine = Arc::new(engine(capped(MemoryCategory::MissionSpecific, 5)));
    let mut handles = Vec::new();
    for i in 0..20 {
        let engine = Arc::clone(&engine);
        handles.push(tokio::spawn(async move {
            engine
                .admit(candidate(MemoryCategory::MissionSpecific, 1 + (i % 10)))
                .await
                .unwrap()
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    let store = engine.store();
    assert_eq!(store.count(MemoryCategory::MissionSpecific, true).await.unwrap(), 5);
    assert_eq!(store.count(MemoryCategory::MissionSpecific, false).await.unwrap(), 20);
}

// ---------------------------------------------------------------------------
// analyze_and_store
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_below_threshold_is_rejected_and_not_persisted() {
    let policies = PolicyTable::default()
        .with(MemoryCategory::ShortTerm, CategoryPolicy::new(7, 1000, 5));
    let engine = engine(policies);

    let outcome = engine
        .analyze_and_store("hello there", RecordMetadata::new())
        .await;
    assert_eq!(outcome.status, StoreStatus::Rejected);
    assert_eq!(outcome.category, Some(MemoryCategory::ShortTerm));
    assert_eq!(outcome.importance, Some(3));
    assert_eq!(
        outcome.reason.as_deref(),
        Some("importance score 3 below threshold 5")
    );
    assert_eq!(
        engine
            .store()
            .count(MemoryCategory::ShortTerm, false)
            .await
            .unwrap(),
        0
    );
}

#[tokio::test]
async fn test_persian_importance_word_lands_in_long_term() {
    let engine = engine(PolicyTable::default());
    let outcome = engine
        .analyze_and_store("باید فردا جلسه مهم داشته باشم", RecordMetadata::new())
        .await;
    assert_eq!(outcome.status, StoreStatus::Accepted);
    assert_eq!(outcome.category, Some(MemoryCategory::LongTerm));
    // long_term base 6 plus one importance keyword
    assert_eq!(outcome.importance, Some(7));

    let id = outcome.record_id.unwrap();
    let stored = engine.store().get(&id).await.unwrap();
    assert_eq!(stored.expires_at, outcome.expires_at.unwrap());
    assert_eq!(stored.expires_at - stored.created_at, Duration::days(365));
}

#[tokio::test]
async fn test_mission_id_forces_mission_category() {
    let engine = engine(PolicyTable::default());
    let meta = RecordMetadata::new()
        .with_mission("m1")
        .with_agent("planner")
        .with_extra("channel", serde_json::json!("voice"));
    let outcome = engine
        .analyze_and_store("باید فردا جلسه مهم داشته باشم", meta)
        .await;
    assert_eq!(outcome.status, StoreStatus::Accepted);
    assert_eq!(outcome.category, Some(MemoryCategory::MissionSpecific));

    let stored = engine.store().get(&outcome.record_id.unwrap()).await.unwrap();
    assert_eq!(stored.mission_id.as_deref(), Some("m1"));
    assert_eq!(stored.agent_name, "planner");
    assert_eq!(stored.metadata["channel"], "voice");
}

struct FailingStore;

#[async_trait]
impl MemoryStore for FailingStore {
    async fn save(&self, _record: &MemoryRecord) -> StorageResult<RecordId> {
        Err(StorageError::Backend("disk full".into()))
    }
    async fn get(&self, id: &RecordId) -> StorageResult<MemoryRecord> {
        Err(StorageError::RecordNotFound { id: id.0.clone() })
    }
    async fn query(&self, _filter: &RecordFilter) -> StorageResult<Vec<MemoryRecord>> {
        Ok(Vec::new())
    }
    async fn mark_inactive(&self, _ids: &[RecordId]) -> StorageResult<usize> {
        Ok(0)
    }
    async fn count(&self, _category: MemoryCategory, _active_only: bool) -> StorageResult<usize> {
        Ok(0)
    }
    async fn record_access(&self, _ids: &[RecordId]) -> StorageResult<()> {
        Ok(())
    }
}

#[tokio::test]
async fn test_storage_failure_becomes_error_outcome() {
    let engine = RetentionEngine::new(Arc::new(FailingStore), PolicyTable::default());
    let outcome = engine
        .analyze_and_store("remember this important lesson", RecordMetadata::new())
        .await;
    assert_eq!(outcome.status, StoreStatus::Error);
    assert!(outcome.category.is_some());
    assert!(outcome.reason.unwrap().contains("disk full"));
    assert!(outcome.record_id.is_none());
}

/// Saves normally but cannot count, so cap enforcement fails after the save.
struct CountFailingStore(InMemoryStore);

#[async_trait]
impl MemoryStore for CountFailingStore {
    async fn save(&self, record: &MemoryRecord) -> StorageResult<RecordId> {
        self.0.save(record).await
    }
    async fn get(&self, id: &RecordId) -> StorageResult<MemoryRecord> {
        self.0.get(id).await
    }
    async fn query(&self, filter: &RecordFilter) -> StorageResult<Vec<MemoryRecord>> {
        self.0.query(filter).await
    }
    async fn mark_inactive(&self, ids: &[RecordId]) -> StorageResult<usize> {
        self.0.mark_inactive(ids).await
    }
    async fn count(&self, _category: MemoryCategory, _active_only: bool) -> StorageResult<usize> {
        Err(StorageError::Backend("count unavailable".into()))
    }
    async fn record_access(&self, ids: &[RecordId]) -> StorageResult<()> {
        self.0.record_access(ids).await
    }
}

#[tokio::test]
async fn test_cap_failure_after_save_reports_stored_record() {
    let store = Arc::new(CountFailingStore(InMemoryStore::new()));
    let engine = RetentionEngine::new(store.clone(), PolicyTable::default());

    let err = engine
        .admit(candidate(MemoryCategory::ShortTerm, 5))
        .await
        .unwrap_err();
    let stored = err.stored_record().cloned().unwrap();
    assert!(store.0.get(&stored).await.unwrap().active);

    let outcome = engine
        .analyze_and_store("urgent note", RecordMetadata::new())
        .await;
    assert_eq!(outcome.status, StoreStatus::Error);
    assert!(outcome.reason.unwrap().contains("count unavailable"));
    let record_id = outcome.record_id.unwrap();
    assert_eq!(store.0.get(&record_id).await.unwrap().content, "urgent note");
}

// ---------------------------------------------------------------------------
// Purge
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_purge_dry_run_matches_real_purge() {
    let engine = engine(PolicyTable::default());
    let store = engine.store();
    let expired_low = aged_record(MemoryCategory::ShortTerm, 2, 40, 7);
    let fresh_low = aged_record(MemoryCategory::ShortTerm, 2, 0, 7);
    let expired_high = aged_record(MemoryCategory::ShortTerm, 9, 40, 7);
    for r in [&expired_low, &fresh_low, &expired_high] {
        store.save(r).await.unwrap();
    }

    let request = PurgeRequest::new(MemoryCategory::ShortTerm, 5);
    let preview = engine.purge(&request.clone().dry_run()).await.unwrap();
    assert!(preview.dry_run);
    assert_eq!(preview.matched, 1);
    assert_eq!(preview.purged, 0);
    assert_eq!(preview.record_ids, vec![expired_low.id.clone()]);
    assert!(store.get(&expired_low.id).await.unwrap().active);

    let result = engine.purge(&request).await.unwrap();
    assert_eq!(result.matched, preview.matched);
    assert_eq!(result.purged, 1);
    assert!(!store.get(&expired_low.id).await.unwrap().active);
    assert!(store.get(&fresh_low.id).await.unwrap().active);
    assert!(store.get(&expired_high.id).await.unwrap().active);

    // Already retired records are not matched again.
    assert_eq!(engine.purge(&request).await.unwrap().matched, 0);
}

#[tokio::test]
async fn test_purge_older_than_matches_unexpired_records() {
    let engine = engine(PolicyTable::default());
    let store = engine.store();
    let two_days_old = aged_record(MemoryCategory::LongTerm, 3, 2, 365);
    let new = aged_record(MemoryCategory::LongTerm, 3, 0, 365);
    store.save(&two_days_old).await.unwrap();
    store.save(&new).await.unwrap();

    let without_age = engine
        .purge(&PurgeRequest::new(MemoryCategory::LongTerm, 10))
        .await
        .unwrap();
    assert_eq!(without_age.matched, 0);

    let result = engine
        .purge(
            &PurgeRequest::new(MemoryCategory::LongTerm, 10)
                .older_than(Utc::now() - Duration::days(1)),
        )
        .await
        .unwrap();
    assert_eq!(result.record_ids, vec![two_days_old.id.clone()]);
    assert!(store.get(&new.id).await.unwrap().active);
}

// ---------------------------------------------------------------------------
// Retrieval & statistics
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_retrieve_orders_by_importance_and_counts_access() {
    let engine = engine(PolicyTable::default());
    let store = engine.store();
    let low = aged_record(MemoryCategory::LongTerm, 5, 3, 365);
    let high_old = aged_record(MemoryCategory::LongTerm, 8, 2, 365);
    let high_new = aged_record(MemoryCategory::LongTerm, 8, 1, 365);
    for r in [&low, &high_old, &high_new] {
        store.save(r).await.unwrap();
    }

    let query = RetrievalQuery::new(MemoryCategory::LongTerm).with_limit(2);
    let records = engine.retrieve(&query).await.unwrap();
    let ids: Vec<RecordId> = records.iter().map(|r| r.id.clone()).collect();
    assert_eq!(ids, vec![high_new.id.clone(), high_old.id.clone()]);
    assert!(records.iter().all(|r| r.access_count == 1));

    engine.retrieve(&query).await.unwrap();
    assert_eq!(store.get(&high_new.id).await.unwrap().access_count, 2);
    assert_eq!(store.get(&low.id).await.unwrap().access_count, 0);

    let filtered = engine
        .retrieve(&RetrievalQuery::new(MemoryCategory::LongTerm).with_min_importance(Importance::clamped(9)))
        .await
        .unwrap();
    assert!(filtered.is_empty());
}

#[tokio::test]
async fn test_retrieve_zero_limit_returns_one() {
    let engine = engine(PolicyTable::default());
    for age in [1, 2] {
        engine
            .store()
            .save(&aged_record(MemoryCategory::ShortTerm, 4, age, 7))
            .await
            .unwrap();
    }
    let records = engine
        .retrieve(&RetrievalQuery::new(MemoryCategory::ShortTerm).with_limit(0))
        .await
        .unwrap();
    assert_eq!(records.len(), 1);
}

#[tokio::test]
async fn test_statistics_per_category() {
    let engine = engine(PolicyTable::default());
    for score in [7, 6, 7] {
        admit_ok(&engine, candidate(MemoryCategory::Reflective, score)).await;
    }

    let stats = engine.statistics().await.unwrap();
    assert_eq!(stats.total_active, 3);
    assert_eq!(stats.categories.len(), 4);

    let reflective = stats
        .categories
        .iter()
        .find(|c| c.category == MemoryCategory::Reflective)
        .unwrap();
    assert_eq!(reflective.active_count, 3);
    assert_eq!(reflective.average_importance, 6.67);
    assert_eq!(reflective.max_active_entries, 2000);
    assert_eq!(reflective.retention_days, 90);

    let short = &stats.categories[0];
    assert_eq!(short.category, MemoryCategory::ShortTerm);
    assert_eq!(short.average_importance, 0.0);
}
