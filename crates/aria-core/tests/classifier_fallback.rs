//! External classifier: consulted only when no keyword matches, and any
//! failure falls back to `short_term`.

use std::sync::Arc;

use async_trait::async_trait;
use mockito::Matcher;

use aria_core::memory::{
    ChatCompletionsClassifier, ClassificationError, Classifier, ClassifierConfig, PolicyTable,
    RecordMetadata, RetentionEngine, StoreStatus,
};
use aria_state::{InMemoryStore, MemoryCategory};

fn config(base_url: String) -> ClassifierConfig {
    ClassifierConfig {
        base_url: format!("{base_url}/v1"),
        model: "test-model".into(),
        api_key_env: "ARIA_TEST_UNUSED_KEY".into(),
        timeout_secs: 5,
    }
}

fn answer(label: &str) -> String {
    serde_json::json!({
        "choices": [{ "message": { "role": "assistant", "content": label } }]
    })
    .to_string()
}

fn engine_with(classifier: Arc<dyn Classifier>) -> RetentionEngine {
    RetentionEngine::new(Arc::new(InMemoryStore::new()), PolicyTable::default())
        .with_classifier(classifier)
}

#[tokio::test]
async fn test_classifier_answer_is_used_when_keywords_miss() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .match_header("authorization", "Bearer sk-test")
        .match_body(Matcher::PartialJson(serde_json::json!({ "model": "test-model" })))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(answer("reflective"))
        .expect(1)
        .create_async()
        .await;

    let classifier =
        ChatCompletionsClassifier::new(&config(server.url()), Some("sk-test".into())).unwrap();
    let engine = engine_with(Arc::new(classifier));

    let category = engine.classify("hello there", &RecordMetadata::new()).await;
    assert_eq!(category, MemoryCategory::Reflective);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_classifier_not_called_when_keywords_match() {
    let mut server = mockito::Server::new_async().await;
    let mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_body(answer("reflective"))
        .expect(0)
        .create_async()
        .await;

    let classifier = ChatCompletionsClassifier::new(&config(server.url()), None).unwrap();
    let engine = engine_with(Arc::new(classifier));

    assert_eq!(
        engine.classify("urgent task for today", &RecordMetadata::new()).await,
        MemoryCategory::ShortTerm
    );
    assert_eq!(
        engine
            .classify("hello", &RecordMetadata::new().with_mission("m9"))
            .await,
        MemoryCategory::MissionSpecific
    );
    mock.assert_async().await;
}

#[tokio::test]
async fn test_http_error_falls_back_to_short_term() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(500)
        .with_body("upstream exploded")
        .create_async()
        .await;

    let classifier = ChatCompletionsClassifier::new(&config(server.url()), None).unwrap();
    let err = classifier.classify("hello there").await.unwrap_err();
    assert!(matches!(err, ClassificationError::Status { status: 500, .. }));

    let engine = engine_with(Arc::new(classifier));
    let outcome = engine
        .analyze_and_store("hello there", RecordMetadata::new())
        .await;
    assert_eq!(outcome.category, Some(MemoryCategory::ShortTerm));
    assert_eq!(outcome.status, StoreStatus::Accepted);
}

#[tokio::test]
async fn test_unknown_label_falls_back_to_short_term() {
    let mut server = mockito::Server::new_async().await;
    let _mock = server
        .mock("POST", "/v1/chat/completions")
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(answer("episodic"))
        .create_async()
        .await;

    let classifier = ChatCompletionsClassifier::new(&config(server.url()), None).unwrap();
    let engine = engine_with(Arc::new(classifier));
    assert_eq!(
        engine.classify("hello there", &RecordMetadata::new()).await,
        MemoryCategory::ShortTerm
    );
}

#[tokio::test]
async fn test_missing_api_key_env_is_unavailable() {
    let mut cfg = config("http://127.0.0.1:1".into());
    cfg.api_key_env = "ARIA_TEST_KEY_THAT_IS_NEVER_SET".into();
    let err = ChatCompletionsClassifier::from_config(&cfg).err().unwrap();
    assert!(matches!(err, ClassificationError::Unavailable(_)));
}

struct Broken;

#[async_trait]
impl Classifier for Broken {
    async fn classify(&self, _content: &str) -> Result<MemoryCategory, ClassificationError> {
        Err(ClassificationError::Unavailable("offline".into()))
    }
}

#[tokio::test]
async fn test_classify_is_idempotent_with_failing_classifier() {
    let engine = engine_with(Arc::new(Broken));
    let meta = RecordMetadata::new();
    let first = engine.classify("nothing matches here", &meta).await;
    let second = engine.classify("nothing matches here", &meta).await;
    assert_eq!(first, MemoryCategory::ShortTerm);
    assert_eq!(first, second);
}
