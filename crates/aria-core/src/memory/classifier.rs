//! External category classifier.
//!
//! The engine consults a [`Classifier`] only for content that no category
//! keyword matches. [`ChatCompletionsClassifier`] talks to any
//! OpenAI-compatible `/chat/completions` endpoint.

use std::time::Duration;

use aria_state::MemoryCategory;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

const SYSTEM_PROMPT: &str = "You are a memory classification expert. Classify the following \
text into one of these memory types:\n\
- short_term: Temporary, immediate information\n\
- long_term: Important, permanent knowledge\n\
- mission_specific: Task or project-related information\n\
- reflective: Insights, experiences, lessons learned\n\n\
Respond with only the memory type name.";

/// Errors from a classifier. Always recovered by the engine.
#[derive(Debug, thiserror::Error)]
pub enum ClassificationError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("classifier returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("classifier returned an empty answer")]
    EmptyAnswer,

    #[error("classifier answered with unknown category {0:?}")]
    UnknownLabel(String),
}

/// Maps content to a category when keywords are inconclusive.
#[async_trait]
pub trait Classifier: Send + Sync {
    async fn classify(&self, content: &str) -> Result<MemoryCategory, ClassificationError>;
}

fn default_api_key_env() -> String {
    "OPENAI_API_KEY".to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

/// Connection settings for [`ChatCompletionsClassifier`].
///
/// The API key itself never appears in configuration; only the name of the
/// environment variable holding it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassifierConfig {
    /// Base URL up to and excluding `/chat/completions`.
    pub base_url: String,
    pub model: String,
    #[serde(default = "default_api_key_env")]
    pub api_key_env: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

/// Classifier backed by an OpenAI-compatible chat completions API.
pub struct ChatCompletionsClassifier {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct ChatMessage {
    content: Option<String>,
}

impl ChatCompletionsClassifier {
    /// Build a client for `config` with an explicit key (`None` sends no
    /// `Authorization` header).
    pub fn new(config: &ClassifierConfig, api_key: Option<String>) -> Result<Self, ClassificationError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
            api_key,
        })
    }

    /// Build a client reading the key from `config.api_key_env`.
    pub fn from_config(config: &ClassifierConfig) -> Result<Self, ClassificationError> {
        let api_key = std::env::var(&config.api_key_env).map_err(|_| {
            ClassificationError::Unavailable(format!("{} not set", config.api_key_env))
        })?;
        Self::new(config, Some(api_key))
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

/// Parse a model answer into a category label.
///
/// Surrounding whitespace, quotes and a trailing period are ignored.
pub fn parse_label(answer: &str) -> Result<MemoryCategory, ClassificationError> {
    let label = answer
        .trim()
        .trim_end_matches('.')
        .trim_matches(|c| c == '"' || c == '\'' || c == '`')
        .trim_end_matches('.')
        .trim();
    if label.is_empty() {
        return Err(ClassificationError::EmptyAnswer);
    }
    label
        .parse::<MemoryCategory>()
        .map_err(|_| ClassificationError::UnknownLabel(label.to_string()))
}

#[async_trait]
impl Classifier for ChatCompletionsClassifier {
    async fn classify(&self, content: &str) -> Result<MemoryCategory, ClassificationError> {
        let request = serde_json::json!({
            "model": self.model,
            "messages": [
                { "role": "system", "content": SYSTEM_PROMPT },
                { "role": "user", "content": content }
            ],
            "max_tokens": 50,
            "temperature": 0.1
        });

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Content-Type", "application/json")
            .json(&request);
        if let Some(ref key) = self.api_key {
            builder = builder.bearer_auth(key);
        }

        let response = builder.send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ClassificationError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: ChatResponse = response.json().await?;
        let answer = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ClassificationError::EmptyAnswer)?;

        debug!(answer = %answer, "classifier answered");
        parse_label(&answer)
    }
}
