//! Caller-supplied metadata attached to a memory entry.

use serde::{Deserialize, Serialize};

/// Source value that earns the explicit-request bonus.
pub const USER_EXPLICIT_SOURCE: &str = "user_explicit";

/// Metadata for a new memory entry.
///
/// The known keys drive classification and scoring; every other key is kept
/// in `extra` and persisted verbatim.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mission_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_name: Option<String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RecordMetadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_mission(mut self, mission_id: &str) -> Self {
        self.mission_id = Some(mission_id.to_string());
        self
    }

    pub fn with_priority(mut self, priority: &str) -> Self {
        self.priority = Some(priority.to_string());
        self
    }

    pub fn with_source(mut self, source: &str) -> Self {
        self.source = Some(source.to_string());
        self
    }

    pub fn with_agent(mut self, agent_name: &str) -> Self {
        self.agent_name = Some(agent_name.to_string());
        self
    }

    pub fn with_extra(mut self, key: &str, value: serde_json::Value) -> Self {
        self.extra.insert(key.to_string(), value);
        self
    }

    /// Mission id, if present and non-empty.
    pub fn mission(&self) -> Option<&str> {
        self.mission_id.as_deref().filter(|m| !m.is_empty())
    }

    pub fn priority_level(&self) -> Option<Priority> {
        self.priority.as_deref().and_then(Priority::parse)
    }

    pub fn is_user_explicit(&self) -> bool {
        self.source.as_deref() == Some(USER_EXPLICIT_SOURCE)
    }

    /// JSON object form stored on the record.
    pub fn to_value(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or_else(|_| serde_json::Value::Object(self.extra.clone()))
    }
}

/// Caller-declared priority. Only exact lower-case labels are recognised.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn parse(label: &str) -> Option<Self> {
        match label {
            "high" => Some(Priority::High),
            "medium" => Some(Priority::Medium),
            "low" => Some(Priority::Low),
            _ => None,
        }
    }

    /// Score bonus for this priority.
    pub fn bonus(self) -> i64 {
        match self {
            Priority::High => 2,
            Priority::Medium => 1,
            Priority::Low => 0,
        }
    }
}
