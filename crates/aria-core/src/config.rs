//! ARIA configuration: routing table, retention policies and classifier.
//!
//! Resolution order (highest priority first):
//! 1. Config file passed by the caller (`--config`)
//! 2. Compiled defaults (`config/default.toml`)
//!
//! A file that omits `handlers` keeps the built-in routing table; omitted
//! policy tables keep the built-in policy of that category.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::memory::{ClassifierConfig, PolicyTable, MAX_RETENTION_DAYS};
use crate::routing::{HandlerRegistration, Router, RoutingResult, UNHANDLED};

/// Built-in configuration.
pub const DEFAULT_CONFIG: &str = include_str!("../config/default.toml");

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {message}")]
    FileNotFound { path: String, message: String },

    #[error("invalid TOML in {path}: {message}")]
    ParseError { path: String, message: String },

    #[error("invalid config value {field}: {message}")]
    ValidationFailed { field: String, message: String },
}

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AriaConfig {
    /// Handlers in registration order.
    pub handlers: Vec<HandlerRegistration>,
    pub policies: PolicyTable,
    /// Fallback classifier; `None` disables it.
    pub classifier: Option<ClassifierConfig>,
}

#[derive(Debug, Deserialize)]
struct ConfigFile {
    handlers: Option<Vec<HandlerRegistration>>,
    #[serde(default)]
    policies: PolicyTable,
    classifier: Option<ClassifierConfig>,
}

impl AriaConfig {
    /// The compiled-in configuration.
    pub fn builtin() -> Result<Self, ConfigError> {
        let file = parse("<builtin>", DEFAULT_CONFIG)?;
        let config = Self {
            handlers: file.handlers.unwrap_or_default(),
            policies: file.policies,
            classifier: file.classifier,
        };
        config.validate()?;
        Ok(config)
    }

    /// Load `path`, or the built-in configuration when `path` is `None`.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Self::builtin();
        };
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::FileNotFound {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_toml(&path.display().to_string(), &content)
    }

    /// Parse a configuration document layered over the built-in one.
    pub fn from_toml(origin: &str, toml_str: &str) -> Result<Self, ConfigError> {
        let file = parse(origin, toml_str)?;
        let handlers = match file.handlers {
            Some(handlers) => handlers,
            None => Self::builtin()?.handlers,
        };
        let config = Self {
            handlers,
            policies: file.policies,
            classifier: file.classifier,
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (category, policy) in self.policies.iter() {
            if policy.importance_threshold > 10 {
                return Err(invalid(
                    format!("policies.{category}.importance_threshold"),
                    "must be between 0 and 10",
                ));
            }
            if policy.max_active_entries == 0 {
                return Err(invalid(
                    format!("policies.{category}.max_active_entries"),
                    "must be at least 1",
                ));
            }
            if policy.retention_days == 0 || policy.retention_days > MAX_RETENTION_DAYS {
                return Err(invalid(
                    format!("policies.{category}.retention_days"),
                    "must be between 1 and 36500 days",
                ));
            }
        }

        for (i, handler) in self.handlers.iter().enumerate() {
            if handler.identifier.trim().is_empty() {
                return Err(invalid(format!("handlers[{i}].identifier"), "must not be empty"));
            }
            if handler.identifier == UNHANDLED {
                return Err(invalid(
                    format!("handlers[{i}].identifier"),
                    "is reserved for unmatched messages",
                ));
            }
        }

        if let Some(ref classifier) = self.classifier {
            if classifier.base_url.trim().is_empty() {
                return Err(invalid("classifier.base_url".into(), "must not be empty"));
            }
            if classifier.model.trim().is_empty() {
                return Err(invalid("classifier.model".into(), "must not be empty"));
            }
            if classifier.timeout_secs == 0 {
                return Err(invalid("classifier.timeout_secs".into(), "must be greater than 0"));
            }
        }
        Ok(())
    }

    /// Router with every configured handler registered in order.
    pub fn router(&self) -> RoutingResult<Router> {
        Router::from_registrations(&self.handlers)
    }
}

fn parse(origin: &str, toml_str: &str) -> Result<ConfigFile, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError {
        path: origin.to_string(),
        message: e.to_string(),
    })
}

fn invalid(field: String, message: &str) -> ConfigError {
    ConfigError::ValidationFailed {
        field,
        message: message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aria_state::MemoryCategory;

    #[test]
    fn test_builtin_config_is_valid() {
        let config = AriaConfig::builtin().unwrap();
        assert_eq!(config.handlers.len(), 19);
        assert_eq!(config.handlers[0].identifier, "UtilityAgent");
        assert_eq!(
            config.handlers.last().unwrap().identifier,
            "AdvancedMemoryManagerAgent"
        );
        assert_eq!(config.policies, PolicyTable::default());
        assert!(config.classifier.is_none());
    }

    #[test]
    fn test_file_without_handlers_keeps_builtin_routing() {
        let config = AriaConfig::from_toml(
            "<test>",
            r#"
            [policies.short_term]
            retention_days = 1
            max_active_entries = 5
            importance_threshold = 2
            "#,
        )
        .unwrap();
        assert_eq!(config.handlers.len(), 19);
        assert_eq!(config.policies.get(MemoryCategory::ShortTerm).max_active_entries, 5);
        assert_eq!(config.policies.long_term, PolicyTable::default().long_term);
    }

    #[test]
    fn test_classifier_defaults() {
        let config = AriaConfig::from_toml(
            "<test>",
            r#"
            handlers = []

            [classifier]
            base_url = "http://localhost:8080/v1"
            model = "small"
            "#,
        )
        .unwrap();
        assert!(config.handlers.is_empty());
        let classifier = config.classifier.unwrap();
        assert_eq!(classifier.api_key_env, "OPENAI_API_KEY");
        assert_eq!(classifier.timeout_secs, 15);
    }

    #[test]
    fn test_validation_failures() {
        let err = AriaConfig::from_toml(
            "<test>",
            r#"
            [policies.reflective]
            retention_days = 90
            max_active_entries = 0
            importance_threshold = 6
            "#,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::ValidationFailed { ref field, .. } if field == "policies.reflective.max_active_entries"
        ));

        let err = AriaConfig::from_toml(
            "<test>",
            r#"
            [[handlers]]
            identifier = "unhandled"
            keywords = ["x"]
            "#,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationFailed { .. }));
    }

    #[test]
    fn test_retention_window_is_bounded() {
        let policy = |days: u64| {
            format!(
                "[policies.long_term]\nretention_days = {days}\nmax_active_entries = 10\nimportance_threshold = 5\n"
            )
        };

        assert!(AriaConfig::from_toml("<test>", &policy(36_500)).is_ok());
        for days in [0, 36_501, 4_000_000_000] {
            let err = AriaConfig::from_toml("<test>", &policy(days)).unwrap_err();
            assert!(matches!(
                err,
                ConfigError::ValidationFailed { ref field, .. } if field == "policies.long_term.retention_days"
            ));
        }
    }

    #[test]
    fn test_parse_error_names_origin() {
        let err = AriaConfig::from_toml("custom.toml", "handlers = 3").unwrap_err();
        assert!(err.to_string().contains("custom.toml"));
    }

    #[test]
    fn test_missing_file() {
        let err = AriaConfig::load(Some(Path::new("/definitely/not/here.toml"))).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotFound { .. }));
    }
}
