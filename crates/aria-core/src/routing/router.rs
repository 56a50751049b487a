//! Keyword-to-handler dispatch table.
//!
//! Keywords are stored lower-cased in first-registration order. Dispatch scans
//! that order and returns the handler of the first keyword contained in the
//! lower-cased message. Re-registering a keyword for another handler moves the
//! keyword to the new handler but leaves its scan position unchanged.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::metrics::METRICS;
use crate::obs;
use crate::routing::error::{RoutingError, RoutingResult};

/// Identifier returned when no keyword matches.
pub const UNHANDLED: &str = "unhandled";

/// A handler and the keywords that route to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandlerRegistration {
    pub identifier: String,
    #[serde(default)]
    pub keywords: Vec<String>,
}

impl HandlerRegistration {
    pub fn new<I, S>(identifier: &str, keywords: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            identifier: identifier.to_string(),
            keywords: keywords.into_iter().map(Into::into).collect(),
        }
    }
}

/// Where a message was routed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "handler", rename_all = "snake_case")]
pub enum RouteTarget {
    Handler(String),
    Unhandled,
}

impl RouteTarget {
    /// Handler identifier, or [`UNHANDLED`].
    pub fn as_str(&self) -> &str {
        match self {
            RouteTarget::Handler(id) => id,
            RouteTarget::Unhandled => UNHANDLED,
        }
    }

    pub fn is_handled(&self) -> bool {
        matches!(self, RouteTarget::Handler(_))
    }
}

impl std::fmt::Display for RouteTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Full routing answer for a message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteDecision {
    pub target: RouteTarget,
    /// Keyword that selected the handler.
    pub matched_keyword: Option<String>,
    /// `false` when the handler is registered but deactivated, or nothing matched.
    pub available: bool,
}

/// A keyword that was taken over by a later registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeywordCollision {
    pub keyword: String,
    pub previous: String,
    pub current: String,
}

/// Outcome of a single [`Router::register`] call.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RegistrationReport {
    pub identifier: String,
    /// Keywords now pointing at this handler.
    pub keywords_added: usize,
    /// Empty or whitespace-only keywords that were skipped.
    pub ignored_blank: usize,
    pub collisions: Vec<KeywordCollision>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoutingRule {
    pub keyword: String,
    pub handler: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HandlerStatus {
    pub identifier: String,
    pub active: bool,
    pub keyword_count: usize,
}

/// Snapshot of the routing table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouterStatus {
    /// Rules in scan order.
    pub routing_rules: Vec<RoutingRule>,
    pub total_handlers: usize,
    pub active_handlers: usize,
    pub handlers: Vec<HandlerStatus>,
}

#[derive(Debug, Clone)]
struct HandlerEntry {
    identifier: String,
    active: bool,
}

/// Keyword router.
///
/// Single-owner and mutated only through `&mut self`; share it behind an
/// `Arc` once registration is done.
#[derive(Debug, Clone, Default)]
pub struct Router {
    /// (keyword, handler) in scan order.
    rules: Vec<(String, String)>,
    /// keyword -> index into `rules`.
    positions: HashMap<String, usize>,
    /// Registered handlers in registration order.
    handlers: Vec<HandlerEntry>,
}

impl Router {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register every handler in order.
    pub fn from_registrations<'a, I>(registrations: I) -> RoutingResult<Self>
    where
        I: IntoIterator<Item = &'a HandlerRegistration>,
    {
        let mut router = Self::new();
        for registration in registrations {
            router.register(&registration.identifier, registration.keywords.as_slice())?;
        }
        Ok(router)
    }

    /// Register `identifier` with `keywords` and mark it active.
    ///
    /// A keyword already owned by another handler is reassigned to
    /// `identifier` and reported as a collision.
    pub fn register<S: AsRef<str>>(
        &mut self,
        identifier: &str,
        keywords: &[S],
    ) -> RoutingResult<RegistrationReport> {
        RoutingError::check_identifier(identifier)?;

        match self.handlers.iter_mut().find(|h| h.identifier == identifier) {
            Some(entry) => entry.active = true,
            None => self.handlers.push(HandlerEntry {
                identifier: identifier.to_string(),
                active: true,
            }),
        }

        let mut report = RegistrationReport {
            identifier: identifier.to_string(),
            ..RegistrationReport::default()
        };

        for keyword in keywords {
            let keyword = keyword.as_ref();
            if keyword.trim().is_empty() {
                report.ignored_blank += 1;
                continue;
            }
            let keyword = keyword.to_lowercase();

            match self.positions.get(&keyword) {
                Some(&pos) => {
                    let owner = &mut self.rules[pos].1;
                    if owner.as_str() != identifier {
                        warn!(
                            keyword = %keyword,
                            previous = %owner,
                            current = %identifier,
                            "routing keyword reassigned"
                        );
                        report.collisions.push(KeywordCollision {
                            keyword: keyword.clone(),
                            previous: std::mem::replace(owner, identifier.to_string()),
                            current: identifier.to_string(),
                        });
                    }
                }
                None => {
                    self.positions.insert(keyword.clone(), self.rules.len());
                    self.rules.push((keyword, identifier.to_string()));
                }
            }
            report.keywords_added += 1;
        }

        debug!(
            handler = %identifier,
            keywords = report.keywords_added,
            collisions = report.collisions.len(),
            "handler registered"
        );
        Ok(report)
    }

    /// Remove a handler and every keyword that points at it.
    ///
    /// Returns `false` when the handler was not registered.
    pub fn unregister(&mut self, identifier: &str) -> bool {
        let Some(idx) = self.handlers.iter().position(|h| h.identifier == identifier) else {
            return false;
        };
        self.handlers.remove(idx);
        self.rules.retain(|(_, handler)| handler != identifier);
        self.positions = self
            .rules
            .iter()
            .enumerate()
            .map(|(pos, (keyword, _))| (keyword.clone(), pos))
            .collect();
        debug!(handler = %identifier, "handler unregistered");
        true
    }

    /// Mark a registered handler available. Returns `false` if unknown.
    pub fn activate(&mut self, identifier: &str) -> bool {
        self.set_active(identifier, true)
    }

    /// Mark a registered handler unavailable. Its keywords still resolve to it.
    pub fn deactivate(&mut self, identifier: &str) -> bool {
        self.set_active(identifier, false)
    }

    pub fn is_active(&self, identifier: &str) -> bool {
        self.handlers
            .iter()
            .any(|h| h.identifier == identifier && h.active)
    }

    pub fn is_registered(&self, identifier: &str) -> bool {
        self.handlers.iter().any(|h| h.identifier == identifier)
    }

    /// Handler for `message`, or [`RouteTarget::Unhandled`].
    pub fn dispatch(&self, message: &str) -> RouteTarget {
        self.route(message).target
    }

    /// Route `message` and report whether the chosen handler is available.
    pub fn route(&self, message: &str) -> RouteDecision {
        let decision = match self.first_match(message) {
            Some((keyword, handler)) => RouteDecision {
                available: self.is_active(handler),
                target: RouteTarget::Handler(handler.to_string()),
                matched_keyword: Some(keyword.to_string()),
            },
            None => RouteDecision {
                target: RouteTarget::Unhandled,
                matched_keyword: None,
                available: false,
            },
        };

        METRICS.inc_dispatches();
        if !decision.target.is_handled() {
            METRICS.inc_unhandled();
        }
        obs::emit_message_dispatched(
            decision.target.as_str(),
            decision.matched_keyword.as_deref(),
            decision.available,
        );
        decision
    }

    /// Snapshot of rules and handler availability.
    pub fn status(&self) -> RouterStatus {
        let handlers: Vec<HandlerStatus> = self
            .handlers
            .iter()
            .map(|h| HandlerStatus {
                identifier: h.identifier.clone(),
                active: h.active,
                keyword_count: self
                    .rules
                    .iter()
                    .filter(|(_, handler)| *handler == h.identifier)
                    .count(),
            })
            .collect();

        RouterStatus {
            routing_rules: self
                .rules
                .iter()
                .map(|(keyword, handler)| RoutingRule {
                    keyword: keyword.clone(),
                    handler: handler.clone(),
                })
                .collect(),
            total_handlers: handlers.len(),
            active_handlers: handlers.iter().filter(|h| h.active).count(),
            handlers,
        }
    }

    /// Number of keyword rules.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    fn first_match(&self, message: &str) -> Option<(&str, &str)> {
        if message.is_empty() {
            return None;
        }
        let message = message.to_lowercase();
        self.rules
            .iter()
            .find(|(keyword, _)| message.contains(keyword.as_str()))
            .map(|(keyword, handler)| (keyword.as_str(), handler.as_str()))
    }

    fn set_active(&mut self, identifier: &str, active: bool) -> bool {
        match self.handlers.iter_mut().find(|h| h.identifier == identifier) {
            Some(entry) => {
                entry.active = active;
                true
            }
            None => false,
        }
    }
}
