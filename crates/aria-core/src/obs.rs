//! Structured observability hooks for routing and memory lifecycle events.
//!
//! This module provides:
//! - Request-scoped tracing spans via the `RequestSpan` RAII guard
//! - Emission functions for routing, admission, eviction and purge events
//!
//! Events are emitted at `info!` level (filter with the `ARIA_LOG` env var);
//! recoverable failures are emitted at `warn!`.

use tracing::{info, warn};

/// RAII guard that enters a request-scoped span for the duration of one
/// inbound operation.
///
/// # Example
///
/// ```ignore
/// let _span = RequestSpan::enter("store");
/// // tracing calls are now tagged with op = "store" and a request_id
/// ```
pub struct RequestSpan {
    request_id: String,
    _span: tracing::span::EnteredSpan,
}

impl RequestSpan {
    /// Create and enter a span for `op` with a fresh request id.
    pub fn enter(op: &str) -> Self {
        let request_id = uuid::Uuid::new_v4().to_string();
        let span = tracing::info_span!("aria.request", op = %op, request_id = %request_id);
        Self {
            request_id,
            _span: span.entered(),
        }
    }

    pub fn request_id(&self) -> &str {
        &self.request_id
    }
}

/// Emit event: a message was routed.
pub fn emit_message_dispatched(handler: &str, keyword: Option<&str>, available: bool) {
    info!(
        event = "message.dispatched",
        handler = %handler,
        keyword = keyword.unwrap_or(""),
        available = available,
    );
}

/// Emit event: a record passed its threshold and was stored.
pub fn emit_memory_admitted(record_id: &str, category: &str, importance: u8) {
    info!(
        event = "memory.admitted",
        record_id = %record_id,
        category = %category,
        importance = importance,
    );
}

/// Emit event: a record scored below its category threshold.
pub fn emit_memory_rejected(category: &str, importance: u8, threshold: u8) {
    info!(
        event = "memory.rejected",
        category = %category,
        importance = importance,
        threshold = threshold,
    );
}

/// Emit event: cap enforcement retired `count` records.
pub fn emit_memory_evicted(category: &str, count: usize, max_active: usize) {
    info!(
        event = "memory.evicted",
        category = %category,
        count = count,
        max_active = max_active,
    );
}

/// Emit event: purge matched `matched` records (`dry_run` leaves them active).
pub fn emit_memory_purged(category: &str, matched: usize, dry_run: bool) {
    info!(
        event = "memory.purged",
        category = %category,
        matched = matched,
        dry_run = dry_run,
    );
}

/// Emit event: the external classifier failed and the default category was used.
pub fn emit_classifier_fallback(error: &dyn std::fmt::Display) {
    warn!(event = "classifier.fallback", error = %error);
}

/// Emit event: persistence failed during a store request (warning level).
pub fn emit_store_failed(error: &dyn std::fmt::Display) {
    warn!(event = "memory.store_failed", error = %error);
}
