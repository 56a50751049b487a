//! Global atomic counters for ARIA observability.
//!
//! Counters are incremented silently at the call site. Call
//! [`Metrics::flush`] to emit current values as a single
//! `tracing::info!` event (e.g. when a CLI command finishes).

use std::sync::atomic::{AtomicU64, Ordering};

/// Global metrics singleton.
pub static METRICS: Metrics = Metrics::new();

/// Lightweight atomic counters — no allocations, no locking.
pub struct Metrics {
    dispatches: AtomicU64,
    unhandled: AtomicU64,
    admitted: AtomicU64,
    rejected: AtomicU64,
    evicted: AtomicU64,
    purged: AtomicU64,
    classifier_fallbacks: AtomicU64,
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

impl Metrics {
    pub const fn new() -> Self {
        Self {
            dispatches: AtomicU64::new(0),
            unhandled: AtomicU64::new(0),
            admitted: AtomicU64::new(0),
            rejected: AtomicU64::new(0),
            evicted: AtomicU64::new(0),
            purged: AtomicU64::new(0),
            classifier_fallbacks: AtomicU64::new(0),
        }
    }

    /// Increment the routed-messages counter by one.
    pub fn inc_dispatches(&self) {
        self.dispatches.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "dispatches", "counter incremented");
    }

    /// Increment the unmatched-messages counter by one.
    pub fn inc_unhandled(&self) {
        self.unhandled.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "unhandled", "counter incremented");
    }

    pub fn inc_admitted(&self) {
        self.admitted.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "admitted", "counter incremented");
    }

    pub fn inc_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "rejected", "counter incremented");
    }

    /// Add `n` cap evictions.
    pub fn add_evicted(&self, n: u64) {
        self.evicted.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "evicted", by = n, "counter incremented");
    }

    /// Add `n` purged records.
    pub fn add_purged(&self, n: u64) {
        self.purged.fetch_add(n, Ordering::Relaxed);
        tracing::trace!(metric = "purged", by = n, "counter incremented");
    }

    pub fn inc_classifier_fallbacks(&self) {
        self.classifier_fallbacks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(metric = "classifier_fallbacks", "counter incremented");
    }

    /// Emit all current counter values as a single `info!` event.
    pub fn flush(&self) {
        tracing::info!(
            metric = "flush",
            dispatches = self.dispatches(),
            unhandled = self.unhandled(),
            admitted = self.admitted(),
            rejected = self.rejected(),
            evicted = self.evicted(),
            purged = self.purged(),
            classifier_fallbacks = self.classifier_fallbacks(),
        );
    }

    pub fn dispatches(&self) -> u64 {
        self.dispatches.load(Ordering::Relaxed)
    }

    pub fn unhandled(&self) -> u64 {
        self.unhandled.load(Ordering::Relaxed)
    }

    pub fn admitted(&self) -> u64 {
        self.admitted.load(Ordering::Relaxed)
    }

    pub fn rejected(&self) -> u64 {
        self.rejected.load(Ordering::Relaxed)
    }

    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    pub fn purged(&self) -> u64 {
        self.purged.load(Ordering::Relaxed)
    }

    pub fn classifier_fallbacks(&self) -> u64 {
        self.classifier_fallbacks.load(Ordering::Relaxed)
    }

    /// Reset all counters to zero (useful in tests).
    pub fn reset(&self) {
        for counter in [
            &self.dispatches,
            &self.unhandled,
            &self.admitted,
            &self.rejected,
            &self.evicted,
            &self.purged,
            &self.classifier_fallbacks,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}
