//! Engine counters
//!
//! Counters only, monotonic, reset only when the registry is created.

use std::sync::atomic::{AtomicU64, Ordering};

/// Registry of operational counters
///
/// Uses Relaxed ordering; counters are informational and never drive control flow.
#[derive(Debug, Default)]
pub struct MetricsRegistry {
    queries_executed: AtomicU64,
    queries_deduplicated: AtomicU64,
    attempts_retried: AtomicU64,
    queries_failed: AtomicU64,
    records_evaluated: AtomicU64,
    stale_refetches: AtomicU64,
}

impl MetricsRegistry {
    /// Create a new registry with all counters at zero
    pub fn new() -> Self {
        Self::default()
    }

    /// A pipeline ran to completion
    pub fn increment_queries_executed(&self) {
        self.queries_executed.fetch_add(1, Ordering::Relaxed);
    }

    /// A request joined an in-flight execution instead of running its own
    pub fn increment_queries_deduplicated(&self) {
        self.queries_deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    /// A failed attempt was retried
    pub fn increment_attempts_retried(&self) {
        self.attempts_retried.fetch_add(1, Ordering::Relaxed);
    }

    /// An execution surfaced an error
    pub fn increment_queries_failed(&self) {
        self.queries_failed.fetch_add(1, Ordering::Relaxed);
    }

    /// Add to the number of records a full scan evaluated
    pub fn add_records_evaluated(&self, count: u64) {
        self.records_evaluated.fetch_add(count, Ordering::Relaxed);
    }

    /// Loaded data was cleared because of a stale snapshot
    pub fn increment_stale_refetches(&self) {
        self.stale_refetches.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of every counter
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            queries_executed: self.queries_executed.load(Ordering::Relaxed),
            queries_deduplicated: self.queries_deduplicated.load(Ordering::Relaxed),
            attempts_retried: self.attempts_retried.load(Ordering::Relaxed),
            queries_failed: self.queries_failed.load(Ordering::Relaxed),
            records_evaluated: self.records_evaluated.load(Ordering::Relaxed),
            stale_refetches: self.stale_refetches.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time snapshot of all counters
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub queries_executed: u64,
    pub queries_deduplicated: u64,
    pub attempts_retried: u64,
    pub queries_failed: u64,
    pub records_evaluated: u64,
    pub stale_refetches: u64,
}
