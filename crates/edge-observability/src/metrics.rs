//! Search-layer counters.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Point-in-time copy of [`SearchMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    /// Requests that reached the network.
    pub dispatched: u64,
    /// Requests suppressed because their key matched the last dispatch.
    pub deduplicated: u64,
    /// In-flight requests cancelled by a newer one.
    pub superseded: u64,
    /// Requests that settled with a network/server error.
    pub failed: u64,
    /// Successful responses flagged as timed out or served by the fallback engine.
    pub degraded: u64,
    /// Suggestion lookups answered from the cache.
    pub suggestion_hits: u64,
    /// Suggestion lookups that went to the network.
    pub suggestion_misses: u64,
}

/// Lock-free counters shared between the orchestrator and the suggestion service.
#[derive(Debug, Default)]
pub struct SearchMetrics {
    dispatched: AtomicU64,
    deduplicated: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
    degraded: AtomicU64,
    suggestion_hits: AtomicU64,
    suggestion_misses: AtomicU64,
}

impl SearchMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_dispatch(&self) {
        self.dispatched.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_dedupe(&self) {
        self.deduplicated.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_superseded(&self, count: u64) {
        self.superseded.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_failure(&self) {
        self.failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_degraded(&self) {
        self.degraded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a suggestion cache lookup.
    pub fn record_suggestion_lookup(&self, hit: bool) {
        if hit {
            self.suggestion_hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.suggestion_misses.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Copy all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            dispatched: self.dispatched.load(Ordering::Relaxed),
            deduplicated: self.deduplicated.load(Ordering::Relaxed),
            superseded: self.superseded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            degraded: self.degraded.load(Ordering::Relaxed),
            suggestion_hits: self.suggestion_hits.load(Ordering::Relaxed),
            suggestion_misses: self.suggestion_misses.load(Ordering::Relaxed),
        }
    }
}

impl MetricsSnapshot {
    /// Share of suggestion lookups served from cache, if any lookups happened.
    pub fn suggestion_hit_ratio(&self) -> Option<f64> {
        let total = self.suggestion_hits + self.suggestion_misses;
        if total == 0 {
            None
        } else {
            Some(self.suggestion_hits as f64 / total as f64)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = SearchMetrics::new();
        metrics.record_dispatch();
        metrics.record_dispatch();
        metrics.record_dedupe();
        metrics.record_superseded(2);
        metrics.record_failure();
        metrics.record_degraded();

        let snap = metrics.snapshot();
        assert_eq!(snap.dispatched, 2);
        assert_eq!(snap.deduplicated, 1);
        assert_eq!(snap.superseded, 2);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.degraded, 1);
    }

    #[test]
    fn test_suggestion_hit_ratio() {
        let metrics = SearchMetrics::new();
        assert_eq!(metrics.snapshot().suggestion_hit_ratio(), None);

        metrics.record_suggestion_lookup(false);
        metrics.record_suggestion_lookup(true);
        metrics.record_suggestion_lookup(true);
        metrics.record_suggestion_lookup(true);

        let ratio = metrics.snapshot().suggestion_hit_ratio().unwrap();
        assert!((ratio - 0.75).abs() < f64::EPSILON);
    }
}
