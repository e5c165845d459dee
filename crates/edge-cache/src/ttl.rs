//! TTL cache with lazy expiry.

use std::collections::HashMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use tokio::time::Instant;

use crate::key::CacheKey;

/// Status of a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheStatus {
    /// Live entry.
    Hit,
    /// No entry.
    Miss,
    /// Entry exists but has outlived the TTL.
    Expired,
}

impl CacheStatus {
    pub fn is_hit(&self) -> bool {
        matches!(self, Self::Hit)
    }
}

impl std::fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Hit => write!(f, "HIT"),
            Self::Miss => write!(f, "MISS"),
            Self::Expired => write!(f, "EXPIRED"),
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<V> {
    stored_at: Instant,
    value: V,
}

/// Entry count at which an insert first sweeps expired entries.
pub const DEFAULT_PURGE_THRESHOLD: usize = 256;

/// In-memory map whose entries are valid while `now - stored_at < ttl`.
///
/// Callers pass `now` explicitly; under a paused Tokio clock that makes
/// expiry fully deterministic. Expired entries are swept on insert once the
/// map reaches the purge threshold; the next sweep waits until the map has
/// doubled again.
#[derive(Debug, Clone)]
pub struct TtlCache<V> {
    ttl: Duration,
    entries: HashMap<CacheKey, Entry<V>>,
    purge_threshold: usize,
    next_purge: usize,
}

impl<V> TtlCache<V> {
    /// Create an empty cache.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: HashMap::new(),
            purge_threshold: DEFAULT_PURGE_THRESHOLD,
            next_purge: DEFAULT_PURGE_THRESHOLD,
        }
    }

    /// Sweep expired entries once the map holds `threshold` entries.
    pub fn with_purge_threshold(mut self, threshold: usize) -> Self {
        self.purge_threshold = threshold.max(1);
        self.next_purge = self.purge_threshold;
        self
    }

    /// Get the TTL.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    fn is_live(&self, entry: &Entry<V>, now: Instant) -> bool {
        now.saturating_duration_since(entry.stored_at) < self.ttl
    }

    /// Classify a lookup without returning the value.
    pub fn status(&self, key: &CacheKey, now: Instant) -> CacheStatus {
        match self.entries.get(key) {
            Some(entry) if self.is_live(entry, now) => CacheStatus::Hit,
            Some(_) => CacheStatus::Expired,
            None => CacheStatus::Miss,
        }
    }

    /// The live value for `key`, if any.
    pub fn get(&self, key: &CacheKey, now: Instant) -> Option<&V> {
        self.entries
            .get(key)
            .filter(|entry| self.is_live(entry, now))
            .map(|entry| &entry.value)
    }

    /// Store `value`, replacing any previous entry and restarting its TTL.
    pub fn insert(&mut self, key: CacheKey, value: V, now: Instant) {
        if self.entries.len() >= self.next_purge {
            self.purge_expired(now);
            self.next_purge = self.purge_threshold.max(self.entries.len() * 2);
        }
        self.entries.insert(
            key,
            Entry {
                stored_at: now,
                value,
            },
        );
    }

    /// Drop a single entry.
    pub fn remove(&mut self, key: &CacheKey) -> Option<V> {
        self.entries.remove(key).map(|entry| entry.value)
    }

    /// Drop every expired entry. Returns how many were dropped.
    pub fn purge_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.entries.len();
        self.entries
            .retain(|_, entry| now.saturating_duration_since(entry.stored_at) < ttl);
        before - self.entries.len()
    }

    /// Number of stored entries, live or not.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(120_000);

    #[test]
    fn test_entry_lives_strictly_less_than_ttl() {
        let mut cache = TtlCache::new(TTL);
        let key = CacheKey::scoped(None, "lap");
        let t0 = Instant::now();
        cache.insert(key.clone(), 1, t0);

        assert_eq!(cache.get(&key, t0), Some(&1));
        assert_eq!(cache.get(&key, t0 + TTL - Duration::from_millis(1)), Some(&1));
        assert_eq!(cache.get(&key, t0 + TTL), None);
        assert_eq!(cache.status(&key, t0 + TTL + Duration::from_millis(1)), CacheStatus::Expired);
        assert_eq!(cache.status(&CacheKey::new("other"), t0), CacheStatus::Miss);
    }

    #[test]
    fn test_expired_entries_stay_until_purged() {
        let mut cache = TtlCache::new(TTL);
        let t0 = Instant::now();
        cache.insert(CacheKey::new("a"), "a", t0);
        cache.insert(CacheKey::new("b"), "b", t0 + Duration::from_secs(100));

        let later = t0 + Duration::from_secs(150);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.purge_expired(later), 1);
        assert_eq!(cache.get(&CacheKey::new("b"), later), Some(&"b"));
    }

    #[test]
    fn test_insert_sweeps_at_threshold() {
        let mut cache = TtlCache::new(TTL).with_purge_threshold(2);
        let t0 = Instant::now();
        cache.insert(CacheKey::new("a"), 1, t0);
        cache.insert(CacheKey::new("b"), 2, t0);
        assert_eq!(cache.len(), 2);

        cache.insert(CacheKey::new("c"), 3, t0 + TTL);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(&CacheKey::new("c"), t0 + TTL), Some(&3));
    }

    #[test]
    fn test_live_entries_survive_sweep() {
        let mut cache = TtlCache::new(TTL).with_purge_threshold(2);
        let t0 = Instant::now();
        cache.insert(CacheKey::new("a"), 1, t0);
        cache.insert(CacheKey::new("b"), 2, t0);
        cache.insert(CacheKey::new("c"), 3, t0 + Duration::from_secs(1));
        assert_eq!(cache.len(), 3);
        assert_eq!(cache.get(&CacheKey::new("a"), t0 + Duration::from_secs(1)), Some(&1));
    }

    #[test]
    fn test_reinsert_restarts_ttl() {
        let mut cache = TtlCache::new(TTL);
        let key = CacheKey::new("k");
        let t0 = Instant::now();
        cache.insert(key.clone(), 1, t0);
        cache.insert(key.clone(), 2, t0 + Duration::from_secs(100));

        assert_eq!(cache.get(&key, t0 + Duration::from_secs(150)), Some(&2));
        assert_eq!(cache.remove(&key), Some(2));
        assert!(cache.is_empty());
    }
}
