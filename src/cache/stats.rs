//! Cache Statistics Module
//!
//! Tracks cache activity: hits, misses, expirations, deletions and
//! read-throughs from the secondary store.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

// == Cache Stats ==
/// Live counters shared by all callers of a cache.
#[derive(Debug, Default)]
pub struct CacheStats {
    hits: AtomicU64,
    misses: AtomicU64,
    expirations: AtomicU64,
    deletions: AtomicU64,
    read_throughs: AtomicU64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_hit(&self) {
        self.hits.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_miss(&self) {
        self.misses.fetch_add(1, Ordering::Relaxed);
    }

    /// Records entries removed because their TTL elapsed (lazy or swept).
    pub fn record_expirations(&self, count: u64) {
        self.expirations.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_deletion(&self) {
        self.deletions.fetch_add(1, Ordering::Relaxed);
    }

    /// Records a miss served by the secondary store. Also counts as a hit.
    pub fn record_read_through(&self) {
        self.read_throughs.fetch_add(1, Ordering::Relaxed);
        self.record_hit();
    }

    // == Snapshot ==
    /// Copies the counters into a serializable snapshot.
    pub fn snapshot(&self, entries: usize) -> StatsSnapshot {
        StatsSnapshot {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            expirations: self.expirations.load(Ordering::Relaxed),
            deletions: self.deletions.load(Ordering::Relaxed),
            read_throughs: self.read_throughs.load(Ordering::Relaxed),
            entries,
        }
    }
}

// == Stats Snapshot ==
/// Point-in-time copy of the cache counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Lookups answered with a value (memory or secondary store)
    pub hits: u64,
    /// Lookups answered without a value
    pub misses: u64,
    /// Entries removed because they expired
    pub expirations: u64,
    /// Entries removed by explicit delete
    pub deletions: u64,
    /// Hits served by the secondary store
    pub read_throughs: u64,
    /// Entries currently held in memory
    pub entries: usize,
}

impl StatsSnapshot {
    // == Hit Rate ==
    /// Returns hits / (hits + misses), or 0.0 if no lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
