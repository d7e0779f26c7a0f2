//! Cache Module
//!
//! Provides the in-memory TTL cache engine with lazy expiry, bulk sweeping
//! and an optional secondary store.

mod entry;
mod stats;
mod store;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use entry::{Entry, Ttl};
pub use stats::{CacheStats, StatsSnapshot};
pub use store::{Cache, EvictFn};
