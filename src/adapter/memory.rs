//! In-process secondary store.
//!
//! Keeps wire values in a map with their own expiry. Useful as a second level
//! shared by several caches in one process, and as a stand-in for remote
//! stores in tests.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::sync::RwLock;
use tokio::time::Instant;

use super::SecondaryStore;
use crate::cache::Entry;
use crate::error::Result;

/// Parameters for the `memory` adapter kind. It takes none.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MemoryParams {}

/// Map size below which writes never sweep.
const MIN_SWEEP_LEN: usize = 64;

/// Map-backed store.
///
/// Expired values are dropped when they are read, and in bulk by a write
/// once the map has doubled in size since the last sweep.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<Values>,
}

#[derive(Debug, Default)]
struct Values {
    map: HashMap<String, Entry<String>>,
    /// Length at which the next write sweeps
    sweep_at: usize,
}

impl Values {
    fn sweep_if_grown(&mut self) {
        if self.map.len() < self.sweep_at.max(MIN_SWEEP_LEN) {
            return;
        }
        let now = Instant::now();
        self.map.retain(|_, entry| !entry.is_expired_at(now));
        self.sweep_at = self.map.len() * 2;
    }
}

impl MemoryStore {
    pub fn new(_params: MemoryParams) -> Self {
        Self::default()
    }

    /// Number of stored values, including expired ones not yet read.
    pub async fn len(&self) -> usize {
        self.values.read().await.map.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.values.read().await.map.is_empty()
    }
}

#[async_trait]
impl SecondaryStore for MemoryStore {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        {
            let values = self.values.read().await;
            match values.map.get(key) {
                Some(entry) if !entry.is_expired() => return Ok(Some(entry.value.clone())),
                Some(_) => {}
                None => return Ok(None),
            }
        }

        let mut values = self.values.write().await;
        if values.map.get(key).is_some_and(|entry| entry.is_expired()) {
            values.map.remove(key);
        }
        Ok(None)
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()> {
        let mut values = self.values.write().await;
        values.map.insert(key.to_string(), Entry::new(value, ttl));
        values.sweep_if_grown();
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool> {
        let mut values = self.values.write().await;
        Ok(values
            .map
            .remove(key)
            .is_some_and(|entry| !entry.is_expired()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_get_set_delete() {
        let store = MemoryStore::default();

        assert_eq!(store.get("key1").await.unwrap(), None);

        store.set("key1", "value1".to_string(), None).await.unwrap();
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("value1"));

        assert!(store.delete("key1").await.unwrap());
        assert!(!store.delete("key1").await.unwrap());
        assert_eq!(store.get("key1").await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_values_are_dropped_on_read() {
        let store = MemoryStore::default();
        store
            .set("key1", "value1".to_string(), Some(Duration::from_millis(100)))
            .await
            .unwrap();

        tokio::time::advance(Duration::from_millis(100)).await;

        assert_eq!(store.get("key1").await.unwrap(), None);
        assert!(store.is_empty().await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_writes_sweep_unread_expired_values() {
        let store = MemoryStore::default();
        for i in 0..10 {
            store
                .set(&format!("short_{}", i), "v".to_string(), Some(Duration::from_millis(100)))
                .await
                .unwrap();
        }
        tokio::time::advance(Duration::from_millis(100)).await;

        // The 64th value triggers a sweep of the 10 expired ones
        for i in 0..60 {
            store.set(&format!("long_{}", i), "v".to_string(), None).await.unwrap();
        }

        assert_eq!(store.len().await, 60);
        assert_eq!(store.get("short_0").await.unwrap(), None);
        assert_eq!(store.get("long_0").await.unwrap().as_deref(), Some("v"));
    }

    #[tokio::test]
    async fn test_huge_ttl_does_not_expire() {
        let store = MemoryStore::default();
        store.set("key1", "value1".to_string(), Some(Duration::MAX)).await.unwrap();
        assert_eq!(store.get("key1").await.unwrap().as_deref(), Some("value1"));
    }
}
