//! Cache Store Module
//!
//! Main cache engine: a lock-protected map of expiring entries with lazy
//! expiry on read, bulk sweeping, an eviction callback and an optional
//! write-through / read-through secondary store.
//!
//! The map lock is only ever held around map access. Eviction callbacks and
//! secondary store I/O always run after it has been released.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use arc_swap::ArcSwapOption;
use parking_lot::Mutex;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::{debug, info, warn};

use crate::adapter::{Adapter, AdapterKind, Codec};
use crate::cache::{CacheStats, Entry, StatsSnapshot, Ttl};
use crate::config::CacheConfig;
use crate::error::{CacheError, Result};
use crate::tasks::Janitor;

/// Callback invoked with the key and final value of every removed entry.
pub type EvictFn<V> = Box<dyn Fn(&str, V) + Send + Sync>;

/// Result of looking a key up in the map.
enum Lookup<V> {
    Live(V),
    Expired,
    Missing,
}

fn lookup<V: Clone>(entries: &HashMap<String, Entry<V>>, key: &str, now: Instant) -> Lookup<V> {
    match entries.get(key) {
        Some(entry) if entry.is_expired_at(now) => Lookup::Expired,
        Some(entry) => Lookup::Live(entry.value.clone()),
        None => Lookup::Missing,
    }
}

// == Cache ==
/// Concurrent TTL cache, generic over its value type.
///
/// Share it behind an `Arc`; the janitor needs one to run.
pub struct Cache<V> {
    /// Key-value storage
    entries: RwLock<HashMap<String, Entry<V>>>,
    /// TTL applied for `Ttl::Default`
    default_ttl: Duration,
    /// Eviction callback, at most one
    on_evict: ArcSwapOption<EvictFn<V>>,
    /// Optional second level
    adapter: ArcSwapOption<Adapter<V>>,
    stats: CacheStats,
    /// Background sweeper bound to this cache, at most one
    janitor: Mutex<Option<Janitor>>,
}

impl<V> Cache<V>
where
    V: Clone + Send + Sync + 'static,
{
    // == Constructor ==
    /// Creates an empty in-memory cache. No janitor is running.
    pub fn new(default_ttl: Duration) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            default_ttl,
            on_evict: ArcSwapOption::empty(),
            adapter: ArcSwapOption::empty(),
            stats: CacheStats::new(),
            janitor: Mutex::new(None),
        }
    }

    /// Creates a cache from configuration, starting the janitor when a sweep
    /// interval is configured.
    ///
    /// Must be called from within a tokio runtime when the janitor is enabled.
    pub fn from_config(config: &CacheConfig) -> Result<Arc<Self>> {
        let cache = Arc::new(Self::new(config.default_ttl));
        if let Some(interval) = config.sweep_interval {
            cache.start_janitor(interval)?;
        }
        Ok(cache)
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    // == Set ==
    /// Inserts a value only if the key is absent.
    ///
    /// Returns `Ok(false)` and leaves the cache untouched when a live entry
    /// exists. An expired entry under the key counts as absent and is
    /// reported to the eviction callback. The check and the insert happen
    /// under a single exclusive lock, so concurrent callers racing on a new
    /// key see exactly one winner.
    ///
    /// On success the value is written through to the secondary store. A
    /// failure there is returned, but the in-memory insert stays.
    pub async fn set(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) -> Result<bool> {
        let key = key.into();
        let lifetime = ttl.into().resolve(self.default_ttl);

        let displaced = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            if entries.get(&key).is_some_and(|entry| !entry.is_expired_at(now)) {
                return Ok(false);
            }
            entries
                .insert(key.clone(), Entry::new(value.clone(), lifetime))
                .filter(|entry| entry.is_expired_at(now))
        };

        self.notify_expired(&key, displaced);
        self.write_through(&key, &value, lifetime).await?;
        Ok(true)
    }

    // == Put ==
    /// Inserts or replaces a value, resetting its expiry.
    ///
    /// Replacing a live entry is not an eviction; replacing an expired one
    /// is. The value is always written through to the secondary store.
    pub async fn put(&self, key: impl Into<String>, value: V, ttl: impl Into<Ttl>) -> Result<()> {
        let key = key.into();
        let lifetime = ttl.into().resolve(self.default_ttl);

        let displaced = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            entries
                .insert(key.clone(), Entry::new(value.clone(), lifetime))
                .filter(|entry| entry.is_expired_at(now))
        };

        self.notify_expired(&key, displaced);
        self.write_through(&key, &value, lifetime).await
    }

    // == Get ==
    /// Retrieves a value by key.
    ///
    /// - Live entry: returned.
    /// - Expired entry: removed, reported to the eviction callback, `Ok(None)`.
    /// - Missing entry: looked up in the secondary store if one is bound; a
    ///   hit is copied into memory with the default TTL and returned.
    ///
    /// Errors only come from the secondary store or the codec, never from a
    /// plain miss.
    ///
    /// A read-through racing a `delete` of the same key can fetch the value
    /// just before the secondary store drops it and copy it back into memory,
    /// where it stays until it expires or is deleted again. Calls that do not
    /// overlap never see a deleted value.
    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        let found = {
            let entries = self.entries.read().await;
            lookup(&entries, key, Instant::now())
        };

        match found {
            Lookup::Live(value) => {
                self.stats.record_hit();
                Ok(Some(value))
            }
            Lookup::Expired => Ok(self.expire(key).await),
            Lookup::Missing => self.read_through(key).await,
        }
    }

    /// Removes an entry seen expired under the shared lock.
    ///
    /// The key is checked again under the exclusive lock since another
    /// caller may have replaced or removed it in between.
    async fn expire(&self, key: &str) -> Option<V> {
        let expired = {
            let mut entries = self.entries.write().await;
            match lookup(&entries, key, Instant::now()) {
                Lookup::Live(value) => {
                    self.stats.record_hit();
                    return Some(value);
                }
                Lookup::Expired => entries.remove(key),
                Lookup::Missing => None,
            }
        };

        if expired.is_some() {
            debug!("Lazily expired '{}'", key);
        }
        self.notify_expired(key, expired);
        self.stats.record_miss();
        None
    }

    async fn read_through(&self, key: &str) -> Result<Option<V>> {
        let Some(adapter) = self.adapter.load_full() else {
            self.stats.record_miss();
            return Ok(None);
        };

        let Some(value) = adapter.get(key).await? else {
            self.stats.record_miss();
            return Ok(None);
        };

        let lifetime = Ttl::Default.resolve(self.default_ttl);
        let (value, displaced) = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            match lookup(&entries, key, now) {
                // Written while the secondary store was being read; memory wins
                Lookup::Live(current) => (current, None),
                _ => {
                    let displaced = entries
                        .insert(key.to_string(), Entry::new(value.clone(), lifetime))
                        .filter(|entry| entry.is_expired_at(now));
                    (value, displaced)
                }
            }
        };

        debug!("Repopulated '{}' from {} store", key, adapter.name());
        self.notify_expired(key, displaced);
        self.stats.record_read_through();
        Ok(Some(value))
    }

    // == Delete ==
    /// Removes a key from memory and from the secondary store.
    ///
    /// Follows `get` semantics: an expired entry is lazily expired and the
    /// call is otherwise a no-op, and a key held only by the secondary store
    /// is read from there so the callback sees its value. Returns whether a
    /// live value was deleted. The eviction callback fires at most once.
    pub async fn delete(&self, key: &str) -> Result<bool> {
        let removed = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            entries.remove(key).map(|entry| {
                let expired = entry.is_expired_at(now);
                (entry, expired)
            })
        };

        match removed {
            Some((entry, false)) => {
                self.stats.record_deletion();
                let adapter_result = match self.adapter.load_full() {
                    Some(adapter) => adapter.delete(key).await.map(|_| ()),
                    None => Ok(()),
                };
                self.notify(key, entry.value);
                adapter_result.map(|_| true)
            }
            Some((entry, true)) => {
                self.notify_expired(key, Some(entry));
                Ok(false)
            }
            None => self.delete_from_adapter(key).await,
        }
    }

    async fn delete_from_adapter(&self, key: &str) -> Result<bool> {
        let Some(adapter) = self.adapter.load_full() else {
            return Ok(false);
        };
        let Some(value) = adapter.get(key).await? else {
            return Ok(false);
        };
        // Expired or deleted by someone else since the read
        if !adapter.delete(key).await? {
            return Ok(false);
        }

        self.stats.record_deletion();
        self.notify(key, value);
        Ok(true)
    }

    // == Delete Expired ==
    /// Removes every expired entry in one exclusive pass, then reports each to
    /// the eviction callback once the lock is released.
    ///
    /// Returns the number of entries removed.
    pub async fn delete_expired(&self) -> usize {
        let expired: Vec<(String, Entry<V>)> = {
            let mut entries = self.entries.write().await;
            let now = Instant::now();
            let expired_keys: Vec<String> = entries
                .iter()
                .filter(|(_, entry)| entry.is_expired_at(now))
                .map(|(key, _)| key.clone())
                .collect();

            expired_keys
                .into_iter()
                .filter_map(|key| entries.remove(&key).map(|entry| (key, entry)))
                .collect()
        };

        let count = expired.len();
        self.stats.record_expirations(count as u64);

        if let Some(callback) = self.on_evict.load_full() {
            for (key, entry) in expired {
                callback(&key, entry.value);
            }
        }
        count
    }

    // == Eviction Callback ==
    /// Registers the eviction callback, replacing any previous one.
    ///
    /// It runs without the cache lock held, so it may call back into the
    /// cache.
    pub fn on_evict<F>(&self, callback: F)
    where
        F: Fn(&str, V) + Send + Sync + 'static,
    {
        let callback: EvictFn<V> = Box::new(callback);
        self.on_evict.store(Some(Arc::new(callback)));
    }

    pub fn clear_on_evict(&self) {
        self.on_evict.store(None);
    }

    fn notify(&self, key: &str, value: V) {
        if let Some(callback) = self.on_evict.load_full() {
            callback(key, value);
        }
    }

    fn notify_expired(&self, key: &str, expired: Option<Entry<V>>) {
        if let Some(entry) = expired {
            self.stats.record_expirations(1);
            self.notify(key, entry.value);
        }
    }

    // == Secondary Store ==
    /// Binds a built-in secondary store by kind name.
    ///
    /// Returns `Ok(false)` for an unknown kind, leaving the cache as it was.
    ///
    /// # Errors
    /// - `CacheError::Config` if `params` are malformed for the kind
    /// - `CacheError::Connection` if the store is unreachable
    pub async fn configure_adapter(
        &self,
        kind: &str,
        params: serde_json::Value,
        codec: Codec<V>,
    ) -> Result<bool> {
        let Some(adapter_kind) = AdapterKind::parse(kind) else {
            warn!("Unknown adapter kind '{}', secondary store not configured", kind);
            return Ok(false);
        };

        let store = adapter_kind.connect(params).await?;
        self.set_adapter(Adapter::new(store, codec));
        info!("Secondary store configured: {}", adapter_kind);
        Ok(true)
    }

    /// Binds any secondary store implementation.
    pub fn set_adapter(&self, adapter: Adapter<V>) {
        self.adapter.store(Some(Arc::new(adapter)));
    }

    /// Unbinds the secondary store, returning it.
    pub fn remove_adapter(&self) -> Option<Arc<Adapter<V>>> {
        self.adapter.swap(None)
    }

    /// The bound secondary store, for direct queries.
    pub fn adapter(&self) -> Option<Arc<Adapter<V>>> {
        self.adapter.load_full()
    }

    async fn write_through(&self, key: &str, value: &V, lifetime: Option<Duration>) -> Result<()> {
        let Some(adapter) = self.adapter.load_full() else {
            return Ok(());
        };
        if let Err(e) = adapter.set(key, value, lifetime).await {
            warn!("Write-through to {} store failed: {}", adapter.name(), e);
            return Err(e);
        }
        Ok(())
    }

    // == Janitor ==
    /// Starts sweeping expired entries every `interval`.
    ///
    /// # Errors
    /// - `CacheError::JanitorRunning` if this cache already has a janitor
    /// - `CacheError::Config` if `interval` is zero
    pub fn start_janitor(self: &Arc<Self>, interval: Duration) -> Result<()> {
        if interval.is_zero() {
            return Err(CacheError::Config(
                "janitor interval must be greater than zero".to_string(),
            ));
        }

        let mut slot = self.janitor.lock();
        if slot.as_ref().is_some_and(|janitor| !janitor.is_finished()) {
            return Err(CacheError::JanitorRunning);
        }
        *slot = Some(Janitor::start(Arc::downgrade(self), interval));
        Ok(())
    }

    /// Stops the janitor, waiting for an in-flight sweep to finish.
    ///
    /// Returns false if no janitor was running.
    pub async fn stop_janitor(&self) -> bool {
        let janitor = self.janitor.lock().take();
        match janitor {
            Some(janitor) => {
                janitor.stop().await;
                true
            }
            None => false,
        }
    }

    pub fn janitor_running(&self) -> bool {
        self.janitor
            .lock()
            .as_ref()
            .is_some_and(|janitor| !janitor.is_finished())
    }

    // == Length ==
    /// Returns the number of entries held in memory, including expired
    /// entries not yet reclaimed.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    // == Stats ==
    /// Returns current cache statistics.
    pub async fn stats(&self) -> StatsSnapshot {
        let entries = self.len().await;
        self.stats.snapshot(entries)
    }
}

impl<V> Drop for Cache<V> {
    fn drop(&mut self) {
        if let Some(janitor) = self.janitor.get_mut().take() {
            janitor.cancel();
        }
    }
}
