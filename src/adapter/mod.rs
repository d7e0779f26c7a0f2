//! Secondary Store Module
//!
//! A second level of caching behind the in-memory engine. Stores only deal in
//! string wire forms; `Codec` converts between those and the cache's value type.
//!
//! # Kinds
//! - `redis` - Remote Redis server (`RedisStore`)
//! - `memory` - In-process store (`MemoryStore`)

mod memory;
mod redis;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{CacheError, Result};

pub use self::memory::{MemoryParams, MemoryStore};
pub use self::redis::{RedisParams, RedisStore};

// == Secondary Store ==
/// Narrow Get/Set/Delete contract over string wire values.
///
/// Implementations verify connectivity when they are constructed and expire
/// their own data according to the TTL passed to `set`.
#[async_trait]
pub trait SecondaryStore: Send + Sync {
    /// A name for logs and errors.
    ///
    /// # Example
    /// - "memory"
    /// - "redis"
    fn name(&self) -> &'static str;

    /// Returns the stored wire value, None on a miss.
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Stores the wire value. A TTL of None means no expiry.
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<()>;

    /// Removes the key. Returns whether anything was removed.
    async fn delete(&self, key: &str) -> Result<bool>;
}

// == Codec ==
type EncodeFn<V> = dyn Fn(&str, &V) -> anyhow::Result<String> + Send + Sync;
type DecodeFn<V> = dyn Fn(&str, &str) -> anyhow::Result<V> + Send + Sync;

/// Caller-supplied conversion between values and their wire form.
///
/// Both functions receive the key alongside the value.
pub struct Codec<V> {
    encode: Arc<EncodeFn<V>>,
    decode: Arc<DecodeFn<V>>,
}

impl<V> Codec<V> {
    pub fn new<E, D>(encode: E, decode: D) -> Self
    where
        E: Fn(&str, &V) -> anyhow::Result<String> + Send + Sync + 'static,
        D: Fn(&str, &str) -> anyhow::Result<V> + Send + Sync + 'static,
    {
        Self {
            encode: Arc::new(encode),
            decode: Arc::new(decode),
        }
    }

    pub fn encode(&self, key: &str, value: &V) -> Result<String> {
        (self.encode)(key, value).map_err(|e| CacheError::codec(key, e))
    }

    pub fn decode(&self, key: &str, wire: &str) -> Result<V> {
        (self.decode)(key, wire).map_err(|e| CacheError::codec(key, e))
    }
}

impl Codec<String> {
    /// Identity codec for caches that already hold strings.
    pub fn identity() -> Self {
        Self::new(|_, value: &String| Ok(value.clone()), |_, wire| Ok(wire.to_string()))
    }
}

impl<V> Clone for Codec<V> {
    fn clone(&self) -> Self {
        Self {
            encode: Arc::clone(&self.encode),
            decode: Arc::clone(&self.decode),
        }
    }
}

impl<V> fmt::Debug for Codec<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Codec").finish_non_exhaustive()
    }
}

// == Adapter ==
/// A secondary store bound to a codec, speaking the cache's value type.
pub struct Adapter<V> {
    store: Arc<dyn SecondaryStore>,
    codec: Codec<V>,
}

impl<V> Adapter<V> {
    pub fn new(store: Arc<dyn SecondaryStore>, codec: Codec<V>) -> Self {
        Self { store, codec }
    }

    pub fn name(&self) -> &'static str {
        self.store.name()
    }

    /// Fetches and decodes a value. Decode failures are errors, not misses.
    pub async fn get(&self, key: &str) -> Result<Option<V>> {
        match self.store.get(key).await? {
            Some(wire) => self.codec.decode(key, &wire).map(Some),
            None => Ok(None),
        }
    }

    /// Encodes and stores a value. A TTL of None means no expiry.
    pub async fn set(&self, key: &str, value: &V, ttl: Option<Duration>) -> Result<()> {
        let wire = self.codec.encode(key, value)?;
        self.store.set(key, wire, ttl).await
    }

    pub async fn delete(&self, key: &str) -> Result<bool> {
        self.store.delete(key).await
    }
}

impl<V> fmt::Debug for Adapter<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("store", &self.store.name())
            .finish_non_exhaustive()
    }
}

// == Adapter Kind ==
/// Built-in secondary store implementations, selected by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdapterKind {
    Redis,
    Memory,
}

impl AdapterKind {
    /// Resolves a kind name. Returns None for unknown kinds.
    pub fn parse(kind: &str) -> Option<Self> {
        match kind.trim().to_ascii_lowercase().as_str() {
            "redis" => Some(AdapterKind::Redis),
            "memory" => Some(AdapterKind::Memory),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterKind::Redis => "redis",
            AdapterKind::Memory => "memory",
        }
    }

    // == Connect ==
    /// Builds and verifies the store described by `params`.
    ///
    /// # Errors
    /// - `CacheError::Config` if `params` do not match the kind's parameters
    /// - `CacheError::Connection` if the store fails its liveness probe
    pub async fn connect(self, params: serde_json::Value) -> Result<Arc<dyn SecondaryStore>> {
        match self {
            AdapterKind::Redis => {
                let params: RedisParams = parse_params(self, params)?;
                Ok(Arc::new(RedisStore::connect(params).await?))
            }
            AdapterKind::Memory => {
                let params: MemoryParams = parse_params(self, params)?;
                Ok(Arc::new(MemoryStore::new(params)))
            }
        }
    }
}

impl fmt::Display for AdapterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn parse_params<P: DeserializeOwned>(kind: AdapterKind, params: serde_json::Value) -> Result<P> {
    serde_json::from_value(params)
        .map_err(|e| CacheError::Config(format!("invalid {} adapter params: {}", kind, e)))
}
