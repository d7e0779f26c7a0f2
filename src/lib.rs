//! Tiered TTL Cache - An in-process expiring key/value cache
//!
//! Entries expire lazily when read and actively through a background
//! janitor. An optional secondary store (Redis, or any `SecondaryStore`)
//! is written through on every write and read through on every miss.
//!
//! ```ignore
//! let cache = Arc::new(Cache::new(Duration::from_secs(60)));
//! cache.start_janitor(Duration::from_secs(1))?;
//! cache
//!     .configure_adapter("redis", json!({ "url": "redis://localhost:6379" }), Codec::identity())
//!     .await?;
//!
//! cache.put("greeting", "hello".to_string(), Ttl::Default).await?;
//! assert_eq!(cache.get("greeting").await?.as_deref(), Some("hello"));
//! ```

pub mod adapter;
pub mod cache;
pub mod config;
pub mod error;
pub mod tasks;

pub use adapter::{Adapter, AdapterKind, Codec, SecondaryStore};
pub use cache::{Cache, Ttl};
pub use config::CacheConfig;
pub use error::{CacheError, Result};
