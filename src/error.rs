//! Error types for the cache
//!
//! Provides unified error handling using thiserror. Cache misses, expired
//! entries and deletes of absent keys are not errors; they are encoded in the
//! `Ok` values of the operations.

use thiserror::Error;

// == Cache Error Enum ==
/// Unified error type for the cache engine and its secondary stores.
#[derive(Error, Debug)]
pub enum CacheError {
    /// Invalid configuration (malformed adapter params, bad interval)
    #[error("Invalid configuration: {0}")]
    Config(String),

    /// Secondary store could not be reached or failed its liveness probe
    #[error("[{store}] connection failed: {message}")]
    Connection { store: String, message: String },

    /// Secondary store operation failed
    #[error("[{store}] operation failed for key '{key}': {message}")]
    Adapter {
        store: String,
        key: String,
        message: String,
    },

    /// Value could not be encoded to or decoded from its wire form
    #[error("Codec error for key '{key}': {message}")]
    Codec { key: String, message: String },

    /// A janitor is already sweeping this cache
    #[error("Janitor is already running")]
    JanitorRunning,
}

impl CacheError {
    /// Creates a connection error for the named store.
    pub fn connection(store: impl Into<String>, message: impl Into<String>) -> Self {
        CacheError::Connection {
            store: store.into(),
            message: message.into(),
        }
    }

    /// Creates an operation error for the named store.
    pub fn adapter(
        store: impl Into<String>,
        key: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        CacheError::Adapter {
            store: store.into(),
            key: key.into(),
            message: message.into(),
        }
    }

    /// Creates a codec error, keeping the full cause chain of `err`.
    pub fn codec(key: impl Into<String>, err: anyhow::Error) -> Self {
        CacheError::Codec {
            key: key.into(),
            message: format!("{:#}", err),
        }
    }
}

// == Result Type Alias ==
/// Convenience Result type for the cache.
pub type Result<T> = std::result::Result<T, CacheError>;
