//! Configuration Module
//!
//! Library-level knobs for the cache engine, with defaults and optional
//! loading from environment variables.

use std::env;
use std::time::Duration;

/// Default TTL applied by `Ttl::Default` (5 minutes).
pub const DEFAULT_TTL_MS: u64 = 300_000;

/// Default janitor sweep interval (1 second).
pub const DEFAULT_SWEEP_INTERVAL_MS: u64 = 1_000;

/// Cache configuration parameters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// TTL used when a caller asks for the configured default
    pub default_ttl: Duration,
    /// Janitor sweep interval, None = no background sweeping
    pub sweep_interval: Option<Duration>,
}

impl CacheConfig {
    /// Creates a new CacheConfig by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_DEFAULT_TTL_MS` - Default TTL in milliseconds (default: 300000)
    /// - `CACHE_SWEEP_INTERVAL_MS` - Sweep interval in milliseconds, `0` disables
    ///   the janitor (default: 1000)
    pub fn from_env() -> Self {
        let default_ttl = env::var("CACHE_DEFAULT_TTL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_TTL_MS);
        let sweep_interval = env::var("CACHE_SWEEP_INTERVAL_MS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(DEFAULT_SWEEP_INTERVAL_MS);

        Self {
            default_ttl: Duration::from_millis(default_ttl),
            sweep_interval: (sweep_interval > 0).then(|| Duration::from_millis(sweep_interval)),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl: Duration::from_millis(DEFAULT_TTL_MS),
            sweep_interval: Some(Duration::from_millis(DEFAULT_SWEEP_INTERVAL_MS)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = CacheConfig::default();
        assert_eq!(config.default_ttl, Duration::from_secs(300));
        assert_eq!(config.sweep_interval, Some(Duration::from_secs(1)));
    }

    // Both env cases live in one test so they never race each other.
    #[test]
    fn test_config_from_env() {
        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("CACHE_SWEEP_INTERVAL_MS");
        assert_eq!(CacheConfig::from_env(), CacheConfig::default());

        env::set_var("CACHE_DEFAULT_TTL_MS", "2000");
        env::set_var("CACHE_SWEEP_INTERVAL_MS", "0");
        let config = CacheConfig::from_env();
        assert_eq!(config.default_ttl, Duration::from_secs(2));
        assert_eq!(config.sweep_interval, None);

        env::set_var("CACHE_DEFAULT_TTL_MS", "not-a-number");
        assert_eq!(
            CacheConfig::from_env().default_ttl,
            Duration::from_millis(DEFAULT_TTL_MS)
        );

        env::remove_var("CACHE_DEFAULT_TTL_MS");
        env::remove_var("CACHE_SWEEP_INTERVAL_MS");
    }
}
