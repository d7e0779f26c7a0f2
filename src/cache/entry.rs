//! Cache Entry Module
//!
//! Defines individual cache entries and the TTL forms callers can request.

use std::time::Duration;

use tokio::time::Instant;

// == TTL ==
/// Lifetime requested for an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Ttl {
    /// Use the cache's configured default TTL
    #[default]
    Default,
    /// Never expires
    Never,
    /// Expires once the duration has elapsed
    After(Duration),
}

impl Ttl {
    /// Resolves this TTL against the cache default.
    ///
    /// Returns None for entries that never expire.
    pub fn resolve(self, default_ttl: Duration) -> Option<Duration> {
        match self {
            Ttl::Default => Some(default_ttl),
            Ttl::Never => None,
            Ttl::After(ttl) => Some(ttl),
        }
    }
}

impl From<Duration> for Ttl {
    fn from(ttl: Duration) -> Self {
        Ttl::After(ttl)
    }
}

// == Cache Entry ==
/// A stored value together with its absolute expiry.
#[derive(Debug, Clone)]
pub struct Entry<V> {
    /// The stored value
    pub value: V,
    /// Expiry instant, None = no expiration
    pub expires_at: Option<Instant>,
}

impl<V> Entry<V> {
    // == Constructor ==
    /// Creates a new entry living for `lifetime`, or forever when None.
    ///
    /// A lifetime too long for the clock to represent never expires.
    pub fn new(value: V, lifetime: Option<Duration>) -> Self {
        let expires_at = lifetime.and_then(|ttl| Instant::now().checked_add(ttl));
        Self { value, expires_at }
    }

    // == Is Expired ==
    /// Checks if the entry has expired.
    ///
    /// An entry is expired once the current time is greater than or equal to
    /// its expiration time, so a zero lifetime is expired on creation.
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Instant::now())
    }

    /// Checks expiry against a caller-supplied instant.
    ///
    /// Sweeps read the clock once and reuse it for every entry.
    pub fn is_expired_at(&self, now: Instant) -> bool {
        match self.expires_at {
            Some(expires) => now >= expires,
            None => false,
        }
    }

    // == Time To Live ==
    /// Returns the remaining lifetime, or None if the entry never expires.
    ///
    /// # Returns
    /// - `Some(Duration::ZERO)` if the entry has expired
    /// - `Some(remaining)` if the entry has a TTL that hasn't elapsed
    /// - `None` if the entry never expires
    pub fn ttl_remaining(&self) -> Option<Duration> {
        self.expires_at
            .map(|expires| expires.saturating_duration_since(Instant::now()))
    }
}
