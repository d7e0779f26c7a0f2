//! Janitor Task
//!
//! Background task that periodically removes expired cache entries,
//! independent of read traffic.

use std::sync::Weak;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::cache::Cache;

/// Handle to a running sweep loop.
///
/// Owned by the cache it sweeps; see `Cache::start_janitor`.
#[derive(Debug)]
pub struct Janitor {
    interval: Duration,
    token: CancellationToken,
    handle: JoinHandle<()>,
}

impl Janitor {
    /// Spawns a task that calls `delete_expired` on the cache every `interval`.
    ///
    /// The task only holds a weak reference between ticks and exits once the
    /// cache is dropped. The first sweep runs one interval after start.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start<V>(cache: Weak<Cache<V>>, interval: Duration) -> Self
    where
        V: Clone + Send + Sync + 'static,
    {
        let token = CancellationToken::new();
        let cancelled = token.clone();

        let handle = tokio::spawn(async move {
            info!("Starting janitor with interval of {:?}", interval);

            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    _ = cancelled.cancelled() => break,
                    _ = ticker.tick() => {
                        let Some(cache) = cache.upgrade() else {
                            debug!("Cache dropped, janitor exiting");
                            break;
                        };

                        // A panicking eviction callback must not end the loop
                        match tokio::spawn(async move { cache.delete_expired().await }).await {
                            Ok(removed) if removed > 0 => {
                                info!("Janitor sweep: removed {} expired entries", removed);
                            }
                            Ok(_) => debug!("Janitor sweep: no expired entries found"),
                            Err(e) => error!("Janitor sweep failed: {}", e),
                        }
                    }
                }
            }

            info!("Janitor stopped");
        });

        Self {
            interval,
            token,
            handle,
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Signals the loop without waiting for it.
    pub fn cancel(&self) {
        self.token.cancel();
    }

    /// Signals the loop and waits for it to finish, letting an in-flight
    /// sweep complete first.
    pub async fn stop(self) {
        self.token.cancel();
        if let Err(e) = self.handle.await {
            error!("Janitor task ended abnormally: {}", e);
        }
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}
