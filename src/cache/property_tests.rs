//! Property-Based Tests for Cache Module
//!
//! Runs random operation sequences against the cache and a simple model of
//! it. Entries are stored either forever or already expired, so the model
//! does not depend on wall-clock timing.

use proptest::prelude::*;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::cache::{Cache, Ttl};

// == Test Configuration ==
const TEST_DEFAULT_TTL: Duration = Duration::from_secs(300);

// == Strategies ==
/// Small key space so operations collide often
fn key_strategy() -> impl Strategy<Value = String> {
    "[a-e]{1,2}"
}

fn ttl_strategy() -> impl Strategy<Value = Ttl> {
    prop_oneof![Just(Ttl::Never), Just(Ttl::After(Duration::ZERO))]
}

#[derive(Debug, Clone)]
enum CacheOp {
    Set { key: String, value: u32, ttl: Ttl },
    Put { key: String, value: u32, ttl: Ttl },
    Get { key: String },
    Delete { key: String },
}

fn cache_op_strategy() -> impl Strategy<Value = CacheOp> {
    prop_oneof![
        (key_strategy(), any::<u32>(), ttl_strategy())
            .prop_map(|(key, value, ttl)| CacheOp::Set { key, value, ttl }),
        (key_strategy(), any::<u32>(), ttl_strategy())
            .prop_map(|(key, value, ttl)| CacheOp::Put { key, value, ttl }),
        key_strategy().prop_map(|key| CacheOp::Get { key }),
        key_strategy().prop_map(|key| CacheOp::Delete { key }),
    ]
}

// == Model ==
/// Expected contents: key -> (value, expired)
#[derive(Default)]
struct Model {
    entries: HashMap<String, (u32, bool)>,
    evictions: Vec<(String, u32)>,
}

impl Model {
    fn is_live(&self, key: &str) -> bool {
        matches!(self.entries.get(key), Some((_, false)))
    }

    fn insert(&mut self, key: &str, value: u32, ttl: Ttl) {
        let expired = ttl != Ttl::Never;
        if let Some((old, true)) = self.entries.insert(key.to_string(), (value, expired)) {
            self.evictions.push((key.to_string(), old));
        }
    }

    fn remove(&mut self, key: &str) -> Option<(u32, bool)> {
        let removed = self.entries.remove(key);
        if let Some((value, _)) = removed {
            self.evictions.push((key.to_string(), value));
        }
        removed
    }
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn sorted(mut evictions: Vec<(String, u32)>) -> Vec<(String, u32)> {
    evictions.sort();
    evictions
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    // For any operation sequence, reads match the model, `set` only succeeds
    // for absent or expired keys, and every removal (lazy expiry, sweep or
    // delete) is reported to the eviction callback exactly once.
    #[test]
    fn prop_operations_match_model(ops in prop::collection::vec(cache_op_strategy(), 1..60)) {
        runtime().block_on(async {
            let cache = Cache::new(TEST_DEFAULT_TTL);
            let evictions: Arc<Mutex<Vec<(String, u32)>>> = Arc::default();
            let sink = Arc::clone(&evictions);
            cache.on_evict(move |key: &str, value: u32| sink.lock().push((key.to_string(), value)));

            let mut model = Model::default();

            for op in ops {
                match op {
                    CacheOp::Set { key, value, ttl } => {
                        let expected = !model.is_live(&key);
                        let inserted = cache.set(key.clone(), value, ttl).await.unwrap();
                        prop_assert_eq!(inserted, expected, "set result for '{}'", key);
                        if expected {
                            model.insert(&key, value, ttl);
                        }
                    }
                    CacheOp::Put { key, value, ttl } => {
                        cache.put(key.clone(), value, ttl).await.unwrap();
                        model.insert(&key, value, ttl);
                    }
                    CacheOp::Get { key } => {
                        let expected = match model.entries.get(&key).copied() {
                            Some((value, false)) => Some(value),
                            Some((_, true)) => {
                                model.remove(&key);
                                None
                            }
                            None => None,
                        };
                        prop_assert_eq!(cache.get(&key).await.unwrap(), expected);
                    }
                    CacheOp::Delete { key } => {
                        let expected = matches!(model.remove(&key), Some((_, false)));
                        prop_assert_eq!(cache.delete(&key).await.unwrap(), expected);
                    }
                }
            }

            // Sweep completeness: only live entries survive
            let expired: Vec<String> = model
                .entries
                .iter()
                .filter(|(_, (_, expired))| *expired)
                .map(|(key, _)| key.clone())
                .collect();
            for key in &expired {
                model.remove(key);
            }
            prop_assert_eq!(cache.delete_expired().await, expired.len());
            prop_assert_eq!(cache.len().await, model.entries.len());

            for (key, (value, _)) in &model.entries {
                prop_assert_eq!(cache.get(key).await.unwrap(), Some(*value));
            }

            let recorded = evictions.lock().clone();
            prop_assert_eq!(sorted(recorded), sorted(model.evictions));
            Ok(())
        })?;
    }

    // A value stored with `put` is always the one read back, whatever was
    // stored under the key before.
    #[test]
    fn prop_put_then_get_returns_latest(
        key in key_strategy(),
        values in prop::collection::vec(any::<u32>(), 1..10)
    ) {
        runtime().block_on(async {
            let cache = Cache::new(TEST_DEFAULT_TTL);
            for value in &values {
                cache.put(key.clone(), *value, Ttl::Default).await.unwrap();
                prop_assert_eq!(cache.get(&key).await.unwrap(), Some(*value));
            }
            prop_assert_eq!(cache.len().await, 1);
            Ok(())
        })?;
    }

    // `set` on a live key never changes the stored value.
    #[test]
    fn prop_set_is_insert_once(
        key in key_strategy(),
        first in any::<u32>(),
        rest in prop::collection::vec(any::<u32>(), 1..10)
    ) {
        runtime().block_on(async {
            let cache = Cache::new(TEST_DEFAULT_TTL);
            prop_assert!(cache.set(key.clone(), first, Ttl::Default).await.unwrap());

            for value in rest {
                prop_assert!(!cache.set(key.clone(), value, Ttl::Default).await.unwrap());
            }
            prop_assert_eq!(cache.get(&key).await.unwrap(), Some(first));
            Ok(())
        })?;
    }
}
