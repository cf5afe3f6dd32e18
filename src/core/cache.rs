//! Session-scoped query cache with staleness windows and in-flight deduplication.

use anyhow::anyhow;
use futures::future::{BoxFuture, FutureExt, Shared};
use std::collections::HashMap;
use std::fmt::Debug;
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::debug;

type InFlight<V> = Shared<BoxFuture<'static, Result<V, String>>>;

struct CacheEntry<V> {
    value: V,
    updated_at: Instant,
}

struct Entries<K, V> {
    values: HashMap<K, CacheEntry<V>>,
    in_flight: HashMap<K, (u64, InFlight<V>)>,
}

/// Only successful values are stored; a failed fetch leaves the previous value
/// in place so callers can keep showing it.
pub struct QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    inner: Arc<Mutex<Entries<K, V>>>,
    next_fetch_id: AtomicU64,
}

fn lock<K, V>(inner: &Mutex<Entries<K, V>>) -> MutexGuard<'_, Entries<K, V>> {
    inner.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<K, V> QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(Entries {
                values: HashMap::new(),
                in_flight: HashMap::new(),
            })),
            next_fetch_id: AtomicU64::new(0),
        }
    }

    /// Last successful value for `key`, regardless of age.
    pub fn get(&self, key: &K) -> Option<V> {
        lock(&self.inner).values.get(key).map(|e| e.value.clone())
    }

    /// Value for `key` only if it was stored less than `stale_time` ago.
    /// A zero `stale_time` never yields a value.
    pub fn get_fresh(&self, key: &K, stale_time: Duration) -> Option<V> {
        lock(&self.inner)
            .values
            .get(key)
            .filter(|e| e.updated_at.elapsed() < stale_time)
            .map(|e| e.value.clone())
    }

    pub fn is_fetching(&self, key: &K) -> bool {
        lock(&self.inner).in_flight.contains_key(key)
    }

    /// Returns the fresh cached value, or joins/starts a fetch for `key`.
    ///
    /// The fetch runs on its own task: dropping every caller does not cancel
    /// it, and its result still lands in the cache.
    pub async fn get_or_fetch<F, Fut>(
        &self,
        key: K,
        stale_time: Duration,
        fetcher: F,
    ) -> anyhow::Result<V>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = anyhow::Result<V>> + Send + 'static,
    {
        let shared = {
            let mut entries = lock(&self.inner);

            if let Some(entry) = entries
                .values
                .get(&key)
                .filter(|e| e.updated_at.elapsed() < stale_time)
            {
                debug!("Cache HIT for key: {:?}", key);
                return Ok(entry.value.clone());
            }

            if let Some((_, in_flight)) = entries.in_flight.get(&key) {
                debug!("Joining in-flight fetch for key: {:?}", key);
                in_flight.clone()
            } else {
                debug!("Cache MISS for key: {:?}", key);
                let fetch_id = self.next_fetch_id.fetch_add(1, Ordering::Relaxed);
                let fetch = fetcher();
                let inner = Arc::clone(&self.inner);
                let task_key = key.clone();

                let handle = tokio::spawn(async move {
                    let result = fetch.await.map_err(|e| format!("{e:#}"));
                    let mut entries = lock(&inner);
                    if let Ok(value) = &result {
                        debug!("Cache PUT for key: {:?}", task_key);
                        entries.values.insert(
                            task_key.clone(),
                            CacheEntry {
                                value: value.clone(),
                                updated_at: Instant::now(),
                            },
                        );
                    }
                    if entries
                        .in_flight
                        .get(&task_key)
                        .is_some_and(|(id, _)| *id == fetch_id)
                    {
                        entries.in_flight.remove(&task_key);
                    }
                    result
                });

                let shared = async move {
                    handle
                        .await
                        .unwrap_or_else(|e| Err(format!("Fetch task failed: {e}")))
                }
                .boxed()
                .shared();
                entries
                    .in_flight
                    .insert(key.clone(), (fetch_id, shared.clone()));
                shared
            }
        };

        shared.await.map_err(|e| anyhow!(e))
    }
}

impl<K, V> Default for QueryCache<K, V>
where
    K: Eq + Hash + Clone + Debug + Send + Sync + 'static,
    V: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
