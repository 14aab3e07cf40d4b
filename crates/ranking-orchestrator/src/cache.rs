//! TTL cache with single-flight loads.
//!
//! A key has at most one load in flight. Callers arriving while it runs join
//! the same shared future, and the loader itself runs on a spawned task so a
//! dropped caller never cancels it for the others. Only successful loads are
//! stored; a failure reaches every joined caller and the next call retries.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use ranking_core::RankingError;
use tokio::time::Instant;

type SharedLoad<T> = Shared<BoxFuture<'static, Result<Arc<T>, RankingError>>>;

/// Stand-in expiry for a TTL too large to add to the current instant
const FAR_FUTURE: Duration = Duration::from_secs(100 * 365 * 24 * 60 * 60);

fn expiry(ttl: Duration) -> Instant {
    let now = Instant::now();
    now.checked_add(ttl)
        .or_else(|| now.checked_add(FAR_FUTURE))
        .unwrap_or(now)
}

/// Internal cache entry with expiry
struct CacheEntry<T> {
    data: Arc<T>,
    expires_at: Instant,
    updated_at: DateTime<Utc>,
}

struct PendingLoad<T> {
    id: u64,
    future: SharedLoad<T>,
}

/// A cached value and when it was stored
#[derive(Debug, Clone)]
pub struct CachedValue<T> {
    pub data: Arc<T>,
    pub updated_at: DateTime<Utc>,
}

struct CacheState<T> {
    entries: DashMap<String, CacheEntry<T>>,
    pending: DashMap<String, PendingLoad<T>>,
    next_load_id: AtomicU64,
}

impl<T> CacheState<T> {
    fn fresh(&self, key: &str) -> Option<Arc<T>> {
        self.entries
            .get(key)
            .filter(|entry| Instant::now() < entry.expires_at)
            .map(|entry| entry.data.clone())
    }

    /// Store a finished load unless it was cleared or superseded meanwhile.
    /// The pending read guard is held across the insert so `clear` cannot
    /// interleave.
    fn store_if_current(&self, key: &str, id: u64, data: Arc<T>, ttl: Duration) -> bool {
        match self.pending.get(key) {
            Some(pending) if pending.id == id => {
                self.entries.insert(
                    key.to_string(),
                    CacheEntry {
                        data,
                        expires_at: expiry(ttl),
                        updated_at: Utc::now(),
                    },
                );
                true
            }
            _ => false,
        }
    }

    /// Drop the pending registration only if it still belongs to load `id`
    fn finish_load(&self, key: &str, id: u64) {
        self.pending.remove_if(key, |_, pending| pending.id == id);
    }
}

pub struct TtlCache<T> {
    state: Arc<CacheState<T>>,
    load_timeout: Duration,
}

impl<T> Clone for TtlCache<T> {
    fn clone(&self) -> Self {
        Self {
            state: self.state.clone(),
            load_timeout: self.load_timeout,
        }
    }
}

impl<T> TtlCache<T>
where
    T: Send + Sync + 'static,
{
    /// Create an empty cache; every load is cut off after `load_timeout`
    pub fn new(load_timeout: Duration) -> Self {
        Self {
            state: Arc::new(CacheState {
                entries: DashMap::new(),
                pending: DashMap::new(),
                next_load_id: AtomicU64::new(0),
            }),
            load_timeout,
        }
    }

    /// Return the live value for `key`, join the load in flight, or start one.
    ///
    /// `loader` is only called when this caller starts the load, and then
    /// on the spawned task, never under a map lock.
    pub async fn fetch_with_cache<F, Fut>(
        &self,
        key: &str,
        ttl: Duration,
        loader: F,
    ) -> Result<Arc<T>, RankingError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RankingError>> + Send + 'static,
    {
        if let Some(data) = self.state.fresh(key) {
            tracing::debug!("Cache hit for '{}'", key);
            return Ok(data);
        }

        let load = match self.state.pending.entry(key.to_string()) {
            Entry::Occupied(pending) => {
                tracing::debug!("Joining in-flight load for '{}'", key);
                pending.get().future.clone()
            }
            Entry::Vacant(slot) => {
                // A load may have landed between the first check and taking the slot
                if let Some(data) = self.state.fresh(key) {
                    return Ok(data);
                }
                let id = self.state.next_load_id.fetch_add(1, Ordering::Relaxed);
                let future = self.spawn_load(key.to_string(), id, ttl, loader);
                slot.insert(PendingLoad {
                    id,
                    future: future.clone(),
                });
                future
            }
        };

        load.await
    }

    fn spawn_load<F, Fut>(&self, key: String, id: u64, ttl: Duration, loader: F) -> SharedLoad<T>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, RankingError>> + Send + 'static,
    {
        let state = self.state.clone();
        let load_timeout = self.load_timeout;
        let task_key = key.clone();

        let handle = tokio::spawn(async move {
            let key = task_key;
            let started = Instant::now();
            tracing::info!("Loading '{}'", key);

            let result = match tokio::time::timeout(load_timeout, loader()).await {
                Ok(Ok(value)) => {
                    let data = Arc::new(value);
                    if state.store_if_current(&key, id, data.clone(), ttl) {
                        tracing::info!("Loaded '{}' in {:?}", key, started.elapsed());
                    } else {
                        tracing::debug!("Discarding load for '{}' finished after a clear", key);
                    }
                    Ok(data)
                }
                Ok(Err(e)) => {
                    tracing::warn!("Load for '{}' failed: {}", key, e);
                    Err(e)
                }
                Err(_) => {
                    tracing::warn!("Load for '{}' timed out after {:?}", key, load_timeout);
                    Err(RankingError::Timeout {
                        key: key.clone(),
                        secs: load_timeout.as_secs(),
                    })
                }
            };

            state.finish_load(&key, id);
            result
        });

        let state = self.state.clone();
        async move {
            let joined = handle.await;
            // Covers a panicking loader, which never reaches its own cleanup
            state.finish_load(&key, id);
            joined.unwrap_or_else(|e| Err(RankingError::TaskFailed(e.to_string())))
        }
        .boxed()
        .shared()
    }

    /// Stored value for `key`, expired or not
    pub fn read(&self, key: &str) -> Option<CachedValue<T>> {
        self.state.entries.get(key).map(|entry| CachedValue {
            data: entry.data.clone(),
            updated_at: entry.updated_at,
        })
    }

    /// Store `value` directly, bypassing any loader
    pub fn write(&self, key: &str, value: T, ttl: Duration) -> Arc<T> {
        let data = Arc::new(value);
        self.state.entries.insert(
            key.to_string(),
            CacheEntry {
                data: data.clone(),
                expires_at: expiry(ttl),
                updated_at: Utc::now(),
            },
        );
        data
    }

    pub fn is_loading(&self, key: &str) -> bool {
        self.state.pending.contains_key(key)
    }

    /// Forget every entry and pending registration
    pub fn clear(&self) {
        // Pending first: a load holding its pending guard finishes its
        // store before the entries are wiped.
        self.state.pending.clear();
        self.state.entries.clear();
    }
}
