//! Single-flight async memoization.
//!
//! Each key owns a [`tokio::sync::OnceCell`]. The first caller runs the
//! computation; every concurrent caller for the same key awaits that same
//! cell instead of recomputing. Results (including errors) are shared by
//! cloning, so callers typically store `Arc`s or `Result<Arc<_>, _>`.
//!
//! If the task running a computation is dropped mid-flight, the cell stays
//! empty and the next waiter runs its own computation.

use std::future::Future;
use std::hash::Hash;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::OnceCell;
use vize_carton::FxHashMap;

/// Keyed, single-flight async cache.
pub struct AsyncCache<K, V> {
    enabled: bool,
    entries: Mutex<FxHashMap<K, Arc<OnceCell<V>>>>,
}

impl<K, V> AsyncCache<K, V>
where
    K: Eq + Hash + Clone + std::fmt::Debug,
    V: Clone,
{
    /// Create a cache. A disabled cache runs every computation fresh.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            entries: Mutex::new(FxHashMap::default()),
        }
    }

    /// Whether results are memoized.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Return the memoized value for `key`, running `compute` at most once
    /// per key for the lifetime of the cache.
    pub async fn get_or_compute<F, Fut>(&self, key: K, compute: F) -> V
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = V>,
    {
        if !self.enabled {
            return compute().await;
        }

        let cell = {
            let mut entries = self.entries.lock();
            Arc::clone(
                entries
                    .entry(key.clone())
                    .or_insert_with(|| Arc::new(OnceCell::new())),
            )
        };

        if cell.initialized() {
            tracing::debug!("cache hit: {:?}", key);
        } else {
            tracing::debug!("cache miss: {:?}", key);
        }

        cell.get_or_init(compute).await.clone()
    }

    /// Whether a completed value is stored for `key`.
    pub fn contains(&self, key: &K) -> bool {
        self.entries
            .lock()
            .get(key)
            .is_some_and(|cell| cell.initialized())
    }

    /// Drop the entry for `key`. Callers already awaiting it keep their cell.
    pub fn invalidate(&self, key: &K) -> bool {
        self.entries.lock().remove(key).is_some()
    }

    /// Drop every entry whose key matches `predicate`. Returns the count removed.
    pub fn invalidate_where(&self, predicate: impl Fn(&K) -> bool) -> usize {
        let mut entries = self.entries.lock();
        let before = entries.len();
        entries.retain(|key, _| !predicate(key));
        before - entries.len()
    }

    /// Number of keys with an entry (completed or in flight).
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the cache has no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Drop all entries.
    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}
