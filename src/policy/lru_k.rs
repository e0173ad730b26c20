//! # LRU-K Cache (admission by repeated access)
//!
//! A key has to be seen `k` times before it may occupy the main LRU store. Until
//! then its access count lives in a separate, independently sized LRU
//! *history* queue and its value waits in a pending map. A single pass of a
//! scan therefore touches every key once and evicts nothing hot.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                         LruKCache<K, V>                              │
//!   │                                                                      │
//!   │   Mutex<LruKCore<K, V>>                                              │
//!   │     │                                                                │
//!   │     ├── main: LruCore<K, V>        admitted entries (capacity)       │
//!   │     │     head ─► [hot_1] ◄─► [hot_2] ◄─ tail                        │
//!   │     │                                                                │
//!   │     ├── history: LruCore<K, u64>   access counts (history_capacity)  │
//!   │     │     [scan_9]=1  [page_4]=1  [page_2]=1                         │
//!   │     │                                                                │
//!   │     └── pending: FxHashMap<K, V>   values waiting for admission      │
//!   │           page_4 → v4                                                │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flows
//!
//! ```text
//!   get(k):  main hit → value
//!            else count += 1 in history (new keys start at 1)
//!                 pending value and count >= K → move into main
//!                 else → pending value, if any
//!
//!   put(k):  resident in main → update in place
//!            else stash in pending, count += 1, admit once count >= K
//! ```
//!
//! When the history queue forgets a key, its pending value goes with it.
//! `contains` and `len` describe the main store only.
//!
//! ## Example
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache = LruKCache::new(2, 8, 2);
//! cache.put("page", 1);
//! assert!(!cache.contains(&"page")); // seen once
//!
//! assert_eq!(cache.get(&"page"), Some(1)); // second access admits it
//! assert!(cache.contains(&"page"));
//! ```
use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, MetricsSnapshotProvider, PolicyMetrics};
use crate::policy::lru::LruCore;
use crate::traits::{CachePolicy, CoreCache, LruCacheTrait, MutableCache};

/// Single-threaded LRU-K core.
#[derive(Debug)]
pub struct LruKCore<K, V> {
    main: LruCore<K, V>,
    history: LruCore<K, u64>,
    pending: FxHashMap<K, V>,
    k: u64,
    #[cfg(feature = "metrics")]
    metrics: PolicyMetrics,
}

impl<K, V> LruKCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a core; `capacity`, `history_capacity` and `k` are each
    /// clamped to at least 1.
    pub fn new(capacity: usize, history_capacity: usize, k: usize) -> Self {
        Self {
            main: LruCore::new(capacity.max(1)),
            history: LruCore::new(history_capacity.max(1)),
            pending: FxHashMap::default(),
            k: k.max(1) as u64,
            #[cfg(feature = "metrics")]
            metrics: PolicyMetrics::new(),
        }
    }

    pub fn k(&self) -> u64 {
        self.k
    }

    pub fn history_capacity(&self) -> usize {
        self.history.capacity()
    }

    /// Recorded accesses of a key that has not been admitted yet.
    pub fn history_count(&self, key: &K) -> Option<u64> {
        self.history.peek(key).copied()
    }

    /// Number of values waiting for admission.
    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Reads an admitted value without touching recency.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.main.peek(key)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.main.check_invariants()?;
        self.history.check_invariants()?;
        for key in self.pending.keys() {
            if !self.history.contains(key) {
                return Err(InvariantError::new("pending value without a history record"));
            }
            if self.main.contains(key) {
                return Err(InvariantError::new("pending value for an admitted key"));
            }
        }
        if self.history.keys().any(|key| self.main.contains(key)) {
            return Err(InvariantError::new("admitted key still in history"));
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let mut snap = self.metrics.snapshot(self.main.len(), self.main.capacity());
        snap.evicted_entries = self.main.metrics_snapshot().evicted_entries;
        snap
    }

    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
        self.main.reset_metrics();
        self.history.reset_metrics();
    }

    /// Counts one access of a non-admitted key and returns the new count.
    fn bump_history(&mut self, key: &K) -> u64 {
        if let Some(count) = self.history.get_mut(key) {
            *count = count.saturating_add(1);
            return *count;
        }
        if self.history.len() >= self.history.capacity() {
            if let Some((forgotten, _)) = self.history.pop_lru() {
                if self.pending.remove(&forgotten).is_some() {
                    tracing::trace!("lru-k history full; dropped a pending value");
                }
            }
        }
        self.history.insert(key.clone(), 1);
        1
    }

    /// Moves a pending value into the main store once its count reaches `k`.
    fn admit_if_due(&mut self, key: &K, count: u64) -> bool {
        if count < self.k {
            return false;
        }
        let Some(value) = self.pending.remove(key) else {
            return false;
        };
        self.history.remove(key);
        self.main.insert(key.clone(), value);
        #[cfg(feature = "metrics")]
        self.metrics.record_promotion();
        tracing::trace!(count, "lru-k admitted key into main store");
        true
    }
}

impl<K, V> CoreCache<K, V> for LruKCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.main.contains(&key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();
            return self.main.insert(key, value);
        }

        let previous = self.pending.insert(key.clone(), value);
        #[cfg(feature = "metrics")]
        match previous {
            Some(_) => self.metrics.record_insert_update(),
            None => self.metrics.record_insert_new(),
        }
        let count = self.bump_history(&key);
        self.admit_if_due(&key, count);
        previous
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.main.contains(key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();
            return self.main.get(key);
        }

        let count = self.bump_history(key);
        if self.admit_if_due(key, count) {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_hit();
            return self.main.peek(key);
        }

        #[cfg(feature = "metrics")]
        if self.pending.contains_key(key) {
            self.metrics.record_get_hit();
        } else {
            self.metrics.record_get_miss();
        }
        self.pending.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.main.contains(key)
    }

    fn len(&self) -> usize {
        self.main.len()
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    fn clear(&mut self) {
        self.main.clear();
        self.history.clear();
        self.pending.clear();
    }
}

impl<K, V> MutableCache<K, V> for LruKCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        self.history.remove(key);
        let pending = self.pending.remove(key);
        let removed = self.main.remove(key).or(pending);
        #[cfg(feature = "metrics")]
        if removed.is_some() {
            self.metrics.record_removal();
        }
        removed
    }
}

/// Thread-safe LRU-K cache.
#[derive(Debug)]
pub struct LruKCache<K, V> {
    inner: Mutex<LruKCore<K, V>>,
}

impl<K, V> LruKCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// # Panics
    ///
    /// Panics if any argument is zero.
    pub fn new(capacity: usize, history_capacity: usize, k: usize) -> Self {
        match Self::try_new(capacity, history_capacity, k) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates an LRU-K cache. `capacity` sizes the main store,
    /// `history_capacity` the queue of not-yet-admitted keys, and `k` is the
    /// number of accesses required for admission.
    pub fn try_new(capacity: usize, history_capacity: usize, k: usize) -> Result<Self, ConfigError> {
        ConfigError::require_positive("capacity", capacity)?;
        ConfigError::require_positive("history_capacity", history_capacity)?;
        ConfigError::require_positive("k", k)?;
        Ok(Self {
            inner: Mutex::new(LruKCore::new(capacity, history_capacity, k)),
        })
    }

    pub fn k(&self) -> u64 {
        self.inner.lock().k()
    }

    pub fn history_capacity(&self) -> usize {
        self.inner.lock().history_capacity()
    }

    pub fn history_count(&self, key: &K) -> Option<u64> {
        self.inner.lock().history_count(key)
    }

    pub fn pending_len(&self) -> usize {
        self.inner.lock().pending_len()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

impl<K, V> LruKCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider for LruKCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> MetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> CachePolicy<K, V> for LruKCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn put(&self, key: K, value: V) {
        self.inner.lock().insert(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
    }

    fn remove(&self, key: &K) -> Option<V> {
        let removed = self.inner.lock().remove(key);
        if removed.is_none() {
            tracing::warn!("lru-k remove called for a key that is not resident");
        }
        removed
    }

    fn purge(&self) {
        let mut inner = self.inner.lock();
        inner.clear();
        #[cfg(feature = "metrics")]
        inner.reset_metrics();
    }

    fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    fn len(&self) -> usize {
        self.inner.lock().len()
    }

    fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }
}
