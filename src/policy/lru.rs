//! # Least Recently Used (LRU) Cache
//!
//! Pure-recency eviction: on overflow the entry touched longest ago leaves.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          LruCache<K, V>                              │
//!   │                                                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │                  Mutex<LruCore<K, V>>                        │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   │                               │                                      │
//!   │                               ▼                                      │
//!   │   ┌──────────────────────────────────────────────────────────────┐   │
//!   │   │  index: FxHashMap<K, SlotId>                                 │   │
//!   │   │    page_1 ───────────┐   page_2 ──────┐   page_3 ───┐        │   │
//!   │   │                      ▼                ▼             ▼        │   │
//!   │   │  list: IntrusiveList<Entry { key, value, access_count }>     │   │
//!   │   │    head ──► [page_1] ◄──► [page_2] ◄──► [page_3] ◄── tail    │   │
//!   │   │     (MRU)                                     (LRU)          │   │
//!   │   └──────────────────────────────────────────────────────────────┘   │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Operations
//!
//! ```text
//!   insert(D) on a full cache (capacity 3):
//!     head ──► [A] ◄──► [B] ◄──► [C] ◄── tail
//!     1. pop [C] from tail, drop its index slot
//!     2. push [D] at head
//!     head ──► [D] ◄──► [A] ◄──► [B] ◄── tail
//!
//!   get(B):
//!     move [B] to head, access_count += 1
//!     head ──► [B] ◄──► [D] ◄──► [A] ◄── tail
//! ```
//!
//! `insert` on a resident key replaces the value and moves it to the head
//! without counting an access. `peek` reads without reordering.
//!
//! ## Key Components
//!
//! | Component       | Description                                         |
//! |-----------------|-----------------------------------------------------|
//! | `LruCore<K, V>` | Single-threaded core; also used inside ARC and LRU-K |
//! | `LruCache<K, V>`| `parking_lot::Mutex` wrapper implementing `CachePolicy` |
//!
//! The core accepts any capacity, including 0 (a part that admits nothing);
//! the public [`LruCache`] rejects 0 at construction.
use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, MetricsSnapshotProvider, PolicyMetrics};
use crate::traits::{CachePolicy, CoreCache, LruCacheTrait, MutableCache};

#[derive(Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    access_count: u64,
}

/// Single-threaded LRU core.
#[derive(Debug)]
pub struct LruCore<K, V> {
    list: IntrusiveList<Entry<K, V>>,
    index: FxHashMap<K, SlotId>,
    capacity: usize,
    #[cfg(feature = "metrics")]
    metrics: PolicyMetrics,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a core holding at most `capacity` entries (0 admits nothing).
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
            #[cfg(feature = "metrics")]
            metrics: PolicyMetrics::new(),
        }
    }

    /// Reads `key` without changing its position or access count.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| &entry.value)
    }

    /// Mutable access counted as a use: moves `key` to the head.
    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        self.touch_slot(key).map(|entry| &mut entry.value)
    }

    /// Number of recorded uses: 1 on admission, +1 per `get`/`touch`.
    pub fn access_count(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|entry| entry.access_count)
    }

    /// Changes the capacity, evicting least recent entries until they fit.
    ///
    /// Returns the evicted entries, least recent first.
    pub fn resize(&mut self, capacity: usize) -> Vec<(K, V)> {
        self.capacity = capacity;
        let mut evicted = Vec::new();
        while self.index.len() > self.capacity {
            match self.pop_lru() {
                Some(pair) => evicted.push(pair),
                None => break,
            }
        }
        evicted
    }

    /// Entries from most to least recently used.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.list.iter().map(|entry| (&entry.key, &entry.value))
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.list.iter().map(|entry| &entry.key)
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_invariants()?;
        if self.list.len() != self.index.len() {
            return Err(InvariantError::new(format!(
                "lru list holds {} entries but index holds {}",
                self.list.len(),
                self.index.len()
            )));
        }
        if self.index.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "lru holds {} entries over capacity {}",
                self.index.len(),
                self.capacity
            )));
        }
        for (key, &id) in &self.index {
            match self.list.get(id) {
                Some(entry) if entry.key == *key => {},
                _ => return Err(InvariantError::new("lru index points at the wrong node")),
            }
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.index.len(), self.capacity)
    }

    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    /// Resolves `key` to a live slot, dropping an index entry whose node is
    /// gone.
    fn slot_for(&mut self, key: &K) -> Option<SlotId> {
        let id = *self.index.get(key)?;
        if self.list.contains(id) {
            return Some(id);
        }
        tracing::error!(slot = id.index(), "lru index entry has no list node; dropping it");
        self.index.remove(key);
        None
    }

    fn touch_slot(&mut self, key: &K) -> Option<&mut Entry<K, V>> {
        let Some(id) = self.slot_for(key) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        };
        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();

        self.list.move_to_front(id);
        let entry = self.list.get_mut(id)?;
        entry.access_count = entry.access_count.saturating_add(1);
        Some(entry)
    }
}

impl<K, V> CoreCache<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(id) = self.slot_for(&key) {
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();

            let entry = self.list.get_mut(id)?;
            let previous = std::mem::replace(&mut entry.value, value);
            self.list.move_to_front(id);
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        if self.index.len() >= self.capacity {
            self.pop_lru();
        }
        let id = self.list.push_front(Entry {
            key: key.clone(),
            value,
            access_count: 1,
        });
        self.index.insert(key, id);
        None
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        self.touch_slot(key).map(|entry| &entry.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.index.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }
}

impl<K, V> MutableCache<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.slot_for(key)?;
        self.index.remove(key);
        let entry = self.list.remove(id)?;
        #[cfg(feature = "metrics")]
        self.metrics.record_removal();
        Some(entry.value)
    }
}

impl<K, V> LruCacheTrait<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lru(&mut self) -> Option<(K, V)> {
        let entry = self.list.pop_back()?;
        self.index.remove(&entry.key);
        #[cfg(feature = "metrics")]
        self.metrics.record_eviction();
        tracing::trace!(access_count = entry.access_count, "lru evicted tail entry");
        Some((entry.key, entry.value))
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back().map(|entry| (&entry.key, &entry.value))
    }

    fn touch(&mut self, key: &K) -> bool {
        self.touch_slot(key).is_some()
    }
}

/// Thread-safe LRU cache: one [`LruCore`] behind a `parking_lot::Mutex`.
///
/// # Example
///
/// ```
/// use evictkit::prelude::*;
///
/// let cache = LruCache::new(2);
/// cache.put("a", 1);
/// cache.put("b", 2);
/// cache.get(&"a");
/// cache.put("c", 3); // evicts "b"
///
/// assert!(cache.contains(&"a"));
/// assert!(!cache.contains(&"b"));
/// ```
#[derive(Debug)]
pub struct LruCache<K, V> {
    inner: Mutex<LruCore<K, V>>,
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LRU cache.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero. Use [`try_new`](Self::try_new) to get a
    /// `ConfigError` instead.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates an LRU cache, rejecting a zero capacity.
    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        ConfigError::require_positive("capacity", capacity)?;
        Ok(Self {
            inner: Mutex::new(LruCore::new(capacity)),
        })
    }

    /// Access count of a resident key.
    pub fn access_count(&self, key: &K) -> Option<u64> {
        self.inner.lock().access_count(key)
    }

    /// Removes and returns the least recently used entry.
    pub fn pop_lru(&self) -> Option<(K, V)> {
        self.inner.lock().pop_lru()
    }

    /// Keys from most to least recently used.
    pub fn keys(&self) -> Vec<K> {
        self.inner.lock().keys().cloned().collect()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

impl<K, V> LruCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Reads `key` without updating recency.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider for LruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> MetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> CachePolicy<K, V> for LruCache<K, V>
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
            tracing::warn!("lru remove called for a key that is not resident");
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
