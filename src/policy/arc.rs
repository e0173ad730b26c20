//! Adaptive cache combining an LRU part and an LFU part (ARC).
//!
//! New keys enter the recency-ordered LRU part. A key that keeps getting
//! read there is promoted into the frequency-ordered LFU part. Each part
//! remembers the keys it evicted in its own ghost list; a later request for
//! one of those keys shows that the part was too small, so one slot of
//! capacity moves over to it from the other part.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────────────┐
//! │                            ArcCache<K, V>                                │
//! │                                                                          │
//! │   ┌──────────────────────────────┐    ┌──────────────────────────────┐   │
//! │   │ Mutex<ArcLruPart>  (lock #1) │    │ Mutex<ArcLfuPart>  (lock #2) │   │
//! │   │                              │    │                              │   │
//! │   │  main: LruCore<K, V>         │    │  main: LfuCore<K, V>         │   │
//! │   │   head ─► [x] ◄─► [y] ◄ tail │    │   freq=1: [p] [q]            │   │
//! │   │                              │    │   freq=3: [r]                │   │
//! │   │  ghost: GhostList<K>         │    │  ghost: GhostList<K>         │   │
//! │   │   [a] [b] [c]   (keys only)  │    │   [d] [e]       (keys only)  │   │
//! │   └──────────────┬───────────────┘    └──────────────▲───────────────┘   │
//! │                  │   access_count >= transform_threshold                 │
//! │                  └──────────────── promotion ────────┘                   │
//! └──────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flows
//!
//! ```text
//!   put(k, v) / get(k):
//!     1. lock LRU part, then LFU part (always in this order)
//!     2. k in LRU ghost?  consume it; if LFU capacity > 0: LFU -1, LRU +1
//!        k in LFU ghost?  consume it; if LRU capacity > 0: LRU -1, LFU +1
//!     3. put: k resident in LFU part → update there, else → LRU part
//!        get: LRU hit → count access, promote once count >= threshold
//!             LRU miss → LFU part
//! ```
//!
//! A key's access count starts at 1 when it is admitted, so with threshold
//! `T` the promotion happens on the `T - 1`th read after the `put`.
//!
//! The configured capacity is split between the parts (the LRU part takes
//! the odd slot) and transfers conserve the sum, so [`ArcCache::capacity`]
//! always reports the configured figure. Each ghost list holds up to the
//! full configured capacity of keys.
//!
//! ## Example
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache = ArcCache::with_transform_threshold(4, 2);
//! cache.put("k", 1);
//! assert!(cache.is_in_lru_part(&"k"));
//!
//! cache.get(&"k"); // second access reaches the threshold
//! assert!(cache.is_in_lfu_part(&"k"));
//! assert_eq!(cache.get(&"k"), Some(1));
//! ```
use std::hash::Hash;

use parking_lot::{Mutex, MutexGuard};

use crate::ds::ghost_list::GhostList;
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, MetricsSnapshotProvider, PolicyMetrics};
use crate::policy::lfu::LfuCore;
use crate::policy::lru::LruCore;
use crate::traits::{CachePolicy, CoreCache, LfuCacheTrait, LruCacheTrait, MutableCache};

/// Promotion threshold used by [`ArcCache::new`].
pub const DEFAULT_TRANSFORM_THRESHOLD: usize = 2;

#[derive(Debug)]
struct ArcLruPart<K, V> {
    main: LruCore<K, V>,
    ghost: GhostList<K>,
    transform_threshold: u64,
    // cache-level counters, guarded by the first lock
    #[cfg(feature = "metrics")]
    events: PolicyMetrics,
}

impl<K, V> ArcLruPart<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize, ghost_capacity: usize, transform_threshold: usize) -> Self {
        Self {
            main: LruCore::new(capacity),
            ghost: GhostList::new(ghost_capacity),
            transform_threshold: transform_threshold as u64,
            #[cfg(feature = "metrics")]
            events: PolicyMetrics::new(),
        }
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    /// Inserts or updates; a full part first evicts its LRU entry into the
    /// ghost list.
    fn put(&mut self, key: K, value: V) {
        if !self.main.contains(&key) && self.main.len() >= self.main.capacity() {
            self.evict_to_ghost();
        }
        self.main.insert(key, value);
    }

    fn evict_to_ghost(&mut self) {
        if let Some((key, _)) = self.main.pop_lru() {
            self.ghost.record(key);
        }
    }

    fn increase_capacity(&mut self) {
        let capacity = self.main.capacity() + 1;
        self.main.resize(capacity);
    }

    fn decrease_capacity(&mut self) -> bool {
        let capacity = self.main.capacity();
        if capacity == 0 {
            return false;
        }
        for (key, _) in self.main.resize(capacity - 1) {
            self.ghost.record(key);
        }
        true
    }
}

impl<K, V> ArcLruPart<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Reads `key`, returning its value and whether it is due for promotion.
    fn get(&mut self, key: &K) -> Option<(V, bool)> {
        let value = self.main.get(key)?.clone();
        let count = self.main.access_count(key).unwrap_or(1);
        Some((value, count >= self.transform_threshold))
    }
}

#[derive(Debug)]
struct ArcLfuPart<K, V> {
    main: LfuCore<K, V>,
    ghost: GhostList<K>,
}

impl<K, V> ArcLfuPart<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize, ghost_capacity: usize) -> Self {
        Self {
            main: LfuCore::new(capacity),
            ghost: GhostList::new(ghost_capacity),
        }
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    fn put(&mut self, key: K, value: V) {
        if !self.main.contains(&key) && self.main.len() >= self.main.capacity() {
            self.evict_to_ghost();
        }
        self.main.insert(key, value);
    }

    fn evict_to_ghost(&mut self) {
        if let Some((key, _)) = self.main.pop_lfu() {
            self.ghost.record(key);
        }
    }

    fn increase_capacity(&mut self) {
        let capacity = self.main.capacity() + 1;
        self.main.resize(capacity);
    }

    fn decrease_capacity(&mut self) -> bool {
        let capacity = self.main.capacity();
        if capacity == 0 {
            return false;
        }
        for (key, _) in self.main.resize(capacity - 1) {
            self.ghost.record(key);
        }
        true
    }
}

/// Thread-safe adaptive cache with one lock per part.
#[derive(Debug)]
pub struct ArcCache<K, V> {
    lru: Mutex<ArcLruPart<K, V>>,
    lfu: Mutex<ArcLfuPart<K, V>>,
    capacity: usize,
    transform_threshold: usize,
}

/// Initial `(lru, lfu)` split of `capacity`.
fn initial_split(capacity: usize) -> (usize, usize) {
    let lfu = capacity / 2;
    (capacity - lfu, lfu)
}

impl<K, V> ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an ARC cache with [`DEFAULT_TRANSFORM_THRESHOLD`].
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        Self::with_transform_threshold(capacity, DEFAULT_TRANSFORM_THRESHOLD)
    }

    /// # Panics
    ///
    /// Panics if `capacity` or `transform_threshold` is zero.
    pub fn with_transform_threshold(capacity: usize, transform_threshold: usize) -> Self {
        match Self::try_new(capacity, transform_threshold) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates an ARC cache holding at most `capacity` entries across both
    /// parts.
    pub fn try_new(capacity: usize, transform_threshold: usize) -> Result<Self, ConfigError> {
        ConfigError::require_positive("capacity", capacity)?;
        ConfigError::require_positive("transform_threshold", transform_threshold)?;
        let (lru_capacity, lfu_capacity) = initial_split(capacity);
        Ok(Self {
            lru: Mutex::new(ArcLruPart::new(lru_capacity, capacity, transform_threshold)),
            lfu: Mutex::new(ArcLfuPart::new(lfu_capacity, capacity)),
            capacity,
            transform_threshold,
        })
    }

    pub fn transform_threshold(&self) -> usize {
        self.transform_threshold
    }

    pub fn lru_len(&self) -> usize {
        self.lru.lock().main.len()
    }

    pub fn lfu_len(&self) -> usize {
        self.lfu.lock().main.len()
    }

    pub fn lru_capacity(&self) -> usize {
        self.lru.lock().capacity()
    }

    pub fn lfu_capacity(&self) -> usize {
        self.lfu.lock().capacity()
    }

    pub fn lru_ghost_len(&self) -> usize {
        self.lru.lock().ghost.len()
    }

    pub fn lfu_ghost_len(&self) -> usize {
        self.lfu.lock().ghost.len()
    }

    pub fn is_in_lru_part(&self, key: &K) -> bool {
        self.lru.lock().main.contains(key)
    }

    pub fn is_in_lfu_part(&self, key: &K) -> bool {
        self.lfu.lock().main.contains(key)
    }

    pub fn is_lru_ghost(&self, key: &K) -> bool {
        self.lru.lock().ghost.contains(key)
    }

    pub fn is_lfu_ghost(&self, key: &K) -> bool {
        self.lfu.lock().ghost.contains(key)
    }

    /// Checks both parts plus the cross-part rules: no key resident in both
    /// parts, no ghost that is also resident, and conserved total capacity.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        let (lru, lfu) = self.lock_parts();
        lru.main.check_invariants()?;
        lru.ghost.check_invariants()?;
        lfu.main.check_invariants()?;
        lfu.ghost.check_invariants()?;

        if lru.capacity() + lfu.capacity() != self.capacity {
            return Err(InvariantError::new(format!(
                "part capacities {} + {} do not sum to {}",
                lru.capacity(),
                lfu.capacity(),
                self.capacity
            )));
        }
        if lru.main.len() + lfu.main.len() > self.capacity {
            return Err(InvariantError::new("resident entries exceed capacity"));
        }
        if lru.main.keys().any(|key| lfu.main.contains(key)) {
            return Err(InvariantError::new("key resident in both parts"));
        }
        let resident = |key: &K| lru.main.contains(key) || lfu.main.contains(key);
        if lru.ghost.iter().chain(lfu.ghost.iter()).any(resident) {
            return Err(InvariantError::new("ghost key is also resident"));
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        let (lru, lfu) = self.lock_parts();
        let mut snap = lru.events.snapshot(
            lru.main.len() + lfu.main.len(),
            lru.capacity() + lfu.capacity(),
        );
        snap.evicted_entries = lru.main.metrics_snapshot().evicted_entries
            + lfu.main.metrics_snapshot().evicted_entries;
        snap
    }

    /// Takes both part locks in the one fixed order.
    fn lock_parts(&self) -> (MutexGuard<'_, ArcLruPart<K, V>>, MutexGuard<'_, ArcLfuPart<K, V>>) {
        let lru = self.lru.lock();
        let lfu = self.lfu.lock();
        (lru, lfu)
    }

    /// Consumes any ghost record of `key` and moves one unit of capacity
    /// toward the part that recorded it.
    fn consume_ghosts(lru: &mut ArcLruPart<K, V>, lfu: &mut ArcLfuPart<K, V>, key: &K) {
        if lru.ghost.remove(key) {
            #[cfg(feature = "metrics")]
            lru.events.record_ghost_hit();
            if lfu.decrease_capacity() {
                lru.increase_capacity();
                #[cfg(feature = "metrics")]
                lru.events.record_capacity_transfer();
                tracing::debug!(
                    lru_capacity = lru.capacity(),
                    lfu_capacity = lfu.capacity(),
                    "arc lru ghost hit; capacity moved from lfu to lru"
                );
            }
        }
        if lfu.ghost.remove(key) {
            #[cfg(feature = "metrics")]
            lru.events.record_ghost_hit();
            if lru.decrease_capacity() {
                lfu.increase_capacity();
                #[cfg(feature = "metrics")]
                lru.events.record_capacity_transfer();
                tracing::debug!(
                    lru_capacity = lru.capacity(),
                    lfu_capacity = lfu.capacity(),
                    "arc lfu ghost hit; capacity moved from lru to lfu"
                );
            }
        }
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider for ArcCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> MetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> CachePolicy<K, V> for ArcCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
    fn put(&self, key: K, value: V) {
        let (mut lru, mut lfu) = self.lock_parts();
        Self::consume_ghosts(&mut lru, &mut lfu, &key);

        #[cfg(feature = "metrics")]
        if lru.main.contains(&key) || lfu.main.contains(&key) {
            lru.events.record_insert_update();
        } else {
            lru.events.record_insert_new();
        }

        if lfu.main.contains(&key) {
            lfu.put(key, value);
        } else if lru.capacity() > 0 {
            lru.put(key, value);
        } else {
            // every slot has moved to the LFU part; admit there
            lfu.put(key, value);
        }
    }

    fn get(&self, key: &K) -> Option<V> {
        let (mut lru, mut lfu) = self.lock_parts();
        Self::consume_ghosts(&mut lru, &mut lfu, key);

        if let Some((value, due)) = lru.get(key) {
            #[cfg(feature = "metrics")]
            lru.events.record_get_hit();
            if due && lfu.capacity() > 0 {
                if let Some(promoted) = lru.main.remove(key) {
                    lfu.put(key.clone(), promoted);
                    #[cfg(feature = "metrics")]
                    lru.events.record_promotion();
                    tracing::debug!(
                        lfu_len = lfu.main.len(),
                        "arc promoted key from lru part to lfu part"
                    );
                }
            }
            return Some(value);
        }

        let found = lfu.main.get(key).cloned();
        #[cfg(feature = "metrics")]
        match found {
            Some(_) => lru.events.record_get_hit(),
            None => lru.events.record_get_miss(),
        }
        found
    }

    fn remove(&self, key: &K) -> Option<V> {
        let (mut lru, mut lfu) = self.lock_parts();
        let removed = match lru.main.remove(key) {
            Some(value) => Some(value),
            None => lfu.main.remove(key),
        };
        match removed {
            Some(_) => {
                #[cfg(feature = "metrics")]
                lru.events.record_removal();
            },
            None => tracing::warn!("arc remove called for a key that is not resident"),
        }
        removed
    }

    /// Clears both parts and their ghosts, restores the initial split and
    /// resets the counters.
    fn purge(&self) {
        let (mut lru, mut lfu) = self.lock_parts();
        let (lru_capacity, lfu_capacity) = initial_split(self.capacity);
        lru.main.clear();
        lru.main.resize(lru_capacity);
        lru.ghost.clear();
        lfu.main.clear();
        lfu.main.resize(lfu_capacity);
        lfu.ghost.clear();
        #[cfg(feature = "metrics")]
        {
            lru.events.reset();
            lru.main.reset_metrics();
            lfu.main.reset_metrics();
        }
    }

    fn contains(&self, key: &K) -> bool {
        let (lru, lfu) = self.lock_parts();
        lru.main.contains(key) || lfu.main.contains(key)
    }

    fn len(&self) -> usize {
        let (lru, lfu) = self.lock_parts();
        lru.main.len() + lfu.main.len()
    }

    /// The configured capacity; transfers between the parts conserve it.
    fn capacity(&self) -> usize {
        self.capacity
    }
}
