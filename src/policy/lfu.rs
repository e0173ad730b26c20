//! # LFU (Least Frequently Used) Cache with Aging
//!
//! Evicts the entry with the lowest access count; ties go to the entry that
//! reached that count first. A running total of access counts bounds how hot
//! the cache may run: when the average count per entry passes the
//! configured ceiling, every count is lowered so that long-lived hot keys do
//! not permanently starve newer ones.
//!
//! ## Architecture
//!
//! ```text
//!   ┌──────────────────────────────────────────────────────────────────────┐
//!   │                          LfuCache<K, V>                              │
//!   │                                                                      │
//!   │   Mutex<LfuCore<K, V>>                                               │
//!   │     │                                                                │
//!   │     ├── buckets: FrequencyBuckets<K, V>                              │
//!   │     │     min_freq = 1                                               │
//!   │     │     freq=1: [page_3] [page_2]          (tail = oldest)         │
//!   │     │     freq=4: [page_7]                                           │
//!   │     │     freq=15: [page_1]                                          │
//!   │     │                                                                │
//!   │     ├── total_frequency = 1 + 1 + 4 + 15 = 21                        │
//!   │     └── max_average_frequency (aging ceiling)                        │
//!   └──────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Aging
//!
//! ```text
//!   every access: total += 1
//!   if total / len > max_average_frequency:
//!       each count -= max(1, max_average_frequency / 2), floor 1
//!       buckets rebuilt, min_freq recomputed
//!       total = sum of the new counts
//! ```
//!
//! Evicting or removing an entry subtracts its count from the total, so the
//! average always describes the entries that are actually resident.
//!
//! ## Example
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache = LfuCache::new(2);
//! cache.put(1, "v1");
//! cache.put(2, "v2");
//! cache.get(&2);
//! cache.put(3, "v3"); // key 1 has the lowest count
//!
//! assert!(!cache.contains(&1));
//! assert_eq!(cache.frequency(&2), Some(2));
//! ```
use std::hash::Hash;

use parking_lot::Mutex;

use crate::ds::frequency_buckets::FrequencyBuckets;
use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, MetricsSnapshotProvider, PolicyMetrics};
use crate::traits::{CachePolicy, CoreCache, LfuCacheTrait, MutableCache};

/// Aging ceiling used when none is configured; high enough that aging is
/// effectively off.
pub const DEFAULT_MAX_AVERAGE_FREQUENCY: u64 = 1_000_000;

/// Single-threaded LFU core.
#[derive(Debug)]
pub struct LfuCore<K, V> {
    buckets: FrequencyBuckets<K, V>,
    capacity: usize,
    max_average_frequency: u64,
    total_frequency: u64,
    #[cfg(feature = "metrics")]
    metrics: PolicyMetrics,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates a core with the default aging ceiling. Capacity 0 admits
    /// nothing.
    pub fn new(capacity: usize) -> Self {
        Self::with_max_average_frequency(capacity, DEFAULT_MAX_AVERAGE_FREQUENCY)
    }

    /// Creates a core that ages once the average count exceeds
    /// `max_average_frequency`. A ceiling of 0 is treated as 1.
    pub fn with_max_average_frequency(capacity: usize, max_average_frequency: u64) -> Self {
        Self {
            buckets: FrequencyBuckets::with_capacity(capacity),
            capacity,
            max_average_frequency: max_average_frequency.max(1),
            total_frequency: 0,
            #[cfg(feature = "metrics")]
            metrics: PolicyMetrics::new(),
        }
    }

    pub fn max_average_frequency(&self) -> u64 {
        self.max_average_frequency
    }

    /// Sum of the access counts of all resident entries.
    pub fn total_frequency(&self) -> u64 {
        self.total_frequency
    }

    /// `total_frequency / len`, or 0 when empty.
    pub fn average_frequency(&self) -> u64 {
        match self.buckets.len() {
            0 => 0,
            len => self.total_frequency / len as u64,
        }
    }

    /// Lowest access count among resident entries, or 1 when empty.
    pub fn min_frequency(&self) -> u64 {
        self.buckets.min_frequency()
    }

    /// Reads `key` without counting an access.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.buckets.get(key)
    }

    /// Changes the capacity, evicting lowest-count entries until they fit.
    pub fn resize(&mut self, capacity: usize) -> Vec<(K, V)> {
        self.capacity = capacity;
        let mut evicted = Vec::new();
        while self.buckets.len() > self.capacity {
            match self.pop_lfu() {
                Some(pair) => evicted.push(pair),
                None => break,
            }
        }
        evicted
    }

    /// Entries in eviction order with their counts.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V, u64)> {
        self.buckets.iter()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.buckets.check_invariants()?;
        if self.buckets.len() > self.capacity {
            return Err(InvariantError::new(format!(
                "lfu holds {} entries over capacity {}",
                self.buckets.len(),
                self.capacity
            )));
        }
        let actual = self.buckets.total_frequency();
        if actual != self.total_frequency {
            return Err(InvariantError::new(format!(
                "lfu running total {} disagrees with bucket sum {actual}",
                self.total_frequency
            )));
        }
        Ok(())
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.metrics.snapshot(self.buckets.len(), self.capacity)
    }

    #[cfg(feature = "metrics")]
    pub fn reset_metrics(&mut self) {
        self.metrics.reset();
    }

    fn record_access(&mut self) {
        self.total_frequency = self.total_frequency.saturating_add(1);
        if self.average_frequency() > self.max_average_frequency {
            self.age();
        }
    }

    fn age(&mut self) {
        let delta = (self.max_average_frequency / 2).max(1);
        let before = self.total_frequency;
        self.total_frequency = self.buckets.decay_by(delta);
        #[cfg(feature = "metrics")]
        self.metrics.record_aging();
        tracing::debug!(
            delta,
            before,
            after = self.total_frequency,
            min_frequency = self.buckets.min_frequency(),
            "lfu frequency aging"
        );
    }
}

impl<K, V> CoreCache<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.buckets.get_mut(&key) {
            let previous = std::mem::replace(slot, value);
            self.buckets.touch(&key);
            #[cfg(feature = "metrics")]
            self.metrics.record_insert_update();
            self.record_access();
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_insert_new();

        if self.buckets.len() >= self.capacity {
            self.pop_lfu();
        }
        self.buckets.insert(key, value);
        self.record_access();
        None
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.buckets.touch(key).is_none() {
            #[cfg(feature = "metrics")]
            self.metrics.record_get_miss();
            return None;
        }
        #[cfg(feature = "metrics")]
        self.metrics.record_get_hit();
        self.record_access();
        self.buckets.get(key)
    }

    fn contains(&self, key: &K) -> bool {
        self.buckets.contains(key)
    }

    fn len(&self) -> usize {
        self.buckets.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.buckets.clear();
        self.total_frequency = 0;
    }
}

impl<K, V> MutableCache<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let (value, freq) = self.buckets.remove(key)?;
        self.total_frequency = self.total_frequency.saturating_sub(freq);
        #[cfg(feature = "metrics")]
        self.metrics.record_removal();
        Some(value)
    }
}

impl<K, V> LfuCacheTrait<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lfu(&mut self) -> Option<(K, V)> {
        let (key, value, freq) = self.buckets.pop_min()?;
        self.total_frequency = self.total_frequency.saturating_sub(freq);
        #[cfg(feature = "metrics")]
        self.metrics.record_eviction();
        tracing::trace!(freq, "lfu evicted lowest-frequency entry");
        Some((key, value))
    }

    fn peek_lfu(&self) -> Option<(&K, &V)> {
        self.buckets.peek_min().map(|(key, value, _)| (key, value))
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        self.buckets.frequency(key)
    }
}

/// Thread-safe LFU cache with aging.
#[derive(Debug)]
pub struct LfuCache<K, V> {
    inner: Mutex<LfuCore<K, V>>,
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LFU cache with the default aging ceiling.
    ///
    /// # Panics
    ///
    /// Panics if `capacity` is zero.
    pub fn new(capacity: usize) -> Self {
        match Self::try_new(capacity) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    /// Creates an LFU cache that ages once the average count per entry
    /// exceeds `max_average_frequency`.
    ///
    /// # Panics
    ///
    /// Panics if either argument is zero.
    pub fn with_max_average_frequency(capacity: usize, max_average_frequency: u64) -> Self {
        match Self::try_with_max_average_frequency(capacity, max_average_frequency) {
            Ok(cache) => cache,
            Err(e) => panic!("{}", e),
        }
    }

    pub fn try_new(capacity: usize) -> Result<Self, ConfigError> {
        Self::try_with_max_average_frequency(capacity, DEFAULT_MAX_AVERAGE_FREQUENCY)
    }

    pub fn try_with_max_average_frequency(
        capacity: usize,
        max_average_frequency: u64,
    ) -> Result<Self, ConfigError> {
        ConfigError::require_positive("capacity", capacity)?;
        if max_average_frequency == 0 {
            return Err(ConfigError::new(
                "max_average_frequency must be greater than zero",
            ));
        }
        Ok(Self {
            inner: Mutex::new(LfuCore::with_max_average_frequency(
                capacity,
                max_average_frequency,
            )),
        })
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().frequency(key)
    }

    pub fn min_frequency(&self) -> u64 {
        self.inner.lock().min_frequency()
    }

    pub fn average_frequency(&self) -> u64 {
        self.inner.lock().average_frequency()
    }

    pub fn total_frequency(&self) -> u64 {
        self.inner.lock().total_frequency()
    }

    pub fn max_average_frequency(&self) -> u64 {
        self.inner.lock().max_average_frequency()
    }

    pub fn pop_lfu(&self) -> Option<(K, V)> {
        self.inner.lock().pop_lfu()
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.inner.lock().check_invariants()
    }

    #[cfg(feature = "metrics")]
    pub fn metrics_snapshot(&self) -> MetricsSnapshot {
        self.inner.lock().metrics_snapshot()
    }
}

impl<K, V> LfuCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Reads `key` without counting an access.
    pub fn peek(&self, key: &K) -> Option<V> {
        self.inner.lock().peek(key).cloned()
    }
}

#[cfg(feature = "metrics")]
impl<K, V> MetricsSnapshotProvider for LfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> MetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K, V> CachePolicy<K, V> for LfuCache<K, V>
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
            tracing::warn!("lfu remove called for a key that is not resident");
        }
        removed
    }

    /// Drops all entries and the running total; capacity and the aging
    /// ceiling are kept.
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

#[cfg(test)]
mod tests {
    use super::*;

    mod basic_behavior {
        use super::*;

        #[test]
        fn test_lowest_frequency_is_evicted() {
            let mut core = LfuCore::new(2);
            core.insert(1, "v1");
            core.insert(2, "v2");
            core.insert(3, "v3");
            assert!(!core.contains(&1));
            assert!(core.contains(&2));
            assert!(core.contains(&3));
        }

        #[test]
        fn test_ties_break_toward_oldest() {
            let mut core = LfuCore::new(3);
            core.insert("a", 1);
            core.insert("b", 2);
            core.insert("c", 3);
            core.get(&"a");
            core.get(&"b");
            core.get(&"c");
            // all at 2; a reached it first
            core.insert("d", 4);
            assert!(!core.contains(&"a"));
        }

        #[test]
        fn test_get_and_update_both_count() {
            let mut core = LfuCore::new(2);
            core.insert("a", 1);
            assert_eq!(core.get(&"a"), Some(&1));
            assert_eq!(core.insert("a", 5), Some(1));
            assert_eq!(core.frequency(&"a"), Some(3));
            assert_eq!(core.peek(&"a"), Some(&5));
            assert_eq!(core.total_frequency(), 3);
        }

        #[test]
        fn test_pop_and_peek_lfu() {
            let mut core = LfuCore::new(3);
            core.insert("hot", 1);
            core.insert("cold", 2);
            core.get(&"hot");
            assert_eq!(core.peek_lfu(), Some((&"cold", &2)));
            assert_eq!(core.pop_lfu(), Some(("cold", 2)));
            assert_eq!(core.total_frequency(), 2);
            assert_eq!(core.min_frequency(), 2);
        }

        #[test]
        fn test_remove_subtracts_frequency() {
            let mut core = LfuCore::new(3);
            core.insert("a", 1);
            core.insert("b", 2);
            core.get(&"a");
            core.get(&"a");
            assert_eq!(core.remove(&"a"), Some(1));
            assert_eq!(core.total_frequency(), 1);
            assert_eq!(core.remove(&"a"), None);
            core.check_invariants().unwrap();
        }
    }

    mod aging {
        use super::*;

        #[test]
        fn test_aging_lowers_counts_and_rebases_total() {
            let mut core = LfuCore::with_max_average_frequency(3, 4);
            core.insert("a", 0);
            core.insert("b", 0);
            core.insert("c", 0);
            // total reaches 15 (average 5 > 4) on the 12th get
            for _ in 0..12 {
                core.get(&"a");
            }
            assert_eq!(core.frequency(&"a"), Some(11));
            assert_eq!(core.frequency(&"b"), Some(1));
            assert_eq!(core.frequency(&"c"), Some(1));
            assert_eq!(core.total_frequency(), 13);
            assert_eq!(core.min_frequency(), 1);
            core.check_invariants().unwrap();
            #[cfg(feature = "metrics")]
            assert_eq!(core.metrics_snapshot().agings, 1);
        }

        #[test]
        fn test_aging_recomputes_min_frequency() {
            let mut core = LfuCore::with_max_average_frequency(2, 10);
            core.insert("a", 0);
            core.insert("b", 0);
            for _ in 0..10 {
                core.get(&"a");
                core.get(&"b");
            }
            // 22 / 2 = 11 > 10 on the last get: both drop by 5
            assert_eq!(core.frequency(&"a"), Some(6));
            assert_eq!(core.frequency(&"b"), Some(6));
            assert_eq!(core.min_frequency(), 6);
            assert_eq!(core.average_frequency(), 6);
            core.check_invariants().unwrap();
        }

        #[test]
        fn test_newcomer_can_displace_aged_key() {
            let mut core = LfuCore::with_max_average_frequency(2, 2);
            core.insert("old", 0);
            for _ in 0..50 {
                core.get(&"old");
            }
            // a single resident entry keeps getting pulled back down
            assert!(core.frequency(&"old").unwrap() <= 3);
            core.insert("new", 0);
            core.get(&"new");
            core.get(&"new");
            core.get(&"new");
            core.insert("third", 0);
            assert!(core.contains(&"new"));
            core.check_invariants().unwrap();
        }

        #[test]
        fn test_default_ceiling_never_ages_small_workloads() {
            let mut core = LfuCore::new(1);
            core.insert("a", 0);
            for _ in 0..10_000 {
                core.get(&"a");
            }
            assert_eq!(core.frequency(&"a"), Some(10_001));
        }
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn test_zero_capacity_core_admits_nothing() {
            let mut core: LfuCore<&str, i32> = LfuCore::new(0);
            assert_eq!(core.insert("a", 1), None);
            assert!(core.is_empty());
        }

        #[test]
        fn test_resize_evicts_lowest_counts() {
            let mut core = LfuCore::new(3);
            core.insert("a", 1);
            core.insert("b", 2);
            core.insert("c", 3);
            core.get(&"b");
            let evicted = core.resize(1);
            assert_eq!(evicted, vec![("a", 1), ("c", 3)]);
            assert!(core.contains(&"b"));
            core.check_invariants().unwrap();
        }

        #[test]
        fn test_constructor_validation() {
            assert!(LfuCache::<u8, u8>::try_new(0).is_err());
            let err = LfuCache::<u8, u8>::try_with_max_average_frequency(4, 0).unwrap_err();
            assert!(err.message().contains("max_average_frequency"));
            let cache = LfuCache::<u8, u8>::with_max_average_frequency(4, 10);
            assert_eq!(cache.max_average_frequency(), 10);
        }

        #[test]
        fn test_purge_keeps_configuration() {
            let cache = LfuCache::with_max_average_frequency(2, 8);
            cache.put(1, 1);
            cache.get(&1);
            cache.purge();
            assert_eq!(cache.get(&1), None);
            assert_eq!(cache.total_frequency(), 0);
            assert_eq!(cache.min_frequency(), 1);
            assert_eq!(cache.capacity(), 2);
            assert_eq!(cache.max_average_frequency(), 8);
            cache.put(2, 2);
            assert_eq!(cache.get(&2), Some(2));
        }

        #[test]
        fn test_misses_do_not_count() {
            let mut core = LfuCore::new(2);
            core.insert("a", 1);
            for _ in 0..5 {
                assert_eq!(core.get(&"missing"), None);
            }
            assert_eq!(core.total_frequency(), 1);
            assert_eq!(core.frequency(&"a"), Some(1));
        }
    }

    mod state_consistency {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn prop_capacity_and_totals_hold(
                capacity in 1usize..6,
                ceiling in 1u64..20,
                ops in prop::collection::vec((0u8..3, 0u8..10), 0..300),
            ) {
                let mut core = LfuCore::with_max_average_frequency(capacity, ceiling);
                for (op, key) in ops {
                    match op {
                        0 => { core.insert(key, key); },
                        1 => { core.get(&key); },
                        _ => { core.remove(&key); },
                    }
                    prop_assert!(core.len() <= capacity);
                    prop_assert!(core.check_invariants().is_ok());
                }
            }
        }
    }
}
