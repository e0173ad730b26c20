//! Sharding wrapper: `N` independently locked instances of one policy.
//!
//! Every key is routed by [`ShardSelector`] to exactly one shard, so two
//! threads only contend when their keys land in the same shard. Each shard
//! holds `ceil(total_capacity / N)` entries; eviction decisions are local to
//! a shard.
//!
//! ```text
//!   put/get(key) ──► ShardSelector::shard_for_key(key) ──► shards[i].put/get
//!
//!   ┌──────────────┬──────────────┬──────────────┬──────────────┐
//!   │ LruCache (4) │ LruCache (4) │ LruCache (4) │ LruCache (4) │
//!   │   own lock   │   own lock   │   own lock   │   own lock   │
//!   └──────────────┴──────────────┴──────────────┴──────────────┘
//! ```
//!
//! ## Example
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache = ShardedCache::try_new(64, 4, |per_shard| LruCache::<&str, i32>::try_new(per_shard))?;
//! cache.put("user:1", 1);
//! assert_eq!(cache.get(&"user:1"), Some(1));
//! assert_eq!(cache.shard_count(), 4);
//! assert_eq!(cache.capacity(), 64);
//! # Ok::<(), ConfigError>(())
//! ```
use std::hash::Hash;

use crate::ds::shard::ShardSelector;
use crate::error::ConfigError;
#[cfg(feature = "metrics")]
use crate::metrics::{MetricsSnapshot, MetricsSnapshotProvider};
use crate::traits::CachePolicy;

/// Fixed set of policy instances addressed by key hash.
#[derive(Debug)]
pub struct ShardedCache<P> {
    shards: Vec<P>,
    selector: ShardSelector,
    total_capacity: usize,
}

impl<P> ShardedCache<P> {
    /// Builds `shard_count` shards, calling `factory` with the per-shard
    /// capacity for each.
    pub fn try_new<F>(total_capacity: usize, shard_count: usize, factory: F) -> Result<Self, ConfigError>
    where
        F: FnMut(usize) -> Result<P, ConfigError>,
    {
        Self::try_with_seed(total_capacity, shard_count, 0, factory)
    }

    /// Like [`try_new`](Self::try_new) with an explicit routing seed.
    pub fn try_with_seed<F>(
        total_capacity: usize,
        shard_count: usize,
        seed: u64,
        mut factory: F,
    ) -> Result<Self, ConfigError>
    where
        F: FnMut(usize) -> Result<P, ConfigError>,
    {
        ConfigError::require_positive("total_capacity", total_capacity)?;
        ConfigError::require_positive("shard_count", shard_count)?;

        let per_shard = total_capacity.div_ceil(shard_count);
        let shards = (0..shard_count)
            .map(|_| factory(per_shard))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(shard_count, per_shard, "sharded cache built");
        Ok(Self {
            shards,
            selector: ShardSelector::new(shard_count, seed),
            total_capacity,
        })
    }

    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Index of the shard that owns `key`.
    pub fn shard_for<K: Hash + ?Sized>(&self, key: &K) -> usize {
        self.selector.shard_for_key(key)
    }

    pub fn shard(&self, index: usize) -> Option<&P> {
        self.shards.get(index)
    }

    /// The capacity requested at construction; [`CachePolicy::capacity`]
    /// reports the rounded-up sum of the shards.
    pub fn total_capacity(&self) -> usize {
        self.total_capacity
    }

    fn owner<K: Hash + ?Sized>(&self, key: &K) -> &P {
        &self.shards[self.selector.shard_for_key(key)]
    }
}

impl<K, V, P> CachePolicy<K, V> for ShardedCache<P>
where
    K: Hash,
    P: CachePolicy<K, V>,
{
    fn put(&self, key: K, value: V) {
        self.owner(&key).put(key, value);
    }

    fn get(&self, key: &K) -> Option<V> {
        self.owner(key).get(key)
    }

    fn get_into(&self, key: &K, out: &mut V) -> bool {
        self.owner(key).get_into(key, out)
    }

    fn remove(&self, key: &K) -> Option<V> {
        self.owner(key).remove(key)
    }

    fn purge(&self) {
        for shard in &self.shards {
            shard.purge();
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.owner(key).contains(key)
    }

    fn len(&self) -> usize {
        self.shards.iter().map(|shard| shard.len()).sum()
    }

    fn capacity(&self) -> usize {
        self.shards.iter().map(|shard| shard.capacity()).sum()
    }
}

#[cfg(feature = "metrics")]
impl<P> MetricsSnapshotProvider for ShardedCache<P>
where
    P: MetricsSnapshotProvider,
{
    /// Counters summed over every shard.
    fn snapshot(&self) -> MetricsSnapshot {
        self.shards
            .iter()
            .map(|shard| shard.snapshot())
            .fold(MetricsSnapshot::default(), MetricsSnapshot::merge)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::lfu::LfuCache;
    use crate::policy::lru::LruCache;

    fn lru_shards(total: usize, shards: usize) -> ShardedCache<LruCache<u64, u64>> {
        ShardedCache::try_new(total, shards, LruCache::try_new).unwrap()
    }

    mod basic_behavior {
        use super::*;

        #[test]
        fn per_shard_capacity_rounds_up() {
            let cache = lru_shards(10, 4);
            assert_eq!(cache.shard_count(), 4);
            assert_eq!(cache.shard(0).map(|s| s.capacity()), Some(3));
            assert_eq!(cache.capacity(), 12);
            assert_eq!(cache.total_capacity(), 10);
        }

        #[test]
        fn operations_land_in_owning_shard() {
            let cache = lru_shards(64, 4);
            for key in 0..32u64 {
                cache.put(key, key * 10);
            }
            for key in 0..32u64 {
                let owner = cache.shard_for(&key);
                let shard = cache.shard(owner).unwrap();
                assert!(shard.contains(&key));
                assert_eq!(cache.get(&key), Some(key * 10));
            }
            assert_eq!(cache.len(), 32);
        }

        #[test]
        fn remove_and_purge() {
            let cache = lru_shards(16, 2);
            cache.put(1, 1);
            cache.put(2, 2);
            assert_eq!(cache.remove(&1), Some(1));
            assert!(!cache.contains(&1));
            cache.purge();
            assert!(cache.is_empty());
        }

        #[test]
        fn single_shard_behaves_like_inner_policy() {
            let cache = lru_shards(2, 1);
            cache.put(1, 1);
            cache.put(2, 2);
            cache.get(&1);
            cache.put(3, 3);
            assert!(cache.contains(&1));
            assert!(!cache.contains(&2));
        }

        #[test]
        fn wraps_other_policies() {
            let cache = ShardedCache::try_new(8, 2, |cap| LfuCache::<u64, u64>::try_new(cap)).unwrap();
            cache.put(7, 70);
            let mut out = 0;
            assert!(cache.get_into(&7, &mut out));
            assert_eq!(out, 70);
        }
    }

    mod routing {
        use super::*;

        #[test]
        fn routing_is_stable() {
            let cache = lru_shards(64, 8);
            for key in 0..100u64 {
                let first = cache.shard_for(&key);
                for _ in 0..5 {
                    assert_eq!(cache.shard_for(&key), first);
                }
                assert!(first < 8);
            }
        }

        #[test]
        fn seed_changes_distribution() {
            let a = ShardedCache::try_with_seed(64, 8, 1, LruCache::<u64, u64>::try_new).unwrap();
            let b = ShardedCache::try_with_seed(64, 8, 2, LruCache::<u64, u64>::try_new).unwrap();
            let differs = (0..64u64).any(|key| a.shard_for(&key) != b.shard_for(&key));
            assert!(differs);
        }
    }

    mod edge_cases {
        use super::*;

        #[test]
        fn zero_arguments_are_rejected() {
            let err = ShardedCache::try_new(16, 0, LruCache::<u64, u64>::try_new).unwrap_err();
            assert!(err.message().contains("shard_count"));
            let err = ShardedCache::try_new(0, 4, LruCache::<u64, u64>::try_new).unwrap_err();
            assert!(err.message().contains("total_capacity"));
        }

        #[test]
        fn factory_error_propagates() {
            let result: Result<ShardedCache<LruCache<u64, u64>>, _> =
                ShardedCache::try_new(16, 4, |_| Err(ConfigError::new("factory refused")));
            assert_eq!(result.unwrap_err().message(), "factory refused");
        }

        #[test]
        fn more_shards_than_capacity() {
            let cache = lru_shards(3, 8);
            assert_eq!(cache.capacity(), 8);
            for key in 0..100u64 {
                cache.put(key, key);
            }
            assert!(cache.len() <= cache.capacity());
        }

        #[cfg(feature = "metrics")]
        #[test]
        fn snapshot_sums_shards() {
            let cache = lru_shards(32, 4);
            for key in 0..8u64 {
                cache.put(key, key);
                cache.get(&key);
            }
            cache.get(&1000);
            let snap = cache.snapshot();
            assert_eq!(snap.insert_new, 8);
            assert_eq!(snap.get_hits, 8);
            assert_eq!(snap.get_misses, 1);
            assert_eq!(snap.len, 8);
            assert_eq!(snap.capacity, 32);
        }
    }
}
