//! Unified cache builder for all eviction policies.
//!
//! Picks a policy at runtime and hands it back behind
//! `Box<dyn CachePolicy<K, V>>`, optionally wrapped in a [`ShardedCache`].
//! All argument checking happens in the policy constructors; the builder only
//! routes.
//!
//! ## Example
//!
//! ```rust
//! use evictkit::builder::{CacheBuilder, PolicyKind};
//! use evictkit::traits::CachePolicy;
//!
//! let cache = CacheBuilder::new(100).build::<u64, String>(PolicyKind::Lru)?;
//! cache.put(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some("hello".to_string()));
//!
//! let sharded = CacheBuilder::new(1024)
//!     .shards(8)
//!     .build::<u64, String>(PolicyKind::Arc { transform_threshold: 2 })?;
//! sharded.put(7, "seven".to_string());
//! assert!(sharded.contains(&7));
//! # Ok::<(), evictkit::error::ConfigError>(())
//! ```

use std::hash::Hash;

use crate::error::ConfigError;
use crate::policy::arc::ArcCache;
use crate::policy::lfu::LfuCache;
use crate::policy::lru::LruCache;
use crate::policy::lru_k::LruKCache;
use crate::policy::sharded::ShardedCache;
use crate::traits::CachePolicy;

/// Available cache eviction policies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PolicyKind {
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction with aging; `None` keeps the default
    /// ceiling.
    Lfu { max_average_frequency: Option<u64> },
    /// Adaptive LRU/LFU split with ghost-driven capacity transfer.
    Arc { transform_threshold: usize },
    /// Admission after `k` observed accesses.
    LruK { history_capacity: usize, k: usize },
}

/// Builder for creating cache instances.
#[derive(Debug, Clone, Copy)]
pub struct CacheBuilder {
    capacity: usize,
    shards: Option<usize>,
    seed: u64,
}

impl CacheBuilder {
    /// Create a new cache builder with the specified capacity.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            shards: None,
            seed: 0,
        }
    }

    /// Splits the capacity over `shards` independently locked instances.
    pub fn shards(mut self, shards: usize) -> Self {
        self.shards = Some(shards);
        self
    }

    /// Routing seed for the sharded form; ignored without [`shards`](Self::shards).
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Build a cache with the specified policy.
    ///
    /// With sharding enabled, LRU-K's history capacity is divided across the
    /// shards the same way as the main capacity.
    ///
    /// # Example
    ///
    /// ```rust
    /// use evictkit::builder::{CacheBuilder, PolicyKind};
    ///
    /// let lfu = CacheBuilder::new(100)
    ///     .build::<u64, String>(PolicyKind::Lfu { max_average_frequency: Some(64) });
    /// assert!(lfu.is_ok());
    ///
    /// let bad = CacheBuilder::new(100)
    ///     .build::<u64, String>(PolicyKind::LruK { history_capacity: 0, k: 2 });
    /// assert!(bad.is_err());
    /// ```
    pub fn build<K, V>(self, policy: PolicyKind) -> Result<Box<dyn CachePolicy<K, V>>, ConfigError>
    where
        K: Eq + Hash + Clone + Send + 'static,
        V: Clone + Send + 'static,
    {
        let Some(shard_count) = self.shards else {
            return make_policy(self.capacity, policy, 1);
        };
        let sharded = ShardedCache::try_with_seed(self.capacity, shard_count, self.seed, |per_shard| {
            make_policy::<K, V>(per_shard, policy, shard_count)
        })?;
        Ok(Box::new(sharded))
    }
}

fn make_policy<K, V>(
    capacity: usize,
    policy: PolicyKind,
    shard_count: usize,
) -> Result<Box<dyn CachePolicy<K, V>>, ConfigError>
where
    K: Eq + Hash + Clone + Send + 'static,
    V: Clone + Send + 'static,
{
    let cache: Box<dyn CachePolicy<K, V>> = match policy {
        PolicyKind::Lru => Box::new(LruCache::try_new(capacity)?),
        PolicyKind::Lfu {
            max_average_frequency: None,
        } => Box::new(LfuCache::try_new(capacity)?),
        PolicyKind::Lfu {
            max_average_frequency: Some(ceiling),
        } => Box::new(LfuCache::try_with_max_average_frequency(capacity, ceiling)?),
        PolicyKind::Arc { transform_threshold } => {
            Box::new(ArcCache::try_new(capacity, transform_threshold)?)
        },
        PolicyKind::LruK { history_capacity, k } => Box::new(LruKCache::try_new(
            capacity,
            history_capacity.div_ceil(shard_count),
            k,
        )?),
    };
    Ok(cache)
}
