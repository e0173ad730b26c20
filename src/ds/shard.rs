//! Deterministic key-to-shard routing.
//!
//! Used by [`ShardedCache`](crate::policy::sharded::ShardedCache) to confine
//! every operation on a key to one shard for the lifetime of the cache.
//!
//! ## Architecture
//!
//! ```text
//!   key ──► DefaultHasher(seed, key) ──► finish() % shards ──► shard index
//!
//!   ┌─────────┬─────────┬─────────┬─────────┐
//!   │ Shard 0 │ Shard 1 │ Shard 2 │ Shard 3 │
//!   │  A, E   │  B, F   │  C, G   │  D, H   │
//!   └─────────┴─────────┴─────────┴─────────┘
//! ```
//!
//! The same `(key, seed, shards)` always yields the same index. Different
//! seeds give independent distributions.
//!
//! ## Example Usage
//!
//! ```
//! use evictkit::ds::ShardSelector;
//!
//! let selector = ShardSelector::new(4, 0);
//! let shard = selector.shard_for_key(&"user:123");
//! assert!(shard < 4);
//! assert_eq!(selector.shard_for_key(&"user:123"), shard);
//! ```

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Seeded hash router mapping keys to `[0, shards)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShardSelector {
    shards: usize,
    seed: u64,
}

impl ShardSelector {
    /// Creates a selector for `shards` shards. A zero count is clamped to 1;
    /// callers that must reject zero validate before constructing.
    pub fn new(shards: usize, seed: u64) -> Self {
        Self {
            shards: shards.max(1),
            seed,
        }
    }

    pub fn shard_count(&self) -> usize {
        self.shards
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Maps a key to a shard index in `[0, shards)`.
    pub fn shard_for_key<K: Hash + ?Sized>(&self, key: &K) -> usize {
        if self.shards == 1 {
            return 0;
        }
        let mut hasher = DefaultHasher::new();
        self.seed.hash(&mut hasher);
        key.hash(&mut hasher);
        (hasher.finish() % self.shards as u64) as usize
    }
}

impl Default for ShardSelector {
    /// Single shard, seed 0.
    fn default() -> Self {
        Self::new(1, 0)
    }
}
