//! evictkit: in-process cache eviction policies.
//!
//! LRU, LFU with frequency aging, an adaptive LRU/LFU combination (ARC),
//! LRU-K admission and a sharding wrapper, all behind the one thread-safe
//! [`CachePolicy`](traits::CachePolicy) contract. The policies share the
//! arena-backed list, ghost list and frequency bucket primitives in [`ds`].
//!
//! ```
//! use evictkit::prelude::*;
//!
//! let cache = CacheBuilder::new(128)
//!     .shards(4)
//!     .build::<u64, String>(PolicyKind::Lfu { max_average_frequency: None })?;
//! cache.put(1, "one".to_string());
//! assert_eq!(cache.get(&1).as_deref(), Some("one"));
//! # Ok::<(), ConfigError>(())
//! ```

pub mod builder;
pub mod ds;
pub mod error;
pub mod policy;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;
pub mod traits;
