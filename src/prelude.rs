pub use crate::builder::{CacheBuilder, PolicyKind};
pub use crate::ds::{FrequencyBuckets, GhostList, IntrusiveList, ShardSelector, SlotArena, SlotId};
pub use crate::error::{ConfigError, InvariantError};
#[cfg(feature = "metrics")]
pub use crate::metrics::{MetricsSnapshot, MetricsSnapshotProvider};
pub use crate::policy::arc::ArcCache;
pub use crate::policy::lfu::{LfuCache, LfuCore};
pub use crate::policy::lru::{LruCache, LruCore};
pub use crate::policy::lru_k::{LruKCache, LruKCore};
pub use crate::policy::sharded::ShardedCache;
pub use crate::traits::{CachePolicy, CoreCache, LfuCacheTrait, LruCacheTrait, MutableCache};
