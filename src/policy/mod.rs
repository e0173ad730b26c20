//! Eviction policies.
//!
//! | Policy                          | Evicts                              | Extra state                  |
//! |---------------------------------|-------------------------------------|------------------------------|
//! | [`LruCache`](lru::LruCache)     | least recently used                 | -                            |
//! | [`LfuCache`](lfu::LfuCache)     | lowest count, oldest on ties        | running total for aging      |
//! | [`ArcCache`](arc::ArcCache)     | per part, capacity follows ghosts   | two ghost lists              |
//! | [`LruKCache`](lru_k::LruKCache) | LRU among keys seen `k` times       | history queue, pending map   |
//! | [`ShardedCache`](sharded::ShardedCache) | whatever the shard policy does | routing seed              |

pub mod arc;
pub mod lfu;
pub mod lru;
pub mod lru_k;
pub mod sharded;
