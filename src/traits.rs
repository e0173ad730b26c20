//! # Cache Trait Hierarchy
//!
//! Two layers of traits. The single-threaded cores (`LruCore`, `LfuCore`,
//! `LruKCore`) take `&mut self` and implement [`CoreCache`] plus a
//! policy-specific extension. The thread-safe caches own their cores behind
//! a mutex and implement [`CachePolicy`], which takes `&self` and is the one
//! contract callers program against.
//!
//! ## Architecture
//!
//! ```text
//!   ┌─────────────────────────────────────────┐
//!   │            CoreCache<K, V>              │   single-threaded cores
//!   │  insert(&mut, K, V) → Option<V>         │
//!   │  get(&mut, &K) → Option<&V>             │
//!   │  contains / len / capacity / clear      │
//!   └──────────────────┬──────────────────────┘
//!                      ▼
//!   ┌─────────────────────────────────────────┐
//!   │          MutableCache<K, V>             │
//!   │  remove(&mut, &K) → Option<V>           │
//!   └──────────┬───────────────────┬──────────┘
//!              ▼                   ▼
//!   ┌─────────────────────┐ ┌─────────────────────┐
//!   │ LruCacheTrait<K, V> │ │ LfuCacheTrait<K, V> │
//!   │  pop_lru / peek_lru │ │  pop_lfu / peek_lfu │
//!   │  touch              │ │  frequency          │
//!   └─────────────────────┘ └─────────────────────┘
//!
//!   ┌─────────────────────────────────────────┐
//!   │     CachePolicy<K, V>: Send + Sync      │   thread-safe caches
//!   │  put(&, K, V)                           │
//!   │  get(&, &K) → Option<V>                 │
//!   │  get_into(&, &K, &mut V) → bool         │
//!   │  remove(&, &K) → Option<V>              │
//!   │  purge(&)                               │
//!   │  contains / len / is_empty / capacity   │
//!   └─────────────────────────────────────────┘
//!      ▲ LruCache  LfuCache  ArcCache  LruKCache  ShardedCache<P>  Box<P>
//! ```
//!
//! ## Trait Summary
//!
//! | Trait           | Extends        | Implemented by                          |
//! |-----------------|----------------|-----------------------------------------|
//! | `CoreCache`     | -              | `LruCore`, `LfuCore`, `LruKCore`        |
//! | `MutableCache`  | `CoreCache`    | `LruCore`, `LfuCore`, `LruKCore`        |
//! | `LruCacheTrait` | `MutableCache` | `LruCore`                               |
//! | `LfuCacheTrait` | `MutableCache` | `LfuCore`                               |
//! | `CachePolicy`   | `Send + Sync`  | every thread-safe cache, `Box<dyn ..>`  |
//!
//! ## Example
//!
//! ```
//! use evictkit::prelude::*;
//!
//! fn warm<C: CachePolicy<u64, String>>(cache: &C) {
//!     for id in 0..4 {
//!         cache.put(id, format!("user-{id}"));
//!     }
//! }
//!
//! let lru = LruCache::new(8);
//! warm(&lru);
//! assert_eq!(lru.get(&2), Some("user-2".to_string()));
//!
//! let mut out = String::new();
//! assert!(lru.get_into(&3, &mut out));
//! assert_eq!(out, "user-3");
//! ```

/// Operations every single-threaded cache core supports.
pub trait CoreCache<K, V> {
    /// Inserts or overwrites; returns the previous value for `key`.
    ///
    /// Inserting a new key into a full cache evicts one entry first.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Looks up `key`, updating recency/frequency bookkeeping on a hit.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Residency check with no bookkeeping side effect.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn capacity(&self) -> usize;

    /// Drops every entry, keeping configuration.
    fn clear(&mut self);
}

/// Adds removal by key regardless of access statistics.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    fn remove(&mut self, key: &K) -> Option<V>;
}

/// Recency-ordered cores.
pub trait LruCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the least recently used entry.
    fn pop_lru(&mut self) -> Option<(K, V)>;

    /// The entry `pop_lru` would return, without touching it.
    fn peek_lru(&self) -> Option<(&K, &V)>;

    /// Marks `key` as most recently used; `false` if absent.
    fn touch(&mut self, key: &K) -> bool;
}

/// Frequency-ordered cores.
pub trait LfuCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the least frequently used entry (oldest on ties).
    fn pop_lfu(&mut self) -> Option<(K, V)>;

    fn peek_lfu(&self) -> Option<(&K, &V)>;

    fn frequency(&self, key: &K) -> Option<u64>;
}

/// The uniform, thread-safe cache contract.
///
/// Every method locks internally for its full duration; nothing blocks
/// beyond lock acquisition and nothing is asynchronous.
pub trait CachePolicy<K, V>: Send + Sync {
    /// Inserts or overwrites `key`. May evict one entry.
    fn put(&self, key: K, value: V);

    /// Returns a clone of the value for `key`, updating bookkeeping on a hit.
    fn get(&self, key: &K) -> Option<V>;

    /// Out-parameter form of [`get`](Self::get): writes into `out` and
    /// returns `true` on a hit, leaves `out` untouched on a miss.
    fn get_into(&self, key: &K, out: &mut V) -> bool {
        match self.get(key) {
            Some(value) => {
                *out = value;
                true
            },
            None => false,
        }
    }

    /// Deletes `key` regardless of its statistics. An absent key is logged
    /// and ignored.
    fn remove(&self, key: &K) -> Option<V>;

    /// Drops every entry and resets counters, keeping configuration.
    fn purge(&self);

    /// Residency check with no bookkeeping side effect.
    fn contains(&self, key: &K) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Upper bound on `len()`.
    fn capacity(&self) -> usize;
}

impl<K, V, P> CachePolicy<K, V> for Box<P>
where
    P: CachePolicy<K, V> + ?Sized,
{
    fn put(&self, key: K, value: V) {
        (**self).put(key, value)
    }

    fn get(&self, key: &K) -> Option<V> {
        (**self).get(key)
    }

    fn get_into(&self, key: &K, out: &mut V) -> bool {
        (**self).get_into(key, out)
    }

    fn remove(&self, key: &K) -> Option<V> {
        (**self).remove(key)
    }

    fn purge(&self) {
        (**self).purge()
    }

    fn contains(&self, key: &K) -> bool {
        (**self).contains(key)
    }

    fn len(&self) -> usize {
        (**self).len()
    }

    fn is_empty(&self) -> bool {
        (**self).is_empty()
    }

    fn capacity(&self) -> usize {
        (**self).capacity()
    }
}
