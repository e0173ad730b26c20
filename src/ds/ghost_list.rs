//! Bounded recency list of evicted keys.
//!
//! A ghost list remembers which keys were resident until recently, without
//! their values. ARC keeps one per part and treats a hit as evidence that the
//! part was evicting too aggressively.
//!
//! ## Architecture
//!
//! ```text
//!   index: FxHashMap<K, SlotId>        list: IntrusiveList<K>
//!   ┌─────────┬─────────┐              head ─► [A] ◄──► [B] ◄──► [C] ◄── tail
//!   │  key A  │  id_1   │                 MRU                       LRU
//!   │  key B  │  id_2   │
//!   └─────────┴─────────┘
//! ```
//!
//! ## Behavior
//! - `record(k)`: moves key to MRU, forgets the LRU ghost if at capacity
//! - `remove(k)`: consumes a ghost; returns whether it was there
//! - capacity 0 records nothing
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::intrusive_list::IntrusiveList;
use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;

/// Keys-only recency list with a fixed capacity.
#[derive(Debug)]
pub struct GhostList<K> {
    list: IntrusiveList<K>,
    index: FxHashMap<K, SlotId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            list: IntrusiveList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as the most recently evicted key.
    ///
    /// Returns the ghost that was forgotten to make room, if any.
    pub fn record(&mut self, key: K) -> Option<K> {
        if self.capacity == 0 {
            return None;
        }
        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return None;
        }

        let mut forgotten = None;
        if self.list.len() >= self.capacity {
            if let Some(old) = self.list.pop_back() {
                self.index.remove(&old);
                forgotten = Some(old);
            }
        }
        let id = self.list.push_front(key.clone());
        self.index.insert(key, id);
        forgotten
    }

    /// Consumes the ghost for `key`; returns `true` if it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    /// Keys from most to least recently recorded.
    pub fn iter(&self) -> impl Iterator<Item = &K> {
        self.list.iter()
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        self.list.check_invariants()?;
        if self.list.len() != self.index.len() {
            return Err(InvariantError::new(format!(
                "ghost list holds {} keys but index holds {}",
                self.list.len(),
                self.index.len()
            )));
        }
        if self.list.len() > self.capacity {
            return Err(InvariantError::new("ghost list exceeds its capacity"));
        }
        for (key, &id) in &self.index {
            if self.list.get(id) != Some(key) {
                return Err(InvariantError::new("ghost index points at the wrong node"));
            }
        }
        Ok(())
    }
}
