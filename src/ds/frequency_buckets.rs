//! Frequency buckets for O(1) LFU bookkeeping.
//!
//! Holds every resident LFU entry (key, value and access count) and keeps it
//! in the bucket for its current frequency. Buckets are chained in ascending
//! frequency order, so when the minimum bucket empties the next minimum is
//! one link away.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                     FrequencyBuckets<K, V> Layout                       │
//! │                                                                         │
//! │   index: FxHashMap<K, SlotId>        entries: SlotArena<Entry<K, V>>    │
//! │   ┌──────────┬────────┐              ┌──────┬──────────────────────┐    │
//! │   │ "page_a" │  id_0  │─────────────►│ id_0 │ freq 2, value, links │    │
//! │   │ "page_b" │  id_1  │─────────────►│ id_1 │ freq 1, value, links │    │
//! │   │ "page_c" │  id_2  │─────────────►│ id_2 │ freq 1, value, links │    │
//! │   └──────────┴────────┘              └──────┴──────────────────────┘    │
//! │                                                                         │
//! │   buckets: FxHashMap<u64, Bucket>                                       │
//! │                                                                         │
//! │   min_freq = 1                                                          │
//! │   freq=1: head ──► [id_2] ◄──► [id_1] ◄── tail   (tail = oldest)        │
//! │   freq=2: head ──► [id_0] ◄── tail                                      │
//! │                                                                         │
//! │   freq=1 ──next──► freq=2      freq=2 ──prev──► freq=1                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Flows
//!
//! - `insert`: new entry joins bucket 1 as its newest member.
//! - `touch`: entry leaves bucket `f` and becomes the newest member of
//!   bucket `f + 1`. An emptied bucket is unlinked; if it was the minimum,
//!   `min_freq` moves to its successor.
//! - `pop_min`: removes the oldest member of bucket `min_freq`.
//! - `decay_by`: subtracts from every count (floor 1) and rebuilds the chain
//!   keeping the relative order of entries.
//!
//! `min_freq` is 0 internally while empty; [`FrequencyBuckets::min_frequency`]
//! reports 1 in that case.
use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::InvariantError;

#[derive(Debug)]
struct Entry<K, V> {
    prev: Option<SlotId>,
    next: Option<SlotId>,
    freq: u64,
    key: K,
    value: V,
}

#[derive(Debug, Default)]
struct Bucket {
    head: Option<SlotId>,
    tail: Option<SlotId>,
    len: usize,
    prev: Option<u64>,
    next: Option<u64>,
}

/// LFU entry store with per-frequency FIFO buckets.
///
/// # Example
///
/// ```
/// use evictkit::ds::FrequencyBuckets;
///
/// let mut buckets = FrequencyBuckets::new();
/// buckets.insert("a", 10);
/// buckets.insert("b", 20);
/// buckets.touch(&"a");
///
/// assert_eq!(buckets.frequency(&"a"), Some(2));
/// assert_eq!(buckets.min_frequency(), 1);
/// assert_eq!(buckets.pop_min(), Some(("b", 20, 1)));
/// ```
#[derive(Debug)]
pub struct FrequencyBuckets<K, V> {
    entries: SlotArena<Entry<K, V>>,
    index: FxHashMap<K, SlotId>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
}

impl<K, V> FrequencyBuckets<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: SlotArena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
        }
    }

    pub fn len(&self) -> usize {
        self.index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Number of non-empty frequency buckets.
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Smallest frequency held by any entry, or 1 when empty.
    pub fn min_frequency(&self) -> u64 {
        self.min_freq.max(1)
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|entry| entry.freq)
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|entry| &entry.value)
    }

    pub fn get_mut(&mut self, key: &K) -> Option<&mut V> {
        let id = *self.index.get(key)?;
        self.entries.get_mut(id).map(|entry| &mut entry.value)
    }

    /// The entry `pop_min` would remove next.
    pub fn peek_min(&self) -> Option<(&K, &V, u64)> {
        let id = self.buckets.get(&self.min_freq)?.tail?;
        let entry = self.entries.get(id)?;
        Some((&entry.key, &entry.value, entry.freq))
    }

    /// Inserts `key` at frequency 1. Returns `false` (and drops `value`) if
    /// the key is already present.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }
        let id = self.entries.insert(Entry {
            prev: None,
            next: None,
            freq: 1,
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);

        if !self.buckets.contains_key(&1) {
            let next = (self.min_freq != 0).then_some(self.min_freq);
            self.insert_bucket(1, None, next);
        }
        self.list_push_front(1, id);
        self.min_freq = 1;
        true
    }

    /// Increments the frequency of `key` and returns the new count.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let current = self.entries.get(id)?.freq;
        if current == u64::MAX {
            self.list_remove(current, id)?;
            self.list_push_front(current, id);
            return Some(current);
        }
        let next_freq = current + 1;

        let (prev_existing, next_existing) = {
            let bucket = self.buckets.get(&current)?;
            (bucket.prev, bucket.next)
        };
        self.list_remove(current, id)?;
        let emptied = self.bucket_is_empty(current);
        if emptied {
            self.remove_bucket(current, prev_existing, next_existing);
            if self.min_freq == current {
                self.min_freq = next_existing.unwrap_or(0);
            }
        }

        if !self.buckets.contains_key(&next_freq) {
            let prev = if emptied { prev_existing } else { Some(current) };
            self.insert_bucket(next_freq, prev, next_existing);
        }
        self.entries.get_mut(id)?.freq = next_freq;
        self.list_push_front(next_freq, id);
        if self.min_freq == 0 || next_freq < self.min_freq {
            self.min_freq = next_freq;
        }
        Some(next_freq)
    }

    /// Removes the oldest entry of the lowest frequency.
    pub fn pop_min(&mut self) -> Option<(K, V, u64)> {
        if self.min_freq == 0 {
            return None;
        }
        let id = self.buckets.get(&self.min_freq)?.tail?;
        self.unlink_entry(id)
    }

    /// Removes `key`, returning its value and frequency.
    pub fn remove(&mut self, key: &K) -> Option<(V, u64)> {
        let id = *self.index.get(key)?;
        self.unlink_entry(id).map(|(_, value, freq)| (value, freq))
    }

    /// Entries in eviction order: ascending frequency, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (&K, &V, u64)> + '_ {
        self.ordered_ids().into_iter().filter_map(move |id| {
            self.entries
                .get(id)
                .map(|entry| (&entry.key, &entry.value, entry.freq))
        })
    }

    /// Sum of every entry's frequency.
    pub fn total_frequency(&self) -> u64 {
        self.entries
            .iter()
            .fold(0u64, |acc, (_, entry)| acc.saturating_add(entry.freq))
    }

    /// Lowers every frequency by `delta`, never below 1, and returns the new
    /// frequency total.
    ///
    /// Entries keep their relative eviction order. O(n).
    pub fn decay_by(&mut self, delta: u64) -> u64 {
        if delta == 0 || self.is_empty() {
            return self.total_frequency();
        }
        self.rebuild_with(|freq| freq.saturating_sub(delta).max(1));
        self.total_frequency()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
    }

    /// Clears all entries and releases spare storage.
    pub fn clear_shrink(&mut self) {
        self.clear();
        self.entries.shrink_to_fit();
        self.index.shrink_to_fit();
        self.buckets.shrink_to_fit();
    }

    /// Verifies bucket membership, bucket chain links and `min_freq`.
    pub fn check_invariants(&self) -> Result<(), InvariantError> {
        if self.entries.len() != self.index.len() {
            return Err(InvariantError::new(format!(
                "{} entries but {} index slots",
                self.entries.len(),
                self.index.len()
            )));
        }
        if self.is_empty() {
            if self.min_freq != 0 || !self.buckets.is_empty() {
                return Err(InvariantError::new("empty buckets still track a frequency"));
            }
            return Ok(());
        }

        let true_min = self.buckets.keys().copied().min();
        if true_min != Some(self.min_freq) {
            return Err(InvariantError::new(format!(
                "min_freq is {} but lowest bucket is {:?}",
                self.min_freq, true_min
            )));
        }

        let mut seen = 0usize;
        let mut prev_freq: Option<u64> = None;
        let mut freq = Some(self.min_freq);
        while let Some(f) = freq {
            let bucket = self
                .buckets
                .get(&f)
                .ok_or_else(|| InvariantError::new(format!("chain links missing bucket {f}")))?;
            if bucket.prev != prev_freq {
                return Err(InvariantError::new(format!("bucket {f} has a stale prev link")));
            }
            if prev_freq.is_some_and(|p| p >= f) {
                return Err(InvariantError::new("bucket chain is not ascending"));
            }
            if bucket.len == 0 || bucket.head.is_none() {
                return Err(InvariantError::new(format!("bucket {f} is empty but linked")));
            }

            let mut walked = 0usize;
            let mut last = None;
            let mut current = bucket.head;
            while let Some(id) = current {
                let entry = self.entries.get(id).ok_or_else(|| {
                    InvariantError::new(format!("bucket {f} links to a freed slot"))
                })?;
                if entry.freq != f {
                    return Err(InvariantError::new(format!(
                        "entry with frequency {} sits in bucket {f}",
                        entry.freq
                    )));
                }
                if entry.prev != last {
                    return Err(InvariantError::new(format!("bucket {f} has a stale entry link")));
                }
                if self.index.get(&entry.key) != Some(&id) {
                    return Err(InvariantError::new("index disagrees with bucket entry"));
                }
                walked += 1;
                if walked > bucket.len {
                    return Err(InvariantError::new(format!("bucket {f} overruns its length")));
                }
                last = Some(id);
                current = entry.next;
            }
            if walked != bucket.len || last != bucket.tail {
                return Err(InvariantError::new(format!("bucket {f} length or tail mismatch")));
            }
            seen += walked;
            prev_freq = Some(f);
            freq = bucket.next;
        }

        if seen != self.entries.len() {
            return Err(InvariantError::new(format!(
                "bucket chain reaches {seen} of {} entries",
                self.entries.len()
            )));
        }
        Ok(())
    }

    fn unlink_entry(&mut self, id: SlotId) -> Option<(K, V, u64)> {
        let freq = self.entries.get(id)?.freq;
        let (prev, next) = {
            let bucket = self.buckets.get(&freq)?;
            (bucket.prev, bucket.next)
        };
        self.list_remove(freq, id)?;
        if self.bucket_is_empty(freq) {
            self.remove_bucket(freq, prev, next);
            if self.min_freq == freq {
                self.min_freq = next.unwrap_or(0);
            }
        }
        let entry = self.entries.remove(id)?;
        self.index.remove(&entry.key);
        Some((entry.key, entry.value, entry.freq))
    }

    /// Slot ids in ascending frequency, oldest first within a bucket.
    fn ordered_ids(&self) -> Vec<SlotId> {
        let mut ids = Vec::with_capacity(self.len());
        let mut freq = (self.min_freq != 0).then_some(self.min_freq);
        while let Some(f) = freq {
            let Some(bucket) = self.buckets.get(&f) else {
                break;
            };
            let mut current = bucket.tail;
            while let Some(id) = current {
                ids.push(id);
                current = self.entries.get(id).and_then(|entry| entry.prev);
            }
            freq = bucket.next;
        }
        ids
    }

    /// Re-buckets every entry under `f(freq)`. `f` must be non-decreasing so
    /// the rebuilt chain stays ascending without a search.
    fn rebuild_with<F>(&mut self, mut f: F)
    where
        F: FnMut(u64) -> u64,
    {
        let ids = self.ordered_ids();
        self.buckets.clear();
        self.min_freq = 0;

        let mut last: Option<u64> = None;
        for id in ids {
            let Some(entry) = self.entries.get_mut(id) else {
                continue;
            };
            let freq = f(entry.freq).max(1);
            entry.freq = freq;
            if !self.buckets.contains_key(&freq) {
                self.insert_bucket(freq, last, None);
                last = Some(freq);
            }
            self.list_push_front(freq, id);
            if self.min_freq == 0 {
                self.min_freq = freq;
            }
        }
    }

    fn bucket_is_empty(&self, freq: u64) -> bool {
        self.buckets.get(&freq).is_none_or(|bucket| bucket.len == 0)
    }

    fn insert_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        self.buckets.insert(
            freq,
            Bucket {
                prev,
                next,
                ..Bucket::default()
            },
        );
        if let Some(prev_bucket) = prev.and_then(|p| self.buckets.get_mut(&p)) {
            prev_bucket.next = Some(freq);
        }
        if let Some(next_bucket) = next.and_then(|n| self.buckets.get_mut(&n)) {
            next_bucket.prev = Some(freq);
        }
    }

    fn remove_bucket(&mut self, freq: u64, prev: Option<u64>, next: Option<u64>) {
        if let Some(prev_bucket) = prev.and_then(|p| self.buckets.get_mut(&p)) {
            prev_bucket.next = next;
        }
        if let Some(next_bucket) = next.and_then(|n| self.buckets.get_mut(&n)) {
            next_bucket.prev = prev;
        }
        self.buckets.remove(&freq);
    }

    fn list_push_front(&mut self, freq: u64, id: SlotId) {
        let Some(bucket) = self.buckets.get_mut(&freq) else {
            tracing::error!(freq, "frequency bucket missing during relink");
            return;
        };
        let old_head = bucket.head;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = None;
            entry.next = old_head;
        }
        match old_head.and_then(|head| self.entries.get_mut(head)) {
            Some(head_entry) => head_entry.prev = Some(id),
            None => bucket.tail = Some(id),
        }
        bucket.head = Some(id);
        bucket.len += 1;
    }

    fn list_remove(&mut self, freq: u64, id: SlotId) -> Option<()> {
        let (prev, next) = {
            let entry = self.entries.get(id)?;
            (entry.prev, entry.next)
        };
        let bucket = self.buckets.get_mut(&freq)?;
        match prev.and_then(|p| self.entries.get_mut(p)) {
            Some(prev_entry) => prev_entry.next = next,
            None => bucket.head = next,
        }
        match next.and_then(|n| self.entries.get_mut(n)) {
            Some(next_entry) => next_entry.prev = prev,
            None => bucket.tail = prev,
        }
        bucket.len = bucket.len.saturating_sub(1);
        let entry = self.entries.get_mut(id)?;
        entry.prev = None;
        entry.next = None;
        Some(())
    }
}

impl<K, V> Default for FrequencyBuckets<K, V>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(buckets: &FrequencyBuckets<&'static str, u32>) -> Vec<(&'static str, u64)> {
        buckets.iter().map(|(k, _, f)| (*k, f)).collect()
    }

    mod basic_behavior {
        use super::*;

        #[test]
        fn evicts_lowest_frequency_oldest_first() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 1);
            buckets.insert("b", 2);
            buckets.insert("c", 3);
            buckets.touch(&"a");

            assert_eq!(buckets.pop_min(), Some(("b", 2, 1)));
            assert_eq!(buckets.pop_min(), Some(("c", 3, 1)));
            assert_eq!(buckets.pop_min(), Some(("a", 1, 2)));
            assert_eq!(buckets.pop_min(), None);
            buckets.check_invariants().unwrap();
        }

        #[test]
        fn min_frequency_advances_when_bucket_empties() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 0);
            assert_eq!(buckets.min_frequency(), 1);
            buckets.touch(&"a");
            buckets.touch(&"a");
            assert_eq!(buckets.min_frequency(), 3);
            assert_eq!(buckets.bucket_count(), 1);

            buckets.insert("b", 0);
            assert_eq!(buckets.min_frequency(), 1);
            buckets.check_invariants().unwrap();
        }

        #[test]
        fn remove_reports_value_and_frequency() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 7);
            buckets.touch(&"a");
            assert_eq!(buckets.remove(&"a"), Some((7, 2)));
            assert_eq!(buckets.remove(&"a"), None);
            assert!(buckets.is_empty());
            assert_eq!(buckets.min_frequency(), 1);
            buckets.check_invariants().unwrap();
        }

        #[test]
        fn duplicate_insert_is_rejected() {
            let mut buckets = FrequencyBuckets::new();
            assert!(buckets.insert("a", 1));
            assert!(!buckets.insert("a", 2));
            assert_eq!(buckets.get(&"a"), Some(&1));
            *buckets.get_mut(&"a").unwrap() = 5;
            assert_eq!(buckets.peek_min(), Some((&"a", &5, 1)));
        }

        #[test]
        fn iter_is_eviction_order() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 0);
            buckets.insert("b", 0);
            buckets.insert("c", 0);
            buckets.touch(&"b");
            buckets.touch(&"a");
            assert_eq!(keys(&buckets), vec![("c", 1), ("b", 2), ("a", 2)]);
        }
    }

    mod decay {
        use super::*;

        #[test]
        fn decay_floors_at_one_and_keeps_order() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 0);
            buckets.insert("b", 0);
            buckets.insert("c", 0);
            for _ in 0..9 {
                buckets.touch(&"a");
            }
            for _ in 0..3 {
                buckets.touch(&"b");
            }
            assert_eq!(buckets.total_frequency(), 10 + 4 + 1);

            let total = buckets.decay_by(5);
            assert_eq!(buckets.frequency(&"a"), Some(5));
            assert_eq!(buckets.frequency(&"b"), Some(1));
            assert_eq!(buckets.frequency(&"c"), Some(1));
            assert_eq!(total, 7);
            assert_eq!(buckets.min_frequency(), 1);
            // c was older than b within the merged bucket
            assert_eq!(keys(&buckets), vec![("c", 1), ("b", 1), ("a", 5)]);
            buckets.check_invariants().unwrap();
        }

        #[test]
        fn decay_recomputes_min_when_everything_is_hot() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 0);
            buckets.insert("b", 0);
            for _ in 0..20 {
                buckets.touch(&"a");
            }
            for _ in 0..10 {
                buckets.touch(&"b");
            }
            buckets.decay_by(4);
            assert_eq!(buckets.frequency(&"a"), Some(17));
            assert_eq!(buckets.frequency(&"b"), Some(7));
            assert_eq!(buckets.min_frequency(), 7);
            buckets.check_invariants().unwrap();
        }

        #[test]
        fn zero_delta_is_a_noop() {
            let mut buckets = FrequencyBuckets::new();
            buckets.insert("a", 0);
            buckets.touch(&"a");
            assert_eq!(buckets.decay_by(0), 2);
            assert_eq!(buckets.frequency(&"a"), Some(2));
        }
    }

    mod state_consistency {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn invariants_hold_under_random_ops(ops in prop::collection::vec((0u8..5, 0u8..16), 0..300)) {
                let mut buckets: FrequencyBuckets<u8, u8> = FrequencyBuckets::new();
                for (op, key) in ops {
                    match op {
                        0 => { buckets.insert(key, key); },
                        1 => { buckets.touch(&key); },
                        2 => { buckets.remove(&key); },
                        3 => {
                            let expected_min = buckets.iter().map(|(_, _, f)| f).min();
                            let popped = buckets.pop_min().map(|(_, _, f)| f);
                            prop_assert_eq!(popped, expected_min);
                        },
                        _ => { buckets.decay_by(u64::from(key % 4)); },
                    }
                    prop_assert!(buckets.check_invariants().is_ok());
                }
            }
        }
    }
}
