use crate::metrics::snapshot::MetricsSnapshot;

/// Event counters for one policy core (or one ARC part).
///
/// Not every policy uses every counter: `agings` is LFU-only, `ghost_hits`,
/// `promotions` and `capacity_transfers` are ARC-only.
#[derive(Debug, Default, Clone)]
pub struct PolicyMetrics {
    get_calls: u64,
    get_hits: u64,
    get_misses: u64,
    insert_calls: u64,
    insert_updates: u64,
    insert_new: u64,
    evicted_entries: u64,
    removals: u64,
    ghost_hits: u64,
    promotions: u64,
    capacity_transfers: u64,
    agings: u64,
}

impl PolicyMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn record_get_hit(&mut self) {
        self.get_calls += 1;
        self.get_hits += 1;
    }

    #[inline]
    pub fn record_get_miss(&mut self) {
        self.get_calls += 1;
        self.get_misses += 1;
    }

    #[inline]
    pub fn record_insert_new(&mut self) {
        self.insert_calls += 1;
        self.insert_new += 1;
    }

    #[inline]
    pub fn record_insert_update(&mut self) {
        self.insert_calls += 1;
        self.insert_updates += 1;
    }

    #[inline]
    pub fn record_eviction(&mut self) {
        self.evicted_entries += 1;
    }

    #[inline]
    pub fn record_removal(&mut self) {
        self.removals += 1;
    }

    #[inline]
    pub fn record_ghost_hit(&mut self) {
        self.ghost_hits += 1;
    }

    #[inline]
    pub fn record_promotion(&mut self) {
        self.promotions += 1;
    }

    #[inline]
    pub fn record_capacity_transfer(&mut self) {
        self.capacity_transfers += 1;
    }

    #[inline]
    pub fn record_aging(&mut self) {
        self.agings += 1;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Copies the counters out, attaching the given gauges.
    pub fn snapshot(&self, len: usize, capacity: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            get_calls: self.get_calls,
            get_hits: self.get_hits,
            get_misses: self.get_misses,
            insert_calls: self.insert_calls,
            insert_updates: self.insert_updates,
            insert_new: self.insert_new,
            evicted_entries: self.evicted_entries,
            removals: self.removals,
            ghost_hits: self.ghost_hits,
            promotions: self.promotions,
            capacity_transfers: self.capacity_transfers,
            agings: self.agings,
            len,
            capacity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_feed_snapshot() {
        let mut metrics = PolicyMetrics::new();
        metrics.record_get_hit();
        metrics.record_get_miss();
        metrics.record_get_miss();
        metrics.record_insert_new();
        metrics.record_insert_update();
        metrics.record_eviction();
        metrics.record_aging();

        let snap = metrics.snapshot(3, 10);
        assert_eq!(snap.get_calls, 3);
        assert_eq!(snap.get_hits, 1);
        assert_eq!(snap.get_misses, 2);
        assert_eq!(snap.insert_calls, 2);
        assert_eq!(snap.evicted_entries, 1);
        assert_eq!(snap.agings, 1);
        assert_eq!(snap.len, 3);
        assert_eq!(snap.capacity, 10);

        metrics.reset();
        assert_eq!(metrics.snapshot(0, 10).get_calls, 0);
    }
}
