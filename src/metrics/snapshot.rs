/// Point-in-time copy of a cache's counters and gauges.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub get_calls: u64,
    pub get_hits: u64,
    pub get_misses: u64,

    pub insert_calls: u64,
    pub insert_updates: u64,
    pub insert_new: u64,

    pub evicted_entries: u64,
    pub removals: u64,

    // ARC
    pub ghost_hits: u64,
    pub promotions: u64,
    pub capacity_transfers: u64,

    // LFU
    pub agings: u64,

    // gauges captured at snapshot time
    pub len: usize,
    pub capacity: usize,
}

impl MetricsSnapshot {
    /// Fraction of `get` calls that hit, or 0.0 before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.get_calls == 0 {
            0.0
        } else {
            self.get_hits as f64 / self.get_calls as f64
        }
    }

    /// Sums counters and gauges; used to fold shards and ARC parts together.
    pub fn merge(self, other: MetricsSnapshot) -> MetricsSnapshot {
        MetricsSnapshot {
            get_calls: self.get_calls + other.get_calls,
            get_hits: self.get_hits + other.get_hits,
            get_misses: self.get_misses + other.get_misses,
            insert_calls: self.insert_calls + other.insert_calls,
            insert_updates: self.insert_updates + other.insert_updates,
            insert_new: self.insert_new + other.insert_new,
            evicted_entries: self.evicted_entries + other.evicted_entries,
            removals: self.removals + other.removals,
            ghost_hits: self.ghost_hits + other.ghost_hits,
            promotions: self.promotions + other.promotions,
            capacity_transfers: self.capacity_transfers + other.capacity_transfers,
            agings: self.agings + other.agings,
            len: self.len + other.len,
            capacity: self.capacity + other.capacity,
        }
    }
}
