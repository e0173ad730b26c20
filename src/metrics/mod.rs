//! Per-policy counters, compiled in with the `metrics` feature.
//!
//! Each core owns a [`PolicyMetrics`] and bumps it while it already holds its
//! lock, so counters are plain integers. Thread-safe caches expose
//! `metrics_snapshot()`, which copies the counters out as a
//! [`MetricsSnapshot`] together with the current length and capacity.

pub mod counters;
pub mod snapshot;

pub use counters::PolicyMetrics;
pub use snapshot::MetricsSnapshot;

/// Read side of the metrics: anything that can hand out a snapshot.
///
/// Implemented by every thread-safe cache so that wrappers such as
/// [`ShardedCache`](crate::policy::sharded::ShardedCache) can fold their
/// inner caches together without knowing the concrete policy.
pub trait MetricsSnapshotProvider {
    fn snapshot(&self) -> MetricsSnapshot;
}
