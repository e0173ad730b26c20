//! Micro-operation benchmarks for all cache policies.
//!
//! Run with: `cargo bench --bench ops`
//!
//! Measures per-operation latency for get and put across all cache policies
//! under identical conditions, plus multi-threaded throughput of a single
//! cache against its sharded form.

mod common;

use std::hint::black_box;
use std::time::Instant;

use common::workload::{Workload, WorkloadGenerator};
use criterion::{BenchmarkId, Criterion, Throughput, criterion_group, criterion_main};
use evictkit::builder::{CacheBuilder, PolicyKind};
use evictkit::traits::CachePolicy;

const CAPACITY: usize = 16_384;
const OPS: u64 = 100_000;
const THREADS: usize = 4;

fn policies() -> [(&'static str, PolicyKind); 4] {
    [
        ("lru", PolicyKind::Lru),
        (
            "lfu",
            PolicyKind::Lfu {
                max_average_frequency: None,
            },
        ),
        (
            "arc",
            PolicyKind::Arc {
                transform_threshold: 2,
            },
        ),
        (
            "lru_k",
            PolicyKind::LruK {
                history_capacity: CAPACITY,
                k: 2,
            },
        ),
    ]
}

fn build(builder: CacheBuilder, policy: PolicyKind) -> Box<dyn CachePolicy<u64, u64>> {
    match builder.build(policy) {
        Ok(cache) => cache,
        Err(e) => panic!("invalid bench configuration: {e}"),
    }
}

/// Fills the main store; LRU-K needs every key twice to admit it.
fn warm(cache: &dyn CachePolicy<u64, u64>) {
    for i in 0..CAPACITY as u64 {
        cache.put(i, i);
        cache.put(i, i);
    }
}

// ============================================================================
// Get Hit Latency (ns/op)
// ============================================================================

fn bench_get_hit(c: &mut Criterion) {
    let mut group = c.benchmark_group("get_hit_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in policies() {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let cache = build(CacheBuilder::new(CAPACITY), policy);
                warm(cache.as_ref());
                let start = Instant::now();
                for _ in 0..iters {
                    for i in 0..OPS {
                        let key = i % (CAPACITY as u64);
                        black_box(cache.get(&key));
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Put With Eviction (ns/op)
// ============================================================================

fn bench_put_evict(c: &mut Criterion) {
    let mut group = c.benchmark_group("put_evict_ns");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in policies() {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let cache = build(CacheBuilder::new(CAPACITY), policy);
                warm(cache.as_ref());
                let mut next = CAPACITY as u64;
                let start = Instant::now();
                for _ in 0..iters {
                    for _ in 0..OPS {
                        cache.put(next, next);
                        next += 1;
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Mixed Hot-Set Traffic
// ============================================================================

fn bench_mixed(c: &mut Criterion) {
    let mut group = c.benchmark_group("mixed_hotset");
    group.throughput(Throughput::Elements(OPS));

    for (name, policy) in policies() {
        group.bench_function(name, |b| {
            b.iter_custom(|iters| {
                let cache = build(CacheBuilder::new(CAPACITY), policy);
                let mut generator = WorkloadGenerator::new(
                    (CAPACITY * 4) as u64,
                    Workload::Hotset {
                        hot_fraction: 0.1,
                        hot_prob: 0.9,
                    },
                    42,
                );
                let start = Instant::now();
                for _ in 0..iters {
                    for _ in 0..OPS {
                        let key = generator.next_key();
                        if cache.get(&key).is_none() {
                            cache.put(key, key);
                        }
                    }
                }
                start.elapsed()
            })
        });
    }

    group.finish();
}

// ============================================================================
// Contention: single lock vs sharded
// ============================================================================

fn bench_contention(c: &mut Criterion) {
    let mut group = c.benchmark_group("contended_get_put");
    group.throughput(Throughput::Elements(OPS * THREADS as u64));

    for shards in [None, Some(16)] {
        let label = match shards {
            None => "single".to_string(),
            Some(n) => format!("sharded_{n}"),
        };
        group.bench_with_input(BenchmarkId::new("lru", &label), &shards, |b, &shards| {
            b.iter_custom(|iters| {
                let builder = match shards {
                    Some(n) => CacheBuilder::new(CAPACITY).shards(n),
                    None => CacheBuilder::new(CAPACITY),
                };
                let cache = build(builder, PolicyKind::Lru);
                let start = Instant::now();
                std::thread::scope(|scope| {
                    for t in 0..THREADS {
                        let cache = &cache;
                        scope.spawn(move || {
                            let mut generator =
                                WorkloadGenerator::new((CAPACITY * 2) as u64, Workload::Uniform, t as u64 + 1);
                            for _ in 0..iters {
                                for _ in 0..OPS {
                                    let key = generator.next_key();
                                    if cache.get(&key).is_none() {
                                        cache.put(key, key);
                                    }
                                }
                            }
                        });
                    }
                });
                start.elapsed()
            })
        });
    }

    group.finish();
}

criterion_group!(benches, bench_get_hit, bench_put_evict, bench_mixed, bench_contention);
criterion_main!(benches);
