#![no_main]

use evictkit::ds::FrequencyBuckets;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on FrequencyBuckets
//
// insert, touch, pop_min, remove and decay_by in any order. min_frequency must
// match the smallest live frequency and pop_min must never return an entry
// above it.
fuzz_target!(|data: &[u8]| {
    let mut buckets: FrequencyBuckets<u8, u32> = FrequencyBuckets::new();

    for pair in data.chunks_exact(2) {
        let key = pair[1] % 64;
        match pair[0] % 6 {
            0 => {
                let existed = buckets.contains(&key);
                assert_eq!(buckets.insert(key, u32::from(key)), !existed);
                if !existed {
                    assert_eq!(buckets.frequency(&key), Some(1));
                }
            },
            1 | 2 => {
                let before = buckets.frequency(&key);
                let after = buckets.touch(&key);
                assert_eq!(after, before.map(|f| f + 1));
            },
            3 => {
                let min = buckets.min_frequency();
                if let Some((popped, _, freq)) = buckets.pop_min() {
                    assert_eq!(freq, min);
                    assert!(!buckets.contains(&popped));
                }
            },
            4 => {
                let before = buckets.frequency(&key);
                assert_eq!(buckets.remove(&key).map(|(_, f)| f), before);
            },
            _ => {
                let total = buckets.decay_by(u64::from(pair[1] % 8));
                assert_eq!(total, buckets.total_frequency());
            },
        }

        let smallest = buckets.iter().map(|(_, _, f)| f).min();
        assert_eq!(buckets.min_frequency(), smallest.unwrap_or(1));
        assert!(buckets.check_invariants().is_ok());
    }
});
