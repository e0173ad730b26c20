#![no_main]

use evictkit::policy::arc::ArcCache;
use evictkit::traits::CachePolicy;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary put/get/remove/purge sequences on ArcCache
//
// The first two bytes pick capacity and promotion threshold. Part capacities
// must always sum to the configured capacity and no key may be resident in
// both parts or be both a ghost and resident.
fuzz_target!(|data: &[u8]| {
    let [cap, threshold, rest @ ..] = data else {
        return;
    };
    let capacity = usize::from(cap % 8) + 1;
    let threshold = usize::from(threshold % 4) + 1;
    let cache: ArcCache<u8, u16> = ArcCache::with_transform_threshold(capacity, threshold);

    for pair in rest.chunks_exact(2) {
        let key = pair[1] % 32;
        match pair[0] % 8 {
            0..=2 => cache.put(key, u16::from(key) * 3),
            3..=5 => {
                if let Some(value) = cache.get(&key) {
                    assert_eq!(value, u16::from(key) * 3);
                }
            },
            6 => {
                cache.remove(&key);
                assert!(!cache.contains(&key));
            },
            _ => {
                cache.purge();
                assert!(cache.is_empty());
                assert_eq!(cache.lru_capacity(), capacity - capacity / 2);
            },
        }

        assert_eq!(cache.lru_capacity() + cache.lfu_capacity(), capacity);
        assert!(cache.len() <= capacity);
        assert!(cache.check_invariants().is_ok());
    }
});
