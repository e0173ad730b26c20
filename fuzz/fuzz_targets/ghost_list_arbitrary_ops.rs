#![no_main]

use evictkit::ds::GhostList;
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary record/remove/clear sequences on GhostList
//
// The first byte picks the capacity. The list must never exceed it, a just
// recorded key must be present, and a forgotten key must be absent.
fuzz_target!(|data: &[u8]| {
    let Some((&cap, rest)) = data.split_first() else {
        return;
    };
    let capacity = usize::from(cap % 16);
    let mut ghosts: GhostList<u8> = GhostList::new(capacity);

    for pair in rest.chunks_exact(2) {
        let key = pair[1] % 32;
        match pair[0] % 4 {
            0 | 1 => {
                let forgotten = ghosts.record(key);
                if capacity == 0 {
                    assert!(ghosts.is_empty());
                } else {
                    assert!(ghosts.contains(&key));
                    assert_eq!(ghosts.iter().next(), Some(&key));
                }
                if let Some(old) = forgotten {
                    assert_ne!(old, key);
                    assert!(!ghosts.contains(&old));
                }
            },
            2 => {
                let was_present = ghosts.contains(&key);
                assert_eq!(ghosts.remove(&key), was_present);
                assert!(!ghosts.contains(&key));
            },
            _ => {
                ghosts.clear();
                assert!(ghosts.is_empty());
            },
        }

        assert!(ghosts.len() <= capacity);
        assert!(ghosts.check_invariants().is_ok());
    }
});
