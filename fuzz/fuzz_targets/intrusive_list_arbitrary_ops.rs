#![no_main]

use evictkit::ds::{IntrusiveList, SlotId};
use libfuzzer_sys::fuzz_target;

// Fuzz arbitrary operation sequences on IntrusiveList
//
// Random push_front, push_back, pop_front, pop_back, move_to_front,
// move_to_back, remove and clear, with stale ids mixed in. The structure must
// stay consistent after every step.
fuzz_target!(|data: &[u8]| {
    let mut list: IntrusiveList<u32> = IntrusiveList::new();
    let mut ids = Vec::new();

    for pair in data.chunks_exact(2) {
        let op = pair[0] % 8;
        let value = u32::from(pair[1]);
        let pick = |ids: &Vec<SlotId>| {
            if ids.is_empty() {
                None
            } else {
                Some(ids[value as usize % ids.len()])
            }
        };

        match op {
            0 => {
                let id = list.push_front(value);
                ids.push(id);
                assert_eq!(list.front_id(), Some(id));
            },
            1 => {
                let id = list.push_back(value);
                ids.push(id);
                assert_eq!(list.back_id(), Some(id));
            },
            2 => {
                let before = list.len();
                match list.pop_front() {
                    Some(_) => assert_eq!(list.len(), before - 1),
                    None => assert!(list.is_empty()),
                }
            },
            3 => {
                let before = list.len();
                match list.pop_back() {
                    Some(_) => assert_eq!(list.len(), before - 1),
                    None => assert!(list.is_empty()),
                }
            },
            4 => {
                if let Some(id) = pick(&ids) {
                    if list.move_to_front(id) {
                        assert_eq!(list.front_id(), Some(id));
                    }
                }
            },
            5 => {
                if let Some(id) = pick(&ids) {
                    if list.move_to_back(id) {
                        assert_eq!(list.back_id(), Some(id));
                    }
                }
            },
            6 => {
                if let Some(id) = pick(&ids) {
                    let was_live = list.contains(id);
                    assert_eq!(list.remove(id).is_some(), was_live);
                    assert!(!list.contains(id));
                }
            },
            _ => {
                list.clear();
                ids.clear();
                assert!(list.is_empty());
            },
        }

        assert_eq!(list.iter().count(), list.len());
        assert!(list.check_invariants().is_ok());
    }
});
