#![no_main]

use libfuzzer_sys::fuzz_target;
use tallykit::KeyCounter;

// Fuzz arbitrary operation sequences on KeyCounter
//
// Tests random sequences of increment, decrement, remove, max/min queries
// and clear to find edge cases and invariant violations.
fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    let mut counter: KeyCounter<u8> = KeyCounter::new();

    for chunk in data.chunks_exact(2) {
        let op = chunk[0] % 8;
        let key = chunk[1];

        match op {
            0 | 1 | 2 => {
                // Increment (weighted so counts actually grow)
                let before = counter.count(&key);
                assert_eq!(counter.increment(key), before + 1);
            }
            3 | 4 => {
                // Decrement
                let before = counter.count(&key);
                match counter.decrement(&key) {
                    Ok(after) => assert_eq!(after + 1, before),
                    Err(err) => {
                        assert!(err.is_key_not_found());
                        assert_eq!(before, 0);
                    }
                }
            }
            5 => {
                // Remove
                let before = counter.count(&key);
                let removed = counter.remove(&key);
                assert_eq!(removed.unwrap_or(0), before);
                assert!(!counter.contains(&key));
            }
            6 => {
                // Max/min queries (read-only)
                let _ = counter.max_key();
                let _ = counter.min_key();
            }
            7 => {
                // Clear (rarely)
                if key == 0 {
                    counter.clear();
                }
            }
            _ => unreachable!(),
        }

        // Validate invariants after each operation
        counter.debug_validate_invariants();

        // Check basic consistency
        if counter.is_empty() {
            assert_eq!(counter.max_key(), None);
            assert_eq!(counter.min_key(), None);
            assert_eq!(counter.bucket_count(), 0);
        } else {
            let max = counter.max_entry().unwrap();
            let min = counter.min_entry().unwrap();
            assert_eq!(counter.count(max.0), max.1);
            assert_eq!(counter.count(min.0), min.1);
            assert!(min.1 <= max.1);
        }
    }
});
