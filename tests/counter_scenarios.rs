// ==============================================
// KEY COUNTER SCENARIOS (integration)
// ==============================================
//
// End-to-end behavior through the public API only: empty queries, tie
// handling, fail-fast decrement, and long mixed workloads checked against
// a plain HashMap.

use std::collections::HashMap;

use tallykit::{CounterError, KeyCounter};

fn inc(counter: &mut KeyCounter, key: &str) -> u64 {
    counter.increment(key.to_string())
}

// ==============================================
// Basic Scenarios
// ==============================================

mod basic {
    use super::*;

    #[test]
    fn empty_counter_reports_empty_string() {
        let counter: KeyCounter = KeyCounter::new();
        assert_eq!(counter.max_key_or_empty(), "");
        assert_eq!(counter.min_key_or_empty(), "");
        assert_eq!(counter.max_key(), None);
        assert_eq!(counter.min_key(), None);
    }

    #[test]
    fn higher_count_wins_max() {
        let mut counter = KeyCounter::new();
        inc(&mut counter, "a");
        inc(&mut counter, "a");
        inc(&mut counter, "b");

        assert_eq!(counter.max_key_or_empty(), "a");
        assert_eq!(counter.min_key_or_empty(), "b");
    }

    #[test]
    fn tie_accepts_either_key() {
        let mut counter = KeyCounter::new();
        inc(&mut counter, "a");
        inc(&mut counter, "a");
        inc(&mut counter, "b");
        counter.decrement("a").unwrap();

        let max = counter.max_key_or_empty();
        assert!(max == "a" || max == "b", "unexpected max {:?}", max);
    }

    #[test]
    fn single_increment_decrement_leaves_nothing() {
        let mut counter = KeyCounter::new();
        inc(&mut counter, "a");
        counter.decrement("a").unwrap();

        assert_eq!(counter.max_key_or_empty(), "");
        assert_eq!(counter.min_key_or_empty(), "");
        assert!(counter.is_empty());
    }

    #[test]
    fn repeated_queries_stay_within_extreme_group() {
        let mut counter = KeyCounter::new();
        for key in ["x", "y", "z"] {
            inc(&mut counter, key);
        }
        for _ in 0..20 {
            assert!(["x", "y", "z"].contains(&counter.max_key_or_empty()));
            assert!(["x", "y", "z"].contains(&counter.min_key_or_empty()));
        }
    }
}

// ==============================================
// Error Contract
// ==============================================

mod decrement_contract {
    use super::*;

    #[test]
    fn decrement_never_seen_key_is_key_not_found() {
        let mut counter: KeyCounter = KeyCounter::new();
        let err = counter.decrement("nope").unwrap_err();
        assert_eq!(err, CounterError::KeyNotFound);
        assert!(err.is_key_not_found());
        assert_eq!(err.to_string(), "key not found");
    }

    #[test]
    fn decrement_after_reaching_zero_is_key_not_found() {
        let mut counter = KeyCounter::new();
        inc(&mut counter, "a");
        assert_eq!(counter.decrement("a"), Ok(0));
        assert_eq!(counter.decrement("a"), Err(CounterError::KeyNotFound));
    }

    #[test]
    fn failed_decrement_leaves_state_intact() {
        let mut counter = KeyCounter::new();
        inc(&mut counter, "a");
        inc(&mut counter, "a");
        inc(&mut counter, "b");

        assert!(counter.decrement("c").is_err());
        assert_eq!(counter.count("a"), 2);
        assert_eq!(counter.count("b"), 1);
        assert_eq!(counter.bucket_count(), 2);
        assert!(counter.check_invariants().is_ok());
    }
}

// ==============================================
// Chain Shape
// ==============================================

mod chain_shape {
    use super::*;

    #[test]
    fn counts_climb_and_fall_through_the_chain() {
        let mut counter = KeyCounter::new();
        for expected in 1..=5 {
            assert_eq!(inc(&mut counter, "hot"), expected);
        }
        inc(&mut counter, "cold");

        assert_eq!(counter.max_entry(), Some((&"hot".to_string(), 5)));
        assert_eq!(counter.min_entry(), Some((&"cold".to_string(), 1)));

        for expected in (0..5).rev() {
            assert_eq!(counter.decrement("hot"), Ok(expected));
            assert!(counter.check_invariants().is_ok());
        }
        assert_eq!(counter.max_key_or_empty(), "cold");
        assert_eq!(counter.bucket_count(), 1);
    }

    #[test]
    fn iteration_orders_keys_by_count() {
        let mut counter = KeyCounter::new();
        for (key, times) in [("one", 1), ("three", 3), ("two", 2)] {
            for _ in 0..times {
                inc(&mut counter, key);
            }
        }
        let order: Vec<_> = counter.iter().map(|(k, c)| (k.as_str(), c)).collect();
        assert_eq!(order, vec![("one", 1), ("two", 2), ("three", 3)]);
    }
}

// ==============================================
// Mixed Workload vs Model
// ==============================================

mod mixed_workload {
    use super::*;
    use rand::rngs::SmallRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn ten_thousand_ops_match_hashmap_model() {
        let mut rng = SmallRng::seed_from_u64(0x9E37_79B9_7F4A_7C15);
        let mut counter: KeyCounter = KeyCounter::new();
        let mut model: HashMap<String, u64> = HashMap::new();

        for step in 0..10_000 {
            let key = format!("k{}", rng.random_range(0..64u32));
            if rng.random_ratio(1, 3) {
                let result = counter.decrement(key.as_str());
                match model.get_mut(&key) {
                    Some(count) => {
                        *count -= 1;
                        assert_eq!(result, Ok(*count));
                        if *count == 0 {
                            model.remove(&key);
                        }
                    }
                    None => assert_eq!(result, Err(CounterError::KeyNotFound)),
                }
            } else {
                let new = counter.increment(key.clone());
                let entry = model.entry(key).or_insert(0);
                *entry += 1;
                assert_eq!(new, *entry);
            }

            if step % 500 == 0 {
                assert!(counter.check_invariants().is_ok());
            }
            assert_eq!(counter.max_count(), model.values().copied().max());
            assert_eq!(counter.min_count(), model.values().copied().min());
        }

        assert_eq!(counter.len(), model.len());
        for (key, count) in &model {
            assert_eq!(counter.count(key.as_str()), *count);
        }
    }
}
