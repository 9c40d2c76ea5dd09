use tallykit::KeyCounter;

fn main() {
    let mut counter: KeyCounter = KeyCounter::new();

    counter.increment("a".to_string());
    counter.increment("a".to_string());
    counter.increment("b".to_string());

    println!("max key: {}", counter.max_key_or_empty());
    println!("min key: {}", counter.min_key_or_empty());

    counter.decrement("a").ok();
    counter.decrement("a").ok();

    println!("after draining a, max key: {}", counter.max_key_or_empty());
    println!("decrement missing: {:?}", counter.decrement("zzz"));
}

// Expected output:
// max key: a
// min key: b
// after draining a, max key: b
// decrement missing: Err(KeyNotFound)
//
// Explanation: "a" reaches 2 and "b" stays at 1. Two decrements drop "a" from
// the counter entirely, leaving "b" as both extremes. Decrementing an absent
// key is reported instead of silently ignored.
