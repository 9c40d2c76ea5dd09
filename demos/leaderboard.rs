use tallykit::KeyCounter;

fn main() {
    let words = "the quick brown fox jumps over the lazy dog the fox";
    let counter: KeyCounter<&str> = words.split_whitespace().collect();

    for bucket in counter.iter_buckets_rev() {
        let mut keys: Vec<&str> = bucket.keys().copied().collect();
        keys.sort_unstable();
        println!("{}: {}", bucket.count(), keys.join(" "));
    }

    if let Some((word, count)) = counter.max_entry() {
        println!("top word: {word} ({count})");
    }
}

// Expected output:
// 3: the
// 2: fox
// 1: brown dog jumps lazy over quick
// top word: the (3)
//
// Explanation: buckets are walked from the highest count down, and each bucket
// groups every word that shares its count.
