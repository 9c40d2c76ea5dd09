//! Key counter with O(1) increment, decrement, and max/min key queries.
//!
//! Tracks an occurrence count per key and answers "which key has the
//! highest (lowest) count?" in constant time. Keys sharing a count live in one
//! [`Bucket`]; buckets form a doubly linked chain ordered by strictly
//! increasing count between two fixed sentinels.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────────┐
//! │                          KeyCounter<K> Layout                               │
//! │                                                                             │
//! │   ┌──────────────────────────────┐   ┌─────────────────────────────────┐   │
//! │   │  index: HashMap<K, SlotId>   │   │  buckets: SlotArena<Bucket<K>>  │   │
//! │   │                              │   │                                 │   │
//! │   │  ┌──────────┬──────────┐     │   │  ┌──────┬────────────────────┐  │   │
//! │   │  │   Key    │  SlotId  │     │   │  │ Slot │ Bucket             │  │   │
//! │   │  ├──────────┼──────────┤     │   │  ├──────┼────────────────────┤  │   │
//! │   │  │  "apple" │   id_3   │─────┼───┼─►│ id_0 │ head  (count 0)    │  │   │
//! │   │  │  "pear"  │   id_2   │─────┼───┼─►│ id_1 │ tail  (count 0)    │  │   │
//! │   │  │  "plum"  │   id_2   │─────┼───┼─►│ id_2 │ count 1 {pear,plum}│  │   │
//! │   │  └──────────┴──────────┘     │   │  │ id_3 │ count 3 {apple}    │  │   │
//! │   └──────────────────────────────┘   │  └──────┴────────────────────┘  │   │
//! │                                      └─────────────────────────────────┘   │
//! │                                                                             │
//! │   Chain (strictly increasing count):                                        │
//! │                                                                             │
//! │     head ◄──► [1: pear, plum] ◄──► [3: apple] ◄──► tail                     │
//! │               ▲ min_key                ▲ max_key                            │
//! └─────────────────────────────────────────────────────────────────────────────┘
//!
//! Increment Flow
//! ──────────────
//!
//!   increment("pear"):
//!     1. Lookup id_2 in index (count 1)
//!     2. Take "pear" out of id_2
//!     3. Successor id_3 has count 3, not 2 → allocate [2] after id_2
//!     4. Add "pear" to [2], point index at it
//!     5. id_2 still holds "plum" → stays linked
//!
//! Decrement Flow
//! ──────────────
//!
//!   decrement("apple"):
//!     1. Lookup id_3 in index (count 3)
//!     2. Take "apple" out of id_3
//!     3. Predecessor has count 2 → reuse it
//!     4. id_3 is now empty → unlink and free the slot
//! ```
//!
//! ## Operations
//!
//! | Operation    | Time   | Notes                                        |
//! |--------------|--------|----------------------------------------------|
//! | `increment`  | O(1)   | New keys start at count 1                    |
//! | `decrement`  | O(1)   | Count 1 → key dropped; missing → `KeyNotFound` |
//! | `max_key`    | O(1)   | Any key at the highest count                 |
//! | `min_key`    | O(1)   | Any key at the lowest count                  |
//! | `remove`     | O(1)   | Drops a key regardless of its count          |
//! | `count`      | O(1)   | 0 for untracked keys                         |
//! | `iter`       | O(n)   | Ascending by count                           |
//! | `check_invariants` | O(n) | Full chain + index walk               |
//!
//! Only neighbors of the touched bucket are ever visited, so every mutating
//! operation is independent of how many keys or distinct counts exist.
//!
//! ## Example Usage
//!
//! ```
//! use tallykit::ds::KeyCounter;
//!
//! let mut counter: KeyCounter = KeyCounter::new();
//! counter.increment("a".to_string());
//! counter.increment("a".to_string());
//! counter.increment("b".to_string());
//!
//! assert_eq!(counter.max_key().map(String::as_str), Some("a"));
//! assert_eq!(counter.min_key().map(String::as_str), Some("b"));
//!
//! counter.decrement("a").unwrap();
//! // "a" and "b" now tie at count 1; either may be reported.
//! let max = counter.max_key_or_empty();
//! assert!(max == "a" || max == "b");
//! ```
//!
//! ## Thread Safety
//!
//! - [`KeyCounter`]: Not synchronized; bucket relinking is a multi-step
//!   update and must have a single owner.
//! - [`ConcurrentKeyCounter`]: One `RwLock` around the whole counter
//!   (`concurrency` feature).

use rustc_hash::FxHashMap;
use std::borrow::Borrow;
use std::hash::Hash;

use crate::ds::bucket::Bucket;
use crate::ds::slot_arena::{SlotArena, SlotId};
use crate::error::{CounterError, InvariantError, Result};

#[cfg(feature = "metrics")]
use crate::metrics::metrics_impl::CounterMetrics;
#[cfg(feature = "metrics")]
use crate::metrics::snapshot::CounterMetricsSnapshot;
#[cfg(feature = "metrics")]
use crate::metrics::traits::{
    CounterMetricsReadRecorder, CounterMetricsRecorder, MetricsReset, MetricsSnapshotProvider,
};

/// Default bucket pre-allocation.
/// Real workloads rarely hold more than a few dozen distinct counts at once.
pub const DEFAULT_BUCKET_PREALLOC: usize = 32;

/// O(1) occurrence counter with constant-time max/min key lookup.
///
/// # Type Parameters
///
/// - `K`: Key type, must be `Eq + Hash + Clone`. Defaults to `String`.
///
/// # Example
///
/// ```
/// use tallykit::ds::KeyCounter;
///
/// let mut words: KeyCounter<&str> = KeyCounter::new();
/// for word in "the cat saw the dog and the bird".split(' ') {
///     words.increment(word);
/// }
///
/// assert_eq!(words.max_entry(), Some((&"the", 3)));
/// assert_eq!(words.count("cat"), 1);
/// assert_eq!(words.count("fish"), 0);
/// assert_eq!(words.bucket_count(), 2);
/// ```
#[derive(Debug)]
pub struct KeyCounter<K = String> {
    buckets: SlotArena<Bucket<K>>,
    index: FxHashMap<K, SlotId>,
    head: SlotId,
    tail: SlotId,
    #[cfg(feature = "metrics")]
    metrics: CounterMetrics,
}

impl<K> KeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    /// Creates an empty counter.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let counter: KeyCounter = KeyCounter::new();
    /// assert!(counter.is_empty());
    /// assert_eq!(counter.max_key(), None);
    /// ```
    pub fn new() -> Self {
        Self::from_parts(SlotArena::new(), FxHashMap::default())
    }

    /// Creates an empty counter with room for `capacity` keys.
    ///
    /// Uses [`DEFAULT_BUCKET_PREALLOC`] for the bucket arena. For custom
    /// bucket pre-allocation, use
    /// [`with_capacity_and_bucket_hint`](Self::with_capacity_and_bucket_hint).
    pub fn with_capacity(capacity: usize) -> Self {
        Self::with_capacity_and_bucket_hint(capacity, DEFAULT_BUCKET_PREALLOC)
    }

    /// Creates an empty counter with reserved space for keys and buckets.
    ///
    /// # Arguments
    ///
    /// * `capacity` - Pre-allocated space in the key index
    /// * `bucket_hint` - Expected number of distinct counts held at once
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let counter: KeyCounter<u64> = KeyCounter::with_capacity_and_bucket_hint(1_000, 64);
    /// assert!(counter.is_empty());
    /// assert_eq!(counter.bucket_count(), 0);
    /// ```
    pub fn with_capacity_and_bucket_hint(capacity: usize, bucket_hint: usize) -> Self {
        Self::from_parts(
            SlotArena::with_capacity(bucket_hint.saturating_add(2)),
            FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
        )
    }

    fn from_parts(mut buckets: SlotArena<Bucket<K>>, index: FxHashMap<K, SlotId>) -> Self {
        let (head, tail) = Self::link_sentinels(&mut buckets);
        Self {
            buckets,
            index,
            head,
            tail,
            #[cfg(feature = "metrics")]
            metrics: CounterMetrics::default(),
        }
    }

    fn link_sentinels(buckets: &mut SlotArena<Bucket<K>>) -> (SlotId, SlotId) {
        let head = buckets.insert(Bucket::sentinel());
        let tail = buckets.insert(Bucket::sentinel());
        buckets[head].next = Some(tail);
        buckets[tail].prev = Some(head);
        (head, tail)
    }

    /// Returns the number of tracked keys (keys with a positive count).
    #[inline]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns `true` if no key has a positive count.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Returns the number of distinct counts currently held.
    #[inline]
    pub fn bucket_count(&self) -> usize {
        self.buckets.len() - 2
    }

    /// Returns `true` if `key` has a positive count.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index.contains_key(key)
    }

    /// Returns the current count of `key`, `0` if it is not tracked.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let mut counter: KeyCounter = KeyCounter::new();
    /// counter.increment("k".to_string());
    /// counter.increment("k".to_string());
    ///
    /// assert_eq!(counter.count("k"), 2);
    /// assert_eq!(counter.count("missing"), 0);
    /// ```
    #[inline]
    pub fn count<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.index
            .get(key)
            .map_or(0, |&id| self.buckets[id].count())
    }

    /// Adds one occurrence of `key` and returns its new count.
    ///
    /// An untracked key enters at count 1. Counts saturate at `u64::MAX`:
    /// incrementing a key already there leaves it in place.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let mut counter: KeyCounter<&str> = KeyCounter::new();
    /// assert_eq!(counter.increment("a"), 1);
    /// assert_eq!(counter.increment("a"), 2);
    /// assert_eq!(counter.increment("b"), 1);
    /// assert_eq!(counter.bucket_count(), 2);
    /// ```
    pub fn increment(&mut self, key: K) -> u64 {
        #[cfg(feature = "metrics")]
        self.metrics.record_increment_call();

        let Some(&current) = self.index.get(&key) else {
            return self.insert_new(key);
        };

        let count = self.buckets[current].count();
        if count == u64::MAX {
            #[cfg(feature = "metrics")]
            self.metrics.record_increment_saturated();
            return count;
        }

        // index and bucket membership move together; a miss is a bug
        let owned = match self.buckets[current].remove_key(&key) {
            Ok(owned) => owned,
            Err(err) => panic!("key index out of sync with buckets: {}", err),
        };
        let target = self.successor_with_count(current, count + 1);
        self.buckets[target].add_key(owned);
        if let Some(slot) = self.index.get_mut(&key) {
            *slot = target;
        }
        self.unlink_if_empty(current);

        count + 1
    }

    /// Removes one occurrence of `key` and returns its new count.
    ///
    /// When the count reaches zero the key is dropped entirely and `Ok(0)` is
    /// returned.
    ///
    /// # Errors
    ///
    /// [`CounterError::KeyNotFound`] if `key` has no positive count. The
    /// counter is left untouched.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    /// use tallykit::error::CounterError;
    ///
    /// let mut counter: KeyCounter = KeyCounter::new();
    /// counter.increment("a".to_string());
    /// counter.increment("a".to_string());
    ///
    /// assert_eq!(counter.decrement("a"), Ok(1));
    /// assert_eq!(counter.decrement("a"), Ok(0));
    /// assert!(!counter.contains("a"));
    /// assert_eq!(counter.decrement("a"), Err(CounterError::KeyNotFound));
    /// ```
    pub fn decrement<Q>(&mut self, key: &Q) -> Result<u64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_decrement_call();

        let Some(&current) = self.index.get(key) else {
            #[cfg(feature = "metrics")]
            self.metrics.record_decrement_missing();
            return Err(CounterError::KeyNotFound);
        };

        let count = self.buckets[current].count();
        let owned = self.buckets[current].remove_key(key)?;

        if count > 1 {
            let target = self.predecessor_with_count(current, count - 1);
            self.buckets[target].add_key(owned);
            if let Some(slot) = self.index.get_mut(key) {
                *slot = target;
            }
        } else {
            self.index.remove(key);
            #[cfg(feature = "metrics")]
            self.metrics.record_decrement_dropped_key();
        }
        self.unlink_if_empty(current);

        Ok(count - 1)
    }

    /// Drops `key` regardless of its count; returns the count it held.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let mut counter: KeyCounter<&str> = KeyCounter::new();
    /// counter.increment("a");
    /// counter.increment("a");
    ///
    /// assert_eq!(counter.remove("a"), Some(2));
    /// assert_eq!(counter.remove("a"), None);
    /// assert!(counter.is_empty());
    /// ```
    pub fn remove<Q>(&mut self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        #[cfg(feature = "metrics")]
        self.metrics.record_remove_call();

        let &current = self.index.get(key)?;
        let count = self.buckets[current].count();
        if let Err(err) = self.buckets[current].remove_key(key) {
            panic!("key index out of sync with buckets: {}", err);
        }
        self.index.remove(key);
        self.unlink_if_empty(current);

        #[cfg(feature = "metrics")]
        self.metrics.record_remove_found();
        Some(count)
    }

    /// Increments every key in `keys`; returns how many increments ran.
    pub fn increment_batch<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let mut applied = 0;
        for key in keys {
            self.increment(key);
            applied += 1;
        }
        applied
    }

    /// Decrements every key in `keys`; returns how many were tracked.
    ///
    /// Untracked keys are skipped instead of aborting the batch.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let mut counter: KeyCounter<&str> = KeyCounter::new();
    /// counter.increment_batch(["a", "b", "b"]);
    ///
    /// assert_eq!(counter.decrement_batch(["a", "b", "missing"]), 2);
    /// assert_eq!(counter.count("a"), 0);
    /// assert_eq!(counter.count("b"), 1);
    /// ```
    pub fn decrement_batch<I>(&mut self, keys: I) -> usize
    where
        I: IntoIterator<Item = K>,
    {
        let mut found = 0;
        for key in keys {
            if self.decrement(&key).is_ok() {
                found += 1;
            }
        }
        found
    }

    /// Returns any key holding the highest count, or `None` when empty.
    ///
    /// Ties are broken arbitrarily and repeated calls may disagree.
    #[inline]
    pub fn max_key(&self) -> Option<&K> {
        #[cfg(feature = "metrics")]
        self.metrics.record_max_key_call();

        let key = self.max_bucket().and_then(Bucket::pick_any_key);

        #[cfg(feature = "metrics")]
        if key.is_some() {
            self.metrics.record_max_key_found();
        }
        key
    }

    /// Returns any key holding the lowest count, or `None` when empty.
    ///
    /// Ties are broken arbitrarily and repeated calls may disagree.
    #[inline]
    pub fn min_key(&self) -> Option<&K> {
        #[cfg(feature = "metrics")]
        self.metrics.record_min_key_call();

        let key = self.min_bucket().and_then(Bucket::pick_any_key);

        #[cfg(feature = "metrics")]
        if key.is_some() {
            self.metrics.record_min_key_found();
        }
        key
    }

    /// Returns the highest count currently held.
    pub fn max_count(&self) -> Option<u64> {
        self.max_bucket().map(Bucket::count)
    }

    /// Returns the lowest count currently held.
    pub fn min_count(&self) -> Option<u64> {
        self.min_bucket().map(Bucket::count)
    }

    /// Returns `(key, count)` for a key at the highest count.
    pub fn max_entry(&self) -> Option<(&K, u64)> {
        let bucket = self.max_bucket()?;
        Some((bucket.pick_any_key()?, bucket.count()))
    }

    /// Returns `(key, count)` for a key at the lowest count.
    pub fn min_entry(&self) -> Option<(&K, u64)> {
        let bucket = self.min_bucket()?;
        Some((bucket.pick_any_key()?, bucket.count()))
    }

    /// Iterates buckets from lowest to highest count. Sentinels are skipped.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let mut counter: KeyCounter<&str> = KeyCounter::new();
    /// counter.increment_batch(["a", "b", "b", "c", "c", "c"]);
    ///
    /// let counts: Vec<u64> = counter.iter_buckets().map(|b| b.count()).collect();
    /// assert_eq!(counts, vec![1, 2, 3]);
    /// ```
    pub fn iter_buckets(&self) -> BucketIter<'_, K> {
        BucketIter {
            buckets: &self.buckets,
            current: self.buckets[self.head].next,
            direction: Direction::Ascending,
        }
    }

    /// Iterates buckets from highest to lowest count.
    pub fn iter_buckets_rev(&self) -> BucketIter<'_, K> {
        BucketIter {
            buckets: &self.buckets,
            current: self.buckets[self.tail].prev,
            direction: Direction::Descending,
        }
    }

    /// Iterates `(key, count)` pairs in ascending count order.
    ///
    /// Order among keys sharing a count is unspecified.
    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.iter_buckets()
            .flat_map(|bucket| bucket.keys().map(move |key| (key, bucket.count())))
    }

    /// Clears all state. Sentinels are re-created.
    pub fn clear(&mut self) {
        #[cfg(feature = "metrics")]
        {
            self.metrics.record_clear();
            for _ in 0..self.bucket_count() {
                self.metrics.record_bucket_free();
            }
        }

        self.index.clear();
        self.buckets.clear();
        let (head, tail) = Self::link_sentinels(&mut self.buckets);
        self.head = head;
        self.tail = tail;
    }

    /// Clears all state and shrinks internal storage.
    pub fn clear_shrink(&mut self) {
        self.clear();
        self.buckets.shrink_to_fit();
        self.index.shrink_to_fit();
    }

    /// Returns an approximate memory footprint in bytes.
    ///
    /// Walks live buckets, so this is O(distinct counts).
    pub fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>()
            + self.buckets.approx_bytes()
            + self.index.capacity() * std::mem::size_of::<(K, SlotId)>()
            + self
                .buckets
                .iter()
                .map(|(_, bucket)| bucket.approx_bytes())
                .sum::<usize>()
    }

    /// Verifies chain order, bucket occupancy and index agreement.
    ///
    /// O(n). Intended for tests, fuzzing and debug tooling.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::KeyCounter;
    ///
    /// let mut counter: KeyCounter<u32> = KeyCounter::new();
    /// for key in [1, 2, 2, 3, 3, 3] {
    ///     counter.increment(key);
    /// }
    /// counter.decrement(&3).unwrap();
    /// assert!(counter.check_invariants().is_ok());
    /// ```
    pub fn check_invariants(&self) -> std::result::Result<(), InvariantError> {
        let head = self
            .buckets
            .get(self.head)
            .ok_or_else(|| InvariantError::new("head sentinel missing"))?;
        let tail = self
            .buckets
            .get(self.tail)
            .ok_or_else(|| InvariantError::new("tail sentinel missing"))?;
        if !head.is_sentinel() || !head.is_empty() || head.prev.is_some() {
            return Err(InvariantError::new("head sentinel corrupted"));
        }
        if !tail.is_sentinel() || !tail.is_empty() || tail.next.is_some() {
            return Err(InvariantError::new("tail sentinel corrupted"));
        }

        let mut prev = self.head;
        let mut current = head.next;
        let mut last_count = 0u64;
        let mut linked = 0usize;
        let mut keys_seen = 0usize;

        loop {
            let id = current.ok_or_else(|| {
                InvariantError::new(format!("chain broken after slot {}", prev.index()))
            })?;
            let bucket = self.buckets.get(id).ok_or_else(|| {
                InvariantError::new(format!("chain links to stale slot {}", id.index()))
            })?;
            if bucket.prev != Some(prev) {
                return Err(InvariantError::new(format!(
                    "slot {} prev link does not point back to slot {}",
                    id.index(),
                    prev.index()
                )));
            }
            if id == self.tail {
                break;
            }
            if linked >= self.buckets.len() {
                return Err(InvariantError::new("bucket chain contains a cycle"));
            }
            if bucket.is_sentinel() {
                return Err(InvariantError::new(format!(
                    "bucket in slot {} has count 0",
                    id.index()
                )));
            }
            if bucket.count() <= last_count {
                return Err(InvariantError::new(format!(
                    "chain not strictly increasing: {} follows {}",
                    bucket.count(),
                    last_count
                )));
            }
            if bucket.is_empty() {
                return Err(InvariantError::new(format!(
                    "linked bucket with count {} is empty",
                    bucket.count()
                )));
            }
            for key in bucket.keys() {
                if self.index.get(key) != Some(&id) {
                    return Err(InvariantError::new(format!(
                        "key in bucket with count {} is not indexed to it",
                        bucket.count()
                    )));
                }
            }

            keys_seen += bucket.len();
            linked += 1;
            last_count = bucket.count();
            prev = id;
            current = bucket.next;
        }

        if linked + 2 != self.buckets.len() {
            return Err(InvariantError::new(format!(
                "{} buckets allocated but {} linked",
                self.buckets.len() - 2,
                linked
            )));
        }
        if keys_seen != self.index.len() {
            return Err(InvariantError::new(format!(
                "index holds {} keys but buckets hold {}",
                self.index.len(),
                keys_seen
            )));
        }
        Ok(())
    }

    #[cfg(any(test, debug_assertions))]
    /// Panics with the failing invariant if the counter is inconsistent.
    pub fn debug_validate_invariants(&self) {
        if let Err(err) = self.check_invariants() {
            panic!("KeyCounter invariant violated: {}", err);
        }
    }

    fn insert_new(&mut self, key: K) -> u64 {
        #[cfg(feature = "metrics")]
        self.metrics.record_increment_new_key();

        let target = self.successor_with_count(self.head, 1);
        self.buckets[target].add_key(key.clone());
        self.index.insert(key, target);
        1
    }

    fn max_bucket(&self) -> Option<&Bucket<K>> {
        let id = self.buckets[self.tail].prev?;
        let bucket = &self.buckets[id];
        (!bucket.is_sentinel()).then_some(bucket)
    }

    fn min_bucket(&self) -> Option<&Bucket<K>> {
        let id = self.buckets[self.head].next?;
        let bucket = &self.buckets[id];
        (!bucket.is_sentinel()).then_some(bucket)
    }

    /// Bucket right after `at` if it holds `count`, otherwise a fresh one
    /// spliced in after `at`.
    fn successor_with_count(&mut self, at: SlotId, count: u64) -> SlotId {
        match self.buckets[at].next {
            Some(next) if self.buckets[next].count() == count => next,
            _ => self.link_after(at, count),
        }
    }

    /// Bucket right before `at` if it holds `count`, otherwise a fresh one
    /// spliced in before `at`.
    fn predecessor_with_count(&mut self, at: SlotId, count: u64) -> SlotId {
        let prev = self.buckets[at].prev.unwrap_or(self.head);
        if self.buckets[prev].count() == count {
            prev
        } else {
            self.link_after(prev, count)
        }
    }

    fn link_after(&mut self, at: SlotId, count: u64) -> SlotId {
        #[cfg(feature = "metrics")]
        self.metrics.record_bucket_alloc();

        let next = self.buckets[at].next;
        let mut bucket = Bucket::new(count);
        bucket.prev = Some(at);
        bucket.next = next;
        let id = self.buckets.insert(bucket);

        self.buckets[at].next = Some(id);
        if let Some(next) = next {
            self.buckets[next].prev = Some(id);
        }
        id
    }

    fn unlink_if_empty(&mut self, id: SlotId) {
        let bucket = &self.buckets[id];
        if bucket.is_sentinel() || !bucket.is_empty() {
            return;
        }
        let (prev, next) = (bucket.prev, bucket.next);
        if let Some(prev) = prev {
            self.buckets[prev].next = next;
        }
        if let Some(next) = next {
            self.buckets[next].prev = prev;
        }
        self.buckets.remove(id);

        #[cfg(feature = "metrics")]
        self.metrics.record_bucket_free();
    }
}

impl KeyCounter<String> {
    /// [`max_key`](Self::max_key) with `""` standing in for "no keys".
    pub fn max_key_or_empty(&self) -> &str {
        self.max_key().map_or("", String::as_str)
    }

    /// [`min_key`](Self::min_key) with `""` standing in for "no keys".
    pub fn min_key_or_empty(&self) -> &str {
        self.min_key().map_or("", String::as_str)
    }
}

#[cfg(feature = "metrics")]
impl<K> KeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    pub fn metrics_snapshot(&self) -> CounterMetricsSnapshot {
        CounterMetricsSnapshot {
            increment_calls: self.metrics.increment_calls,
            increment_new_keys: self.metrics.increment_new_keys,
            increment_saturated: self.metrics.increment_saturated,
            decrement_calls: self.metrics.decrement_calls,
            decrement_missing: self.metrics.decrement_missing,
            decrement_dropped_keys: self.metrics.decrement_dropped_keys,
            remove_calls: self.metrics.remove_calls,
            remove_found: self.metrics.remove_found,
            bucket_allocs: self.metrics.bucket_allocs,
            bucket_frees: self.metrics.bucket_frees,
            max_key_calls: self.metrics.max_key_calls.get(),
            max_key_found: self.metrics.max_key_found.get(),
            min_key_calls: self.metrics.min_key_calls.get(),
            min_key_found: self.metrics.min_key_found.get(),
            clear_calls: self.metrics.clear_calls,
            len: self.len(),
            bucket_count: self.bucket_count(),
        }
    }

    /// Zeroes every metrics counter. Counter contents are untouched.
    pub fn reset_metrics(&mut self) {
        self.metrics.reset_metrics();
    }
}

#[cfg(feature = "metrics")]
impl<K> MetricsSnapshotProvider<CounterMetricsSnapshot> for KeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    fn snapshot(&self) -> CounterMetricsSnapshot {
        self.metrics_snapshot()
    }
}

impl<K> Default for KeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K> Extend<K> for KeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.increment(key);
        }
    }
}

impl<K> FromIterator<K> for KeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut counter = Self::new();
        counter.extend(iter);
        counter
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Direction {
    Ascending,
    Descending,
}

/// Iterator over linked buckets, see [`KeyCounter::iter_buckets`].
#[derive(Debug)]
pub struct BucketIter<'a, K> {
    buckets: &'a SlotArena<Bucket<K>>,
    current: Option<SlotId>,
    direction: Direction,
}

impl<'a, K> Iterator for BucketIter<'a, K> {
    type Item = &'a Bucket<K>;

    fn next(&mut self) -> Option<Self::Item> {
        let bucket = self.buckets.get(self.current?)?;
        if bucket.is_sentinel() {
            self.current = None;
            return None;
        }
        self.current = match self.direction {
            Direction::Ascending => bucket.next,
            Direction::Descending => bucket.prev,
        };
        Some(bucket)
    }
}

/// Counter behind a single `RwLock` for shared use across threads.
///
/// Every mutation takes the write lock, so each operation's relinking is
/// atomic with respect to other callers. Queries return owned keys because
/// the lock is released before the caller sees the result.
///
/// # Example
///
/// ```
/// use std::sync::Arc;
/// use std::thread;
/// use tallykit::ds::ConcurrentKeyCounter;
///
/// let counter = Arc::new(ConcurrentKeyCounter::new());
///
/// let handles: Vec<_> = (0..4).map(|t| {
///     let counter = Arc::clone(&counter);
///     thread::spawn(move || {
///         for _ in 0..=t {
///             counter.increment(format!("worker_{}", t));
///         }
///     })
/// }).collect();
///
/// for h in handles {
///     h.join().unwrap();
/// }
///
/// assert_eq!(counter.len(), 4);
/// assert_eq!(counter.max_entry(), Some(("worker_3".to_string(), 4)));
/// ```
#[cfg(feature = "concurrency")]
#[derive(Debug)]
pub struct ConcurrentKeyCounter<K = String> {
    inner: parking_lot::RwLock<KeyCounter<K>>,
}

#[cfg(feature = "concurrency")]
impl<K> ConcurrentKeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            inner: parking_lot::RwLock::new(KeyCounter::new()),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            inner: parking_lot::RwLock::new(KeyCounter::with_capacity(capacity)),
        }
    }

    /// Wraps an existing counter.
    pub fn from_counter(counter: KeyCounter<K>) -> Self {
        Self {
            inner: parking_lot::RwLock::new(counter),
        }
    }

    pub fn into_inner(self) -> KeyCounter<K> {
        self.inner.into_inner()
    }

    pub fn increment(&self, key: K) -> u64 {
        self.inner.write().increment(key)
    }

    pub fn decrement<Q>(&self, key: &Q) -> Result<u64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.write().decrement(key)
    }

    pub fn remove<Q>(&self, key: &Q) -> Option<u64>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.write().remove(key)
    }

    pub fn count<Q>(&self, key: &Q) -> u64
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.read().count(key)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.inner.read().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn max_key(&self) -> Option<K> {
        self.inner.read().max_key().cloned()
    }

    pub fn min_key(&self) -> Option<K> {
        self.inner.read().min_key().cloned()
    }

    pub fn max_entry(&self) -> Option<(K, u64)> {
        self.inner
            .read()
            .max_entry()
            .map(|(key, count)| (key.clone(), count))
    }

    pub fn min_entry(&self) -> Option<(K, u64)> {
        self.inner
            .read()
            .min_entry()
            .map(|(key, count)| (key.clone(), count))
    }

    pub fn clear(&self) {
        self.inner.write().clear();
    }

    /// Runs `f` under the read lock.
    pub fn with_read<R>(&self, f: impl FnOnce(&KeyCounter<K>) -> R) -> R {
        f(&self.inner.read())
    }

    /// Runs `f` under the write lock, making multi-step sequences atomic.
    ///
    /// # Example
    ///
    /// ```
    /// use tallykit::ds::ConcurrentKeyCounter;
    ///
    /// let counter: ConcurrentKeyCounter<&str> = ConcurrentKeyCounter::new();
    /// counter.increment("a");
    ///
    /// // Move one occurrence from "a" to "b" without a window in between
    /// counter.with_write(|c| {
    ///     if c.decrement("a").is_ok() {
    ///         c.increment("b");
    ///     }
    /// });
    /// assert_eq!(counter.count("a"), 0);
    /// assert_eq!(counter.count("b"), 1);
    /// ```
    pub fn with_write<R>(&self, f: impl FnOnce(&mut KeyCounter<K>) -> R) -> R {
        f(&mut self.inner.write())
    }
}

#[cfg(feature = "concurrency")]
impl<K> Default for ConcurrentKeyCounter<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}


#[cfg(test)]
mod property_tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::HashMap;

    #[derive(Debug, Clone)]
    enum Op {
        Increment(u8),
        Decrement(u8),
        Remove(u8),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            3 => (0u8..12).prop_map(Op::Increment),
            2 => (0u8..12).prop_map(Op::Decrement),
            1 => (0u8..12).prop_map(Op::Remove),
        ]
    }

    fn key(k: u8) -> String {
        format!("key_{}", k)
    }

    fn apply(counter: &mut KeyCounter, model: &mut HashMap<String, u64>, op: &Op) {
        match *op {
            Op::Increment(k) => {
                let new = counter.increment(key(k));
                let entry = model.entry(key(k)).or_insert(0);
                *entry += 1;
                assert_eq!(new, *entry);
            }
            Op::Decrement(k) => {
                let result = counter.decrement(key(k).as_str());
                match model.get_mut(&key(k)) {
                    Some(count) => {
                        *count -= 1;
                        assert_eq!(result, Ok(*count));
                        if *count == 0 {
                            model.remove(&key(k));
                        }
                    }
                    None => assert_eq!(result, Err(CounterError::KeyNotFound)),
                }
            }
            Op::Remove(k) => {
                assert_eq!(counter.remove(key(k).as_str()), model.remove(&key(k)));
            }
        }
    }

    fn sorted_pairs(counter: &KeyCounter) -> Vec<(String, u64)> {
        let mut pairs: Vec<_> = counter.iter().map(|(k, c)| (k.clone(), c)).collect();
        pairs.sort();
        pairs
    }

    // =============================================================================
    // Property Tests - Core Invariants
    // =============================================================================

    proptest! {
        /// Property: Invariants hold and counts match a HashMap model after any op
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_matches_model(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut counter: KeyCounter = KeyCounter::new();
            let mut model: HashMap<String, u64> = HashMap::new();

            for op in &ops {
                apply(&mut counter, &mut model, op);
                counter.debug_validate_invariants();

                prop_assert_eq!(counter.len(), model.len());
                for (k, &c) in &model {
                    prop_assert_eq!(counter.count(k.as_str()), c);
                }
            }
        }

        /// Property: max_key/min_key always name a key at the extreme count
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_extremes_are_correct(ops in prop::collection::vec(op_strategy(), 0..200)) {
            let mut counter: KeyCounter = KeyCounter::new();
            let mut model: HashMap<String, u64> = HashMap::new();

            for op in &ops {
                apply(&mut counter, &mut model, op);

                let expected_max = model.values().copied().max();
                let expected_min = model.values().copied().min();
                prop_assert_eq!(counter.max_count(), expected_max);
                prop_assert_eq!(counter.min_count(), expected_min);

                match counter.max_key() {
                    Some(k) => prop_assert_eq!(model.get(k).copied(), expected_max),
                    None => prop_assert!(model.is_empty()),
                }
                match counter.min_key() {
                    Some(k) => prop_assert_eq!(model.get(k).copied(), expected_min),
                    None => prop_assert!(model.is_empty()),
                }
            }
        }

        /// Property: Distinct counts in the model equal the number of buckets
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_bucket_count_is_distinct_counts(
            ops in prop::collection::vec(op_strategy(), 0..200)
        ) {
            let mut counter: KeyCounter = KeyCounter::new();
            let mut model: HashMap<String, u64> = HashMap::new();

            for op in &ops {
                apply(&mut counter, &mut model, op);
            }

            let mut distinct: Vec<u64> = model.values().copied().collect();
            distinct.sort_unstable();
            distinct.dedup();
            let chain: Vec<u64> = counter.iter_buckets().map(Bucket::count).collect();
            prop_assert_eq!(chain, distinct);
        }
    }

    // =============================================================================
    // Property Tests - Reversibility
    // =============================================================================

    proptest! {
        /// Property: increment(k) then decrement(k) restores the observable state
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_increment_decrement_round_trip(
            ops in prop::collection::vec(op_strategy(), 0..100),
            k in 0u8..16,
        ) {
            let mut counter: KeyCounter = KeyCounter::new();
            let mut model: HashMap<String, u64> = HashMap::new();
            for op in &ops {
                apply(&mut counter, &mut model, op);
            }

            let before = sorted_pairs(&counter);
            let (max_before, min_before) = (counter.max_count(), counter.min_count());
            let buckets_before = counter.bucket_count();

            counter.increment(key(k));
            prop_assert!(counter.decrement(key(k).as_str()).is_ok());

            prop_assert_eq!(sorted_pairs(&counter), before);
            prop_assert_eq!(counter.max_count(), max_before);
            prop_assert_eq!(counter.min_count(), min_before);
            prop_assert_eq!(counter.bucket_count(), buckets_before);
            counter.debug_validate_invariants();
        }

        /// Property: N increments followed by N decrements erase a fresh key
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_symmetric_updates_erase_key(
            others in prop::collection::vec(0u8..8, 0..30),
            n in 1usize..40,
        ) {
            let mut counter: KeyCounter = KeyCounter::new();
            for k in &others {
                counter.increment(key(*k));
            }
            let before = sorted_pairs(&counter);

            let fresh = "fresh".to_string();
            for _ in 0..n {
                counter.increment(fresh.clone());
            }
            for _ in 0..n {
                prop_assert!(counter.decrement(fresh.as_str()).is_ok());
            }

            prop_assert!(!counter.contains(fresh.as_str()));
            prop_assert_eq!(sorted_pairs(&counter), before);
            counter.debug_validate_invariants();
        }

        /// Property: decrement on an untracked key errors and changes nothing
        #[cfg_attr(miri, ignore)]
        #[test]
        fn prop_decrement_missing_is_pure(
            ops in prop::collection::vec(op_strategy(), 0..100),
        ) {
            let mut counter: KeyCounter = KeyCounter::new();
            let mut model: HashMap<String, u64> = HashMap::new();
            for op in &ops {
                apply(&mut counter, &mut model, op);
            }

            let before = sorted_pairs(&counter);
            prop_assert_eq!(counter.decrement("absent"), Err(CounterError::KeyNotFound));
            prop_assert_eq!(sorted_pairs(&counter), before);
            counter.debug_validate_invariants();
        }
    }
}
