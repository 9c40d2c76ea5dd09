//! Count bucket: the set of keys that currently share one occurrence count.
//!
//! A [`Bucket`] is one node of the chain maintained by
//! [`KeyCounter`](crate::ds::KeyCounter). It owns the keys at its count but
//! not its neighbors: `prev`/`next` are [`SlotId`] handles that only the
//! containing counter rewires.
//!
//! ```text
//!   head ◄──► [count=1 {b, c}] ◄──► [count=4 {a}] ◄──► tail
//!   (0)                                               (0)
//! ```
//!
//! Sentinel buckets carry count 0 and never hold keys. A real bucket is
//! unlinked as soon as its key set drains, so a linked real bucket is never
//! empty.

use rustc_hash::FxHashSet;
use std::borrow::Borrow;
use std::hash::Hash;

use crate::ds::slot_arena::SlotId;
use crate::error::InvariantError;

/// All keys whose current occurrence count equals this bucket's count.
#[derive(Debug)]
pub struct Bucket<K> {
    pub(crate) prev: Option<SlotId>,
    pub(crate) next: Option<SlotId>,
    pub(crate) count: u64,
    keys: FxHashSet<K>,
}

impl<K> Bucket<K> {
    /// Creates a sentinel bucket (count 0, no keys).
    pub(crate) fn sentinel() -> Self {
        Self::new(0)
    }

    /// Creates an unlinked bucket for `count` with no keys.
    pub fn new(count: u64) -> Self {
        Self {
            prev: None,
            next: None,
            count,
            keys: FxHashSet::default(),
        }
    }

    /// The occurrence count shared by every key in this bucket.
    #[inline]
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Returns `true` for the chain's boundary nodes.
    #[inline]
    pub fn is_sentinel(&self) -> bool {
        self.count == 0
    }

    /// Number of keys at this count.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// Iterates the keys at this count in no particular order.
    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.keys.iter()
    }

    /// Returns any key at this count, or `None` if the bucket is empty.
    ///
    /// No ordering is promised between keys that share a count; callers must
    /// not rely on which member comes back.
    #[inline]
    pub fn pick_any_key(&self) -> Option<&K> {
        self.keys.iter().next()
    }

    pub(crate) fn approx_bytes(&self) -> usize {
        std::mem::size_of::<Self>() + self.keys.capacity() * std::mem::size_of::<K>()
    }
}

impl<K> Bucket<K>
where
    K: Eq + Hash,
{
    /// Inserts `key`; returns `false` (and changes nothing) if it was
    /// already present.
    #[inline]
    pub fn add_key(&mut self, key: K) -> bool {
        self.keys.insert(key)
    }

    /// Removes `key` and hands back the owned value.
    ///
    /// A missing key means the caller's bookkeeping is out of sync with the
    /// bucket, which is reported as an [`InvariantError`].
    #[inline]
    pub fn remove_key<Q>(&mut self, key: &Q) -> Result<K, InvariantError>
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.keys.take(key).ok_or_else(|| {
            InvariantError::new(format!("key missing from bucket with count {}", self.count))
        })
    }

    /// Returns `true` if `key` is stored at this count.
    #[inline]
    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Eq + Hash + ?Sized,
    {
        self.keys.contains(key)
    }
}
