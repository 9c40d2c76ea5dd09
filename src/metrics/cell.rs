use std::sync::atomic::{AtomicU64, Ordering};

/// A metrics-only counter usable from `&self` paths.
///
/// Query operations such as `max_key` take `&self` and may run under a
/// shared read lock, so the cell is a relaxed atomic rather than a `Cell`.
/// Values are observational and never affect counter behavior.
#[repr(transparent)]
#[derive(Debug, Default)]
pub struct MetricsCell(AtomicU64);

impl MetricsCell {
    #[inline]
    pub fn new() -> Self {
        Self(AtomicU64::new(0))
    }

    #[inline]
    pub fn get(&self) -> u64 {
        self.0.load(Ordering::Relaxed)
    }

    #[inline]
    pub fn incr(&self) {
        self.0.fetch_add(1, Ordering::Relaxed);
    }

    #[inline]
    pub fn reset(&self) {
        self.0.store(0, Ordering::Relaxed);
    }
}
