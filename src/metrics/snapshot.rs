/// Point-in-time copy of [`CounterMetrics`](crate::metrics::metrics_impl::CounterMetrics).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CounterMetricsSnapshot {
    pub increment_calls: u64,
    pub increment_new_keys: u64,
    pub increment_saturated: u64,

    pub decrement_calls: u64,
    pub decrement_missing: u64,
    pub decrement_dropped_keys: u64, // count reached zero

    pub remove_calls: u64,
    pub remove_found: u64,

    pub bucket_allocs: u64,
    pub bucket_frees: u64,

    pub max_key_calls: u64,
    pub max_key_found: u64,
    pub min_key_calls: u64,
    pub min_key_found: u64,

    pub clear_calls: u64,

    // gauges captured at snapshot time
    pub len: usize,
    pub bucket_count: usize,
}

impl CounterMetricsSnapshot {
    /// Buckets currently alive according to the alloc/free counters.
    ///
    /// Matches `bucket_count` unless the counters were reset while buckets
    /// were alive.
    pub fn net_buckets(&self) -> u64 {
        self.bucket_allocs.saturating_sub(self.bucket_frees)
    }
}
