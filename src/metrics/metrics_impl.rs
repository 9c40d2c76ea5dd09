use crate::metrics::cell::MetricsCell;
use crate::metrics::traits::{CounterMetricsReadRecorder, CounterMetricsRecorder, MetricsReset};

#[derive(Debug, Default)]
pub struct CounterMetrics {
    pub increment_calls: u64,
    pub increment_new_keys: u64,
    pub increment_saturated: u64,
    pub decrement_calls: u64,
    pub decrement_missing: u64,
    pub decrement_dropped_keys: u64,
    pub remove_calls: u64,
    pub remove_found: u64,
    pub bucket_allocs: u64,
    pub bucket_frees: u64,
    pub clear_calls: u64,
    pub max_key_calls: MetricsCell,
    pub max_key_found: MetricsCell,
    pub min_key_calls: MetricsCell,
    pub min_key_found: MetricsCell,
}

impl CounterMetricsRecorder for CounterMetrics {
    fn record_increment_call(&mut self) {
        self.increment_calls += 1;
    }

    fn record_increment_new_key(&mut self) {
        self.increment_new_keys += 1;
    }

    fn record_increment_saturated(&mut self) {
        self.increment_saturated += 1;
    }

    fn record_decrement_call(&mut self) {
        self.decrement_calls += 1;
    }

    fn record_decrement_missing(&mut self) {
        self.decrement_missing += 1;
    }

    fn record_decrement_dropped_key(&mut self) {
        self.decrement_dropped_keys += 1;
    }

    fn record_remove_call(&mut self) {
        self.remove_calls += 1;
    }

    fn record_remove_found(&mut self) {
        self.remove_found += 1;
    }

    fn record_bucket_alloc(&mut self) {
        self.bucket_allocs += 1;
    }

    fn record_bucket_free(&mut self) {
        self.bucket_frees += 1;
    }

    fn record_clear(&mut self) {
        self.clear_calls += 1;
    }
}

impl CounterMetricsReadRecorder for CounterMetrics {
    fn record_max_key_call(&self) {
        self.max_key_calls.incr();
    }

    fn record_max_key_found(&self) {
        self.max_key_found.incr();
    }

    fn record_min_key_call(&self) {
        self.min_key_calls.incr();
    }

    fn record_min_key_found(&self) {
        self.min_key_found.incr();
    }
}

impl MetricsReset for CounterMetrics {
    fn reset_metrics(&mut self) {
        *self = Self::default();
    }
}
