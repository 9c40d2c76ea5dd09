//! # Metrics Traits
//!
//! Recording, snapshotting and exporting are separate traits so the counter
//! only ever writes numbers, tests and benches read them through snapshots,
//! and monitoring backends receive them through exporters.
//!
//! ```text
//!   ┌──────────────────────────────┐   ┌──────────────────────────────┐
//!   │ CounterMetricsRecorder       │   │ CounterMetricsReadRecorder   │
//!   │ (&mut self: inc/dec/remove)  │   │ (&self: max/min queries)     │
//!   └──────────────┬───────────────┘   └──────────────┬───────────────┘
//!                  └──────────────┬───────────────────┘
//!                                 ▼
//!                    ┌──────────────────────────┐
//!                    │ CounterMetrics (storage) │
//!                    └────────────┬─────────────┘
//!                                 ▼
//!   ┌──────────────────────────────┐    ┌──────────────────────────────┐
//!   │ MetricsSnapshotProvider<S>   │ ─► │ MetricsExporter<S>           │
//!   │ (bench/test)                 │    │ (production monitoring)      │
//!   └──────────────────────────────┘    └──────────────────────────────┘
//! ```

/// Counters for mutating counter operations.
pub trait CounterMetricsRecorder {
    fn record_increment_call(&mut self);
    fn record_increment_new_key(&mut self);
    fn record_increment_saturated(&mut self);
    fn record_decrement_call(&mut self);
    fn record_decrement_missing(&mut self);
    fn record_decrement_dropped_key(&mut self);
    fn record_remove_call(&mut self);
    fn record_remove_found(&mut self);
    fn record_bucket_alloc(&mut self);
    fn record_bucket_free(&mut self);
    fn record_clear(&mut self);
}

/// Counters for `&self` queries (interior mutability).
pub trait CounterMetricsReadRecorder {
    fn record_max_key_call(&self);
    fn record_max_key_found(&self);
    fn record_min_key_call(&self);
    fn record_min_key_found(&self);
}

/// Snapshot provider for bench/testing.
pub trait MetricsSnapshotProvider<S> {
    fn snapshot(&self) -> S;
}

/// Reset metrics between tests or benchmark iterations.
pub trait MetricsReset {
    fn reset_metrics(&mut self);
}

/// Export/publish metrics to production monitoring backends.
pub trait MetricsExporter<S> {
    fn export(&self, snapshot: &S);
}
