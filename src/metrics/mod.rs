//! Operation counters for [`KeyCounter`](crate::ds::KeyCounter).
//!
//! Compiled only with the `metrics` feature. Recording, snapshotting and
//! exporting are split the same way throughout:
//!
//! - [`traits`]: recorder / snapshot / exporter traits
//! - [`metrics_impl`]: counter storage updated on the hot path
//! - [`snapshot`]: plain `Copy` views for tests and benches
//! - [`exporter`]: Prometheus text output

pub mod cell;
pub mod exporter;
pub mod metrics_impl;
pub mod snapshot;
pub mod traits;
