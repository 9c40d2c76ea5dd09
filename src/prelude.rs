pub use crate::ds::{Bucket, BucketIter, KeyCounter, SlotArena, SlotId};
pub use crate::error::{CounterError, InvariantError};

#[cfg(feature = "concurrency")]
pub use crate::ds::ConcurrentKeyCounter;
#[cfg(feature = "metrics")]
pub use crate::metrics::snapshot::CounterMetricsSnapshot;
#[cfg(feature = "metrics")]
pub use crate::metrics::traits::{MetricsExporter, MetricsSnapshotProvider};
