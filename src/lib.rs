//! tallykit: occurrence counting with O(1) max/min key queries.
//!
//! See `DESIGN.md` for internal architecture and invariants.

pub mod ds;
pub mod error;

#[cfg(feature = "metrics")]
pub mod metrics;

pub mod prelude;

#[cfg(feature = "concurrency")]
pub use ds::ConcurrentKeyCounter;
pub use ds::{Bucket, KeyCounter};
pub use error::{CounterError, InvariantError};
