//! Error types for the tallykit library.
//!
//! ## Key Components
//!
//! - [`CounterError`]: Returned by fallible counter operations such as
//!   [`KeyCounter::decrement`](crate::ds::KeyCounter::decrement).
//! - [`InvariantError`]: Returned when internal data-structure invariants are
//!   violated (bucket bookkeeping, `check_invariants` methods).
//!
//! ## Example Usage
//!
//! ```
//! use tallykit::ds::KeyCounter;
//! use tallykit::error::CounterError;
//!
//! let mut counter: KeyCounter = KeyCounter::new();
//! counter.increment("a".to_string());
//!
//! assert_eq!(counter.decrement("a"), Ok(0));
//!
//! // Decrementing a key that is not tracked fails fast
//! assert_eq!(counter.decrement("a"), Err(CounterError::KeyNotFound));
//! ```

use std::fmt;

/// Result type alias for counter operations.
pub type Result<T> = std::result::Result<T, CounterError>;

// ---------------------------------------------------------------------------
// CounterError
// ---------------------------------------------------------------------------

/// Errors produced by [`KeyCounter`](crate::ds::KeyCounter) operations.
///
/// A failed operation never mutates the counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CounterError {
    /// The key has no positive count (it was never incremented, or it has
    /// already been decremented back to zero).
    KeyNotFound,
    /// Internal bookkeeping disagreed with itself.
    Invariant(InvariantError),
}

impl CounterError {
    /// Returns `true` for [`CounterError::KeyNotFound`].
    #[inline]
    pub fn is_key_not_found(&self) -> bool {
        matches!(self, CounterError::KeyNotFound)
    }
}

impl fmt::Display for CounterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CounterError::KeyNotFound => f.write_str("key not found"),
            CounterError::Invariant(err) => write!(f, "invariant violated: {}", err),
        }
    }
}

impl std::error::Error for CounterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CounterError::KeyNotFound => None,
            CounterError::Invariant(err) => Some(err),
        }
    }
}

impl From<InvariantError> for CounterError {
    fn from(err: InvariantError) -> Self {
        CounterError::Invariant(err)
    }
}

// ---------------------------------------------------------------------------
// InvariantError
// ---------------------------------------------------------------------------

/// Error returned when internal counter invariants are violated.
///
/// Produced by [`Bucket::remove_key`](crate::ds::Bucket::remove_key) when the
/// key is absent, and by
/// [`KeyCounter::check_invariants`](crate::ds::KeyCounter::check_invariants).
/// Carries a human-readable description of which invariant failed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantError(String);

impl InvariantError {
    /// Creates a new `InvariantError` with the given description.
    #[inline]
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the error description.
    #[inline]
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InvariantError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::error::Error for InvariantError {}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
