//! Error types for structural self-checks.

use thiserror::Error;

/// Returned by `check_invariants` when an engine's index and ordering
/// structure disagree, or when the capacity bound does not hold.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("cache invariant violated: {0}")]
pub struct InvariantError(String);

impl InvariantError {
    pub fn new(msg: impl Into<String>) -> Self {
        Self(msg.into())
    }

    /// Returns the description of the failed invariant.
    pub fn message(&self) -> &str {
        &self.0
    }
}

/// Returns early with an [`InvariantError`] if `cond` is false.
macro_rules! ensure {
    ($cond:expr, $($arg:tt)+) => {
        if !$cond {
            return Err($crate::error::InvariantError::new(format!($($arg)+)));
        }
    };
}

pub(crate) use ensure;
