//! Error types for store and engine operations.
//!
//! The taxonomy deliberately separates infrastructure failure from
//! the value-level outcomes of a transition: a guarded write that
//! matches zero rows is a [`crate::Outcome::Conflict`], never an
//! error. Only genuinely fatal conditions (store unreachable, query
//! failed) surface as `Err`.

use thiserror::Error;

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Infrastructure failure in the backing store.
///
/// Never produced for a guard condition that matched zero rows -
/// that is a conflict outcome, and conflating the two would make the
/// caller retry hard failures or hard-fail recoverable races.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// Store unreachable or a read/write failed for reasons
    /// unrelated to any guard condition.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the intake (create) path.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum EngineError {
    /// A required intake field was missing or empty. No store call
    /// was made.
    #[error("invalid input: missing {0}")]
    InvalidInput(&'static str),

    /// The backing store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_error_display() {
        let error = StoreError::Unavailable("connection refused".to_string());
        assert_eq!(format!("{error}"), "store unavailable: connection refused");
    }

    #[test]
    fn engine_error_wraps_store_error() {
        let error = EngineError::from(StoreError::Unavailable("down".to_string()));
        assert!(matches!(error, EngineError::Store(_)));
    }
}
