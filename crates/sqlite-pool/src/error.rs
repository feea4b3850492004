//! Pool-level error types.

use thiserror::Error;

/// Errors reported by the pool coordinator.
///
/// Stale releases and invalid handles discovered during acquisition are
/// not errors; they are silently discarded. Only contract violations by
/// the caller surface here.
#[derive(Debug, Error)]
pub enum PoolError {
    /// A coordinator operation was called with an empty file key.
    #[error("{operation} called with an empty file key")]
    EmptyKey {
        /// The operation that rejected the key.
        operation: &'static str,
    },
}

/// Convenience alias for pool results.
pub type Result<T> = std::result::Result<T, PoolError>;
