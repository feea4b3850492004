//! Client-level error types.

use thiserror::Error;

/// Errors surfaced by the client crate.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid configuration or connection string.
    #[error("configuration error: {0}")]
    Config(String),

    /// The pool coordinator rejected a call.
    #[error(transparent)]
    Pool(#[from] sqlite_driver_pool::PoolError),

    /// Opening a native handle failed.
    #[error(transparent)]
    Handle(#[from] sqlite_handle::HandleError),
}

/// Convenience alias for client results.
pub type Result<T> = std::result::Result<T, Error>;
