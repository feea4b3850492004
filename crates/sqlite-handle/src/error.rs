//! Handle-level error types.

use thiserror::Error;

/// Errors that can occur while opening a native connection handle.
#[derive(Debug, Error)]
pub enum HandleError {
    /// The database path was empty or blank.
    #[error("database path is empty")]
    EmptyPath,
}
