//! # sqlite-handle
//!
//! Owned native SQLite connection handles.
//!
//! A [`ConnectionHandle`] represents one open native database connection.
//! It is a move-only resource: exactly one owner at any instant, a single
//! destruction path ([`ConnectionHandle::close`], with `Drop` as the
//! backstop), and an idempotent close. Validity can be revoked out-of-band
//! through a [`ValidityFlag`] when the native layer faults a connection
//! that is held elsewhere.
//!
//! ## Example
//!
//! ```rust
//! use sqlite_handle::ConnectionHandle;
//!
//! let mut handle = ConnectionHandle::open("app.db")?;
//! assert!(handle.is_valid());
//! handle.close();
//! assert!(!handle.is_valid());
//! # Ok::<(), sqlite_handle::HandleError>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod handle;

pub use error::HandleError;
pub use handle::{ConnectionHandle, ValidityFlag};
