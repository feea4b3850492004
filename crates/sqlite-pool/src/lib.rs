//! # sqlite-driver-pool
//!
//! Purpose-built connection pool for embedded SQLite databases.
//!
//! Unlike generic object pools, this implementation understands the
//! lifecycle of native connection handles: handles are recycled per
//! database file, every queued handle carries the version it was admitted
//! under, and administrative invalidation retires outstanding handles
//! lazily through a version gate instead of walking them.
//!
//! ## Features
//!
//! - Per-file FIFO recycling with head-first capacity eviction
//! - Versioned invalidation (`clear_pool` / `clear_all_pools`) that can
//!   never re-admit a handle issued before the invalidation
//! - Lazy discard of handles faulted out-of-band by the native layer
//! - Lock-free handle validation: the registry lock is never held while a
//!   dequeued handle is probed
//! - Cumulative open/close counters and per-key queue snapshots
//! - The whole coordinator is replaceable through the [`ConnectionPool`]
//!   trait
//!
//! ## Example
//!
//! ```rust
//! use sqlite_driver_pool::HandlePool;
//! use sqlite_handle::ConnectionHandle;
//!
//! let pool: HandlePool<ConnectionHandle> = HandlePool::new();
//!
//! // Nothing pooled yet: the caller must open a fresh handle.
//! let lease = pool.acquire("/data/app.db", 10)?;
//! assert!(lease.handle.is_none());
//!
//! let handle = ConnectionHandle::open("/data/app.db")?;
//! pool.release("/data/app.db", handle, lease.version)?;
//!
//! // The handle is now recycled to the next caller.
//! let lease = pool.acquire("/data/app.db", 10)?;
//! assert!(lease.handle.is_some());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod error;
pub mod handle;
pub mod policy;
pub mod pool;

mod registry;

// Error types
pub use error::{PoolError, Result};

// Handle boundary
pub use handle::PooledHandle;

// Pool types
pub use pool::{Acquired, DEFAULT_MAX_SIZE, HandlePool, PoolCounts};

// Pluggable policy
pub use policy::{ConnectionPool, NullPool};
