//! The process-wide connection pool.
//!
//! One pool serves every [`Connection`](crate::Connection) in the process.
//! An embedding host can swap the whole coordinator for its own
//! implementation with [`install_pool`]; after that the built-in registry
//! is never consulted again.

use std::sync::Arc;

use once_cell::sync::Lazy;
use parking_lot::RwLock;
use sqlite_driver_pool::{ConnectionPool, HandlePool, PoolCounts};
use sqlite_handle::ConnectionHandle;

use crate::key::normalize_key;

static POOL: Lazy<RwLock<Arc<dyn ConnectionPool<ConnectionHandle>>>> =
    Lazy::new(|| RwLock::new(Arc::new(HandlePool::new())));

/// Substitute the process-wide pool implementation.
///
/// Intended for process start, before any connection is opened. Handles
/// already checked out from the previous pool close instead of returning,
/// since their versions mean nothing to the replacement.
pub fn install_pool(pool: Arc<dyn ConnectionPool<ConnectionHandle>>) {
    *POOL.write() = pool;
    tracing::info!("installed replacement connection pool");
}

/// The currently installed pool.
pub(crate) fn active_pool() -> Arc<dyn ConnectionPool<ConnectionHandle>> {
    POOL.read().clone()
}

/// Close every pooled handle for one database and invalidate the handles
/// currently checked out for it.
pub fn clear_pool(data_source: &str) {
    active_pool().clear_pool(&normalize_key(data_source));
}

/// Close every pooled handle for every database.
pub fn clear_all_pools() {
    active_pool().clear_all_pools();
}

/// Snapshot pool diagnostics, optionally narrowed to one database.
#[must_use]
pub fn pool_counts(data_source: Option<&str>) -> PoolCounts {
    match data_source {
        Some(data_source) => active_pool().counts(Some(&normalize_key(data_source))),
        None => active_pool().counts(None),
    }
}
