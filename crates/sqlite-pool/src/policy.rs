//! Pluggable pool policy.
//!
//! The whole coordinator surface is a trait, so an embedding host can
//! substitute its own recycling policy at process start. Once substituted
//! the built-in registry is bypassed entirely; there is no hybrid mode.

use crate::error::{PoolError, Result};
use crate::handle::PooledHandle;
use crate::pool::{Acquired, HandlePool, PoolCounts};

/// The coordinator surface a connection wrapper talks to.
///
/// [`HandlePool`] is the built-in implementation; [`NullPool`] never pools
/// anything. Implementations must uphold the resource contract: a handle
/// passed to [`release`](ConnectionPool::release) that is not retained for
/// reuse must be closed before the call returns.
pub trait ConnectionPool<H: PooledHandle>: Send + Sync {
    /// Acquire a recycled handle for `key`, configuring its capacity.
    fn acquire(&self, key: &str, max_size: usize) -> Result<Acquired<H>>;

    /// Return a checked-out handle under the version it was issued with.
    fn release(&self, key: &str, handle: H, version: u64) -> Result<()>;

    /// Invalidate one key.
    fn clear_pool(&self, key: &str);

    /// Invalidate every key.
    fn clear_all_pools(&self);

    /// Snapshot queue lengths and cumulative counters.
    fn counts(&self, key: Option<&str>) -> PoolCounts;
}

impl<H: PooledHandle> ConnectionPool<H> for HandlePool<H> {
    fn acquire(&self, key: &str, max_size: usize) -> Result<Acquired<H>> {
        HandlePool::acquire(self, key, max_size)
    }

    fn release(&self, key: &str, handle: H, version: u64) -> Result<()> {
        HandlePool::release(self, key, handle, version)
    }

    fn clear_pool(&self, key: &str) {
        HandlePool::clear_pool(self, key);
    }

    fn clear_all_pools(&self) {
        HandlePool::clear_all_pools(self);
    }

    fn counts(&self, key: Option<&str>) -> PoolCounts {
        HandlePool::counts(self, key)
    }
}

/// A pool that never pools.
///
/// Every acquire misses and every released handle is closed on the spot.
/// Useful for tests and for deployments that want pooling off without
/// changing the call sites.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPool;

impl NullPool {
    /// Create a no-op pool.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl<H: PooledHandle> ConnectionPool<H> for NullPool {
    fn acquire(&self, key: &str, _max_size: usize) -> Result<Acquired<H>> {
        if key.is_empty() {
            return Err(PoolError::EmptyKey {
                operation: "acquire",
            });
        }
        Ok(Acquired {
            handle: None,
            version: 0,
        })
    }

    fn release(&self, key: &str, mut handle: H, _version: u64) -> Result<()> {
        handle.close();
        if key.is_empty() {
            return Err(PoolError::EmptyKey {
                operation: "release",
            });
        }
        Ok(())
    }

    fn clear_pool(&self, _key: &str) {}

    fn clear_all_pools(&self) {}

    fn counts(&self, _key: Option<&str>) -> PoolCounts {
        PoolCounts::default()
    }
}
