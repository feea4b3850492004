//! The owning connection wrapper.

use sqlite_handle::ConnectionHandle;

use crate::config::Config;
use crate::error::Result;
use crate::key::normalize_key;
use crate::pool::active_pool;

/// An open connection to a SQLite database.
///
/// The wrapper owns its native handle for its whole lifetime. On scope
/// exit it either returns the handle to the pool (pooling on, version
/// still current) or closes it, exactly one of the two. There is no path
/// on which a handle leaks or is destroyed twice.
///
/// # Example
///
/// ```rust
/// use sqlite_client::{Config, Connection};
///
/// let config = Config::new().with_data_source("cache.db").with_max_pool_size(4);
/// let conn = Connection::open(&config)?;
/// assert!(conn.is_open());
/// # drop(conn);
/// # sqlite_client::clear_all_pools();
/// # Ok::<(), sqlite_client::Error>(())
/// ```
#[derive(Debug)]
pub struct Connection {
    key: String,
    version: u64,
    pooling: bool,
    handle: Option<ConnectionHandle>,
}

impl Connection {
    /// Open a connection, recycling a pooled handle when one is available.
    ///
    /// With pooling enabled the pool is consulted first; a miss opens a
    /// fresh native handle checked out under the version the pool issued.
    /// With pooling disabled the pool is bypassed entirely.
    pub fn open(config: &Config) -> Result<Self> {
        config.validate()?;
        let key = normalize_key(&config.data_source);

        if !config.pooling {
            let handle = ConnectionHandle::open(&config.data_source)?;
            tracing::debug!(key = %key, handle_id = handle.id(), "opened unpooled connection");
            return Ok(Self {
                key,
                version: 0,
                pooling: false,
                handle: Some(handle),
            });
        }

        let lease = active_pool().acquire(&key, config.max_pool_size)?;
        let handle = match lease.handle {
            Some(handle) => {
                tracing::debug!(key = %key, handle_id = handle.id(), "recycled pooled connection");
                handle
            }
            None => {
                let handle = ConnectionHandle::open(&config.data_source)?;
                tracing::debug!(key = %key, handle_id = handle.id(), "opened fresh connection");
                handle
            }
        };

        Ok(Self {
            key,
            version: lease.version,
            pooling: true,
            handle: Some(handle),
        })
    }

    /// Whether the underlying handle is open and valid.
    #[must_use]
    pub fn is_open(&self) -> bool {
        self.handle.as_ref().is_some_and(ConnectionHandle::is_valid)
    }

    /// Identity of the underlying handle.
    #[must_use]
    pub fn handle_id(&self) -> u64 {
        self.handle.as_ref().map_or(0, ConnectionHandle::id)
    }

    /// The normalized file key this connection pools under.
    #[must_use]
    pub fn file_key(&self) -> &str {
        &self.key
    }

    /// The pool version the handle is checked out under.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.version
    }

    /// Close the connection.
    ///
    /// Equivalent to dropping it: the handle returns to the pool or is
    /// closed, per the pooling setting.
    pub fn close(self) {
        drop(self);
    }

    /// Detach the native handle from the wrapper and the pool.
    ///
    /// The caller takes full ownership; the pool never sees this handle
    /// again.
    #[must_use]
    pub fn detach(mut self) -> ConnectionHandle {
        // The take leaves Drop nothing to do. The handle is only ever
        // taken by detach or Drop, so it is present here.
        match self.handle.take() {
            Some(handle) => handle,
            None => unreachable!("connection without handle"),
        }
    }
}

impl Drop for Connection {
    fn drop(&mut self) {
        let Some(mut handle) = self.handle.take() else {
            return;
        };
        if self.pooling {
            if let Err(err) = active_pool().release(&self.key, handle, self.version) {
                tracing::warn!(key = %self.key, %err, "failed to return connection to pool");
            }
        } else {
            handle.close();
        }
    }
}
