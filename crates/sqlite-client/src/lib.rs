//! # sqlite-client
//!
//! Pooled SQLite connection wrapper.
//!
//! This is the public surface of the driver: ADO.NET-style connection
//! strings, a process-wide handle pool keyed by normalized database path,
//! and an owning [`Connection`] wrapper whose destruction either returns
//! its handle to the pool or closes it, never both and never neither.
//!
//! ## Example
//!
//! ```rust
//! use sqlite_client::{Config, Connection};
//!
//! let config = Config::from_connection_string(
//!     "Data Source=app.db;Pooling=True;Max Pool Size=20;",
//! )?;
//!
//! let conn = Connection::open(&config)?;
//! assert!(conn.is_open());
//! drop(conn); // handle goes back to the pool
//!
//! let conn = Connection::open(&config)?; // recycled
//! # drop(conn);
//! # sqlite_client::clear_all_pools();
//! # Ok::<(), sqlite_client::Error>(())
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod config;
pub mod connection;
pub mod error;
pub mod key;
pub mod pool;

// Re-export commonly used types
pub use config::Config;
pub use connection::Connection;
pub use error::Error;
pub use key::normalize_key;
pub use pool::{clear_all_pools, clear_pool, install_pool, pool_counts};
pub use sqlite_driver_pool::{Acquired, ConnectionPool, NullPool, PoolCounts, PoolError, PooledHandle};
pub use sqlite_handle::ConnectionHandle;
