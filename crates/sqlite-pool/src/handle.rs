//! The handle boundary the pool operates against.

use sqlite_handle::ConnectionHandle;

/// A native handle the pool can recycle.
///
/// The pool never interprets a handle's contents. It observes validity,
/// closes handles it retires, and logs by identity; everything else about
/// the handle belongs to its owner.
///
/// Implementations must make [`close`](PooledHandle::close) idempotent:
/// the pool guarantees it retires each handle on exactly one code path,
/// but the handle's own destructor may run afterwards.
pub trait PooledHandle: Send + 'static {
    /// Stable identity for logging and equality.
    fn id(&self) -> u64;

    /// Whether the handle is still usable.
    ///
    /// A handle can become invalid out-of-band, after it was queued, when
    /// the native layer faults the underlying connection.
    fn is_valid(&self) -> bool;

    /// Close the handle, releasing the native resource. Idempotent.
    fn close(&mut self);
}

impl PooledHandle for ConnectionHandle {
    fn id(&self) -> u64 {
        ConnectionHandle::id(self)
    }

    fn is_valid(&self) -> bool {
        ConnectionHandle::is_valid(self)
    }

    fn close(&mut self) {
        ConnectionHandle::close(self);
    }
}
