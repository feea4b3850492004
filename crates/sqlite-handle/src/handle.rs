//! The owned native connection handle.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use crate::error::HandleError;

/// Counter for generating handle IDs.
static NEXT_HANDLE_ID: AtomicU64 = AtomicU64::new(1);

/// An open native database connection.
///
/// The handle is single-owner: it is either held by one connection wrapper
/// or queued in one pool, never both. Closing releases the native resource
/// and is idempotent; dropping an open handle closes it, so every handle is
/// closed exactly once regardless of which path retires it.
#[derive(Debug)]
pub struct ConnectionHandle {
    /// Process-unique handle ID.
    id: u64,
    /// Database path the handle was opened against.
    path: Box<str>,
    /// Whether this owner has closed the handle.
    open: bool,
    /// Shared validity flag, revocable by the native fault path.
    validity: ValidityFlag,
}

/// Shared view of a handle's validity.
///
/// The native layer revokes the flag when it forcibly tears a connection
/// down (fatal fault, interrupted VFS) while the handle is held or queued
/// elsewhere. Holders observe the revocation through
/// [`ConnectionHandle::is_valid`].
#[derive(Debug, Clone)]
pub struct ValidityFlag(Arc<AtomicBool>);

impl ValidityFlag {
    fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    /// Mark the associated handle unusable.
    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }

    /// Whether the associated handle is still usable.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }
}

impl ConnectionHandle {
    /// Open a native connection for the given database path.
    ///
    /// # Example
    ///
    /// ```rust
    /// # use sqlite_handle::ConnectionHandle;
    /// let handle = ConnectionHandle::open(":memory:")?;
    /// # Ok::<(), sqlite_handle::HandleError>(())
    /// ```
    pub fn open(path: &str) -> Result<Self, HandleError> {
        if path.trim().is_empty() {
            return Err(HandleError::EmptyPath);
        }

        let id = NEXT_HANDLE_ID.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(handle_id = id, path, "opened native connection");

        Ok(Self {
            id,
            path: path.into(),
            open: true,
            validity: ValidityFlag::new(),
        })
    }

    /// Process-unique ID of this handle.
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Database path the handle was opened against.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Whether the handle is open and has not been faulted by the native
    /// layer.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.open && self.validity.is_valid()
    }

    /// Shared validity flag for this handle.
    ///
    /// The flag outlives ownership transfers, so the native fault path can
    /// revoke a handle that has since been queued in a pool.
    #[must_use]
    pub fn validity(&self) -> ValidityFlag {
        self.validity.clone()
    }

    /// Close the handle, releasing the native resource.
    ///
    /// Idempotent: closing an already-closed handle does nothing.
    pub fn close(&mut self) {
        if !self.open {
            return;
        }
        self.open = false;
        self.validity.revoke();
        tracing::trace!(handle_id = self.id, path = %self.path, "closed native connection");
    }
}

impl PartialEq for ConnectionHandle {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ConnectionHandle {}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.close();
    }
}
