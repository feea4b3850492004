//! The pool coordinator: acquire, release, invalidation, inspection.

use std::mem;

use hashbrown::HashMap;
use parking_lot::Mutex;
use smallvec::SmallVec;

use crate::error::{PoolError, Result};
use crate::handle::PooledHandle;
use crate::registry::{Doomed, PoolEntry, Registry};

/// Capacity given to an entry created by a `release` for a key no
/// `acquire` has configured yet.
pub const DEFAULT_MAX_SIZE: usize = 100;

/// The outcome of an [`acquire`](HandlePool::acquire) call.
///
/// When `handle` is `None` the caller must open a fresh handle; either
/// way, `version` is what a later `release` for this key must present.
#[derive(Debug)]
#[must_use]
pub struct Acquired<H> {
    /// A recycled handle, if a live one was queued.
    pub handle: Option<H>,
    /// The entry version the handle (or the fresh one the caller opens)
    /// is checked out under.
    pub version: u64,
}

/// Read-only snapshot of registry state.
#[derive(Debug, Clone, Default)]
pub struct PoolCounts {
    /// Queue length per file key.
    pub per_key: HashMap<String, usize>,
    /// Handles returned to callers by `acquire`, cumulative.
    pub opened: u64,
    /// Handles admitted back by `release`, cumulative.
    pub closed: u64,
    /// Handles queued across the whole registry.
    pub total_queued: usize,
}

/// A connection pool recycling native handles per database file.
///
/// Handles are owned by the queue while pooled and move out to exactly one
/// caller on acquisition. Every queued handle was admitted at the entry's
/// current version; bumping the version retires outstanding handles the
/// moment they come back through [`release`](HandlePool::release).
///
/// # Example
///
/// ```rust
/// use sqlite_driver_pool::HandlePool;
/// use sqlite_handle::ConnectionHandle;
///
/// let pool: HandlePool<ConnectionHandle> = HandlePool::new();
/// let lease = pool.acquire("cache.db", 4)?;
/// assert!(lease.handle.is_none());
/// # Ok::<(), sqlite_driver_pool::PoolError>(())
/// ```
pub struct HandlePool<H: PooledHandle> {
    registry: Mutex<Registry<H>>,
}

impl<H: PooledHandle> HandlePool<H> {
    /// Create an empty pool.
    #[must_use]
    pub fn new() -> Self {
        Self {
            registry: Mutex::new(Registry::new()),
        }
    }

    /// Acquire a recycled handle for `key`, creating the entry on first
    /// contact.
    ///
    /// `max_size` becomes the entry's capacity from this call on. The
    /// queue is scanned head-first; handles that went invalid while queued
    /// are discarded as they are dequeued. Returns no handle when the
    /// entry is new or the queue held nothing live; the caller then opens
    /// a fresh handle under the returned version.
    pub fn acquire(&self, key: &str, max_size: usize) -> Result<Acquired<H>> {
        if key.is_empty() {
            return Err(PoolError::EmptyKey {
                operation: "acquire",
            });
        }

        // Take the queue out as a private working copy. Probing a handle
        // can re-enter pool bookkeeping through native cleanup, so the
        // scan below must run with the registry unlocked.
        let (mut scan, version) = {
            let mut guard = self.registry.lock();
            let reg = &mut *guard;
            match reg.entries.get_mut(key) {
                None => {
                    let version = reg.allocate_version();
                    reg.entries
                        .insert(key.into(), PoolEntry::new(version, max_size));
                    tracing::debug!(key, version, max_size, "created pool entry");
                    return Ok(Acquired {
                        handle: None,
                        version,
                    });
                }
                Some(entry) => {
                    entry.max_size = max_size;
                    (mem::take(&mut entry.queue), entry.version)
                }
            }
        };

        // Unlocked: shrink to the requested capacity, then scan head-first
        // for the first handle that is still live.
        let mut doomed: Doomed<H> = SmallVec::new();
        while scan.len() > max_size {
            match scan.pop_front() {
                Some(handle) => doomed.push(handle),
                None => break,
            }
        }
        let mut acquired = None;
        while let Some(handle) = scan.pop_front() {
            if handle.is_valid() {
                acquired = Some(handle);
                break;
            }
            tracing::trace!(key, handle_id = handle.id(), "discarding invalid pooled handle");
            doomed.push(handle);
        }

        // Re-lock and merge the still-good leftovers into the entry's
        // current queue, which may have grown from concurrent releases.
        // Leftovers are older than anything released meanwhile, so they go
        // back at the head. If the entry was invalidated or dropped while
        // we were scanning, the leftovers carry a dead version and are
        // retired instead.
        {
            let mut guard = self.registry.lock();
            let reg = &mut *guard;
            match reg.entries.get_mut(key) {
                Some(entry) if entry.version == version => {
                    for handle in scan.drain(..).rev() {
                        entry.queue.push_front(handle);
                    }
                    let target = entry.max_size;
                    entry.evict_to(target, &mut doomed);
                }
                _ => doomed.extend(scan.drain(..)),
            }
            if acquired.is_some() {
                reg.opened += 1;
            }
        }

        for mut handle in doomed {
            handle.close();
        }

        if let Some(handle) = &acquired {
            tracing::debug!(key, version, handle_id = handle.id(), "reusing pooled handle");
        }
        Ok(Acquired {
            handle: acquired,
            version,
        })
    }

    /// Return `handle` to the pool for `key`.
    ///
    /// The handle is admitted only when `version` matches the entry's
    /// current version; a mismatch means the key was invalidated while the
    /// handle was checked out, and the handle is closed instead. A release
    /// for a key the registry has never seen creates the entry but closes
    /// the handle, since nothing vouches for its provenance.
    pub fn release(&self, key: &str, handle: H, version: u64) -> Result<()> {
        let handle_id = handle.id();
        if key.is_empty() {
            let mut handle = handle;
            handle.close();
            return Err(PoolError::EmptyKey {
                operation: "release",
            });
        }

        let mut doomed: Doomed<H> = SmallVec::new();
        {
            let mut guard = self.registry.lock();
            let reg = &mut *guard;
            match reg.entries.get_mut(key) {
                None => {
                    let fresh = reg.allocate_version();
                    reg.entries
                        .insert(key.into(), PoolEntry::new(fresh, DEFAULT_MAX_SIZE));
                    tracing::debug!(
                        key,
                        version = fresh,
                        handle_id,
                        "release for unseen key; entry created, handle retired"
                    );
                    doomed.push(handle);
                }
                Some(entry) if entry.version == version => {
                    // Reserve room for the incoming handle. A zero
                    // capacity admits nothing.
                    match entry.max_size.checked_sub(1) {
                        Some(target) => {
                            entry.evict_to(target, &mut doomed);
                            entry.queue.push_back(handle);
                            reg.closed += 1;
                            tracing::trace!(key, version, handle_id, "handle returned to pool");
                        }
                        None => doomed.push(handle),
                    }
                }
                Some(entry) => {
                    tracing::trace!(
                        key,
                        handle_id,
                        held = version,
                        current = entry.version,
                        "discarding stale release"
                    );
                    doomed.push(handle);
                }
            }
        }

        for mut handle in doomed {
            handle.close();
        }
        Ok(())
    }

    /// Invalidate one key: bump its version and close everything queued.
    ///
    /// Handles already checked out under the old version stay usable by
    /// their holder; the version gate in [`release`](HandlePool::release)
    /// keeps them from re-entering circulation.
    pub fn clear_pool(&self, key: &str) {
        let mut doomed: Doomed<H> = SmallVec::new();
        {
            let mut guard = self.registry.lock();
            let reg = &mut *guard;
            if let Some(entry) = reg.entries.get_mut(key) {
                let version = reg.next_version;
                reg.next_version += 1;
                entry.version = version;
                doomed.extend(entry.queue.drain(..));
                tracing::info!(key, version, retired = doomed.len(), "cleared pool for key");
            }
        }
        for mut handle in doomed {
            handle.close();
        }
    }

    /// Invalidate every key: close everything queued and drop all entries.
    ///
    /// The global version counter is advanced past every version ever
    /// issued, so an entry recreated later can never match a handle
    /// checked out before this call. Cumulative counters survive.
    pub fn clear_all_pools(&self) {
        let mut doomed: Vec<H> = Vec::new();
        {
            let mut guard = self.registry.lock();
            let reg = &mut *guard;
            let mut max_version = 0;
            for (_, mut entry) in reg.entries.drain() {
                max_version = max_version.max(entry.version);
                doomed.extend(entry.queue.drain(..));
            }
            reg.next_version = reg.next_version.max(max_version + 1);
            tracing::info!(
                retired = doomed.len(),
                next_version = reg.next_version,
                "cleared all pools"
            );
        }
        for mut handle in doomed {
            handle.close();
        }
    }

    /// Snapshot queue lengths and cumulative counters.
    ///
    /// With a key, the per-key map is narrowed to that key;
    /// `total_queued` always covers the whole registry. Mutates nothing.
    #[must_use]
    pub fn counts(&self, key: Option<&str>) -> PoolCounts {
        let guard = self.registry.lock();
        let per_key = match key {
            Some(key) => guard
                .entries
                .get(key)
                .map(|entry| (key.to_string(), entry.queue.len()))
                .into_iter()
                .collect(),
            None => guard
                .entries
                .iter()
                .map(|(key, entry)| (key.to_string(), entry.queue.len()))
                .collect(),
        };
        PoolCounts {
            per_key,
            opened: guard.opened,
            closed: guard.closed,
            total_queued: guard.entries.values().map(|entry| entry.queue.len()).sum(),
        }
    }
}

impl<H: PooledHandle> Default for HandlePool<H> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: PooledHandle> std::fmt::Debug for HandlePool<H> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let counts = self.counts(None);
        f.debug_struct("HandlePool")
            .field("keys", &counts.per_key.len())
            .field("total_queued", &counts.total_queued)
            .field("opened", &counts.opened)
            .field("closed", &counts.closed)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

    use super::*;

    static NEXT_ID: AtomicU64 = AtomicU64::new(1);

    /// Close-counting handle double.
    struct TestHandle {
        id: u64,
        open: bool,
        valid: Arc<AtomicBool>,
        closes: Arc<AtomicUsize>,
    }

    impl TestHandle {
        fn new(closes: &Arc<AtomicUsize>) -> Self {
            Self {
                id: NEXT_ID.fetch_add(1, Ordering::Relaxed),
                open: true,
                valid: Arc::new(AtomicBool::new(true)),
                closes: Arc::clone(closes),
            }
        }

        fn validity(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.valid)
        }
    }

    impl PooledHandle for TestHandle {
        fn id(&self) -> u64 {
            self.id
        }

        fn is_valid(&self) -> bool {
            self.open && self.valid.load(Ordering::Acquire)
        }

        fn close(&mut self) {
            if self.open {
                self.open = false;
                self.closes.fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    fn pool_with_counter() -> (HandlePool<TestHandle>, Arc<AtomicUsize>) {
        (HandlePool::new(), Arc::new(AtomicUsize::new(0)))
    }

    #[test]
    fn test_acquire_on_empty_registry_returns_no_handle() {
        let (pool, _closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 2).unwrap();
        assert!(lease.handle.is_none());

        // The entry now exists; a second acquire sees the same version.
        let again = pool.acquire("db.sqlite", 2).unwrap();
        assert!(again.handle.is_none());
        assert_eq!(again.version, lease.version);
    }

    #[test]
    fn test_fifo_recycling_returns_oldest_first() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 3).unwrap();

        let handles: Vec<TestHandle> = (0..3).map(|_| TestHandle::new(&closes)).collect();
        let ids: Vec<u64> = handles.iter().map(|h| h.id).collect();
        for handle in handles {
            pool.release("db.sqlite", handle, lease.version).unwrap();
        }

        let first = pool.acquire("db.sqlite", 3).unwrap();
        assert_eq!(first.handle.unwrap().id, ids[0]);
        let second = pool.acquire("db.sqlite", 3).unwrap();
        assert_eq!(second.handle.unwrap().id, ids[1]);
    }

    #[test]
    fn test_release_beyond_capacity_evicts_head() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 2).unwrap();

        let handles: Vec<TestHandle> = (0..3).map(|_| TestHandle::new(&closes)).collect();
        let ids: Vec<u64> = handles.iter().map(|h| h.id).collect();
        for handle in handles {
            pool.release("db.sqlite", handle, lease.version).unwrap();
        }

        // H1 was evicted to make room for H3.
        let counts = pool.counts(Some("db.sqlite"));
        assert_eq!(counts.per_key["db.sqlite"], 2);
        assert_eq!(closes.load(Ordering::Relaxed), 1);

        let reused = pool.acquire("db.sqlite", 2).unwrap();
        assert_eq!(reused.version, lease.version);
        assert_eq!(reused.handle.unwrap().id, ids[1]);
    }

    #[test]
    fn test_acquire_shrinks_queue_to_new_capacity() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 3).unwrap();

        let handles: Vec<TestHandle> = (0..3).map(|_| TestHandle::new(&closes)).collect();
        let ids: Vec<u64> = handles.iter().map(|h| h.id).collect();
        for handle in handles {
            pool.release("db.sqlite", handle, lease.version).unwrap();
        }

        // Capacity shrinks to 1: the two oldest are evicted, the survivor
        // is returned.
        let lease = pool.acquire("db.sqlite", 1).unwrap();
        assert_eq!(lease.handle.unwrap().id, ids[2]);
        assert_eq!(closes.load(Ordering::Relaxed), 2);
        assert_eq!(pool.counts(None).total_queued, 0);
    }

    #[test]
    fn test_invalid_handles_discarded_during_scan() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 3).unwrap();

        let bad = TestHandle::new(&closes);
        let bad_validity = bad.validity();
        let good = TestHandle::new(&closes);
        let good_id = good.id;

        pool.release("db.sqlite", bad, lease.version).unwrap();
        pool.release("db.sqlite", good, lease.version).unwrap();
        bad_validity.store(false, Ordering::Release);

        let lease = pool.acquire("db.sqlite", 3).unwrap();
        assert_eq!(lease.handle.unwrap().id, good_id);
        assert_eq!(closes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_clear_pool_closes_queued_and_blocks_stale_release() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 2).unwrap();

        let queued = TestHandle::new(&closes);
        pool.release("db.sqlite", queued, lease.version).unwrap();

        pool.clear_pool("db.sqlite");
        assert_eq!(closes.load(Ordering::Relaxed), 1);
        assert_eq!(pool.counts(None).total_queued, 0);

        // A handle still out under the old version is refused.
        let stale = TestHandle::new(&closes);
        pool.release("db.sqlite", stale, lease.version).unwrap();
        assert_eq!(closes.load(Ordering::Relaxed), 2);
        assert_eq!(pool.counts(None).total_queued, 0);
    }

    #[test]
    fn test_clear_all_pools_renumbers_past_every_version() {
        let (pool, closes) = pool_with_counter();
        let a = pool.acquire("a.db", 2).unwrap();
        let b = pool.acquire("b.db", 2).unwrap();
        pool.release("a.db", TestHandle::new(&closes), a.version)
            .unwrap();
        pool.release("b.db", TestHandle::new(&closes), b.version)
            .unwrap();

        pool.clear_all_pools();
        assert_eq!(closes.load(Ordering::Relaxed), 2);
        assert_eq!(pool.counts(None).total_queued, 0);

        let fresh = pool.acquire("a.db", 2).unwrap();
        assert!(fresh.version > a.version);
        assert!(fresh.version > b.version);

        // Old-version releases can never be re-admitted.
        pool.release("a.db", TestHandle::new(&closes), a.version)
            .unwrap();
        assert_eq!(pool.counts(None).total_queued, 0);
    }

    #[test]
    fn test_release_for_unseen_key_creates_entry_and_closes_handle() {
        let (pool, closes) = pool_with_counter();
        pool.release("never-acquired.db", TestHandle::new(&closes), 1)
            .unwrap();

        assert_eq!(closes.load(Ordering::Relaxed), 1);
        let counts = pool.counts(Some("never-acquired.db"));
        assert_eq!(counts.per_key["never-acquired.db"], 0);
    }

    #[test]
    fn test_empty_key_is_a_contract_violation() {
        let (pool, closes) = pool_with_counter();
        assert!(matches!(
            pool.acquire("", 2),
            Err(PoolError::EmptyKey { operation: "acquire" })
        ));

        // The handle must still be retired on the failing path.
        let result = pool.release("", TestHandle::new(&closes), 1);
        assert!(matches!(
            result,
            Err(PoolError::EmptyKey { operation: "release" })
        ));
        assert_eq!(closes.load(Ordering::Relaxed), 1);
    }

    #[test]
    fn test_zero_capacity_admits_nothing() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 0).unwrap();

        pool.release("db.sqlite", TestHandle::new(&closes), lease.version)
            .unwrap();
        assert_eq!(closes.load(Ordering::Relaxed), 1);
        assert_eq!(pool.counts(None).total_queued, 0);
    }

    #[test]
    fn test_counters_track_reuse_and_returns() {
        let (pool, closes) = pool_with_counter();
        let lease = pool.acquire("db.sqlite", 2).unwrap();

        pool.release("db.sqlite", TestHandle::new(&closes), lease.version)
            .unwrap();
        let reused = pool.acquire("db.sqlite", 2).unwrap();
        assert!(reused.handle.is_some());

        let counts = pool.counts(None);
        assert_eq!(counts.opened, 1);
        assert_eq!(counts.closed, 1);
    }

    #[test]
    fn test_counts_filtered_by_key() {
        let (pool, closes) = pool_with_counter();
        let a = pool.acquire("a.db", 4).unwrap();
        let b = pool.acquire("b.db", 4).unwrap();
        pool.release("a.db", TestHandle::new(&closes), a.version)
            .unwrap();
        pool.release("b.db", TestHandle::new(&closes), b.version)
            .unwrap();

        let counts = pool.counts(Some("a.db"));
        assert_eq!(counts.per_key.len(), 1);
        assert_eq!(counts.per_key["a.db"], 1);
        assert_eq!(counts.total_queued, 2);

        let missing = pool.counts(Some("zzz.db"));
        assert!(missing.per_key.is_empty());
    }
}
