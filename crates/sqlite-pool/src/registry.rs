//! Registry data structures: per-key entries and the process-wide map.

use std::collections::VecDeque;

use hashbrown::HashMap;
use smallvec::SmallVec;

use crate::handle::PooledHandle;

/// Scratch list for handles removed from pool custody under the lock and
/// closed after it is released.
pub(crate) type Doomed<H> = SmallVec<[H; 4]>;

/// Recycling state for one file key.
pub(crate) struct PoolEntry<H> {
    /// Version every queued handle was admitted under.
    pub(crate) version: u64,
    /// Capacity set by the most recent `acquire` for this key.
    pub(crate) max_size: usize,
    /// Queued handles, oldest at the head.
    pub(crate) queue: VecDeque<H>,
}

impl<H: PooledHandle> PoolEntry<H> {
    pub(crate) fn new(version: u64, max_size: usize) -> Self {
        Self {
            version,
            max_size,
            queue: VecDeque::new(),
        }
    }

    /// Dequeue from the head until the queue fits `target`, moving each
    /// evicted handle into `doomed`.
    pub(crate) fn evict_to(&mut self, target: usize, doomed: &mut Doomed<H>) {
        while self.queue.len() > target {
            match self.queue.pop_front() {
                Some(handle) => doomed.push(handle),
                None => break,
            }
        }
    }
}

/// Process-wide registry: key → entry map plus global bookkeeping.
///
/// The owning pool guards the registry with a single mutex; nothing here
/// synchronizes on its own.
pub(crate) struct Registry<H> {
    pub(crate) entries: HashMap<Box<str>, PoolEntry<H>>,
    /// Next version to hand out. Always greater than every entry version.
    pub(crate) next_version: u64,
    /// Handles returned to callers by `acquire`, cumulative.
    pub(crate) opened: u64,
    /// Handles admitted back by `release`, cumulative.
    pub(crate) closed: u64,
}

impl<H: PooledHandle> Registry<H> {
    pub(crate) fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_version: 1,
            opened: 0,
            closed: 0,
        }
    }

    /// Consume and return the next global version.
    pub(crate) fn allocate_version(&mut self) -> u64 {
        let version = self.next_version;
        self.next_version += 1;
        version
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    struct Plain(u64);

    impl PooledHandle for Plain {
        fn id(&self) -> u64 {
            self.0
        }

        fn is_valid(&self) -> bool {
            true
        }

        fn close(&mut self) {}
    }

    #[test]
    fn test_evict_to_retires_from_the_head() {
        let mut entry: PoolEntry<Plain> = PoolEntry::new(1, 3);
        for id in 1..=4 {
            entry.queue.push_back(Plain(id));
        }

        let mut doomed = Doomed::new();
        entry.evict_to(2, &mut doomed);

        assert_eq!(doomed.len(), 2);
        assert_eq!(doomed[0].id(), 1);
        assert_eq!(doomed[1].id(), 2);
        assert_eq!(entry.queue.front().map(Plain::id), Some(3));
    }

    #[test]
    fn test_evict_to_noop_when_under_target() {
        let mut entry: PoolEntry<Plain> = PoolEntry::new(1, 3);
        entry.queue.push_back(Plain(1));

        let mut doomed = Doomed::new();
        entry.evict_to(3, &mut doomed);

        assert!(doomed.is_empty());
        assert_eq!(entry.queue.len(), 1);
    }

    #[test]
    fn test_allocate_version_is_monotonic() {
        let mut registry: Registry<Plain> = Registry::new();
        let first = registry.allocate_version();
        let second = registry.allocate_version();
        assert!(second > first);
        assert!(registry.next_version > second);
    }
}
