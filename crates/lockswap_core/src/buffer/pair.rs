//! # Ordered Two-Slot Locking
//!
//! Every thread that needs two slot locks takes them lowest index first.
//! With one total order over all locks no cycle of waiters can form, so
//! no set of swap workers can deadlock on slot locks.
//!
//! ```text
//!   worker A wants (7, 2)  ──>  lock 2, lock 7
//!   worker B wants (2, 7)  ──>  lock 2, lock 7   (waits on 2, never holds 7 first)
//!   release:                    unlock 7, unlock 2
//! ```

use parking_lot::{Mutex, MutexGuard};

use super::audit::{HolderId, LockAudit};

/// Returns `(i, j)` sorted ascending.
#[inline]
#[must_use]
pub fn ascending(i: usize, j: usize) -> (usize, usize) {
    if i <= j {
        (i, j)
    } else {
        (j, i)
    }
}

/// Locks two distinct entries of `locks` in ascending index order.
///
/// The guards come back as `(low, high)`. Returns `None` when `i == j`,
/// since taking the same lock twice would self-deadlock.
///
/// # Panics
///
/// Panics if either index is out of bounds.
#[must_use]
pub fn lock_ordered<T>(
    locks: &[Mutex<T>],
    i: usize,
    j: usize,
) -> Option<(MutexGuard<'_, T>, MutexGuard<'_, T>)> {
    if i == j {
        return None;
    }
    let (low, high) = ascending(i, j);
    let low_guard = locks[low].lock();
    let high_guard = locks[high].lock();
    Some((low_guard, high_guard))
}

/// Two slot locks held together, addressed in the caller's `(i, j)` order.
///
/// Dropping the pair releases the higher slot first, then the lower one.
pub struct SlotPair<'a> {
    // Fields drop in declaration order: `high` unlocks before `low`.
    high: MutexGuard<'a, usize>,
    low: MutexGuard<'a, usize>,
    first: usize,
    second: usize,
    holder: HolderId,
    audit: Option<&'a LockAudit>,
}

impl<'a> SlotPair<'a> {
    pub(crate) fn acquire(
        slots: &'a [Mutex<usize>],
        first: usize,
        second: usize,
        holder: HolderId,
        audit: Option<&'a LockAudit>,
    ) -> Option<Self> {
        let (low, high) = lock_ordered(slots, first, second)?;
        let (low_index, high_index) = ascending(first, second);
        if let Some(audit) = audit {
            audit.enter(low_index, holder);
            audit.enter(high_index, holder);
        }
        Some(Self {
            high,
            low,
            first,
            second,
            holder,
            audit,
        })
    }

    /// Slot indices in the order they were requested.
    #[inline]
    #[must_use]
    pub fn indices(&self) -> (usize, usize) {
        (self.first, self.second)
    }

    /// Current values of the first and second slot.
    #[inline]
    #[must_use]
    pub fn values(&self) -> (usize, usize) {
        (*self.first(), *self.second())
    }

    #[inline]
    fn first_is_low(&self) -> bool {
        self.first < self.second
    }

    /// Value of the first requested slot.
    #[inline]
    #[must_use]
    pub fn first(&self) -> &usize {
        if self.first_is_low() {
            &*self.low
        } else {
            &*self.high
        }
    }

    /// Value of the second requested slot.
    #[inline]
    #[must_use]
    pub fn second(&self) -> &usize {
        if self.first_is_low() {
            &*self.high
        } else {
            &*self.low
        }
    }

    /// Mutable value of the first requested slot.
    #[inline]
    pub fn first_mut(&mut self) -> &mut usize {
        if self.first_is_low() {
            &mut *self.low
        } else {
            &mut *self.high
        }
    }

    /// Mutable value of the second requested slot.
    #[inline]
    pub fn second_mut(&mut self) -> &mut usize {
        if self.first_is_low() {
            &mut *self.high
        } else {
            &mut *self.low
        }
    }

    /// Exchanges the two values in one step.
    #[inline]
    pub fn exchange(&mut self) {
        std::mem::swap(&mut *self.low, &mut *self.high);
    }
}

impl Drop for SlotPair<'_> {
    fn drop(&mut self) {
        if let Some(audit) = self.audit {
            let (low, high) = ascending(self.first, self.second);
            audit.exit(high, self.holder);
            audit.exit(low, self.holder);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    fn slots(n: usize) -> Vec<Mutex<usize>> {
        (0..n).map(Mutex::new).collect()
    }

    #[test]
    fn test_ascending() {
        assert_eq!(ascending(3, 1), (1, 3));
        assert_eq!(ascending(1, 3), (1, 3));
        assert_eq!(ascending(2, 2), (2, 2));
    }

    #[test]
    fn test_same_index_refused() {
        let locks = slots(3);
        assert!(lock_ordered(&locks, 1, 1).is_none());
        // Nothing stays locked after a refusal.
        assert!(locks[1].try_lock().is_some());
    }

    #[test]
    fn test_guards_come_back_low_high() {
        let locks = slots(5);
        let (low, high) = lock_ordered(&locks, 4, 1).unwrap();
        assert_eq!(*low, 1);
        assert_eq!(*high, 4);
    }

    #[test]
    fn test_pair_accessors_follow_request_order() {
        let locks = slots(5);
        let mut pair = SlotPair::acquire(&locks, 4, 1, HolderId::worker(0), None).unwrap();

        assert_eq!(pair.indices(), (4, 1));
        assert_eq!(pair.values(), (4, 1));

        *pair.first_mut() = 40;
        *pair.second_mut() = 10;
        drop(pair);

        assert_eq!(*locks[4].lock(), 40);
        assert_eq!(*locks[1].lock(), 10);
    }

    #[test]
    fn test_exchange() {
        let locks = slots(3);
        let mut pair = SlotPair::acquire(&locks, 0, 2, HolderId::worker(0), None).unwrap();
        pair.exchange();
        assert_eq!(pair.values(), (2, 0));
    }

    #[test]
    fn test_drop_releases_both_locks() {
        let locks = slots(4);
        let audit = LockAudit::new(4).unwrap();
        let holder = HolderId::worker(3);

        let pair = SlotPair::acquire(&locks, 2, 0, holder, Some(&audit)).unwrap();
        assert!(locks[0].is_locked());
        assert!(locks[2].is_locked());
        assert_eq!(audit.holder(0), Some(holder));
        assert_eq!(audit.holder(2), Some(holder));
        drop(pair);

        assert!(!locks[0].is_locked());
        assert!(!locks[2].is_locked());
        assert_eq!(audit.holder(0), None);
        assert_eq!(audit.violations(), 0);
    }

    #[test]
    fn test_opposite_orders_do_not_deadlock() {
        let locks = Arc::new(slots(2));
        let handles: Vec<_> = (0..8)
            .map(|t| {
                let locks = Arc::clone(&locks);
                thread::spawn(move || {
                    for _ in 0..10_000 {
                        let (i, j) = if t % 2 == 0 { (0, 1) } else { (1, 0) };
                        let (mut low, mut high) = lock_ordered(&locks, i, j).unwrap();
                        std::mem::swap(&mut *low, &mut *high);
                    }
                })
            })
            .collect();

        for h in handles {
            h.join().unwrap();
        }

        let mut values = vec![*locks[0].lock(), *locks[1].lock()];
        values.sort_unstable();
        assert_eq!(values, vec![0, 1]);
    }
}
