//! # Lock Audit
//!
//! Optional registry of who holds each slot lock.
//!
//! Guards register themselves right after acquiring a slot and deregister
//! right before releasing it. If the per-slot locks are sound, a slot never
//! has two registered holders, so [`LockAudit::violations`] stays at zero.
//! Any non-zero count means two threads were inside the same slot at once.

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

use crate::error::{KernelError, KernelResult};

/// Raw registry value of an unheld slot.
const FREE: usize = 0;

/// Identity of a lock holder as seen by the audit.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct HolderId(usize);

impl HolderId {
    /// Holder id for anything that only reads: the monitor and the coordinator.
    pub const OBSERVER: Self = Self(usize::MAX - 1);

    /// Holder id of swap worker number `ordinal`.
    ///
    /// # Panics
    ///
    /// Panics if `ordinal` collides with [`HolderId::OBSERVER`].
    #[inline]
    #[must_use]
    pub const fn worker(ordinal: usize) -> Self {
        assert!(ordinal < usize::MAX - 1, "worker ordinal out of range");
        Self(ordinal)
    }

    /// Worker ordinal, `None` for the observer.
    #[inline]
    #[must_use]
    pub const fn ordinal(self) -> Option<usize> {
        if self.0 == Self::OBSERVER.0 {
            None
        } else {
            Some(self.0)
        }
    }

    #[inline]
    const fn token(self) -> usize {
        self.0 + 1
    }

    #[inline]
    const fn from_token(token: usize) -> Option<Self> {
        if token == FREE {
            None
        } else {
            Some(Self(token - 1))
        }
    }
}

/// Per-slot lock holder registry.
pub struct LockAudit {
    /// Registered holder token per slot, [`FREE`] when unheld.
    holders: Box<[AtomicUsize]>,
    /// Number of registrations that found a slot already held or a release
    /// by a holder that was not registered.
    violations: AtomicU64,
    /// Total successful registrations.
    acquisitions: AtomicU64,
}

impl LockAudit {
    /// Creates a registry for `slots` slots, all free.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::OutOfMemory`] if the registry cannot be allocated.
    pub fn new(slots: usize) -> KernelResult<Self> {
        let mut holders = Vec::new();
        holders
            .try_reserve_exact(slots)
            .map_err(|_| KernelError::OutOfMemory {
                what: "lock audit",
                requested: slots,
            })?;
        holders.extend((0..slots).map(|_| AtomicUsize::new(FREE)));

        Ok(Self {
            holders: holders.into_boxed_slice(),
            violations: AtomicU64::new(0),
            acquisitions: AtomicU64::new(0),
        })
    }

    /// Registers `holder` on `slot`. Call only while holding the slot lock.
    pub fn enter(&self, slot: usize, holder: HolderId) {
        let previous = self.holders[slot].swap(holder.token(), Ordering::AcqRel);
        if previous != FREE {
            self.violations.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                slot,
                ?holder,
                previous = ?HolderId::from_token(previous),
                "slot lock entered while already held"
            );
        }
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
    }

    /// Deregisters `holder` from `slot`. Call only while still holding the slot lock.
    pub fn exit(&self, slot: usize, holder: HolderId) {
        let previous = self.holders[slot].swap(FREE, Ordering::AcqRel);
        if previous != holder.token() {
            self.violations.fetch_add(1, Ordering::Relaxed);
            tracing::error!(
                slot,
                ?holder,
                registered = ?HolderId::from_token(previous),
                "slot lock released by a holder that was not registered"
            );
        }
    }

    /// Current registered holder of `slot`.
    #[must_use]
    pub fn holder(&self, slot: usize) -> Option<HolderId> {
        HolderId::from_token(self.holders[slot].load(Ordering::Acquire))
    }

    /// Number of overlapping or mismatched holds observed.
    #[must_use]
    pub fn violations(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }

    /// Number of registrations observed.
    #[must_use]
    pub fn acquisitions(&self) -> u64 {
        self.acquisitions.load(Ordering::Relaxed)
    }
}

impl std::fmt::Debug for LockAudit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LockAudit")
            .field("slots", &self.holders.len())
            .field("violations", &self.violations())
            .field("acquisitions", &self.acquisitions())
            .finish()
    }
}
