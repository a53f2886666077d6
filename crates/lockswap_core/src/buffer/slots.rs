//! # Shared Buffer
//!
//! N integer slots, each behind its own lock, plus one output lock around the
//! injected [`Reporter`].
//!
//! ## Lock Order
//!
//! ```text
//!   slot 0 < slot 1 < ... < slot N-1 < output
//! ```
//!
//! A thread may hold slot locks and then take the output lock (swap
//! announcements). Nobody takes a slot lock while holding the output lock:
//! snapshots are copied out first and only then reported.

use parking_lot::Mutex;

use super::audit::{HolderId, LockAudit};
use super::pair::SlotPair;
use crate::error::{KernelError, KernelResult};
use crate::report::Reporter;

/// Sum and xor over all slot values.
///
/// Any permutation of `0..N` has the same checksum, so it survives swaps but
/// catches lost or duplicated values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Checksum {
    /// Sum of all values.
    pub sum: u128,
    /// Xor of all values.
    pub xor: usize,
}

impl Checksum {
    /// Checksum of a slice of values.
    #[must_use]
    pub fn of(values: &[usize]) -> Self {
        values.iter().fold(Self { sum: 0, xor: 0 }, |acc, &v| Self {
            sum: acc.sum + v as u128,
            xor: acc.xor ^ v,
        })
    }

    /// Checksum of the identity permutation `0..n`.
    #[must_use]
    pub fn identity(n: usize) -> Self {
        let (sum, xor) = (0..n).fold((0u128, 0usize), |(s, x), v| (s + v as u128, x ^ v));
        Self { sum, xor }
    }
}

/// The buffer all workers mutate.
pub struct SharedBuffer {
    /// One lock per slot; the value lives inside its lock.
    slots: Box<[Mutex<usize>]>,
    /// Output lock serializing every report.
    output: Mutex<Box<dyn Reporter>>,
    /// Lock-holder registry, only present when auditing.
    audit: Option<LockAudit>,
}

impl SharedBuffer {
    /// Creates a buffer holding the identity permutation `0..size`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidConfig`] for a zero size and
    /// [`KernelError::OutOfMemory`] if the slots cannot be allocated.
    pub fn identity(size: usize, reporter: Box<dyn Reporter>) -> KernelResult<Self> {
        if size == 0 {
            return Err(KernelError::InvalidConfig(
                "buffer needs at least one slot".to_string(),
            ));
        }

        let mut slots = Vec::new();
        slots
            .try_reserve_exact(size)
            .map_err(|_| KernelError::OutOfMemory {
                what: "buffer slots",
                requested: size,
            })?;
        slots.extend((0..size).map(Mutex::new));

        Ok(Self {
            slots: slots.into_boxed_slice(),
            output: Mutex::new(reporter),
            audit: None,
        })
    }

    /// Turns on the lock-holder registry.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::OutOfMemory`] if the registry cannot be allocated.
    pub fn with_audit(mut self) -> KernelResult<Self> {
        self.audit = Some(LockAudit::new(self.slots.len())?);
        Ok(self)
    }

    /// Number of slots.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Always false: a buffer has at least one slot.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// The lock-holder registry, if auditing is on.
    #[inline]
    #[must_use]
    pub fn audit(&self) -> Option<&LockAudit> {
        self.audit.as_ref()
    }

    /// Locks slots `i` and `j` in ascending order.
    ///
    /// Returns `None` when `i == j`.
    ///
    /// # Panics
    ///
    /// Panics if either index is out of bounds.
    #[must_use]
    pub fn lock_pair(&self, i: usize, j: usize, holder: HolderId) -> Option<SlotPair<'_>> {
        SlotPair::acquire(&self.slots, i, j, holder, self.audit.as_ref())
    }

    /// Reads one slot under its lock.
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    #[must_use]
    pub fn read(&self, index: usize, holder: HolderId) -> usize {
        let guard = self.slots[index].lock();
        if let Some(audit) = &self.audit {
            audit.enter(index, holder);
            audit.exit(index, holder);
        }
        *guard
    }

    /// Copies every slot, holding one slot lock at a time.
    ///
    /// Concurrent swaps may land between two slot reads, so the copy is only
    /// a consistent permutation when no worker is running.
    #[must_use]
    pub fn snapshot(&self) -> Vec<usize> {
        (0..self.slots.len())
            .map(|index| self.read(index, HolderId::OBSERVER))
            .collect()
    }

    /// Checksum of a fresh [`SharedBuffer::snapshot`].
    #[must_use]
    pub fn checksum(&self) -> Checksum {
        Checksum::of(&self.snapshot())
    }

    /// Runs `f` with the reporter under the output lock.
    pub fn report<R>(&self, f: impl FnOnce(&mut dyn Reporter) -> R) -> R {
        let mut output = self.output.lock();
        f(output.as_mut())
    }
}

impl std::fmt::Debug for SharedBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedBuffer")
            .field("len", &self.slots.len())
            .field("audit", &self.audit)
            .finish_non_exhaustive()
    }
}
