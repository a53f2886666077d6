//! # Operation Counter
//!
//! Completed-operation count shared by all workers.

use std::sync::atomic::{AtomicU64, Ordering};

/// Monotonic counter of completed operations.
#[derive(Debug, Default)]
pub struct OpCounter {
    count: AtomicU64,
}

impl OpCounter {
    /// Creates a counter at zero.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            count: AtomicU64::new(0),
        }
    }

    /// Records one completed operation and returns the new total.
    #[inline]
    pub fn increment(&self) -> u64 {
        self.count.fetch_add(1, Ordering::AcqRel) + 1
    }

    /// Completed operations so far.
    #[inline]
    #[must_use]
    pub fn get(&self) -> u64 {
        self.count.load(Ordering::Acquire)
    }
}
