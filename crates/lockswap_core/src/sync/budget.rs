//! # Operation Budget
//!
//! Shared countdown of swap operations. A worker calls
//! [`Budget::claim_one`] before each operation; a refused claim means the
//! work is gone and the worker exits.
//!
//! Claims are never refunded, not even for a draw that moved nothing.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use crate::config::BudgetKind;

/// A shared, exactly-claimable supply of operations.
pub trait Budget: Send + Sync {
    /// Reserves one operation. Returns `false` once the budget is exhausted.
    fn claim_one(&self) -> bool;

    /// Operations not yet claimed.
    fn remaining(&self) -> u64;

    /// Budget the counter started with.
    fn initial(&self) -> u64;

    /// Operations claimed so far.
    fn claimed(&self) -> u64 {
        self.initial() - self.remaining()
    }
}

/// Budget counter behind its own mutex.
#[derive(Debug)]
pub struct LockedBudget {
    initial: u64,
    remaining: Mutex<u64>,
}

impl LockedBudget {
    /// Creates a budget of `initial` operations.
    #[must_use]
    pub fn new(initial: u64) -> Self {
        Self {
            initial,
            remaining: Mutex::new(initial),
        }
    }
}

impl Budget for LockedBudget {
    fn claim_one(&self) -> bool {
        let mut remaining = self.remaining.lock();
        if *remaining == 0 {
            return false;
        }
        *remaining -= 1;
        true
    }

    fn remaining(&self) -> u64 {
        *self.remaining.lock()
    }

    fn initial(&self) -> u64 {
        self.initial
    }
}

/// Budget counter with compare-and-decrement claims.
#[derive(Debug)]
pub struct AtomicBudget {
    initial: u64,
    remaining: AtomicU64,
}

impl AtomicBudget {
    /// Creates a budget of `initial` operations.
    #[must_use]
    pub const fn new(initial: u64) -> Self {
        Self {
            initial,
            remaining: AtomicU64::new(initial),
        }
    }
}

impl Budget for AtomicBudget {
    fn claim_one(&self) -> bool {
        self.remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |r| r.checked_sub(1))
            .is_ok()
    }

    fn remaining(&self) -> u64 {
        self.remaining.load(Ordering::Acquire)
    }

    fn initial(&self) -> u64 {
        self.initial
    }
}

/// Builds the budget implementation selected by `kind`.
#[must_use]
pub fn budget_for(kind: BudgetKind, initial: u64) -> Arc<dyn Budget> {
    match kind {
        BudgetKind::Locked => Arc::new(LockedBudget::new(initial)),
        BudgetKind::Atomic => Arc::new(AtomicBudget::new(initial)),
    }
}
