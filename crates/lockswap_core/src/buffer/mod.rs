//! # Shared Buffer and Slot Locks
//!
//! One lock per slot instead of one lock for the whole array.
//!
//! ## The Problem
//!
//! ```text
//! Worker 1:  swap(2, 7)
//! Worker 2:  swap(7, 2)
//!
//! Lock in draw order:   W1 holds 2 wants 7, W2 holds 7 wants 2 → DEADLOCK
//! One global lock:      every swap serialized → no parallelism
//! ```
//!
//! ## The Solution: Index-Ordered Slot Locks
//!
//! Swaps on disjoint slots run fully in parallel. Swaps sharing a slot are
//! serialized by that slot's lock. Two locks are always taken lowest index
//! first, which rules out cyclic waits.

mod audit;
mod pair;
mod slots;

pub use audit::{HolderId, LockAudit};
pub use pair::{ascending, lock_ordered, SlotPair};
pub use slots::{Checksum, SharedBuffer};
