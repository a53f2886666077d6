//! # Shared Counters
//!
//! The two counters every swap worker touches:
//!
//! - [`Budget`]: how many operations are still unclaimed. Claims are exact:
//!   the number of successful claims equals the initial budget, whatever
//!   the contention.
//! - [`OpCounter`]: how many operations have completed. It only ever grows
//!   and is independent of the budget.

mod budget;
mod counter;

pub use budget::{budget_for, AtomicBudget, Budget, LockedBudget};
pub use counter::OpCounter;
