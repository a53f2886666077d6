//! # LOCKSWAP Core
//!
//! Fine-grained concurrent mutation of one shared array:
//! - N worker threads repeatedly swap two random slots
//! - every slot has its own lock, no global buffer lock
//! - one shared, exact operation budget
//! - an independent monitor thread reporting snapshots
//!
//! ## Architecture Rules
//!
//! 1. **Two slot locks are always taken lowest index first** - no cyclic waits
//! 2. **The output lock comes after slot locks** - never the other way round
//! 3. **Budget claims are exact** - claims granted == initial budget
//! 4. **Values only move** - the buffer is a permutation of `0..N` at rest
//!
//! ## Example
//!
//! ```rust
//! use lockswap_core::{Coordinator, KernelConfig, NullReporter};
//!
//! let config = KernelConfig {
//!     threads: 4,
//!     buffer_size: 8,
//!     iterations: 1_000,
//!     delay_us: 0,
//!     monitor_ms: 0,
//!     ..KernelConfig::default()
//! };
//! let report = Coordinator::new(config)?.run(Box::new(NullReporter))?;
//!
//! assert!(report.is_permutation());
//! assert_eq!(report.completed, 1_000);
//! # Ok::<(), lockswap_core::KernelError>(())
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![deny(clippy::perf)]

pub mod buffer;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod report;
pub mod sync;
pub mod worker;

pub use buffer::{Checksum, HolderId, LockAudit, SharedBuffer, SlotPair};
pub use config::{BudgetKind, KernelConfig, SelfSwapPolicy};
pub use coordinator::Coordinator;
pub use error::{KernelError, KernelResult};
pub use report::{
    format_values, ConsoleReporter, NullReporter, RecordingReporter, Reporter, RunReport,
    SwapEvent, TracingReporter,
};
pub use sync::{AtomicBudget, Budget, LockedBudget, OpCounter};
pub use worker::{Monitor, MonitorHandle, SwapWorker, WorkerSettings, WorkerSummary};
