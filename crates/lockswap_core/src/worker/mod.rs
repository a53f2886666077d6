//! # Worker Threads
//!
//! - [`SwapWorker`]: claims budget and swaps random slot pairs until the
//!   budget is exhausted. Never cancelled from outside.
//! - [`Monitor`]: observes the buffer on a fixed interval. Cancelled by the
//!   coordinator through its [`MonitorHandle`] once all swap workers joined.

mod monitor;
mod swap;

pub use monitor::{Monitor, MonitorHandle};
pub use swap::{SwapWorker, WorkerSettings, WorkerSummary};
