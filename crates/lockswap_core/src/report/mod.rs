//! # Reporting
//!
//! The kernel never prints on its own. Everything user-visible goes through
//! a [`Reporter`] injected at setup, always called under the buffer's output
//! lock:
//!
//! - one [`SwapEvent`] per swap, with the pre-swap values
//! - periodic monitor snapshots
//! - the start banner and the final [`RunReport`]
//!
//! Implementations: [`ConsoleReporter`] (classic text lines),
//! [`TracingReporter`] (structured `tracing` events), [`RecordingReporter`]
//! (keeps everything for tests) and [`NullReporter`].

mod console;
mod recording;
mod trace;

use std::time::Duration;

pub use console::ConsoleReporter;
pub use recording::{Recording, RecordingReporter};
pub use trace::TracingReporter;

use crate::worker::WorkerSummary;

/// One swap as announced by a worker, before any value moves.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwapEvent {
    /// Ordinal of the announcing worker.
    pub worker: usize,
    /// First drawn slot.
    pub first: usize,
    /// Value in the first slot before the swap.
    pub first_value: usize,
    /// Second drawn slot.
    pub second: usize,
    /// Value in the second slot before the swap.
    pub second_value: usize,
}

/// Output capability of the kernel.
///
/// Every call happens under the output lock, so implementations need no
/// synchronization of their own.
pub trait Reporter: Send {
    /// The run is about to spawn `threads` workers over `before`.
    fn started(&mut self, threads: usize, before: &[usize]);

    /// A worker is about to exchange two slots.
    fn swap(&mut self, event: &SwapEvent);

    /// The monitor took snapshot number `sequence`.
    fn snapshot(&mut self, sequence: u64, values: &[usize]);

    /// All workers joined; `report` is final.
    fn finished(&mut self, report: &RunReport);
}

/// Reporter that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn started(&mut self, _threads: usize, _before: &[usize]) {}
    fn swap(&mut self, _event: &SwapEvent) {}
    fn snapshot(&mut self, _sequence: u64, _values: &[usize]) {}
    fn finished(&mut self, _report: &RunReport) {}
}

/// Outcome of a complete run.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunReport {
    /// Buffer contents before any worker started.
    pub before: Vec<usize>,
    /// Buffer contents after all workers joined.
    pub after: Vec<usize>,
    /// `after`, sorted. Equals `0..N` when no value was lost.
    pub sorted: Vec<usize>,
    /// Completed operations as counted by the shared op counter.
    pub completed: u64,
    /// Initial operation budget.
    pub budget: u64,
    /// Per-worker results, indexed by ordinal.
    pub workers: Vec<WorkerSummary>,
    /// Snapshots the monitor took.
    pub snapshots: u64,
    /// Overlapping lock holds seen by the audit, `None` when not audited.
    pub lock_violations: Option<u64>,
    /// Wall time of the concurrent phase.
    pub elapsed: Duration,
}

impl RunReport {
    /// Whether `sorted` is exactly `0..N`.
    #[must_use]
    pub fn is_permutation(&self) -> bool {
        self.sorted.iter().copied().eq(0..self.sorted.len())
    }

    /// Sum of claims across all workers.
    #[must_use]
    pub fn claimed(&self) -> u64 {
        self.workers.iter().map(|w| w.claimed).sum()
    }

    /// Swaps that moved data, across all workers.
    #[must_use]
    pub fn swaps(&self) -> u64 {
        self.workers.iter().map(|w| w.swaps).sum()
    }

    /// `i == j` draws counted as operations, across all workers.
    #[must_use]
    pub fn self_swaps(&self) -> u64 {
        self.workers.iter().map(|w| w.self_swaps).sum()
    }

    /// Number of slots whose value differs between `before` and `after`.
    #[must_use]
    pub fn changed_slots(&self) -> usize {
        self.before
            .iter()
            .zip(&self.after)
            .filter(|(b, a)| b != a)
            .count()
    }

    /// Whether every budget unit was claimed exactly once and completed.
    #[must_use]
    pub fn budget_conserved(&self) -> bool {
        self.claimed() == self.budget && self.completed == self.budget
    }
}

/// Formats values space separated, the way buffer dumps are printed.
#[must_use]
pub fn format_values(values: &[usize]) -> String {
    let mut out = String::with_capacity(values.len() * 3);
    for (n, value) in values.iter().enumerate() {
        if n > 0 {
            out.push(' ');
        }
        out.push_str(&value.to_string());
    }
    out
}
