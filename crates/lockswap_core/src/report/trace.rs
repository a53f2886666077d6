//! Reporter that turns kernel output into `tracing` events.

use super::{format_values, Reporter, RunReport, SwapEvent};

/// Emits swaps at `debug`, snapshots and reports at `info`.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn started(&mut self, threads: usize, before: &[usize]) {
        tracing::info!(threads, before = %format_values(before), "run starting");
    }

    fn swap(&mut self, event: &SwapEvent) {
        tracing::debug!(
            worker = event.worker,
            first = event.first,
            first_value = event.first_value,
            second = event.second,
            second_value = event.second_value,
            "swapping"
        );
    }

    fn snapshot(&mut self, sequence: u64, values: &[usize]) {
        tracing::info!(sequence, values = %format_values(values), "monitor snapshot");
    }

    fn finished(&mut self, report: &RunReport) {
        tracing::info!(
            after = %format_values(&report.after),
            sorted = %format_values(&report.sorted),
            completed = report.completed,
            intact = report.is_permutation(),
            "run finished"
        );
    }
}
