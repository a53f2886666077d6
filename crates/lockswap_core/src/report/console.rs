//! Plain-text reporter.

use std::io::{self, Write};

use super::{format_values, Reporter, RunReport, SwapEvent};

/// Writes the classic line-oriented output to any writer.
///
/// The first write error is logged at `warn`, later ones are dropped. A worker
/// calls in here while holding slot locks, so a failed write never blocks or
/// panics.
pub struct ConsoleReporter<W: Write + Send> {
    out: W,
    swaps: bool,
    failed: bool,
}

impl ConsoleReporter<io::Stdout> {
    /// Reporter on standard output.
    #[must_use]
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write + Send> ConsoleReporter<W> {
    /// Reporter on `out`, announcing every swap.
    pub fn new(out: W) -> Self {
        Self {
            out,
            swaps: true,
            failed: false,
        }
    }

    /// Stops printing one line per swap. Snapshots and reports stay.
    #[must_use]
    pub fn without_swaps(mut self) -> Self {
        self.swaps = false;
        self
    }

    /// Whether any write has failed.
    #[must_use]
    pub fn write_failed(&self) -> bool {
        self.failed
    }

    /// Returns the underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn check(&mut self, result: io::Result<()>) {
        if let Err(err) = result {
            if !self.failed {
                tracing::warn!(error = %err, "console output failed, further output is dropped");
            }
            self.failed = true;
        }
    }
}

impl<W: Write + Send> Reporter for ConsoleReporter<W> {
    fn started(&mut self, threads: usize, before: &[usize]) {
        let result = writeln!(self.out, "creating {threads} threads")
            .and_then(|()| writeln!(self.out, "Buffer before: {}", format_values(before)));
        self.check(result);
    }

    fn swap(&mut self, event: &SwapEvent) {
        if !self.swaps {
            return;
        }
        let result = writeln!(
            self.out,
            "Thread {} swapping positions {} (== {}) and {} (== {})",
            event.worker, event.first, event.first_value, event.second, event.second_value
        );
        self.check(result);
    }

    fn snapshot(&mut self, sequence: u64, values: &[usize]) {
        let result = writeln!(self.out, "Monitor snapshot #{sequence}: {}", format_values(values));
        self.check(result);
    }

    fn finished(&mut self, report: &RunReport) {
        let result = writeln!(self.out, "Buffer after:  {}", format_values(&report.after))
            .and_then(|()| writeln!(self.out, "Buffer sorted: {}", format_values(&report.sorted)))
            .and_then(|()| writeln!(self.out, "iterations: {}", report.completed))
            .and_then(|()| self.out.flush());
        self.check(result);
    }
}
