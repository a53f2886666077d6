//! In-memory reporter for tests and tools that inspect a run afterwards.

use std::sync::Arc;

use parking_lot::Mutex;

use super::{Reporter, RunReport, SwapEvent};

/// Everything a [`RecordingReporter`] has seen.
#[derive(Clone, Debug, Default)]
pub struct Recording {
    /// Worker count and buffer passed to [`Reporter::started`].
    pub started: Option<(usize, Vec<usize>)>,
    /// Swap announcements in output-lock order.
    pub swaps: Vec<SwapEvent>,
    /// Monitor snapshots in the order they were reported.
    pub snapshots: Vec<Vec<usize>>,
    /// Final report, once the run finished.
    pub finished: Option<RunReport>,
}

/// Reporter that stores every event.
///
/// Clones share the same recording, so a test can keep one clone and hand
/// the other to the kernel.
#[derive(Clone, Debug, Default)]
pub struct RecordingReporter {
    inner: Arc<Mutex<Recording>>,
}

impl RecordingReporter {
    /// Creates an empty recording.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of everything recorded so far.
    #[must_use]
    pub fn recording(&self) -> Recording {
        self.inner.lock().clone()
    }

    /// Recorded swap announcements.
    #[must_use]
    pub fn swaps(&self) -> Vec<SwapEvent> {
        self.inner.lock().swaps.clone()
    }

    /// Recorded monitor snapshots.
    #[must_use]
    pub fn snapshots(&self) -> Vec<Vec<usize>> {
        self.inner.lock().snapshots.clone()
    }

    /// Final report, if the run got that far.
    #[must_use]
    pub fn finished(&self) -> Option<RunReport> {
        self.inner.lock().finished.clone()
    }
}

impl Reporter for RecordingReporter {
    fn started(&mut self, threads: usize, before: &[usize]) {
        self.inner.lock().started = Some((threads, before.to_vec()));
    }

    fn swap(&mut self, event: &SwapEvent) {
        self.inner.lock().swaps.push(*event);
    }

    fn snapshot(&mut self, _sequence: u64, values: &[usize]) {
        self.inner.lock().snapshots.push(values.to_vec());
    }

    fn finished(&mut self, report: &RunReport) {
        self.inner.lock().finished = Some(report.clone());
    }
}
