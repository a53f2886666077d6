//! # Monitor Worker
//!
//! Independent observer that periodically reports the whole buffer.
//!
//! ```text
//!   wait(interval) on stop channel ── stop / disconnected → exit
//!        │ timeout
//!        ▼
//!   copy slots one lock at a time   (no output lock held)
//!        │
//!        ▼
//!   lock output, report, unlock
//! ```
//!
//! The copy is not atomic: a swap can complete between two slot reads, so a
//! snapshot may straddle swaps by different workers and even show a value
//! twice. That is accepted; the buffer itself is never touched.
//!
//! Cancellation is only observed at the top of the loop, where the monitor
//! holds no lock at all.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender};

use crate::buffer::SharedBuffer;
use crate::error::{KernelError, KernelResult};

/// The monitor thread body.
pub struct Monitor {
    buffer: Arc<SharedBuffer>,
    interval: Duration,
    stop: Receiver<()>,
}

impl Monitor {
    /// Starts a monitor over `buffer`, snapshotting every `interval`.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::Spawn`] if the thread cannot be created.
    pub fn spawn(buffer: Arc<SharedBuffer>, interval: Duration) -> KernelResult<MonitorHandle> {
        let (stop_tx, stop_rx) = bounded(1);
        let monitor = Self {
            buffer,
            interval,
            stop: stop_rx,
        };

        let thread = thread::Builder::new()
            .name("monitor".to_string())
            .spawn(move || monitor.run())
            .map_err(|source| KernelError::Spawn {
                role: "monitor".to_string(),
                source,
            })?;

        Ok(MonitorHandle {
            stop: Some(stop_tx),
            thread: Some(thread),
        })
    }

    fn run(self) -> u64 {
        tracing::debug!(interval = ?self.interval, "monitor started");
        let mut taken = 0u64;

        loop {
            match self.stop.recv_timeout(self.interval) {
                Err(RecvTimeoutError::Timeout) => {}
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }

            let values = self.buffer.snapshot();
            taken += 1;
            self.buffer.report(|out| out.snapshot(taken, &values));
        }

        tracing::debug!(snapshots = taken, "monitor stopped");
        taken
    }
}

/// Owner side of a running monitor.
///
/// Dropping the handle stops and joins the monitor.
pub struct MonitorHandle {
    stop: Option<Sender<()>>,
    thread: Option<JoinHandle<u64>>,
}

impl MonitorHandle {
    /// Signals the monitor, waits for it and returns how many snapshots it took.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::MonitorPanicked`] if the monitor thread panicked.
    pub fn stop(mut self) -> KernelResult<u64> {
        self.shutdown()
    }

    /// Whether the monitor thread is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.thread.as_ref().is_some_and(|t| !t.is_finished())
    }

    fn shutdown(&mut self) -> KernelResult<u64> {
        if let Some(stop) = self.stop.take() {
            // A full channel or a gone receiver both mean the monitor is already stopping.
            let _ = stop.try_send(());
        }
        match self.thread.take() {
            Some(thread) => thread.join().map_err(|_| KernelError::MonitorPanicked),
            None => Ok(0),
        }
    }
}

impl Drop for MonitorHandle {
    fn drop(&mut self) {
        let _ = self.shutdown();
    }
}
