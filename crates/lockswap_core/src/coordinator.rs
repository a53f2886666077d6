//! # Coordinator
//!
//! Single-threaded setup and teardown around the concurrent phase.
//!
//! ```text
//!   validate config
//!   allocate buffer (identity), slot locks, output lock, budget, counter
//!   report "before"
//!   spawn N swap workers ─┐
//!   spawn monitor ────────┼── all share one SharedBuffer / Budget / OpCounter
//!   join N swap workers ──┘
//!   stop monitor
//!   build and report RunReport
//! ```
//!
//! Setup failures are returned as [`KernelError`]. There is no rollback: a
//! worker already spawned when a later spawn fails keeps running until the
//! budget is gone, and the caller is expected to exit.

use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Instant;

use crate::buffer::SharedBuffer;
use crate::config::KernelConfig;
use crate::error::{KernelError, KernelResult};
use crate::report::{Reporter, RunReport};
use crate::sync::{budget_for, Budget, OpCounter};
use crate::worker::{Monitor, SwapWorker, WorkerSettings, WorkerSummary};

/// Runs the kernel for one configuration.
#[derive(Clone, Debug)]
pub struct Coordinator {
    config: KernelConfig,
}

impl Coordinator {
    /// Creates a coordinator for a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`KernelError::InvalidConfig`] if `config` fails validation.
    pub fn new(config: KernelConfig) -> KernelResult<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The configuration this coordinator runs.
    #[must_use]
    pub fn config(&self) -> &KernelConfig {
        &self.config
    }

    /// Performs one complete run, reporting through `reporter`.
    ///
    /// # Errors
    ///
    /// Returns a [`KernelError`] if allocation or thread creation fails during
    /// setup, or if a worker or the monitor panicked.
    pub fn run(&self, reporter: Box<dyn Reporter>) -> KernelResult<RunReport> {
        let config = &self.config;

        let mut buffer = SharedBuffer::identity(config.buffer_size, reporter)?;
        if config.audit_locks {
            buffer = buffer.with_audit()?;
        }
        let buffer = Arc::new(buffer);
        let budget = budget_for(config.budget, config.iterations);
        let counter = Arc::new(OpCounter::new());

        let before = buffer.snapshot();
        let settings = WorkerSettings {
            delay: config.delay(),
            policy: config.self_swap,
            seed: config.resolved_seed(),
        };

        tracing::info!(
            threads = config.threads,
            buffer_size = config.buffer_size,
            iterations = config.iterations,
            delay_us = config.delay_us,
            seed = settings.seed,
            policy = %settings.policy,
            budget = %config.budget,
            "creating swap workers"
        );
        buffer.report(|out| out.started(config.threads, &before));

        let started = Instant::now();
        let handles = spawn_workers(config.threads, &buffer, &budget, &counter, &settings)?;
        let monitor = config
            .monitor_interval()
            .map(|interval| Monitor::spawn(Arc::clone(&buffer), interval))
            .transpose()?;

        let workers = join_workers(handles)?;
        let snapshots = match monitor {
            Some(monitor) => monitor.stop()?,
            None => 0,
        };
        let elapsed = started.elapsed();

        let after = buffer.snapshot();
        let mut sorted = after.clone();
        sorted.sort_unstable();

        let report = RunReport {
            before,
            after,
            sorted,
            completed: counter.get(),
            budget: budget.initial(),
            workers,
            snapshots,
            lock_violations: buffer.audit().map(crate::buffer::LockAudit::violations),
            elapsed,
        };

        if !report.is_permutation() {
            tracing::error!(sorted = ?report.sorted, "buffer is no longer a permutation");
        }
        if let Some(violations) = report.lock_violations.filter(|&v| v > 0) {
            tracing::error!(violations, "overlapping slot lock holds detected");
        }

        buffer.report(|out| out.finished(&report));
        tracing::info!(
            completed = report.completed,
            swaps = report.swaps(),
            self_swaps = report.self_swaps(),
            snapshots = report.snapshots,
            elapsed = ?report.elapsed,
            "run finished"
        );

        Ok(report)
    }
}

/// Joins every worker, then reports the first one that panicked.
fn join_workers(handles: Vec<JoinHandle<WorkerSummary>>) -> KernelResult<Vec<WorkerSummary>> {
    let mut workers = Vec::with_capacity(handles.len());
    let mut panicked = None;
    for (ordinal, handle) in handles.into_iter().enumerate() {
        match handle.join() {
            Ok(summary) => workers.push(summary),
            Err(_) => {
                tracing::error!(worker = ordinal, "swap worker panicked");
                if panicked.is_none() {
                    panicked = Some(ordinal);
                }
            }
        }
    }
    match panicked {
        Some(ordinal) => Err(KernelError::WorkerPanicked(ordinal)),
        None => Ok(workers),
    }
}

fn spawn_workers(
    threads: usize,
    buffer: &Arc<SharedBuffer>,
    budget: &Arc<dyn Budget>,
    counter: &Arc<OpCounter>,
    settings: &WorkerSettings,
) -> KernelResult<Vec<JoinHandle<WorkerSummary>>> {
    let mut handles = Vec::new();
    handles
        .try_reserve_exact(threads)
        .map_err(|_| KernelError::OutOfMemory {
            what: "worker handles",
            requested: threads,
        })?;

    for ordinal in 0..threads {
        let worker = SwapWorker::new(
            ordinal,
            Arc::clone(buffer),
            Arc::clone(budget),
            Arc::clone(counter),
            settings,
        );
        let handle = thread::Builder::new()
            .name(format!("swap-{ordinal}"))
            .spawn(move || worker.run())
            .map_err(|source| KernelError::Spawn {
                role: format!("swap worker #{ordinal}"),
                source,
            })?;
        handles.push(handle);
    }

    Ok(handles)
}
