//! # Swap Worker
//!
//! ```text
//! loop:
//!   claim one unit of budget        (refused → exit)
//!   draw i, j uniformly from [0, N)
//!   i == j → policy (count / redraw), no announcement
//!   lock min(i,j), lock max(i,j)
//!   announce under output lock
//!   tmp = [i]; pause; [i] = [j]; pause; [j] = tmp; pause
//!   unlock max, unlock min
//!   count the completed operation
//! ```
//!
//! All three pauses happen while both slot locks are held.

use std::sync::Arc;
use std::time::Duration;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use crate::buffer::{HolderId, SharedBuffer};
use crate::config::SelfSwapPolicy;
use crate::report::SwapEvent;
use crate::sync::{Budget, OpCounter};

/// Settings shared by every worker of a run.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WorkerSettings {
    /// Pause between swap steps, `None` for no pause.
    pub delay: Option<Duration>,
    /// Handling of `i == j` draws.
    pub policy: SelfSwapPolicy,
    /// Base seed; worker `k` draws from `seed + k`.
    pub seed: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            delay: None,
            policy: SelfSwapPolicy::Count,
            seed: 0,
        }
    }
}

/// What one worker did over its lifetime.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct WorkerSummary {
    /// Worker ordinal.
    pub ordinal: usize,
    /// Budget units this worker claimed.
    pub claimed: u64,
    /// Claims that exchanged two distinct slots.
    pub swaps: u64,
    /// Claims that drew `i == j` and moved nothing.
    pub self_swaps: u64,
    /// Extra draws made under [`SelfSwapPolicy::Redraw`].
    pub redraws: u64,
}

/// Worker descriptor: identity plus handles to the shared state.
pub struct SwapWorker {
    ordinal: usize,
    buffer: Arc<SharedBuffer>,
    budget: Arc<dyn Budget>,
    counter: Arc<OpCounter>,
    delay: Option<Duration>,
    policy: SelfSwapPolicy,
    rng: ChaCha8Rng,
    summary: WorkerSummary,
}

impl SwapWorker {
    /// Builds worker number `ordinal` over the shared state.
    #[must_use]
    pub fn new(
        ordinal: usize,
        buffer: Arc<SharedBuffer>,
        budget: Arc<dyn Budget>,
        counter: Arc<OpCounter>,
        settings: &WorkerSettings,
    ) -> Self {
        Self {
            ordinal,
            buffer,
            budget,
            counter,
            delay: settings.delay,
            policy: settings.policy,
            rng: ChaCha8Rng::seed_from_u64(settings.seed.wrapping_add(ordinal as u64)),
            summary: WorkerSummary {
                ordinal,
                ..WorkerSummary::default()
            },
        }
    }

    /// This worker's ordinal.
    #[inline]
    #[must_use]
    pub fn ordinal(&self) -> usize {
        self.ordinal
    }

    /// Totals so far.
    #[inline]
    #[must_use]
    pub fn summary(&self) -> WorkerSummary {
        self.summary
    }

    /// Runs until the budget is exhausted.
    pub fn run(mut self) -> WorkerSummary {
        tracing::debug!(worker = self.ordinal(), "swap worker started");
        while self.step() {}
        tracing::debug!(
            worker = self.ordinal(),
            claimed = self.summary.claimed,
            swaps = self.summary.swaps,
            self_swaps = self.summary.self_swaps,
            "swap worker exhausted budget"
        );
        self.summary
    }

    /// Performs one claimed operation. Returns `false` if the claim was refused.
    pub fn step(&mut self) -> bool {
        if !self.budget.claim_one() {
            return false;
        }
        self.summary.claimed += 1;
        tracing::trace!(worker = self.ordinal, "claimed operation");

        let (i, j) = self.draw();
        match self.buffer.lock_pair(i, j, HolderId::worker(self.ordinal)) {
            Some(mut pair) => {
                let (first_value, second_value) = pair.values();
                let event = SwapEvent {
                    worker: self.ordinal,
                    first: i,
                    first_value,
                    second: j,
                    second_value,
                };
                self.buffer.report(|out| out.swap(&event));

                let tmp = *pair.first();
                pause(self.delay);
                let second = *pair.second();
                *pair.first_mut() = second;
                pause(self.delay);
                *pair.second_mut() = tmp;
                pause(self.delay);

                drop(pair);
                self.summary.swaps += 1;
            }
            None => self.summary.self_swaps += 1,
        }

        self.counter.increment();
        true
    }

    /// Draws the slot pair for one operation.
    fn draw(&mut self) -> (usize, usize) {
        let n = self.buffer.len();
        let mut i = self.rng.gen_range(0..n);
        let mut j = self.rng.gen_range(0..n);

        if self.policy == SelfSwapPolicy::Redraw && n > 1 {
            while i == j {
                self.summary.redraws += 1;
                i = self.rng.gen_range(0..n);
                j = self.rng.gen_range(0..n);
            }
        }
        (i, j)
    }
}

#[inline]
fn pause(delay: Option<Duration>) {
    if let Some(delay) = delay {
        std::thread::sleep(delay);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::buffer::Checksum;
    use crate::report::{NullReporter, RecordingReporter};
    use crate::sync::{AtomicBudget, LockedBudget};

    struct Rig {
        buffer: Arc<SharedBuffer>,
        budget: Arc<dyn Budget>,
        counter: Arc<OpCounter>,
    }

    fn rig(size: usize, budget: u64) -> Rig {
        Rig {
            buffer: Arc::new(SharedBuffer::identity(size, Box::new(NullReporter)).unwrap()),
            budget: Arc::new(LockedBudget::new(budget)),
            counter: Arc::new(OpCounter::new()),
        }
    }

    fn worker(rig: &Rig, ordinal: usize, settings: &WorkerSettings) -> SwapWorker {
        SwapWorker::new(
            ordinal,
            Arc::clone(&rig.buffer),
            Arc::clone(&rig.budget),
            Arc::clone(&rig.counter),
            settings,
        )
    }

    #[test]
    fn test_zero_budget_exits_immediately() {
        let rig = rig(4, 0);
        let summary = worker(&rig, 0, &WorkerSettings::default()).run();

        assert_eq!(summary.claimed, 0);
        assert_eq!(rig.counter.get(), 0);
        assert_eq!(rig.buffer.snapshot(), vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_ordinal_and_summary_agree() {
        let rig = rig(3, 0);
        let w = worker(&rig, 5, &WorkerSettings::default());
        assert_eq!(w.ordinal(), 5);
        assert_eq!(w.summary().ordinal, 5);
    }

    #[test]
    fn test_self_swaps_are_not_announced() {
        let recorder = RecordingReporter::new();
        let buffer = Arc::new(SharedBuffer::identity(1, Box::new(recorder.clone())).unwrap());
        let budget: Arc<dyn Budget> = Arc::new(LockedBudget::new(10));
        let counter = Arc::new(OpCounter::new());

        let summary =
            SwapWorker::new(0, buffer, budget, counter, &WorkerSettings::default()).run();

        assert_eq!(summary.self_swaps, 10);
        assert!(recorder.swaps().is_empty());
    }

    #[test]
    fn test_single_step_moves_at_most_two_slots() {
        let rig = rig(4, 1);
        let mut w = worker(&rig, 0, &WorkerSettings::default());

        assert!(w.step());
        assert!(!w.step());

        let after = rig.buffer.snapshot();
        let changed = after.iter().enumerate().filter(|(k, v)| *k != **v).count();
        assert!(changed == 0 || changed == 2, "changed {changed} slots");
        assert_eq!(w.summary().claimed, 1);
        assert_eq!(w.summary().swaps + w.summary().self_swaps, 1);
        assert_eq!(rig.counter.get(), 1);
    }

    #[test]
    fn test_one_slot_buffer_counts_self_swaps() {
        for policy in [SelfSwapPolicy::Count, SelfSwapPolicy::Redraw] {
            let rig = rig(1, 25);
            let settings = WorkerSettings {
                policy,
                ..WorkerSettings::default()
            };
            let summary = worker(&rig, 0, &settings).run();

            assert_eq!(summary.claimed, 25);
            assert_eq!(summary.self_swaps, 25);
            assert_eq!(summary.swaps, 0);
            assert_eq!(summary.redraws, 0);
            assert_eq!(rig.counter.get(), 25);
        }
    }

    #[test]
    fn test_redraw_policy_never_self_swaps() {
        let rig = rig(2, 500);
        let settings = WorkerSettings {
            policy: SelfSwapPolicy::Redraw,
            seed: 11,
            ..WorkerSettings::default()
        };
        let summary = worker(&rig, 0, &settings).run();

        assert_eq!(summary.swaps, 500);
        assert_eq!(summary.self_swaps, 0);
        // Half of all draws on two slots collide.
        assert!(summary.redraws > 0);
        assert_eq!(rig.counter.get(), 500);
    }

    #[test]
    fn test_count_policy_counts_self_swaps() {
        let rig = rig(2, 500);
        let settings = WorkerSettings {
            seed: 11,
            ..WorkerSettings::default()
        };
        let summary = worker(&rig, 0, &settings).run();

        assert_eq!(summary.swaps + summary.self_swaps, 500);
        assert!(summary.self_swaps > 0);
        assert_eq!(summary.redraws, 0);
    }

    #[test]
    fn test_announcement_carries_pre_swap_values() {
        let recorder = RecordingReporter::new();
        let buffer = Arc::new(SharedBuffer::identity(8, Box::new(recorder.clone())).unwrap());
        let budget: Arc<dyn Budget> = Arc::new(AtomicBudget::new(50));
        let counter = Arc::new(OpCounter::new());

        let settings = WorkerSettings {
            policy: SelfSwapPolicy::Redraw,
            seed: 3,
            ..WorkerSettings::default()
        };
        let summary = SwapWorker::new(0, Arc::clone(&buffer), budget, counter, &settings).run();

        // Replay the announcements on a plain vector: each must match the
        // state it was made in.
        let mut replay: Vec<usize> = (0..8).collect();
        let swaps = recorder.swaps();
        assert_eq!(swaps.len() as u64, summary.swaps);
        for event in &swaps {
            assert_eq!(replay[event.first], event.first_value);
            assert_eq!(replay[event.second], event.second_value);
            replay.swap(event.first, event.second);
        }
        assert_eq!(replay, buffer.snapshot());
    }

    #[test]
    fn test_same_seed_same_result() {
        let run = || {
            let rig = rig(16, 300);
            let settings = WorkerSettings {
                seed: 99,
                ..WorkerSettings::default()
            };
            worker(&rig, 4, &settings).run();
            rig.buffer.snapshot()
        };
        assert_eq!(run(), run());
    }

    #[test]
    fn test_concurrent_workers_keep_permutation() {
        let rig = rig(6, 20_000);
        let settings = WorkerSettings {
            seed: 5,
            ..WorkerSettings::default()
        };

        let handles: Vec<_> = (0..12)
            .map(|ordinal| {
                let w = worker(&rig, ordinal, &settings);
                std::thread::spawn(move || w.run())
            })
            .collect();
        let claimed: u64 = handles.into_iter().map(|h| h.join().unwrap().claimed).sum();

        assert_eq!(claimed, 20_000);
        assert_eq!(rig.counter.get(), 20_000);
        assert_eq!(rig.buffer.checksum(), Checksum::identity(6));

        let mut sorted = rig.buffer.snapshot();
        sorted.sort_unstable();
        assert_eq!(sorted, (0..6).collect::<Vec<_>>());
    }
}
