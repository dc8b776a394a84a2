//! Cooperative run loop (v0.1)
//!
//! Everything runs on one logical thread. Components that own delayed
//! work (the transition scheduler, deferred values) implement
//! [`Cooperative`]; the [`RunLoop`] repeatedly picks the earliest due job
//! across them and runs it, moving the shared [`VirtualClock`] forward.
//!
//! ```text
//!   caller ──submit──► component queue ──► RunLoop::step ──► job runs
//!                                   ▲                          │
//!                                   └──── may queue more ◄─────┘
//! ```

mod pace;
mod queue;

pub use pace::{pace, pace_until_idle};
pub use queue::JobQueue;

use std::time::Duration;

use tracing::warn;

use crate::clock::VirtualClock;

/// Upper bound on jobs run by a single drain (guards against jobs that
/// keep re-queueing themselves)
pub const MAX_STEPS_PER_DRAIN: usize = 100_000;

/// A source of queued, time-ordered work
pub trait Cooperative {
    /// Due time of the earliest queued job
    fn next_due(&self) -> Option<Duration>;

    /// Run the earliest queued job; false if nothing was queued
    fn run_next(&mut self) -> bool;
}

/// Index and due time of the earliest job across `sources`
///
/// Ties go to the source listed first.
fn earliest(sources: &[&mut dyn Cooperative]) -> Option<(usize, Duration)> {
    sources
        .iter()
        .enumerate()
        .filter_map(|(idx, s)| s.next_due().map(|due| (idx, due)))
        .min_by_key(|&(idx, due)| (due, idx))
}

/// Single-threaded driver over a shared virtual clock
#[derive(Debug, Clone)]
pub struct RunLoop {
    clock: VirtualClock,
}

impl RunLoop {
    pub fn new(clock: VirtualClock) -> Self {
        Self { clock }
    }

    pub fn clock(&self) -> &VirtualClock {
        &self.clock
    }

    /// Due time of the earliest job across `sources`
    pub fn next_due(&self, sources: &[&mut dyn Cooperative]) -> Option<Duration> {
        earliest(sources).map(|(_, due)| due)
    }

    /// Run exactly one job (the earliest); false when all queues are empty
    pub fn step(&self, sources: &mut [&mut dyn Cooperative]) -> bool {
        match earliest(sources) {
            Some((idx, _)) => sources[idx].run_next(),
            None => false,
        }
    }

    /// Run every job due within `by` of now, then park the clock at now + by
    ///
    /// Returns the number of jobs run.
    pub fn advance(&self, by: Duration, sources: &mut [&mut dyn Cooperative]) -> usize {
        let target = self.clock.after(by);
        let mut ran = 0;
        while ran < MAX_STEPS_PER_DRAIN {
            match earliest(sources) {
                Some((idx, due)) if due <= target => {
                    sources[idx].run_next();
                    ran += 1;
                }
                _ => break,
            }
        }
        if ran == MAX_STEPS_PER_DRAIN {
            warn!(ran, "run loop hit its step limit while advancing");
        }
        self.clock.advance_to(target);
        ran
    }

    /// Run jobs until every queue is empty
    pub fn run_until_idle(&self, sources: &mut [&mut dyn Cooperative]) -> usize {
        let mut ran = 0;
        while ran < MAX_STEPS_PER_DRAIN && self.step(sources) {
            ran += 1;
        }
        if ran == MAX_STEPS_PER_DRAIN {
            warn!(ran, "run loop hit its step limit while draining");
        }
        ran
    }
}
