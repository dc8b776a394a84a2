//! Deferred value: a lagged view of a fast-changing source
//!
//! `update` replaces the source at once and queues a recomputation keyed by
//! the new value. Only the recomputation for the latest update may commit
//! (last-write-wins); older ones are dropped when they come due, so rapid
//! input never builds a backlog.

use std::fmt;
use std::time::Duration;

use tracing::debug;

use crate::clock::VirtualClock;
use crate::event::LogWriter;
use crate::runtime::{Cooperative, JobQueue};

type CostFn<T> = Box<dyn Fn(&T) -> Duration>;
type DescribeFn<T> = Box<dyn Fn(&T) -> String>;

struct Recompute<T> {
    generation: u64,
    value: T,
}

/// Source value plus the last committed (lagged) value
pub struct DeferredValue<T> {
    source: T,
    lagged: T,
    generation: u64,
    commits: u64,
    cost: CostFn<T>,
    clock: VirtualClock,
    queue: JobQueue<Recompute<T>>,
    trace: Option<(LogWriter, DescribeFn<T>)>,
}

impl<T: Clone + PartialEq + fmt::Debug> DeferredValue<T> {
    /// Start settled on `initial`; `cost` gives each recomputation's duration
    pub fn new(initial: T, clock: VirtualClock, cost: impl Fn(&T) -> Duration + 'static) -> Self {
        Self {
            source: initial.clone(),
            lagged: initial,
            generation: 0,
            commits: 0,
            cost: Box::new(cost),
            clock,
            queue: JobQueue::new(),
            trace: None,
        }
    }

    /// Append `describe(value)` to the trace on every commit
    pub fn with_trace(mut self, log: LogWriter, describe: impl Fn(&T) -> String + 'static) -> Self {
        self.trace = Some((log, Box::new(describe)));
        self
    }

    /// Replace the source and queue a recomputation for it
    pub fn update(&mut self, value: T) {
        if value == self.source {
            return;
        }
        self.generation += 1;
        self.source = value;

        if self.source == self.lagged {
            // Back to the committed value: nothing to compute, and any
            // in-flight recomputation is already outdated
            debug!(generation = self.generation, "source returned to lagged value");
            return;
        }

        let due = self.clock.after((self.cost)(&self.source));
        self.queue.push(
            due,
            Recompute {
                generation: self.generation,
                value: self.source.clone(),
            },
        );
    }

    /// Last committed value and whether it differs from the source
    pub fn current_lagged(&self) -> (&T, bool) {
        (&self.lagged, self.is_stale())
    }

    pub fn source(&self) -> &T {
        &self.source
    }

    pub fn lagged(&self) -> &T {
        &self.lagged
    }

    pub fn is_stale(&self) -> bool {
        self.lagged != self.source
    }

    /// Recomputations that reached the lagged value
    pub fn commits(&self) -> u64 {
        self.commits
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }
}

impl<T: Clone + PartialEq + fmt::Debug> Cooperative for DeferredValue<T> {
    fn next_due(&self) -> Option<Duration> {
        self.queue.peek_due()
    }

    fn run_next(&mut self) -> bool {
        let Some((due, job)) = self.queue.pop() else {
            return false;
        };
        self.clock.advance_to(due);

        if job.generation != self.generation {
            debug!(
                generation = job.generation,
                current = self.generation,
                value = ?job.value,
                "superseded recomputation discarded"
            );
            return true;
        }

        self.lagged = job.value;
        self.commits += 1;
        if let Some((log, describe)) = &self.trace {
            log.log(describe(&self.lagged));
        }
        debug!(generation = job.generation, value = ?self.lagged, "deferred value committed");
        true
    }
}

impl<T: fmt::Debug> fmt::Debug for DeferredValue<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DeferredValue")
            .field("source", &self.source)
            .field("lagged", &self.lagged)
            .field("generation", &self.generation)
            .field("queued", &self.queue.len())
            .finish()
    }
}
