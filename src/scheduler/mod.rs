//! Transition Scheduler (v0.1)
//!
//! Two priority classes over one logical thread:
//!
//! - **Immediate**: runs to completion inside `submit_immediate`; its
//!   simulated cost blocks the clock. Interrupts any active transition.
//! - **Deferred** (transition): queued, control returns at once. Its work
//!   runs on the next scheduling opportunity and its cost elapses in the
//!   background. The commit is applied only if no newer work arrived.
//!
//! ## State machine
//!
//! ```text
//!            submit_deferred (g += 1)
//!   Idle ─────────────────────────────► Running(g)
//!    ▲                                   │   │
//!    │  commit of g / failure of g       │   │ submit_deferred
//!    ├───────────────────────────────────┘   ▼
//!    │                                  Running(g + 1)   (g is now stale)
//!    │  submit_immediate
//!    └────────────────────────────────── Running(_)
//! ```
//!
//! Interruption is unacknowledged: a stale transition keeps running and its
//! entries stay in the log (tagged with their generation), but its commit
//! is suppressed and no completion entry is written.

mod task;

pub use task::{Commit, Priority, Task, TaskContext, TaskFailure};

use std::collections::BTreeSet;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, instrument};

use crate::clock::{as_millis_u64, VirtualClock};
use crate::event::LogWriter;
use crate::runtime::{Cooperative, JobQueue};
use task::{report_failure, TaskParts};

/// Scheduler phase
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Idle,
    /// A transition of this generation owns the pending commit
    Running(u64),
}

enum Job<S> {
    /// Run a transition's work
    Start { generation: u64, task: Task<S> },
    /// A transition's simulated cost has elapsed
    Complete {
        generation: u64,
        label: Arc<str>,
        commit: Commit<S>,
    },
    /// Fixed-delay task fires
    Timeout { task: Task<S> },
}

/// Cooperative scheduler owning the state its tasks mutate
pub struct TransitionScheduler<S> {
    state: S,
    phase: Phase,
    generation: u64,
    clock: VirtualClock,
    log: LogWriter,
    queue: JobQueue<Job<S>>,
    discarded: BTreeSet<u64>,
}

impl<S> TransitionScheduler<S> {
    pub fn new(state: S, clock: VirtualClock, log: LogWriter) -> Self {
        Self {
            state,
            phase: Phase::Idle,
            generation: 0,
            clock,
            log,
            queue: JobQueue::new(),
            discarded: BTreeSet::new(),
        }
    }

    /// Committed state
    pub fn state(&self) -> &S {
        &self.state
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// True while a transition's commit is outstanding
    pub fn is_pending(&self) -> bool {
        matches!(self.phase, Phase::Running(_))
    }

    /// Generation of the latest deferred submission (0 before any)
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Generations whose commits were suppressed
    pub fn discarded(&self) -> &BTreeSet<u64> {
        &self.discarded
    }

    pub fn is_discarded(&self, generation: u64) -> bool {
        self.discarded.contains(&generation)
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    /// Number of queued jobs (transition work, completions, timeouts)
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Run `task` to completion before returning
    ///
    /// Any active transition loses its claim on the commit. A failure is
    /// returned to the caller; the scheduler is left `Idle` either way.
    #[instrument(skip_all, fields(task = %task.label()))]
    pub fn submit_immediate(&mut self, task: Task<S>) -> Result<(), TaskFailure> {
        if let Phase::Running(generation) = self.phase {
            debug!(generation, "immediate task interrupts transition");
            self.phase = Phase::Idle;
        }
        let parts = task.into_parts();
        self.run_sync(parts.label, parts.cost, parts.work, Priority::Immediate)
    }

    /// Queue `task` as a transition and return its generation
    #[instrument(skip_all, fields(task = %task.label()))]
    pub fn submit_deferred(&mut self, task: Task<S>) -> u64 {
        self.generation += 1;
        let generation = self.generation;
        if let Phase::Running(previous) = self.phase {
            debug!(previous, generation, "transition superseded");
        }
        self.phase = Phase::Running(generation);
        self.queue
            .push(self.clock.now(), Job::Start { generation, task });
        generation
    }

    /// Fire `task` after `delay`, outside the transition bookkeeping
    ///
    /// It neither interrupts nor can be interrupted; when it fires it runs
    /// like an immediate task.
    #[instrument(skip_all, fields(task = %task.label(), delay_ms = as_millis_u64(delay)))]
    pub fn schedule_timeout(&mut self, delay: Duration, task: Task<S>) {
        self.queue
            .push(self.clock.after(delay), Job::Timeout { task });
    }

    fn run_sync(
        &mut self,
        label: Arc<str>,
        cost: Duration,
        work: task::Work<S>,
        priority: Priority,
    ) -> Result<(), TaskFailure> {
        let ctx = TaskContext::new(
            Arc::clone(&label),
            priority,
            None,
            self.clock.now(),
            self.log.clone(),
        );
        let commit = work(&ctx)?;
        // Blocking: nothing else runs while the cost elapses
        self.clock.advance(cost);
        commit.apply(&mut self.state);
        debug!(task = %label, ?priority, "applied synchronously");
        Ok(())
    }

    fn start_transition(&mut self, generation: u64, task: Task<S>) {
        let TaskParts {
            label,
            cost,
            work,
            on_failure,
        } = task.into_parts();
        let ctx = TaskContext::new(
            Arc::clone(&label),
            Priority::Deferred,
            Some(generation),
            self.clock.now(),
            self.log.for_transition(generation),
        );

        match work(&ctx) {
            Ok(commit) => {
                self.queue.push(
                    self.clock.after(cost),
                    Job::Complete {
                        generation,
                        label,
                        commit,
                    },
                );
            }
            Err(failure) => {
                if self.phase == Phase::Running(generation) {
                    self.phase = Phase::Idle;
                }
                debug!(generation, task = %label, "transition failed");
                report_failure(on_failure, &failure);
            }
        }
    }

    fn complete_transition(&mut self, generation: u64, label: Arc<str>, commit: Commit<S>) {
        if self.phase != Phase::Running(generation) {
            // Expected outcome of interruption, not an error
            debug!(generation, task = %label, "stale commit suppressed");
            self.discarded.insert(generation);
            return;
        }
        commit.apply(&mut self.state);
        self.phase = Phase::Idle;
        self.log.log(format!("Committed {}", label));
        debug!(generation, task = %label, "transition committed");
    }

    fn fire_timeout(&mut self, task: Task<S>) {
        let TaskParts {
            label,
            cost,
            work,
            on_failure,
        } = task.into_parts();
        if let Err(failure) = self.run_sync(label, cost, work, Priority::Timeout) {
            report_failure(on_failure, &failure);
        }
    }
}

impl<S> Cooperative for TransitionScheduler<S> {
    fn next_due(&self) -> Option<Duration> {
        self.queue.peek_due()
    }

    fn run_next(&mut self) -> bool {
        let Some((due, job)) = self.queue.pop() else {
            return false;
        };
        self.clock.advance_to(due);
        match job {
            Job::Start { generation, task } => self.start_transition(generation, task),
            Job::Complete {
                generation,
                label,
                commit,
            } => self.complete_transition(generation, label, commit),
            Job::Timeout { task } => self.fire_timeout(task),
        }
        true
    }
}

impl<S: std::fmt::Debug> std::fmt::Debug for TransitionScheduler<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TransitionScheduler")
            .field("state", &self.state)
            .field("phase", &self.phase)
            .field("generation", &self.generation)
            .field("queued", &self.queue.len())
            .finish()
    }
}
