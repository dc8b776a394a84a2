//! Units of work handed to the scheduler
//!
//! A task runs its `work` closure, which may log through its
//! [`TaskContext`] and returns a staged [`Commit`]. The scheduler decides
//! whether the commit is ever applied.

use std::sync::Arc;
use std::time::Duration;

use thiserror::Error;

use crate::event::LogWriter;

/// A submitted task raised during execution
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("task '{label}' failed: {reason}")]
pub struct TaskFailure {
    pub label: Arc<str>,
    pub reason: String,
}

impl TaskFailure {
    pub fn new(label: impl Into<Arc<str>>, reason: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

/// Scheduling class a task ran under
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    /// Applied before control returns to the caller
    Immediate,
    /// Transition: interruptible, committed only if still current
    Deferred,
    /// Fired by the fixed-delay primitive
    Timeout,
}

/// Staged state mutation, applied only if the scheduler commits it
pub struct Commit<S> {
    apply: Box<dyn FnOnce(&mut S)>,
}

impl<S> Commit<S> {
    pub fn new(apply: impl FnOnce(&mut S) + 'static) -> Self {
        Self {
            apply: Box::new(apply),
        }
    }

    /// Commit that leaves the state untouched
    pub fn none() -> Self {
        Self::new(|_| {})
    }

    pub(crate) fn apply(self, state: &mut S) {
        (self.apply)(state)
    }
}

pub(crate) type Work<S> = Box<dyn FnOnce(&TaskContext) -> Result<Commit<S>, TaskFailure>>;
pub(crate) type FailureHandler = Box<dyn FnOnce(&TaskFailure)>;

/// A labelled unit of work with a simulated cost
pub struct Task<S> {
    label: Arc<str>,
    cost: Duration,
    work: Work<S>,
    on_failure: Option<FailureHandler>,
}

impl<S> Task<S> {
    pub fn new(
        label: impl Into<Arc<str>>,
        work: impl FnOnce(&TaskContext) -> Result<Commit<S>, TaskFailure> + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            cost: Duration::ZERO,
            work: Box::new(work),
            on_failure: None,
        }
    }

    /// Task that only applies `apply`
    pub fn update(label: impl Into<Arc<str>>, apply: impl FnOnce(&mut S) + 'static) -> Self {
        Self::new(label, move |_| Ok(Commit::new(apply)))
    }

    /// Simulated duration of the work
    pub fn with_cost(mut self, cost: Duration) -> Self {
        self.cost = cost;
        self
    }

    /// Where a deferred or timeout failure is reported
    pub fn on_failure(mut self, handler: impl FnOnce(&TaskFailure) + 'static) -> Self {
        self.on_failure = Some(Box::new(handler));
        self
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn cost(&self) -> Duration {
        self.cost
    }

    pub(crate) fn into_parts(self) -> TaskParts<S> {
        TaskParts {
            label: self.label,
            cost: self.cost,
            work: self.work,
            on_failure: self.on_failure,
        }
    }
}

impl<S> std::fmt::Debug for Task<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Task")
            .field("label", &self.label)
            .field("cost", &self.cost)
            .field("on_failure", &self.on_failure.is_some())
            .finish()
    }
}

pub(crate) struct TaskParts<S> {
    pub label: Arc<str>,
    pub cost: Duration,
    pub work: Work<S>,
    pub on_failure: Option<FailureHandler>,
}

/// Hand a failure to its handler, or trace it when nobody listens
pub(crate) fn report_failure(on_failure: Option<FailureHandler>, failure: &TaskFailure) {
    match on_failure {
        Some(handler) => handler(failure),
        None => tracing::warn!(
            task = %failure.label,
            reason = %failure.reason,
            "task failed with no failure handler"
        ),
    }
}

/// What a running task can see and do
///
/// Passed explicitly to every task; there is no ambient context.
#[derive(Debug, Clone)]
pub struct TaskContext {
    label: Arc<str>,
    priority: Priority,
    generation: Option<u64>,
    started_at: Duration,
    log: LogWriter,
}

impl TaskContext {
    pub(crate) fn new(
        label: Arc<str>,
        priority: Priority,
        generation: Option<u64>,
        started_at: Duration,
        log: LogWriter,
    ) -> Self {
        Self {
            label,
            priority,
            generation,
            started_at,
            log,
        }
    }

    /// Append a trace entry attributed to this task
    pub fn log(&self, entry: impl Into<Arc<str>>) -> u64 {
        self.log.log(entry)
    }

    /// Build a failure carrying this task's label
    pub fn fail(&self, reason: impl Into<String>) -> TaskFailure {
        TaskFailure::new(Arc::clone(&self.label), reason)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    /// Transition generation (deferred tasks only)
    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn started_at(&self) -> Duration {
        self.started_at
    }
}
