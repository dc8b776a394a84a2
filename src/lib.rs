//! Cadence - priority-aware update scheduling with an observable trace

pub mod clock;
pub mod config;
pub mod deferred;
pub mod error;
pub mod event;
pub mod harness;
pub mod runtime;
pub mod scenario;
pub mod scheduler;

pub use clock::VirtualClock;
pub use config::HarnessConfig;
pub use deferred::DeferredValue;
pub use error::{CadenceError, FixSuggestion, Result};
pub use event::{Attribution, Event, EventLog, LogConfig, LogSink, LogView, LogWriter, NoopSink};
pub use harness::{DemoHarness, InputHandle, ProbeHandle, Strategy, Tab};
pub use runtime::{Cooperative, RunLoop};
pub use scenario::{Scenario, Step};
pub use scheduler::{Commit, Phase, Priority, Task, TaskContext, TaskFailure, TransitionScheduler};
