//! LogSink Trait - abstraction for trace writes (v0.1)
//!
//! Producers never look the log up implicitly: they are handed a
//! `LogWriter` at construction. The writer sits on top of a `LogSink`,
//! so tests can swap the real `EventLog` for `NoopSink`.

use std::sync::Arc;

use super::log::{Attribution, EventLog};

/// Trait for anything that accepts trace entries
pub trait LogSink: Send + Sync {
    /// Append an entry and return its ID
    fn append(&self, entry: Arc<str>, attribution: Attribution) -> u64;
}

impl LogSink for EventLog {
    fn append(&self, entry: Arc<str>, attribution: Attribution) -> u64 {
        self.append_attributed(entry, attribution)
    }
}

/// No-op sink for testing (always returns 0)
#[derive(Debug, Clone, Default)]
pub struct NoopSink;

impl LogSink for NoopSink {
    fn append(&self, _entry: Arc<str>, _attribution: Attribution) -> u64 {
        0
    }
}

/// Write-only logging capability
///
/// Cloning is cheap; `for_transition` derives a writer whose entries are
/// attributed to a deferred task generation.
#[derive(Clone)]
pub struct LogWriter {
    sink: Arc<dyn LogSink>,
    attribution: Attribution,
}

impl LogWriter {
    pub fn new(sink: Arc<dyn LogSink>) -> Self {
        Self {
            sink,
            attribution: Attribution::Caller,
        }
    }

    /// Writer that drops everything
    pub fn noop() -> Self {
        Self::new(Arc::new(NoopSink))
    }

    /// Same sink, entries attributed to `generation`
    pub fn for_transition(&self, generation: u64) -> Self {
        Self {
            sink: Arc::clone(&self.sink),
            attribution: Attribution::Transition { generation },
        }
    }

    pub fn log(&self, entry: impl Into<Arc<str>>) -> u64 {
        self.sink.append(entry.into(), self.attribution)
    }

    pub fn attribution(&self) -> Attribution {
        self.attribution
    }
}

impl std::fmt::Debug for LogWriter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogWriter")
            .field("attribution", &self.attribution)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn log_sink_trait_is_object_safe() {
        fn accepts_sink(_: &dyn LogSink) {}

        accepts_sink(&EventLog::new());
        accepts_sink(&NoopSink);
    }

    #[test]
    fn writer_appends_to_event_log() {
        let log = EventLog::new();
        let writer = log.writer();

        assert_eq!(writer.log("first"), 0);
        assert_eq!(writer.log("second"), 1);
        assert_eq!(log.snapshot(), vec!["first", "second"]);
    }

    #[test]
    fn transition_writer_tags_generation() {
        let log = EventLog::new();
        let writer = log.writer().for_transition(7);
        writer.log("inside");

        assert_eq!(log.events()[0].attribution, Attribution::Transition { generation: 7 });
        // The parent writer keeps its own attribution
        assert_eq!(log.writer().attribution(), Attribution::Caller);
    }

    #[test]
    fn noop_writer_drops_entries() {
        let writer = LogWriter::noop();
        assert_eq!(writer.log("ignored"), 0);
        assert_eq!(writer.log("ignored"), 0);
    }

    #[test]
    fn noop_sink_is_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<NoopSink>();
        assert_send_sync::<LogWriter>();
    }
}
