//! EventLog - ordered trace of harness activity (v0.1)
//!
//! - Event: envelope with id + timestamp + attribution + entry text
//! - Attribution: who wrote the entry (caller code or a transition task)
//! - EventLog: thread-safe, append-only log with optional bounded mode

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock; // 2-3x faster than std::sync::RwLock

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

use crate::clock::{as_millis_u64, VirtualClock};

/// Capacity of the live notification channel
const NOTIFY_CAPACITY: usize = 256;

/// Single entry in the trace
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Event {
    /// Monotonic sequence ID (survives `clear`)
    pub id: u64,
    /// Harness clock reading at append time (ms)
    pub timestamp_ms: u64,
    /// Who wrote the entry
    pub attribution: Attribution,
    /// Trace text
    pub entry: Arc<str>,
}

/// Origin of a trace entry
///
/// Entries written from inside a transition keep their generation so a
/// display can tell committed work apart from interrupted background work.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Attribution {
    /// Written directly by harness or caller code
    Caller,
    /// Written while a deferred task of this generation was executing
    Transition { generation: u64 },
}

impl Attribution {
    /// Generation of the transition that wrote the entry, if any
    pub fn generation(&self) -> Option<u64> {
        match self {
            Self::Caller => None,
            Self::Transition { generation } => Some(*generation),
        }
    }
}

/// Retention policy for the log
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Keep at most this many entries, evicting the oldest (None = unbounded)
    #[serde(default)]
    pub max_entries: Option<usize>,
}

impl LogConfig {
    pub fn bounded(max_entries: usize) -> Self {
        Self {
            max_entries: Some(max_entries),
        }
    }
}

/// Thread-safe, append-only event log
#[derive(Clone)]
pub struct EventLog {
    events: Arc<RwLock<VecDeque<Event>>>,
    next_id: Arc<AtomicU64>,
    clock: VirtualClock,
    config: LogConfig,
    notify: broadcast::Sender<Event>,
}

impl EventLog {
    /// Create an unbounded log with its own clock
    pub fn new() -> Self {
        Self::with_clock(VirtualClock::new(), LogConfig::default())
    }

    /// Create a log stamped by the given harness clock
    pub fn with_clock(clock: VirtualClock, config: LogConfig) -> Self {
        let (notify, _) = broadcast::channel(NOTIFY_CAPACITY);
        Self {
            events: Arc::new(RwLock::new(VecDeque::new())),
            next_id: Arc::new(AtomicU64::new(0)),
            clock,
            config,
            notify,
        }
    }

    /// Append an entry written by caller code (returns event ID)
    pub fn append(&self, entry: impl Into<Arc<str>>) -> u64 {
        self.append_attributed(entry, Attribution::Caller)
    }

    /// Append an entry with explicit attribution (returns event ID)
    pub fn append_attributed(&self, entry: impl Into<Arc<str>>, attribution: Attribution) -> u64 {
        let mut events = self.events.write();
        // ID is taken under the write lock so ids follow insertion order
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let event = Event {
            id,
            timestamp_ms: as_millis_u64(self.clock.now()),
            attribution,
            entry: entry.into(),
        };

        events.push_back(event.clone());
        if let Some(max) = self.config.max_entries {
            while events.len() > max {
                events.pop_front();
            }
        }
        drop(events);

        // No subscribers is fine
        let _ = self.notify.send(event);
        id
    }

    /// Remove every entry in one step
    pub fn clear(&self) {
        self.events.write().clear();
    }

    /// Ordered copy of the entry texts
    pub fn snapshot(&self) -> Vec<String> {
        self.events.read().iter().map(|e| e.entry.to_string()).collect()
    }

    /// Get all event envelopes (cloned)
    pub fn events(&self) -> Vec<Event> {
        self.events.read().iter().cloned().collect()
    }

    /// Entries written from inside the given transition generation
    pub fn filter_generation(&self, generation: u64) -> Vec<Event> {
        self.events
            .read()
            .iter()
            .filter(|e| e.attribution.generation() == Some(generation))
            .cloned()
            .collect()
    }

    /// Subscribe to every future append
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.notify.subscribe()
    }

    /// Write-only capability for producers
    pub fn writer(&self) -> super::LogWriter {
        super::LogWriter::new(Arc::new(self.clone()))
    }

    /// Read-only capability (plus the clear control) for displays
    pub fn view(&self) -> LogView {
        LogView { log: self.clone() }
    }

    /// Serialize to JSON for debugging
    pub fn to_json(&self) -> Value {
        serde_json::to_value(self.events()).unwrap_or(Value::Null)
    }

    pub fn config(&self) -> LogConfig {
        self.config
    }

    /// Number of entries
    pub fn len(&self) -> usize {
        self.events.read().len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl Default for EventLog {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for EventLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventLog")
            .field("len", &self.len())
            .field("max_entries", &self.config.max_entries)
            .finish()
    }
}

/// What a display collaborator gets: reads, notifications, and `clear`
#[derive(Debug, Clone)]
pub struct LogView {
    log: EventLog,
}

impl LogView {
    pub fn snapshot(&self) -> Vec<String> {
        self.log.snapshot()
    }

    pub fn events(&self) -> Vec<Event> {
        self.log.events()
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.log.subscribe()
    }

    /// The one mutation a display may trigger
    pub fn clear(&self) {
        self.log.clear();
    }

    pub fn len(&self) -> usize {
        self.log.len()
    }

    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }
}
