//! Input field and capability handles
//!
//! Mounting a child returns its capabilities as a plain record. Parents
//! call those methods directly; nothing is reached through a reflective
//! handle or ambient context.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;

use crate::clock::VirtualClock;
use crate::deferred::DeferredValue;
use crate::event::LogWriter;
use crate::runtime::Cooperative;

/// Text input whose value feeds a deferred, expensive display
pub struct InputField {
    label: Arc<str>,
    current: Arc<RwLock<String>>,
    deferred: DeferredValue<String>,
}

/// Capabilities a parent gets when it mounts an [`InputField`]
#[derive(Debug, Clone)]
pub struct InputHandle {
    label: Arc<str>,
    current: Arc<RwLock<String>>,
    focused: Arc<AtomicBool>,
    log: LogWriter,
}

impl InputField {
    /// Mount the field; the returned handle is the parent's only access
    pub fn mount(
        label: impl Into<Arc<str>>,
        clock: VirtualClock,
        recompute: Duration,
        log: LogWriter,
    ) -> (Self, InputHandle) {
        let label = label.into();
        let current = Arc::new(RwLock::new(String::new()));
        let deferred = DeferredValue::new(String::new(), clock, move |_| recompute)
            .with_trace(log.clone(), |v| format!("Deferred value: {}", v));

        let handle = InputHandle {
            label: Arc::clone(&label),
            current: Arc::clone(&current),
            focused: Arc::new(AtomicBool::new(false)),
            log,
        };
        (
            Self {
                label,
                current,
                deferred,
            },
            handle,
        )
    }

    /// Change-event callback: the new raw value of the field
    pub fn on_change(&mut self, raw: &str) {
        *self.current.write() = raw.to_string();
        self.deferred.update(raw.to_string());
    }

    pub fn value(&self) -> String {
        self.current.read().clone()
    }

    pub fn deferred(&self) -> &DeferredValue<String> {
        &self.deferred
    }

    pub fn deferred_mut(&mut self) -> &mut DeferredValue<String> {
        &mut self.deferred
    }

    /// Lines the field displays
    pub fn render(&self) -> Vec<String> {
        let (lagged, stale) = self.deferred.current_lagged();
        let mut lines = vec![
            format!("{}: {}", self.label, self.current.read().as_str()),
            format!("Actual value: {}", self.deferred.source()),
        ];
        if stale {
            lines.push("Calculating...".to_string());
        } else {
            lines.push(format!("Deferred value: {}", lagged));
        }
        lines
    }
}

impl Cooperative for InputField {
    fn next_due(&self) -> Option<Duration> {
        self.deferred.next_due()
    }

    fn run_next(&mut self) -> bool {
        self.deferred.run_next()
    }
}

impl InputHandle {
    pub fn focus(&self) {
        self.focused.store(true, Ordering::SeqCst);
        self.log.log(format!("Focused input '{}'", self.label));
    }

    pub fn blur(&self) {
        self.focused.store(false, Ordering::SeqCst);
    }

    pub fn is_focused(&self) -> bool {
        self.focused.load(Ordering::SeqCst)
    }

    /// Write the field's current value to the trace
    pub fn log(&self) -> u64 {
        self.log
            .log(format!("{}: {}", self.label, self.current.read().as_str()))
    }
}

/// Capabilities of a child that only talks through the trace
#[derive(Debug, Clone)]
pub struct ProbeHandle {
    calls: Arc<AtomicU64>,
    log: LogWriter,
}

impl ProbeHandle {
    pub fn mount(log: LogWriter) -> Self {
        Self {
            calls: Arc::new(AtomicU64::new(0)),
            log,
        }
    }

    /// The child's public method
    pub fn announce(&self) -> u64 {
        let call = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
        self.log
            .log(format!("Hello from the child component (call #{})", call));
        call
    }

    pub fn calls(&self) -> u64 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventLog;
    use crate::runtime::RunLoop;

    fn mount(log: &EventLog, clock: &VirtualClock) -> (InputField, InputHandle) {
        InputField::mount(
            "type here",
            clock.clone(),
            Duration::from_millis(250),
            log.writer(),
        )
    }

    #[test]
    fn render_shows_calculating_while_stale() {
        let clock = VirtualClock::new();
        let log = EventLog::new();
        let (mut field, _) = mount(&log, &clock);

        field.on_change("a");
        assert_eq!(
            field.render(),
            vec!["type here: a", "Actual value: a", "Calculating..."]
        );

        RunLoop::new(clock).run_until_idle(&mut [&mut field]);
        assert_eq!(
            field.render(),
            vec!["type here: a", "Actual value: a", "Deferred value: a"]
        );
        assert_eq!(log.snapshot(), vec!["Deferred value: a"]);
    }

    #[test]
    fn handle_sees_live_value_and_focus() {
        let clock = VirtualClock::new();
        let log = EventLog::new();
        let (mut field, handle) = mount(&log, &clock);

        assert!(!handle.is_focused());
        handle.focus();
        assert!(handle.is_focused());

        field.on_change("hi");
        handle.log();
        assert_eq!(log.snapshot(), vec!["Focused input 'type here'", "type here: hi"]);

        handle.blur();
        assert!(!handle.is_focused());
    }

    #[test]
    fn probe_counts_its_calls() {
        let log = EventLog::new();
        let probe = ProbeHandle::mount(log.writer());
        let other = probe.clone();

        assert_eq!(probe.announce(), 1);
        assert_eq!(other.announce(), 2);
        assert_eq!(probe.calls(), 2);
        assert_eq!(
            log.snapshot(),
            vec![
                "Hello from the child component (call #1)",
                "Hello from the child component (call #2)"
            ]
        );
    }
}
