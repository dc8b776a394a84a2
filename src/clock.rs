//! Virtual harness clock
//!
//! All simulated costs elapse on this clock, never on wall time. It only
//! moves forward; clones share the same reading. Arithmetic saturates at
//! `Duration::MAX` instead of wrapping.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

/// Whole milliseconds in `d`, saturating at `u64::MAX`
pub fn as_millis_u64(d: Duration) -> u64 {
    u64::try_from(d.as_millis()).unwrap_or(u64::MAX)
}

/// Shared, monotonic virtual clock
#[derive(Clone, Default)]
pub struct VirtualClock {
    now: Arc<Mutex<Duration>>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Time elapsed since the harness started
    pub fn now(&self) -> Duration {
        *self.now.lock()
    }

    /// Instant `by` from now (saturating)
    pub fn after(&self, by: Duration) -> Duration {
        self.now().saturating_add(by)
    }

    /// Move forward by `by`
    pub fn advance(&self, by: Duration) -> Duration {
        let mut now = self.now.lock();
        *now = now.saturating_add(by);
        *now
    }

    /// Move forward to `at`; earlier instants leave the clock untouched
    pub fn advance_to(&self, at: Duration) -> Duration {
        let mut now = self.now.lock();
        if at > *now {
            *now = at;
        }
        *now
    }
}

impl std::fmt::Debug for VirtualClock {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("VirtualClock").field(&self.now()).finish()
    }
}
