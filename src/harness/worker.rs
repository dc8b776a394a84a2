//! Background worker
//!
//! Posting hands an array to background work and returns at once. The
//! reply arrives on a later cycle, after the configured latency, and is
//! written to the trace by the app side.

use std::time::Duration;

use tracing::debug;

use crate::clock::VirtualClock;
use crate::event::LogWriter;
use crate::runtime::{Cooperative, JobQueue};

/// Sum of the posted items (saturating)
pub fn sum_items(items: &[i64]) -> i64 {
    items.iter().fold(0i64, |acc, n| acc.saturating_add(*n))
}

/// Message-passing worker driven by the run loop
pub struct Worker {
    clock: VirtualClock,
    latency: Duration,
    log: LogWriter,
    inbox: JobQueue<Vec<i64>>,
    replies: u64,
}

impl Worker {
    pub fn mount(clock: VirtualClock, latency: Duration, log: LogWriter) -> Self {
        Self {
            clock,
            latency,
            log,
            inbox: JobQueue::new(),
            replies: 0,
        }
    }

    /// Hand `items` to the worker; the reply is logged later
    pub fn post(&mut self, items: Vec<i64>) {
        self.log.log("App: Sending message to worker");
        self.inbox.push(self.clock.after(self.latency), items);
    }

    /// Messages posted but not yet answered
    pub fn in_flight(&self) -> usize {
        self.inbox.len()
    }

    pub fn replies(&self) -> u64 {
        self.replies
    }
}

impl Cooperative for Worker {
    fn next_due(&self) -> Option<Duration> {
        self.inbox.peek_due()
    }

    fn run_next(&mut self) -> bool {
        let Some((due, items)) = self.inbox.pop() else {
            return false;
        };
        self.clock.advance_to(due);

        debug!(?items, "worker received message from main script");
        let reply = format!("Webworker: sum of all array items is {}", sum_items(&items));
        debug!("worker posting message back to main script");

        self.log.log("App: Message received from worker");
        self.log.log(reply);
        self.replies += 1;
        true
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("latency", &self.latency)
            .field("in_flight", &self.inbox.len())
            .field("replies", &self.replies)
            .finish()
    }
}
