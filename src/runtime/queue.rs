//! Due-time ordered job queue
//!
//! Jobs pop in (due, submission sequence) order, so two jobs due at the
//! same instant run in the order they were queued.

use std::cmp::{Ordering, Reverse};
use std::collections::BinaryHeap;
use std::time::Duration;

struct Slot<J> {
    due: Duration,
    seq: u64,
    job: J,
}

impl<J> PartialEq for Slot<J> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<J> Eq for Slot<J> {}

impl<J> PartialOrd for Slot<J> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<J> Ord for Slot<J> {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.due, self.seq).cmp(&(other.due, other.seq))
    }
}

/// Min-queue of jobs keyed by due time
pub struct JobQueue<J> {
    heap: BinaryHeap<Reverse<Slot<J>>>,
    next_seq: u64,
}

impl<J> JobQueue<J> {
    pub fn new() -> Self {
        Self {
            heap: BinaryHeap::new(),
            next_seq: 0,
        }
    }

    pub fn push(&mut self, due: Duration, job: J) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.heap.push(Reverse(Slot { due, seq, job }));
    }

    /// Due time of the earliest job
    pub fn peek_due(&self) -> Option<Duration> {
        self.heap.peek().map(|Reverse(slot)| slot.due)
    }

    pub fn pop(&mut self) -> Option<(Duration, J)> {
        self.heap.pop().map(|Reverse(slot)| (slot.due, slot.job))
    }

    pub fn len(&self) -> usize {
        self.heap.len()
    }

    pub fn is_empty(&self) -> bool {
        self.heap.is_empty()
    }
}

impl<J> Default for JobQueue<J> {
    fn default() -> Self {
        Self::new()
    }
}
