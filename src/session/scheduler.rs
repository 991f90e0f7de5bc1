//! Deferred task queue with epoch cancellation.
//!
//! Tasks are ordered by due time, then by insertion order, except that a
//! task queued with [`Scheduler::schedule_last`] runs after every plain task
//! due at the same instant. Every task
//! remembers the epoch it was scheduled in; [`Scheduler::invalidate`] moves
//! to a new epoch, and tasks from older epochs are dropped when they reach
//! the front of the queue instead of being handed out.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::Duration;

use tracing::trace;

struct Entry<T> {
    due: Duration,
    last: bool,
    seq: u64,
    epoch: u64,
    task: T,
}

impl<T> PartialEq for Entry<T> {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.seq == other.seq
    }
}

impl<T> Eq for Entry<T> {}

impl<T> PartialOrd for Entry<T> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for Entry<T> {
    // Reversed: BinaryHeap is a max-heap, the earliest task must come first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .due
            .cmp(&self.due)
            .then_with(|| other.last.cmp(&self.last))
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

/// Min-queue of deferred tasks.
pub struct Scheduler<T> {
    queue: BinaryHeap<Entry<T>>,
    epoch: u64,
    next_seq: u64,
}

impl<T> Default for Scheduler<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Scheduler<T> {
    pub fn new() -> Self {
        Self {
            queue: BinaryHeap::new(),
            epoch: 0,
            next_seq: 0,
        }
    }

    /// Queue `task` to run at `due` in the current epoch.
    pub fn schedule(&mut self, due: Duration, task: T) {
        self.push(due, false, task);
    }

    /// Queue `task` behind every plain task due at the same instant,
    /// including ones queued later.
    pub fn schedule_last(&mut self, due: Duration, task: T) {
        self.push(due, true, task);
    }

    fn push(&mut self, due: Duration, last: bool, task: T) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.queue.push(Entry {
            due,
            last,
            seq,
            epoch: self.epoch,
            task,
        });
    }

    /// Start a new epoch. Everything queued so far will never be returned.
    pub fn invalidate(&mut self) {
        self.epoch += 1;
        trace!(epoch = self.epoch, "scheduler invalidated");
    }

    fn drop_stale_front(&mut self) {
        while let Some(front) = self.queue.peek() {
            if front.epoch == self.epoch {
                break;
            }
            trace!(epoch = front.epoch, seq = front.seq, "discarding stale task");
            self.queue.pop();
        }
    }

    /// Pop the earliest live task due at or before `now`, with its due time.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, T)> {
        self.drop_stale_front();
        if self.queue.peek()?.due > now {
            return None;
        }
        self.queue.pop().map(|entry| (entry.due, entry.task))
    }

    /// Due time of the earliest live task.
    pub fn next_due(&mut self) -> Option<Duration> {
        self.drop_stale_front();
        self.queue.peek().map(|entry| entry.due)
    }

    /// Does any live task satisfy `pred`?
    pub fn any_live(&self, mut pred: impl FnMut(&T) -> bool) -> bool {
        self.queue
            .iter()
            .any(|entry| entry.epoch == self.epoch && pred(&entry.task))
    }

    /// Number of live tasks
    pub fn len(&self) -> usize {
        self.queue.iter().filter(|e| e.epoch == self.epoch).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    #[test]
    fn test_pops_in_due_order_then_insertion_order() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(secs(2), "late");
        scheduler.schedule(secs(1), "first");
        scheduler.schedule(secs(1), "second");

        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(1), "first")));
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(1), "second")));
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(2), "late")));
        assert_eq!(scheduler.pop_due(secs(5)), None);
    }

    #[test]
    fn test_last_task_yields_to_later_peers() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule_last(secs(2), "reply");
        scheduler.schedule(secs(1), "tick 1");
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(1), "tick 1")));
        scheduler.schedule(secs(2), "tick 2");
        scheduler.schedule(secs(3), "tick 3");

        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(2), "tick 2")));
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(2), "reply")));
        assert_eq!(scheduler.pop_due(secs(5)), Some((secs(3), "tick 3")));
    }

    #[test]
    fn test_nothing_fires_early() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(Duration::from_millis(2000), ());
        assert!(scheduler.pop_due(Duration::from_millis(1999)).is_none());
        assert_eq!(scheduler.next_due(), Some(Duration::from_millis(2000)));
        assert!(scheduler.pop_due(Duration::from_millis(2000)).is_some());
    }

    #[test]
    fn test_invalidate_discards_queued_tasks() {
        let mut scheduler = Scheduler::new();
        scheduler.schedule(secs(1), 1);
        scheduler.schedule(secs(3), 2);
        scheduler.invalidate();
        scheduler.schedule(secs(2), 3);

        assert_eq!(scheduler.len(), 1);
        assert!(scheduler.any_live(|t| *t == 3));
        assert!(!scheduler.any_live(|t| *t == 1));
        assert_eq!(scheduler.next_due(), Some(secs(2)));
        assert_eq!(scheduler.pop_due(secs(10)), Some((secs(2), 3)));
        assert_eq!(scheduler.pop_due(secs(10)), None);
        assert!(scheduler.is_empty());
    }
}
