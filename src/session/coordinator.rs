//! Computer reply and clock tick scheduling.
//!
//! The reply is chosen synchronously when it is scheduled, then held back
//! until the thinking delay has passed, or for as long as the choice took
//! if that was longer. Ticks repeat at a fixed cadence measured from the
//! previous tick's due time. A tick due together with a reply runs first.

use std::time::Duration;

use tracing::{debug, warn};

use super::scheduler::Scheduler;
use crate::config::SessionSettings;
use crate::rules::{CandidateMove, Oracle};
use crate::search::{MoveSelector, SelectionStats};
use crate::types::Score;

/// A chosen reply waiting for its delay to pass
#[derive(Debug, Clone)]
pub struct PendingReply {
    pub candidate: CandidateMove,
    pub score: Score,
    /// Time the reply was requested
    pub scheduled_at: Duration,
    pub stats: SelectionStats,
}

/// Deferred work owned by a session
#[derive(Debug, Clone)]
pub enum Task {
    Reply(PendingReply),
    Tick,
}

/// Schedules the computer's replies and clock ticks for one session.
pub struct TurnCoordinator {
    scheduler: Scheduler<Task>,
    selector: MoveSelector,
    thinking_delay: Duration,
    tick_interval: Duration,
}

impl TurnCoordinator {
    pub fn new(thinking_delay: Duration, tick_interval: Duration) -> Self {
        Self {
            scheduler: Scheduler::new(),
            selector: MoveSelector::new(),
            thinking_delay,
            tick_interval,
        }
    }

    pub fn from_settings(settings: &SessionSettings) -> Self {
        Self::new(settings.thinking_delay(), settings.tick_interval())
    }

    #[inline]
    pub fn thinking_delay(&self) -> Duration {
        self.thinking_delay
    }

    #[inline]
    pub fn tick_interval(&self) -> Duration {
        self.tick_interval
    }

    /// Pick the reply for the side to move and hold it until
    /// `now + thinking_delay`. Returns false, scheduling nothing, when the
    /// side to move has no legal move.
    pub fn schedule_reply<O: Oracle>(&mut self, position: &O, now: Duration) -> bool {
        let result = self.selector.pick_move(position);
        let Some(best) = result.best else {
            warn!("no legal reply to schedule");
            return false;
        };

        let computed = Duration::from_millis(result.stats.time_ms);
        let due = now + self.thinking_delay.max(computed);
        debug!(
            mv = %best.candidate.san,
            due_ms = due.as_millis() as u64,
            nodes = result.stats.nodes,
            "reply scheduled"
        );
        self.scheduler.schedule_last(
            due,
            Task::Reply(PendingReply {
                candidate: best.candidate,
                score: best.score,
                scheduled_at: now,
                stats: result.stats,
            }),
        );
        true
    }

    /// Queue the next clock tick one interval after `from`.
    pub fn schedule_tick(&mut self, from: Duration) {
        self.scheduler.schedule(from + self.tick_interval, Task::Tick);
    }

    /// Drop every pending reply and tick.
    pub fn cancel_all(&mut self) {
        self.scheduler.invalidate();
    }

    /// Next task due at or before `now`.
    pub fn pop_due(&mut self, now: Duration) -> Option<(Duration, Task)> {
        self.scheduler.pop_due(now)
    }

    pub fn next_wakeup(&mut self) -> Option<Duration> {
        self.scheduler.next_due()
    }

    /// Is a computer reply waiting to be played?
    pub fn reply_pending(&self) -> bool {
        self.scheduler.any_live(|task| matches!(task, Task::Reply(_)))
    }

    pub fn tick_pending(&self) -> bool {
        self.scheduler.any_live(|task| matches!(task, Task::Tick))
    }
}
