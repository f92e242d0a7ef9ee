//! Pending script situations
//!
//! Hosts that implement delayed actions park the taken continuation here
//! and run it once its delay has elapsed. The scheduler is shared between
//! the action host (which schedules while a script runs) and the driver
//! loop (which advances time and resumes).

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::bridge::continuation::SavedState;
use crate::bridge::value::ObjectId;

/// A continuation waiting to run.
#[derive(Debug)]
pub struct PendingSituation {
    /// Game time at which it becomes due, in seconds.
    pub due: f64,
    pub actor: ObjectId,
    pub state: SavedState,
    seq: u64,
}

#[derive(Debug, Default)]
struct SchedulerInner {
    pending: Vec<PendingSituation>,
    clock: f64,
    next_seq: u64,
}

/// Thread-safe queue of pending situations ordered by due time, then by
/// scheduling order.
#[derive(Debug, Clone, Default)]
pub struct SituationScheduler {
    inner: Arc<Mutex<SchedulerInner>>,
}

impl SituationScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current game time.
    pub fn now(&self) -> f64 {
        self.inner.lock().clock
    }

    pub fn len(&self) -> usize {
        self.inner.lock().pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run `state` on behalf of `actor` after `delay` seconds.
    pub fn schedule(
        &self,
        delay: f32,
        actor: ObjectId,
        state: SavedState,
    ) {
        let mut inner = self.inner.lock();
        let due = inner.clock + f64::from(delay.max(0.0));
        let seq = inner.next_seq;
        inner.next_seq += 1;
        debug!(
            "schedule situation {} for {} at {:.2}",
            state.situation(),
            actor,
            due
        );
        inner.pending.push(PendingSituation {
            due,
            actor,
            state,
            seq,
        });
    }

    /// Move the clock forward and take everything that became due.
    pub fn advance(
        &self,
        elapsed: f64,
    ) -> Vec<PendingSituation> {
        let mut inner = self.inner.lock();
        inner.clock += elapsed.max(0.0);
        let clock = inner.clock;
        let (due, waiting): (Vec<_>, Vec<_>) =
            inner.pending.drain(..).partition(|p| p.due <= clock);
        inner.pending = waiting;
        sorted(due)
    }

    /// Take everything regardless of due time, advancing the clock to the
    /// latest due time.
    pub fn drain_all(&self) -> Vec<PendingSituation> {
        let mut inner = self.inner.lock();
        let all: Vec<_> = inner.pending.drain(..).collect();
        if let Some(last) = all.iter().map(|p| p.due).reduce(f64::max) {
            inner.clock = inner.clock.max(last);
        }
        sorted(all)
    }
}

fn sorted(mut pending: Vec<PendingSituation>) -> Vec<PendingSituation> {
    pending.sort_by(|a, b| a.due.total_cmp(&b.due).then(a.seq.cmp(&b.seq)));
    pending
}
