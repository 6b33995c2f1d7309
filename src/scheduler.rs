//! Repeating timers driven by an explicit clock.
//!
//! The queue never runs callbacks itself. The runtime (or a test) asks for the next due
//! firing with [`TimerQueue::pop_due`] and dispatches it, so a timer cancelled while an
//! earlier firing is being handled is never delivered again.

use std::collections::BTreeMap;

use crate::model::Timestamp;

/// Identifies one scheduled repeating timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerHandle(u64);

/// Scheduling surface the session components depend on.
pub trait Scheduler {
    /// Register a timer firing every `period_ms`, first at `now + period_ms`.
    fn schedule_repeating(&mut self, period_ms: u64, now: Timestamp) -> TimerHandle;

    /// Cancel a timer. Returns false if it was not scheduled.
    fn cancel(&mut self, handle: TimerHandle) -> bool;

    fn is_scheduled(&self, handle: TimerHandle) -> bool;
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    period_ms: u64,
    next_at: Timestamp,
}

#[derive(Debug, Default)]
pub struct TimerQueue {
    timers: BTreeMap<TimerHandle, Timer>,
    next_id: u64,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Earliest pending deadline across all timers.
    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.timers.values().map(|t| t.next_at).min()
    }

    /// Take the earliest firing due at or before `now` and reschedule its timer.
    ///
    /// Each call yields at most one firing, so a timer that fell several periods behind
    /// is returned once per missed period.
    pub fn pop_due(&mut self, now: Timestamp) -> Option<(TimerHandle, Timestamp)> {
        let (handle, timer) = self
            .timers
            .iter_mut()
            .filter(|(_, t)| t.next_at <= now)
            .min_by_key(|(handle, t)| (t.next_at, **handle))?;
        let fired_at = timer.next_at;
        timer.next_at = timer.next_at.saturating_add(timer.period_ms);
        Some((*handle, fired_at))
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}

impl Scheduler for TimerQueue {
    fn schedule_repeating(&mut self, period_ms: u64, now: Timestamp) -> TimerHandle {
        let period_ms = period_ms.max(1);
        let handle = TimerHandle(self.next_id);
        self.next_id += 1;
        self.timers.insert(
            handle,
            Timer {
                period_ms,
                next_at: now.saturating_add(period_ms),
            },
        );
        handle
    }

    fn cancel(&mut self, handle: TimerHandle) -> bool {
        self.timers.remove(&handle).is_some()
    }

    fn is_scheduled(&self, handle: TimerHandle) -> bool {
        self.timers.contains_key(&handle)
    }
}
