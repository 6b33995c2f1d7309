//! Periodic progress sampling while a session is active.

use tracing::debug;

use crate::model::Timestamp;
use crate::scheduler::{Scheduler, TimerHandle};

pub const DEFAULT_SAMPLE_PERIOD_MS: u64 = 100;

/// Owns the repeating timer whose firings become tracker ticks.
#[derive(Debug, Default)]
pub struct ProgressSampler {
    timer: Option<TimerHandle>,
}

impl ProgressSampler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start firing every `period_ms`. No-op while already running.
    pub fn start(&mut self, period_ms: u64, scheduler: &mut dyn Scheduler, now: Timestamp) {
        if self.timer.is_some() {
            return;
        }
        let handle = scheduler.schedule_repeating(period_ms, now);
        debug!(period_ms, ?handle, "sampler started");
        self.timer = Some(handle);
    }

    /// Cancel the timer. Firings not yet delivered are discarded. Idempotent.
    pub fn stop(&mut self, scheduler: &mut dyn Scheduler) {
        if let Some(handle) = self.timer.take() {
            scheduler.cancel(handle);
            debug!(?handle, "sampler stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    /// Whether a timer firing belongs to this sampler.
    pub fn owns(&self, handle: TimerHandle) -> bool {
        self.timer == Some(handle)
    }
}
