//! Session lifecycle state machine.
//!
//! `Idle --start--> Active --end--> Idle`, reused for every session in the process.
//! While active, each sampler firing becomes a [`SessionTracker::tick`] that refreshes
//! progress and checks the two termination predicates in a fixed order: time expired,
//! then perfect score. Both finish the attempt; only a host reset abandons it.

use tracing::{debug, info, warn};

use crate::clock::Clock;
use crate::history::HistoryStore;
use crate::model::{Attempt, Progress};
use crate::scheduler::{Scheduler, TimerHandle};
use crate::session::host::HostProbe;
use crate::session::sampler::{ProgressSampler, DEFAULT_SAMPLE_PERIOD_MS};
use crate::sync::{Message, TelemetrySink};

pub const DEFAULT_SESSION_LENGTH_SECS: f64 = 120.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionSettings {
    /// Countdown length reported in the first progress snapshot.
    pub session_length_secs: f64,
    pub sample_period_ms: u64,
    /// Clamp probe scores into `[0, total_cells]` before use.
    pub clamp_score: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            session_length_secs: DEFAULT_SESSION_LENGTH_SECS,
            sample_period_ms: DEFAULT_SAMPLE_PERIOD_MS,
            clamp_score: false,
        }
    }
}

/// Collaborators a transition needs, borrowed from the owner for its duration.
pub struct SessionContext<'a> {
    pub clock: &'a dyn Clock,
    pub scheduler: &'a mut dyn Scheduler,
    pub probe: &'a dyn HostProbe,
    pub sink: &'a mut dyn TelemetrySink,
    pub history: &'a HistoryStore,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Idle,
    Active { attempt: Attempt, progress: Progress },
}

pub struct SessionTracker {
    settings: SessionSettings,
    sampler: ProgressSampler,
    state: SessionState,
}

impl SessionTracker {
    pub fn new(settings: SessionSettings) -> Self {
        Self {
            settings,
            sampler: ProgressSampler::new(),
            state: SessionState::Idle,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active { .. })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Whether a timer firing is this tracker's sampler.
    pub fn owns_timer(&self, handle: TimerHandle) -> bool {
        self.sampler.owns(handle)
    }

    /// Open a new attempt. An attempt still open is abandoned first so that only one
    /// is ever open.
    pub fn start(&mut self, ctx: &mut SessionContext<'_>) {
        if self.is_active() {
            debug!("play while active, abandoning open attempt");
            self.end(ctx, false);
        }

        let now = ctx.clock.now_millis();
        let attempt = Attempt::open(now);
        let progress = Progress::sample(0, self.settings.session_length_secs);

        self.sampler
            .start(self.settings.sample_period_ms, &mut *ctx.scheduler, now);
        self.state = SessionState::Active { attempt, progress };
        info!(started = now, "attempt started");

        ctx.sink.send(Message::AttemptStart);
        ctx.sink.send(Message::Progress(progress));
    }

    /// Close the open attempt and record it. Returns false (and does nothing) when idle.
    pub fn end(&mut self, ctx: &mut SessionContext<'_>, finished: bool) -> bool {
        let SessionState::Active { mut attempt, .. } =
            std::mem::replace(&mut self.state, SessionState::Idle)
        else {
            debug!(finished, "end while idle ignored");
            return false;
        };

        let score = self.read_score(ctx.probe);
        let perfect = score == ctx.probe.total_cells();
        attempt.close(ctx.clock.now_millis(), score, finished, perfect);
        info!(
            score = attempt.score,
            finished = attempt.finished,
            perfect = attempt.perfect,
            duration = attempt.duration,
            "attempt ended"
        );

        ctx.sink.send(Message::AttemptEnd(attempt.clone()));
        if let Err(err) = ctx.history.append(attempt) {
            warn!(error = %err, "failed to persist attempt");
        }
        self.sampler.stop(&mut *ctx.scheduler);
        true
    }

    /// One sampler period: refresh progress, publish it, then check for termination.
    pub fn tick(&mut self, ctx: &mut SessionContext<'_>) {
        if !self.is_active() {
            return;
        }
        let snapshot = Progress::sample(
            self.read_score(ctx.probe),
            ctx.probe.read_remaining_time(),
        );
        if let SessionState::Active { progress, .. } = &mut self.state {
            *progress = snapshot;
        }
        ctx.sink.send(Message::Progress(snapshot));

        if snapshot.time_remaining <= 0.0 {
            self.end(ctx, true);
        }
        if snapshot.score == ctx.probe.total_cells() {
            self.end(ctx, true);
        }
    }

    fn read_score(&self, probe: &dyn HostProbe) -> i64 {
        let score = probe.read_score();
        if self.settings.clamp_score {
            score.clamp(0, probe.total_cells().max(0))
        } else {
            score
        }
    }
}
