//! Wiring between host events, transport events, timers and the session components.
//!
//! The orchestrator owns every component and collaborator, so all transitions happen
//! on one `&mut self` and run to completion before the next event is handled.

use tracing::debug;

use crate::clock::SharedClock;
use crate::history::HistoryStore;
use crate::model::Timestamp;
use crate::scheduler::{TimerHandle, TimerQueue};
use crate::session::{HostEvent, HostProbe, SessionContext, SessionSettings, SessionTracker};
use crate::sync::{SyncChannel, TransportEvent};

pub struct Orchestrator {
    clock: SharedClock,
    scheduler: TimerQueue,
    probe: Box<dyn HostProbe>,
    history: HistoryStore,
    channel: SyncChannel,
    tracker: SessionTracker,
}

impl Orchestrator {
    pub fn new(
        settings: SessionSettings,
        clock: SharedClock,
        probe: Box<dyn HostProbe>,
        history: HistoryStore,
        channel: SyncChannel,
    ) -> Self {
        Self {
            clock,
            scheduler: TimerQueue::new(),
            probe,
            history,
            channel,
            tracker: SessionTracker::new(settings),
        }
    }

    /// First connection attempt, once the host is attached.
    pub fn startup(&mut self) {
        self.channel.connect();
    }

    pub fn on_host_event(&mut self, event: HostEvent) {
        debug!(event = event.as_str(), "host event");
        match event {
            HostEvent::Play => {
                // Tracking never waits on connectivity.
                self.with_session(|tracker, ctx| tracker.start(ctx));
                self.channel.connect();
            }
            HostEvent::Reset => {
                // Reset also exists on the title screen, where nothing is open.
                self.with_session(|tracker, ctx| tracker.end(ctx, false));
                self.channel.connect();
            }
            HostEvent::Finish => {
                self.with_session(|tracker, ctx| tracker.end(ctx, true));
            }
        }
    }

    pub fn on_transport(&mut self, event: TransportEvent) {
        self.channel.handle_event(event, &self.history);
    }

    pub fn on_timer(&mut self, handle: TimerHandle) {
        if self.tracker.owns_timer(handle) {
            self.with_session(|tracker, ctx| tracker.tick(ctx));
        } else {
            debug!(?handle, "stale timer firing dropped");
        }
    }

    /// Take the next timer firing due at `now`, if any, without dispatching it.
    pub fn pop_due_timer(&mut self, now: Timestamp) -> Option<(TimerHandle, Timestamp)> {
        self.scheduler.pop_due(now)
    }

    /// Dispatch every firing due at `now`, in deadline order. Returns how many fired.
    pub fn fire_due_timers(&mut self, now: Timestamp) -> usize {
        let mut fired = 0;
        while let Some((handle, _)) = self.scheduler.pop_due(now) {
            self.on_timer(handle);
            fired += 1;
        }
        fired
    }

    pub fn next_deadline(&self) -> Option<Timestamp> {
        self.scheduler.next_deadline()
    }

    pub fn tracker(&self) -> &SessionTracker {
        &self.tracker
    }

    pub fn channel(&self) -> &SyncChannel {
        &self.channel
    }

    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    pub fn clock(&self) -> &SharedClock {
        &self.clock
    }

    fn with_session<R>(
        &mut self,
        f: impl FnOnce(&mut SessionTracker, &mut SessionContext<'_>) -> R,
    ) -> R {
        let mut ctx = SessionContext {
            clock: self.clock.as_ref(),
            scheduler: &mut self.scheduler,
            probe: self.probe.as_ref(),
            sink: &mut self.channel,
            history: &self.history,
        };
        f(&mut self.tracker, &mut ctx)
    }
}
