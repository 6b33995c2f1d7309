//! Single-threaded event loop driving the orchestrator.
//!
//! Host adapters and the transport thread only ever post [`RuntimeEvent`]s. The loop
//! handles one event at a time and fires due timers between events, so no two
//! transitions ever overlap.

use std::path::Path;
use std::sync::mpsc::{channel, Receiver, RecvTimeoutError, Sender};
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use crate::clock::{SharedClock, SystemClock};
use crate::config::{ConfigLoader, ScorewireConfig};
use crate::error::ApiError;
use crate::history::HistoryStore;
use crate::orchestrator::Orchestrator;
use crate::session::{HostEvent, HostProbe};
use crate::sync::{SyncChannel, TransportEvent, TransportNotifier, WebSocketTransport};

/// Longest the loop sleeps when no timer is pending.
pub const IDLE_WAIT: Duration = Duration::from_millis(500);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeEvent {
    Host(HostEvent),
    Transport(TransportEvent),
    Shutdown,
}

/// Cloneable sender into the runtime's queue.
#[derive(Clone)]
pub struct RuntimeHandle {
    sender: Sender<RuntimeEvent>,
}

impl RuntimeHandle {
    pub fn host_event(&self, event: HostEvent) -> Result<(), ApiError> {
        self.post(RuntimeEvent::Host(event))
    }

    pub fn shutdown(&self) -> Result<(), ApiError> {
        self.post(RuntimeEvent::Shutdown)
    }

    /// Notifier for transports, forwarding their events into this queue.
    pub fn transport_notifier(&self) -> TransportNotifier {
        let sender = self.sender.clone();
        Arc::new(move |event| {
            // The runtime has exited if this fails; nothing is left to notify.
            let _ = sender.send(RuntimeEvent::Transport(event));
        })
    }

    fn post(&self, event: RuntimeEvent) -> Result<(), ApiError> {
        self.sender
            .send(event)
            .map_err(|e| ApiError::RuntimeStopped(e.to_string()))
    }
}

/// Create the runtime queue.
pub fn event_queue() -> (RuntimeHandle, Receiver<RuntimeEvent>) {
    let (sender, receiver) = channel();
    (RuntimeHandle { sender }, receiver)
}

pub struct Runtime {
    orchestrator: Orchestrator,
    handle: RuntimeHandle,
    events: Receiver<RuntimeEvent>,
}

impl Runtime {
    pub fn new(
        orchestrator: Orchestrator,
        handle: RuntimeHandle,
        events: Receiver<RuntimeEvent>,
    ) -> Self {
        Self {
            orchestrator,
            handle,
            events,
        }
    }

    /// Assemble the full stack from configuration: sled history, WebSocket channel,
    /// system clock.
    pub fn from_config(
        config: &ScorewireConfig,
        probe: Box<dyn HostProbe>,
    ) -> Result<Self, ApiError> {
        config.clone().validated()?;
        let clock: SharedClock = Arc::new(SystemClock);
        let (handle, events) = event_queue();

        let history = HistoryStore::open(&config.storage.path, &config.storage.slot, clock.clone())?;
        let transport =
            WebSocketTransport::new(config.collector.endpoint.clone(), handle.transport_notifier());
        let channel = SyncChannel::new(Box::new(transport), config.client_info());
        let orchestrator = Orchestrator::new(
            config.session_settings(),
            clock,
            probe,
            history,
            channel,
        );
        Ok(Self::new(orchestrator, handle, events))
    }

    /// Load configuration for `workspace_root` and assemble the stack.
    pub fn load(workspace_root: &Path, probe: Box<dyn HostProbe>) -> Result<Self, ApiError> {
        let config = ConfigLoader::load(workspace_root)?;
        Self::from_config(&config, probe)
    }

    pub fn handle(&self) -> RuntimeHandle {
        self.handle.clone()
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    /// Connect once, then process events until `Shutdown`.
    pub fn run(&mut self) {
        info!("runtime started");
        self.orchestrator.startup();
        while self.step() {}
        info!("runtime stopped");
    }

    /// Fire due timers, then wait for and handle at most one event.
    /// Returns false once a shutdown was received.
    pub fn step(&mut self) -> bool {
        let now = self.orchestrator.clock().now_millis();
        self.orchestrator.fire_due_timers(now);

        let wait = match self.orchestrator.next_deadline() {
            Some(deadline) => Duration::from_millis(deadline.saturating_sub(now)),
            None => IDLE_WAIT,
        };
        match self.events.recv_timeout(wait) {
            Ok(RuntimeEvent::Shutdown) => false,
            Ok(event) => {
                self.dispatch(event);
                true
            }
            Err(RecvTimeoutError::Timeout) => true,
            // Unreachable while `self.handle` holds a sender.
            Err(RecvTimeoutError::Disconnected) => false,
        }
    }

    fn dispatch(&mut self, event: RuntimeEvent) {
        match event {
            RuntimeEvent::Host(event) => self.orchestrator.on_host_event(event),
            RuntimeEvent::Transport(event) => self.orchestrator.on_transport(event),
            RuntimeEvent::Shutdown => debug!("shutdown dispatched"),
        }
    }
}
