//! Single logical connection to the collector.
//!
//! Delivery is at-most-once: messages are written only while `Connected` and dropped
//! otherwise. Reconnection is never scheduled here; callers decide when to `connect`.

use tracing::{debug, info, warn};

use crate::error::TransportError;
use crate::history::HistoryStore;
use crate::model::ClientInfo;
use crate::sync::envelope::{Envelope, Message};
use crate::sync::transport::{Transport, TransportEvent};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelState {
    Disconnected,
    Connecting,
    Connected,
}

impl ChannelState {
    pub fn as_str(self) -> &'static str {
        match self {
            ChannelState::Disconnected => "disconnected",
            ChannelState::Connecting => "connecting",
            ChannelState::Connected => "connected",
        }
    }
}

/// Destination for session telemetry.
pub trait TelemetrySink {
    fn send(&mut self, message: Message);
}

pub struct SyncChannel {
    transport: Box<dyn Transport>,
    state: ChannelState,
    client: ClientInfo,
}

impl SyncChannel {
    pub fn new(transport: Box<dyn Transport>, client: ClientInfo) -> Self {
        Self {
            transport,
            state: ChannelState::Disconnected,
            client,
        }
    }

    pub fn state(&self) -> ChannelState {
        self.state
    }

    pub fn is_connected(&self) -> bool {
        self.state == ChannelState::Connected
    }

    /// Begin a connection attempt unless one is open or in flight.
    pub fn connect(&mut self) {
        if self.state != ChannelState::Disconnected {
            debug!(state = self.state.as_str(), "connect skipped");
            return;
        }
        self.state = ChannelState::Connecting;
        if let Err(err) = self.transport.open() {
            warn!(error = %err, "collector connect failed, will retry on next play or reset");
            self.transport.close();
            self.state = ChannelState::Disconnected;
        }
    }

    /// Apply a transport event. On open, greets the collector with client info then the
    /// full local history.
    pub fn handle_event(&mut self, event: TransportEvent, history: &HistoryStore) {
        match event {
            TransportEvent::Opened => {
                if self.state != ChannelState::Connecting {
                    debug!(state = self.state.as_str(), "stray open ignored");
                    return;
                }
                info!("connected to collector");
                self.state = ChannelState::Connected;
                self.send(Message::ClientInfo(self.client.clone()));
                self.send(Message::History(history.load()));
            }
            TransportEvent::Message(text) => {
                debug!(message = %text, "collector message discarded");
            }
            TransportEvent::Closed => {
                if self.state == ChannelState::Connected {
                    info!("disconnected from collector");
                    self.state = ChannelState::Disconnected;
                }
            }
            TransportEvent::Failed(reason) => {
                if self.state == ChannelState::Connecting {
                    warn!(reason = %reason, "collector connect failed, will retry on next play or reset");
                } else {
                    warn!(reason = %reason, "collector connection failed");
                }
                self.transport.close();
                self.state = ChannelState::Disconnected;
            }
        }
    }

    fn write(&mut self, message: &Message) -> Result<(), TransportError> {
        let text = Envelope::from_message(message)
            .and_then(|env| env.encode())
            .map_err(|e| TransportError::SendFailed(e.to_string()))?;
        self.transport.send_text(text)
    }
}

impl TelemetrySink for SyncChannel {
    fn send(&mut self, message: Message) {
        if self.state != ChannelState::Connected {
            return;
        }
        if let Err(err) = self.write(&message) {
            warn!(kind = message.kind().as_str(), error = %err, "collector send failed");
            self.transport.close();
            self.state = ChannelState::Disconnected;
        }
    }
}
