//! Telemetry sync to the collector: envelope schema, connection state machine, transports.

pub mod channel;
pub mod envelope;
pub mod transport;
pub mod websocket;

pub use channel::{ChannelState, SyncChannel, TelemetrySink};
pub use envelope::{Envelope, Message, MessageKind};
pub use transport::{Transport, TransportEvent, TransportNotifier};
pub use websocket::WebSocketTransport;
