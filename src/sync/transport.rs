//! Transport seam between the sync channel and the network.

use std::sync::Arc;

use crate::error::TransportError;

/// Asynchronous outcome of a transport operation, delivered back into the core's
/// event loop.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    Opened,
    Message(String),
    Closed,
    Failed(String),
}

/// Callback a transport uses to report [`TransportEvent`]s.
pub type TransportNotifier = Arc<dyn Fn(TransportEvent) + Send + Sync>;

pub trait Transport {
    /// Start opening a connection. Completion arrives later as `Opened` or `Failed`.
    fn open(&mut self) -> Result<(), TransportError>;

    /// Queue one text frame on the open connection.
    fn send_text(&mut self, text: String) -> Result<(), TransportError>;

    /// Drop the connection, open or pending. Idempotent.
    fn close(&mut self);
}
