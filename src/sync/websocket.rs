//! WebSocket transport to the local collector.
//!
//! Each connection runs on its own I/O thread which owns the socket. Frames to send are
//! handed over through a channel, and everything the socket does is reported back
//! through the [`TransportNotifier`]. The thread never touches session state.

use std::net::TcpStream;
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::thread;
use std::time::Duration;

use anyhow::{anyhow, Context, Result};
use tracing::debug;
use tungstenite::http::Uri;
use tungstenite::{Message as Frame, WebSocket};

use crate::error::TransportError;
use crate::sync::transport::{Transport, TransportEvent, TransportNotifier};

/// How long a socket read waits before the thread checks for outbound frames.
pub const POLL_INTERVAL: Duration = Duration::from_millis(20);

enum Outbound {
    Text(String),
    Close,
}

pub struct WebSocketTransport {
    endpoint: String,
    notify: TransportNotifier,
    outbound: Option<Sender<Outbound>>,
}

impl WebSocketTransport {
    pub fn new(endpoint: impl Into<String>, notify: TransportNotifier) -> Self {
        Self {
            endpoint: endpoint.into(),
            notify,
            outbound: None,
        }
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl Transport for WebSocketTransport {
    fn open(&mut self) -> Result<(), TransportError> {
        self.close();
        let target = parse_endpoint(&self.endpoint)?;
        let (tx, rx) = channel();
        let endpoint = self.endpoint.clone();
        let notify = self.notify.clone();
        thread::Builder::new()
            .name("scorewire-collector".to_string())
            .spawn(move || run_connection(&endpoint, target, rx, notify))
            .map_err(|e| TransportError::ConnectFailed(e.to_string()))?;
        self.outbound = Some(tx);
        Ok(())
    }

    fn send_text(&mut self, text: String) -> Result<(), TransportError> {
        let outbound = self.outbound.as_ref().ok_or(TransportError::NotOpen)?;
        outbound
            .send(Outbound::Text(text))
            .map_err(|_| TransportError::SendFailed("collector connection thread gone".to_string()))
    }

    fn close(&mut self) {
        if let Some(outbound) = self.outbound.take() {
            let _ = outbound.send(Outbound::Close);
        }
    }
}

impl Drop for WebSocketTransport {
    fn drop(&mut self) {
        self.close();
    }
}

/// Split a `ws://host:port/path` endpoint into the TCP address to dial.
pub fn parse_endpoint(endpoint: &str) -> Result<(String, u16), TransportError> {
    let uri: Uri = endpoint
        .parse()
        .map_err(|_| TransportError::InvalidEndpoint(endpoint.to_string()))?;
    if uri.scheme_str() != Some("ws") {
        return Err(TransportError::InvalidEndpoint(format!(
            "{endpoint} (only ws:// is supported)"
        )));
    }
    let host = uri
        .host()
        .filter(|h| !h.is_empty())
        .ok_or_else(|| TransportError::InvalidEndpoint(endpoint.to_string()))?;
    Ok((host.to_string(), uri.port_u16().unwrap_or(80)))
}

fn run_connection(
    endpoint: &str,
    target: (String, u16),
    outbound: Receiver<Outbound>,
    notify: TransportNotifier,
) {
    let mut socket = match connect(endpoint, &target) {
        Ok(socket) => socket,
        Err(err) => {
            debug!(endpoint = %endpoint, error = %format!("{err:#}"), "collector unreachable");
            notify(TransportEvent::Failed(format!("{err:#}")));
            return;
        }
    };
    notify(TransportEvent::Opened);
    if let Err(err) = pump(&mut socket, &outbound, &notify) {
        debug!(endpoint = %endpoint, error = %format!("{err:#}"), "collector connection ended");
    }
    notify(TransportEvent::Closed);
}

fn connect(endpoint: &str, target: &(String, u16)) -> Result<WebSocket<TcpStream>> {
    let stream = TcpStream::connect((target.0.as_str(), target.1))
        .with_context(|| format!("Failed to reach collector at {}:{}", target.0, target.1))?;
    let (socket, _response) = tungstenite::client(endpoint, stream)
        .map_err(|e| anyhow!("WebSocket handshake failed: {e}"))?;
    socket
        .get_ref()
        .set_read_timeout(Some(POLL_INTERVAL))
        .context("Failed to set read timeout")?;
    Ok(socket)
}

fn pump(
    socket: &mut WebSocket<TcpStream>,
    outbound: &Receiver<Outbound>,
    notify: &TransportNotifier,
) -> Result<()> {
    loop {
        loop {
            match outbound.try_recv() {
                Ok(Outbound::Text(text)) => {
                    socket.send(Frame::text(text)).context("Failed to write frame")?;
                }
                Ok(Outbound::Close) | Err(TryRecvError::Disconnected) => {
                    let _ = socket.close(None);
                    let _ = socket.flush();
                    return Ok(());
                }
                Err(TryRecvError::Empty) => break,
            }
        }

        match socket.read() {
            Ok(Frame::Text(text)) => notify(TransportEvent::Message(text.to_string())),
            Ok(Frame::Close(_)) => return Ok(()),
            Ok(_) => {}
            Err(tungstenite::Error::Io(err)) if is_timeout(&err) => {}
            Err(tungstenite::Error::ConnectionClosed) => return Ok(()),
            Err(err) => return Err(err).context("Failed to read frame"),
        }
    }
}

fn is_timeout(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut
    )
}
