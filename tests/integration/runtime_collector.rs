//! End-to-end test of the runtime against a live WebSocket collector
//!
//! Runs the full stack assembled from configuration: sled history, WebSocket transport,
//! system clock and the event loop, with host events posted from the collector thread.

use scorewire::config::ScorewireConfig;
use scorewire::runtime::{Runtime, RuntimeHandle};
use scorewire::session::{HostEvent, HostProbe};
use scorewire::sync::Envelope;
use std::net::{TcpListener, TcpStream};
use std::thread;
use tempfile::TempDir;
use tungstenite::WebSocket;

struct NearlyDoneProbe;

impl HostProbe for NearlyDoneProbe {
    fn read_score(&self) -> i64 {
        49
    }

    fn read_remaining_time(&self) -> f64 {
        30.0
    }

    fn total_cells(&self) -> i64 {
        50
    }
}

fn next_envelope(ws: &mut WebSocket<TcpStream>) -> Envelope {
    loop {
        let frame = ws.read().unwrap();
        if frame.is_text() {
            return Envelope::decode(&frame.into_text().unwrap()).unwrap();
        }
    }
}

/// Collector side: checks the greeting, plays one attempt, then stops the runtime.
fn collect(listener: TcpListener, handle: RuntimeHandle) -> Vec<String> {
    let (stream, _) = listener.accept().unwrap();
    let mut ws = tungstenite::accept(stream).unwrap();
    let mut seen = Vec::new();

    for _ in 0..2 {
        seen.push(next_envelope(&mut ws).msg);
    }
    handle.host_event(HostEvent::Play).unwrap();
    loop {
        let envelope = next_envelope(&mut ws);
        let msg = envelope.msg.clone();
        if msg == "progress" && seen.iter().filter(|m| *m == "progress").count() == 2 {
            handle.host_event(HostEvent::Finish).unwrap();
        }
        seen.push(msg);
        if envelope.msg == "attemptEnd" {
            assert_eq!(envelope.data["score"], 49);
            assert_eq!(envelope.data["finished"], true);
            assert_eq!(envelope.data["perfect"], false);
            break;
        }
    }
    handle.shutdown().unwrap();
    seen
}

#[test]
fn test_runtime_streams_session_to_collector() {
    let temp_dir = TempDir::new().unwrap();
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();

    let mut config = ScorewireConfig::default();
    config.collector.endpoint = format!("ws://127.0.0.1:{port}");
    config.session.sample_period_ms = 20;
    config.storage.path = temp_dir.path().join("store");

    let mut runtime = Runtime::from_config(&config, Box::new(NearlyDoneProbe)).unwrap();
    let handle = runtime.handle();
    let collector = thread::spawn(move || collect(listener, handle));

    runtime.run();
    let seen = collector.join().unwrap();

    assert_eq!(&seen[..4], ["clientInfo", "history", "attemptStart", "progress"]);
    assert_eq!(seen.last().map(String::as_str), Some("attemptEnd"));
    assert_eq!(seen.iter().filter(|m| *m == "attemptEnd").count(), 1);

    let attempts = runtime.orchestrator().history().recent(10);
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].finished);
}
