//! Integration tests for the collector channel as seen from host events
//!
//! Tests cover:
//! - Connection attempts triggered by startup, play and reset
//! - Greeting order after the connection opens
//! - Messages dropped while disconnected
//! - Recovery after a failed or closed connection

use crate::integration::test_utils::Harness;
use scorewire::session::HostEvent;
use scorewire::sync::{ChannelState, TransportEvent};

#[test]
fn test_greeting_is_client_info_then_history() {
    let mut harness = Harness::new();
    harness.orchestrator.startup();
    assert_eq!(harness.orchestrator.channel().state(), ChannelState::Connecting);

    harness.orchestrator.on_transport(TransportEvent::Opened);

    let sent = harness.sent();
    assert_eq!(harness.sent_kinds(), vec!["clientInfo", "history"]);
    assert_eq!(sent[0].data["name"], "apple");
    assert_eq!(sent[1].data["version"], 1);
    assert_eq!(sent[1].data["attempts"], serde_json::json!([]));
}

#[test]
fn test_greeting_carries_recorded_attempts() {
    let mut harness = Harness::new();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.clock.set(4_000);
    harness.orchestrator.on_host_event(HostEvent::Finish);
    // Nothing reached the collector while it was still connecting.
    assert!(harness.sent().is_empty());

    harness.orchestrator.on_transport(TransportEvent::Opened);
    let sent = harness.sent();
    assert_eq!(sent[1].msg, "history");
    assert_eq!(sent[1].data["attempts"][0]["duration"], 4.0);
    assert_eq!(sent[1].data["attempts"][0]["finished"], true);
}

#[test]
fn test_play_tracks_before_connecting() {
    let mut harness = Harness::new();
    harness.wire.borrow_mut().refuse_open = true;

    harness.orchestrator.on_host_event(HostEvent::Play);

    assert!(harness.orchestrator.tracker().is_active());
    assert_eq!(harness.wire.borrow().opens, 1);
    assert_eq!(harness.orchestrator.channel().state(), ChannelState::Disconnected);
}

#[test]
fn test_reset_on_idle_still_reconnects() {
    let mut harness = Harness::new();
    harness.orchestrator.on_host_event(HostEvent::Reset);

    assert_eq!(harness.wire.borrow().opens, 1);
    assert!(harness.orchestrator.history().recent(10).is_empty());
}

#[test]
fn test_connect_is_skipped_while_in_flight() {
    let mut harness = Harness::new();
    harness.orchestrator.startup();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.orchestrator.on_host_event(HostEvent::Reset);

    assert_eq!(harness.wire.borrow().opens, 1);
}

#[test]
fn test_send_while_disconnected_is_dropped() {
    let mut harness = Harness::new();
    harness.wire.borrow_mut().refuse_open = true;
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.run_until(1_000);
    harness.orchestrator.on_host_event(HostEvent::Finish);

    assert!(harness.wire.borrow().sent.is_empty());
    assert_eq!(harness.orchestrator.channel().state(), ChannelState::Disconnected);
    assert_eq!(harness.orchestrator.history().recent(10).len(), 1);
}

#[test]
fn test_failed_connection_retries_on_next_play() {
    let mut harness = Harness::new();
    harness.orchestrator.startup();
    harness
        .orchestrator
        .on_transport(TransportEvent::Failed("connection refused".to_string()));
    assert_eq!(harness.orchestrator.channel().state(), ChannelState::Disconnected);
    assert_eq!(harness.wire.borrow().closes, 1);

    harness.orchestrator.on_host_event(HostEvent::Play);
    assert_eq!(harness.wire.borrow().opens, 2);
    harness.orchestrator.on_transport(TransportEvent::Opened);
    assert_eq!(harness.sent_kinds(), vec!["clientInfo", "history"]);
}

#[test]
fn test_close_mid_session_drops_later_messages() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.orchestrator.on_transport(TransportEvent::Closed);
    let before = harness.sent().len();

    harness.run_until(500);
    harness.orchestrator.on_host_event(HostEvent::Finish);

    assert_eq!(harness.sent().len(), before);
    assert_eq!(harness.orchestrator.channel().state(), ChannelState::Disconnected);
    assert_eq!(harness.orchestrator.history().recent(10).len(), 1);
}

#[test]
fn test_incoming_messages_are_ignored() {
    let mut harness = Harness::connected();
    harness
        .orchestrator
        .on_transport(TransportEvent::Message("{\"msg\":\"ping\",\"data\":null}".to_string()));

    assert!(harness.sent().is_empty());
    assert_eq!(harness.orchestrator.channel().state(), ChannelState::Connected);
}
