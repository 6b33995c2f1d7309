//! Integration tests for session lifecycle driven through the orchestrator
//!
//! Tests cover:
//! - Play, reset and finish host events
//! - Timeout and perfect-score termination from sampler ticks
//! - Ordering of progress and attemptEnd on the wire
//! - History recorded for every terminated attempt

use crate::integration::test_utils::Harness;
use scorewire::session::{HostEvent, SessionSettings};
use serde_json::json;

#[test]
fn test_play_emits_start_and_initial_progress() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);

    let sent = harness.sent();
    assert_eq!(harness.sent_kinds(), vec!["attemptStart", "progress"]);
    assert_eq!(sent[0].data, serde_json::Value::Null);
    assert_eq!(sent[1].data, json!({"score": 0, "timeRemaining": 120.0}));
    assert!(harness.orchestrator.tracker().is_active());
    assert_eq!(harness.orchestrator.next_deadline(), Some(100));
}

#[test]
fn test_perfect_score_at_118_seconds() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);

    harness.run_until_with(120_000, |at, probe| {
        probe.remaining.set(120.0 - at as f64 / 1000.0);
        if at >= 118_000 {
            probe.score.set(50);
        }
    });

    let sent = harness.sent();
    let kinds = harness.sent_kinds();
    assert_eq!(kinds.iter().filter(|k| *k == "attemptEnd").count(), 1);
    assert_eq!(kinds.last().map(String::as_str), Some("attemptEnd"));

    let last_progress = &sent[sent.len() - 2];
    assert_eq!(last_progress.msg, "progress");
    assert_eq!(last_progress.data["score"], 50);

    let end = &sent[sent.len() - 1].data;
    assert_eq!(end["finished"], true);
    assert_eq!(end["perfect"], true);
    assert_eq!(end["duration"], 118.0);
    assert_eq!(end["ended"], 118_000);

    let attempts = harness.orchestrator.history().recent(1);
    assert_eq!(attempts.len(), 1);
    assert!(attempts[0].perfect);
    assert_eq!(attempts[0].duration, 118.0);
    assert!(harness.orchestrator.next_deadline().is_none());
}

#[test]
fn test_timeout_finishes_with_clamped_progress() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.probe.score.set(12);

    harness.run_until_with(121_000, |at, probe| {
        probe.remaining.set(120.0 - at as f64 / 1000.0 - 0.05);
    });

    let sent = harness.sent();
    let end = &sent[sent.len() - 1];
    assert_eq!(end.msg, "attemptEnd");
    assert_eq!(end.data["finished"], true);
    assert_eq!(end.data["perfect"], false);
    assert_eq!(end.data["score"], 12);

    let final_progress = &sent[sent.len() - 2];
    assert_eq!(final_progress.data["timeRemaining"], 0.0);
    assert!(!harness.orchestrator.tracker().is_active());
}

#[test]
fn test_reset_abandons_open_attempt() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.run_until(5_000);
    harness.probe.score.set(7);

    harness.orchestrator.on_host_event(HostEvent::Reset);

    let kinds = harness.sent_kinds();
    assert_eq!(kinds.iter().filter(|k| *k == "attemptEnd").count(), 1);
    let attempts = harness.orchestrator.history().recent(10);
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].finished);
    assert!(!attempts[0].perfect);
    assert_eq!(attempts[0].score, 7);
    assert_eq!(attempts[0].duration, 5.0);
}

#[test]
fn test_duplicate_terminations_are_ignored() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.orchestrator.on_host_event(HostEvent::Finish);
    harness.orchestrator.on_host_event(HostEvent::Finish);
    harness.orchestrator.on_host_event(HostEvent::Reset);

    let kinds = harness.sent_kinds();
    assert_eq!(kinds.iter().filter(|k| *k == "attemptEnd").count(), 1);
    assert_eq!(harness.orchestrator.history().stats().number_of_attempts, 1);
}

#[test]
fn test_replay_abandons_previous_attempt() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);
    harness.run_until(3_000);
    harness.orchestrator.on_host_event(HostEvent::Play);

    let kinds = harness.sent_kinds();
    assert_eq!(
        &kinds[kinds.len() - 3..],
        ["attemptEnd", "attemptStart", "progress"]
    );
    let attempts = harness.orchestrator.history().recent(10);
    assert_eq!(attempts.len(), 1);
    assert!(!attempts[0].finished);
    assert!(harness.orchestrator.tracker().is_active());
}

#[test]
fn test_sampling_period_follows_settings() {
    let settings = SessionSettings {
        sample_period_ms: 250,
        ..SessionSettings::default()
    };
    let mut harness = Harness::with_settings(settings);
    harness.orchestrator.on_host_event(HostEvent::Play);
    assert_eq!(harness.orchestrator.next_deadline(), Some(250));

    let fired = harness.orchestrator.fire_due_timers(1_000);
    assert_eq!(fired, 4);
}

#[test]
fn test_idle_session_ignores_stale_timers() {
    let mut harness = Harness::connected();
    harness.orchestrator.on_host_event(HostEvent::Play);
    let (handle, _) = harness.orchestrator.pop_due_timer(100).unwrap();
    harness.orchestrator.on_host_event(HostEvent::Finish);
    let before = harness.sent().len();

    harness.orchestrator.on_timer(handle);
    assert_eq!(harness.sent().len(), before);
}
