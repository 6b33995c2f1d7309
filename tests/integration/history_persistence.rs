//! Integration tests for history persisted in a sled store
//!
//! Tests cover:
//! - Attempts surviving a process restart
//! - Legacy documents migrated on load
//! - Corrupt documents replaced by a fresh history
//! - Newer-version documents kept intact across a session

use crate::integration::test_utils::Harness;
use scorewire::clock::{ManualClock, SharedClock};
use scorewire::history::{HistoryStore, SledSlot, Slot};
use scorewire::session::{HostEvent, SessionSettings};
use std::sync::Arc;
use tempfile::TempDir;

fn open_store(dir: &TempDir, clock: &ManualClock) -> HistoryStore {
    let shared: SharedClock = Arc::new(clock.clone());
    HistoryStore::open(dir.path().join("store"), "history", shared).unwrap()
}

#[test]
fn test_attempts_survive_restart() {
    let temp_dir = TempDir::new().unwrap();
    let clock = ManualClock::new(1_000);

    {
        let history = open_store(&temp_dir, &clock);
        let mut harness = Harness::with_history(SessionSettings::default(), clock.clone(), history);
        harness.probe.score.set(31);
        harness.orchestrator.on_host_event(HostEvent::Play);
        harness.run_until(61_000);
        harness.orchestrator.on_host_event(HostEvent::Finish);

        harness.orchestrator.on_host_event(HostEvent::Play);
        harness.run_until(62_000);
        harness.orchestrator.on_host_event(HostEvent::Reset);
    }

    let reopened = open_store(&temp_dir, &clock);
    let history = reopened.load();
    assert_eq!(history.version, 1);
    assert_eq!(history.last_updated, 62_000);
    assert_eq!(history.attempts.len(), 2);
    assert_eq!(history.attempts[0].duration, 60.0);
    assert!(history.attempts[0].finished);
    assert!(!history.attempts[1].finished);

    let stats = reopened.stats();
    assert_eq!(stats.number_of_attempts, 2);
    assert_eq!(stats.best_score, 31);
}

#[test]
fn test_legacy_document_is_migrated_on_load() {
    let temp_dir = TempDir::new().unwrap();
    {
        let slot = SledSlot::open(temp_dir.path().join("store"), "history").unwrap();
        slot.write(
            br#"{"attempts":[{"started":0,"ended":90000,"score":40,"finished":false,"perfect":true}]}"#,
        )
        .unwrap();
    }

    let clock = ManualClock::new(100_000);
    let store = open_store(&temp_dir, &clock);
    let history = store.load();
    assert_eq!(history.version, 1);
    assert_eq!(history.attempts.len(), 1);
    assert!(!history.attempts[0].perfect);
    assert_eq!(history.attempts[0].duration, 90.0);
}

#[test]
fn test_corrupt_document_starts_fresh() {
    let temp_dir = TempDir::new().unwrap();
    {
        let slot = SledSlot::open(temp_dir.path().join("store"), "history").unwrap();
        slot.write(b"not json").unwrap();
    }
    let clock = ManualClock::new(7_000);
    let store = open_store(&temp_dir, &clock);
    let history = store.load();
    assert!(history.attempts.is_empty());
    assert_eq!(history.version, 1);
    assert_eq!(history.last_updated, 7_000);
}

#[test]
fn test_newer_history_keeps_attempts_through_a_session() {
    let temp_dir = TempDir::new().unwrap();
    let stored = br#"{"version":2,"lastUpdated":5,"attempts":[
        {"started":0,"ended":30000,"score":11,"finished":true,"perfect":false,"duration":30.0},
        {"started":40000,"ended":50000,"score":4,"finished":false,"perfect":false,"duration":10.0}
    ]}"#;
    {
        let slot = SledSlot::open(temp_dir.path().join("store"), "history").unwrap();
        slot.write(stored).unwrap();
    }

    let clock = ManualClock::new(60_000);
    {
        let history = open_store(&temp_dir, &clock);
        let mut harness = Harness::with_history(SessionSettings::default(), clock.clone(), history);
        harness.orchestrator.on_host_event(HostEvent::Play);
        harness.run_until(70_000);
        harness.orchestrator.on_host_event(HostEvent::Finish);
        assert!(!harness.orchestrator.tracker().is_active());
    }

    let reopened = open_store(&temp_dir, &clock);
    let history = reopened.load();
    assert_eq!(history.version, 2);
    assert_eq!(history.attempts.len(), 2);
    assert_eq!(history.attempts[0].score, 11);
}
