//! Session data model shared by the tracker, the history store and the sync channel.
//!
//! Field names follow the collector's JSON schema (camelCase, timestamps in Unix epoch
//! milliseconds, durations in seconds).

use serde::{Deserialize, Serialize};

/// Schema version written into every persisted [`History`] and reported in [`ClientInfo`].
pub const HISTORY_VERSION: u32 = 1;

/// Client name the collector uses to recognise the game-side client.
pub const DEFAULT_CLIENT_NAME: &str = "apple";

/// Unix epoch milliseconds.
pub type Timestamp = u64;

/// Identity announced once per successful collector connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    pub version: u32,
}

impl ClientInfo {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: HISTORY_VERSION,
        }
    }
}

impl Default for ClientInfo {
    fn default() -> Self {
        Self::new(DEFAULT_CLIENT_NAME)
    }
}

/// One timed session, open while `ended` is `None`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attempt {
    pub started: Timestamp,
    pub ended: Option<Timestamp>,
    pub score: i64,
    pub finished: bool,
    pub perfect: bool,
    /// Seconds between `started` and `ended`.
    pub duration: f64,
}

impl Attempt {
    /// A freshly opened attempt with zeroed result fields.
    pub fn open(started: Timestamp) -> Self {
        Self {
            started,
            ended: None,
            score: 0,
            finished: false,
            perfect: false,
            duration: 0.0,
        }
    }

    /// Freeze the attempt. `perfect` only sticks on a finished attempt.
    pub fn close(&mut self, ended: Timestamp, score: i64, finished: bool, perfect: bool) {
        self.ended = Some(ended);
        self.score = score;
        self.finished = finished;
        self.perfect = finished && perfect;
        self.duration = elapsed_secs(self.started, ended);
    }

    pub fn is_open(&self) -> bool {
        self.ended.is_none()
    }
}

/// Live snapshot of an active session. Never persisted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub score: i64,
    pub time_remaining: f64,
}

impl Progress {
    /// Build a snapshot, clamping negative remaining time to zero.
    pub fn sample(score: i64, time_remaining: f64) -> Self {
        // NaN compares false against everything; treat it as expired.
        let time_remaining = if time_remaining > 0.0 {
            time_remaining
        } else {
            0.0
        };
        Self {
            score,
            time_remaining,
        }
    }
}

/// Versioned, append-only log of completed attempts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct History {
    pub version: u32,
    pub last_updated: Timestamp,
    pub attempts: Vec<Attempt>,
}

impl History {
    pub fn empty(now: Timestamp) -> Self {
        Self {
            version: HISTORY_VERSION,
            last_updated: now,
            attempts: Vec::new(),
        }
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_attempts(&self.attempts)
    }
}

/// Aggregates over a history, in the shape the collector publishes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryStats {
    pub number_of_attempts: usize,
    pub best_score: i64,
    pub avg_score: f64,
    /// Seconds.
    pub total_playtime: f64,
}

impl HistoryStats {
    pub fn from_attempts(attempts: &[Attempt]) -> Self {
        if attempts.is_empty() {
            return Self {
                number_of_attempts: 0,
                best_score: 0,
                avg_score: 0.0,
                total_playtime: 0.0,
            };
        }
        let best_score = attempts.iter().map(|a| a.score).max().unwrap_or(0);
        // Scores are stored as the host reported them, so the sum may exceed i64.
        let total: i128 = attempts.iter().map(|a| i128::from(a.score)).sum();
        Self {
            number_of_attempts: attempts.len(),
            best_score,
            avg_score: total as f64 / attempts.len() as f64,
            total_playtime: attempts.iter().map(|a| a.duration).sum(),
        }
    }
}

/// Seconds from `started` to `ended`, never negative.
pub fn elapsed_secs(started: Timestamp, ended: Timestamp) -> f64 {
    ended.saturating_sub(started) as f64 / 1000.0
}
