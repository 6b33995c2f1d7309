//! Wall-clock abstraction so session timing can run on virtual time in tests.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::Utc;

use crate::model::Timestamp;

/// Source of Unix epoch milliseconds.
pub trait Clock {
    fn now_millis(&self) -> Timestamp;
}

/// Clock handle shared between components.
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// Real time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> Timestamp {
        now_millis()
    }
}

/// Manually advanced clock. Clones share the same instant.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(start)),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, by_ms: u64) {
        self.now.fetch_add(by_ms, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now_millis(&self) -> Timestamp {
        self.now.load(Ordering::SeqCst)
    }
}

/// Current time as milliseconds since Unix epoch.
pub fn now_millis() -> Timestamp {
    u64::try_from(Utc::now().timestamp_millis()).unwrap_or(0)
}
