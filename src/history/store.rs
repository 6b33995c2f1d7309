//! Append-only history of completed attempts, persisted whole into one slot.

use std::path::Path;

use serde_json::Value;
use tracing::{debug, warn};

use crate::clock::SharedClock;
use crate::error::StorageError;
use crate::history::migration::{migrate, MigrationError};
use crate::history::slot::{SledSlot, Slot};
use crate::model::{Attempt, History, HistoryStats};

pub struct HistoryStore {
    slot: Box<dyn Slot>,
    clock: SharedClock,
}

impl HistoryStore {
    pub fn new(slot: Box<dyn Slot>, clock: SharedClock) -> Self {
        Self { slot, clock }
    }

    /// Open (or create) a sled database at `path` and bind the history to `slot_name`.
    pub fn open<P: AsRef<Path>>(
        path: P,
        slot_name: &str,
        clock: SharedClock,
    ) -> Result<Self, StorageError> {
        let slot = SledSlot::open(path, slot_name)?;
        Ok(Self::new(Box::new(slot), clock))
    }

    /// Current history. A missing, unreadable or unparseable slot yields an empty history.
    ///
    /// A document written by a newer build is returned as stored when its known fields
    /// still decode, so its attempts stay visible.
    pub fn load(&self) -> History {
        match self.read_stored() {
            Stored::Missing => self.fresh(),
            Stored::Current(history) => history,
            Stored::Newer {
                history: Some(history),
                ..
            } => history,
            Stored::Newer {
                version,
                history: None,
            } => {
                warn!(version, "history from a newer version cannot be read, showing empty");
                self.fresh()
            }
            Stored::Unusable(reason) => {
                warn!(reason = %reason, "stored history discarded, starting fresh");
                self.fresh()
            }
        }
    }

    /// Push `attempt` to the end of the history and persist the whole document.
    ///
    /// Refuses to write over a history stored by a newer version, leaving it untouched.
    pub fn append(&self, attempt: Attempt) -> Result<(), StorageError> {
        let mut history = match self.read_stored() {
            Stored::Current(history) => history,
            Stored::Newer { version, .. } => return Err(StorageError::NewerVersion(version)),
            Stored::Missing => self.fresh(),
            Stored::Unusable(reason) => {
                warn!(reason = %reason, "stored history replaced");
                self.fresh()
            }
        };
        history.attempts.push(attempt);
        history.last_updated = self.clock.now_millis();
        let encoded = serde_json::to_vec(&history).map_err(|e| {
            StorageError::IoError(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("Failed to serialize history: {}", e),
            ))
        })?;
        self.slot.write(&encoded)?;
        debug!(attempts = history.attempts.len(), "history persisted");
        Ok(())
    }

    /// The last `n` attempts, oldest first.
    pub fn recent(&self, n: usize) -> Vec<Attempt> {
        let mut attempts = self.load().attempts;
        let skip = attempts.len().saturating_sub(n);
        attempts.drain(..skip);
        attempts
    }

    pub fn stats(&self) -> HistoryStats {
        self.load().stats()
    }

    fn fresh(&self) -> History {
        History::empty(self.clock.now_millis())
    }

    fn read_stored(&self) -> Stored {
        match self.slot.read() {
            Ok(Some(raw)) => decode(&raw),
            Ok(None) => Stored::Missing,
            Err(err) => Stored::Unusable(err.to_string()),
        }
    }
}

/// What the slot currently holds.
enum Stored {
    Missing,
    Current(History),
    /// Written by a newer build; `history` is set when its known fields still decode.
    Newer {
        version: u32,
        history: Option<History>,
    },
    Unusable(String),
}

fn decode(raw: &[u8]) -> Stored {
    let doc: Value = match serde_json::from_slice(raw) {
        Ok(doc) => doc,
        Err(e) => return Stored::Unusable(e.to_string()),
    };
    match migrate(doc.clone()) {
        Ok(doc) => match serde_json::from_value(doc) {
            Ok(history) => Stored::Current(history),
            Err(e) => Stored::Unusable(e.to_string()),
        },
        Err(MigrationError::FromFuture(version)) => Stored::Newer {
            version,
            history: serde_json::from_value(doc).ok(),
        },
        Err(e) => Stored::Unusable(e.to_string()),
    }
}
