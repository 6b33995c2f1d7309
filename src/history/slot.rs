//! Named key-value slot holding the serialized history.

use std::io;
use std::path::Path;
use std::sync::Arc;

use parking_lot::RwLock;
use sled::{Db, Tree};

use crate::error::StorageError;

const TREE_SLOTS: &str = "slots";

/// A single persisted value, read and written whole.
pub trait Slot: Send {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError>;

    /// Replace the stored value and make it durable before returning.
    fn write(&self, value: &[u8]) -> Result<(), StorageError>;
}

/// Sled-backed slot: one key in the `slots` tree.
#[derive(Clone)]
pub struct SledSlot {
    db: Db,
    tree: Tree,
    key: String,
}

impl SledSlot {
    pub fn open<P: AsRef<Path>>(path: P, key: impl Into<String>) -> Result<Self, StorageError> {
        let db = sled::open(path).map_err(|e| {
            StorageError::IoError(io::Error::new(
                io::ErrorKind::Other,
                format!("Failed to open sled database: {}", e),
            ))
        })?;
        Self::new(db, key)
    }

    pub fn new(db: Db, key: impl Into<String>) -> Result<Self, StorageError> {
        let tree = db.open_tree(TREE_SLOTS).map_err(to_storage_io)?;
        let key = key.into();
        if key.is_empty() {
            return Err(StorageError::SlotUnavailable(
                "slot name cannot be empty".to_string(),
            ));
        }
        Ok(Self { db, tree, key })
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl Slot for SledSlot {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        let raw = self
            .tree
            .get(self.key.as_bytes())
            .map_err(to_storage_io)?;
        Ok(raw.map(|v| v.to_vec()))
    }

    fn write(&self, value: &[u8]) -> Result<(), StorageError> {
        self.tree
            .insert(self.key.as_bytes(), value)
            .map_err(to_storage_io)?;
        self.db.flush().map_err(to_storage_io)?;
        Ok(())
    }
}

/// In-memory slot. Clones share the same value.
#[derive(Debug, Clone, Default)]
pub struct MemorySlot {
    value: Arc<RwLock<Option<Vec<u8>>>>,
}

impl MemorySlot {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the slot with raw bytes, e.g. a legacy or corrupt payload.
    pub fn with_raw(value: impl Into<Vec<u8>>) -> Self {
        Self {
            value: Arc::new(RwLock::new(Some(value.into()))),
        }
    }
}

impl Slot for MemorySlot {
    fn read(&self) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.value.read().clone())
    }

    fn write(&self, value: &[u8]) -> Result<(), StorageError> {
        *self.value.write() = Some(value.to_vec());
        Ok(())
    }
}

fn to_storage_io(err: sled::Error) -> StorageError {
    StorageError::IoError(io::Error::new(io::ErrorKind::Other, err.to_string()))
}
