//! Durable, versioned log of completed attempts.

pub mod migration;
pub mod slot;
pub mod store;

pub use migration::{migrate, MigrationError, MIGRATIONS};
pub use slot::{MemorySlot, SledSlot, Slot};
pub use store::HistoryStore;
