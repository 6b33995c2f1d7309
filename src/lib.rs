//! Scorewire: Session Telemetry for Timed Puzzle Games
//!
//! Tracks timed play sessions inside a host game, samples live progress, keeps a
//! persistent history of finished attempts and streams session events to a local
//! collector over WebSocket.

pub mod clock;
pub mod config;
pub mod error;
pub mod history;
pub mod logging;
pub mod model;
pub mod orchestrator;
pub mod runtime;
pub mod scheduler;
pub mod session;
pub mod sync;

pub use error::ApiError;
pub use orchestrator::Orchestrator;
pub use runtime::{Runtime, RuntimeEvent, RuntimeHandle};
