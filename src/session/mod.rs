//! Session tracking: host boundary, progress sampler and the lifecycle state machine.

pub mod host;
pub mod sampler;
pub mod tracker;

pub use host::{HostEvent, HostProbe};
pub use sampler::{ProgressSampler, DEFAULT_SAMPLE_PERIOD_MS};
pub use tracker::{
    SessionContext, SessionSettings, SessionState, SessionTracker, DEFAULT_SESSION_LENGTH_SECS,
};
