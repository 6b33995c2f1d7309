//! Boundary to the host game: the readings the core polls and the events it reacts to.

/// Live readings from the host's object model.
///
/// Implementations are polled from the core's single control flow and should return
/// immediately. Out-of-range values are tolerated; only remaining time is clamped.
pub trait HostProbe {
    /// Cells cleared so far.
    fn read_score(&self) -> i64;

    /// Seconds left on the host's countdown. May go negative.
    fn read_remaining_time(&self) -> f64;

    /// Number of scorable cells on the board. Reaching it is a perfect score.
    fn total_cells(&self) -> i64;
}

/// User actions observed on the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostEvent {
    Play,
    Reset,
    Finish,
}

impl HostEvent {
    pub fn as_str(self) -> &'static str {
        match self {
            HostEvent::Play => "play",
            HostEvent::Reset => "reset",
            HostEvent::Finish => "finish",
        }
    }
}
