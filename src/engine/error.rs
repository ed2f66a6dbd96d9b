use courtside_api::Position;
use std::fmt;

/// Rejected lineup or coaching edits. Never reaches the engine core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineupError {
    DuplicatePlayer { player_id: String, slot: Position },
    IneligiblePosition { player_id: String, slot: Position },
    Injured(String),
    UnknownPlayer(String),
    WrongTeam(String),
    EmptySlot(Position),
    NotAtQuarterBreak,
    ContinuationPending,
    NotLive,
}

impl fmt::Display for LineupError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LineupError::DuplicatePlayer { player_id, slot } => {
                write!(f, "{player_id} already plays {}", slot.label())
            }
            LineupError::IneligiblePosition { player_id, slot } => {
                write!(f, "{player_id} cannot play {}", slot.label())
            }
            LineupError::Injured(id) => write!(f, "{id} is injured"),
            LineupError::UnknownPlayer(id) => write!(f, "unknown player {id}"),
            LineupError::WrongTeam(id) => write!(f, "{id} is not on your roster"),
            LineupError::EmptySlot(slot) => write!(f, "{} slot is empty", slot.label()),
            LineupError::NotAtQuarterBreak => write!(f, "not at a quarter break"),
            LineupError::ContinuationPending => write!(f, "already waiting on the next quarter"),
            LineupError::NotLive => write!(f, "replays cannot change settings"),
        }
    }
}

/// Backend calls that drive a live game.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameAction {
    Start,
    Continue,
    SimToEnd,
}

impl GameAction {
    fn verb(self) -> &'static str {
        match self {
            GameAction::Start => "start game",
            GameAction::Continue => "continue game",
            GameAction::SimToEnd => "sim to end",
        }
    }
}

#[derive(Debug)]
pub enum EngineError {
    /// Malformed or empty animation payload. Playback stays paused.
    Data(String),
    /// Start/continue/sim failed. Playback state is left as it was.
    Network { action: GameAction, message: String },
    /// Rejected at the edit boundary.
    Invariant(LineupError),
}

impl EngineError {
    pub fn network(action: GameAction, message: impl fmt::Display) -> Self {
        EngineError::Network {
            action,
            message: message.to_string(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::Data(msg) => write!(f, "No data, cannot play: {msg}"),
            EngineError::Network { action, message } => {
                write!(f, "Failed to {}: {message}", action.verb())
            }
            EngineError::Invariant(e) => write!(f, "Rejected: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

impl From<LineupError> for EngineError {
    fn from(e: LineupError) -> Self {
        EngineError::Invariant(e)
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(e: serde_json::Error) -> Self {
        EngineError::Data(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use courtside_api::client::ApiError;

    #[test]
    fn network_errors_name_the_failed_action() {
        let start = EngineError::network(GameAction::Start, "connection refused");
        assert_eq!(start.to_string(), "Failed to start game: connection refused");
        let sim = EngineError::network(GameAction::SimToEnd, ApiError::NotFound("games/g1".into()));
        assert!(sim.to_string().starts_with("Failed to sim to end: "));
        let cont = EngineError::network(GameAction::Continue, "timed out");
        assert_eq!(cont.to_string(), "Failed to continue game: timed out");
    }
}
