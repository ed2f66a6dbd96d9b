use crate::state::network::LoadingState;
use courtside_api::{CompletedGame, GameSettings, LiveQuarter, SimResult, Standings};
use crossterm::event::KeyEvent;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq)]
pub enum NetworkRequest {
    StartLiveGame { game_id: String, settings: GameSettings },
    ContinueGame { game_id: String, settings: GameSettings },
    SimToEnd { game_id: String },
    LoadGame { game_id: String },
    WatchBatch { batch_id: String },
    RefreshStandings,
}

impl NetworkRequest {
    pub fn kind(&self) -> RequestKind {
        match self {
            NetworkRequest::StartLiveGame { .. } => RequestKind::StartLiveGame,
            NetworkRequest::ContinueGame { .. } => RequestKind::ContinueGame,
            NetworkRequest::SimToEnd { .. } => RequestKind::SimToEnd,
            NetworkRequest::LoadGame { .. } => RequestKind::LoadGame,
            NetworkRequest::WatchBatch { .. } => RequestKind::WatchBatch,
            NetworkRequest::RefreshStandings => RequestKind::RefreshStandings,
        }
    }
}

/// Which request an error belongs to, so the session can route it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    StartLiveGame,
    ContinueGame,
    SimToEnd,
    LoadGame,
    WatchBatch,
    RefreshStandings,
}

#[derive(Debug)]
pub enum NetworkResponse {
    LoadingStateChanged { loading_state: LoadingState },
    QuarterLoaded { quarter: LiveQuarter },
    SimFinished { result: SimResult },
    GameLoaded { game: CompletedGame },
    BatchProgress { batch_id: String, completed: u32, total: u32 },
    /// Sent exactly once per watched batch.
    BatchFinished { batch_id: String },
    StandingsLoaded { standings: Standings },
    Error { kind: RequestKind, message: String },
}

#[derive(Debug, Clone)]
pub enum UiEvent {
    KeyPressed(KeyEvent),
    Resize,
    AppStarted,
    PlaybackTick(Duration),
}
