use crate::engine::error::{EngineError, GameAction, LineupError};
use crate::engine::on_court::{OnCourtSource, minutes_fallback};
use crate::engine::playback::{DeferredEffect, LoadOptions, PlaybackController, PlaybackSignal};
use crate::engine::quarter_break::{CoordinatorEffect, CoordinatorState, QuarterBreakCoordinator};
use crate::engine::replay::ReplayModel;
use crate::engine::snapshot::{AnimationSink, PlaybackSnapshot, dispatch};
use crate::state::messages::{NetworkRequest, RequestKind};
use chrono::{DateTime, Local};
use courtside_api::{CompletedGame, LiveQuarter, Position, SimResult, Standings, TeamSide};
use log::{debug, info, warn};
use std::collections::{BTreeSet, VecDeque};
use std::time::Duration;

const MAX_NOTICES: usize = 4;
pub const SEEK_STEP_SECS: f32 = 1.0;

#[derive(Debug, Clone, PartialEq)]
pub struct Notice {
    pub at: DateTime<Local>,
    pub text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchProgress {
    pub batch_id: String,
    pub completed: u32,
    pub total: u32,
    pub finished: bool,
}

/// One game view: the playback engine, its quarter-break coordinator and
/// what the backend told us around them.
#[derive(Debug)]
pub struct GameSession {
    title: String,
    controller: PlaybackController,
    coordinator: QuarterBreakCoordinator,
    notices: VecDeque<Notice>,
    standings: Option<Standings>,
    batch: Option<BatchProgress>,
}

impl GameSession {
    fn with_parts(title: String, coordinator: QuarterBreakCoordinator, speed: f32) -> Self {
        let mut controller = PlaybackController::new();
        controller.set_speed(speed);
        Self {
            title,
            controller,
            coordinator,
            notices: VecDeque::new(),
            standings: None,
            batch: None,
        }
    }

    /// A local payload, played without the backend.
    pub fn from_replay(title: impl Into<String>, replay: ReplayModel, speed: f32) -> Self {
        let mut session = Self::with_parts(title.into(), QuarterBreakCoordinator::replay(), speed);
        let signals = session.controller.load(replay, LoadOptions::default());
        session.absorb(&signals);
        session.controller.play();
        session
    }

    /// A finished game fetched from the backend. Without a replay it goes
    /// straight to the final view.
    pub fn from_completed(game: CompletedGame, speed: f32) -> Self {
        let title = format!("{} at {}", game.away_name, game.home_name);
        let mut session = Self::with_parts(title, QuarterBreakCoordinator::replay(), speed);
        session
            .controller
            .box_score_mut()
            .reset_with_roster(game.final_box_score.players().cloned().map(|mut p| {
                p.stats = Default::default();
                p
            }));
        session
            .coordinator
            .set_final_result(game.final_box_score, game.quarter_scores);

        match game.animation {
            Some(animation) if !animation.possessions.is_empty() => {
                let signals = session
                    .controller
                    .load(ReplayModel::new(animation), LoadOptions::default());
                session.absorb(&signals);
                session.controller.play();
            }
            _ => {
                info!("game {} has no replay, showing final", game.game_id);
                session.coordinator.complete(&mut session.controller, None, None);
            }
        }
        session
    }

    /// The user's own game. Nothing plays until the first quarter arrives.
    pub fn live(game_id: impl Into<String>, side: TeamSide, speed: f32) -> Self {
        let game_id = game_id.into();
        Self::with_parts(
            format!("Live game {game_id}"),
            QuarterBreakCoordinator::live(game_id, side),
            speed,
        )
    }

    /// The first-quarter request for a live session. `None` once started or
    /// while a start is in flight.
    pub fn start(&mut self) -> Option<NetworkRequest> {
        match self.coordinator.request_start() {
            Ok(effect) => Some(into_request(effect)),
            Err(e) => {
                debug!("start skipped: {e}");
                None
            }
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn controller(&self) -> &PlaybackController {
        &self.controller
    }

    pub fn coordinator(&self) -> &QuarterBreakCoordinator {
        &self.coordinator
    }

    pub fn notices(&self) -> impl Iterator<Item = &Notice> {
        self.notices.iter()
    }

    pub fn standings(&self) -> Option<&Standings> {
        self.standings.as_ref()
    }

    pub fn batch(&self) -> Option<&BatchProgress> {
        self.batch.as_ref()
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let mut snapshot = self.controller.snapshot();
        snapshot.is_quarter_break = self.coordinator.is_quarter_break();
        snapshot.completed_quarter = self.coordinator.completed_quarter();
        snapshot.on_court = self.on_court_ids();
        snapshot
    }

    /// Who is on the floor for display. Falls back to the heaviest-minutes
    /// players when nothing has been tracked, and trusts the submitted lineup
    /// for the user's side while only cached data is available.
    pub fn on_court_ids(&self) -> BTreeSet<String> {
        let tracker = self.controller.on_court();
        let roster = self.controller.box_score();
        if tracker.current_on_court_ids().is_empty() {
            return minutes_fallback(roster.players());
        }
        let lineup = self.coordinator.lineup();
        if self.coordinator.is_live()
            && tracker.source() == OnCourtSource::Cached
            && lineup.filled() == Position::ALL.len()
        {
            let side = self.coordinator.user_side();
            return tracker.confirmed_with_lineup(
                |id| roster.player(id).is_some_and(|p| p.side == side),
                &lineup.ids(),
            );
        }
        tracker.current_on_court_ids().clone()
    }

    fn can_navigate(&self) -> bool {
        !self.coordinator.is_quarter_break() && self.coordinator.pending().is_none()
    }

    pub fn tick(&mut self, elapsed: Duration, sink: &mut dyn AnimationSink) -> Vec<NetworkRequest> {
        let signals = self.controller.tick(elapsed);
        self.route(signals, sink)
    }

    pub fn toggle_play_pause(&mut self) {
        if self.coordinator.state() == CoordinatorState::Playing
            || self.coordinator.state() == CoordinatorState::GameComplete
        {
            self.controller.toggle_play_pause();
        }
    }

    pub fn seek_by(&mut self, delta: f32, sink: &mut dyn AnimationSink) -> Vec<NetworkRequest> {
        if !self.can_navigate() {
            return Vec::new();
        }
        let t = self.controller.cursor().time_within_possession + delta;
        let signals = self.controller.seek(t);
        self.route(signals, sink)
    }

    pub fn next_possession(&mut self, sink: &mut dyn AnimationSink) -> Vec<NetworkRequest> {
        if !self.can_navigate() {
            return Vec::new();
        }
        let signals = self.controller.next_possession();
        self.route(signals, sink)
    }

    pub fn previous_possession(&mut self, sink: &mut dyn AnimationSink) -> Vec<NetworkRequest> {
        if !self.can_navigate() {
            return Vec::new();
        }
        let signals = self.controller.previous_possession();
        self.route(signals, sink)
    }

    pub fn cycle_speed(&mut self) {
        self.controller.cycle_speed();
    }

    pub fn continue_play(&mut self) -> Result<Vec<NetworkRequest>, LineupError> {
        let effect = self.coordinator.continue_play(&mut self.controller)?;
        Ok(effect.into_iter().map(into_request).collect())
    }

    pub fn sim_to_end(&mut self) -> Result<Vec<NetworkRequest>, LineupError> {
        let effect = self.coordinator.request_sim_to_end()?;
        Ok(vec![into_request(effect)])
    }

    pub fn assign(&mut self, slot: Position, player_id: &str) -> Result<(), LineupError> {
        self.coordinator
            .assign(slot, player_id, self.controller.box_score())
    }

    pub fn clear_slot(&mut self, slot: Position) -> Result<(), LineupError> {
        self.coordinator.clear_slot(slot)
    }

    pub fn cycle_offensive_style(&mut self) -> Result<(), LineupError> {
        self.coordinator.cycle_offensive_style()
    }

    pub fn cycle_defensive_style(&mut self) -> Result<(), LineupError> {
        self.coordinator.cycle_defensive_style()
    }

    pub fn on_quarter_loaded(&mut self, quarter: LiveQuarter) -> Vec<NetworkRequest> {
        match self.coordinator.on_live_quarter(quarter, &mut self.controller) {
            Ok(effects) => effects.into_iter().map(into_request).collect(),
            Err(e) => {
                self.push_notice(e.to_string());
                Vec::new()
            }
        }
    }

    pub fn on_sim_finished(&mut self, result: SimResult) -> Vec<NetworkRequest> {
        self.coordinator
            .on_sim_result(result, &mut self.controller)
            .into_iter()
            .map(into_request)
            .collect()
    }

    pub fn on_request_failed(&mut self, kind: RequestKind, message: String) {
        match kind {
            RequestKind::ContinueGame | RequestKind::SimToEnd | RequestKind::StartLiveGame => {
                let action = match kind {
                    RequestKind::StartLiveGame => GameAction::Start,
                    RequestKind::SimToEnd => GameAction::SimToEnd,
                    _ => GameAction::Continue,
                };
                let err = EngineError::network(action, message);
                self.coordinator.on_call_failed(&err);
                self.push_notice(err.to_string());
            }
            RequestKind::RefreshStandings | RequestKind::WatchBatch | RequestKind::LoadGame => {
                warn!("{kind:?} failed: {message}");
                self.push_notice(message);
            }
        }
    }

    pub fn on_batch_progress(&mut self, batch_id: String, completed: u32, total: u32) {
        let batch = self.batch.get_or_insert_with(BatchProgress::default);
        if batch.batch_id != batch_id {
            *batch = BatchProgress {
                batch_id,
                ..Default::default()
            };
        }
        if !batch.finished && total > 0 {
            batch.completed = completed;
            batch.total = total;
        }
    }

    /// Standings are refreshed once per finished batch.
    pub fn on_batch_finished(&mut self, batch_id: String) -> Vec<NetworkRequest> {
        let batch = self.batch.get_or_insert_with(|| BatchProgress {
            batch_id: batch_id.clone(),
            ..Default::default()
        });
        if batch.batch_id == batch_id && batch.finished {
            debug!("batch {batch_id} already finished");
            return Vec::new();
        }
        *batch = BatchProgress {
            batch_id,
            completed: batch.total,
            total: batch.total,
            finished: true,
        };
        self.push_notice("Other games finished, standings updated".to_owned());
        vec![NetworkRequest::RefreshStandings]
    }

    pub fn on_standings(&mut self, standings: Standings) {
        self.standings = Some(standings);
    }

    /// Halt playback for good. Later ticks and controls do nothing.
    pub fn teardown(&mut self) {
        self.controller.stop();
    }

    fn route(&mut self, signals: Vec<PlaybackSignal>, sink: &mut dyn AnimationSink) -> Vec<NetworkRequest> {
        dispatch(&signals, sink);
        self.absorb(&signals);
        self.coordinator
            .handle_signals(&signals, &mut self.controller)
            .into_iter()
            .map(into_request)
            .collect()
    }

    fn absorb(&mut self, signals: &[PlaybackSignal]) {
        for signal in signals {
            match signal {
                PlaybackSignal::Deferred(DeferredEffect::Notice(text)) => {
                    self.push_notice(text.clone())
                }
                PlaybackSignal::NoData => {
                    self.push_notice(EngineError::Data("replay has no possessions".into()).to_string())
                }
                _ => {}
            }
        }
    }

    fn push_notice(&mut self, text: String) {
        if self.notices.len() == MAX_NOTICES {
            self.notices.pop_front();
        }
        self.notices.push_back(Notice {
            at: Local::now(),
            text,
        });
    }
}

fn into_request(effect: CoordinatorEffect) -> NetworkRequest {
    match effect {
        CoordinatorEffect::StartGame { game_id, settings } => {
            NetworkRequest::StartLiveGame { game_id, settings }
        }
        CoordinatorEffect::ContinueGame { game_id, settings } => {
            NetworkRequest::ContinueGame { game_id, settings }
        }
        CoordinatorEffect::SimToEnd { game_id } => NetworkRequest::SimToEnd { game_id },
        CoordinatorEffect::RefreshStandings => NetworkRequest::RefreshStandings,
        CoordinatorEffect::WatchBatch(batch_id) => NetworkRequest::WatchBatch { batch_id },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lineup::tests::roster;
    use crate::engine::replay::tests::{keyframe, possession, sample_replay};
    use courtside_api::{AnimationData, Outcome, QuarterScore};

    #[derive(Default)]
    struct Recorder {
        scores: Vec<(u8, bool)>,
        defense: usize,
    }

    impl AnimationSink for Recorder {
        fn trigger_score_animation(&mut self, points: u8, is_home: bool) {
            self.scores.push((points, is_home));
        }

        fn trigger_defensive_animation_at_position(&mut self, _x: f32, _y: f32, _kind: Outcome) {
            self.defense += 1;
        }
    }

    fn live_quarter(q: u8, score: (u16, u16), complete: bool) -> LiveQuarter {
        LiveQuarter {
            animation: AnimationData {
                possessions: vec![possession(
                    TeamSide::Home,
                    q,
                    score,
                    vec![keyframe(0.0, 0.0, Outcome::None), keyframe(1.0, 0.0, Outcome::MadeBasket)],
                )],
            },
            quarter: q,
            is_game_complete: complete,
            box_score: Some(roster()),
            ..Default::default()
        }
    }

    fn tick_until_idle(session: &mut GameSession, sink: &mut Recorder) -> Vec<NetworkRequest> {
        let mut requests = Vec::new();
        for _ in 0..200 {
            requests.extend(session.tick(Duration::from_millis(33), sink));
            if !session.controller().cursor().is_playing {
                break;
            }
        }
        requests
    }

    #[test]
    fn replay_session_pauses_at_break_and_continues_locally() {
        let mut session = GameSession::from_replay("local", sample_replay(), 1.0);
        let mut sink = Recorder::default();
        let requests = tick_until_idle(&mut session, &mut sink);
        assert!(requests.is_empty());
        assert_eq!(sink.scores, vec![(2, true)]);
        assert_eq!(sink.defense, 1);

        let snap = session.snapshot();
        assert!(snap.is_quarter_break);
        assert_eq!(snap.completed_quarter, Some(1));
        assert_eq!((snap.current_home_score, snap.current_away_score), (2, 0));

        // Navigation and play are gated while on the break.
        assert!(session.next_possession(&mut sink).is_empty());
        session.toggle_play_pause();
        assert!(!session.controller().cursor().is_playing);

        assert_eq!(session.continue_play(), Ok(Vec::new()));
        assert!(!session.snapshot().is_quarter_break);
        assert_eq!(session.snapshot().current_quarter, 2);
    }

    #[test]
    fn live_session_round_trip() {
        let mut session = GameSession::live("g1", TeamSide::Home, 1.0);
        assert!(session.start().is_some());
        assert!(session.on_quarter_loaded(live_quarter(1, (2, 0), false)).is_empty());
        let mut sink = Recorder::default();
        tick_until_idle(&mut session, &mut sink);
        assert_eq!(session.snapshot().completed_quarter, Some(1));

        let requests = session.continue_play().unwrap();
        assert!(matches!(
            requests.as_slice(),
            [NetworkRequest::ContinueGame { game_id, settings }]
                if game_id == "g1" && settings.lineup.as_ref().is_some_and(|l| l.len() == 5)
        ));

        session.on_request_failed(RequestKind::ContinueGame, "503".into());
        assert!(session.snapshot().is_quarter_break);
        assert!(session
            .notices()
            .any(|n| n.text == "Failed to continue game: 503"));

        session.continue_play().unwrap();
        let requests = session.on_quarter_loaded(LiveQuarter {
            batch_id: Some("b1".into()),
            ..live_quarter(4, (3, 0), true)
        });
        assert_eq!(
            requests,
            vec![NetworkRequest::WatchBatch {
                batch_id: "b1".into()
            }]
        );
        let requests = tick_until_idle(&mut session, &mut sink);
        assert_eq!(requests, vec![NetworkRequest::RefreshStandings]);
        assert_eq!(session.coordinator().state(), CoordinatorState::GameComplete);
        assert_eq!(session.snapshot().current_home_score, 5);
    }

    #[test]
    fn failed_live_start_is_retried_on_continue() {
        let mut session = GameSession::live("g1", TeamSide::Away, 1.0);
        let start = session.start();
        assert!(matches!(
            start,
            Some(NetworkRequest::StartLiveGame { ref game_id, ref settings })
                if game_id == "g1" && settings.side == TeamSide::Away
        ));
        assert_eq!(session.start(), None);

        session.on_request_failed(RequestKind::StartLiveGame, "connection refused".into());
        assert!(session
            .notices()
            .any(|n| n.text == "Failed to start game: connection refused"));

        let retry = session.continue_play().unwrap();
        assert!(matches!(
            retry.as_slice(),
            [NetworkRequest::StartLiveGame { game_id, .. }] if game_id == "g1"
        ));
    }

    #[test]
    fn failed_sim_names_the_sim() {
        let mut session = GameSession::live("g1", TeamSide::Home, 1.0);
        session.on_request_failed(RequestKind::SimToEnd, "timed out".into());
        assert!(session
            .notices()
            .any(|n| n.text == "Failed to sim to end: timed out"));
    }

    #[test]
    fn batch_finished_refreshes_standings_once() {
        let mut session = GameSession::live("g1", TeamSide::Away, 1.0);
        session.on_batch_progress("b1".into(), 2, 6);
        assert_eq!(session.batch().map(|b| (b.completed, b.total)), Some((2, 6)));
        assert_eq!(
            session.on_batch_finished("b1".into()),
            vec![NetworkRequest::RefreshStandings]
        );
        assert!(session.on_batch_finished("b1".into()).is_empty());
        assert!(session.batch().is_some_and(|b| b.finished && b.completed == 6));
    }

    #[test]
    fn completed_game_without_replay_goes_to_final() {
        let session = GameSession::from_completed(
            CompletedGame {
                game_id: "g9".into(),
                home_name: "Owls".into(),
                away_name: "Hawks".into(),
                final_box_score: roster(),
                ..Default::default()
            },
            1.0,
        );
        assert_eq!(session.title(), "Hawks at Owls");
        // Nothing tracked: the top five by minutes per side, injured h6 and
        // bench h5 left out on the id tie-break.
        let on_court = session.on_court_ids();
        assert_eq!(on_court.len(), 10);
        assert!(on_court.contains("h4") && !on_court.contains("h5"));
        assert_eq!(session.coordinator().state(), CoordinatorState::GameComplete);
        assert!(session.coordinator().final_box_score().is_some());
    }

    #[test]
    fn completed_game_without_replay_shows_its_final_score() {
        let session = GameSession::from_completed(
            CompletedGame {
                game_id: "g9".into(),
                final_box_score: roster(),
                quarter_scores: vec![
                    QuarterScore { quarter: 1, home: 30, away: 22 },
                    QuarterScore { quarter: 2, home: 28, away: 31 },
                ],
                ..Default::default()
            },
            1.0,
        );
        let snapshot = session.snapshot();
        assert_eq!(
            (snapshot.current_home_score, snapshot.current_away_score),
            (58, 53)
        );
    }

    #[test]
    fn teardown_stops_everything() {
        let mut session = GameSession::from_replay("local", sample_replay(), 1.0);
        let mut sink = Recorder::default();
        session.teardown();
        assert!(session.tick(Duration::from_secs(5), &mut sink).is_empty());
        session.toggle_play_pause();
        assert!(!session.controller().cursor().is_playing);
        assert_eq!(session.controller().cursor().possession_index, 0);
    }

    #[test]
    fn empty_replay_surfaces_no_data() {
        let session = GameSession::from_replay("empty", ReplayModel::default(), 1.0);
        assert!(session.snapshot().no_data);
        assert!(session
            .notices()
            .any(|n| n.text.starts_with("No data, cannot play")));
    }
}
