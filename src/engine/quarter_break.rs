use crate::engine::error::{EngineError, LineupError};
use crate::engine::lineup::{Lineup, TeamRosterProvider};
use crate::engine::playback::{
    DeferredEffect, DeferredId, LoadOptions, PlaybackController, PlaybackSignal,
};
use crate::engine::replay::ReplayModel;
use courtside_api::{
    BoxScore, DefensiveStyle, GameSettings, LiveQuarter, OffensiveStyle, Position, QuarterScore,
    SimResult, TeamSide,
};
use log::{info, warn};
use std::time::Duration;

const BREAK_NOTICE_DELAY: Duration = Duration::from_millis(600);
const FINAL_NOTICE_DELAY: Duration = Duration::from_millis(900);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinatorState {
    Playing,
    QuarterBreak { completed_quarter: u8 },
    GameComplete,
}

/// Work the session must carry out on the coordinator's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum CoordinatorEffect {
    StartGame { game_id: String, settings: GameSettings },
    ContinueGame { game_id: String, settings: GameSettings },
    SimToEnd { game_id: String },
    RefreshStandings,
    WatchBatch(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PendingCall {
    Start,
    Continue,
    SimToEnd,
}

/// Gates the move from one quarter to the next.
///
/// Replay sessions just unpause the controller. Live sessions submit coaching
/// settings and wait for the backend to return the next quarter; the
/// controller is never advanced while that call is outstanding.
#[derive(Debug)]
pub struct QuarterBreakCoordinator {
    state: CoordinatorState,
    live_game: Option<String>,
    user_side: TeamSide,
    offensive_style: OffensiveStyle,
    defensive_style: DefensiveStyle,
    lineup: Lineup,
    pending: Option<PendingCall>,
    started: bool,
    finished_upstream: bool,
    final_box_score: Option<BoxScore>,
    final_score: Option<(u16, u16)>,
    quarter_scores: Vec<QuarterScore>,
    last_error: Option<String>,
    break_notice: Option<DeferredId>,
}

impl QuarterBreakCoordinator {
    /// A fully known game played back locally.
    pub fn replay() -> Self {
        Self {
            state: CoordinatorState::Playing,
            live_game: None,
            user_side: TeamSide::Home,
            offensive_style: OffensiveStyle::default(),
            defensive_style: DefensiveStyle::default(),
            lineup: Lineup::new(),
            pending: None,
            started: true,
            finished_upstream: false,
            final_box_score: None,
            final_score: None,
            quarter_scores: Vec::new(),
            last_error: None,
            break_notice: None,
        }
    }

    /// The user's own game, continued quarter by quarter against the backend.
    /// Nothing plays until `request_start` is answered with the first quarter.
    pub fn live(game_id: impl Into<String>, user_side: TeamSide) -> Self {
        Self {
            live_game: Some(game_id.into()),
            user_side,
            started: false,
            ..Self::replay()
        }
    }

    pub fn state(&self) -> CoordinatorState {
        self.state
    }

    pub fn is_live(&self) -> bool {
        self.live_game.is_some()
    }

    pub fn is_quarter_break(&self) -> bool {
        matches!(self.state, CoordinatorState::QuarterBreak { .. })
    }

    pub fn completed_quarter(&self) -> Option<u8> {
        match self.state {
            CoordinatorState::QuarterBreak { completed_quarter } => Some(completed_quarter),
            _ => None,
        }
    }

    /// A live game whose first quarter has not arrived yet.
    pub fn awaiting_start(&self) -> bool {
        !self.started
    }

    pub fn pending(&self) -> Option<PendingCall> {
        self.pending
    }

    pub fn user_side(&self) -> TeamSide {
        self.user_side
    }

    pub fn lineup(&self) -> &Lineup {
        &self.lineup
    }

    pub fn offensive_style(&self) -> OffensiveStyle {
        self.offensive_style
    }

    pub fn defensive_style(&self) -> DefensiveStyle {
        self.defensive_style
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Final box score for the post-game view, once the game is complete.
    pub fn final_box_score(&self) -> Option<&BoxScore> {
        match self.state {
            CoordinatorState::GameComplete => self.final_box_score.as_ref(),
            _ => None,
        }
    }

    pub fn quarter_scores(&self) -> &[QuarterScore] {
        &self.quarter_scores
    }

    /// Authoritative results for an already finished game, used when its
    /// replay runs out.
    pub fn set_final_result(&mut self, box_score: BoxScore, quarter_scores: Vec<QuarterScore>) {
        self.final_score = result_score(&box_score, &quarter_scores);
        self.final_box_score = Some(box_score);
        self.quarter_scores = quarter_scores;
    }

    pub fn handle_signals(
        &mut self,
        signals: &[PlaybackSignal],
        controller: &mut PlaybackController,
    ) -> Vec<CoordinatorEffect> {
        let mut effects = Vec::new();
        for signal in signals {
            if let PlaybackSignal::QuarterExhausted {
                quarter,
                end_of_replay,
            } = signal
            {
                effects.extend(self.on_quarter_exhausted(*quarter, *end_of_replay, controller));
            }
        }
        effects
    }

    pub fn on_quarter_exhausted(
        &mut self,
        quarter: u8,
        end_of_replay: bool,
        controller: &mut PlaybackController,
    ) -> Vec<CoordinatorEffect> {
        if self.state == CoordinatorState::GameComplete {
            return Vec::new();
        }
        if end_of_replay && (!self.is_live() || self.finished_upstream) {
            return self.complete(controller, None, None);
        }

        info!("quarter {quarter} complete");
        self.state = CoordinatorState::QuarterBreak {
            completed_quarter: quarter,
        };
        if self.is_live() {
            let roster = controller.box_score();
            if self.lineup.validate(self.user_side, roster).is_err() {
                self.lineup = Lineup::suggest(
                    self.user_side,
                    roster,
                    controller.on_court().current_on_court_ids(),
                );
            }
        }
        self.break_notice = controller.schedule(
            BREAK_NOTICE_DELAY,
            DeferredEffect::Notice(format!("End of Q{quarter}")),
        );
        Vec::new()
    }

    fn check_editable(&self) -> Result<(), LineupError> {
        if !self.is_live() {
            return Err(LineupError::NotLive);
        }
        if !self.is_quarter_break() {
            return Err(LineupError::NotAtQuarterBreak);
        }
        if self.pending.is_some() {
            return Err(LineupError::ContinuationPending);
        }
        Ok(())
    }

    pub fn assign(
        &mut self,
        slot: Position,
        player_id: &str,
        roster: &dyn TeamRosterProvider,
    ) -> Result<(), LineupError> {
        self.check_editable()?;
        self.lineup.assign(slot, player_id, self.user_side, roster)
    }

    pub fn clear_slot(&mut self, slot: Position) -> Result<(), LineupError> {
        self.check_editable()?;
        self.lineup.clear(slot);
        Ok(())
    }

    pub fn cycle_offensive_style(&mut self) -> Result<(), LineupError> {
        self.check_editable()?;
        self.offensive_style = self.offensive_style.next();
        Ok(())
    }

    pub fn cycle_defensive_style(&mut self) -> Result<(), LineupError> {
        self.check_editable()?;
        self.defensive_style = self.defensive_style.next();
        Ok(())
    }

    /// Validate the lineup and hand back the continuation request. Nothing is
    /// sent when validation fails.
    pub fn submit_settings(
        &mut self,
        roster: &dyn TeamRosterProvider,
    ) -> Result<CoordinatorEffect, LineupError> {
        self.check_editable()?;
        let game_id = self.live_game.clone().ok_or(LineupError::NotLive)?;
        let ids = self.lineup.validate(self.user_side, roster)?;
        self.pending = Some(PendingCall::Continue);
        self.last_error = None;
        info!("submitting settings for {game_id}");
        Ok(CoordinatorEffect::ContinueGame {
            game_id,
            settings: GameSettings {
                offensive_style: self.offensive_style,
                defensive_style: self.defensive_style,
                side: self.user_side,
                lineup: Some(ids),
            },
        })
    }

    /// Ask the backend for the first quarter. Also the retry after a failed start.
    pub fn request_start(&mut self) -> Result<CoordinatorEffect, LineupError> {
        let game_id = self.live_game.clone().ok_or(LineupError::NotLive)?;
        if self.started {
            return Err(LineupError::NotAtQuarterBreak);
        }
        if self.pending.is_some() {
            return Err(LineupError::ContinuationPending);
        }
        self.pending = Some(PendingCall::Start);
        self.last_error = None;
        info!("starting live game {game_id}");
        Ok(CoordinatorEffect::StartGame {
            game_id,
            settings: GameSettings {
                side: self.user_side,
                ..Default::default()
            },
        })
    }

    /// The single "continue" action: unpause a replay, start or retry starting
    /// a live game, or submit settings for the next live quarter.
    pub fn continue_play(
        &mut self,
        controller: &mut PlaybackController,
    ) -> Result<Option<CoordinatorEffect>, LineupError> {
        if !self.started {
            return self.request_start().map(Some);
        }
        if self.is_live() {
            let effect = self.submit_settings(controller.box_score())?;
            return Ok(Some(effect));
        }
        if !self.is_quarter_break() {
            return Err(LineupError::NotAtQuarterBreak);
        }
        self.state = CoordinatorState::Playing;
        self.drop_break_notice(controller);
        controller.play();
        Ok(None)
    }

    /// A break left before its notice fired should not announce itself late.
    fn drop_break_notice(&mut self, controller: &mut PlaybackController) {
        if let Some(id) = self.break_notice.take() {
            controller.cancel_deferred(id);
        }
    }

    pub fn request_sim_to_end(&mut self) -> Result<CoordinatorEffect, LineupError> {
        self.check_editable()?;
        let game_id = self.live_game.clone().ok_or(LineupError::NotLive)?;
        self.pending = Some(PendingCall::SimToEnd);
        self.last_error = None;
        Ok(CoordinatorEffect::SimToEnd { game_id })
    }

    /// A quarter arrived from start or continue. An empty, unfinished payload
    /// is rejected and leaves playback exactly as it was.
    pub fn on_live_quarter(
        &mut self,
        quarter: LiveQuarter,
        controller: &mut PlaybackController,
    ) -> Result<Vec<CoordinatorEffect>, EngineError> {
        self.pending = None;
        self.started = true;
        let mut effects = Vec::new();
        if let Some(batch) = quarter.batch_id {
            effects.push(CoordinatorEffect::WatchBatch(batch));
        }

        if quarter.animation.possessions.is_empty() {
            if quarter.is_game_complete {
                effects.extend(self.complete(controller, quarter.box_score, None));
                return Ok(effects);
            }
            let err = EngineError::Data(format!("quarter {} has no possessions", quarter.quarter));
            self.last_error = Some(err.to_string());
            return Err(err);
        }

        if let Some(box_score) = &quarter.box_score {
            controller
                .box_score_mut()
                .reset_with_roster(box_score.players().cloned());
        }
        let (home, away) = controller.score();
        controller.load(
            ReplayModel::new(quarter.animation),
            LoadOptions {
                is_live: true,
                quarter: quarter.quarter,
                starting_home_score: home,
                starting_away_score: away,
            },
        );
        controller.play();
        self.finished_upstream = quarter.is_game_complete;
        self.last_error = None;
        self.state = CoordinatorState::Playing;
        Ok(effects)
    }

    /// The continuation call failed. Stay in the break so the user can retry.
    pub fn on_call_failed(&mut self, err: &EngineError) {
        warn!("{err}");
        self.pending = None;
        self.last_error = Some(err.to_string());
    }

    pub fn on_sim_result(
        &mut self,
        result: SimResult,
        controller: &mut PlaybackController,
    ) -> Vec<CoordinatorEffect> {
        self.pending = None;
        self.last_error = None;
        self.quarter_scores = result.quarter_scores;
        let mut effects = Vec::new();
        if let Some(batch) = result.batch_id {
            effects.push(CoordinatorEffect::WatchBatch(batch));
        }
        info!(
            "simulated to end: {}-{}",
            result.home_score, result.away_score
        );
        let score = (result.home_score, result.away_score);
        effects.extend(self.complete(controller, result.box_score, Some(score)));
        effects
    }

    /// Enter `GameComplete`. `final_box` and `final_score` replace any result
    /// recorded earlier; without either, the running box score and the
    /// controller's score stand.
    pub fn complete(
        &mut self,
        controller: &mut PlaybackController,
        final_box: Option<BoxScore>,
        final_score: Option<(u16, u16)>,
    ) -> Vec<CoordinatorEffect> {
        if let Some(final_box) = final_box {
            self.final_box_score = Some(final_box);
        }
        if final_score.is_some() {
            self.final_score = final_score;
        }
        if let Some((home, away)) = self.final_score {
            controller.set_final_score(home, away);
        }
        let final_box = self
            .final_box_score
            .get_or_insert_with(|| controller.box_score().to_box_score());
        controller.box_score_mut().replace_with_final(final_box);
        controller.pause();
        let (home, away) = controller.score();
        controller.schedule(
            FINAL_NOTICE_DELAY,
            DeferredEffect::Notice(format!("Final: {home}-{away}")),
        );
        info!("game complete");
        self.state = CoordinatorState::GameComplete;
        vec![CoordinatorEffect::RefreshStandings]
    }
}

/// Final score from per-quarter scores, or from the players' points when the
/// quarters are unknown. `None` when neither says anything.
fn result_score(box_score: &BoxScore, quarter_scores: &[QuarterScore]) -> Option<(u16, u16)> {
    if !quarter_scores.is_empty() {
        return Some(quarter_scores.iter().fold((0u16, 0u16), |(h, a), q| {
            (h.saturating_add(q.home), a.saturating_add(q.away))
        }));
    }
    let points = |side: TeamSide| {
        box_score
            .side(side)
            .iter()
            .fold(0u16, |sum, p| sum.saturating_add(p.stats.points))
    };
    let score = (points(TeamSide::Home), points(TeamSide::Away));
    (score != (0, 0)).then_some(score)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::error::GameAction;
    use crate::engine::lineup::tests::{full_home_lineup, roster};
    use crate::engine::replay::tests::{keyframe, possession, sample_replay};
    use courtside_api::{AnimationData, Outcome, PlayerGameStat, StatLine};

    fn quarter(q: u8, score: (u16, u16), complete: bool) -> LiveQuarter {
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
            ..Default::default()
        }
    }

    fn live_session() -> (QuarterBreakCoordinator, PlaybackController) {
        let mut controller = PlaybackController::new();
        controller
            .box_score_mut()
            .reset_with_roster(roster().players().cloned());
        let mut coordinator = QuarterBreakCoordinator::live("g1", TeamSide::Home);
        coordinator.request_start().unwrap();
        coordinator
            .on_live_quarter(quarter(1, (2, 0), false), &mut controller)
            .unwrap();
        (coordinator, controller)
    }

    fn run_out(
        coordinator: &mut QuarterBreakCoordinator,
        controller: &mut PlaybackController,
    ) -> Vec<CoordinatorEffect> {
        let signals = controller.next_possession();
        coordinator.handle_signals(&signals, controller)
    }

    #[test]
    fn replay_break_continues_without_network() {
        let mut controller = PlaybackController::new();
        controller.load(sample_replay(), LoadOptions::default());
        let mut coordinator = QuarterBreakCoordinator::replay();
        controller.next_possession();
        let effects = run_out(&mut coordinator, &mut controller);
        assert!(effects.is_empty());
        assert_eq!(
            coordinator.state(),
            CoordinatorState::QuarterBreak {
                completed_quarter: 1
            }
        );
        assert_eq!(
            coordinator.submit_settings(&roster()),
            Err(LineupError::NotLive)
        );

        assert_eq!(controller.pending_deferred(), 1);

        assert_eq!(coordinator.continue_play(&mut controller), Ok(None));
        assert_eq!(coordinator.state(), CoordinatorState::Playing);
        assert!(controller.cursor().is_playing);
        assert_eq!(controller.cursor().possession_index, 2);
        assert_eq!(controller.pending_deferred(), 0);
    }

    #[test]
    fn replay_end_completes_with_fetched_box_score() {
        let mut controller = PlaybackController::new();
        controller.load(sample_replay(), LoadOptions::default());
        let mut coordinator = QuarterBreakCoordinator::replay();
        coordinator.set_final_result(roster(), Vec::new());
        let mut effects = Vec::new();
        for _ in 0..5 {
            effects = run_out(&mut coordinator, &mut controller);
        }
        assert_eq!(effects, vec![CoordinatorEffect::RefreshStandings]);
        assert_eq!(coordinator.state(), CoordinatorState::GameComplete);
        assert_eq!(coordinator.final_box_score().map(|b| b.home.len()), Some(7));
        assert!(coordinator.continue_play(&mut controller).is_err());
    }

    #[test]
    fn duplicate_lineup_never_reaches_the_network() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        assert!(coordinator.is_quarter_break());

        coordinator.lineup = Lineup::from_slots([
            Some("h5".into()),
            Some("h5".into()),
            Some("h2".into()),
            Some("h3".into()),
            Some("h4".into()),
        ]);
        let err = coordinator.continue_play(&mut controller).unwrap_err();
        assert!(matches!(err, LineupError::DuplicatePlayer { .. }));
        assert_eq!(coordinator.pending(), None);
    }

    #[test]
    fn break_seeds_lineup_from_players_on_court() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        assert_eq!(coordinator.lineup(), &full_home_lineup());
    }

    #[test]
    fn submit_sends_settings_and_blocks_until_answered() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        coordinator.cycle_offensive_style().unwrap();
        coordinator
            .assign(Position::PG, "h5", controller.box_score())
            .unwrap();

        let effect = coordinator.continue_play(&mut controller).unwrap();
        let Some(CoordinatorEffect::ContinueGame { game_id, settings }) = effect else {
            panic!("expected a continue request");
        };
        assert_eq!(game_id, "g1");
        assert_eq!(settings.side, TeamSide::Home);
        assert_eq!(settings.offensive_style, OffensiveStyle::default().next());
        assert_eq!(
            settings.lineup.unwrap(),
            ["h5", "h1", "h2", "h3", "h4"]
        );
        assert_eq!(coordinator.pending(), Some(PendingCall::Continue));
        assert_eq!(
            coordinator.continue_play(&mut controller),
            Err(LineupError::ContinuationPending)
        );
        assert_eq!(
            coordinator.request_sim_to_end(),
            Err(LineupError::ContinuationPending)
        );
    }

    #[test]
    fn failed_continue_leaves_playback_untouched() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        coordinator.continue_play(&mut controller).unwrap();
        let before = controller.cursor();
        let quarter = controller.current_quarter();

        coordinator.on_call_failed(&EngineError::network(GameAction::Continue, "timed out"));
        assert_eq!(controller.cursor(), before);
        assert_eq!(controller.current_quarter(), quarter);
        assert_eq!(
            coordinator.state(),
            CoordinatorState::QuarterBreak {
                completed_quarter: 1
            }
        );
        assert_eq!(
            coordinator.last_error(),
            Some("Failed to continue game: timed out")
        );
        assert!(coordinator.continue_play(&mut controller).is_ok());
    }

    #[test]
    fn next_quarter_resumes_from_previous_score() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        coordinator.continue_play(&mut controller).unwrap();
        let effects = coordinator
            .on_live_quarter(
                LiveQuarter {
                    batch_id: Some("b7".into()),
                    ..quarter(2, (3, 0), false)
                },
                &mut controller,
            )
            .unwrap();
        assert_eq!(effects, vec![CoordinatorEffect::WatchBatch("b7".into())]);
        assert_eq!(coordinator.state(), CoordinatorState::Playing);
        assert!(controller.cursor().is_playing);
        assert_eq!(controller.current_quarter(), 2);
        assert_eq!(controller.score(), (2, 0));
        run_out(&mut coordinator, &mut controller);
        assert_eq!(controller.score(), (5, 0));
    }

    #[test]
    fn empty_unfinished_quarter_is_a_data_error() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        coordinator.continue_play(&mut controller).unwrap();
        let before = controller.cursor();
        let empty = LiveQuarter {
            quarter: 2,
            ..Default::default()
        };
        let err = coordinator.on_live_quarter(empty, &mut controller).unwrap_err();
        assert!(matches!(err, EngineError::Data(_)));
        assert_eq!(controller.cursor(), before);
        assert!(coordinator.is_quarter_break());
    }

    #[test]
    fn finished_flag_completes_after_last_quarter_plays() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        coordinator.continue_play(&mut controller).unwrap();
        coordinator
            .on_live_quarter(quarter(4, (4, 0), true), &mut controller)
            .unwrap();
        assert_eq!(coordinator.state(), CoordinatorState::Playing);

        let effects = run_out(&mut coordinator, &mut controller);
        assert_eq!(effects, vec![CoordinatorEffect::RefreshStandings]);
        assert_eq!(coordinator.state(), CoordinatorState::GameComplete);
        assert!(coordinator.final_box_score().is_some());
    }

    #[test]
    fn finished_without_possessions_completes_immediately() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        coordinator.continue_play(&mut controller).unwrap();
        let effects = coordinator
            .on_live_quarter(
                LiveQuarter {
                    is_game_complete: true,
                    quarter: 4,
                    ..Default::default()
                },
                &mut controller,
            )
            .unwrap();
        assert_eq!(effects, vec![CoordinatorEffect::RefreshStandings]);
        assert_eq!(coordinator.state(), CoordinatorState::GameComplete);
    }

    #[test]
    fn sim_to_end_uses_returned_box_score() {
        let (mut coordinator, mut controller) = live_session();
        run_out(&mut coordinator, &mut controller);
        let effect = coordinator.request_sim_to_end().unwrap();
        assert_eq!(
            effect,
            CoordinatorEffect::SimToEnd {
                game_id: "g1".into()
            }
        );

        let mut final_box = roster();
        final_box.home[0].stats = StatLine {
            points: 31,
            ..Default::default()
        };
        let effects = coordinator.on_sim_result(
            SimResult {
                home_score: 101,
                away_score: 99,
                box_score: Some(final_box),
                batch_id: Some("b1".into()),
                ..Default::default()
            },
            &mut controller,
        );
        assert_eq!(
            effects,
            vec![
                CoordinatorEffect::WatchBatch("b1".into()),
                CoordinatorEffect::RefreshStandings
            ]
        );
        assert_eq!(coordinator.state(), CoordinatorState::GameComplete);
        let h0: Option<&PlayerGameStat> = controller.box_score().player("h0");
        assert_eq!(h0.map(|p| p.stats.points), Some(31));

        let snapshot = controller.snapshot();
        assert_eq!(
            (snapshot.current_home_score, snapshot.current_away_score),
            (101, 99)
        );
        let notices: Vec<_> = controller
            .tick(FINAL_NOTICE_DELAY)
            .into_iter()
            .filter_map(|s| match s {
                PlaybackSignal::Deferred(DeferredEffect::Notice(text)) => Some(text),
                _ => None,
            })
            .collect();
        assert!(notices.contains(&"Final: 101-99".to_string()));
    }

    #[test]
    fn completed_game_without_replay_shows_quarter_totals() {
        let mut controller = PlaybackController::new();
        let mut coordinator = QuarterBreakCoordinator::replay();
        coordinator.set_final_result(
            roster(),
            vec![
                QuarterScore { quarter: 1, home: 20, away: 18 },
                QuarterScore { quarter: 2, home: 25, away: 22 },
                QuarterScore { quarter: 3, home: 21, away: 30 },
                QuarterScore { quarter: 4, home: 28, away: 19 },
            ],
        );
        coordinator.complete(&mut controller, None, None);
        assert_eq!(coordinator.state(), CoordinatorState::GameComplete);
        assert_eq!(controller.score(), (94, 89));
    }

    #[test]
    fn final_score_falls_back_to_player_points() {
        let mut final_box = roster();
        final_box.home[0].stats.points = 30;
        final_box.away[0].stats.points = 12;
        assert_eq!(result_score(&final_box, &[]), Some((30, 12)));
        assert_eq!(result_score(&roster(), &[]), None);
    }

    #[test]
    fn failed_start_can_be_retried_with_continue() {
        let mut controller = PlaybackController::new();
        let mut coordinator = QuarterBreakCoordinator::live("g1", TeamSide::Away);
        assert!(coordinator.awaiting_start());
        let start = coordinator.continue_play(&mut controller).unwrap();
        assert!(matches!(
            start,
            Some(CoordinatorEffect::StartGame { ref game_id, ref settings })
                if game_id == "g1" && settings.side == TeamSide::Away
        ));
        assert_eq!(coordinator.pending(), Some(PendingCall::Start));
        assert_eq!(
            coordinator.continue_play(&mut controller),
            Err(LineupError::ContinuationPending)
        );

        coordinator.on_call_failed(&EngineError::network(GameAction::Start, "refused"));
        assert_eq!(coordinator.last_error(), Some("Failed to start game: refused"));
        let retry = coordinator.continue_play(&mut controller).unwrap();
        assert!(matches!(retry, Some(CoordinatorEffect::StartGame { .. })));

        coordinator
            .on_live_quarter(quarter(1, (2, 0), false), &mut controller)
            .unwrap();
        assert!(!coordinator.awaiting_start());
        assert_eq!(
            coordinator.request_start(),
            Err(LineupError::NotAtQuarterBreak)
        );
    }

    #[test]
    fn edits_outside_a_break_are_rejected() {
        let (mut coordinator, controller) = live_session();
        assert_eq!(
            coordinator.assign(Position::PG, "h0", controller.box_score()),
            Err(LineupError::NotAtQuarterBreak)
        );
        assert_eq!(
            coordinator.cycle_defensive_style(),
            Err(LineupError::NotAtQuarterBreak)
        );
    }
}
