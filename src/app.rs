use crate::engine::replay::ReplayModel;
use crate::state::app_settings::AppSettings;
use crate::state::app_state::AppState;
use crate::state::messages::{NetworkRequest, RequestKind};
use crate::state::session::{GameSession, SEEK_STEP_SECS};
use courtside_api::{CompletedGame, LiveQuarter, SimResult, Standings};
use log::{info, warn};
use std::time::Duration;

#[derive(Copy, Clone, Debug, Default, PartialEq)]
pub enum MenuItem {
    #[default]
    Court,
    BoxScore,
    Standings,
    Help,
}

pub struct App {
    pub settings: AppSettings,
    pub state: AppState,
    pub session: Option<GameSession>,
}

impl App {
    pub fn new(settings: AppSettings) -> Self {
        let app = Self {
            state: AppState::new(),
            settings,
            session: None,
        };

        if let Some(level) = app.settings.log_level {
            log::set_max_level(level);
            tui_logger::set_default_level(level);
        }

        app
    }

    /// The first request to send once the UI is up, if any. A live game gets
    /// its session right away so a failed start can be retried from it.
    pub fn startup_request(&mut self) -> Option<NetworkRequest> {
        if self.session.is_some() {
            return None;
        }
        let game_id = self.settings.game_id.clone()?;
        if !self.settings.live {
            return Some(NetworkRequest::LoadGame { game_id });
        }
        self.open_live(game_id);
        self.session.as_mut().and_then(GameSession::start)
    }

    // -----------------------------------------------------------------------
    // Session lifecycle
    // -----------------------------------------------------------------------

    fn replace_session(&mut self, session: GameSession) {
        if let Some(old) = &mut self.session {
            old.teardown();
        }
        self.state.effects.clear();
        self.state.lineup_editor = Default::default();
        self.session = Some(session);
    }

    pub fn open_replay(&mut self, title: String, replay: ReplayModel) {
        info!("opening replay {title}");
        self.replace_session(GameSession::from_replay(title, replay, self.settings.speed));
    }

    pub fn open_live(&mut self, game_id: String) {
        let session = GameSession::live(game_id, self.settings.user_side, self.settings.speed);
        self.replace_session(session);
    }

    // -----------------------------------------------------------------------
    // Network response handlers, called from main_ui_loop
    // -----------------------------------------------------------------------

    pub fn on_game_loaded(&mut self, game: CompletedGame) {
        self.state.last_error = None;
        let session = GameSession::from_completed(game, self.settings.speed);
        self.replace_session(session);
    }

    pub fn on_quarter_loaded(&mut self, quarter: LiveQuarter) -> Vec<NetworkRequest> {
        self.state.last_error = None;
        if self.session.is_none() {
            let game_id = self.settings.game_id.clone().unwrap_or_default();
            self.open_live(game_id);
        }
        match &mut self.session {
            Some(session) => session.on_quarter_loaded(quarter),
            None => Vec::new(),
        }
    }

    pub fn on_sim_finished(&mut self, result: SimResult) -> Vec<NetworkRequest> {
        match &mut self.session {
            Some(session) => session.on_sim_finished(result),
            None => Vec::new(),
        }
    }

    pub fn on_batch_progress(&mut self, batch_id: String, completed: u32, total: u32) {
        if let Some(session) = &mut self.session {
            session.on_batch_progress(batch_id, completed, total);
        }
    }

    pub fn on_batch_finished(&mut self, batch_id: String) -> Vec<NetworkRequest> {
        match &mut self.session {
            Some(session) => session.on_batch_finished(batch_id),
            None => vec![NetworkRequest::RefreshStandings],
        }
    }

    pub fn on_standings_loaded(&mut self, standings: Standings) {
        if let Some(session) = &mut self.session {
            session.on_standings(standings);
        }
    }

    pub fn on_error(&mut self, kind: RequestKind, message: String) {
        if let Some(session) = &mut self.session {
            session.on_request_failed(kind, message.clone());
        }
        self.state.last_error = Some(message);
    }

    // -----------------------------------------------------------------------
    // Playback tick, called at the frame rate from PlaybackTick
    // -----------------------------------------------------------------------

    pub fn on_tick(&mut self, elapsed: Duration) -> Vec<NetworkRequest> {
        self.state.effects.advance(elapsed);
        match &mut self.session {
            Some(session) => session.tick(elapsed, &mut self.state.effects),
            None => Vec::new(),
        }
    }

    // -----------------------------------------------------------------------
    // Playback controls
    // -----------------------------------------------------------------------

    pub fn toggle_play_pause(&mut self) {
        if let Some(session) = &mut self.session {
            session.toggle_play_pause();
        }
    }

    pub fn seek_forward(&mut self) -> Vec<NetworkRequest> {
        self.seek(SEEK_STEP_SECS)
    }

    pub fn seek_back(&mut self) -> Vec<NetworkRequest> {
        self.seek(-SEEK_STEP_SECS)
    }

    fn seek(&mut self, delta: f32) -> Vec<NetworkRequest> {
        match &mut self.session {
            Some(session) => session.seek_by(delta, &mut self.state.effects),
            None => Vec::new(),
        }
    }

    pub fn next_possession(&mut self) -> Vec<NetworkRequest> {
        match &mut self.session {
            Some(session) => session.next_possession(&mut self.state.effects),
            None => Vec::new(),
        }
    }

    pub fn previous_possession(&mut self) -> Vec<NetworkRequest> {
        self.state.effects.clear();
        match &mut self.session {
            Some(session) => session.previous_possession(&mut self.state.effects),
            None => Vec::new(),
        }
    }

    pub fn cycle_speed(&mut self) {
        if let Some(session) = &mut self.session {
            session.cycle_speed();
        }
    }

    // -----------------------------------------------------------------------
    // Quarter break
    // -----------------------------------------------------------------------

    pub fn continue_play(&mut self) -> Vec<NetworkRequest> {
        let Some(session) = &mut self.session else {
            return Vec::new();
        };
        match session.continue_play() {
            Ok(requests) => {
                self.state.last_error = None;
                requests
            }
            Err(e) => {
                warn!("continue rejected: {e}");
                self.state.last_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    pub fn sim_to_end(&mut self) -> Vec<NetworkRequest> {
        let Some(session) = &mut self.session else {
            return Vec::new();
        };
        match session.sim_to_end() {
            Ok(requests) => requests,
            Err(e) => {
                self.state.last_error = Some(e.to_string());
                Vec::new()
            }
        }
    }

    pub fn lineup_next_slot(&mut self) {
        self.state.lineup_editor.next_slot();
    }

    pub fn lineup_prev_slot(&mut self) {
        self.state.lineup_editor.prev_slot();
    }

    /// Put the next eligible player into the selected slot.
    pub fn lineup_cycle_player(&mut self) {
        let Some(session) = &mut self.session else {
            return;
        };
        let side = session.coordinator().user_side();
        let slot = self.state.lineup_editor.selected_slot();
        let Some(player_id) = self
            .state
            .lineup_editor
            .cycle_candidate(side, session.controller().box_score().players())
        else {
            self.state.last_error = Some(format!("no healthy {} on the roster", slot.label()));
            return;
        };
        let result = session.assign(slot, &player_id);
        self.record(result);
    }

    pub fn lineup_clear_slot(&mut self) {
        let slot = self.state.lineup_editor.selected_slot();
        if let Some(session) = &mut self.session {
            let result = session.clear_slot(slot);
            self.record(result);
        }
    }

    pub fn cycle_offensive_style(&mut self) {
        if let Some(session) = &mut self.session {
            let result = session.cycle_offensive_style();
            self.record(result);
        }
    }

    pub fn cycle_defensive_style(&mut self) {
        if let Some(session) = &mut self.session {
            let result = session.cycle_defensive_style();
            self.record(result);
        }
    }

    fn record<E: std::fmt::Display>(&mut self, result: Result<(), E>) {
        self.state.last_error = result.err().map(|e| e.to_string());
    }

    // -----------------------------------------------------------------------
    // Tab management
    // -----------------------------------------------------------------------

    pub fn update_tab(&mut self, next: MenuItem) {
        if self.state.active_tab == next {
            return;
        }
        self.state.previous_tab = self.state.active_tab;
        self.state.active_tab = next;
    }

    pub fn exit_help(&mut self) {
        if self.state.active_tab == MenuItem::Help {
            self.state.active_tab = self.state.previous_tab;
        }
    }

    pub fn toggle_show_logs(&mut self) {
        self.state.show_logs = !self.state.show_logs;
    }

    pub fn toggle_full_screen(&mut self) {
        self.settings.full_screen = !self.settings.full_screen;
    }

    pub fn box_score_cycle_column(&mut self) {
        self.state.box_score.cycle_column();
    }

    pub fn box_score_flip_direction(&mut self) {
        self.state.box_score.flip_direction();
    }

    pub fn box_score_toggle_side(&mut self) {
        self.state.box_score.toggle_side();
    }

    pub fn box_score_scroll_down(&mut self) {
        self.state.box_score.scroll_offset = self.state.box_score.scroll_offset.saturating_add(1);
    }

    pub fn box_score_scroll_up(&mut self) {
        self.state.box_score.scroll_offset = self.state.box_score.scroll_offset.saturating_sub(1);
    }

    /// Stop playback for good before the process exits.
    pub fn shutdown(&mut self) {
        if let Some(session) = &mut self.session {
            session.teardown();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::lineup::tests::roster;
    use crate::engine::replay::tests::{keyframe, possession, sample_replay};
    use courtside_api::{AnimationData, Outcome, TeamSide};

    fn live_app() -> App {
        App::new(AppSettings {
            game_id: Some("g1".into()),
            live: true,
            ..Default::default()
        })
    }

    fn quarter(q: u8, score: (u16, u16)) -> LiveQuarter {
        LiveQuarter {
            animation: AnimationData {
                possessions: vec![possession(
                    TeamSide::Home,
                    q,
                    score,
                    vec![keyframe(0.0, 0.0, Outcome::None), keyframe(0.5, 0.0, Outcome::MadeBasket)],
                )],
            },
            quarter: q,
            box_score: Some(roster()),
            ..Default::default()
        }
    }

    #[test]
    fn startup_request_follows_settings() {
        let mut live = live_app();
        assert_eq!(
            live.startup_request(),
            Some(NetworkRequest::StartLiveGame {
                game_id: "g1".into(),
                settings: Default::default(),
            })
        );
        assert!(live.session.as_ref().is_some_and(|s| s.coordinator().awaiting_start()));
        assert_eq!(live.startup_request(), None);

        let mut replay = App::new(AppSettings {
            game_id: Some("g2".into()),
            ..Default::default()
        });
        assert_eq!(
            replay.startup_request(),
            Some(NetworkRequest::LoadGame {
                game_id: "g2".into()
            })
        );
        assert_eq!(App::new(AppSettings::default()).startup_request(), None);
    }

    #[test]
    fn enter_retries_a_failed_live_start() {
        let mut app = live_app();
        app.startup_request();
        assert!(app.continue_play().is_empty());

        app.on_error(RequestKind::StartLiveGame, "connection refused".into());
        let retry = app.continue_play();
        assert!(matches!(
            retry.as_slice(),
            [NetworkRequest::StartLiveGame { game_id, .. }] if game_id == "g1"
        ));
        assert_eq!(app.state.last_error, None);

        assert!(app.on_quarter_loaded(quarter(1, (2, 0))).is_empty());
        assert!(!app.session.as_ref().unwrap().coordinator().awaiting_start());
    }

    #[test]
    fn ticks_feed_court_effects() {
        let mut app = App::new(AppSettings::default());
        app.open_replay("local".into(), sample_replay());
        let mut scored = false;
        for _ in 0..80 {
            app.on_tick(Duration::from_millis(33));
            scored |= app.state.effects.score_flash.is_some();
        }
        assert!(scored);
    }

    #[test]
    fn lineup_edits_at_a_live_break() {
        let mut app = live_app();
        assert!(app.on_quarter_loaded(quarter(1, (2, 0))).is_empty());
        app.next_possession();
        let coordinator = app.session.as_ref().unwrap().coordinator();
        assert!(coordinator.is_quarter_break());

        // PG: h0 is already there, so the first pick collides with nothing.
        app.lineup_cycle_player();
        assert_eq!(app.state.last_error, None);
        app.lineup_cycle_player();
        let lineup = app.session.as_ref().unwrap().coordinator().lineup();
        assert_eq!(lineup.slot(courtside_api::Position::PG), Some("h5"));

        app.cycle_defensive_style();
        let requests = app.continue_play();
        assert_eq!(requests.len(), 1);
        assert_eq!(app.continue_play(), Vec::new());
        assert!(app.state.last_error.is_some());
    }

    #[test]
    fn edits_outside_a_break_surface_an_error() {
        let mut app = live_app();
        app.on_quarter_loaded(quarter(1, (2, 0)));
        app.cycle_offensive_style();
        assert_eq!(app.state.last_error.as_deref(), Some("not at a quarter break"));
    }

    #[test]
    fn tabs_and_help() {
        let mut app = App::new(AppSettings::default());
        app.update_tab(MenuItem::BoxScore);
        app.update_tab(MenuItem::Help);
        app.exit_help();
        assert_eq!(app.state.active_tab, MenuItem::BoxScore);
    }
}
