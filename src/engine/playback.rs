use crate::engine::box_score::{BoxScoreAggregator, StatChange};
use crate::engine::events::{DetectedEvent, EventDetector};
use crate::engine::interpolate::{Interpolation, interpolate};
use crate::engine::on_court::OnCourtTracker;
use crate::engine::replay::ReplayModel;
use crate::engine::snapshot::PlaybackSnapshot;
use log::{debug, info, warn};
use std::time::Duration;

pub const SPEED_PRESETS: [f32; 4] = [0.5, 1.0, 2.0, 4.0];
pub const MIN_SPEED: f32 = 0.25;
pub const MAX_SPEED: f32 = 8.0;

/// The single "where are we" pointer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlaybackCursor {
    pub possession_index: usize,
    pub time_within_possession: f32,
    pub speed_multiplier: f32,
    pub is_playing: bool,
}

impl Default for PlaybackCursor {
    fn default() -> Self {
        Self {
            possession_index: 0,
            time_within_possession: 0.0,
            speed_multiplier: 1.0,
            is_playing: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LoadOptions {
    pub is_live: bool,
    pub quarter: u8,
    /// Score before the first possession. Live payload scores are
    /// quarter-relative and get shifted by this on load.
    pub starting_home_score: u16,
    pub starting_away_score: u16,
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlaybackSignal {
    /// Loaded payload has no possessions.
    NoData,
    PossessionBoundary { ended: usize },
    Event(DetectedEvent),
    StatChanges(Vec<StatChange>),
    /// Playback paused at the end of a quarter. `end_of_replay` is set when
    /// there is nothing left in the loaded payload.
    QuarterExhausted { quarter: u8, end_of_replay: bool },
    Deferred(DeferredEffect),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeferredEffect {
    Notice(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeferredId(u64);

/// Tick-driven one-shot effects. Cancelling removes them outright.
#[derive(Debug, Default)]
pub struct DeferredQueue {
    now: Duration,
    next_id: u64,
    pending: Vec<(Duration, DeferredId, DeferredEffect)>,
}

impl DeferredQueue {
    pub fn schedule(&mut self, delay: Duration, effect: DeferredEffect) -> DeferredId {
        let id = DeferredId(self.next_id);
        self.next_id += 1;
        self.pending.push((self.now + delay, id, effect));
        id
    }

    pub fn cancel(&mut self, id: DeferredId) {
        self.pending.retain(|(_, pending, _)| *pending != id);
    }

    pub fn cancel_all(&mut self) {
        self.pending.clear();
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Advance the clock and release due effects in due order.
    pub fn advance(&mut self, elapsed: Duration) -> Vec<DeferredEffect> {
        self.now += elapsed;
        let now = self.now;
        let mut due: Vec<_> = Vec::new();
        self.pending.retain(|entry| {
            if entry.0 <= now {
                due.push(entry.clone());
                false
            } else {
                true
            }
        });
        due.sort_by_key(|(at, id, _)| (*at, id.0));
        due.into_iter().map(|(_, _, effect)| effect).collect()
    }
}

/// Owns playback time and drives the interpolator, event detector, on-court
/// tracker and box score once per tick.
#[derive(Debug, Default)]
pub struct PlaybackController {
    replay: ReplayModel,
    cursor: PlaybackCursor,
    opts: LoadOptions,
    detector: EventDetector,
    on_court: OnCourtTracker,
    box_score: BoxScoreAggregator,
    deferred: DeferredQueue,
    frame: Option<Interpolation>,
    score: (u16, u16),
    last_keyframe: Option<usize>,
    /// Paused at the end of `cursor.possession_index`, waiting on a quarter break.
    held: bool,
    stopped: bool,
}

impl PlaybackController {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace all playback state with `replay`. Box-score totals from the
    /// previous replay carry forward; use `box_score_mut` to reset for a new game.
    pub fn load(&mut self, replay: ReplayModel, opts: LoadOptions) -> Vec<PlaybackSignal> {
        let speed = self.cursor.speed_multiplier;
        let mut replay = replay;
        if opts.is_live {
            replay.offset_scores(opts.starting_home_score, opts.starting_away_score);
        }
        self.replay = replay;
        self.opts = opts;
        self.cursor = PlaybackCursor {
            speed_multiplier: speed,
            ..PlaybackCursor::default()
        };
        self.detector.reset();
        self.on_court.reset();
        self.box_score.begin_replay();
        self.deferred.cancel_all();
        self.frame = None;
        self.score = (opts.starting_home_score, opts.starting_away_score);
        self.last_keyframe = None;
        self.held = false;
        self.stopped = false;

        if self.replay.is_empty() {
            warn!("loaded replay has no possessions");
            return vec![PlaybackSignal::NoData];
        }
        info!(
            "loaded {} possessions (quarter {}, live: {})",
            self.replay.len(),
            opts.quarter,
            opts.is_live
        );
        let mut signals = Vec::new();
        self.enter_possession(0, &mut signals);
        signals
    }

    pub fn play(&mut self) {
        if !self.is_active() {
            return;
        }
        if self.held {
            let next = self.cursor.possession_index + 1;
            if next >= self.replay.len() {
                debug!("play ignored: replay exhausted");
                return;
            }
            let mut signals = Vec::new();
            self.enter_possession(next, &mut signals);
        }
        self.cursor.is_playing = true;
    }

    pub fn pause(&mut self) {
        if self.stopped {
            return;
        }
        self.cursor.is_playing = false;
    }

    pub fn toggle_play_pause(&mut self) {
        if self.cursor.is_playing {
            self.pause();
        } else {
            self.play();
        }
    }

    /// Halt and cancel anything scheduled. Every later call except `load` is a no-op.
    pub fn stop(&mut self) {
        self.cursor.is_playing = false;
        self.deferred.cancel_all();
        self.stopped = true;
    }

    /// Move within the current possession. Does not change play/pause.
    pub fn seek(&mut self, time_offset: f32) -> Vec<PlaybackSignal> {
        let mut signals = Vec::new();
        if !self.is_active() || !time_offset.is_finite() {
            return signals;
        }
        let idx = self.cursor.possession_index;
        let t = time_offset.clamp(0.0, self.replay.duration(idx));
        if t < self.cursor.time_within_possession {
            self.last_keyframe = self.replay.keyframe_index_at(idx, t);
        }
        if t < self.replay.duration(idx) {
            self.held = false;
        }
        self.cursor.time_within_possession = t;
        self.refresh(&mut signals);
        signals
    }

    pub fn set_speed(&mut self, multiplier: f32) {
        if self.stopped || !multiplier.is_finite() || multiplier <= 0.0 {
            return;
        }
        self.cursor.speed_multiplier = multiplier.clamp(MIN_SPEED, MAX_SPEED);
    }

    pub fn cycle_speed(&mut self) {
        let current = self.cursor.speed_multiplier;
        let next = SPEED_PRESETS
            .iter()
            .copied()
            .find(|s| *s > current + f32::EPSILON)
            .unwrap_or(SPEED_PRESETS[0]);
        self.set_speed(next);
    }

    /// Commit the current possession and jump to the start of the next one.
    pub fn next_possession(&mut self) -> Vec<PlaybackSignal> {
        let mut signals = Vec::new();
        if !self.is_active() {
            return signals;
        }
        if self.held {
            self.play_from_hold(&mut signals);
            return signals;
        }
        let idx = self.cursor.possession_index;
        self.cursor.time_within_possession = self.replay.duration(idx);
        self.last_keyframe = self.replay.keyframe_index_at(idx, self.cursor.time_within_possession);
        self.refresh(&mut signals);
        self.finish_possession(&mut signals);
        signals
    }

    /// Go back one possession (or to the start of the current one when at
    /// the first). Box-score contributions at or after the new cursor are removed.
    pub fn previous_possession(&mut self) -> Vec<PlaybackSignal> {
        let mut signals = Vec::new();
        if !self.is_active() {
            return signals;
        }
        let target = self.cursor.possession_index.saturating_sub(1);
        self.box_score.rollback_from(target);
        if target == self.cursor.possession_index {
            self.detector.reset();
        }
        self.enter_possession(target, &mut signals);
        signals
    }

    /// Advance playback time. Called from the scheduler at a fixed rate.
    pub fn tick(&mut self, elapsed: Duration) -> Vec<PlaybackSignal> {
        let mut signals = Vec::new();
        if self.stopped {
            return signals;
        }
        signals.extend(
            self.deferred
                .advance(elapsed)
                .into_iter()
                .map(PlaybackSignal::Deferred),
        );
        if !self.cursor.is_playing || self.replay.is_empty() || self.held {
            return signals;
        }

        let idx = self.cursor.possession_index;
        let duration = self.replay.duration(idx);
        let advanced =
            self.cursor.time_within_possession + elapsed.as_secs_f32() * self.cursor.speed_multiplier;
        self.cursor.time_within_possession = advanced.min(duration);
        self.refresh(&mut signals);
        if advanced >= duration {
            self.finish_possession(&mut signals);
        }
        signals
    }

    pub fn schedule(&mut self, delay: Duration, effect: DeferredEffect) -> Option<DeferredId> {
        if self.stopped {
            return None;
        }
        Some(self.deferred.schedule(delay, effect))
    }

    pub fn cancel_deferred(&mut self, id: DeferredId) {
        self.deferred.cancel(id);
    }

    pub fn is_active(&self) -> bool {
        !self.stopped && !self.replay.is_empty()
    }

    /// Paused at a quarter boundary.
    pub fn is_held(&self) -> bool {
        self.held
    }

    pub fn cursor(&self) -> PlaybackCursor {
        self.cursor
    }

    pub fn score(&self) -> (u16, u16) {
        self.score
    }

    /// Authoritative final score from the backend. Playback stays where it is.
    pub fn set_final_score(&mut self, home: u16, away: u16) {
        self.score = (home, away);
    }

    pub fn on_court(&self) -> &OnCourtTracker {
        &self.on_court
    }

    pub fn box_score(&self) -> &BoxScoreAggregator {
        &self.box_score
    }

    pub fn box_score_mut(&mut self) -> &mut BoxScoreAggregator {
        &mut self.box_score
    }

    pub fn pending_deferred(&self) -> usize {
        self.deferred.len()
    }

    pub fn current_quarter(&self) -> u8 {
        if self.opts.is_live {
            return self.opts.quarter.max(1);
        }
        self.replay
            .quarter_of(self.cursor.possession_index)
            .unwrap_or(self.opts.quarter)
            .max(1)
    }

    pub fn snapshot(&self) -> PlaybackSnapshot {
        let idx = self.cursor.possession_index;
        let possession = self.replay.possession(idx);
        let keyframe = self
            .frame
            .as_ref()
            .and_then(|f| possession.and_then(|p| p.keyframes.get(f.keyframe_index)));
        PlaybackSnapshot {
            interpolated_positions: self
                .frame
                .as_ref()
                .map(|f| f.positions.clone())
                .unwrap_or_default(),
            interpolated_ball_position: self.frame.as_ref().map(|f| f.ball).unwrap_or_default(),
            current_quarter: self.current_quarter(),
            current_home_score: self.score.0,
            current_away_score: self.score.1,
            is_quarter_break: false,
            completed_quarter: None,
            current_play_name: possession.and_then(|p| p.play_name.clone()),
            current_play_description: keyframe
                .and_then(|k| k.description.clone())
                .or_else(|| possession.and_then(|p| p.description.clone())),
            offense: possession.map(|p| p.team),
            possession_index: idx,
            possession_count: self.replay.len(),
            time_within_possession: self.cursor.time_within_possession,
            possession_duration: self.replay.duration(idx),
            speed_multiplier: self.cursor.speed_multiplier,
            is_playing: self.cursor.is_playing,
            is_live: self.opts.is_live,
            no_data: self.replay.is_empty(),
            on_court: self.on_court.current_on_court_ids().clone(),
        }
    }

    fn play_from_hold(&mut self, signals: &mut Vec<PlaybackSignal>) {
        let next = self.cursor.possession_index + 1;
        if next < self.replay.len() {
            self.enter_possession(next, signals);
        }
    }

    fn enter_possession(&mut self, index: usize, signals: &mut Vec<PlaybackSignal>) {
        self.cursor.possession_index = index;
        self.cursor.time_within_possession = 0.0;
        self.last_keyframe = None;
        self.held = false;
        self.detector.on_possession_index(index);
        self.refresh(signals);
    }

    /// Re-sample the cursor, fire keyframe events in order, and refresh the
    /// on-court view. Missing keyframe data holds the previous frame and score.
    fn refresh(&mut self, signals: &mut Vec<PlaybackSignal>) {
        let idx = self.cursor.possession_index;
        let t = self.cursor.time_within_possession;
        let Some(possession) = self.replay.possession(idx) else {
            return;
        };

        if let Some(k) = self.replay.keyframe_index_at(idx, t) {
            let from = self.last_keyframe.map_or(0, |last| last + 1);
            for ki in from..=k {
                if let Some(event) =
                    self.detector
                        .on_keyframe_advance(idx, ki, &possession.keyframes[ki])
                {
                    signals.push(PlaybackSignal::Event(event));
                }
            }
            self.last_keyframe = Some(self.last_keyframe.map_or(k, |last| last.max(k)));
        }

        match interpolate(&self.replay, idx, t) {
            Some(frame) => {
                let reached_basket = frame.home_score_delta > 0 || frame.away_score_delta > 0;
                self.score = if reached_basket || t >= self.replay.duration(idx) {
                    (possession.home_score, possession.away_score)
                } else {
                    self.replay.score_before(idx)
                };
                let keyframe_positions = possession
                    .keyframes
                    .get(frame.keyframe_index)
                    .map(|k| &k.positions);
                self.on_court
                    .refresh(keyframe_positions, Some(&frame.positions));
                self.frame = Some(frame);
            }
            None => {
                debug!("possession {idx} has no keyframes, holding previous frame");
                self.on_court.refresh(None, None);
            }
        }
    }

    fn finish_possession(&mut self, signals: &mut Vec<PlaybackSignal>) {
        let idx = self.cursor.possession_index;
        let Some(possession) = self.replay.possession(idx) else {
            return;
        };

        let stats_before = self.box_score.snapshot();
        self.box_score.apply_possession(idx, possession);
        let changes = self.box_score.diff(&stats_before);
        if !changes.is_empty() {
            signals.push(PlaybackSignal::StatChanges(changes));
        }

        let before = self.replay.score_before(idx);
        if let Some(event) = self.detector.on_possession_boundary(idx, possession, before) {
            signals.push(PlaybackSignal::Event(event));
        }
        self.score = (possession.home_score, possession.away_score);
        signals.push(PlaybackSignal::PossessionBoundary { ended: idx });

        let quarter = self.current_quarter();
        let ended_quarter = possession.quarter;
        let next = idx + 1;
        match self.replay.quarter_of(next) {
            None => {
                self.cursor.is_playing = false;
                self.held = true;
                info!("replay exhausted after possession {idx}");
                signals.push(PlaybackSignal::QuarterExhausted {
                    quarter,
                    end_of_replay: true,
                });
            }
            Some(next_quarter) if !self.opts.is_live && next_quarter != ended_quarter => {
                self.cursor.is_playing = false;
                self.held = true;
                info!("end of quarter {quarter}");
                signals.push(PlaybackSignal::QuarterExhausted {
                    quarter,
                    end_of_replay: false,
                });
            }
            Some(_) => self.enter_possession(next, signals),
        }
    }
}
