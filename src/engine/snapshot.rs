use crate::engine::box_score::StatChange;
use crate::engine::events::DetectedEvent;
use crate::engine::playback::PlaybackSignal;
use courtside_api::{BallPose, Outcome, PlayerPose, TeamSide};
use std::collections::{BTreeMap, BTreeSet};

/// Everything the court view needs for one frame.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlaybackSnapshot {
    pub interpolated_positions: BTreeMap<String, PlayerPose>,
    pub interpolated_ball_position: BallPose,
    pub current_quarter: u8,
    pub current_home_score: u16,
    pub current_away_score: u16,
    pub is_quarter_break: bool,
    pub completed_quarter: Option<u8>,
    pub current_play_name: Option<String>,
    pub current_play_description: Option<String>,
    pub offense: Option<TeamSide>,
    pub possession_index: usize,
    pub possession_count: usize,
    pub time_within_possession: f32,
    pub possession_duration: f32,
    pub speed_multiplier: f32,
    pub is_playing: bool,
    pub is_live: bool,
    pub no_data: bool,
    pub on_court: BTreeSet<String>,
}

impl PlaybackSnapshot {
    /// 0.0..=1.0 through the loaded replay, for the progress gauge.
    pub fn progress(&self) -> f64 {
        if self.possession_count == 0 {
            return 0.0;
        }
        let within = if self.possession_duration > 0.0 {
            (self.time_within_possession / self.possession_duration) as f64
        } else {
            0.0
        };
        ((self.possession_index as f64 + within) / self.possession_count as f64).clamp(0.0, 1.0)
    }
}

/// One-shot animation triggers. Implementors play each once and discard it.
pub trait AnimationSink {
    fn trigger_score_animation(&mut self, points: u8, is_home: bool);

    fn trigger_defensive_animation_at_position(&mut self, x: f32, y: f32, kind: Outcome);

    fn trigger_stat_pops(&mut self, _changes: &[StatChange]) {}
}

/// Forward the animation-worthy signals of one tick to `sink`.
pub fn dispatch(signals: &[PlaybackSignal], sink: &mut dyn AnimationSink) {
    for signal in signals {
        match signal {
            PlaybackSignal::Event(DetectedEvent::BasketScored { side, points, .. }) => {
                sink.trigger_score_animation(*points, *side == TeamSide::Home)
            }
            PlaybackSignal::Event(DetectedEvent::DefensivePlay { kind, x, y, .. }) => {
                sink.trigger_defensive_animation_at_position(*x, *y, *kind)
            }
            PlaybackSignal::StatChanges(changes) => sink.trigger_stat_pops(changes),
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        scores: Vec<(u8, bool)>,
        defense: Vec<(f32, f32, Outcome)>,
    }

    impl AnimationSink for Recorder {
        fn trigger_score_animation(&mut self, points: u8, is_home: bool) {
            self.scores.push((points, is_home));
        }

        fn trigger_defensive_animation_at_position(&mut self, x: f32, y: f32, kind: Outcome) {
            self.defense.push((x, y, kind));
        }
    }

    #[test]
    fn dispatch_routes_events() {
        let mut sink = Recorder::default();
        dispatch(
            &[
                PlaybackSignal::PossessionBoundary { ended: 0 },
                PlaybackSignal::Event(DetectedEvent::BasketScored {
                    side: TeamSide::Away,
                    points: 3,
                    possession_index: 0,
                }),
                PlaybackSignal::Event(DetectedEvent::DefensivePlay {
                    kind: Outcome::Blocked,
                    x: 0.4,
                    y: 0.6,
                    possession_index: 1,
                    keyframe_index: 2,
                }),
            ],
            &mut sink,
        );
        assert_eq!(sink.scores, vec![(3, false)]);
        assert_eq!(sink.defense, vec![(0.4, 0.6, Outcome::Blocked)]);
    }

    #[test]
    fn progress_is_bounded() {
        let snap = PlaybackSnapshot {
            possession_index: 1,
            possession_count: 4,
            time_within_possession: 1.0,
            possession_duration: 2.0,
            ..Default::default()
        };
        assert!((snap.progress() - 0.375).abs() < 1e-9);
        assert_eq!(PlaybackSnapshot::default().progress(), 0.0);
    }
}
