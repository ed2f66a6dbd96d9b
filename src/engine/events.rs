use courtside_api::{BallPose, Keyframe, Outcome, Possession, TeamSide};
use log::debug;
use std::collections::HashSet;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DetectedEvent {
    BasketScored {
        side: TeamSide,
        /// 1 (free throw), 2 or 3.
        points: u8,
        possession_index: usize,
    },
    DefensivePlay {
        kind: Outcome,
        x: f32,
        y: f32,
        possession_index: usize,
        keyframe_index: usize,
    },
}

/// Classifies possession and keyframe transitions into one-shot events.
/// Never touches score or stats.
#[derive(Debug, Default)]
pub struct EventDetector {
    fired_keyframes: HashSet<(usize, usize)>,
    fired_boundaries: HashSet<usize>,
    last_possession: Option<usize>,
}

impl EventDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything. Called on every `load`.
    pub fn reset(&mut self) {
        self.fired_keyframes.clear();
        self.fired_boundaries.clear();
        self.last_possession = None;
    }

    /// Track the cursor's possession. Moving backward clears the fired set so
    /// re-entering a possession can trigger its events again.
    pub fn on_possession_index(&mut self, index: usize) {
        if self.last_possession.is_some_and(|last| index < last) {
            debug!("possession index moved back to {index}, re-arming events");
            self.fired_keyframes.clear();
            self.fired_boundaries.clear();
        }
        self.last_possession = Some(index);
    }

    /// Compare the just-ended possession against the score before it. A 1-3
    /// point change for exactly one side is a basket.
    pub fn on_possession_boundary(
        &mut self,
        index: usize,
        just_ended: &Possession,
        (prev_home, prev_away): (u16, u16),
    ) -> Option<DetectedEvent> {
        let home = just_ended.home_score.saturating_sub(prev_home);
        let away = just_ended.away_score.saturating_sub(prev_away);

        let (side, delta) = match (home, away) {
            (1..=3, 0) => (TeamSide::Home, home),
            (0, 1..=3) => (TeamSide::Away, away),
            (0, 0) => return None,
            _ => {
                debug!("possession {index}: ambiguous score change +{home}/+{away}, no basket event");
                return None;
            }
        };

        if !self.fired_boundaries.insert(index) {
            return None;
        }
        Some(DetectedEvent::BasketScored {
            side,
            points: delta as u8,
            possession_index: index,
        })
    }

    /// Defensive outcomes fire once per `(possession, keyframe)`.
    pub fn on_keyframe_advance(
        &mut self,
        possession_index: usize,
        keyframe_index: usize,
        keyframe: &Keyframe,
    ) -> Option<DetectedEvent> {
        if !keyframe.outcome.is_defensive() {
            return None;
        }
        if !self.fired_keyframes.insert((possession_index, keyframe_index)) {
            return None;
        }
        let at = keyframe
            .ball_carrier()
            .map(|(_, pose)| BallPose { x: pose.x, y: pose.y })
            .unwrap_or(keyframe.ball);
        let at = if at.x.is_finite() && at.y.is_finite() {
            at
        } else {
            BallPose::CENTER
        };
        Some(DetectedEvent::DefensivePlay {
            kind: keyframe.outcome,
            x: at.x,
            y: at.y,
            possession_index,
            keyframe_index,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::replay::tests::{keyframe, possession};

    #[test]
    fn two_point_home_basket_fires_once() {
        let mut detector = EventDetector::new();
        let prev = (10, 8);
        let ended = possession(
            TeamSide::Home,
            1,
            (12, 8),
            vec![keyframe(0.0, 0.0, Outcome::None), keyframe(1.0, 0.0, Outcome::MadeBasket)],
        );
        let first = detector.on_possession_boundary(4, &ended, prev);
        assert_eq!(
            first,
            Some(DetectedEvent::BasketScored {
                side: TeamSide::Home,
                points: 2,
                possession_index: 4
            })
        );
        assert_eq!(detector.on_possession_boundary(4, &ended, prev), None);
    }

    #[test]
    fn free_throw_and_three_for_away() {
        let mut detector = EventDetector::new();
        let ft = possession(TeamSide::Away, 1, (0, 1), vec![]);
        let three = possession(TeamSide::Away, 1, (0, 4), vec![]);
        assert!(matches!(
            detector.on_possession_boundary(1, &ft, (0, 0)),
            Some(DetectedEvent::BasketScored { side: TeamSide::Away, points: 1, .. })
        ));
        assert!(matches!(
            detector.on_possession_boundary(2, &three, (0, 1)),
            Some(DetectedEvent::BasketScored { side: TeamSide::Away, points: 3, .. })
        ));
    }

    #[test]
    fn both_sides_or_big_jumps_are_ignored() {
        let mut detector = EventDetector::new();
        let both = possession(TeamSide::Home, 1, (2, 2), vec![]);
        let jump = possession(TeamSide::Home, 1, (5, 0), vec![]);
        let quiet = possession(TeamSide::Home, 1, (7, 7), vec![]);
        assert_eq!(detector.on_possession_boundary(1, &both, (0, 0)), None);
        assert_eq!(detector.on_possession_boundary(1, &jump, (0, 0)), None);
        assert_eq!(detector.on_possession_boundary(1, &quiet, (7, 7)), None);
    }

    #[test]
    fn steal_fires_once_at_carrier_position() {
        let mut detector = EventDetector::new();
        let k = keyframe(1.0, 0.0, Outcome::Stolen);
        let carrier = k.positions["h0"];
        let event = detector.on_keyframe_advance(3, 5, &k);
        assert_eq!(
            event,
            Some(DetectedEvent::DefensivePlay {
                kind: Outcome::Stolen,
                x: carrier.x,
                y: carrier.y,
                possession_index: 3,
                keyframe_index: 5,
            })
        );
        // Same tick recomputed, e.g. after a speed change.
        detector.on_possession_index(3);
        assert_eq!(detector.on_keyframe_advance(3, 5, &k), None);
    }

    #[test]
    fn moving_back_rearms_events() {
        let mut detector = EventDetector::new();
        let k = keyframe(1.0, 0.0, Outcome::Blocked);
        detector.on_possession_index(3);
        assert!(detector.on_keyframe_advance(3, 1, &k).is_some());
        detector.on_possession_index(4);
        assert!(detector.on_keyframe_advance(3, 1, &k).is_none());
        detector.on_possession_index(2);
        detector.on_possession_index(3);
        assert!(detector.on_keyframe_advance(3, 1, &k).is_some());
    }

    #[test]
    fn non_defensive_outcomes_are_ignored() {
        let mut detector = EventDetector::new();
        for outcome in [Outcome::None, Outcome::Foul, Outcome::Rebound, Outcome::MadeBasket] {
            assert!(detector
                .on_keyframe_advance(0, 0, &keyframe(0.0, 0.0, outcome))
                .is_none());
        }
    }

    #[test]
    fn carrierless_keyframe_uses_ball_pose() {
        let mut detector = EventDetector::new();
        let mut k = keyframe(0.0, 0.0, Outcome::Turnover);
        for pose in k.positions.values_mut() {
            pose.has_ball = false;
        }
        k.ball = BallPose { x: 0.7, y: 0.3 };
        assert!(matches!(
            detector.on_keyframe_advance(0, 0, &k),
            Some(DetectedEvent::DefensivePlay { x, y, .. }) if x == 0.7 && y == 0.3
        ));
    }
}
