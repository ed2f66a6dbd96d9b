use crate::engine::replay::ReplayModel;
use courtside_api::{BallPose, Keyframe, Outcome, PlayerPose};
use std::collections::BTreeMap;

/// Player/ball state sampled between two keyframes.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Interpolation {
    pub positions: BTreeMap<String, PlayerPose>,
    pub ball: BallPose,
    /// Points scored so far in this possession. Jumps at the made-basket keyframe.
    pub home_score_delta: u16,
    pub away_score_delta: u16,
    /// Latest keyframe at or before the sampled time.
    pub keyframe_index: usize,
}

/// Sample possession `possession_index` at `t` seconds.
///
/// Returns `None` when the possession does not exist or has no keyframes;
/// callers hold their previous state in that case.
pub fn interpolate(replay: &ReplayModel, possession_index: usize, t: f32) -> Option<Interpolation> {
    let possession = replay.possession(possession_index)?;
    let keyframes = &possession.keyframes;
    let a_idx = replay.keyframe_index_at(possession_index, t)?;
    let b_idx = (a_idx + 1).min(keyframes.len() - 1);
    let (ka, kb) = (&keyframes[a_idx], &keyframes[b_idx]);

    let span = kb.time - ka.time;
    let factor = if b_idx == a_idx || span <= f32::EPSILON {
        0.0
    } else {
        ((t - ka.time) / span).clamp(0.0, 1.0)
    };

    let (before_home, before_away) = replay.score_before(possession_index);
    let basket_reached = keyframes
        .iter()
        .position(|k| k.outcome == Outcome::MadeBasket)
        .is_some_and(|m| m <= a_idx);
    let (home_score_delta, away_score_delta) = if basket_reached {
        (
            possession.home_score.saturating_sub(before_home),
            possession.away_score.saturating_sub(before_away),
        )
    } else {
        (0, 0)
    };

    Some(Interpolation {
        positions: blend_positions(ka, kb, factor),
        ball: lerp_ball(ball_anchor(ka), ball_anchor(kb), factor),
        home_score_delta,
        away_score_delta,
        keyframe_index: a_idx,
    })
}

/// Ball-carrier flags come from the nearer keyframe only, so at most one
/// player holds the ball. Players missing from one side are held in place.
fn blend_positions(ka: &Keyframe, kb: &Keyframe, factor: f32) -> BTreeMap<String, PlayerPose> {
    let nearer = if factor < 0.5 { ka } else { kb };
    let carries = |id: &str| nearer.positions.get(id).is_some_and(|p| p.has_ball);

    let mut out = BTreeMap::new();
    for (id, from) in &ka.positions {
        let pose = match kb.positions.get(id) {
            Some(to) => PlayerPose {
                x: lerp(from.x, to.x, factor),
                y: lerp(from.y, to.y, factor),
                has_ball: carries(id),
            },
            None => PlayerPose {
                has_ball: carries(id),
                ..*from
            },
        };
        out.insert(id.clone(), pose);
    }
    for (id, to) in &kb.positions {
        out.entry(id.clone()).or_insert(PlayerPose {
            has_ball: carries(id),
            ..*to
        });
    }
    out
}

fn ball_anchor(k: &Keyframe) -> BallPose {
    k.ball_carrier()
        .map(|(_, pose)| BallPose { x: pose.x, y: pose.y })
        .unwrap_or(k.ball)
}

fn lerp_ball(a: BallPose, b: BallPose, factor: f32) -> BallPose {
    BallPose {
        x: lerp(a.x, b.x, factor),
        y: lerp(a.y, b.y, factor),
    }
}

fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::replay::tests::{keyframe, possession, sample_replay};
    use courtside_api::{AnimationData, TeamSide};

    fn close(a: f32, b: f32) -> bool {
        (a - b).abs() < 1e-5
    }

    #[test]
    fn midpoint_is_linear() {
        let replay = sample_replay();
        let frame = interpolate(&replay, 0, 0.5).unwrap();
        // h1 moves from x=0.2 to x=0.3 between t=0 and t=1.
        assert!(close(frame.positions["h1"].x, 0.25));
        assert_eq!(frame.keyframe_index, 0);
    }

    #[test]
    fn past_the_end_clamps_to_last_pose() {
        let replay = sample_replay();
        let last = interpolate(&replay, 0, 2.0).unwrap();
        let beyond = interpolate(&replay, 0, 50.0).unwrap();
        assert_eq!(last, beyond);
        assert!(close(beyond.positions["h1"].x, 0.4));
    }

    #[test]
    fn seek_round_trip_reproduces_pose() {
        let replay = sample_replay();
        let start = interpolate(&replay, 1, 0.0).unwrap();
        let _end = interpolate(&replay, 1, replay.duration(1)).unwrap();
        let again = interpolate(&replay, 1, 0.0).unwrap();
        assert_eq!(start, again);
    }

    #[test]
    fn substituted_player_is_held_not_lerped() {
        let mut ka = keyframe(0.0, 0.0, Outcome::None);
        let mut kb = keyframe(2.0, 0.2, Outcome::None);
        let leaving = ka.positions.remove("h4").unwrap();
        let mut arriving = leaving;
        arriving.x = 0.9;
        kb.positions.remove("h4");
        ka.positions.insert("old".into(), leaving);
        kb.positions.insert("new".into(), arriving);

        let replay = ReplayModel::new(AnimationData {
            possessions: vec![possession(TeamSide::Home, 1, (0, 0), vec![ka, kb])],
        });
        let frame = interpolate(&replay, 0, 1.0).unwrap();
        assert_eq!(frame.positions["old"].x, leaving.x);
        assert_eq!(frame.positions["new"].x, 0.9);
    }

    #[test]
    fn score_jumps_at_made_basket_keyframe() {
        let replay = sample_replay();
        let before = interpolate(&replay, 0, 1.9).unwrap();
        assert_eq!((before.home_score_delta, before.away_score_delta), (0, 0));
        let after = interpolate(&replay, 0, 2.0).unwrap();
        assert_eq!((after.home_score_delta, after.away_score_delta), (2, 0));
    }

    #[test]
    fn ball_follows_carrier_then_falls_back() {
        let mut ka = keyframe(0.0, 0.0, Outcome::None);
        let mut kb = keyframe(1.0, 0.0, Outcome::None);
        ka.positions.get_mut("h0").unwrap().x = 0.0;
        for pose in kb.positions.values_mut() {
            pose.has_ball = false;
        }
        kb.ball = BallPose { x: 1.0, y: 0.1 };
        let replay = ReplayModel::new(AnimationData {
            possessions: vec![possession(TeamSide::Home, 1, (0, 0), vec![ka, kb])],
        });
        let frame = interpolate(&replay, 0, 0.5).unwrap();
        assert!(close(frame.ball.x, 0.5));
        let carriers = frame.positions.values().filter(|p| p.has_ball).count();
        assert_eq!(carriers, 0);
        let early = interpolate(&replay, 0, 0.2).unwrap();
        assert!(early.positions["h0"].has_ball);
    }

    #[test]
    fn missing_keyframes_yield_none() {
        let replay = ReplayModel::new(AnimationData {
            possessions: vec![possession(TeamSide::Home, 1, (0, 0), vec![])],
        });
        assert!(interpolate(&replay, 0, 0.0).is_none());
        assert!(interpolate(&replay, 3, 0.0).is_none());
    }
}
