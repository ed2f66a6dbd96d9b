use crate::engine::error::EngineError;
use courtside_api::client::map_animation;
use courtside_api::wire::AnimationPayload;
use courtside_api::{AnimationData, BallPose, Keyframe, Possession};
use log::{debug, warn};

/// Floor for a possession's playback length so a single-keyframe possession
/// still occupies at least one tick.
pub const MIN_POSSESSION_SECS: f32 = 0.25;

/// A game's possessions, normalized and indexed by position.
#[derive(Debug, Clone, Default)]
pub struct ReplayModel {
    possessions: Vec<Possession>,
    fixes: usize,
    starting_score: (u16, u16),
}

impl ReplayModel {
    pub fn new(data: AnimationData) -> Self {
        let mut model = Self {
            possessions: data.possessions,
            fixes: 0,
            starting_score: (0, 0),
        };
        model.normalize();
        if model.fixes > 0 {
            debug!("replay normalized with {} fixes", model.fixes);
        }
        model
    }

    /// Parse a raw `{possessions: [...]}` payload.
    pub fn from_json(json: &str) -> Result<Self, EngineError> {
        let payload: AnimationPayload = serde_json::from_str(json)?;
        Ok(Self::new(map_animation(payload)))
    }

    pub fn is_empty(&self) -> bool {
        self.possessions.is_empty()
    }

    pub fn len(&self) -> usize {
        self.possessions.len()
    }

    pub fn possessions(&self) -> &[Possession] {
        &self.possessions
    }

    pub fn possession(&self, index: usize) -> Option<&Possession> {
        self.possessions.get(index)
    }

    /// Number of corrections applied while normalizing the payload.
    pub fn fixes(&self) -> usize {
        self.fixes
    }

    pub fn duration(&self, index: usize) -> f32 {
        self.possessions
            .get(index)
            .and_then(|p| p.keyframes.last())
            .map_or(MIN_POSSESSION_SECS, |k| k.time.max(MIN_POSSESSION_SECS))
    }

    /// Index of the latest keyframe at or before `t`. Times before the first
    /// keyframe resolve to the first.
    pub fn keyframe_index_at(&self, index: usize, t: f32) -> Option<usize> {
        let keyframes = &self.possessions.get(index)?.keyframes;
        if keyframes.is_empty() {
            return None;
        }
        let after = keyframes.partition_point(|k| k.time <= t);
        Some(after.saturating_sub(1))
    }

    /// Score before possession `index` starts.
    pub fn score_before(&self, index: usize) -> (u16, u16) {
        match index.checked_sub(1).and_then(|i| self.possessions.get(i)) {
            Some(prev) => (prev.home_score, prev.away_score),
            None => self.starting_score,
        }
    }

    /// Shift every possession score by a starting score, turning
    /// quarter-relative scores into game totals.
    pub fn offset_scores(&mut self, home: u16, away: u16) {
        self.starting_score = (home, away);
        for possession in &mut self.possessions {
            possession.home_score = possession.home_score.saturating_add(home);
            possession.away_score = possession.away_score.saturating_add(away);
        }
    }

    pub fn quarter_of(&self, index: usize) -> Option<u8> {
        self.possessions.get(index).map(|p| p.quarter)
    }

    fn normalize(&mut self) {
        let mut fixes = 0;
        let mut last_score = (0u16, 0u16);
        let mut last_quarter = 0u8;

        for (idx, possession) in self.possessions.iter_mut().enumerate() {
            if possession.home_score < last_score.0 || possession.away_score < last_score.1 {
                warn!(
                    "possession {idx}: score {}-{} went backwards, holding {}-{}",
                    possession.home_score, possession.away_score, last_score.0, last_score.1
                );
                possession.home_score = possession.home_score.max(last_score.0);
                possession.away_score = possession.away_score.max(last_score.1);
                fixes += 1;
            }
            last_score = (possession.home_score, possession.away_score);

            if possession.quarter < last_quarter {
                warn!(
                    "possession {idx}: quarter {} after {last_quarter}, holding",
                    possession.quarter
                );
                possession.quarter = last_quarter;
                fixes += 1;
            }
            last_quarter = possession.quarter;

            fixes += normalize_keyframes(idx, &mut possession.keyframes);
        }

        self.fixes = fixes;
    }
}

fn normalize_keyframes(possession: usize, keyframes: &mut [Keyframe]) -> usize {
    let mut fixes = 0;
    let mut last_time = 0.0f32;
    for keyframe in keyframes.iter_mut() {
        if !keyframe.time.is_finite() || keyframe.time < 0.0 {
            keyframe.time = last_time;
            fixes += 1;
        }
        last_time = keyframe.time;
    }
    keyframes.sort_by(|a, b| a.time.total_cmp(&b.time));

    for (k_idx, keyframe) in keyframes.iter_mut().enumerate() {
        let before = keyframe.positions.len();
        keyframe
            .positions
            .retain(|_, pose| pose.x.is_finite() && pose.y.is_finite());
        fixes += before - keyframe.positions.len();

        for pose in keyframe.positions.values_mut() {
            let (x, y) = (pose.x.clamp(0.0, 1.0), pose.y.clamp(0.0, 1.0));
            if x != pose.x || y != pose.y {
                pose.x = x;
                pose.y = y;
                fixes += 1;
            }
        }

        let mut carrier_seen = false;
        for (id, pose) in keyframe.positions.iter_mut() {
            if !pose.has_ball {
                continue;
            }
            if carrier_seen {
                warn!("possession {possession} keyframe {k_idx}: second ball carrier {id} dropped");
                pose.has_ball = false;
                fixes += 1;
            }
            carrier_seen = true;
        }

        if !keyframe.ball.x.is_finite() || !keyframe.ball.y.is_finite() {
            keyframe.ball = BallPose::CENTER;
            fixes += 1;
        } else {
            keyframe.ball.x = keyframe.ball.x.clamp(0.0, 1.0);
            keyframe.ball.y = keyframe.ball.y.clamp(0.0, 1.0);
        }
    }
    fixes
}
