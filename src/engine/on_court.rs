use courtside_api::{PlayerGameStat, PlayerPose, TeamSide};
use log::debug;
use std::collections::{BTreeMap, BTreeSet};

/// Five per side.
pub const FULL_COURT: usize = 10;

/// Which 10 players are on the floor, with a cache-last-good policy so the
/// roster does not flicker while keyframe data is sparse.
#[derive(Debug, Default)]
pub struct OnCourtTracker {
    current: BTreeSet<String>,
    last_good: Option<BTreeSet<String>>,
    source: OnCourtSource,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OnCourtSource {
    Keyframe,
    Interpolated,
    Cached,
    #[default]
    Empty,
}

impl OnCourtTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Re-derive from this tick's keyframe and interpolated maps.
    pub fn refresh(
        &mut self,
        keyframe: Option<&BTreeMap<String, PlayerPose>>,
        interpolated: Option<&BTreeMap<String, PlayerPose>>,
    ) {
        let complete = |map: Option<&BTreeMap<String, PlayerPose>>| {
            map.filter(|m| m.len() >= FULL_COURT)
                .map(|m| m.keys().cloned().collect::<BTreeSet<_>>())
        };

        if let Some(ids) = complete(keyframe) {
            self.accept(ids, OnCourtSource::Keyframe);
        } else if let Some(ids) = complete(interpolated) {
            self.accept(ids, OnCourtSource::Interpolated);
        } else if let Some(cached) = &self.last_good {
            if self.source != OnCourtSource::Cached {
                debug!("on-court data sparse, holding last known five-on-five");
            }
            self.current = cached.clone();
            self.source = OnCourtSource::Cached;
        } else {
            self.current.clear();
            self.source = OnCourtSource::Empty;
        }
    }

    fn accept(&mut self, ids: BTreeSet<String>, source: OnCourtSource) {
        self.last_good = Some(ids.clone());
        self.current = ids;
        self.source = source;
    }

    pub fn current_on_court_ids(&self) -> &BTreeSet<String> {
        &self.current
    }

    pub fn source(&self) -> OnCourtSource {
        self.source
    }

    /// Restrict the user's own players to the lineup they chose. Opponents are
    /// left as tracked.
    pub fn confirmed_with_lineup(
        &self,
        is_own_player: impl Fn(&str) -> bool,
        lineup: &BTreeSet<String>,
    ) -> BTreeSet<String> {
        self.current
            .iter()
            .filter(|id| !is_own_player(id.as_str()) || lineup.contains(id.as_str()))
            .cloned()
            .collect()
    }
}

/// Best-effort guess when nothing has been tracked yet: the five players per
/// side with the most minutes. A heuristic, not a guarantee.
pub fn minutes_fallback<'a>(players: impl Iterator<Item = &'a PlayerGameStat>) -> BTreeSet<String> {
    let mut by_side: BTreeMap<TeamSide, Vec<&PlayerGameStat>> = BTreeMap::new();
    for p in players {
        by_side.entry(p.side).or_default().push(p);
    }
    by_side
        .into_values()
        .flat_map(|mut side| {
            side.sort_by(|a, b| {
                b.stats
                    .minutes
                    .total_cmp(&a.stats.minutes)
                    .then_with(|| a.player_id.cmp(&b.player_id))
            });
            side.into_iter().take(FULL_COURT / 2)
        })
        .map(|p| p.player_id.clone())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::replay::tests::full_positions;
    use courtside_api::StatLine;

    #[test]
    fn full_keyframe_wins() {
        let mut tracker = OnCourtTracker::new();
        let full = full_positions(0.0, None);
        tracker.refresh(Some(&full), None);
        assert_eq!(tracker.current_on_court_ids().len(), 10);
        assert_eq!(tracker.source(), OnCourtSource::Keyframe);
    }

    #[test]
    fn interpolated_map_is_second_choice() {
        let mut tracker = OnCourtTracker::new();
        let mut sparse = full_positions(0.0, None);
        sparse.retain(|id, _| id.starts_with('h'));
        let full = full_positions(0.0, None);
        tracker.refresh(Some(&sparse), Some(&full));
        assert_eq!(tracker.source(), OnCourtSource::Interpolated);
        assert_eq!(tracker.current_on_court_ids().len(), 10);
    }

    #[test]
    fn sparse_tick_holds_last_good_set() {
        let mut tracker = OnCourtTracker::new();
        let full = full_positions(0.0, None);
        tracker.refresh(Some(&full), None);
        let mut sparse = full.clone();
        sparse.retain(|id, _| id == "h0" || id == "a0");
        for _ in 0..5 {
            tracker.refresh(Some(&sparse), Some(&sparse));
            assert_eq!(tracker.current_on_court_ids().len(), 10);
        }
        assert_eq!(tracker.source(), OnCourtSource::Cached);
    }

    #[test]
    fn nothing_ever_seen_is_empty() {
        let mut tracker = OnCourtTracker::new();
        tracker.refresh(None, None);
        assert!(tracker.current_on_court_ids().is_empty());
        assert_eq!(tracker.source(), OnCourtSource::Empty);
    }

    #[test]
    fn reset_forgets_cache() {
        let mut tracker = OnCourtTracker::new();
        tracker.refresh(Some(&full_positions(0.0, None)), None);
        tracker.reset();
        tracker.refresh(None, None);
        assert!(tracker.current_on_court_ids().is_empty());
    }

    #[test]
    fn lineup_filters_only_own_players() {
        let mut tracker = OnCourtTracker::new();
        tracker.refresh(Some(&full_positions(0.0, None)), None);
        let lineup: BTreeSet<String> = ["h0", "h1", "h2", "h3"].iter().map(|s| s.to_string()).collect();
        let confirmed = tracker.confirmed_with_lineup(|id| id.starts_with('h'), &lineup);
        assert_eq!(confirmed.len(), 9);
        assert!(!confirmed.contains("h4"));
        assert!(confirmed.contains("a4"));
    }

    #[test]
    fn minutes_fallback_takes_top_five_per_side() {
        let players: Vec<PlayerGameStat> = (0..7)
            .flat_map(|i| {
                [TeamSide::Home, TeamSide::Away].map(|side| PlayerGameStat {
                    player_id: format!("{}{i}", side.label()),
                    side,
                    stats: StatLine {
                        minutes: i as f32,
                        ..Default::default()
                    },
                    ..Default::default()
                })
            })
            .collect();
        let ids = minutes_fallback(players.iter());
        assert_eq!(ids.len(), 10);
        assert!(ids.contains("Home6"));
        assert!(!ids.contains("Away1"));
    }
}
