use courtside_api::{BoxScore, PlayerGameStat, Possession, StatDelta, StatLine, TeamSide};
use log::debug;
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatColumn {
    Name,
    #[default]
    Minutes,
    Points,
    Rebounds,
    Assists,
    Steals,
    Blocks,
    Turnovers,
    FieldGoals,
    Threes,
    FreeThrows,
}

impl StatColumn {
    pub const ALL: [StatColumn; 11] = [
        StatColumn::Name,
        StatColumn::Minutes,
        StatColumn::Points,
        StatColumn::Rebounds,
        StatColumn::Assists,
        StatColumn::Steals,
        StatColumn::Blocks,
        StatColumn::Turnovers,
        StatColumn::FieldGoals,
        StatColumn::Threes,
        StatColumn::FreeThrows,
    ];

    /// Columns that produce stat-pop animations.
    pub const COUNTING: [StatColumn; 6] = [
        StatColumn::Points,
        StatColumn::Rebounds,
        StatColumn::Assists,
        StatColumn::Steals,
        StatColumn::Blocks,
        StatColumn::Turnovers,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            StatColumn::Name => "NAME",
            StatColumn::Minutes => "MIN",
            StatColumn::Points => "PTS",
            StatColumn::Rebounds => "REB",
            StatColumn::Assists => "AST",
            StatColumn::Steals => "STL",
            StatColumn::Blocks => "BLK",
            StatColumn::Turnovers => "TO",
            StatColumn::FieldGoals => "FG",
            StatColumn::Threes => "3PT",
            StatColumn::FreeThrows => "FT",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|c| *c == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }

    fn value(&self, line: &StatLine) -> f32 {
        match self {
            StatColumn::Name => 0.0,
            StatColumn::Minutes => line.minutes,
            StatColumn::Points => f32::from(line.points),
            StatColumn::Rebounds => f32::from(line.rebounds),
            StatColumn::Assists => f32::from(line.assists),
            StatColumn::Steals => f32::from(line.steals),
            StatColumn::Blocks => f32::from(line.blocks),
            StatColumn::Turnovers => f32::from(line.turnovers),
            StatColumn::FieldGoals => f32::from(line.fg_made),
            StatColumn::Threes => f32::from(line.three_made),
            StatColumn::FreeThrows => f32::from(line.ft_made),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

impl SortDirection {
    pub fn flip(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// One stat-pop instruction for the renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatChange {
    pub player_id: String,
    pub stat: StatColumn,
    pub delta: i32,
}

/// Per-player lines at a point in time, for diffing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxScoreSnapshot(BTreeMap<String, StatLine>);

/// Running box score. Possession deltas are keyed by possession index so
/// re-applying is idempotent and seeking back can roll them off.
#[derive(Debug, Default)]
pub struct BoxScoreAggregator {
    /// Identity plus stats carried in from earlier quarters.
    base: BTreeMap<String, PlayerGameStat>,
    applied: BTreeMap<usize, Vec<StatDelta>>,
    current: BTreeMap<String, PlayerGameStat>,
}

impl BoxScoreAggregator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new game with the given roster identities.
    pub fn reset_with_roster(&mut self, players: impl IntoIterator<Item = PlayerGameStat>) {
        self.base = players
            .into_iter()
            .map(|p| (p.player_id.clone(), p))
            .collect();
        self.applied.clear();
        self.recompute();
    }

    /// Fold this replay's possessions into the base so the next replay's
    /// possession indices start fresh.
    pub fn begin_replay(&mut self) {
        self.base = std::mem::take(&mut self.current);
        self.applied.clear();
        self.recompute();
    }

    /// Replace everything with an authoritative final box score.
    pub fn replace_with_final(&mut self, final_box: &BoxScore) {
        self.reset_with_roster(final_box.players().cloned());
    }

    pub fn apply_possession(&mut self, index: usize, possession: &Possession) {
        if self.applied.contains_key(&index) {
            debug!("possession {index} already applied to box score");
        }
        self.applied.insert(index, possession.player_stats.clone());
        self.recompute();
    }

    /// Drop contributions from possession `index` onward.
    pub fn rollback_from(&mut self, index: usize) {
        let removed = self.applied.split_off(&index);
        if !removed.is_empty() {
            self.recompute();
        }
    }

    pub fn is_applied(&self, index: usize) -> bool {
        self.applied.contains_key(&index)
    }

    pub fn player(&self, player_id: &str) -> Option<&PlayerGameStat> {
        self.current.get(player_id)
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerGameStat> {
        self.current.values()
    }

    pub fn totals(&self, side: TeamSide) -> StatLine {
        let mut total = StatLine::default();
        for p in self.current.values().filter(|p| p.side == side) {
            total.add(&p.stats);
        }
        total
    }

    /// Players for `side` sorted by `column`. When `on_court` is given, those
    /// players always come first. Ties break on minutes played (descending),
    /// or alphabetically when sorting by name.
    pub fn sorted_players(
        &self,
        side: TeamSide,
        column: StatColumn,
        direction: SortDirection,
        on_court: Option<&BTreeSet<String>>,
    ) -> Vec<&PlayerGameStat> {
        let mut players: Vec<&PlayerGameStat> =
            self.current.values().filter(|p| p.side == side).collect();

        players.sort_by(|a, b| {
            let court = match on_court {
                Some(ids) => ids
                    .contains(&b.player_id)
                    .cmp(&ids.contains(&a.player_id)),
                None => Ordering::Equal,
            };
            let primary = match column {
                StatColumn::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
                _ => column.value(&a.stats).total_cmp(&column.value(&b.stats)),
            };
            let primary = match direction {
                SortDirection::Ascending => primary,
                SortDirection::Descending => primary.reverse(),
            };
            let tie = match column {
                StatColumn::Name => a.player_id.cmp(&b.player_id),
                _ => b
                    .stats
                    .minutes
                    .total_cmp(&a.stats.minutes)
                    .then_with(|| a.name.cmp(&b.name)),
            };
            court.then(primary).then(tie)
        });
        players
    }

    /// Current lines in wire shape, for the post-game view when no
    /// authoritative final box score was received.
    pub fn to_box_score(&self) -> BoxScore {
        let (home, away) = self
            .current
            .values()
            .cloned()
            .partition(|p| p.side == TeamSide::Home);
        BoxScore { home, away }
    }

    pub fn snapshot(&self) -> BoxScoreSnapshot {
        BoxScoreSnapshot(
            self.current
                .iter()
                .map(|(id, p)| (id.clone(), p.stats))
                .collect(),
        )
    }

    /// Counting-stat changes since `previous`, for stat-pop animations.
    pub fn diff(&self, previous: &BoxScoreSnapshot) -> Vec<StatChange> {
        let mut changes = Vec::new();
        for (id, player) in &self.current {
            let before = previous.0.get(id).copied().unwrap_or_default();
            for stat in StatColumn::COUNTING {
                let delta = stat.value(&player.stats) as i32 - stat.value(&before) as i32;
                if delta != 0 {
                    changes.push(StatChange {
                        player_id: id.clone(),
                        stat,
                        delta,
                    });
                }
            }
        }
        changes
    }

    fn recompute(&mut self) {
        let mut current = self.base.clone();
        for delta in self.applied.values().flatten() {
            let entry = current
                .entry(delta.player_id.clone())
                .or_insert_with(|| PlayerGameStat {
                    player_id: delta.player_id.clone(),
                    name: delta.player_id.clone(),
                    side: delta.side,
                    ..Default::default()
                });
            entry.stats.add(&delta.line);
        }
        self.current = current;
    }
}
