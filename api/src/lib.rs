pub mod client;
pub mod wire;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ---------------------------------------------------------------------------
// Domain types, independent of the backend wire format
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TeamSide {
    #[default]
    Home,
    Away,
}

impl TeamSide {
    pub fn opposite(self) -> Self {
        match self {
            TeamSide::Home => TeamSide::Away,
            TeamSide::Away => TeamSide::Home,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TeamSide::Home => "Home",
            TeamSide::Away => "Away",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "home" => Some(TeamSide::Home),
            "away" => Some(TeamSide::Away),
            _ => None,
        }
    }
}

/// Lineup slot / roster position. Ordered the way box scores list starters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Position {
    PG,
    SG,
    SF,
    PF,
    C,
}

impl Position {
    pub const ALL: [Position; 5] = [
        Position::PG,
        Position::SG,
        Position::SF,
        Position::PF,
        Position::C,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Position::PG => "PG",
            Position::SG => "SG",
            Position::SF => "SF",
            Position::PF => "PF",
            Position::C => "C",
        }
    }

    pub fn index(&self) -> usize {
        match self {
            Position::PG => 0,
            Position::SG => 1,
            Position::SF => 2,
            Position::PF => 3,
            Position::C => 4,
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PG" => Some(Position::PG),
            "SG" => Some(Position::SG),
            "SF" => Some(Position::SF),
            "PF" => Some(Position::PF),
            "C" => Some(Position::C),
            _ => None,
        }
    }
}

/// Normalized court coordinates, both axes in 0..1.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerPose {
    pub x: f32,
    pub y: f32,
    pub has_ball: bool,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BallPose {
    pub x: f32,
    pub y: f32,
}

impl BallPose {
    pub const CENTER: BallPose = BallPose { x: 0.5, y: 0.5 };
}

impl Default for BallPose {
    fn default() -> Self {
        Self::CENTER
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Outcome {
    #[default]
    None,
    MadeBasket,
    Blocked,
    Stolen,
    Turnover,
    Foul,
    Rebound,
}

impl Outcome {
    pub fn parse(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "made_basket" | "made" | "score" => Outcome::MadeBasket,
            "blocked" | "block" => Outcome::Blocked,
            "stolen" | "steal" => Outcome::Stolen,
            "turnover" => Outcome::Turnover,
            "foul" => Outcome::Foul,
            "rebound" => Outcome::Rebound,
            _ => Outcome::None,
        }
    }

    /// Outcomes that drive the defensive-play animation.
    pub fn is_defensive(&self) -> bool {
        matches!(self, Outcome::Blocked | Outcome::Stolen | Outcome::Turnover)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Outcome::None => "",
            Outcome::MadeBasket => "BUCKET",
            Outcome::Blocked => "BLOCK",
            Outcome::Stolen => "STEAL",
            Outcome::Turnover => "TURNOVER",
            Outcome::Foul => "FOUL",
            Outcome::Rebound => "REBOUND",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframe {
    /// Seconds since the start of the possession.
    pub time: f32,
    /// May be sparse during substitutions and transitions.
    pub positions: BTreeMap<String, PlayerPose>,
    pub ball: BallPose,
    pub outcome: Outcome,
    pub description: Option<String>,
}

impl Keyframe {
    pub fn ball_carrier(&self) -> Option<(&str, &PlayerPose)> {
        self.positions
            .iter()
            .find(|(_, pose)| pose.has_ball)
            .map(|(id, pose)| (id.as_str(), pose))
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Possession {
    pub team: TeamSide,
    pub quarter: u8,
    /// Cumulative score as of the end of this possession (quarter-relative in live mode).
    pub home_score: u16,
    pub away_score: u16,
    pub keyframes: Vec<Keyframe>,
    pub play_name: Option<String>,
    pub description: Option<String>,
    pub player_stats: Vec<StatDelta>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatDelta {
    pub player_id: String,
    pub side: TeamSide,
    pub line: StatLine,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AnimationData {
    pub possessions: Vec<Possession>,
}

/// Counting stats. Also used as a per-possession delta.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StatLine {
    pub points: u16,
    pub rebounds: u16,
    pub assists: u16,
    pub steals: u16,
    pub blocks: u16,
    pub turnovers: u16,
    pub fg_made: u16,
    pub fg_attempted: u16,
    pub three_made: u16,
    pub three_attempted: u16,
    pub ft_made: u16,
    pub ft_attempted: u16,
    pub minutes: f32,
}

impl StatLine {
    pub fn add(&mut self, other: &StatLine) {
        self.points = self.points.saturating_add(other.points);
        self.rebounds = self.rebounds.saturating_add(other.rebounds);
        self.assists = self.assists.saturating_add(other.assists);
        self.steals = self.steals.saturating_add(other.steals);
        self.blocks = self.blocks.saturating_add(other.blocks);
        self.turnovers = self.turnovers.saturating_add(other.turnovers);
        self.fg_made = self.fg_made.saturating_add(other.fg_made);
        self.fg_attempted = self.fg_attempted.saturating_add(other.fg_attempted);
        self.three_made = self.three_made.saturating_add(other.three_made);
        self.three_attempted = self.three_attempted.saturating_add(other.three_attempted);
        self.ft_made = self.ft_made.saturating_add(other.ft_made);
        self.ft_attempted = self.ft_attempted.saturating_add(other.ft_attempted);
        self.minutes += other.minutes;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlayerGameStat {
    pub player_id: String,
    pub name: String,
    pub position: Option<Position>,
    pub secondary_position: Option<Position>,
    pub side: TeamSide,
    pub injured: bool,
    pub fatigued: bool,
    pub stats: StatLine,
}

impl PlayerGameStat {
    /// Primary or secondary position match.
    pub fn can_play(&self, slot: Position) -> bool {
        self.position == Some(slot) || self.secondary_position == Some(slot)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct BoxScore {
    pub home: Vec<PlayerGameStat>,
    pub away: Vec<PlayerGameStat>,
}

impl BoxScore {
    pub fn side(&self, side: TeamSide) -> &[PlayerGameStat] {
        match side {
            TeamSide::Home => &self.home,
            TeamSide::Away => &self.away,
        }
    }

    pub fn players(&self) -> impl Iterator<Item = &PlayerGameStat> {
        self.home.iter().chain(self.away.iter())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QuarterScore {
    pub quarter: u8,
    pub home: u16,
    pub away: u16,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OffensiveStyle {
    #[default]
    Balanced,
    FastBreak,
    Inside,
    Perimeter,
}

impl OffensiveStyle {
    pub const ALL: [OffensiveStyle; 4] = [
        OffensiveStyle::Balanced,
        OffensiveStyle::FastBreak,
        OffensiveStyle::Inside,
        OffensiveStyle::Perimeter,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            OffensiveStyle::Balanced => "Balanced",
            OffensiveStyle::FastBreak => "Fast Break",
            OffensiveStyle::Inside => "Inside",
            OffensiveStyle::Perimeter => "Perimeter",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DefensiveStyle {
    #[default]
    ManToMan,
    Zone,
    Press,
}

impl DefensiveStyle {
    pub const ALL: [DefensiveStyle; 3] = [
        DefensiveStyle::ManToMan,
        DefensiveStyle::Zone,
        DefensiveStyle::Press,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            DefensiveStyle::ManToMan => "Man-to-Man",
            DefensiveStyle::Zone => "Zone",
            DefensiveStyle::Press => "Press",
        }
    }

    pub fn next(self) -> Self {
        let idx = Self::ALL.iter().position(|s| *s == self).unwrap_or(0);
        Self::ALL[(idx + 1) % Self::ALL.len()]
    }
}

/// Coaching settings submitted at a quarter break.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameSettings {
    pub offensive_style: OffensiveStyle,
    pub defensive_style: DefensiveStyle,
    /// The side the user coaches. Its lineup is sent as `homeLineup` or `awayLineup`.
    pub side: TeamSide,
    pub lineup: Option<Vec<String>>,
}

/// One quarter of a live game, as returned by start/continue.
#[derive(Debug, Clone, Default)]
pub struct LiveQuarter {
    pub animation: AnimationData,
    pub quarter: u8,
    pub is_game_complete: bool,
    pub batch_id: Option<String>,
    pub box_score: Option<BoxScore>,
}

#[derive(Debug, Clone, Default)]
pub struct SimResult {
    pub home_score: u16,
    pub away_score: u16,
    pub box_score: Option<BoxScore>,
    pub quarter_scores: Vec<QuarterScore>,
    pub batch_id: Option<String>,
}

/// An already-finished game, as returned by `fetch_game`.
#[derive(Debug, Clone, Default)]
pub struct CompletedGame {
    pub game_id: String,
    pub home_name: String,
    pub away_name: String,
    pub final_box_score: BoxScore,
    pub animation: Option<AnimationData>,
    pub quarter_scores: Vec<QuarterScore>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchStatus {
    Running { completed: u32, total: u32 },
    Done,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Standing {
    pub team_id: String,
    pub name: String,
    pub wins: u16,
    pub losses: u16,
}

#[derive(Debug, Clone, Default)]
pub struct Standings {
    pub rows: Vec<Standing>,
    pub updated_at: Option<DateTime<Utc>>,
}
