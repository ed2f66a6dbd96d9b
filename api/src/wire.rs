/// Simulation backend wire types: serde shapes for deserializing responses.
/// These map to the clean domain types via the mapping functions in client.rs.
use crate::StatLine;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ---------------------------------------------------------------------------
// Animation payload  (`animationData`)
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
pub struct AnimationPayload {
    #[serde(default)]
    pub possessions: Vec<WirePossession>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WirePossession {
    pub team: Option<String>, // "home" | "away"
    pub quarter: Option<u8>,
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
    #[serde(default)]
    pub keyframes: Vec<WireKeyframe>,
    pub play_name: Option<String>,
    pub description: Option<String>,
    #[serde(default)]
    pub player_stats: Vec<WireStatDelta>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireKeyframe {
    /// Seconds into the possession. Older payloads send `t`.
    #[serde(alias = "t")]
    pub time: Option<f32>,
    #[serde(default)]
    pub positions: HashMap<String, WirePose>,
    pub ball: Option<WireBall>,
    pub outcome: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
#[serde(rename_all = "camelCase")]
pub struct WirePose {
    pub x: f32,
    pub y: f32,
    #[serde(default)]
    pub has_ball: bool,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct WireBall {
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireStatDelta {
    pub player_id: String,
    pub team: Option<String>,
    #[serde(flatten)]
    pub line: StatLine,
}

// ---------------------------------------------------------------------------
// Live game  (start / continue)
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SettingsRequest {
    pub offensive_style: crate::OffensiveStyle,
    pub defensive_style: crate::DefensiveStyle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub home_lineup: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub away_lineup: Option<Vec<String>>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct LiveGameResponse {
    pub animation_data: Option<AnimationPayload>,
    pub quarter: Option<u8>,
    pub is_game_complete: Option<bool>,
    pub batch_id: Option<String>,
    pub box_score: Option<WireBoxScore>,
}

// ---------------------------------------------------------------------------
// Sim to end / finished games
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct SimToEndResponse {
    pub result: Option<WireGameResult>,
    pub batch_id: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireGameResult {
    pub home_score: Option<u16>,
    pub away_score: Option<u16>,
    pub box_score: Option<WireBoxScore>,
    #[serde(default)]
    pub quarter_scores: Vec<WireQuarterScore>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct GameResponse {
    pub id: Option<String>,
    pub home_team: Option<WireTeam>,
    pub away_team: Option<WireTeam>,
    pub final_box_score: Option<WireBoxScore>,
    pub animation_data: Option<AnimationPayload>,
    #[serde(default)]
    pub quarter_scores: Vec<WireQuarterScore>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireTeam {
    pub id: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Deserialize, Default, Clone)]
pub struct WireBoxScore {
    #[serde(default)]
    pub home: Vec<WirePlayerStat>,
    #[serde(default)]
    pub away: Vec<WirePlayerStat>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WirePlayerStat {
    pub player_id: String,
    pub name: Option<String>,
    pub position: Option<String>,
    pub secondary_position: Option<String>,
    #[serde(default)]
    pub injured: bool,
    #[serde(default)]
    pub fatigued: bool,
    #[serde(flatten)]
    pub line: StatLine,
}

#[derive(Debug, Deserialize, Default, Clone, Copy)]
pub struct WireQuarterScore {
    pub quarter: u8,
    #[serde(default)]
    pub home: u16,
    #[serde(default)]
    pub away: u16,
}

// ---------------------------------------------------------------------------
// Background batches and standings
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct BatchStatusResponse {
    pub status: Option<String>, // "running" | "done" | "failed"
    pub completed: Option<u32>,
    pub total: Option<u32>,
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct StandingsResponse {
    #[serde(default)]
    pub standings: Vec<WireStanding>,
    pub updated_at: Option<String>, // ISO 8601
}

#[derive(Debug, Deserialize, Default, Clone)]
#[serde(rename_all = "camelCase")]
pub struct WireStanding {
    pub team_id: String,
    pub name: Option<String>,
    #[serde(default)]
    pub wins: u16,
    #[serde(default)]
    pub losses: u16,
}
