use crate::wire::{
    AnimationPayload, BatchStatusResponse, GameResponse, LiveGameResponse, SettingsRequest,
    SimToEndResponse, StandingsResponse, WireBoxScore, WireKeyframe, WirePlayerStat,
    WirePossession, WireQuarterScore,
};
use crate::{
    AnimationData, BallPose, BatchStatus, BoxScore, CompletedGame, GameSettings, Keyframe,
    LiveQuarter, Outcome, PlayerGameStat, PlayerPose, Position, Possession, QuarterScore,
    SimResult, StatDelta, Standing, Standings, TeamSide,
};
use chrono::Utc;
use log::debug;
use reqwest::{Client, StatusCode};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

pub type ApiResult<T> = Result<T, ApiError>;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:8080";

/// Simulation backend client.
#[derive(Debug, Clone)]
pub struct SimApi {
    client: Client,
    base_url: String,
    timeout: Duration,
}

impl Default for SimApi {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[derive(Debug)]
pub enum ApiError {
    Network(reqwest::Error, String),
    Api(reqwest::Error, String),
    Parsing(reqwest::Error, String),
    NotFound(String),
    Other(String),
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ApiError::Network(e, url) => write!(f, "Network error for {url}: {e}"),
            ApiError::Api(e, url) => write!(f, "API error for {url}: {e}"),
            ApiError::Parsing(e, url) => write!(f, "Parse error for {url}: {e}"),
            ApiError::NotFound(msg) => write!(f, "Not found: {msg}"),
            ApiError::Other(msg) => write!(f, "Error: {msg}"),
        }
    }
}

impl std::error::Error for ApiError {}

impl SimApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url: String = base_url.into();
        Self {
            client: Client::builder()
                .user_agent("courtside/0.1 (terminal game replay)")
                .build()
                .unwrap_or_default(),
            base_url: base_url.trim_end_matches('/').to_owned(),
            timeout: Duration::from_secs(20),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Start a live game. The response carries the first quarter only.
    pub async fn start_live_game(
        &self,
        game_id: &str,
        settings: &GameSettings,
    ) -> ApiResult<LiveQuarter> {
        let url = format!("{}/games/{game_id}/live/start", self.base_url);
        let raw: LiveGameResponse = self.post(&url, &settings_request(settings)).await?;
        Ok(map_live_quarter(raw))
    }

    /// Simulate the next quarter with the submitted coaching settings.
    pub async fn continue_game(
        &self,
        game_id: &str,
        settings: &GameSettings,
    ) -> ApiResult<LiveQuarter> {
        let url = format!("{}/games/{game_id}/live/continue", self.base_url);
        let raw: LiveGameResponse = self.post(&url, &settings_request(settings)).await?;
        Ok(map_live_quarter(raw))
    }

    /// Simulate every remaining quarter without animation.
    pub async fn sim_to_end(&self, game_id: &str) -> ApiResult<SimResult> {
        let url = format!("{}/games/{game_id}/sim-to-end", self.base_url);
        let raw: SimToEndResponse = self.post(&url, &serde_json::json!({})).await?;
        let result = raw
            .result
            .ok_or_else(|| ApiError::Other(format!("sim-to-end for {game_id} returned no result")))?;
        Ok(SimResult {
            home_score: result.home_score.unwrap_or_default(),
            away_score: result.away_score.unwrap_or_default(),
            box_score: result.box_score.map(map_box_score),
            quarter_scores: map_quarter_scores(result.quarter_scores),
            batch_id: raw.batch_id,
        })
    }

    /// Fetch an already-completed game (final box score, optional replay).
    pub async fn fetch_game(&self, game_id: &str) -> ApiResult<CompletedGame> {
        let url = format!("{}/games/{game_id}", self.base_url);
        let raw: GameResponse = self.get(&url).await?;
        Ok(map_completed_game(game_id, raw))
    }

    pub async fn fetch_batch_status(&self, batch_id: &str) -> ApiResult<BatchStatus> {
        let url = format!("{}/batches/{batch_id}", self.base_url);
        let raw: BatchStatusResponse = self.get(&url).await?;
        match raw.status.as_deref() {
            Some("done") | Some("complete") | Some("completed") => Ok(BatchStatus::Done),
            Some("failed") => Err(ApiError::Other(format!("batch {batch_id} failed"))),
            _ => Ok(BatchStatus::Running {
                completed: raw.completed.unwrap_or_default(),
                total: raw.total.unwrap_or_default(),
            }),
        }
    }

    pub async fn fetch_standings(&self) -> ApiResult<Standings> {
        let url = format!("{}/standings", self.base_url);
        let raw: StandingsResponse = self.get(&url).await?;
        let updated_at = raw
            .updated_at
            .as_deref()
            .and_then(|d| chrono::DateTime::parse_from_rfc3339(d).ok())
            .map(|dt| dt.with_timezone(&Utc));
        let rows = raw
            .standings
            .into_iter()
            .map(|s| Standing {
                name: s.name.unwrap_or_else(|| s.team_id.clone()),
                team_id: s.team_id,
                wins: s.wins,
                losses: s.losses,
            })
            .collect();
        Ok(Standings { rows, updated_at })
    }

    async fn get<T: serde::de::DeserializeOwned>(&self, url: &str) -> ApiResult<T> {
        debug!("GET {url}");
        let response = self
            .client
            .get(url)
            .timeout(self.timeout)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        decode(response, url).await
    }

    async fn post<B: Serialize, T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        body: &B,
    ) -> ApiResult<T> {
        debug!("POST {url}");
        let response = self
            .client
            .post(url)
            .timeout(self.timeout)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::Network(e, url.to_owned()))?;
        decode(response, url).await
    }
}

async fn decode<T: serde::de::DeserializeOwned>(
    response: reqwest::Response,
    url: &str,
) -> ApiResult<T> {
    if response.status() == StatusCode::NOT_FOUND {
        return Err(ApiError::NotFound(url.to_owned()));
    }
    match response.error_for_status() {
        Ok(res) => res
            .json::<T>()
            .await
            .map_err(|e| ApiError::Parsing(e, url.to_owned())),
        Err(e) => Err(ApiError::Api(e, url.to_owned())),
    }
}

fn settings_request(settings: &GameSettings) -> SettingsRequest {
    let (home_lineup, away_lineup) = match settings.side {
        TeamSide::Home => (settings.lineup.clone(), None),
        TeamSide::Away => (None, settings.lineup.clone()),
    };
    SettingsRequest {
        offensive_style: settings.offensive_style,
        defensive_style: settings.defensive_style,
        home_lineup,
        away_lineup,
    }
}

// ---------------------------------------------------------------------------
// Mapping: wire types → clean domain types
// ---------------------------------------------------------------------------

fn map_live_quarter(raw: LiveGameResponse) -> LiveQuarter {
    LiveQuarter {
        animation: raw.animation_data.map(map_animation).unwrap_or_default(),
        quarter: raw.quarter.unwrap_or(1),
        is_game_complete: raw.is_game_complete.unwrap_or(false),
        batch_id: raw.batch_id,
        box_score: raw.box_score.map(map_box_score),
    }
}

fn map_completed_game(game_id: &str, raw: GameResponse) -> CompletedGame {
    let team_name = |t: Option<&crate::wire::WireTeam>, fallback: &str| {
        t.and_then(|t| t.name.clone().or_else(|| t.id.clone()))
            .unwrap_or_else(|| fallback.to_owned())
    };
    CompletedGame {
        game_id: raw.id.clone().unwrap_or_else(|| game_id.to_owned()),
        home_name: team_name(raw.home_team.as_ref(), "Home"),
        away_name: team_name(raw.away_team.as_ref(), "Away"),
        final_box_score: raw.final_box_score.map(map_box_score).unwrap_or_default(),
        animation: raw.animation_data.map(map_animation),
        quarter_scores: map_quarter_scores(raw.quarter_scores),
    }
}

/// Map a raw `animationData` payload. Values are converted, not validated;
/// normalization happens when the engine loads the replay.
pub fn map_animation(payload: AnimationPayload) -> AnimationData {
    AnimationData {
        possessions: payload.possessions.into_iter().map(map_possession).collect(),
    }
}

fn map_possession(p: WirePossession) -> Possession {
    let team = p
        .team
        .as_deref()
        .and_then(TeamSide::parse)
        .unwrap_or_default();
    let player_stats = p
        .player_stats
        .into_iter()
        .map(|s| StatDelta {
            side: s.team.as_deref().and_then(TeamSide::parse).unwrap_or(team),
            player_id: s.player_id,
            line: s.line,
        })
        .collect();
    Possession {
        team,
        quarter: p.quarter.unwrap_or(1),
        home_score: p.home_score.unwrap_or_default(),
        away_score: p.away_score.unwrap_or_default(),
        keyframes: p.keyframes.into_iter().map(map_keyframe).collect(),
        play_name: p.play_name,
        description: p.description,
        player_stats,
    }
}

fn map_keyframe(k: WireKeyframe) -> Keyframe {
    Keyframe {
        time: k.time.unwrap_or_default(),
        positions: k
            .positions
            .into_iter()
            .map(|(id, pose)| {
                (
                    id,
                    PlayerPose {
                        x: pose.x,
                        y: pose.y,
                        has_ball: pose.has_ball,
                    },
                )
            })
            .collect(),
        ball: k
            .ball
            .map(|b| BallPose { x: b.x, y: b.y })
            .unwrap_or_default(),
        outcome: k.outcome.as_deref().map(Outcome::parse).unwrap_or_default(),
        description: k.description,
    }
}

fn map_box_score(raw: WireBoxScore) -> BoxScore {
    BoxScore {
        home: raw
            .home
            .into_iter()
            .map(|p| map_player_stat(p, TeamSide::Home))
            .collect(),
        away: raw
            .away
            .into_iter()
            .map(|p| map_player_stat(p, TeamSide::Away))
            .collect(),
    }
}

fn map_player_stat(p: WirePlayerStat, side: TeamSide) -> PlayerGameStat {
    PlayerGameStat {
        name: p.name.unwrap_or_else(|| p.player_id.clone()),
        player_id: p.player_id,
        position: p.position.as_deref().and_then(Position::parse),
        secondary_position: p.secondary_position.as_deref().and_then(Position::parse),
        side,
        injured: p.injured,
        fatigued: p.fatigued,
        stats: p.line,
    }
}

fn map_quarter_scores(raw: Vec<WireQuarterScore>) -> Vec<QuarterScore> {
    let mut scores: Vec<QuarterScore> = raw
        .into_iter()
        .map(|q| QuarterScore {
            quarter: q.quarter,
            home: q.home,
            away: q.away,
        })
        .collect();
    scores.sort_by_key(|q| q.quarter);
    scores
}
