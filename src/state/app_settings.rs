use courtside_api::TeamSide;
use courtside_api::client::DEFAULT_BASE_URL;
use log::{LevelFilter, warn};
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

pub const DEFAULT_TICK_MS: u64 = 33;
const MIN_TICK_MS: u64 = 16;

#[derive(Debug, Clone, PartialEq)]
pub struct AppSettings {
    pub full_screen: bool,
    pub log_level: Option<LevelFilter>,
    pub api_url: String,
    pub game_id: Option<String>,
    pub replay_path: Option<PathBuf>,
    pub live: bool,
    pub user_side: TeamSide,
    pub tick: Duration,
    pub speed: f32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            full_screen: false,
            log_level: None,
            api_url: DEFAULT_BASE_URL.to_owned(),
            game_id: None,
            replay_path: None,
            live: false,
            user_side: TeamSide::Home,
            tick: Duration::from_millis(DEFAULT_TICK_MS),
            speed: 1.0,
        }
    }
}

/// What the command line asked for.
#[derive(Debug, Clone, PartialEq)]
pub enum CliAction {
    Run(CliOverrides),
    Help,
    Version,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CliOverrides {
    pub replay_path: Option<PathBuf>,
    pub game_id: Option<String>,
    pub live: bool,
}

impl AppSettings {
    pub fn load() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build settings from `lookup` (environment in production). Bad values
    /// fall back to the default with a warning.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut settings = Self::default();
        let get = |key: &str| lookup(key).map(|v| v.trim().to_owned()).filter(|v| !v.is_empty());

        if let Some(url) = get("COURTSIDE_API_URL") {
            settings.api_url = url.trim_end_matches('/').to_owned();
        }
        settings.game_id = get("COURTSIDE_GAME_ID");
        settings.replay_path = get("COURTSIDE_REPLAY_JSON").map(PathBuf::from);
        settings.live = get("COURTSIDE_LIVE").is_some_and(|v| matches!(v.as_str(), "1" | "true" | "yes"));

        if let Some(side) = get("COURTSIDE_SIDE") {
            match TeamSide::parse(&side) {
                Some(side) => settings.user_side = side,
                None => warn!("COURTSIDE_SIDE={side} is not home/away, using home"),
            }
        }
        if let Some(ms) = get("COURTSIDE_TICK_MS") {
            match ms.parse::<u64>() {
                Ok(ms) => {
                    settings.tick = Duration::from_millis(ms.clamp(MIN_TICK_MS, DEFAULT_TICK_MS))
                }
                Err(_) => warn!("COURTSIDE_TICK_MS={ms} is not a number, using {DEFAULT_TICK_MS}"),
            }
        }
        if let Some(speed) = get("COURTSIDE_SPEED") {
            match speed.parse::<f32>() {
                Ok(s) if s.is_finite() && s > 0.0 => settings.speed = s,
                _ => warn!("COURTSIDE_SPEED={speed} is not a positive number, using 1"),
            }
        }
        if let Some(level) = get("COURTSIDE_LOG_LEVEL") {
            match LevelFilter::from_str(&level) {
                Ok(level) => settings.log_level = Some(level),
                Err(_) => warn!("COURTSIDE_LOG_LEVEL={level} is not a log level"),
            }
        }
        settings
    }

    pub fn apply(&mut self, overrides: CliOverrides) {
        if let Some(path) = overrides.replay_path {
            self.replay_path = Some(path);
            self.live = false;
        }
        if let Some(game_id) = overrides.game_id {
            self.game_id = Some(game_id);
        }
        if overrides.live {
            self.live = true;
        }
    }
}

pub fn parse_cli_args(args: impl IntoIterator<Item = String>) -> Result<CliAction, String> {
    let mut overrides = CliOverrides::default();
    let mut args = args.into_iter();
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => return Ok(CliAction::Help),
            "-V" | "--version" => return Ok(CliAction::Version),
            "--live" => overrides.live = true,
            "--replay" => {
                let path = args.next().ok_or("--replay needs a path")?;
                overrides.replay_path = Some(PathBuf::from(path));
            }
            "--game" => {
                let id = args.next().ok_or("--game needs an id")?;
                overrides.game_id = Some(id);
            }
            other => return Err(format!("Unknown argument: {other}")),
        }
    }
    if overrides.live && overrides.replay_path.is_some() {
        return Err("--live cannot be combined with --replay".into());
    }
    Ok(CliAction::Run(overrides))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn settings_from(pairs: &[(&str, &str)]) -> AppSettings {
        let env: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppSettings::from_lookup(|key| env.get(key).cloned())
    }

    fn args(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn defaults_without_environment() {
        assert_eq!(settings_from(&[]), AppSettings::default());
    }

    #[test]
    fn reads_environment() {
        let settings = settings_from(&[
            ("COURTSIDE_API_URL", "http://sim.local:9000/"),
            ("COURTSIDE_GAME_ID", "g42"),
            ("COURTSIDE_LIVE", "1"),
            ("COURTSIDE_SIDE", "away"),
            ("COURTSIDE_SPEED", "2"),
            ("COURTSIDE_LOG_LEVEL", "debug"),
        ]);
        assert_eq!(settings.api_url, "http://sim.local:9000");
        assert_eq!(settings.game_id.as_deref(), Some("g42"));
        assert!(settings.live);
        assert_eq!(settings.user_side, TeamSide::Away);
        assert_eq!(settings.speed, 2.0);
        assert_eq!(settings.log_level, Some(LevelFilter::Debug));
    }

    #[test]
    fn tick_is_clamped_and_bad_values_fall_back() {
        assert_eq!(settings_from(&[("COURTSIDE_TICK_MS", "5")]).tick, Duration::from_millis(16));
        assert_eq!(settings_from(&[("COURTSIDE_TICK_MS", "500")]).tick, Duration::from_millis(33));
        assert_eq!(settings_from(&[("COURTSIDE_TICK_MS", "fast")]).tick, Duration::from_millis(33));
        assert_eq!(settings_from(&[("COURTSIDE_SPEED", "-1")]).speed, 1.0);
        assert_eq!(settings_from(&[("COURTSIDE_SIDE", "left")]).user_side, TeamSide::Home);
    }

    #[test]
    fn cli_flags() {
        assert_eq!(parse_cli_args(args(&["--help"])), Ok(CliAction::Help));
        assert_eq!(parse_cli_args(args(&["-V"])), Ok(CliAction::Version));
        assert_eq!(
            parse_cli_args(args(&["--game", "g1", "--live"])),
            Ok(CliAction::Run(CliOverrides {
                replay_path: None,
                game_id: Some("g1".into()),
                live: true,
            }))
        );
        assert!(parse_cli_args(args(&["--replay"])).is_err());
        assert!(parse_cli_args(args(&["--bogus"])).is_err());
        assert!(parse_cli_args(args(&["--live", "--replay", "x.json"])).is_err());
    }

    #[test]
    fn replay_flag_overrides_live_environment() {
        let mut settings = settings_from(&[("COURTSIDE_LIVE", "1")]);
        settings.apply(CliOverrides {
            replay_path: Some("game.json".into()),
            ..Default::default()
        });
        assert!(!settings.live);
        assert_eq!(settings.replay_path, Some(PathBuf::from("game.json")));
    }
}
