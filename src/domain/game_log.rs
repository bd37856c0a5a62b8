use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Result, SyncError};

/// Named metric map decoded from a provider stat vector (e.g. "pts" -> 31.0)
pub type StatLine = BTreeMap<String, f64>;

/// Internal name of the primary duration metric
pub const MINUTES_METRIC: &str = "min";

/// Home/away flag for a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HomeAway {
    Home,
    Away,
}

impl HomeAway {
    pub fn as_str(&self) -> &'static str {
        match self {
            HomeAway::Home => "home",
            HomeAway::Away => "away",
        }
    }
}

impl TryFrom<&str> for HomeAway {
    type Error = ();

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.trim().to_ascii_lowercase().as_str() {
            "home" | "h" | "1" | "true" => Ok(HomeAway::Home),
            "away" | "a" | "@" | "0" | "false" => Ok(HomeAway::Away),
            _ => Err(()),
        }
    }
}

/// Win/loss outcome of a game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameOutcome {
    #[serde(rename = "W")]
    Win,
    #[serde(rename = "L")]
    Loss,
}

impl GameOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameOutcome::Win => "W",
            GameOutcome::Loss => "L",
        }
    }
}

impl TryFrom<&str> for GameOutcome {
    type Error = ();

    fn try_from(s: &str) -> std::result::Result<Self, Self::Error> {
        match s.trim().to_ascii_uppercase().as_str() {
            "W" | "WIN" => Ok(GameOutcome::Win),
            "L" | "LOSS" => Ok(GameOutcome::Loss),
            _ => Err(()),
        }
    }
}

/// One player's cached stat line for one calendar date.
///
/// `(player_key, game_date)` is the natural key. A record only exists for
/// dates the player actually played; a date without a game is represented by
/// the absence of a row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameLog {
    pub player_key: String,
    pub player_name: String,
    pub game_date: NaiveDate,
    pub stats: StatLine,
    pub minutes_played: Option<f64>,
    pub opponent: Option<String>,
    pub home_away: Option<HomeAway>,
    pub game_result: Option<GameOutcome>,
}

impl GameLog {
    pub fn new(player_key: impl Into<String>, game_date: NaiveDate, stats: StatLine) -> Self {
        let minutes_played = stats.get(MINUTES_METRIC).copied();
        Self {
            player_key: player_key.into(),
            player_name: String::new(),
            game_date,
            stats,
            minutes_played,
            opponent: None,
            home_away: None,
            game_result: None,
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.player_name = name.into();
        self
    }

    pub fn stat(&self, name: &str) -> Option<f64> {
        self.stats.get(name).copied()
    }
}

impl fmt::Display for GameLog {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} ({} stats)",
            self.player_key,
            self.game_date,
            self.stats.len()
        )
    }
}

/// Reject identity keys that can never be valid provider keys.
///
/// Keys are opaque, but they are embedded in request paths, so empty,
/// whitespace-bearing or path-breaking values are refused up front.
pub fn validate_identity(kind: &str, key: &str) -> Result<()> {
    if key.trim().is_empty() {
        return Err(SyncError::Validation(format!("{kind} key must not be empty")));
    }
    if key.len() > 64 {
        return Err(SyncError::Validation(format!(
            "{kind} key is too long ({} chars, max 64)",
            key.len()
        )));
    }
    if key
        .chars()
        .any(|c| c.is_whitespace() || matches!(c, '/' | '?' | '#' | ';' | '&'))
    {
        return Err(SyncError::Validation(format!(
            "{kind} key contains invalid characters: {key:?}"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minutes_come_from_the_duration_metric() {
        let mut stats = StatLine::new();
        stats.insert("pts".into(), 22.0);
        stats.insert(MINUTES_METRIC.into(), 34.0);

        let log = GameLog::new("428.p.3704", NaiveDate::from_ymd_opt(2024, 10, 22).unwrap(), stats);
        assert_eq!(log.minutes_played, Some(34.0));
        assert_eq!(log.stat("pts"), Some(22.0));
        assert_eq!(log.stat("reb"), None);
    }

    #[test]
    fn identity_validation() {
        assert!(validate_identity("player", "428.p.3704").is_ok());
        assert!(validate_identity("league", "428.l.12345").is_ok());
        assert!(validate_identity("player", "").is_err());
        assert!(validate_identity("player", "   ").is_err());
        assert!(validate_identity("player", "428.p.1/stats").is_err());
        assert!(validate_identity("player", "428 p 1").is_err());
    }

    #[test]
    fn flags_parse_loosely() {
        assert_eq!(HomeAway::try_from("Home"), Ok(HomeAway::Home));
        assert_eq!(HomeAway::try_from("@"), Ok(HomeAway::Away));
        assert!(HomeAway::try_from("neutral").is_err());
        assert_eq!(GameOutcome::try_from("w"), Ok(GameOutcome::Win));
        assert_eq!(GameOutcome::try_from("LOSS"), Ok(GameOutcome::Loss));
    }
}
