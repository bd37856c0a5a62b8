//! Stat vector decoding.
//!
//! The provider returns a deeply nested, loosely typed payload per player and
//! date. This module is the only place that looks at that shape: everything
//! downstream works with [`DecodedStats`].

use chrono::NaiveDate;
use serde_json::Value;

use crate::domain::{GameLog, GameOutcome, HomeAway, StatLine};

/// Provider stat id -> internal metric name
const STAT_NAMES: &[(&str, &str)] = &[
    ("0", "gp"),
    ("3", "min"),
    ("5", "fg_pct"),
    ("8", "ft_pct"),
    ("10", "tpm"),
    ("12", "pts"),
    ("15", "reb"),
    ("16", "ast"),
    ("17", "stl"),
    ("18", "blk"),
    ("19", "to"),
];

/// Composite "made/attempted" ids, e.g. "5/12"
const COMPOSITE_STATS: &[(&str, &str, &str)] =
    &[("9004003", "fgm", "fga"), ("9007006", "ftm", "fta")];

/// Flat, typed view of one provider stat response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct DecodedStats {
    pub metrics: StatLine,
    pub participated: bool,
    pub display_name: String,
    pub opponent: Option<String>,
    pub home_away: Option<HomeAway>,
    pub outcome: Option<GameOutcome>,
}

impl DecodedStats {
    fn no_game(display_name: String) -> Self {
        Self {
            display_name,
            ..Default::default()
        }
    }

    /// Build the cache record; `None` when the player did not play.
    pub fn into_game_log(self, player_key: &str, date: NaiveDate) -> Option<GameLog> {
        if !self.participated {
            return None;
        }
        let mut log = GameLog::new(player_key, date, self.metrics).with_name(self.display_name);
        log.opponent = self.opponent;
        log.home_away = self.home_away;
        log.game_result = self.outcome;
        Some(log)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RawStat {
    Sentinel,
    Zero,
    Value,
}

/// Decode a raw per-date stat response.
///
/// Never fails: a shape that does not match is reported as "did not play".
///
/// A date counts as played when at least one raw stat value is neither a
/// sentinel nor zero. A player who played but recorded zero in every tracked
/// category is therefore classified as "no game".
// TODO: revisit the all-zero rule once the provider's games-played flag (stat 0)
// is confirmed to be populated on date coverage for every sport.
pub fn decode_stat_vector(raw: &Value) -> DecodedStats {
    let root = raw.get("fantasy_content").unwrap_or(raw);
    let player = root.get("player").unwrap_or(root);

    let display_name = find_display_name(player).unwrap_or_default();

    let Some(stats_block) = find_stats_block(player) else {
        return DecodedStats::no_game(display_name);
    };
    let Some(entries) = stats_block.get("stats").and_then(Value::as_array) else {
        return DecodedStats::no_game(display_name);
    };

    let mut metrics = StatLine::new();
    let mut any_value = false;

    for entry in entries {
        let stat = entry.get("stat").unwrap_or(entry);
        let Some(stat_id) = stat.get("stat_id").and_then(id_string) else {
            continue;
        };
        let value = stat.get("value").unwrap_or(&Value::Null);

        if classify(value) == RawStat::Value {
            any_value = true;
        }

        if let Some((_, name)) = STAT_NAMES.iter().find(|(id, _)| *id == stat_id) {
            if let Some(n) = number(value) {
                metrics.insert((*name).to_string(), n);
            }
        } else if let Some((_, made, attempted)) =
            COMPOSITE_STATS.iter().find(|(id, _, _)| *id == stat_id)
        {
            if let Some((m, a)) = value.as_str().and_then(split_made_attempted) {
                metrics.insert((*made).to_string(), m);
                metrics.insert((*attempted).to_string(), a);
            }
        }
    }

    if !any_value {
        return DecodedStats::no_game(display_name);
    }

    DecodedStats {
        metrics,
        participated: true,
        display_name,
        opponent: pick_str(stats_block, &["opponent", "opponent_team_abbr", "opponent_team_key"])
            .map(ToString::to_string),
        home_away: pick_str(stats_block, &["home_away", "is_home"])
            .and_then(|s| HomeAway::try_from(s).ok()),
        outcome: pick_str(stats_block, &["outcome", "game_result"])
            .and_then(|s| GameOutcome::try_from(s).ok()),
    }
}

/// Player metadata arrives either as an array of single-key objects or as a
/// nested array inside the player array.
fn find_display_name(player: &Value) -> Option<String> {
    if let Some(full) = player.pointer("/name/full").and_then(Value::as_str) {
        return Some(full.to_string());
    }
    let parts = player.as_array()?;
    parts.iter().find_map(|part| match part {
        Value::Array(meta) => meta
            .iter()
            .find_map(|m| m.pointer("/name/full").and_then(Value::as_str)),
        Value::Object(_) => part.pointer("/name/full").and_then(Value::as_str),
        _ => None,
    })
    .map(ToString::to_string)
}

fn find_stats_block(player: &Value) -> Option<&Value> {
    if let Some(block) = player.get("player_stats") {
        return Some(block);
    }
    player
        .as_array()?
        .iter()
        .find_map(|part| part.get("player_stats"))
}

fn pick_str<'a>(root: &'a Value, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|key| root.get(*key).and_then(Value::as_str))
        .filter(|s| !s.trim().is_empty())
}

fn id_string(v: &Value) -> Option<String> {
    match v {
        Value::String(s) => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn is_sentinel(s: &str) -> bool {
    matches!(s.trim(), "" | "-" | "-/-" | "—")
}

fn parse_part(s: &str) -> Option<f64> {
    let s = s.trim();
    if is_sentinel(s) {
        return None;
    }
    s.parse::<f64>().ok().filter(|n| n.is_finite())
}

fn classify(value: &Value) -> RawStat {
    match value {
        Value::Number(n) => match n.as_f64() {
            Some(x) if x != 0.0 => RawStat::Value,
            Some(_) => RawStat::Zero,
            None => RawStat::Sentinel,
        },
        Value::String(s) if is_sentinel(s) => RawStat::Sentinel,
        Value::String(s) => {
            let mut seen_zero = false;
            for part in s.split('/') {
                match parse_part(part) {
                    Some(x) if x != 0.0 => return RawStat::Value,
                    Some(_) => seen_zero = true,
                    None => {}
                }
            }
            if seen_zero {
                RawStat::Zero
            } else {
                RawStat::Sentinel
            }
        }
        _ => RawStat::Sentinel,
    }
}

fn number(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => parse_part(s),
        _ => None,
    }
}

fn split_made_attempted(s: &str) -> Option<(f64, f64)> {
    let (made, attempted) = s.split_once('/')?;
    Some((parse_part(made)?, parse_part(attempted)?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload(stats: Value) -> Value {
        json!({
            "fantasy_content": {
                "player": [
                    [
                        {"player_key": "428.p.3704"},
                        {"player_id": "3704"},
                        {"name": {"full": "LeBron James", "first": "LeBron", "last": "James"}}
                    ],
                    {
                        "player_stats": {
                            "0": {"coverage_type": "date", "date": "2024-10-23"},
                            "stats": stats
                        }
                    }
                ]
            }
        })
    }

    fn stat(id: &str, value: &str) -> Value {
        json!({"stat": {"stat_id": id, "value": value}})
    }

    #[test]
    fn decodes_a_played_game() {
        let raw = payload(json!([
            stat("9004003", "10/17"),
            stat("5", ".588"),
            stat("3", "35"),
            stat("12", "21"),
            stat("15", "8"),
            stat("16", "0"),
        ]));

        let decoded = decode_stat_vector(&raw);
        assert!(decoded.participated);
        assert_eq!(decoded.display_name, "LeBron James");
        assert_eq!(decoded.metrics.get("fgm"), Some(&10.0));
        assert_eq!(decoded.metrics.get("fga"), Some(&17.0));
        assert_eq!(decoded.metrics.get("pts"), Some(&21.0));
        assert_eq!(decoded.metrics.get("ast"), Some(&0.0));
        assert!((decoded.metrics["fg_pct"] - 0.588).abs() < 1e-9);

        let log = decoded
            .into_game_log("428.p.3704", NaiveDate::from_ymd_opt(2024, 10, 23).unwrap())
            .unwrap();
        assert_eq!(log.minutes_played, Some(35.0));
        assert_eq!(log.player_name, "LeBron James");
    }

    #[test]
    fn all_sentinel_values_mean_no_game() {
        let raw = payload(json!([
            stat("9004003", "-/-"),
            stat("5", "-"),
            stat("12", "-"),
            stat("15", "-"),
        ]));

        let decoded = decode_stat_vector(&raw);
        assert!(!decoded.participated);
        assert_eq!(decoded.display_name, "LeBron James");
        assert!(decoded
            .into_game_log("428.p.3704", NaiveDate::from_ymd_opt(2024, 10, 23).unwrap())
            .is_none());
    }

    #[test]
    fn all_zero_values_mean_no_game() {
        let raw = payload(json!([stat("9004003", "0/0"), stat("12", "0"), stat("15", "0")]));
        assert!(!decode_stat_vector(&raw).participated);
    }

    #[test]
    fn a_single_zero_is_not_a_missed_game() {
        let raw = payload(json!([stat("12", "0"), stat("15", "3"), stat("18", "-")]));
        let decoded = decode_stat_vector(&raw);
        assert!(decoded.participated);
        assert_eq!(decoded.metrics.get("pts"), Some(&0.0));
        assert_eq!(decoded.metrics.get("reb"), Some(&3.0));
        assert!(!decoded.metrics.contains_key("blk"));
    }

    #[test]
    fn unknown_ids_are_dropped() {
        let raw = payload(json!([stat("12", "30"), stat("9999", "4")]));
        let decoded = decode_stat_vector(&raw);
        assert!(decoded.participated);
        assert_eq!(decoded.metrics.len(), 1);
    }

    #[test]
    fn malformed_shapes_are_no_game() {
        assert!(!decode_stat_vector(&json!(null)).participated);
        assert!(!decode_stat_vector(&json!({"fantasy_content": {}})).participated);
        assert!(!decode_stat_vector(&json!({"fantasy_content": {"player": "oops"}})).participated);
        assert!(!decode_stat_vector(&payload(json!({"not": "a list"}))).participated);
        assert!(!decode_stat_vector(&payload(json!([]))).participated);
    }

    #[test]
    fn accepts_flat_shape_and_numeric_ids() {
        let raw = json!({
            "name": {"full": "Nikola Jokic"},
            "player_stats": {
                "home_away": "away",
                "opponent": "LAL",
                "outcome": "W",
                "stats": [{"stat_id": 12, "value": 35}, {"stat_id": 15, "value": 12}]
            }
        });
        let decoded = decode_stat_vector(&raw);
        assert!(decoded.participated);
        assert_eq!(decoded.display_name, "Nikola Jokic");
        assert_eq!(decoded.metrics.get("pts"), Some(&35.0));
        assert_eq!(decoded.home_away, Some(HomeAway::Away));
        assert_eq!(decoded.opponent.as_deref(), Some("LAL"));
        assert_eq!(decoded.outcome, Some(GameOutcome::Win));
    }
}
