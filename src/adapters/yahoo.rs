//! Yahoo Fantasy Sports REST adapter.
//!
//! Only transports and classifies responses; payloads are handed back as raw
//! JSON and interpreted by `sync::decoder`. The bearer token is supplied per
//! call and never kept on the client.

use async_trait::async_trait;
use chrono::NaiveDate;
use reqwest::header::{ACCEPT, AUTHORIZATION};
use reqwest::{Client, StatusCode};
use serde_json::Value;
use std::time::Duration;
use tracing::debug;

use crate::error::{Result, SyncError};
use crate::sync::provider::{AccessToken, PlayerRef, StatsProvider};

pub const DEFAULT_YAHOO_API_BASE: &str = "https://fantasysports.yahooapis.com/fantasy/v2";

#[derive(Clone)]
pub struct YahooClient {
    http: Client,
    base_url: String,
}

impl YahooClient {
    pub fn new(base_url: Option<&str>, timeout: Duration, user_agent: &str) -> Result<Self> {
        let base_url = base_url
            .unwrap_or(DEFAULT_YAHOO_API_BASE)
            .trim_end_matches('/')
            .to_string();

        let http = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| SyncError::Internal(format!("failed to build Yahoo HTTP client: {}", e)))?;

        Ok(Self { http, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn player_stats_url(&self, player_key: &str, date: NaiveDate) -> String {
        format!(
            "{}/player/{}/stats;type=date;date={}?format=json",
            self.base_url,
            urlencoding::encode(player_key),
            date.format("%Y-%m-%d")
        )
    }

    fn league_players_url(&self, league_key: &str, start: usize, count: usize) -> String {
        format!(
            "{}/league/{}/players;start={};count={}?format=json",
            self.base_url,
            urlencoding::encode(league_key),
            start,
            count
        )
    }

    async fn get_json(&self, token: &AccessToken, url: &str) -> Result<Value> {
        debug!("GET {}", url);
        let resp = self
            .http
            .get(url)
            .header(AUTHORIZATION, format!("Bearer {}", token.expose()))
            .header(ACCEPT, "application/json")
            .send()
            .await?;

        let status = resp.status();
        let text = resp.text().await?;

        if let Some(err) = classify_status(status, &text) {
            return Err(err);
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }

        serde_json::from_str(&text)
            .map_err(|e| SyncError::Internal(format!("invalid Yahoo JSON response: {}", e)))
    }
}

/// Map a non-success status to the pipeline's error classes.
fn classify_status(status: StatusCode, body: &str) -> Option<SyncError> {
    if status.is_success() {
        return None;
    }
    let detail = truncate(body, 300);
    Some(match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            SyncError::unauthorized(format!("status={} {}", status.as_u16(), detail))
        }
        StatusCode::TOO_MANY_REQUESTS => SyncError::RateLimited(format!("Yahoo API: {}", detail)),
        _ => SyncError::Provider {
            status: status.as_u16(),
            detail,
        },
    })
}

fn truncate(s: &str, max: usize) -> String {
    match s.char_indices().nth(max) {
        Some((i, _)) => format!("{}...", &s[..i]),
        None => s.to_string(),
    }
}

/// Players from a league listing page.
///
/// The listing sits under `fantasy_content.league[1].players`, an object keyed
/// by index strings plus a `count` key. Each entry's `player[0]` is a list of
/// single-key metadata objects.
pub fn parse_league_players(raw: &Value) -> Vec<PlayerRef> {
    let Some(league) = raw.pointer("/fantasy_content/league").and_then(Value::as_array) else {
        return Vec::new();
    };
    let Some(players) = league
        .iter()
        .find_map(|part| part.get("players"))
        .and_then(Value::as_object)
    else {
        return Vec::new();
    };

    let mut indexed: Vec<(usize, PlayerRef)> = players
        .iter()
        .filter_map(|(k, v)| Some((k.parse::<usize>().ok()?, v)))
        .filter_map(|(i, entry)| Some((i, parse_player_entry(entry)?)))
        .collect();
    indexed.sort_by_key(|(i, _)| *i);
    indexed.into_iter().map(|(_, p)| p).collect()
}

fn parse_player_entry(entry: &Value) -> Option<PlayerRef> {
    let meta = entry.pointer("/player/0")?.as_array()?;
    let mut key = None;
    let mut name = None;
    for item in meta {
        if let Some(k) = item.get("player_key").and_then(Value::as_str) {
            key = Some(k.to_string());
        }
        if let Some(n) = item.pointer("/name/full").and_then(Value::as_str) {
            name = Some(n.to_string());
        }
    }
    Some(PlayerRef::new(key?, name.unwrap_or_default()))
}

#[async_trait]
impl StatsProvider for YahooClient {
    async fn player_stats_by_date(
        &self,
        token: &AccessToken,
        player_key: &str,
        date: NaiveDate,
    ) -> Result<Value> {
        let url = self.player_stats_url(player_key, date);
        self.get_json(token, &url).await
    }

    async fn league_players(
        &self,
        token: &AccessToken,
        league_key: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<PlayerRef>> {
        let url = self.league_players_url(league_key, start, count);
        let raw = self.get_json(token, &url).await?;
        Ok(parse_league_players(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn client() -> YahooClient {
        YahooClient::new(Some("https://api.test/v2/"), Duration::from_secs(5), "hoopsync-test").unwrap()
    }

    #[test]
    fn builds_date_scoped_stats_url() {
        let url = client().player_stats_url("428.p.3704", NaiveDate::from_ymd_opt(2024, 10, 22).unwrap());
        assert_eq!(
            url,
            "https://api.test/v2/player/428.p.3704/stats;type=date;date=2024-10-22?format=json"
        );
    }

    #[test]
    fn builds_league_page_url() {
        let url = client().league_players_url("428.l.12345", 25, 25);
        assert_eq!(
            url,
            "https://api.test/v2/league/428.l.12345/players;start=25;count=25?format=json"
        );
    }

    #[test]
    fn auth_statuses_map_to_unauthorized() {
        for status in [StatusCode::UNAUTHORIZED, StatusCode::FORBIDDEN] {
            let err = classify_status(status, "token_expired").unwrap();
            assert!(err.is_unauthorized());
        }
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, ""),
            Some(SyncError::RateLimited(_))
        ));
        assert!(matches!(
            classify_status(StatusCode::BAD_GATEWAY, "oops"),
            Some(SyncError::Provider { status: 502, .. })
        ));
        assert!(classify_status(StatusCode::OK, "").is_none());
    }

    #[test]
    fn parses_league_listing_in_index_order() {
        let raw = json!({
            "fantasy_content": {
                "league": [
                    {"league_key": "428.l.12345", "name": "Test League"},
                    {"players": {
                        "1": {"player": [[
                            {"player_key": "428.p.6014"},
                            {"player_id": "6014"},
                            {"name": {"full": "Second Player", "first": "Second"}}
                        ]]},
                        "0": {"player": [[
                            {"player_key": "428.p.3704"},
                            {"name": {"full": "First Player"}}
                        ]]},
                        "count": 2
                    }}
                ]
            }
        });

        let players = parse_league_players(&raw);
        assert_eq!(
            players,
            vec![
                PlayerRef::new("428.p.3704", "First Player"),
                PlayerRef::new("428.p.6014", "Second Player"),
            ]
        );
    }

    #[test]
    fn empty_or_odd_listing_yields_nothing() {
        assert!(parse_league_players(&json!({})).is_empty());
        let raw = json!({"fantasy_content": {"league": [{"league_key": "x"}, {"players": []}]}});
        assert!(parse_league_players(&raw).is_empty());
    }
}
