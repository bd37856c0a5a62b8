//! Paginated enumeration of a league's players.

use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, warn};

use super::provider::{AccessToken, PlayerRef, StatsProvider};
use crate::error::Result;

/// Provider page-size ceiling for league player listings
pub const DEFAULT_PAGE_SIZE: usize = 25;

/// Every player in `league_key`, up to `limit` when given.
///
/// Pages are requested until one comes back short, `limit` is reached, or a
/// request fails. A failed page ends the listing with whatever was gathered so
/// far, except an authentication rejection, which is returned as an error.
pub async fn list_league_players(
    provider: &dyn StatsProvider,
    token: &AccessToken,
    league_key: &str,
    page_size: usize,
    limit: Option<usize>,
    delay: Duration,
) -> Result<Vec<PlayerRef>> {
    let page_size = page_size.max(1);
    let mut players: Vec<PlayerRef> = Vec::new();

    loop {
        let want = match limit {
            Some(limit) if players.len() >= limit => break,
            Some(limit) => page_size.min(limit - players.len()),
            None => page_size,
        };

        if !players.is_empty() && !delay.is_zero() {
            sleep(delay).await;
        }

        let start = players.len();
        let page = match provider
            .league_players(token, league_key, start, want)
            .await
        {
            Ok(page) => page,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                warn!(
                    "League {} page at {} failed, keeping {} players: {}",
                    league_key,
                    start,
                    players.len(),
                    e
                );
                break;
            }
        };

        let got = page.len();
        debug!("League {} page at {}: {} players", league_key, start, got);
        players.extend(page);

        if got < want {
            break;
        }
    }

    Ok(players)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SyncError;
    use crate::sync::mock::ScriptedProvider;

    fn roster(n: usize) -> Vec<PlayerRef> {
        (0..n)
            .map(|i| PlayerRef::new(format!("428.p.{i}"), format!("Player {i}")))
            .collect()
    }

    fn token() -> AccessToken {
        AccessToken::new("t")
    }

    #[tokio::test]
    async fn pages_until_a_short_page() {
        let provider = ScriptedProvider::new();
        provider.roster(roster(60));

        let players = list_league_players(&provider, &token(), "428.l.1", 25, None, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(players.len(), 60);
        assert_eq!(provider.page_calls(), 3);
        assert_eq!(players[59].player_key, "428.p.59");
    }

    #[tokio::test]
    async fn exact_multiple_needs_one_empty_page() {
        let provider = ScriptedProvider::new();
        provider.roster(roster(50));

        let players = list_league_players(&provider, &token(), "428.l.1", 25, None, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(players.len(), 50);
        assert_eq!(provider.page_calls(), 3);
    }

    #[tokio::test]
    async fn stops_at_limit() {
        let provider = ScriptedProvider::new();
        provider.roster(roster(100));

        let players =
            list_league_players(&provider, &token(), "428.l.1", 25, Some(30), Duration::ZERO)
                .await
                .unwrap();

        assert_eq!(players.len(), 30);
        assert_eq!(provider.page_calls(), 2);
    }

    #[tokio::test]
    async fn page_failure_keeps_earlier_pages() {
        let provider = ScriptedProvider::new();
        provider.roster(roster(80));
        provider.fail_roster_at(50);

        let players = list_league_players(&provider, &token(), "428.l.1", 25, None, Duration::ZERO)
            .await
            .unwrap();

        assert_eq!(players.len(), 50);
    }

    struct RejectingProvider;

    #[async_trait::async_trait]
    impl StatsProvider for RejectingProvider {
        async fn player_stats_by_date(
            &self,
            _token: &AccessToken,
            _player_key: &str,
            _date: chrono::NaiveDate,
        ) -> Result<serde_json::Value> {
            Err(SyncError::unauthorized("401"))
        }

        async fn league_players(
            &self,
            _token: &AccessToken,
            _league_key: &str,
            _start: usize,
            _count: usize,
        ) -> Result<Vec<PlayerRef>> {
            Err(SyncError::unauthorized("401"))
        }
    }

    #[tokio::test]
    async fn unauthorized_is_not_swallowed() {
        let err = list_league_players(&RejectingProvider, &token(), "428.l.1", 25, None, Duration::ZERO)
            .await
            .unwrap_err();
        assert!(err.is_unauthorized());
    }
}
