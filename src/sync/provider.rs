use async_trait::async_trait;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::Result;

/// Opaque bearer credential supplied by the caller for each call.
///
/// Never refreshed or cached by the pipeline; the backing string is wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct AccessToken(String);

impl AccessToken {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("AccessToken(***)")
    }
}

/// One athlete in a league listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerRef {
    pub player_key: String,
    pub name: String,
}

impl PlayerRef {
    pub fn new(player_key: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            player_key: player_key.into(),
            name: name.into(),
        }
    }
}

/// Upstream statistics provider.
///
/// Implementations must map an authentication rejection to
/// `SyncError::Unauthorized` so the fetch loop can stop immediately.
#[async_trait]
pub trait StatsProvider: Send + Sync {
    /// Raw stat payload for one player on one date
    async fn player_stats_by_date(
        &self,
        token: &AccessToken,
        player_key: &str,
        date: NaiveDate,
    ) -> Result<Value>;

    /// One page of a league's players, starting at index `start`
    async fn league_players(
        &self,
        token: &AccessToken,
        league_key: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<PlayerRef>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_debug_is_redacted() {
        let token = AccessToken::new("secret-value");
        assert_eq!(format!("{token:?}"), "AccessToken(***)");
        assert_eq!(token.expose(), "secret-value");
        assert!(AccessToken::new("  ").is_empty());
    }
}
