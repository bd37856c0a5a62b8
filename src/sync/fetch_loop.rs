//! Sequential, rate-limited fetch of missing dates with write-through caching.
//!
//! One request in flight at a time and a fixed sleep between requests. Every
//! per-unit failure is counted and skipped; only an authentication rejection
//! stops the loop, since every later call would fail the same way.

use chrono::NaiveDate;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info, warn};

use super::cache::CacheStore;
use super::decoder::decode_stat_vector;
use super::provider::{AccessToken, StatsProvider};
use crate::domain::{GameLog, ProgressStatus, SyncProgress};
use crate::error::Result;

/// Default spacing between provider requests
pub const DEFAULT_REQUEST_DELAY: Duration = Duration::from_millis(200);

/// What one loop invocation got through
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoopOutcome {
    pub attempted: usize,
    /// Missing dates beyond the batch ceiling, not attempted this time
    pub remaining: usize,
    pub last_attempted: Option<NaiveDate>,
}

pub struct FetchLoop<'a> {
    provider: &'a dyn StatsProvider,
    cache: &'a CacheStore,
    delay: Duration,
}

impl<'a> FetchLoop<'a> {
    pub fn new(provider: &'a dyn StatsProvider, cache: &'a CacheStore, delay: Duration) -> Self {
        Self {
            provider,
            cache,
            delay,
        }
    }

    /// Fetch at most `batch_size` of `missing`, in order.
    ///
    /// Returns `Err` only for `SyncError::Unauthorized`, with `progress`
    /// attached; `progress.status` is set to `Error` in that case.
    pub async fn run(
        &self,
        token: &AccessToken,
        player_key: &str,
        missing: &[NaiveDate],
        batch_size: usize,
        progress: &mut SyncProgress,
    ) -> Result<LoopOutcome> {
        let batch = &missing[..missing.len().min(batch_size)];

        for (i, date) in batch.iter().enumerate() {
            if i > 0 && !self.delay.is_zero() {
                sleep(self.delay).await;
            }
            if let Err(e) = self.fetch_one(token, player_key, *date, progress).await {
                progress.status = ProgressStatus::Error;
                warn!(
                    "Aborting fetch loop for {} at {} after {} units: {}",
                    player_key,
                    date,
                    i + 1,
                    e
                );
                return Err(e.with_progress(progress));
            }
        }

        let outcome = LoopOutcome {
            attempted: batch.len(),
            remaining: missing.len() - batch.len(),
            last_attempted: batch.last().copied(),
        };

        info!(
            "Fetch loop for {}: {} attempted, {} remaining ({})",
            player_key, outcome.attempted, outcome.remaining, progress
        );

        Ok(outcome)
    }

    /// Fetch, decode and cache a single date.
    ///
    /// `Ok(None)` covers both "did not play" and a counted transient failure.
    pub async fn fetch_one(
        &self,
        token: &AccessToken,
        player_key: &str,
        date: NaiveDate,
        progress: &mut SyncProgress,
    ) -> Result<Option<GameLog>> {
        progress.advance(date);
        progress.api_calls += 1;

        let raw = match self.provider.player_stats_by_date(token, player_key, date).await {
            Ok(raw) => raw,
            Err(e) if e.is_unauthorized() => return Err(e),
            Err(e) => {
                progress.errors += 1;
                warn!("Fetch failed for {} on {}: {}", player_key, date, e);
                return Ok(None);
            }
        };

        let Some(log) = decode_stat_vector(&raw).into_game_log(player_key, date) else {
            debug!("No game for {} on {}", player_key, date);
            return Ok(None);
        };
        progress.games_found += 1;

        if self.cache.upsert(&log).await {
            progress.cached += 1;
        } else if self.cache.is_configured() {
            progress.errors += 1;
        }

        Ok(Some(log))
    }
}
