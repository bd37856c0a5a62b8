//! Entry points composing plan -> reconcile -> fetch -> summarize.
//!
//! Each call runs that sequence once, synchronously, and is stateless with
//! respect to earlier calls: anything left over is described by a
//! [`Continuation`] and re-derived from the cache on the next call.

use chrono::{Duration as ChronoDuration, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{info, instrument, warn};

use super::cache::CacheStore;
use super::fetch_loop::{FetchLoop, DEFAULT_REQUEST_DELAY};
use super::planner;
use super::provider::{AccessToken, StatsProvider};
use super::reconciler::reconcile;
use super::roster::{list_league_players, DEFAULT_PAGE_SIZE};
use crate::config::AppConfig;
use crate::domain::{
    validate_identity, Continuation, GameLog, PlayerSyncResult, ProgressStatus, SeasonCatalog,
    SyncProgress, SyncReport,
};
use crate::error::{Result, SyncError};

pub const MAX_BACKFILL_BATCH: usize = 500;
pub const MAX_LEAGUE_BATCH: usize = 200;
pub const MAX_WINDOW_DAYS: u32 = 60;
pub const MAX_RECENT_COUNT: usize = 50;

/// Tunables for all three orchestrators
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncSettings {
    pub request_delay: Duration,
    pub page_size: usize,
    pub backfill_batch_size: usize,
    pub league_batch_size: usize,
    pub window_days: u32,
    pub lookback_factor: u32,
    pub max_lookback_days: u32,
}

impl Default for SyncSettings {
    fn default() -> Self {
        Self {
            request_delay: DEFAULT_REQUEST_DELAY,
            page_size: DEFAULT_PAGE_SIZE,
            backfill_batch_size: 30,
            league_batch_size: 25,
            window_days: 7,
            lookback_factor: 5,
            max_lookback_days: 90,
        }
    }
}

impl SyncSettings {
    pub fn from_config(config: &AppConfig) -> Self {
        Self {
            request_delay: Duration::from_millis(config.provider.request_delay_ms),
            page_size: config.provider.page_size,
            backfill_batch_size: config.sync.backfill_batch_size,
            league_batch_size: config.sync.league_batch_size,
            window_days: config.sync.window_days,
            lookback_factor: config.sync.lookback_factor,
            max_lookback_days: config.sync.max_lookback_days,
        }
    }

    /// Settings with no inter-request delay
    pub fn without_delay(mut self) -> Self {
        self.request_delay = Duration::ZERO;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackfillRequest {
    pub player_key: String,
    pub season: String,
    pub batch_size: Option<usize>,
    /// Skip dates up to and including this one (hint from a continuation)
    pub resume_after: Option<NaiveDate>,
}

impl BackfillRequest {
    pub fn new(player_key: impl Into<String>, season: impl Into<String>) -> Self {
        Self {
            player_key: player_key.into(),
            season: season.into(),
            batch_size: None,
            resume_after: None,
        }
    }

    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = Some(batch_size);
        self
    }

    /// Next request for a partial report, following its continuation hints.
    pub fn resume(&self, continuation: &Continuation) -> Self {
        Self {
            resume_after: continuation.resume_after.or(self.resume_after),
            batch_size: Some(continuation.batch_size),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LeagueSyncRequest {
    pub league_key: String,
    pub window_days: Option<u32>,
    pub batch_size: Option<usize>,
    /// Index of the first player to process in the league listing
    pub offset: usize,
}

impl LeagueSyncRequest {
    pub fn new(league_key: impl Into<String>) -> Self {
        Self {
            league_key: league_key.into(),
            window_days: None,
            batch_size: None,
            offset: 0,
        }
    }

    pub fn resume(&self, continuation: &Continuation) -> Self {
        Self {
            offset: continuation.offset.unwrap_or(self.offset),
            batch_size: Some(continuation.batch_size),
            window_days: continuation.window_days.or(self.window_days),
            ..self.clone()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecentGamesRequest {
    pub player_key: String,
    pub count: usize,
}

/// Most recent games for one player, newest first
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecentGames {
    pub player_key: String,
    pub requested: usize,
    pub games: Vec<GameLog>,
    pub from_cache: usize,
    pub progress: SyncProgress,
}

pub struct SyncOrchestrator {
    provider: Arc<dyn StatsProvider>,
    cache: CacheStore,
    seasons: SeasonCatalog,
    settings: SyncSettings,
    today: Option<NaiveDate>,
}

impl SyncOrchestrator {
    pub fn new(
        provider: Arc<dyn StatsProvider>,
        cache: CacheStore,
        seasons: SeasonCatalog,
        settings: SyncSettings,
    ) -> Self {
        Self {
            provider,
            cache,
            seasons,
            settings,
            today: None,
        }
    }

    /// Pin "today" instead of reading the clock
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = Some(today);
        self
    }

    fn today(&self) -> NaiveDate {
        self.today.unwrap_or_else(|| Utc::now().date_naive())
    }

    fn fetcher(&self) -> FetchLoop<'_> {
        FetchLoop::new(self.provider.as_ref(), &self.cache, self.settings.request_delay)
    }

    fn require_cache(&self, mode: &str) -> Result<()> {
        if self.cache.is_configured() {
            Ok(())
        } else {
            Err(SyncError::CacheUnavailable(format!(
                "{mode} needs a configured cache store (set database.url)"
            )))
        }
    }

    /// Start of the season containing today, the floor for rolling windows.
    fn window_floor(&self, today: NaiveDate, fallback: NaiveDate) -> NaiveDate {
        self.seasons
            .current(today)
            .map(|(_, bounds)| bounds.start)
            .unwrap_or(fallback)
    }

    /// Fill in a season for one player, at most `batch_size` dates per call.
    #[instrument(skip(self, token, req), fields(player = %req.player_key, season = %req.season))]
    pub async fn backfill_season(
        &self,
        token: &AccessToken,
        req: &BackfillRequest,
    ) -> Result<SyncReport> {
        validate_identity("player", &req.player_key)?;
        require_token(token)?;
        let batch_size = bounded(
            "batch_size",
            req.batch_size.unwrap_or(self.settings.backfill_batch_size),
            MAX_BACKFILL_BATCH,
        )?;
        let season = self.seasons.get(&req.season)?;
        self.require_cache("season backfill")?;

        let today = self.today();
        let plan = planner::after_cursor(planner::season_dates(season, today), req.resume_after);
        let reconciled = reconcile(&self.cache, &req.player_key, &plan).await;

        let mut progress = SyncProgress::new(plan.len());
        let outcome = self
            .fetcher()
            .run(
                token,
                &req.player_key,
                &reconciled.missing,
                batch_size,
                &mut progress,
            )
            .await?;

        let continuation = (outcome.remaining > 0).then(|| Continuation {
            scope: req.player_key.clone(),
            season: Some(req.season.clone()),
            window_days: None,
            batch_size,
            remaining: outcome.remaining,
            resume_after: outcome.last_attempted,
            offset: None,
        });

        info!(
            "Backfill {} {}: {} planned, {} cached before, {} missing; {}",
            req.player_key,
            req.season,
            plan.len(),
            reconciled.cached.len(),
            reconciled.missing.len(),
            progress
        );

        Ok(SyncReport::new(progress, continuation))
    }

    /// Bring the rolling window up to date for a slice of a league's players.
    #[instrument(skip(self, token, req), fields(league = %req.league_key, offset = req.offset))]
    pub async fn sync_league(
        &self,
        token: &AccessToken,
        req: &LeagueSyncRequest,
    ) -> Result<SyncReport> {
        validate_identity("league", &req.league_key)?;
        require_token(token)?;
        let batch_size = bounded(
            "batch_size",
            req.batch_size.unwrap_or(self.settings.league_batch_size),
            MAX_LEAGUE_BATCH,
        )?;
        let window_days = req.window_days.unwrap_or(self.settings.window_days);
        if window_days == 0 || window_days > MAX_WINDOW_DAYS {
            return Err(SyncError::Validation(format!(
                "window_days must be between 1 and {MAX_WINDOW_DAYS}, got {window_days}"
            )));
        }
        self.require_cache("league sync")?;

        let players = list_league_players(
            self.provider.as_ref(),
            token,
            &req.league_key,
            self.settings.page_size,
            None,
            self.settings.request_delay,
        )
        .await?;

        let today = self.today();
        let anchor = today - ChronoDuration::days(1);
        let floor = self.window_floor(today, anchor - ChronoDuration::days(window_days as i64));
        let window = planner::rolling_window(anchor, window_days, floor);

        let start = req.offset.min(players.len());
        let end = (start + batch_size).min(players.len());
        let mut group = SyncProgress::new(players.len() - start);
        let mut results = Vec::with_capacity(end - start);
        let fetcher = self.fetcher();

        for (i, player) in players[start..end].iter().enumerate() {
            if i > 0 && !self.settings.request_delay.is_zero() {
                sleep(self.settings.request_delay).await;
            }

            let reconciled = reconcile(&self.cache, &player.player_key, &window).await;
            let mut progress = SyncProgress::new(window.len());

            let run = fetcher
                .run(
                    token,
                    &player.player_key,
                    &reconciled.missing,
                    window.len(),
                    &mut progress,
                )
                .await;
            group.absorb(&progress);
            group.current = progress.current.or(group.current);

            if let Err(e) = run {
                group.status = ProgressStatus::Error;
                return Err(e.with_progress(&group));
            }

            group.processed += 1;
            progress.status = ProgressStatus::Completed;
            results.push(PlayerSyncResult {
                player_key: player.player_key.clone(),
                player_name: player.name.clone(),
                candidate_dates: window.len(),
                already_cached: reconciled.cached.len(),
                progress,
            });
        }

        let continuation = (end < players.len()).then(|| Continuation {
            scope: req.league_key.clone(),
            season: None,
            window_days: Some(window_days),
            batch_size,
            remaining: players.len() - end,
            resume_after: None,
            offset: Some(end),
        });

        if players.is_empty() {
            warn!("League {} listed no players", req.league_key);
        }
        info!(
            "League sync {}: players {}..{} of {}, window {} days; {}",
            req.league_key,
            start,
            end,
            players.len(),
            window.len(),
            group
        );

        Ok(SyncReport::new(group, continuation).with_results(results))
    }

    /// The `count` most recent games, cache first.
    ///
    /// When the cache already holds `count` games inside the lookback those are
    /// returned without any provider call. Otherwise dates are scanned newest
    /// first, taking cached records where present and fetching the rest, until
    /// `count` games are found. Today is excluded since its games are not final.
    #[instrument(skip(self, token, req), fields(player = %req.player_key, count = req.count))]
    pub async fn recent_games(
        &self,
        token: &AccessToken,
        req: &RecentGamesRequest,
    ) -> Result<RecentGames> {
        validate_identity("player", &req.player_key)?;
        require_token(token)?;
        let count = bounded("count", req.count, MAX_RECENT_COUNT)?;

        let today = self.today();
        let anchor = today - ChronoDuration::days(1);
        let lookback = (count as u32)
            .saturating_mul(self.settings.lookback_factor)
            .clamp(1, self.settings.max_lookback_days.max(1));
        let floor = self.window_floor(today, anchor - ChronoDuration::days(lookback as i64));
        let plan = planner::rolling_window(anchor, lookback, floor);

        let reconciled = reconcile(&self.cache, &req.player_key, &plan).await;
        let mut cached: HashMap<NaiveDate, GameLog> = self
            .cache
            .records(&req.player_key, &reconciled.cached)
            .await
            .into_iter()
            .map(|log| (log.game_date, log))
            .collect();

        let mut progress = SyncProgress::new(plan.len());

        if cached.len() >= count {
            let mut games: Vec<GameLog> = cached.into_values().collect();
            games.sort_by(|a, b| b.game_date.cmp(&a.game_date));
            games.truncate(count);
            progress.games_found = games.len();
            progress.processed = games.len();
            progress.current = games.last().map(|g| g.game_date);
            progress.status = ProgressStatus::Completed;
            return Ok(RecentGames {
                player_key: req.player_key.clone(),
                requested: count,
                from_cache: games.len(),
                games,
                progress,
            });
        }

        let fetcher = self.fetcher();
        let mut games = Vec::with_capacity(count);
        let mut from_cache = 0;

        for date in plan {
            if games.len() >= count {
                break;
            }
            if let Some(log) = cached.remove(&date) {
                progress.advance(date);
                progress.games_found += 1;
                from_cache += 1;
                games.push(log);
                continue;
            }
            if progress.api_calls > 0 && !self.settings.request_delay.is_zero() {
                sleep(self.settings.request_delay).await;
            }
            match fetcher
                .fetch_one(token, &req.player_key, date, &mut progress)
                .await
            {
                Ok(Some(log)) => games.push(log),
                Ok(None) => {}
                Err(e) => {
                    progress.status = ProgressStatus::Error;
                    return Err(e.with_progress(&progress));
                }
            }
        }

        progress.status = ProgressStatus::Completed;
        info!(
            "Recent games {}: {}/{} found ({} from cache); {}",
            req.player_key,
            games.len(),
            count,
            from_cache,
            progress
        );

        Ok(RecentGames {
            player_key: req.player_key.clone(),
            requested: count,
            games,
            from_cache,
            progress,
        })
    }
}

fn require_token(token: &AccessToken) -> Result<()> {
    if token.is_empty() {
        return Err(SyncError::Validation("access token must not be empty".into()));
    }
    Ok(())
}

fn bounded(name: &str, value: usize, max: usize) -> Result<usize> {
    if value == 0 || value > max {
        return Err(SyncError::Validation(format!(
            "{name} must be between 1 and {max}, got {value}"
        )));
    }
    Ok(value)
}
