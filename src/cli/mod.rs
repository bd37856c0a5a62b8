//! hoopsync CLI
//!
//! Commands:
//! - `hoopsync backfill` - Fill a player's season into the cache
//! - `hoopsync sync-league` - Refresh the rolling window for a league's players
//! - `hoopsync recent` - Most recent games for one player
//! - `hoopsync players` - List a league's players
//! - `hoopsync migrate` - Apply the cache schema
//! - `hoopsync seasons` - List known seasons

pub mod output;

use anyhow::{Context, Result};
use chrono::{NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

use crate::adapters::{PostgresStore, YahooClient};
use crate::config::AppConfig;
use crate::domain::{SeasonCatalog, SyncReport};
use crate::error::SyncError;
use crate::sync::{
    list_league_players, AccessToken, BackfillRequest, CacheStore, LeagueSyncRequest,
    RecentGamesRequest, SyncOrchestrator, SyncSettings,
};
use output::{player_rows, print_items, print_recent, print_report, OutputMode, SeasonRow};

/// Exit code when the provider rejected the access token
pub const EXIT_UNAUTHORIZED: u8 = 2;
/// Exit code for invalid arguments or configuration (EX_USAGE)
pub const EXIT_INVALID_INPUT: u8 = 64;
pub const EXIT_FAILURE: u8 = 1;

/// Incremental game-log sync for fantasy basketball players
#[derive(Parser, Debug)]
#[command(name = "hoopsync")]
#[command(author, version, about = "Incremental player game-log sync")]
pub struct Cli {
    /// Configuration directory (default.toml, {HOOPSYNC_ENV}.toml)
    #[arg(long, global = true, default_value = "config")]
    pub config: PathBuf,

    /// Provider bearer token
    #[arg(long, global = true, env = "HOOPSYNC_ACCESS_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Print JSON instead of tables
    #[arg(long, global = true)]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Backfill one player's season, a batch of dates at a time
    Backfill {
        player_key: String,
        /// Season key, e.g. 2024-25 (defaults to the current season)
        #[arg(long)]
        season: Option<String>,
        #[arg(long)]
        batch_size: Option<usize>,
        /// Skip dates up to and including this one (YYYY-MM-DD)
        #[arg(long)]
        resume_after: Option<NaiveDate>,
        /// Keep going until the season is complete
        #[arg(long)]
        all: bool,
    },

    /// Refresh the recent window for every player in a league
    SyncLeague {
        league_key: String,
        #[arg(long)]
        window_days: Option<u32>,
        /// Players per call
        #[arg(long)]
        batch_size: Option<usize>,
        /// Index of the first player to process
        #[arg(long, default_value = "0")]
        offset: usize,
        /// Keep going until every player is done
        #[arg(long)]
        all: bool,
    },

    /// Most recent games for one player, cache first
    Recent {
        player_key: String,
        #[arg(short, long, default_value = "10")]
        count: usize,
    },

    /// List the players in a league
    Players { league_key: String },

    /// Apply database migrations
    Migrate,

    /// List known seasons
    Seasons,
}

impl Cli {
    pub async fn run(self, config: AppConfig) -> Result<()> {
        let mode = OutputMode::from_json_flag(self.json);
        let seasons = SeasonCatalog::with_overrides(&config.seasons)?;

        match self.command {
            Commands::Seasons => print_seasons(&seasons, mode),
            Commands::Migrate => {
                let db = config.database.as_ref().ok_or_else(|| {
                    SyncError::CacheUnavailable("migrate needs database.url".to_string())
                })?;
                let store = PostgresStore::new(&db.url, db.max_connections).await?;
                store.migrate().await?;
                println!("Migrations applied");
                Ok(())
            }
            Commands::Players { league_key } => {
                let token = require_token(self.token)?;
                crate::domain::validate_identity("league", &league_key)?;
                let client = provider(&config)?;
                let players = list_league_players(
                    &client,
                    &token,
                    &league_key,
                    config.provider.page_size,
                    None,
                    Duration::from_millis(config.provider.request_delay_ms),
                )
                .await?;
                print_items(&player_rows(&players), mode)
            }
            Commands::Backfill {
                player_key,
                season,
                batch_size,
                resume_after,
                all,
            } => {
                let token = require_token(self.token)?;
                let season = match season {
                    Some(s) => s,
                    None => current_season(&seasons)?,
                };
                let orchestrator = orchestrator(&config, seasons).await?;
                let mut req = BackfillRequest {
                    player_key,
                    season,
                    batch_size,
                    resume_after,
                };
                loop {
                    let report = orchestrator.backfill_season(&token, &req).await?;
                    print_report(&report, mode)?;
                    match next_round(&report, all) {
                        Some(cont) => req = req.resume(cont),
                        None => return Ok(()),
                    }
                }
            }
            Commands::SyncLeague {
                league_key,
                window_days,
                batch_size,
                offset,
                all,
            } => {
                let token = require_token(self.token)?;
                let orchestrator = orchestrator(&config, seasons).await?;
                let mut req = LeagueSyncRequest {
                    league_key,
                    window_days,
                    batch_size,
                    offset,
                };
                loop {
                    let report = orchestrator.sync_league(&token, &req).await?;
                    print_report(&report, mode)?;
                    match next_round(&report, all) {
                        Some(cont) => req = req.resume(cont),
                        None => return Ok(()),
                    }
                }
            }
            Commands::Recent { player_key, count } => {
                let token = require_token(self.token)?;
                let orchestrator = orchestrator(&config, seasons).await?;
                let recent = orchestrator
                    .recent_games(&token, &RecentGamesRequest { player_key, count })
                    .await?;
                print_recent(&recent, mode)
            }
        }
    }
}

/// The continuation to follow when `--all` is set and the last call moved forward.
fn next_round(report: &SyncReport, all: bool) -> Option<&crate::domain::Continuation> {
    if !all {
        return None;
    }
    let cont = report.continuation.as_ref()?;
    if report.progress.processed == 0 {
        warn!("No progress in the last call, stopping with {} remaining", cont.remaining);
        return None;
    }
    info!("Continuing, {} remaining", cont.remaining);
    Some(cont)
}

fn require_token(token: Option<String>) -> Result<AccessToken> {
    let token = AccessToken::new(token.unwrap_or_default());
    if token.is_empty() {
        return Err(SyncError::Validation(
            "an access token is required (--token or HOOPSYNC_ACCESS_TOKEN)".to_string(),
        )
        .into());
    }
    Ok(token)
}

fn current_season(seasons: &SeasonCatalog) -> Result<String> {
    seasons
        .current(Utc::now().date_naive())
        .map(|(key, _)| key.to_string())
        .ok_or_else(|| SyncError::Validation("no season has started yet; pass --season".into()).into())
}

fn provider(config: &AppConfig) -> Result<YahooClient> {
    let client = YahooClient::new(
        Some(&config.provider.base_url),
        Duration::from_secs(config.provider.timeout_secs),
        &config.provider.user_agent,
    )?;
    info!("Provider: {}", client.base_url());
    Ok(client)
}

/// Connect the cache when configured. A connection failure leaves the cache
/// unconfigured; modes that need it then refuse to run.
async fn cache(config: &AppConfig) -> CacheStore {
    let Some(db) = &config.database else {
        info!("No database configured, running without a cache");
        return CacheStore::unconfigured();
    };
    match PostgresStore::new(&db.url, db.max_connections).await {
        Ok(store) => CacheStore::new(Arc::new(store)),
        Err(e) => {
            warn!("Cache store unavailable, continuing without it: {}", e);
            CacheStore::unconfigured()
        }
    }
}

async fn orchestrator(config: &AppConfig, seasons: SeasonCatalog) -> Result<SyncOrchestrator> {
    let client = provider(config)?;
    let cache = cache(config).await;
    Ok(SyncOrchestrator::new(
        Arc::new(client),
        cache,
        seasons,
        SyncSettings::from_config(config),
    ))
}

fn print_seasons(seasons: &SeasonCatalog, mode: OutputMode) -> Result<()> {
    let today = Utc::now().date_naive();
    let current = seasons.current(today).map(|(key, _)| key.to_string());
    let rows: Vec<SeasonRow> = seasons
        .iter()
        .map(|(key, bounds)| SeasonRow {
            season: key.clone(),
            start: bounds.start.to_string(),
            end: bounds.end.to_string(),
            current: if current.as_deref() == Some(key.as_str()) {
                "*".to_string()
            } else {
                String::new()
            },
        })
        .collect();
    print_items(&rows, mode).context("printing seasons")
}

/// Process exit code for a failed command.
pub fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<SyncError>() {
        Some(e) if e.is_unauthorized() => EXIT_UNAUTHORIZED,
        Some(e) if e.is_invalid_input() => EXIT_INVALID_INPUT,
        Some(SyncError::Config(_)) => EXIT_INVALID_INPUT,
        _ => EXIT_FAILURE,
    }
}
