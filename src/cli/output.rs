//! Output formatting for `hoopsync` commands.
//!
//! Supports two modes: human-readable tables (default) and JSON (--json).

use serde::Serialize;
use tabled::{Table, Tabled};

use crate::domain::{GameLog, PlayerSyncResult, SyncReport};
use crate::sync::{PlayerRef, RecentGames};

/// Output mode for command results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Table,
    Json,
}

impl OutputMode {
    pub fn from_json_flag(json: bool) -> Self {
        if json {
            OutputMode::Json
        } else {
            OutputMode::Table
        }
    }
}

/// Print a vec of Tabled + Serialize items in the chosen mode.
pub fn print_items<T: Tabled + Serialize>(items: &[T], mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Table => {
            if items.is_empty() {
                println!("(no results)");
            } else {
                let table = Table::new(items).to_string();
                println!("{table}");
            }
        }
        OutputMode::Json => {
            let json = serde_json::to_string_pretty(items)?;
            println!("{json}");
        }
    }
    Ok(())
}

#[derive(Debug, Serialize, Tabled)]
pub struct ReportRow {
    pub status: String,
    pub total: usize,
    pub processed: usize,
    pub games: usize,
    pub cached: usize,
    pub api_calls: usize,
    pub errors: usize,
    pub remaining: usize,
    pub next: String,
}

impl From<&SyncReport> for ReportRow {
    fn from(r: &SyncReport) -> Self {
        let next = match &r.continuation {
            Some(c) => match (c.resume_after, c.offset) {
                (Some(date), _) => format!("--resume-after {date}"),
                (None, Some(offset)) => format!("--offset {offset}"),
                (None, None) => "re-run".to_string(),
            },
            None => "-".to_string(),
        };
        Self {
            status: r.status.to_string(),
            total: r.progress.total,
            processed: r.progress.processed,
            games: r.progress.games_found,
            cached: r.progress.cached,
            api_calls: r.progress.api_calls,
            errors: r.progress.errors,
            remaining: r.remaining(),
            next,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct PlayerResultRow {
    pub player_key: String,
    pub name: String,
    pub window: usize,
    pub already_cached: usize,
    pub fetched: usize,
    pub games: usize,
    pub errors: usize,
}

impl From<&PlayerSyncResult> for PlayerResultRow {
    fn from(r: &PlayerSyncResult) -> Self {
        Self {
            player_key: r.player_key.clone(),
            name: r.player_name.clone(),
            window: r.candidate_dates,
            already_cached: r.already_cached,
            fetched: r.progress.api_calls,
            games: r.progress.games_found,
            errors: r.progress.errors,
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct GameRow {
    pub date: String,
    pub min: String,
    pub pts: String,
    pub reb: String,
    pub ast: String,
    pub opponent: String,
    pub result: String,
}

fn stat_cell(log: &GameLog, name: &str) -> String {
    log.stat(name).map(|v| format!("{v}")).unwrap_or_else(|| "-".to_string())
}

impl From<&GameLog> for GameRow {
    fn from(log: &GameLog) -> Self {
        Self {
            date: log.game_date.to_string(),
            min: stat_cell(log, "min"),
            pts: stat_cell(log, "pts"),
            reb: stat_cell(log, "reb"),
            ast: stat_cell(log, "ast"),
            opponent: log.opponent.clone().unwrap_or_else(|| "-".to_string()),
            result: log
                .game_result
                .map(|r| r.as_str().to_string())
                .unwrap_or_else(|| "-".to_string()),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
pub struct PlayerRow {
    pub index: usize,
    pub player_key: String,
    pub name: String,
}

#[derive(Debug, Serialize, Tabled)]
pub struct SeasonRow {
    pub season: String,
    pub start: String,
    pub end: String,
    pub current: String,
}

pub fn print_report(report: &SyncReport, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(report)?);
        }
        OutputMode::Table => {
            if !report.results.is_empty() {
                let rows: Vec<PlayerResultRow> = report.results.iter().map(Into::into).collect();
                print_items(&rows, mode)?;
            }
            print_items(&[ReportRow::from(report)], mode)?;
        }
    }
    Ok(())
}

pub fn print_recent(recent: &RecentGames, mode: OutputMode) -> anyhow::Result<()> {
    match mode {
        OutputMode::Json => {
            println!("{}", serde_json::to_string_pretty(recent)?);
        }
        OutputMode::Table => {
            let name = recent
                .games
                .first()
                .map(|g| g.player_name.as_str())
                .filter(|n| !n.is_empty())
                .unwrap_or(recent.player_key.as_str());
            println!(
                "{}: {} of {} requested games ({} from cache, {} api calls)",
                name,
                recent.games.len(),
                recent.requested,
                recent.from_cache,
                recent.progress.api_calls
            );
            let rows: Vec<GameRow> = recent.games.iter().map(Into::into).collect();
            print_items(&rows, mode)?;
        }
    }
    Ok(())
}

pub fn player_rows(players: &[PlayerRef]) -> Vec<PlayerRow> {
    players
        .iter()
        .enumerate()
        .map(|(index, p)| PlayerRow {
            index,
            player_key: p.player_key.clone(),
            name: p.name.clone(),
        })
        .collect()
}
