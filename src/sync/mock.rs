//! In-memory test doubles for the cache backend and the stats provider.

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;

use super::cache::GameLogBackend;
use super::provider::{AccessToken, PlayerRef, StatsProvider};
use crate::domain::GameLog;
use crate::error::{Result, SyncError};

/// Backend keyed on `(player_key, game_date)` with switchable failures.
#[derive(Default)]
pub struct MockBackend {
    rows: Mutex<BTreeMap<(String, NaiveDate), GameLog>>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, log: GameLog) {
        self.rows
            .lock()
            .unwrap()
            .insert((log.player_key.clone(), log.game_date), log);
    }

    pub fn fail_reads(&self, on: bool) {
        self.fail_reads.store(on, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, on: bool) {
        self.fail_writes.store(on, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    pub fn snapshot(&self) -> BTreeMap<(String, NaiveDate), GameLog> {
        self.rows.lock().unwrap().clone()
    }

    pub fn dates_for(&self, player_key: &str) -> Vec<NaiveDate> {
        self.rows
            .lock()
            .unwrap()
            .keys()
            .filter(|(p, _)| p == player_key)
            .map(|(_, d)| *d)
            .collect()
    }

    fn check_read(&self) -> Result<()> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(SyncError::Internal("mock read failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl GameLogBackend for MockBackend {
    async fn existing_dates(&self, player_key: &str, dates: &[NaiveDate]) -> Result<Vec<NaiveDate>> {
        self.check_read()?;
        let rows = self.rows.lock().unwrap();
        Ok(dates
            .iter()
            .filter(|d| rows.contains_key(&(player_key.to_string(), **d)))
            .copied()
            .collect())
    }

    async fn dates_between(
        &self,
        player_key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        self.check_read()?;
        Ok(self
            .dates_for(player_key)
            .into_iter()
            .filter(|d| *d >= start && *d <= end)
            .collect())
    }

    async fn upsert_game_log(&self, log: &GameLog) -> Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(SyncError::Internal("mock write failure".into()));
        }
        self.seed(log.clone());
        Ok(())
    }

    async fn game_logs(&self, player_key: &str, dates: &[NaiveDate]) -> Result<Vec<GameLog>> {
        self.check_read()?;
        let rows = self.rows.lock().unwrap();
        Ok(dates
            .iter()
            .filter_map(|d| rows.get(&(player_key.to_string(), *d)).cloned())
            .collect())
    }
}

/// Scripted reply for one `(player, date)` fetch
#[derive(Debug, Clone)]
pub enum Reply {
    Played(f64),
    NoGame,
    Fail,
    Unauthorized,
}

/// Provider that answers from a script; unscripted dates are "no game".
#[derive(Default)]
pub struct ScriptedProvider {
    replies: Mutex<HashMap<(String, NaiveDate), Reply>>,
    roster: Mutex<Vec<PlayerRef>>,
    roster_fail_at: Mutex<Option<usize>>,
    calls: Mutex<Vec<(String, NaiveDate)>>,
    page_calls: AtomicUsize,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, player_key: &str, date: NaiveDate, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert((player_key.to_string(), date), reply);
    }

    pub fn roster(&self, players: Vec<PlayerRef>) {
        *self.roster.lock().unwrap() = players;
    }

    /// Fail the roster page that starts at `start`
    pub fn fail_roster_at(&self, start: usize) {
        *self.roster_fail_at.lock().unwrap() = Some(start);
    }

    pub fn calls(&self) -> Vec<(String, NaiveDate)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }
}

fn played_payload(name: &str, pts: f64) -> Value {
    json!({
        "fantasy_content": {
            "player": [
                [{"player_key": "x"}, {"name": {"full": name}}],
                {"player_stats": {"stats": [
                    {"stat": {"stat_id": "12", "value": pts.to_string()}},
                    {"stat": {"stat_id": "3", "value": "30"}}
                ]}}
            ]
        }
    })
}

fn no_game_payload() -> Value {
    json!({
        "fantasy_content": {
            "player": [
                [{"player_key": "x"}, {"name": {"full": "Bench Player"}}],
                {"player_stats": {"stats": [
                    {"stat": {"stat_id": "12", "value": "-"}},
                    {"stat": {"stat_id": "3", "value": "-"}}
                ]}}
            ]
        }
    })
}

#[async_trait]
impl StatsProvider for ScriptedProvider {
    async fn player_stats_by_date(
        &self,
        _token: &AccessToken,
        player_key: &str,
        date: NaiveDate,
    ) -> Result<Value> {
        self.calls
            .lock()
            .unwrap()
            .push((player_key.to_string(), date));
        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&(player_key.to_string(), date))
            .cloned()
            .unwrap_or(Reply::NoGame);
        match reply {
            Reply::Played(pts) => Ok(played_payload("Test Player", pts)),
            Reply::NoGame => Ok(no_game_payload()),
            Reply::Fail => Err(SyncError::Provider {
                status: 500,
                detail: "scripted failure".into(),
            }),
            Reply::Unauthorized => Err(SyncError::unauthorized("scripted 401")),
        }
    }

    async fn league_players(
        &self,
        _token: &AccessToken,
        _league_key: &str,
        start: usize,
        count: usize,
    ) -> Result<Vec<PlayerRef>> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        if *self.roster_fail_at.lock().unwrap() == Some(start) {
            return Err(SyncError::Provider {
                status: 503,
                detail: "scripted page failure".into(),
            });
        }
        let roster = self.roster.lock().unwrap();
        Ok(roster.iter().skip(start).take(count).cloned().collect())
    }
}
