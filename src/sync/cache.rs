//! Game log cache with a degrade-to-miss policy.
//!
//! [`GameLogBackend`] is the raw, fallible store interface (implemented by
//! `PostgresStore`). [`CacheStore`] wraps an optional backend and never
//! fails: reads degrade to a total miss and writes report `false`.

use async_trait::async_trait;
use chrono::NaiveDate;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::domain::GameLog;
use crate::error::Result;

/// Minimal persistence interface used by the sync pipeline.
#[async_trait]
pub trait GameLogBackend: Send + Sync {
    /// Which of `dates` already have a record for this player
    async fn existing_dates(&self, player_key: &str, dates: &[NaiveDate]) -> Result<Vec<NaiveDate>>;

    /// All recorded dates for this player inside `[start, end]`
    async fn dates_between(
        &self,
        player_key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>>;

    /// Insert or overwrite on `(player_key, game_date)`
    async fn upsert_game_log(&self, log: &GameLog) -> Result<()>;

    /// Stored records for this player on the given dates
    async fn game_logs(&self, player_key: &str, dates: &[NaiveDate]) -> Result<Vec<GameLog>>;
}

#[async_trait]
impl GameLogBackend for crate::adapters::PostgresStore {
    async fn existing_dates(&self, player_key: &str, dates: &[NaiveDate]) -> Result<Vec<NaiveDate>> {
        self.get_game_dates(player_key, dates).await
    }
    async fn dates_between(
        &self,
        player_key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> Result<Vec<NaiveDate>> {
        self.get_game_dates_between(player_key, start, end).await
    }
    async fn upsert_game_log(&self, log: &GameLog) -> Result<()> {
        self.upsert_game_log(log).await
    }
    async fn game_logs(&self, player_key: &str, dates: &[NaiveDate]) -> Result<Vec<GameLog>> {
        self.get_game_logs(player_key, dates).await
    }
}

/// Cache adapter used by the reconciler, fetch loop and orchestrators
#[derive(Clone)]
pub struct CacheStore {
    backend: Option<Arc<dyn GameLogBackend>>,
}

impl CacheStore {
    pub fn new(backend: Arc<dyn GameLogBackend>) -> Self {
        Self {
            backend: Some(backend),
        }
    }

    /// Always-miss, never-persist mode
    pub fn unconfigured() -> Self {
        Self { backend: None }
    }

    pub fn is_configured(&self) -> bool {
        self.backend.is_some()
    }

    /// Dates in `dates` that already have a record. Empty on any failure.
    pub async fn get(&self, player_key: &str, dates: &[NaiveDate]) -> HashSet<NaiveDate> {
        let Some(backend) = &self.backend else {
            return HashSet::new();
        };
        if dates.is_empty() {
            return HashSet::new();
        }
        match backend.existing_dates(player_key, dates).await {
            Ok(found) => found.into_iter().collect(),
            Err(e) => {
                warn!("Cache lookup failed for {}, treating as miss: {}", player_key, e);
                HashSet::new()
            }
        }
    }

    /// Recorded dates within `[start, end]`. Empty on any failure.
    pub async fn dates_in_range(
        &self,
        player_key: &str,
        start: NaiveDate,
        end: NaiveDate,
    ) -> HashSet<NaiveDate> {
        let Some(backend) = &self.backend else {
            return HashSet::new();
        };
        if end < start {
            return HashSet::new();
        }
        match backend.dates_between(player_key, start, end).await {
            Ok(found) => found.into_iter().collect(),
            Err(e) => {
                warn!(
                    "Cache range lookup failed for {} ({}..{}), treating as miss: {}",
                    player_key, start, end, e
                );
                HashSet::new()
            }
        }
    }

    /// Idempotent write. `false` means "count as error and move on".
    pub async fn upsert(&self, log: &GameLog) -> bool {
        let Some(backend) = &self.backend else {
            return false;
        };
        match backend.upsert_game_log(log).await {
            Ok(()) => {
                debug!("Cached {}", log);
                true
            }
            Err(e) => {
                warn!("Cache write failed for {}: {}", log, e);
                false
            }
        }
    }

    /// Cached records for the given dates. Empty on any failure.
    pub async fn records(&self, player_key: &str, dates: &[NaiveDate]) -> Vec<GameLog> {
        let Some(backend) = &self.backend else {
            return Vec::new();
        };
        if dates.is_empty() {
            return Vec::new();
        }
        match backend.game_logs(player_key, dates).await {
            Ok(logs) => logs,
            Err(e) => {
                warn!("Cache read failed for {}, treating as miss: {}", player_key, e);
                Vec::new()
            }
        }
    }
}
