use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Status of one in-flight sync invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    Processing,
    Completed,
    Error,
}

/// Per-invocation counters. Never persisted; only a copy is returned.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncProgress {
    /// Candidate units in the planned scope (dates or identities)
    pub total: usize,
    pub processed: usize,
    /// Units where participation was confirmed
    pub games_found: usize,
    /// Records successfully written to the cache
    pub cached: usize,
    pub api_calls: usize,
    pub errors: usize,
    /// Last unit touched by the fetch loop
    pub current: Option<NaiveDate>,
    pub status: ProgressStatus,
}

impl SyncProgress {
    pub fn new(total: usize) -> Self {
        Self {
            total,
            processed: 0,
            games_found: 0,
            cached: 0,
            api_calls: 0,
            errors: 0,
            current: None,
            status: ProgressStatus::Processing,
        }
    }

    pub fn advance(&mut self, date: NaiveDate) {
        self.current = Some(date);
        self.processed += 1;
    }

    /// Fold another identity's counters into a group-wide total.
    /// `total`, `processed` and `current` are owned by the caller.
    pub fn absorb(&mut self, other: &SyncProgress) {
        self.games_found += other.games_found;
        self.cached += other.cached;
        self.api_calls += other.api_calls;
        self.errors += other.errors;
    }
}

impl fmt::Display for SyncProgress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}/{} processed, {} games, {} cached, {} api calls, {} errors",
            self.processed, self.total, self.games_found, self.cached, self.api_calls, self.errors
        )
    }
}

/// Outcome of one orchestrator call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Complete,
    Partial,
}

impl RunStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunStatus::Complete => "complete",
            RunStatus::Partial => "partial",
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller needs to resume an unfinished job.
///
/// Plain data: re-submitting the same parameters is enough, because the
/// remaining work is re-derived from the cache. `resume_after` and `offset`
/// are optional hints that let the next call skip units this call already
/// attempted without caching anything (dates without a game).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Continuation {
    /// Player key (backfill) or league key (league sync)
    pub scope: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window_days: Option<u32>,
    pub batch_size: usize,
    pub remaining: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resume_after: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<usize>,
}

/// Per-identity result inside a league sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerSyncResult {
    pub player_key: String,
    pub player_name: String,
    pub candidate_dates: usize,
    pub already_cached: usize,
    pub progress: SyncProgress,
}

/// Caller-facing summary returned by every orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncReport {
    pub status: RunStatus,
    pub progress: SyncProgress,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub results: Vec<PlayerSyncResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub continuation: Option<Continuation>,
}

impl SyncReport {
    /// Status follows the continuation: partial iff one is present.
    pub fn new(mut progress: SyncProgress, continuation: Option<Continuation>) -> Self {
        progress.status = ProgressStatus::Completed;
        let status = if continuation.is_some() {
            RunStatus::Partial
        } else {
            RunStatus::Complete
        };
        Self {
            status,
            progress,
            results: Vec::new(),
            continuation,
        }
    }

    pub fn with_results(mut self, results: Vec<PlayerSyncResult>) -> Self {
        self.results = results;
        self
    }

    pub fn is_complete(&self) -> bool {
        self.status == RunStatus::Complete
    }

    pub fn remaining(&self) -> usize {
        self.continuation.as_ref().map(|c| c.remaining).unwrap_or(0)
    }
}
