//! Incremental game-log sync: plan candidate dates, drop the cached ones,
//! fetch the rest one at a time and write each confirmed game through.

pub mod cache;
pub mod decoder;
pub mod fetch_loop;
pub mod orchestrator;
pub mod planner;
pub mod provider;
pub mod reconciler;
pub mod roster;

#[cfg(test)]
pub mod mock;

pub use cache::{CacheStore, GameLogBackend};
pub use decoder::{decode_stat_vector, DecodedStats};
pub use fetch_loop::{FetchLoop, LoopOutcome, DEFAULT_REQUEST_DELAY};
pub use orchestrator::{
    BackfillRequest, LeagueSyncRequest, RecentGames, RecentGamesRequest, SyncOrchestrator,
    SyncSettings,
};
pub use provider::{AccessToken, PlayerRef, StatsProvider};
pub use reconciler::{reconcile, Reconciled};
pub use roster::{list_league_players, DEFAULT_PAGE_SIZE};
