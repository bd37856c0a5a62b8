pub mod adapters;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod sync;

pub use adapters::{PostgresStore, YahooClient};
pub use config::AppConfig;
pub use domain::{GameLog, SeasonCatalog, SyncProgress, SyncReport};
pub use error::{Result, SyncError};
pub use sync::{
    AccessToken, BackfillRequest, CacheStore, LeagueSyncRequest, RecentGamesRequest,
    StatsProvider, SyncOrchestrator, SyncSettings,
};
