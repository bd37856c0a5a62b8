use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;

use crate::adapters::DEFAULT_YAHOO_API_BASE;
use crate::domain::SeasonBounds;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub provider: ProviderConfig,
    /// Cache store; absent means every sync runs without persistence
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
    #[serde(default)]
    pub sync: SyncConfig,
    /// Extra or overriding season bounds, keyed like "2024-25"
    #[serde(default)]
    pub seasons: BTreeMap<String, SeasonBounds>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ProviderConfig {
    /// REST API base URL
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Per-request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Pause between consecutive provider requests
    #[serde(default = "default_request_delay_ms")]
    pub request_delay_ms: u64,
    /// League listing page size
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

fn default_base_url() -> String {
    DEFAULT_YAHOO_API_BASE.to_string()
}

fn default_timeout_secs() -> u64 {
    15
}

fn default_request_delay_ms() -> u64 {
    200
}

fn default_page_size() -> usize {
    25
}

fn default_user_agent() -> String {
    concat!("hoopsync/", env!("CARGO_PKG_VERSION")).to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_secs: default_timeout_secs(),
            request_delay_ms: default_request_delay_ms(),
            page_size: default_page_size(),
            user_agent: default_user_agent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,
    /// Maximum connections in pool
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_max_connections() -> u32 {
    5
}

#[derive(Debug, Clone, Deserialize)]
pub struct SyncConfig {
    /// Dates per season backfill call
    #[serde(default = "default_backfill_batch_size")]
    pub backfill_batch_size: usize,
    /// Players per league sync call
    #[serde(default = "default_league_batch_size")]
    pub league_batch_size: usize,
    /// Rolling window length for league sync
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Recent-N lookback days per requested game
    #[serde(default = "default_lookback_factor")]
    pub lookback_factor: u32,
    /// Upper bound on the recent-N lookback
    #[serde(default = "default_max_lookback_days")]
    pub max_lookback_days: u32,
}

fn default_backfill_batch_size() -> usize {
    30
}

fn default_league_batch_size() -> usize {
    25
}

fn default_window_days() -> u32 {
    7
}

fn default_lookback_factor() -> u32 {
    5
}

fn default_max_lookback_days() -> u32 {
    90
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            backfill_batch_size: default_backfill_batch_size(),
            league_batch_size: default_league_batch_size(),
            window_days: default_window_days(),
            lookback_factor: default_lookback_factor(),
            max_lookback_days: default_max_lookback_days(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error); `RUST_LOG` wins when set
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
    /// Directory for the daily rolling log file; console only when unset
    #[serde(default)]
    pub log_dir: Option<String>,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
            log_dir: None,
        }
    }
}

impl AppConfig {
    /// Load configuration from files and environment
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config")
    }

    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Config::builder()
            // Start with default values
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)?
            .set_default("provider.request_delay_ms", 200)?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("HOOPSYNC_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (HOOPSYNC_DATABASE__URL, etc.)
            .add_source(
                Environment::with_prefix("HOOPSYNC")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if !self.provider.base_url.starts_with("http://")
            && !self.provider.base_url.starts_with("https://")
        {
            errors.push(format!(
                "provider.base_url must be an http(s) URL, got {:?}",
                self.provider.base_url
            ));
        }
        if self.provider.timeout_secs == 0 {
            errors.push("provider.timeout_secs must be positive".to_string());
        }
        if self.provider.page_size == 0 || self.provider.page_size > 25 {
            errors.push("provider.page_size must be between 1 and 25".to_string());
        }

        if let Some(db) = &self.database {
            if db.url.trim().is_empty() {
                errors.push("database.url must not be empty when [database] is set".to_string());
            }
            if db.max_connections == 0 {
                errors.push("database.max_connections must be positive".to_string());
            }
        }

        if self.sync.backfill_batch_size == 0 || self.sync.backfill_batch_size > 500 {
            errors.push("sync.backfill_batch_size must be between 1 and 500".to_string());
        }
        if self.sync.league_batch_size == 0 || self.sync.league_batch_size > 200 {
            errors.push("sync.league_batch_size must be between 1 and 200".to_string());
        }
        if self.sync.window_days == 0 || self.sync.window_days > 60 {
            errors.push("sync.window_days must be between 1 and 60".to_string());
        }
        if self.sync.lookback_factor == 0 {
            errors.push("sync.lookback_factor must be positive".to_string());
        }
        if self.sync.max_lookback_days == 0 {
            errors.push("sync.max_lookback_days must be positive".to_string());
        }

        for (key, bounds) in &self.seasons {
            if bounds.end < bounds.start {
                errors.push(format!("season {key} ends before it starts"));
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}
