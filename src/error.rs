use thiserror::Error;

use crate::domain::SyncProgress;

/// Main error type for the sync pipeline
#[derive(Error, Debug)]
pub enum SyncError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Cache store unavailable: {0}")]
    CacheUnavailable(String),

    // Network errors
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Provider error: status={status} {detail}")]
    Provider { status: u16, detail: String },

    /// Upstream rejected the bearer credential. Carries the progress made
    /// before the rejection so the caller can see what was already written.
    #[error("Unauthorized, credential invalid or expired: {reason}")]
    Unauthorized {
        reason: String,
        progress: Option<Box<SyncProgress>>,
    },

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // Input errors
    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Unknown season: {0}")]
    UnknownSeason(String),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl SyncError {
    /// Build an unauthorized error before any unit has been processed.
    pub fn unauthorized(reason: impl Into<String>) -> Self {
        SyncError::Unauthorized {
            reason: reason.into(),
            progress: None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self, SyncError::Unauthorized { .. })
    }

    pub fn is_invalid_input(&self) -> bool {
        matches!(self, SyncError::Validation(_) | SyncError::UnknownSeason(_))
    }

    /// Attach the loop's progress to an unauthorized error; other errors pass through.
    pub fn with_progress(self, progress: &SyncProgress) -> Self {
        match self {
            SyncError::Unauthorized { reason, .. } => SyncError::Unauthorized {
                reason,
                progress: Some(Box::new(progress.clone())),
            },
            other => other,
        }
    }
}

/// Result type alias for SyncError
pub type Result<T> = std::result::Result<T, SyncError>;
