//! Error types for the bot.
//!
//! `AppError` is the top-level error type aggregating every failure the bot
//! can hit: configuration problems, Discord API errors, rating-site HTTP
//! errors, store (de)serialization and IO errors, and scheduler errors. No
//! variant is fatal to the process; handlers log and continue servicing
//! subsequent events.

use thiserror::Error;

/// Top-level application error type.
#[derive(Error, Debug)]
pub enum AppError {
    /// Configuration error during startup or environment variable loading.
    #[error(transparent)]
    ConfigErr(#[from] ConfigError),

    /// Discord API error from Serenity.
    ///
    /// Boxed due to large size.
    #[error(transparent)]
    DiscordErr(#[from] Box<serenity::Error>),

    /// HTTP client request error from reqwest (rating-site APIs).
    #[error(transparent)]
    ReqwestErr(#[from] reqwest::Error),

    /// JSON (de)serialization error from the tracked-data store.
    #[error(transparent)]
    JsonErr(#[from] serde_json::Error),

    /// Filesystem error reading or writing the tracked-data store.
    #[error(transparent)]
    IoErr(#[from] std::io::Error),

    /// Cron scheduler error from the polling update cycle.
    #[error(transparent)]
    SchedulerErr(#[from] tokio_cron_scheduler::JobSchedulerError),

    /// A tracked entity (account, guild, member) could not be found.
    #[error("{0}")]
    NotFound(String),
}

/// Manual conversion from serenity::Error to AppError.
///
/// Boxes the error to reduce the size of the AppError enum, as serenity::Error
/// is very large and would make all AppError variants larger if not boxed.
impl From<serenity::Error> for AppError {
    fn from(err: serenity::Error) -> Self {
        AppError::DiscordErr(Box::new(err))
    }
}

/// Configuration errors raised while loading `Config` from the environment.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Required environment variable is not set.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Environment variable is set but could not be parsed.
    #[error("Invalid value for {name}: {reason}")]
    InvalidEnvVar { name: String, reason: String },

    /// Rating thresholds must be a non-empty, strictly increasing sequence.
    #[error("Invalid rating thresholds: {0}")]
    InvalidThresholds(String),
}
