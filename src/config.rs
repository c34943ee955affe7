//! Process-wide configuration loaded once at startup.
//!
//! Everything the bot needs is read from environment variables (with a
//! `.env` file supported via dotenvy in `main`). Only the Discord token and
//! the tracked-data file path are required; the rest fall back to the
//! defaults the community deployment uses. Rating thresholds are validated
//! here so a malformed band ladder is caught at boot rather than rediscovered
//! on every role mutation.

use std::time::Duration;

use crate::error::{AppError, ConfigError};
use crate::rating::band::RatingThresholds;

const FEN_API_URL: &str = "https://www.chess.com/dynboard";
const LICHESS_ANALYSIS_FEN_URL: &str = "https://lichess.org/analysis";
const LICHESS_PROFILE_URL: &str = "https://lichess.org/@/";
const CHESSCOM_PROFILE_URL: &str = "https://www.chess.com/member/";

pub struct Config {
    pub discord_bot_token: String,
    /// Path of the flat JSON document holding tracked accounts.
    pub data_file: String,

    /// Ascending rating cutoffs the band ladder is derived from.
    pub thresholds: RatingThresholds,

    pub bot_channel_name: String,
    pub mod_channel_name: String,
    pub unranked_role_name: String,
    pub mod_role_name: String,
    pub league_role_name: String,
    pub arena_role_name: String,
    pub study_role_name: String,

    /// User ids allowed to run the owner-only diagnostic command.
    pub owners: Vec<u64>,

    /// Delay before a bot-channel response is deleted.
    pub delete_delay: Duration,
    pub embed_color: u32,

    /// Board rendering options passed to the dynboard endpoint.
    pub fen_board: String,
    pub fen_board_pieces: String,
    pub fen_board_coords: String,
    pub fen_board_size: String,

    /// Minutes between full polling passes over tracked accounts.
    pub poll_interval_minutes: u32,
    /// Days since the last observed rating change for `!active` membership.
    pub active_window_days: i64,

    pub fen_api_url: String,
    pub lichess_analysis_url: String,
    pub lichess_profile_url: String,
    pub chesscom_profile_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self, AppError> {
        let raw_thresholds = var_or("RATING_THRESHOLDS", "800,1000,1200,1400,1600,1800,2000");
        let thresholds = RatingThresholds::parse(&raw_thresholds)?;

        let owners = parse_owners(&var_or("BOT_OWNERS", ""))?;

        let delete_delay_secs = parse_var("DELETE_DELAY_SECS", "15")?;
        let embed_color = u32::from_str_radix(var_or("EMBED_COLOR", "2b6da3").trim_start_matches('#'), 16)
            .map_err(|e| ConfigError::InvalidEnvVar {
                name: "EMBED_COLOR".to_string(),
                reason: e.to_string(),
            })?;

        Ok(Self {
            discord_bot_token: std::env::var("DISCORD_BOT_TOKEN")
                .map_err(|_| ConfigError::MissingEnvVar("DISCORD_BOT_TOKEN".to_string()))?,
            data_file: var_or("DATA_FILE", "tracked.json"),
            thresholds,
            bot_channel_name: var_or("BOT_CHANNEL_NAME", "rating-bot"),
            mod_channel_name: var_or("MOD_CHANNEL_NAME", "mod-room"),
            unranked_role_name: var_or("UNRANKED_ROLE_NAME", "Unranked"),
            mod_role_name: var_or("MOD_ROLE_NAME", "Moderator"),
            league_role_name: var_or("LEAGUE_ROLE_NAME", "League"),
            arena_role_name: var_or("ARENA_ROLE_NAME", "Arena"),
            study_role_name: var_or("STUDY_ROLE_NAME", "Study"),
            owners,
            delete_delay: Duration::from_secs(delete_delay_secs),
            embed_color,
            fen_board: var_or("FEN_BOARD", "brown"),
            fen_board_pieces: var_or("FEN_BOARD_PIECES", "classic"),
            fen_board_coords: var_or("FEN_BOARD_COORDS", "outside"),
            fen_board_size: var_or("FEN_BOARD_SIZE", "3"),
            poll_interval_minutes: parse_var("POLL_INTERVAL_MINUTES", "30")?,
            active_window_days: parse_var("ACTIVE_WINDOW_DAYS", "14")?,
            fen_api_url: FEN_API_URL.to_string(),
            lichess_analysis_url: LICHESS_ANALYSIS_FEN_URL.to_string(),
            lichess_profile_url: LICHESS_PROFILE_URL.to_string(),
            chesscom_profile_url: CHESSCOM_PROFILE_URL.to_string(),
        })
    }
}

fn var_or(name: &str, default: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| default.to_string())
}

fn parse_var<T: std::str::FromStr>(name: &str, default: &str) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    var_or(name, default)
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar {
            name: name.to_string(),
            reason: e.to_string(),
        })
}

/// Parses the comma-separated owner allowlist. An empty value is allowed and
/// simply disables the diagnostic command.
fn parse_owners(raw: &str) -> Result<Vec<u64>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| {
            s.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
                name: "BOT_OWNERS".to_string(),
                reason: format!("{s}: {e}"),
            })
        })
        .collect()
}

#[cfg(test)]
mod test {
    use super::*;

    /// Tests that a well-formed owner list parses.
    #[test]
    fn parses_owner_list() {
        let owners = parse_owners("123, 456,789").unwrap();
        assert_eq!(owners, vec![123, 456, 789]);
    }

    /// Tests that an empty owner list is allowed.
    #[test]
    fn empty_owner_list_is_allowed() {
        assert!(parse_owners("").unwrap().is_empty());
    }

    /// Tests that a non-numeric owner id is rejected.
    #[test]
    fn rejects_bad_owner_id() {
        assert!(parse_owners("123,abc").is_err());
    }
}
