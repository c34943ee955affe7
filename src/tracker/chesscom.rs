//! Chess.com rating fetcher over the public stats API.
//!
//! Chess.com has no classical pool; daily chess fills that slot. The API
//! requires lowercase usernames.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::AppError;
use crate::rating::RatingData;

const API_URL: &str = "https://api.chess.com/pub/player";

#[derive(Debug, Deserialize)]
struct StatsResponse {
    chess_daily: Option<Pool>,
    chess_rapid: Option<Pool>,
    chess_blitz: Option<Pool>,
    chess_bullet: Option<Pool>,
}

#[derive(Debug, Deserialize)]
struct Pool {
    last: LastRating,
}

#[derive(Debug, Deserialize)]
struct LastRating {
    rating: u32,
}

fn pool(p: Option<Pool>) -> Option<u32> {
    p.map(|p| p.last.rating)
}

/// Fetches the current rating snapshot for a Chess.com username.
pub async fn fetch_rating(client: &reqwest::Client, username: &str) -> Result<RatingData, AppError> {
    let url = format!("{API_URL}/{}/stats", username.to_lowercase());
    let response = client.get(&url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!(
            "Chess.com user '{username}' not found"
        )));
    }
    let stats: StatsResponse = response.error_for_status()?.json().await?;
    Ok(RatingData::from_pools(
        pool(stats.chess_daily),
        pool(stats.chess_rapid),
        pool(stats.chess_blitz),
        pool(stats.chess_bullet),
    ))
}
