//! Lichess rating fetcher over the public user API.

use reqwest::StatusCode;
use serde::Deserialize;

use crate::error::AppError;
use crate::rating::RatingData;

const API_URL: &str = "https://lichess.org/api/user";

#[derive(Debug, Deserialize)]
struct UserResponse {
    #[serde(default)]
    perfs: Perfs,
}

#[derive(Debug, Default, Deserialize)]
struct Perfs {
    classical: Option<Perf>,
    rapid: Option<Perf>,
    blitz: Option<Perf>,
    bullet: Option<Perf>,
}

#[derive(Debug, Deserialize)]
struct Perf {
    rating: u32,
    /// Provisional ratings are treated as absent.
    #[serde(default)]
    prov: bool,
}

fn pool(perf: Option<Perf>) -> Option<u32> {
    perf.filter(|p| !p.prov).map(|p| p.rating)
}

/// Fetches the current rating snapshot for a Lichess username.
pub async fn fetch_rating(client: &reqwest::Client, username: &str) -> Result<RatingData, AppError> {
    let url = format!("{API_URL}/{username}");
    let response = client.get(&url).send().await?;
    if response.status() == StatusCode::NOT_FOUND {
        return Err(AppError::NotFound(format!(
            "Lichess user '{username}' not found"
        )));
    }
    let user: UserResponse = response.error_for_status()?.json().await?;
    Ok(RatingData::from_pools(
        pool(user.perfs.classical),
        pool(user.perfs.rapid),
        pool(user.perfs.blitz),
        pool(user.perfs.bullet),
    ))
}
