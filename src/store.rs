//! Flat JSON document store for tracked accounts.
//!
//! The whole document is read into memory on load and rewritten in full
//! (pretty-printed, 4-space indent) on every save. No partial or append
//! writes, no schema versioning. A single bot instance owns the file, so an
//! async mutex around the in-memory map is all the coordination needed.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::AppError;
use crate::rating::RatingData;
use crate::tracker::Source;

/// A chat-platform member linked to an external chess account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedAccount {
    pub source: Source,
    pub username: String,
    pub rating: RatingData,
    /// Last time a poll observed the rating actually change. Backs the
    /// `!active` leaderboard filter.
    pub last_change: DateTime<Utc>,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreData {
    /// guild id -> user id -> tracked account. Ids are stringified u64s so
    /// the document stays a plain JSON object.
    guilds: HashMap<String, HashMap<String, TrackedAccount>>,
}

pub struct JsonStore {
    path: PathBuf,
    data: Mutex<StoreData>,
}

impl JsonStore {
    /// Opens the store, reading the full document if the file exists. A
    /// missing file yields an empty store; the first save creates it.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let path = path.as_ref().to_path_buf();
        let data = if path.exists() {
            serde_json::from_str(&std::fs::read_to_string(&path)?)?
        } else {
            StoreData::default()
        };
        Ok(Self {
            path,
            data: Mutex::new(data),
        })
    }

    pub async fn get(&self, guild_id: u64, user_id: u64) -> Option<TrackedAccount> {
        let data = self.data.lock().await;
        data.guilds
            .get(&guild_id.to_string())
            .and_then(|g| g.get(&user_id.to_string()))
            .cloned()
    }

    /// Inserts or replaces a tracked account and rewrites the document.
    pub async fn insert(
        &self,
        guild_id: u64,
        user_id: u64,
        account: TrackedAccount,
    ) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        data.guilds
            .entry(guild_id.to_string())
            .or_default()
            .insert(user_id.to_string(), account);
        self.save(&data)
    }

    /// Removes a tracked account by member identity.
    pub async fn remove(
        &self,
        guild_id: u64,
        user_id: u64,
    ) -> Result<Option<TrackedAccount>, AppError> {
        let mut data = self.data.lock().await;
        let removed = data
            .guilds
            .get_mut(&guild_id.to_string())
            .and_then(|g| g.remove(&user_id.to_string()));
        if removed.is_some() {
            self.save(&data)?;
        }
        Ok(removed)
    }

    /// Removes a tracked account by external username on a source platform.
    /// Username comparison is case-insensitive, matching how the rating
    /// sites treat usernames.
    pub async fn remove_by_username(
        &self,
        guild_id: u64,
        source: Source,
        username: &str,
    ) -> Result<Option<(u64, TrackedAccount)>, AppError> {
        let mut data = self.data.lock().await;
        let Some(guild) = data.guilds.get_mut(&guild_id.to_string()) else {
            return Ok(None);
        };
        let found = guild
            .iter()
            .find(|(_, acc)| {
                acc.source == source && acc.username.eq_ignore_ascii_case(username)
            })
            .map(|(user_id, _)| user_id.clone());
        let Some(user_key) = found else {
            return Ok(None);
        };
        let account = guild.remove(&user_key);
        self.save(&data)?;
        let user_id = user_key.parse::<u64>().map_err(|_| {
            AppError::NotFound(format!("corrupt user id key {user_key:?} in store"))
        })?;
        Ok(account.map(|acc| (user_id, acc)))
    }

    /// Overwrites the stored rating snapshot, stamping `last_change` only
    /// when the snapshot actually differs.
    pub async fn update_rating(
        &self,
        guild_id: u64,
        user_id: u64,
        rating: RatingData,
    ) -> Result<(), AppError> {
        let mut data = self.data.lock().await;
        if let Some(account) = data
            .guilds
            .get_mut(&guild_id.to_string())
            .and_then(|g| g.get_mut(&user_id.to_string()))
        {
            if account.rating != rating {
                account.last_change = Utc::now();
            }
            account.rating = rating;
            self.save(&data)?;
        }
        Ok(())
    }

    /// All tracked accounts in a guild.
    pub async fn guild_accounts(&self, guild_id: u64) -> Vec<(u64, TrackedAccount)> {
        let data = self.data.lock().await;
        data.guilds
            .get(&guild_id.to_string())
            .map(|g| {
                g.iter()
                    .filter_map(|(uid, acc)| Some((uid.parse().ok()?, acc.clone())))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// All tracked accounts across every guild, for the polling cycle.
    pub async fn all_accounts(&self) -> Vec<(u64, u64, TrackedAccount)> {
        let data = self.data.lock().await;
        data.guilds
            .iter()
            .flat_map(|(gid, users)| {
                users.iter().filter_map(|(uid, acc)| {
                    Some((gid.parse().ok()?, uid.parse().ok()?, acc.clone()))
                })
            })
            .collect()
    }

    /// Tracked-account counts per guild, for the diagnostic command.
    pub async fn counts(&self) -> Vec<(u64, usize)> {
        let data = self.data.lock().await;
        data.guilds
            .iter()
            .filter_map(|(gid, users)| Some((gid.parse().ok()?, users.len())))
            .collect()
    }

    /// Full pretty-printed rewrite of the backing file.
    fn save(&self, data: &StoreData) -> Result<(), AppError> {
        let mut buf = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b"    ");
        let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
        data.serialize(&mut ser)?;
        std::fs::write(&self.path, buf)?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn temp_path(tag: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "ratekeeper-store-{tag}-{}-{}.json",
            std::process::id(),
            Utc::now().timestamp_nanos_opt().unwrap_or_default()
        ))
    }

    fn account(source: Source, username: &str, max: u32) -> TrackedAccount {
        TrackedAccount {
            source,
            username: username.to_string(),
            rating: RatingData::from_pools(Some(max), None, None, None),
            last_change: Utc::now(),
        }
    }

    /// Tests that a saved store round-trips through the JSON file.
    #[tokio::test]
    async fn round_trips_through_file() {
        let path = temp_path("roundtrip");
        let store = JsonStore::open(&path).unwrap();
        store
            .insert(1, 100, account(Source::Lichess, "magnus", 2800))
            .await
            .unwrap();

        let reloaded = JsonStore::open(&path).unwrap();
        let got = reloaded.get(1, 100).await.unwrap();
        assert_eq!(got.username, "magnus");
        assert_eq!(got.rating.max_rating, 2800);

        std::fs::remove_file(&path).ok();
    }

    /// Tests the persisted format: pretty-printed with 4-space indentation.
    #[tokio::test]
    async fn persists_with_four_space_indent() {
        let path = temp_path("indent");
        let store = JsonStore::open(&path).unwrap();
        store
            .insert(1, 100, account(Source::Chesscom, "hikaru", 3000))
            .await
            .unwrap();

        let raw = std::fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\n    \"guilds\""));
        assert!(!raw.contains("\n  \"guilds\""));

        std::fs::remove_file(&path).ok();
    }

    /// Tests removal by external username, case-insensitively and only on
    /// the matching source platform.
    #[tokio::test]
    async fn removes_by_username() {
        let path = temp_path("byname");
        let store = JsonStore::open(&path).unwrap();
        store
            .insert(1, 100, account(Source::Lichess, "DrNykterstein", 2900))
            .await
            .unwrap();

        // Wrong source does not match.
        let miss = store
            .remove_by_username(1, Source::Chesscom, "drnykterstein")
            .await
            .unwrap();
        assert!(miss.is_none());

        let hit = store
            .remove_by_username(1, Source::Lichess, "drnykterstein")
            .await
            .unwrap();
        assert_eq!(hit.unwrap().0, 100);
        assert!(store.get(1, 100).await.is_none());

        std::fs::remove_file(&path).ok();
    }

    /// Tests that last_change is stamped only on an observed difference.
    #[tokio::test]
    async fn stamps_last_change_on_difference_only() {
        let path = temp_path("stamp");
        let store = JsonStore::open(&path).unwrap();
        let acc = account(Source::Lichess, "pia", 1500);
        let initial_stamp = acc.last_change;
        store.insert(1, 100, acc.clone()).await.unwrap();

        // Same snapshot: stamp untouched.
        store.update_rating(1, 100, acc.rating.clone()).await.unwrap();
        assert_eq!(store.get(1, 100).await.unwrap().last_change, initial_stamp);

        // Different snapshot: stamp advances.
        store
            .update_rating(1, 100, RatingData::from_pools(Some(1550), None, None, None))
            .await
            .unwrap();
        let updated = store.get(1, 100).await.unwrap();
        assert!(updated.last_change >= initial_stamp);
        assert_eq!(updated.rating.max_rating, 1550);

        std::fs::remove_file(&path).ok();
    }
}
