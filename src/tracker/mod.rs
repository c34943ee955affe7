//! The rating tracker: owns tracked-account state, polls the rating sites,
//! and publishes outcome events.
//!
//! The core never calls back into the tracker synchronously; the tracker
//! publishes `TrackerEvent`s onto a typed mpsc channel and the adapter in
//! `bot::events` consumes them. This preserves the five-event contract
//! (track success, remove success, rating update, error, mod error) without
//! structural coupling between the poller and the Discord side.

pub mod chesscom;
pub mod lichess;
mod poll;

use std::collections::VecDeque;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serenity::async_trait;
use tokio::sync::{mpsc, Mutex};
use tokio_cron_scheduler::JobScheduler;

use crate::config::Config;
use crate::error::AppError;
use crate::rating::RatingData;
use crate::store::{JsonStore, TrackedAccount};

/// External rating-site platforms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Source {
    Lichess,
    Chesscom,
}

impl Source {
    /// Public brand name used in notifications. The internal identifier
    /// `Chesscom` is displayed as `Chess.com`.
    pub fn display_name(&self) -> &'static str {
        match self {
            Source::Lichess => "Lichess",
            Source::Chesscom => "Chess.com",
        }
    }

    pub fn profile_url(&self, config: &Config, username: &str) -> String {
        match self {
            Source::Lichess => format!("{}{}", config.lichess_profile_url, username),
            Source::Chesscom => format!("{}{}", config.chesscom_profile_url, username),
        }
    }
}

impl std::str::FromStr for Source {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "lichess" => Ok(Source::Lichess),
            "chesscom" => Ok(Source::Chesscom),
            _ => Err(()),
        }
    }
}

/// The five tracker outcomes, published onto the event channel and consumed
/// by the adapter task.
#[derive(Debug, Clone)]
pub enum TrackerEvent {
    TrackSuccess {
        guild_id: u64,
        user_id: u64,
        rating: RatingData,
        source: Source,
        username: String,
    },
    RemoveSuccess {
        guild_id: u64,
        user_id: u64,
        username: String,
    },
    RatingUpdate {
        guild_id: u64,
        user_id: u64,
        old_rating: RatingData,
        new_rating: RatingData,
        source: Source,
        username: String,
    },
    /// Generic tracker-level failure; delivered to the bot channel,
    /// self-deleting.
    Error { guild_id: u64, message: String },
    /// Tracker failure requiring moderator attention; delivered to the mod
    /// channel, role-mention prefixed when possible.
    ModError { guild_id: u64, message: String },
}

/// The tracker collaborator interface the dispatcher and gateway handlers
/// consume. Methods never fail from the caller's perspective; outcomes are
/// reported through the event channel.
#[async_trait]
pub trait Tracker: Send + Sync {
    /// Links a member to an external account and begins tracking it.
    async fn track(&self, guild_id: u64, user_id: u64, source: Source, username: &str);

    /// Stops tracking a member. The silent variant (guild leave) emits no
    /// event.
    async fn remove(&self, guild_id: u64, user_id: u64, silent: bool);

    /// Stops tracking whoever is linked to an external username.
    async fn remove_by_username(&self, guild_id: u64, source: Source, username: &str);

    /// Queues a prioritised refresh of a member's ratings.
    async fn queue_force_update(&self, guild_id: u64, user_id: u64);

    /// Starts the scheduled polling cycle.
    async fn init_update_cycle(&self) -> Result<(), AppError>;
}

/// Shared innards of the polling tracker; cloned into scheduler jobs.
pub(crate) struct TrackerInner {
    pub(crate) store: Arc<JsonStore>,
    pub(crate) config: Arc<Config>,
    pub(crate) client: reqwest::Client,
    pub(crate) events: mpsc::UnboundedSender<TrackerEvent>,
    /// Members queued for a prioritised refresh on the next tick.
    pub(crate) forced: Mutex<VecDeque<(u64, u64)>>,
}

/// Tracker implementation that refreshes ratings from the Lichess and
/// Chess.com public APIs on a fixed polling cadence.
pub struct PollingTracker {
    inner: Arc<TrackerInner>,
    scheduler: Mutex<Option<JobScheduler>>,
}

impl PollingTracker {
    pub fn new(
        store: Arc<JsonStore>,
        config: Arc<Config>,
        events: mpsc::UnboundedSender<TrackerEvent>,
    ) -> Self {
        Self {
            inner: Arc::new(TrackerInner {
                store,
                config,
                client: reqwest::Client::new(),
                events,
                forced: Mutex::new(VecDeque::new()),
            }),
            scheduler: Mutex::new(None),
        }
    }
}

impl TrackerInner {
    pub(crate) fn send(&self, event: TrackerEvent) {
        // The receiver only disappears during shutdown.
        if self.events.send(event).is_err() {
            tracing::debug!("Tracker event channel closed");
        }
    }

    pub(crate) async fn fetch(
        &self,
        source: Source,
        username: &str,
    ) -> Result<RatingData, AppError> {
        match source {
            Source::Lichess => lichess::fetch_rating(&self.client, username).await,
            Source::Chesscom => chesscom::fetch_rating(&self.client, username).await,
        }
    }
}

#[async_trait]
impl Tracker for PollingTracker {
    async fn track(&self, guild_id: u64, user_id: u64, source: Source, username: &str) {
        let rating = match self.inner.fetch(source, username).await {
            Ok(rating) => rating,
            Err(e) => {
                tracing::warn!(
                    "Failed to fetch '{}' on {} for tracking: {}",
                    username,
                    source.display_name(),
                    e
                );
                self.inner.send(TrackerEvent::Error {
                    guild_id,
                    message: format!(
                        "Could not find '{}' on {}.",
                        username,
                        source.display_name()
                    ),
                });
                return;
            }
        };

        let account = TrackedAccount {
            source,
            username: username.to_string(),
            rating: rating.clone(),
            last_change: chrono::Utc::now(),
        };
        if let Err(e) = self.inner.store.insert(guild_id, user_id, account).await {
            tracing::error!("Failed to persist tracked account: {}", e);
            self.inner.send(TrackerEvent::ModError {
                guild_id,
                message: format!("Failed to persist tracking for '{username}': {e}"),
            });
            return;
        }
        self.inner.send(TrackerEvent::TrackSuccess {
            guild_id,
            user_id,
            rating,
            source,
            username: username.to_string(),
        });
    }

    async fn remove(&self, guild_id: u64, user_id: u64, silent: bool) {
        match self.inner.store.remove(guild_id, user_id).await {
            Ok(Some(account)) => {
                if !silent {
                    self.inner.send(TrackerEvent::RemoveSuccess {
                        guild_id,
                        user_id,
                        username: account.username,
                    });
                }
            }
            Ok(None) => {
                if !silent {
                    self.inner.send(TrackerEvent::Error {
                        guild_id,
                        message: "You are not being tracked.".to_string(),
                    });
                }
            }
            Err(e) => {
                tracing::error!("Failed to remove tracked account: {}", e);
            }
        }
    }

    async fn remove_by_username(&self, guild_id: u64, source: Source, username: &str) {
        match self
            .inner
            .store
            .remove_by_username(guild_id, source, username)
            .await
        {
            Ok(Some((user_id, account))) => {
                self.inner.send(TrackerEvent::RemoveSuccess {
                    guild_id,
                    user_id,
                    username: account.username,
                });
            }
            Ok(None) => {
                self.inner.send(TrackerEvent::Error {
                    guild_id,
                    message: format!(
                        "No tracked account '{}' on {}.",
                        username,
                        source.display_name()
                    ),
                });
            }
            Err(e) => {
                tracing::error!("Failed to remove tracked account by username: {}", e);
            }
        }
    }

    async fn queue_force_update(&self, guild_id: u64, user_id: u64) {
        self.inner.forced.lock().await.push_back((guild_id, user_id));
    }

    async fn init_update_cycle(&self) -> Result<(), AppError> {
        let mut guard = self.scheduler.lock().await;
        if guard.is_some() {
            // Gateway reconnects re-fire ready; the cycle is already running.
            return Ok(());
        }
        let scheduler = poll::start(self.inner.clone()).await?;
        *guard = Some(scheduler);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::str::FromStr;

    /// Tests source parsing from the command surface.
    #[test]
    fn parses_source_names() {
        assert_eq!(Source::from_str("lichess"), Ok(Source::Lichess));
        assert_eq!(Source::from_str("Chesscom"), Ok(Source::Chesscom));
        assert_eq!(Source::from_str("fide"), Err(()));
    }

    /// Tests that the internal identifier is translated to the public brand
    /// name for display.
    #[test]
    fn displays_brand_names() {
        assert_eq!(Source::Lichess.display_name(), "Lichess");
        assert_eq!(Source::Chesscom.display_name(), "Chess.com");
    }
}
