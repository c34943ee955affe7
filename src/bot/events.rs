//! Tracker event adapter.
//!
//! Consumes the typed event channel the tracker publishes onto and turns
//! each outcome into role mutations and notifications. Every handler is
//! idempotent-safe: re-delivered events hit the band-equality guard in the
//! role synchronizer and produce neither a second mutation nor a second
//! notification.

use std::sync::Arc;

use serenity::all::{CreateMessage, GuildId, UserId};
use serenity::http::Http;
use tokio::sync::mpsc::UnboundedReceiver;

use crate::bot::{channels, embeds, member_nick, send_ephemeral, send_plain};
use crate::config::Config;
use crate::rating::sync::{RoleSync, SyncOutcome};
use crate::rating::RatingData;
use crate::tracker::{Source, Tracker, TrackerEvent};

pub struct TrackerEventAdapter {
    http: Arc<Http>,
    config: Arc<Config>,
    tracker: Arc<dyn Tracker>,
    sync: RoleSync,
}

impl TrackerEventAdapter {
    pub fn new(http: Arc<Http>, config: Arc<Config>, tracker: Arc<dyn Tracker>) -> Self {
        let sync = RoleSync::new(http.clone(), config.clone());
        Self {
            http,
            config,
            tracker,
            sync,
        }
    }

    /// Drains the event channel until the tracker side shuts down.
    pub async fn run(self, mut events: UnboundedReceiver<TrackerEvent>) {
        while let Some(event) = events.recv().await {
            self.handle(event).await;
        }
        tracing::info!("Tracker event channel closed; adapter stopping");
    }

    async fn handle(&self, event: TrackerEvent) {
        match event {
            TrackerEvent::TrackSuccess {
                guild_id,
                user_id,
                rating,
                source,
                username,
            } => {
                self.on_track_success(guild_id, user_id, rating, source, username)
                    .await
            }
            TrackerEvent::RemoveSuccess {
                guild_id,
                user_id,
                username,
            } => self.on_remove_success(guild_id, user_id, username).await,
            TrackerEvent::RatingUpdate {
                guild_id,
                user_id,
                new_rating,
                source,
                username,
                ..
            } => {
                self.on_rating_update(guild_id, user_id, new_rating, source, username)
                    .await
            }
            TrackerEvent::Error { guild_id, message } => self.on_error(guild_id, message).await,
            TrackerEvent::ModError { guild_id, message } => {
                self.on_mod_error(guild_id, message).await
            }
        }
    }

    async fn on_track_success(
        &self,
        guild_id: u64,
        user_id: u64,
        rating: RatingData,
        source: Source,
        username: String,
    ) {
        let guild = GuildId::new(guild_id);
        let user = UserId::new(user_id);
        let outcome = match self.sync.link(guild, user, &rating).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Link reconciliation failed for {}: {:?}", user_id, e);
                return;
            }
        };
        match outcome {
            SyncOutcome::Applied { band } => {
                let nick = member_nick(&self.http, guild, user)
                    .await
                    .unwrap_or_else(|| username.clone());
                let embed =
                    embeds::link_embed(&self.config, &nick, &username, source, &rating, &band);
                self.bot_channel_send(guild, CreateMessage::new().embed(embed))
                    .await;
            }
            SyncOutcome::NoValidRole { rating } => {
                self.no_valid_role(guild, rating).await;
            }
            SyncOutcome::MemberGone => {
                tracing::info!(
                    "'{}' ({}) not found on the server. Removing from tracking",
                    username,
                    source.display_name()
                );
                self.tracker.remove(guild_id, user_id, true).await;
            }
            // Re-delivered event or failed add; nothing to announce.
            SyncOutcome::Unchanged | SyncOutcome::AddFailed | SyncOutcome::Demoted => {}
        }
    }

    async fn on_remove_success(&self, guild_id: u64, user_id: u64, username: String) {
        let guild = GuildId::new(guild_id);
        let user = UserId::new(user_id);
        let name = member_nick(&self.http, guild, user)
            .await
            .unwrap_or(username);
        self.bot_channel_send(
            guild,
            CreateMessage::new().content(format!("No longer tracking {name}")),
        )
        .await;
        if let Err(e) = self.sync.clear(guild, user).await {
            tracing::error!("Failed to clear rating roles for {}: {:?}", user_id, e);
        }
    }

    async fn on_rating_update(
        &self,
        guild_id: u64,
        user_id: u64,
        new_rating: RatingData,
        source: Source,
        username: String,
    ) {
        let guild = GuildId::new(guild_id);
        let user = UserId::new(user_id);
        let outcome = match self.sync.update(guild, user, &new_rating).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("Update reconciliation failed for {}: {:?}", user_id, e);
                return;
            }
        };
        match outcome {
            SyncOutcome::Applied { band } => {
                let nick = member_nick(&self.http, guild, user)
                    .await
                    .unwrap_or_else(|| username.clone());
                let embed = embeds::update_embed(
                    &self.config,
                    &nick,
                    &username,
                    source,
                    &new_rating,
                    &band,
                );
                self.bot_channel_send(guild, CreateMessage::new().embed(embed))
                    .await;
            }
            SyncOutcome::NoValidRole { rating } => {
                self.no_valid_role(guild, rating).await;
            }
            SyncOutcome::MemberGone => {
                // External-state desync: the member departed. Self-heal by
                // dropping tracking instead of mutating roles.
                tracing::info!(
                    "'{}' ({}) not found on the server. Removing from tracking",
                    username,
                    source.display_name()
                );
                self.tracker.remove(guild_id, user_id, false).await;
            }
            SyncOutcome::Demoted => {
                tracing::info!("Demoted '{}' to unranked in guild {}", username, guild_id);
            }
            SyncOutcome::Unchanged | SyncOutcome::AddFailed => {}
        }
    }

    async fn on_error(&self, guild_id: u64, message: String) {
        self.bot_channel_send(GuildId::new(guild_id), CreateMessage::new().content(message))
            .await;
    }

    async fn on_mod_error(&self, guild_id: u64, message: String) {
        let guild = GuildId::new(guild_id);
        let Some(channel) = channels::mod_channel(&self.http, guild, &self.config).await else {
            return;
        };
        let mod_role = match self.http.get_guild_roles(guild).await {
            Ok(roles) => roles
                .iter()
                .find(|r| r.name == self.config.mod_role_name)
                .map(|r| r.id),
            Err(e) => {
                tracing::error!("Failed to fetch roles for guild {}: {}", guild, e);
                None
            }
        };
        let content = embeds::mod_error_content(mod_role, &message);
        send_plain(&self.http, channel.id, CreateMessage::new().content(content)).await;
    }

    async fn no_valid_role(&self, guild: GuildId, rating: u32) {
        self.bot_channel_send(
            guild,
            CreateMessage::new().content(format!(
                "Could not find a valid role for rating {rating}"
            )),
        )
        .await;
    }

    /// Delivers a message to the guild's bot channel, self-deleting after
    /// the configured delay. A missing bot channel was already logged by the
    /// lookup; the event is dropped.
    async fn bot_channel_send(&self, guild: GuildId, message: CreateMessage) {
        let Some(channel) = channels::bot_channel(&self.http, guild, &self.config).await else {
            return;
        };
        send_ephemeral(&self.http, channel.id, self.config.delete_delay, message).await;
    }
}
