//! Discord gateway integration.
//!
//! The bot receives guild events (messages, member join/leave) through a
//! serenity `EventHandler` and dispatches them to the command layer and the
//! role synchronizer. Everything the handler needs is passed in at
//! construction time; there is no module-level client state.
//!
//! # Gateway Intents
//!
//! - `GUILDS` / `GUILD_MESSAGES` - guild and message events
//! - `GUILD_MEMBERS` - member join/leave (privileged intent)
//! - `MESSAGE_CONTENT` - reading command text (privileged intent)

pub mod channels;
pub mod commands;
pub mod embeds;
pub mod events;

use std::sync::Arc;
use std::time::{Duration, Instant};

use serenity::all::{
    ActivityData, ChannelId, Context, CreateMessage, EventHandler, GuildId, Member, Message,
    MessageId, Ready, User, UserId,
};
use serenity::async_trait;
use serenity::http::Http;

use crate::config::Config;
use crate::rating::sync::RoleSync;
use crate::store::JsonStore;
use crate::tracker::Tracker;

/// Discord bot event handler.
pub struct Handler {
    pub config: Arc<Config>,
    pub store: Arc<JsonStore>,
    pub tracker: Arc<dyn Tracker>,
    pub started_at: Instant,
}

impl Handler {
    pub fn new(config: Arc<Config>, store: Arc<JsonStore>, tracker: Arc<dyn Tracker>) -> Self {
        Self {
            config,
            store,
            tracker,
            started_at: Instant::now(),
        }
    }
}

#[async_trait]
impl EventHandler for Handler {
    /// Called when the bot is ready and connected to Discord.
    async fn ready(&self, ctx: Context, ready: Ready) {
        tracing::info!("{} is connected to Discord!", ready.user.name);
        ctx.set_activity(Some(ActivityData::watching("the rating ladder")));

        if let Err(e) = self.tracker.init_update_cycle().await {
            tracing::error!("Failed to start the rating update cycle: {:?}", e);
        }
    }

    /// Called when a member joins a guild: assign the Unranked role if the
    /// guild has one configured.
    async fn guild_member_addition(&self, ctx: Context, new_member: Member) {
        let sync = RoleSync::new(ctx.http.clone(), self.config.clone());
        if let Err(e) = sync
            .assign_unranked(new_member.guild_id, new_member.user.id)
            .await
        {
            tracing::error!(
                "Failed to assign unranked role to joining member {}: {:?}",
                new_member.user.id,
                e
            );
        }
    }

    /// Called when a member leaves a guild: drop their tracking silently.
    async fn guild_member_removal(
        &self,
        _ctx: Context,
        guild_id: GuildId,
        user: User,
        _member_data_if_available: Option<Member>,
    ) {
        self.tracker.remove(guild_id.get(), user.id.get(), true).await;
    }

    /// Called when a message is sent in a channel.
    async fn message(&self, ctx: Context, message: Message) {
        commands::dispatch(self, &ctx, &message).await;
    }
}

/// Resolves a member's display name: guild nickname if set, otherwise the
/// Discord username. `None` when the member cannot be fetched.
pub(crate) async fn member_nick(http: &Arc<Http>, guild_id: GuildId, user_id: UserId) -> Option<String> {
    match http.get_member(guild_id, user_id).await {
        Ok(member) => Some(member.nick.unwrap_or_else(|| member.user.name.clone())),
        Err(e) => {
            tracing::debug!(
                "Failed to fetch member {} in guild {}: {}",
                user_id,
                guild_id,
                e
            );
            None
        }
    }
}

/// Sends a message and schedules its deletion after the ephemeral delay.
/// Send failures are logged and swallowed; they are never surfaced to the
/// invoking member a second time.
pub(crate) async fn send_ephemeral(
    http: &Arc<Http>,
    channel_id: ChannelId,
    delay: Duration,
    message: CreateMessage,
) {
    match channel_id.send_message(http, message).await {
        Ok(sent) => schedule_delete(http.clone(), channel_id, sent.id, delay),
        Err(e) => tracing::warn!("Failed to send message to channel {}: {}", channel_id, e),
    }
}

/// Sends a message without scheduling deletion (mod channel, non-bot
/// channels).
pub(crate) async fn send_plain(http: &Arc<Http>, channel_id: ChannelId, message: CreateMessage) {
    if let Err(e) = channel_id.send_message(http, message).await {
        tracing::warn!("Failed to send message to channel {}: {}", channel_id, e);
    }
}

/// Fire-and-forget deferred deletion. Failure is logged, never retried, and
/// blocks nothing.
pub(crate) fn schedule_delete(
    http: Arc<Http>,
    channel_id: ChannelId,
    message_id: MessageId,
    delay: Duration,
) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = http.delete_message(channel_id, message_id, None).await {
            tracing::debug!(
                "Failed to delete ephemeral message {} in channel {}: {}",
                message_id,
                channel_id,
                e
            );
        }
    });
}
