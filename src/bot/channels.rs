//! Per-guild named channel bindings.
//!
//! The bot and mod channels are resolved by name with a fresh channel-list
//! fetch every time they are needed. Nothing is cached, so a rename or
//! deletion degrades gracefully: the operation is logged and skipped, never
//! fatal.

use std::sync::Arc;

use serenity::all::{GuildChannel, GuildId};
use serenity::http::Http;

use crate::config::Config;

/// The designated channel for ephemeral command responses.
pub async fn bot_channel(
    http: &Arc<Http>,
    guild_id: GuildId,
    config: &Config,
) -> Option<GuildChannel> {
    channel_by_name(http, guild_id, &config.bot_channel_name).await
}

/// The moderation channel for tracker failures needing attention.
pub async fn mod_channel(
    http: &Arc<Http>,
    guild_id: GuildId,
    config: &Config,
) -> Option<GuildChannel> {
    channel_by_name(http, guild_id, &config.mod_channel_name).await
}

async fn channel_by_name(http: &Arc<Http>, guild_id: GuildId, name: &str) -> Option<GuildChannel> {
    let channels = match http.get_channels(guild_id).await {
        Ok(channels) => channels,
        Err(e) => {
            tracing::error!("Failed to fetch channels for guild {}: {}", guild_id, e);
            return None;
        }
    };
    let found = channels.into_iter().find(|c| c.name == name);
    if found.is_none() {
        tracing::warn!("No channel named '{}' found in guild {}", name, guild_id);
    }
    found
}
