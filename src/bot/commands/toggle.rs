//! Self-service role toggles: `!league`, `!arena`, `!study`.

use serenity::all::{Context, GuildId, Message};

use crate::bot::commands::{parse, respond_text};
use crate::bot::Handler;

/// Adds the named role if the invoking member lacks it, removes it if they
/// hold it. A guild without the role configured gets a log line and no
/// reply.
pub(super) async fn handle(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    role_name: &str,
    label: &str,
    args: &[&str],
) {
    if let Err(message) = parse::expect_no_args(args) {
        respond_text(handler, ctx, msg, &message).await;
        return;
    }
    let roles = match ctx.http.get_guild_roles(guild_id).await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::error!("Failed to fetch roles for guild {}: {}", guild_id, e);
            return;
        }
    };
    let Some(role) = roles.iter().find(|r| r.name == role_name) else {
        tracing::warn!("No role named '{}' found in guild {}", role_name, guild_id);
        return;
    };

    let member = match ctx.http.get_member(guild_id, msg.author.id).await {
        Ok(member) => member,
        Err(e) => {
            tracing::error!("Failed to fetch member {}: {}", msg.author.id, e);
            return;
        }
    };

    if member.roles.contains(&role.id) {
        match ctx
            .http
            .remove_member_role(guild_id, msg.author.id, role.id, None)
            .await
        {
            Ok(()) => respond_text(handler, ctx, msg, &format!("{label} role removed.")).await,
            Err(e) => tracing::error!(
                "Failed to remove role '{}' from {}: {}",
                role_name,
                msg.author.id,
                e
            ),
        }
    } else {
        match ctx
            .http
            .add_member_role(guild_id, msg.author.id, role.id, None)
            .await
        {
            Ok(()) => respond_text(handler, ctx, msg, &format!("{label} role added.")).await,
            Err(e) => tracing::error!(
                "Failed to add role '{}' to {}: {}",
                role_name,
                msg.author.id,
                e
            ),
        }
    }
}
