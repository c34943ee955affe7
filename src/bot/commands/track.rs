//! Account linking commands: `!lichess`, `!chesscom`, `!remove`, `!update`.
//!
//! The handlers validate arguments and permissions, then hand off to the
//! tracker. Success and failure notifications arrive later through the
//! tracker event channel, so the only immediate replies here are input
//! errors and the update-queued acknowledgement.

use serenity::all::{Context, GuildId, Message};

use crate::bot::commands::{can_manage_roles, parse, respond_text};
use crate::bot::Handler;
use crate::tracker::Source;

pub(super) async fn handle_track(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    source: Source,
    args: &[&str],
) {
    match args {
        [username] => {
            handler
                .tracker
                .track(guild_id.get(), msg.author.id.get(), source, username)
                .await;
        }
        [username, mention] => {
            // Linking someone else requires role-management rights.
            if !can_manage_roles(ctx, msg, guild_id).await {
                respond_text(handler, ctx, msg, "You do not have permission to do this.").await;
                return;
            }
            let Some(user_id) = parse::parse_mention(mention) else {
                respond_text(handler, ctx, msg, "Invalid user mention given.").await;
                return;
            };
            // The mention must resolve to a live member of this guild.
            if ctx.http.get_member(guild_id, user_id).await.is_err() {
                respond_text(handler, ctx, msg, "Invalid user mention given.").await;
                return;
            }
            handler
                .tracker
                .track(guild_id.get(), user_id.get(), source, username)
                .await;
        }
        _ => respond_text(handler, ctx, msg, "Wrong amount of parameters.").await,
    }
}

pub(super) async fn handle_remove(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    args: &[&str],
) {
    match args {
        [] => {
            handler
                .tracker
                .remove(guild_id.get(), msg.author.id.get(), false)
                .await;
        }
        [source_arg, username] => {
            if !can_manage_roles(ctx, msg, guild_id).await {
                respond_text(handler, ctx, msg, "You do not have permission to do this.").await;
                return;
            }
            let Ok(source) = source_arg.parse::<Source>() else {
                respond_text(handler, ctx, msg, "Bad second parameter (source).").await;
                return;
            };
            handler
                .tracker
                .remove_by_username(guild_id.get(), source, username)
                .await;
        }
        _ => respond_text(handler, ctx, msg, "Wrong amount of parameters.").await,
    }
}

pub(super) async fn handle_update(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    args: &[&str],
) {
    if let Err(message) = parse::expect_no_args(args) {
        respond_text(handler, ctx, msg, &message).await;
        return;
    }
    handler
        .tracker
        .queue_force_update(guild_id.get(), msg.author.id.get())
        .await;
    respond_text(handler, ctx, msg, "Queued for update.").await;
}
