//! Command dispatch.
//!
//! Messages are tokenized on whitespace, matched case-insensitively on the
//! first token, and routed to the handler modules. `!fen` and `!eval` work
//! from any channel; everything else is scoped to the bot channel and
//! silently ignored elsewhere. Invocations of known bot-channel commands are
//! deleted so the channel only ever shows the bot's own ephemeral replies.

mod admin;
mod fen;
mod leaderboard;
pub(crate) mod parse;
mod toggle;
mod track;

use serenity::all::{Context, CreateEmbed, CreateMessage, GuildId, Message, Permissions};

use crate::bot::{channels, embeds, send_ephemeral, Handler};
use crate::tracker::Source;

pub async fn dispatch(handler: &Handler, ctx: &Context, msg: &Message) {
    if msg.author.bot || !msg.content.starts_with('!') {
        return;
    }
    let Some(guild_id) = msg.guild_id else {
        return;
    };

    let tokens: Vec<&str> = msg.content.split_whitespace().collect();
    let command = tokens[0][1..].to_ascii_lowercase();
    let args = &tokens[1..];

    // Channel-independent commands.
    match command.as_str() {
        "fen" => {
            fen::handle(handler, ctx, msg, guild_id, args).await;
            return;
        }
        "eval" => {
            admin::handle(handler, ctx, msg, args).await;
            return;
        }
        _ => {}
    }

    let known = matches!(
        command.as_str(),
        "lichess"
            | "chesscom"
            | "remove"
            | "update"
            | "list"
            | "active"
            | "myrank"
            | "league"
            | "arena"
            | "study"
            | "dbhelp"
    );
    if !known {
        return;
    }

    // Everything below is scoped to the bot channel.
    let Some(bot_channel) = channels::bot_channel(&ctx.http, guild_id, &handler.config).await
    else {
        return;
    };
    if bot_channel.id != msg.channel_id {
        return;
    }

    if let Err(e) = msg.delete(&ctx.http).await {
        tracing::debug!("Failed to delete command message {}: {}", msg.id, e);
    }

    match command.as_str() {
        "lichess" => track::handle_track(handler, ctx, msg, guild_id, Source::Lichess, args).await,
        "chesscom" => {
            track::handle_track(handler, ctx, msg, guild_id, Source::Chesscom, args).await
        }
        "remove" => track::handle_remove(handler, ctx, msg, guild_id, args).await,
        "update" => track::handle_update(handler, ctx, msg, guild_id, args).await,
        "list" => leaderboard::handle_list(handler, ctx, msg, guild_id, args, false).await,
        "active" => leaderboard::handle_list(handler, ctx, msg, guild_id, args, true).await,
        "myrank" => leaderboard::handle_myrank(handler, ctx, msg, guild_id, args).await,
        "league" => {
            let role = handler.config.league_role_name.clone();
            toggle::handle(handler, ctx, msg, guild_id, &role, "League", args).await
        }
        "arena" => {
            let role = handler.config.arena_role_name.clone();
            toggle::handle(handler, ctx, msg, guild_id, &role, "Arena", args).await
        }
        "study" => {
            let role = handler.config.study_role_name.clone();
            toggle::handle(handler, ctx, msg, guild_id, &role, "Study", args).await
        }
        "dbhelp" => match parse::expect_no_args(args) {
            Ok(()) => respond_embed(handler, ctx, msg, embeds::help_embed(&handler.config)).await,
            Err(message) => respond_text(handler, ctx, msg, &message).await,
        },
        _ => unreachable!(),
    }
}

/// Sends an ephemeral plain-text reply to the invoking channel.
pub(super) async fn respond_text(handler: &Handler, ctx: &Context, msg: &Message, text: &str) {
    send_ephemeral(
        &ctx.http,
        msg.channel_id,
        handler.config.delete_delay,
        CreateMessage::new().content(text),
    )
    .await;
}

/// Sends an ephemeral embed reply to the invoking channel.
pub(super) async fn respond_embed(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    embed: CreateEmbed,
) {
    send_ephemeral(
        &ctx.http,
        msg.channel_id,
        handler.config.delete_delay,
        CreateMessage::new().embed(embed),
    )
    .await;
}

/// Whether the invoking member may manage other members' tracking: the
/// guild owner, or anyone holding a role with `MANAGE_ROLES` or
/// `ADMINISTRATOR`. Failure to fetch anything counts as no permission.
pub(super) async fn can_manage_roles(ctx: &Context, msg: &Message, guild_id: GuildId) -> bool {
    let guild = match ctx.http.get_guild(guild_id).await {
        Ok(guild) => guild,
        Err(e) => {
            tracing::error!("Failed to fetch guild {}: {}", guild_id, e);
            return false;
        }
    };
    if guild.owner_id == msg.author.id {
        return true;
    }

    let member_roles = match &msg.member {
        Some(partial) => partial.roles.clone(),
        None => match ctx.http.get_member(guild_id, msg.author.id).await {
            Ok(member) => member.roles,
            Err(e) => {
                tracing::error!("Failed to fetch member {}: {}", msg.author.id, e);
                return false;
            }
        },
    };
    let roles = match ctx.http.get_guild_roles(guild_id).await {
        Ok(roles) => roles,
        Err(e) => {
            tracing::error!("Failed to fetch roles for guild {}: {}", guild_id, e);
            return false;
        }
    };
    roles.iter().any(|role| {
        member_roles.contains(&role.id)
            && role
                .permissions
                .intersects(Permissions::MANAGE_ROLES | Permissions::ADMINISTRATOR)
    })
}
