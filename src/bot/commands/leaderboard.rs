//! Leaderboard commands: `!list`, `!active`, `!myrank`.

use serenity::all::{Context, GuildId, Message, UserId};

use crate::bot::commands::{parse, respond_embed, respond_text};
use crate::bot::{member_nick, Handler};
use crate::leaderboard::{Leaderboard, ListOptions};

pub(super) async fn handle_list(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    args: &[&str],
    active: bool,
) {
    let mut options = match parse::parse_list_args(args) {
        Ok(options) => options,
        Err(message) => {
            respond_text(handler, ctx, msg, &message).await;
            return;
        }
    };
    options.active = active;

    let board = board(handler, guild_id, options).await;
    let embed = board
        .get_list(nick_resolver(ctx, guild_id))
        .await
        .colour(handler.config.embed_color);
    respond_embed(handler, ctx, msg, embed).await;
}

pub(super) async fn handle_myrank(
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
    let board = board(handler, guild_id, ListOptions::default()).await;
    match board
        .get_rank(nick_resolver(ctx, guild_id), msg.author.id.get())
        .await
    {
        Some(embed) => {
            respond_embed(handler, ctx, msg, embed.colour(handler.config.embed_color)).await
        }
        None => respond_text(handler, ctx, msg, "You are not being tracked.").await,
    }
}

async fn board(handler: &Handler, guild_id: GuildId, options: ListOptions) -> Leaderboard {
    let accounts = handler.store.guild_accounts(guild_id.get()).await;
    Leaderboard::new(accounts, options, handler.config.active_window_days)
}

/// Nickname resolver over live member state. Departed members render under
/// a placeholder until the next poll untracks them.
fn nick_resolver(
    ctx: &Context,
    guild_id: GuildId,
) -> impl Fn(u64) -> std::pin::Pin<Box<dyn std::future::Future<Output = String> + Send>> {
    let http = ctx.http.clone();
    move |user_id| {
        let http = http.clone();
        Box::pin(async move {
            member_nick(&http, guild_id, UserId::new(user_id))
                .await
                .unwrap_or_else(|| "unknown member".to_string())
        })
    }
}
