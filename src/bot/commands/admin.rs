//! Owner diagnostics: `!eval` with a fixed set of subcommands.
//!
//! The subcommand travels inside a fenced code block and is matched against
//! an enumerated list; there is no dynamic execution. Replies are plain
//! sends to the invoking channel and are not scheduled for deletion.

use serenity::all::{Context, CreateMessage, Message};

use crate::bot::commands::parse;
use crate::bot::{send_plain, Handler};

pub(super) async fn handle(handler: &Handler, ctx: &Context, msg: &Message, _args: &[&str]) {
    if !handler.config.owners.contains(&msg.author.id.get()) {
        reply(ctx, msg, "You do not have permission to do this.").await;
        return;
    }

    let Some(block) = parse::extract_code_block(&msg.content) else {
        reply(ctx, msg, "Incorrect formatting! Use a code block!").await;
        return;
    };

    let mut tokens = block.split_whitespace();
    let output = match tokens.next() {
        Some("status") => status(handler, ctx).await,
        Some("tracked") => tracked(handler).await,
        _ => "Unknown diagnostic. Available: status, tracked.".to_string(),
    };
    reply(ctx, msg, &output).await;
}

async fn status(handler: &Handler, ctx: &Context) -> String {
    let uptime = handler.started_at.elapsed();
    let hours = uptime.as_secs() / 3600;
    let minutes = (uptime.as_secs() % 3600) / 60;
    let guilds = ctx.cache.guilds().len();
    let tracked: usize = handler.store.counts().await.iter().map(|(_, n)| n).sum();
    format!(
        "Uptime: {hours}h {minutes}m\nGuilds: {guilds}\nTracked accounts: {tracked}"
    )
}

async fn tracked(handler: &Handler) -> String {
    let counts = handler.store.counts().await;
    if counts.is_empty() {
        return "No accounts are being tracked.".to_string();
    }
    counts
        .iter()
        .map(|(guild_id, count)| format!("Guild {guild_id}: {count} tracked"))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn reply(ctx: &Context, msg: &Message, text: &str) {
    send_plain(&ctx.http, msg.channel_id, CreateMessage::new().content(text)).await;
}
