//! The `!fen` board renderer.
//!
//! Works from any channel. Replies in the bot channel self-delete like every
//! other bot-channel response; replies elsewhere stay put. The invoking
//! message is left alone everywhere so the position under discussion stays
//! visible.

use serenity::all::{Context, CreateMessage, GuildId, Message};

use crate::bot::{channels, embeds, send_ephemeral, send_plain, Handler};

enum FenArgs {
    Usage,
    Position(String),
}

/// FEN fields are whitespace-separated, so the already-split tokens are
/// rejoined into the single string the board renderer takes.
fn parse_fen_args(args: &[&str]) -> FenArgs {
    if args.is_empty() {
        FenArgs::Usage
    } else {
        FenArgs::Position(args.join(" "))
    }
}

pub(super) async fn handle(
    handler: &Handler,
    ctx: &Context,
    msg: &Message,
    guild_id: GuildId,
    args: &[&str],
) {
    let message = match parse_fen_args(args) {
        FenArgs::Usage => CreateMessage::new().content("Wrong amount of parameters."),
        FenArgs::Position(fen) => {
            CreateMessage::new().embed(embeds::fen_embed(&handler.config, &fen))
        }
    };

    let in_bot_channel = channels::bot_channel(&ctx.http, guild_id, &handler.config)
        .await
        .is_some_and(|c| c.id == msg.channel_id);
    if in_bot_channel {
        send_ephemeral(
            &ctx.http,
            msg.channel_id,
            handler.config.delete_delay,
            message,
        )
        .await;
    } else {
        send_plain(&ctx.http, msg.channel_id, message).await;
    }
}
