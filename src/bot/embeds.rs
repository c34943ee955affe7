//! Notification composition.
//!
//! Builders for every message shape the bot sends: link/update embeds, the
//! FEN board embed, the help reference, and the mod-mention prefix. The
//! composer only produces payloads; callers decide channel and
//! ephemerality.

use serenity::all::{CreateEmbed, RoleId};

use crate::config::Config;
use crate::rating::RatingData;
use crate::tracker::Source;

/// One line per present time control, absent fields omitted entirely.
fn rating_lines(rating: &RatingData) -> String {
    let mut lines = String::new();
    if let Some(classical) = rating.classical {
        lines.push_str(&format!("\nClassical: **{classical}**"));
    }
    if let Some(rapid) = rating.rapid {
        lines.push_str(&format!("\nRapid: **{rapid}**"));
    }
    if let Some(blitz) = rating.blitz {
        lines.push_str(&format!("\nBlitz: **{blitz}**"));
    }
    if let Some(bullet) = rating.bullet {
        lines.push_str(&format!("\nBullet: **{bullet}**"));
    }
    lines
}

/// Embed announcing a successful account link.
pub fn link_embed(
    config: &Config,
    nick: &str,
    username: &str,
    source: Source,
    rating: &RatingData,
    band: &str,
) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!(
            "Linked {} to '{}' on {} ({})",
            nick,
            username,
            source.display_name(),
            source.profile_url(config, username)
        ))
        .description(format!(
            "Added to the rating group **{}** with a rating of **{}**{}",
            band,
            rating.max_rating,
            rating_lines(rating)
        ))
        .colour(config.embed_color)
}

/// Embed announcing a rating-band change on an existing link.
pub fn update_embed(
    config: &Config,
    nick: &str,
    username: &str,
    source: Source,
    rating: &RatingData,
    band: &str,
) -> CreateEmbed {
    CreateEmbed::new()
        .title(format!(
            "Updated {} as '{}' on {}",
            nick,
            username,
            source.display_name()
        ))
        .description(format!(
            "New rating group **{}** with a rating of **{}**{}",
            band,
            rating.max_rating,
            rating_lines(rating)
        ))
        .colour(config.embed_color)
}

/// Board embed for a FEN position: rendered image, side to move, and an
/// analysis link. The board is flipped when black is to move.
pub fn fen_embed(config: &Config, fen: &str) -> CreateEmbed {
    let black_to_move = fen.contains(" b ");
    let (to_move, flip) = if black_to_move {
        ("Black to move.", "1")
    } else {
        ("White to move.", "0")
    };

    let board_query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("fen", fen)
        .append_pair("board", &config.fen_board)
        .append_pair("piece", &config.fen_board_pieces)
        .append_pair("coordinates", &config.fen_board_coords)
        .append_pair("size", &config.fen_board_size)
        .append_pair("flip", flip)
        .finish();
    // The .png extension makes Discord render the URL as an image.
    let image_url = format!("{}?{}&ext=.png", config.fen_api_url, board_query);

    let analysis_query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("fen", fen)
        .finish();
    let analysis_url = format!("{}?{}", config.lichess_analysis_url, analysis_query);

    CreateEmbed::new()
        .title(to_move)
        .url(analysis_url)
        .image(image_url)
        .colour(config.embed_color)
}

/// The command reference shown by `!dbhelp`.
pub fn help_embed(config: &Config) -> CreateEmbed {
    CreateEmbed::new()
        .colour(config.embed_color)
        .field(
            "!Lichess [Lichess Username]",
            "Links you to a specific username on Lichess.",
            false,
        )
        .field(
            "!Chesscom [Chess.com Username]",
            "Links you to a specific username on Chess.com.",
            false,
        )
        .field("!Remove", "Removes you from the rating tracker.", false)
        .field("!Update", "Queue prioritised update of your ratings.", false)
        .field(
            "[!List | !Active] [page]",
            "Show current leaderboard. Page is optional.",
            false,
        )
        .field(
            "[!List | !Active] [bullet | blitz | rapid | classical] [page]",
            "Show current leaderboard. Time control and page are optional.",
            false,
        )
        .field("!MyRank", "Displays your current rank.", false)
        .field("!Arena", "Toggles arena role.", false)
        .field("!League", "Toggles league role.", false)
        .field("!Study", "Toggles study role.", false)
        .field("!Fen [FEN]", "Will show the board.", false)
        .field(
            "!Lichess [Lichess username] [@Discord User Mention]",
            "Links discord user to a specific username on Lichess.",
            false,
        )
        .field(
            "!Chesscom [Chess.com username] [@Discord User Mention]",
            "Links discord user to a specific username on Chess.com.",
            false,
        )
        .field(
            "!Remove [lichess | chesscom] [Username]",
            "Removes a username on the respective platform from the rating tracker.",
            false,
        )
}

/// Prefixes a moderation message with a role mention when the moderator
/// role exists; otherwise the message goes out unprefixed.
pub fn mod_error_content(mod_role: Option<RoleId>, message: &str) -> String {
    match mod_role {
        Some(role_id) => format!("<@&{role_id}>\n{message}"),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rating::band::RatingThresholds;

    fn config() -> Config {
        Config {
            discord_bot_token: String::new(),
            data_file: String::new(),
            thresholds: RatingThresholds::new(vec![800, 1200, 1600, 2000]).unwrap(),
            bot_channel_name: "rating-bot".to_string(),
            mod_channel_name: "mod-room".to_string(),
            unranked_role_name: "Unranked".to_string(),
            mod_role_name: "Moderator".to_string(),
            league_role_name: "League".to_string(),
            arena_role_name: "Arena".to_string(),
            study_role_name: "Study".to_string(),
            owners: vec![],
            delete_delay: std::time::Duration::from_secs(15),
            embed_color: 0x2b6da3,
            fen_board: "brown".to_string(),
            fen_board_pieces: "classic".to_string(),
            fen_board_coords: "outside".to_string(),
            fen_board_size: "3".to_string(),
            poll_interval_minutes: 30,
            active_window_days: 14,
            fen_api_url: "https://www.chess.com/dynboard".to_string(),
            lichess_analysis_url: "https://lichess.org/analysis".to_string(),
            lichess_profile_url: "https://lichess.org/@/".to_string(),
            chesscom_profile_url: "https://www.chess.com/member/".to_string(),
        }
    }

    /// Tests that absent time controls are omitted from the description
    /// with no placeholder lines.
    #[test]
    fn omits_absent_time_controls() {
        let rating = RatingData::from_pools(None, Some(1510), Some(1620), None);
        let embed = link_embed(&config(), "Pia", "pia_l", Source::Lichess, &rating, "1600+");
        let value = serde_json::to_value(&embed).unwrap();
        let description = value["description"].as_str().unwrap();
        assert!(description.contains("**1600+**"));
        assert!(description.contains("Rapid: **1510**"));
        assert!(description.contains("Blitz: **1620**"));
        assert!(!description.contains("Classical"));
        assert!(!description.contains("Bullet"));
        assert!(!description.contains("N/A"));
    }

    /// Tests that the link title carries the public brand name and the
    /// profile URL.
    #[test]
    fn link_title_uses_brand_name() {
        let rating = RatingData::from_pools(None, None, Some(1700), None);
        let embed = link_embed(&config(), "Pia", "pia_c", Source::Chesscom, &rating, "1600+");
        let value = serde_json::to_value(&embed).unwrap();
        let title = value["title"].as_str().unwrap();
        assert!(title.contains("on Chess.com"));
        assert!(title.contains("https://www.chess.com/member/pia_c"));
    }

    /// Tests FEN side-to-move detection and board flipping.
    #[test]
    fn fen_detects_side_to_move() {
        let white = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
        let embed = fen_embed(&config(), white);
        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value["title"], "White to move.");
        assert!(value["image"]["url"].as_str().unwrap().contains("flip=0"));

        let black = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq e3 0 1";
        let embed = fen_embed(&config(), black);
        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value["title"], "Black to move.");
        let image = value["image"]["url"].as_str().unwrap();
        assert!(image.contains("flip=1"));
        assert!(image.ends_with("&ext=.png"));
        // The FEN itself must be percent-encoded into the query.
        assert!(image.contains("fen=rnbqkbnr%2F"));
    }

    /// Tests the mod-mention prefix with and without a configured role.
    #[test]
    fn prefixes_mod_mention_when_role_exists() {
        let with = mod_error_content(Some(RoleId::new(42)), "tracker failure");
        assert_eq!(with, "<@&42>\ntracker failure");

        let without = mod_error_content(None, "tracker failure");
        assert_eq!(without, "tracker failure");
    }
}
