//! Argument parsing shared by the command handlers.

use serenity::all::UserId;

use crate::leaderboard::{ListOptions, TimeControl};

/// Parses a strict `<@id>` or `<@!id>` user mention. Anything else,
/// including a bare numeric id, is rejected.
pub(crate) fn parse_mention(token: &str) -> Option<UserId> {
    let inner = token.strip_prefix("<@")?.strip_suffix('>')?;
    let digits = inner.strip_prefix('!').unwrap_or(inner);
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse().ok().map(UserId::new)
}

/// Arity gate for commands that take no parameters.
pub(crate) fn expect_no_args(args: &[&str]) -> Result<(), String> {
    if args.is_empty() {
        Ok(())
    } else {
        Err("Wrong amount of parameters.".to_string())
    }
}

/// Parses the `!list` / `!active` argument shapes: nothing, a page, a time
/// control, or a time control followed by a page. Errors are the user-facing
/// message.
pub(crate) fn parse_list_args(args: &[&str]) -> Result<ListOptions, String> {
    match args {
        [] => Ok(ListOptions::default()),
        [single] => {
            if let Ok(tc) = single.parse::<TimeControl>() {
                Ok(ListOptions {
                    time_control: Some(tc),
                    ..Default::default()
                })
            } else if let Ok(page) = single.parse::<u32>() {
                Ok(ListOptions {
                    page: Some(page),
                    ..Default::default()
                })
            } else {
                Err("Bad second parameter (type or page).".to_string())
            }
        }
        [type_arg, page_arg] => {
            let tc = type_arg
                .parse::<TimeControl>()
                .map_err(|_| "Bad second parameter (type).".to_string())?;
            let page = page_arg
                .parse::<u32>()
                .map_err(|_| "Bad third parameter (page).".to_string())?;
            Ok(ListOptions {
                time_control: Some(tc),
                page: Some(page),
                active: false,
            })
        }
        _ => Err("Wrong amount of parameters.".to_string()),
    }
}

/// Extracts the body of a fenced code block, dropping an optional language
/// tag on the opening fence.
pub(crate) fn extract_code_block(content: &str) -> Option<String> {
    let start = content.find("```")?;
    let rest = &content[start + 3..];
    let end = rest.find("```")?;
    let mut body = &rest[..end];
    // A language tag occupies the remainder of the opening-fence line.
    if let Some(newline) = body.find('\n') {
        let first_line = &body[..newline];
        if !first_line.trim().is_empty() && !first_line.contains(char::is_whitespace) {
            body = &body[newline + 1..];
        }
    }
    let body = body.trim();
    if body.is_empty() {
        None
    } else {
        Some(body.to_string())
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Tests mention parsing for both mention shapes and the rejects.
    #[test]
    fn parses_strict_mentions() {
        assert_eq!(parse_mention("<@123>"), Some(UserId::new(123)));
        assert_eq!(parse_mention("<@!456>"), Some(UserId::new(456)));
        assert_eq!(parse_mention("123"), None);
        assert_eq!(parse_mention("<@&123>"), None);
        assert_eq!(parse_mention("<@abc>"), None);
        assert_eq!(parse_mention("<@>"), None);
    }

    /// Tests the leaderboard argument shapes.
    ///
    /// Expected: `blitz 2` gives a typed page, a lone number gives a page,
    /// no arguments give defaults.
    #[test]
    fn parses_list_argument_shapes() {
        let parsed = parse_list_args(&["blitz", "2"]).unwrap();
        assert_eq!(parsed.time_control, Some(TimeControl::Blitz));
        assert_eq!(parsed.page, Some(2));

        let parsed = parse_list_args(&["3"]).unwrap();
        assert_eq!(parsed.time_control, None);
        assert_eq!(parsed.page, Some(3));

        let parsed = parse_list_args(&[]).unwrap();
        assert_eq!(parsed, ListOptions::default());
    }

    /// Tests that an argument which is neither a time control nor a number
    /// is a user error, not a silent default.
    #[test]
    fn rejects_unparsable_list_argument() {
        let err = parse_list_args(&["foo"]).unwrap_err();
        assert_eq!(err, "Bad second parameter (type or page).");

        let err = parse_list_args(&["foo", "2"]).unwrap_err();
        assert_eq!(err, "Bad second parameter (type).");

        let err = parse_list_args(&["blitz", "x"]).unwrap_err();
        assert_eq!(err, "Bad third parameter (page).");

        let err = parse_list_args(&["blitz", "2", "extra"]).unwrap_err();
        assert_eq!(err, "Wrong amount of parameters.");
    }

    /// Tests the zero-parameter arity gate shared by the no-argument
    /// commands.
    #[test]
    fn rejects_surplus_arguments() {
        assert!(expect_no_args(&[]).is_ok());
        assert_eq!(
            expect_no_args(&["extra"]).unwrap_err(),
            "Wrong amount of parameters."
        );
    }

    /// Tests code-block extraction with and without a language tag.
    #[test]
    fn extracts_code_blocks() {
        assert_eq!(
            extract_code_block("!eval ```status```").as_deref(),
            Some("status")
        );
        assert_eq!(
            extract_code_block("!eval ```txt\nstatus\n```").as_deref(),
            Some("status")
        );
        assert_eq!(extract_code_block("!eval status"), None);
        assert_eq!(extract_code_block("!eval ``` ```"), None);
    }
}
