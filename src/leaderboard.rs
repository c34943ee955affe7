//! Leaderboard and rank rendering over tracked-account snapshots.
//!
//! A `Leaderboard` is constructed per request from a snapshot of the guild's
//! tracked accounts plus display options, and produces embeds. Nicknames are
//! resolved through a caller-supplied async resolver so this module never
//! talks to Discord itself.

use std::future::Future;

use chrono::{Duration, Utc};
use serenity::all::{CreateEmbed, CreateEmbedFooter};

use crate::store::TrackedAccount;

const PAGE_SIZE: usize = 10;

/// The four known time-control pools.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeControl {
    Bullet,
    Blitz,
    Rapid,
    Classical,
}

impl TimeControl {
    /// Display name, capitalised the way the embeds show it.
    pub fn display(&self) -> &'static str {
        match self {
            TimeControl::Bullet => "Bullet",
            TimeControl::Blitz => "Blitz",
            TimeControl::Rapid => "Rapid",
            TimeControl::Classical => "Classical",
        }
    }
}

impl std::str::FromStr for TimeControl {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bullet" => Ok(TimeControl::Bullet),
            "blitz" => Ok(TimeControl::Blitz),
            "rapid" => Ok(TimeControl::Rapid),
            "classical" => Ok(TimeControl::Classical),
            _ => Err(()),
        }
    }
}

/// Per-request display options.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ListOptions {
    pub time_control: Option<TimeControl>,
    pub page: Option<u32>,
    /// Restrict to accounts whose rating changed recently.
    pub active: bool,
}

pub struct Leaderboard {
    options: ListOptions,
    active_window_days: i64,
    /// (user_id, account) snapshot taken at construction time.
    accounts: Vec<(u64, TrackedAccount)>,
}

impl Leaderboard {
    pub fn new(
        accounts: Vec<(u64, TrackedAccount)>,
        options: ListOptions,
        active_window_days: i64,
    ) -> Self {
        Self {
            options,
            active_window_days,
            accounts,
        }
    }

    /// Accounts that qualify under the current options, ordered by rating
    /// descending. Accounts lacking the filtered time-control pool are
    /// excluded rather than shown as zero.
    fn ranked(&self) -> Vec<(u64, &TrackedAccount, u32)> {
        let cutoff = Utc::now() - Duration::days(self.active_window_days);
        let mut entries: Vec<(u64, &TrackedAccount, u32)> = self
            .accounts
            .iter()
            .filter(|(_, acc)| !self.options.active || acc.last_change >= cutoff)
            .filter_map(|(uid, acc)| {
                let rating = acc.rating.rating_for(self.options.time_control)?;
                Some((*uid, acc, rating))
            })
            .collect();
        entries.sort_by(|a, b| b.2.cmp(&a.2).then(a.1.username.cmp(&b.1.username)));
        entries
    }

    /// Renders the leaderboard page as an embed.
    pub async fn get_list<F, Fut>(&self, nick: F) -> CreateEmbed
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = String>,
    {
        let ranked = self.ranked();
        let page_count = ranked.len().div_ceil(PAGE_SIZE).max(1);
        // 1-based pages, out-of-range clamps to the last page.
        let page = (self.options.page.unwrap_or(1).max(1) as usize).min(page_count);

        let mut lines = Vec::new();
        let start = (page - 1) * PAGE_SIZE;
        for (offset, (user_id, account, rating)) in
            ranked.iter().skip(start).take(PAGE_SIZE).enumerate()
        {
            let nick = nick(*user_id).await;
            lines.push(format!(
                "{}. {} — **{}** ({} '{}')",
                start + offset + 1,
                nick,
                rating,
                account.source.display_name(),
                account.username,
            ));
        }
        if lines.is_empty() {
            lines.push("Nobody is being tracked yet.".to_string());
        }

        let mut title = if self.options.active {
            "Active leaderboard".to_string()
        } else {
            "Leaderboard".to_string()
        };
        if let Some(tc) = self.options.time_control {
            title.push_str(&format!(" — {}", tc.display()));
        }

        CreateEmbed::new()
            .title(title)
            .description(lines.join("\n"))
            .footer(CreateEmbedFooter::new(format!("Page {page}/{page_count}")))
    }

    /// Renders a single member's rank, or `None` if they are not ranked
    /// under the current options.
    pub async fn get_rank<F, Fut>(&self, nick: F, user_id: u64) -> Option<CreateEmbed>
    where
        F: Fn(u64) -> Fut,
        Fut: Future<Output = String>,
    {
        let ranked = self.ranked();
        let position = ranked.iter().position(|(uid, _, _)| *uid == user_id)?;
        let (_, account, rating) = &ranked[position];
        let nick = nick(user_id).await;
        Some(
            CreateEmbed::new()
                .title(format!("Rank for {nick}"))
                .description(format!(
                    "Rank **#{}** of {} — rated **{}** ({} '{}')",
                    position + 1,
                    ranked.len(),
                    rating,
                    account.source.display_name(),
                    account.username,
                )),
        )
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rating::RatingData;
    use crate::tracker::Source;

    fn account(username: &str, pools: [Option<u32>; 4], stale: bool) -> TrackedAccount {
        TrackedAccount {
            source: Source::Lichess,
            username: username.to_string(),
            rating: RatingData::from_pools(pools[0], pools[1], pools[2], pools[3]),
            last_change: if stale {
                Utc::now() - Duration::days(60)
            } else {
                Utc::now()
            },
        }
    }

    fn snapshot() -> Vec<(u64, TrackedAccount)> {
        vec![
            (1, account("alpha", [Some(1400), None, Some(1850), None], false)),
            (2, account("bravo", [Some(2100), Some(1700), None, None], true)),
            (3, account("carol", [None, None, Some(1600), Some(1200)], false)),
        ]
    }

    async fn nick(uid: u64) -> String {
        format!("user{uid}")
    }

    /// Tests ordering by max rating when no time control is given.
    #[tokio::test]
    async fn orders_by_max_rating() {
        let board = Leaderboard::new(snapshot(), ListOptions::default(), 14);
        let ranked = board.ranked();
        let order: Vec<u64> = ranked.iter().map(|(uid, _, _)| *uid).collect();
        // bravo 2100, alpha 1850, carol 1600
        assert_eq!(order, vec![2, 1, 3]);
    }

    /// Tests that a time-control filter excludes accounts without the pool.
    #[tokio::test]
    async fn filters_by_time_control() {
        let options = ListOptions {
            time_control: Some(TimeControl::Blitz),
            ..Default::default()
        };
        let board = Leaderboard::new(snapshot(), options, 14);
        let ranked = board.ranked();
        let order: Vec<u64> = ranked.iter().map(|(uid, _, _)| *uid).collect();
        // bravo has no blitz pool; alpha 1850 over carol 1600.
        assert_eq!(order, vec![1, 3]);
    }

    /// Tests the active filter against the rating-change window.
    #[tokio::test]
    async fn active_filter_drops_stale_accounts() {
        let options = ListOptions {
            active: true,
            ..Default::default()
        };
        let board = Leaderboard::new(snapshot(), options, 14);
        let ranked = board.ranked();
        assert!(ranked.iter().all(|(uid, _, _)| *uid != 2));
    }

    /// Tests rank lookup for a tracked and an untracked member.
    #[tokio::test]
    async fn ranks_tracked_member_only() {
        let board = Leaderboard::new(snapshot(), ListOptions::default(), 14);
        assert!(board.get_rank(nick, 1).await.is_some());
        assert!(board.get_rank(nick, 999).await.is_none());
    }

    /// Tests that an out-of-range page clamps to the last page instead of
    /// rendering empty.
    #[tokio::test]
    async fn clamps_out_of_range_page() {
        let options = ListOptions {
            page: Some(99),
            ..Default::default()
        };
        let board = Leaderboard::new(snapshot(), options, 14);
        let embed = board.get_list(nick).await;
        let value = serde_json::to_value(&embed).unwrap();
        assert_eq!(value["footer"]["text"], "Page 1/1");
        assert!(value["description"]
            .as_str()
            .unwrap()
            .contains("1. user2"));
    }
}
