//! Rating-band resolution and role synchronization.
//!
//! `band` holds the pure math mapping a numeric rating onto a named band;
//! `sync` brings a member's Discord roles into agreement with a freshly
//! resolved band using minimal, independently fallible mutations.

pub mod band;
pub mod sync;

use serde::{Deserialize, Serialize};

/// Snapshot of a tracked account's ratings, passed by value into tracker
/// events and immutable once received. Absent time controls stay `None` and
/// are omitted from notifications entirely.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RatingData {
    /// Highest rating across the present time controls; 0 means unranked.
    pub max_rating: u32,
    pub classical: Option<u32>,
    pub rapid: Option<u32>,
    pub blitz: Option<u32>,
    pub bullet: Option<u32>,
}

impl RatingData {
    /// Builds a snapshot from per-time-control values, deriving `max_rating`.
    pub fn from_pools(
        classical: Option<u32>,
        rapid: Option<u32>,
        blitz: Option<u32>,
        bullet: Option<u32>,
    ) -> Self {
        let max_rating = [classical, rapid, blitz, bullet]
            .into_iter()
            .flatten()
            .max()
            .unwrap_or(0);
        Self {
            max_rating,
            classical,
            rapid,
            blitz,
            bullet,
        }
    }

    /// The rating used for leaderboard ordering under an optional
    /// time-control filter.
    pub fn rating_for(&self, time_control: Option<crate::leaderboard::TimeControl>) -> Option<u32> {
        use crate::leaderboard::TimeControl;
        match time_control {
            None => Some(self.max_rating),
            Some(TimeControl::Classical) => self.classical,
            Some(TimeControl::Rapid) => self.rapid,
            Some(TimeControl::Blitz) => self.blitz,
            Some(TimeControl::Bullet) => self.bullet,
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// Tests that max_rating is derived from the highest present pool.
    #[test]
    fn derives_max_rating() {
        let data = RatingData::from_pools(Some(1500), None, Some(1720), Some(1688));
        assert_eq!(data.max_rating, 1720);
    }

    /// Tests that an account with no rated pools derives a zero max rating.
    #[test]
    fn empty_pools_mean_unranked() {
        let data = RatingData::from_pools(None, None, None, None);
        assert_eq!(data.max_rating, 0);
    }
}
