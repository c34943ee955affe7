//! Pure rating-band resolution.
//!
//! A band is a named tier mapped 1:1 to a guild role. Band names are pure
//! string computations over the configured threshold ladder, re-derivable
//! independent of any role object: `"Unranked"`, `"<t0>-"`, `"<ti>+"` and
//! `"<tlast>++"`. Role lookup by that name is the caller's problem; a
//! missing role is a soft error, never a panic.

use serenity::all::Role;

use crate::error::ConfigError;

/// Band name for a zero (unrated) rating.
pub const UNRANKED_BAND: &str = "Unranked";

/// Ascending ordered sequence of integer rating cutoffs. Process-wide
/// configuration, immutable at runtime. Strictly increasing and non-empty by
/// construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RatingThresholds(Vec<u32>);

impl RatingThresholds {
    pub fn new(values: Vec<u32>) -> Result<Self, ConfigError> {
        if values.is_empty() {
            return Err(ConfigError::InvalidThresholds(
                "threshold list is empty".to_string(),
            ));
        }
        if !values.windows(2).all(|w| w[0] < w[1]) {
            return Err(ConfigError::InvalidThresholds(format!(
                "thresholds must be strictly increasing, got {values:?}"
            )));
        }
        Ok(Self(values))
    }

    /// Parses a comma-separated threshold list, e.g. `"800,1200,1600,2000"`.
    pub fn parse(raw: &str) -> Result<Self, ConfigError> {
        let values = raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| {
                s.parse::<u32>().map_err(|e| {
                    ConfigError::InvalidThresholds(format!("bad cutoff {s:?}: {e}"))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(values)
    }

    pub fn values(&self) -> &[u32] {
        &self.0
    }

    fn first(&self) -> u32 {
        self.0[0]
    }

    fn last(&self) -> u32 {
        self.0[self.0.len() - 1]
    }
}

/// Resolves a non-negative rating to its band name.
///
/// Ordered precedence, first match wins:
/// 1. rating 0 is `"Unranked"`
/// 2. below the lowest cutoff is `"<t0>-"`
/// 3. at or above the highest cutoff is `"<tlast>++"`
/// 4. otherwise the greatest cutoff at or below the rating yields `"<ti>+"`
///
/// Total over every non-negative rating: exactly one band name, always.
pub fn band_name(rating: u32, thresholds: &RatingThresholds) -> String {
    if rating == 0 {
        return UNRANKED_BAND.to_string();
    }
    if rating < thresholds.first() {
        return format!("{}-", thresholds.first());
    }
    if rating >= thresholds.last() {
        return format!("{}++", thresholds.last());
    }
    // Scan from highest to lowest; the range checks above guarantee a hit.
    let cutoff = thresholds
        .values()
        .iter()
        .rev()
        .find(|&&t| rating >= t)
        .copied()
        .unwrap_or_else(|| thresholds.first());
    format!("{cutoff}+")
}

/// Whether a role name parses as one of the configured rating-band names.
///
/// Used for stray-role cleanup: any stray `<cutoff>-`/`<cutoff>+`/`<cutoff>++`
/// role (and a stray `Unranked`) counts, regardless of which suffix the
/// ladder would currently derive for that cutoff.
pub fn is_band_name(name: &str, thresholds: &RatingThresholds) -> bool {
    if name == UNRANKED_BAND {
        return true;
    }
    let digits_end = name.find(|c: char| !c.is_ascii_digit()).unwrap_or(0);
    if digits_end == 0 {
        return false;
    }
    let (digits, suffix) = name.split_at(digits_end);
    if !matches!(suffix, "-" | "+" | "++") {
        return false;
    }
    match digits.parse::<u32>() {
        Ok(cutoff) => thresholds.values().contains(&cutoff),
        Err(_) => false,
    }
}

/// Looks up the guild role matching the band name for a rating.
///
/// Returns `None` when no role with that exact name exists; the caller
/// reports "no valid role for rating" instead of failing hard.
pub fn resolve_band_role<'a>(
    rating: u32,
    thresholds: &RatingThresholds,
    guild_roles: &'a [Role],
) -> Option<&'a Role> {
    let name = band_name(rating, thresholds);
    guild_roles.iter().find(|r| r.name == name)
}

#[cfg(test)]
mod test {
    use super::*;
    use test_utils::serenity::role::create_test_role;

    fn ladder() -> RatingThresholds {
        RatingThresholds::new(vec![800, 1200, 1600, 2000]).unwrap()
    }

    /// Tests the band scenario table for the `[800,1200,1600,2000]` ladder.
    ///
    /// Expected: 700 -> "800-", 1200 -> "1200+", 2500 -> "2000++",
    /// 0 -> "Unranked"
    #[test]
    fn resolves_scenario_table() {
        let t = ladder();
        assert_eq!(band_name(700, &t), "800-");
        assert_eq!(band_name(1200, &t), "1200+");
        assert_eq!(band_name(2500, &t), "2000++");
        assert_eq!(band_name(0, &t), UNRANKED_BAND);
    }

    /// Tests that every rating maps to exactly one stable band.
    #[test]
    fn resolution_is_total_and_deterministic() {
        let t = ladder();
        for rating in 0..3000 {
            let first = band_name(rating, &t);
            let second = band_name(rating, &t);
            assert_eq!(first, second);
            assert!(!first.is_empty());
        }
    }

    /// Tests boundary behavior at each cutoff.
    #[test]
    fn resolves_cutoff_boundaries() {
        let t = ladder();
        assert_eq!(band_name(799, &t), "800-");
        assert_eq!(band_name(800, &t), "800+");
        assert_eq!(band_name(1199, &t), "800+");
        assert_eq!(band_name(1600, &t), "1600+");
        assert_eq!(band_name(1999, &t), "1600+");
        assert_eq!(band_name(2000, &t), "2000++");
    }

    /// Tests band resolution against a single-cutoff ladder.
    #[test]
    fn resolves_single_threshold_ladder() {
        let t = RatingThresholds::new(vec![1500]).unwrap();
        assert_eq!(band_name(0, &t), UNRANKED_BAND);
        assert_eq!(band_name(1, &t), "1500-");
        assert_eq!(band_name(1500, &t), "1500++");
        assert_eq!(band_name(2800, &t), "1500++");
    }

    /// Tests band-name classification used for stray-role cleanup.
    #[test]
    fn classifies_band_names() {
        let t = ladder();
        assert!(is_band_name("Unranked", &t));
        assert!(is_band_name("800-", &t));
        assert!(is_band_name("1200+", &t));
        assert!(is_band_name("2000++", &t));
        // Stray suffix on a real cutoff still counts as a band role.
        assert!(is_band_name("2000+", &t));
        assert!(!is_band_name("900+", &t));
        assert!(!is_band_name("1200", &t));
        assert!(!is_band_name("1200%", &t));
        assert!(!is_band_name("Arena", &t));
        assert!(!is_band_name("", &t));
    }

    /// Tests that role lookup by band name is by exact name match.
    #[test]
    fn resolves_role_by_exact_name() {
        let t = ladder();
        let roles = vec![
            create_test_role(1, "1200+", 0, 1),
            create_test_role(2, "Unranked", 0, 1),
        ];
        assert_eq!(resolve_band_role(1450, &t, &roles).unwrap().id.get(), 1);
        assert_eq!(resolve_band_role(0, &t, &roles).unwrap().id.get(), 2);
        // 2500 resolves to "2000++" which has no matching role.
        assert!(resolve_band_role(2500, &t, &roles).is_none());
    }

    /// Tests threshold validation.
    ///
    /// Expected: empty and non-increasing ladders rejected
    #[test]
    fn validates_thresholds() {
        assert!(RatingThresholds::new(vec![]).is_err());
        assert!(RatingThresholds::new(vec![800, 800]).is_err());
        assert!(RatingThresholds::new(vec![1200, 800]).is_err());
        assert!(RatingThresholds::new(vec![800]).is_ok());
        assert!(RatingThresholds::parse("800, 1200,1600").is_ok());
        assert!(RatingThresholds::parse("800,abc").is_err());
    }
}
