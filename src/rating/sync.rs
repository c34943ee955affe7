//! Role synchronization: bring a member's rating roles into agreement with a
//! freshly resolved band.
//!
//! The reconciler is split into a pure planning core (`held_band_roles` +
//! `plan_reconcile`) and best-effort appliers. Every role add/remove is an
//! independently fallible HTTP call; a failure on one role is logged and
//! never blocks the sibling mutation. Guild role and member state is fetched
//! fresh on every pass, so there is no cache to go stale.

use std::sync::Arc;

use serenity::all::{GuildId, Role, RoleId, UserId};
use serenity::http::Http;

use crate::config::Config;
use crate::error::AppError;
use crate::rating::band::{self, UNRANKED_BAND};
use crate::rating::RatingData;

/// Outcome of a reconciliation pass, reported to the caller so it can decide
/// what (if anything) to notify.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The resolved band role was added; a notification is warranted.
    Applied { band: String },
    /// The member already held the resolved band role; nothing to do and
    /// nothing to re-notify.
    Unchanged,
    /// Controlled demotion: every band role removed, Unranked restored.
    Demoted,
    /// No guild role matches the computed band name (or the Unranked role is
    /// missing on a demotion). Soft error, reported not thrown.
    NoValidRole { rating: u32 },
    /// The member is no longer in the guild; caller should drop tracking.
    MemberGone,
    /// Adding the band role failed. Already logged; nothing to report.
    AddFailed,
}

/// Minimal mutation set that reconciles held band roles with a target role.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcilePlan {
    pub remove: Vec<RoleId>,
    pub add: Option<RoleId>,
}

impl ReconcilePlan {
    pub fn is_noop(&self) -> bool {
        self.remove.is_empty() && self.add.is_none()
    }
}

/// Collects every role the member currently holds whose name parses as one
/// of the configured rating-band names. Not just the previous band: stray
/// band roles are picked up too so reconciliation converges.
pub fn held_band_roles(
    member_role_ids: &[RoleId],
    guild_roles: &[Role],
    thresholds: &crate::rating::band::RatingThresholds,
) -> Vec<Role> {
    guild_roles
        .iter()
        .filter(|role| member_role_ids.contains(&role.id))
        .filter(|role| band::is_band_name(&role.name, thresholds))
        .cloned()
        .collect()
}

/// Computes the minimal mutation set: remove every held band role whose name
/// differs from the target, add the target only if not already held.
///
/// The add guard is what makes repeated reconciliation idempotent: never
/// double-add, never re-notify on a no-op update.
pub fn plan_reconcile(held: &[Role], target: &Role) -> ReconcilePlan {
    let remove = held
        .iter()
        .filter(|role| role.name != target.name)
        .map(|role| role.id)
        .collect();
    let add = if held.iter().any(|role| role.name == target.name) {
        None
    } else {
        Some(target.id)
    };
    ReconcilePlan { remove, add }
}

/// Mutation plan for an initial link: drop the Unranked role when held and
/// distinct from the target, add the target unless already held.
///
/// A rating-0 link resolves to the Unranked role itself; the identity check
/// keeps that link from stripping the very role it is about to grant.
pub fn plan_link(
    member_role_ids: &[RoleId],
    guild_roles: &[Role],
    unranked_role_name: &str,
    target: &Role,
) -> ReconcilePlan {
    let remove = guild_roles
        .iter()
        .filter(|r| r.name == unranked_role_name && r.id != target.id)
        .filter(|r| member_role_ids.contains(&r.id))
        .map(|r| r.id)
        .collect();
    let add = if member_role_ids.contains(&target.id) {
        None
    } else {
        Some(target.id)
    };
    ReconcilePlan { remove, add }
}

/// The role synchronizer. Holds the shared Discord HTTP client and the
/// process configuration; constructed once and passed to every caller that
/// reconciles roles.
pub struct RoleSync {
    http: Arc<Http>,
    config: Arc<Config>,
}

impl RoleSync {
    pub fn new(http: Arc<Http>, config: Arc<Config>) -> Self {
        Self { http, config }
    }

    /// Initial link of a freshly tracked account.
    ///
    /// Removes the Unranked role if held (unless it is itself the resolved
    /// band role), then adds the resolved band role. If no valid role
    /// resolves, performs no mutation.
    pub async fn link(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        rating: &RatingData,
    ) -> Result<SyncOutcome, AppError> {
        let guild_roles = self.http.get_guild_roles(guild_id).await?;
        let member_roles = match self.member_roles(guild_id, user_id).await {
            Some(roles) => roles,
            None => return Ok(SyncOutcome::MemberGone),
        };

        let Some(target) =
            band::resolve_band_role(rating.max_rating, &self.config.thresholds, &guild_roles)
        else {
            return Ok(SyncOutcome::NoValidRole {
                rating: rating.max_rating,
            });
        };
        let target = target.clone();

        let plan = plan_link(
            &member_roles,
            &guild_roles,
            &self.config.unranked_role_name,
            &target,
        );
        for role_id in &plan.remove {
            self.remove_role(guild_id, user_id, *role_id).await;
        }
        match plan.add {
            None => Ok(SyncOutcome::Unchanged),
            Some(role_id) => {
                if self.add_role(guild_id, user_id, role_id).await {
                    Ok(SyncOutcome::Applied { band: target.name })
                } else {
                    Ok(SyncOutcome::AddFailed)
                }
            }
        }
    }

    /// Periodic or forced update: recompute the band from a new rating
    /// snapshot and apply the minimal diff.
    pub async fn update(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        rating: &RatingData,
    ) -> Result<SyncOutcome, AppError> {
        let guild_roles = self.http.get_guild_roles(guild_id).await?;
        let member_roles = match self.member_roles(guild_id, user_id).await {
            Some(roles) => roles,
            None => return Ok(SyncOutcome::MemberGone),
        };

        let name = band::band_name(rating.max_rating, &self.config.thresholds);
        if name == UNRANKED_BAND {
            // Verify the Unranked role actually exists before taking the
            // demotion branch; a missing role is a soft error, not a silent
            // half-applied demotion.
            if !guild_roles
                .iter()
                .any(|r| r.name == self.config.unranked_role_name)
            {
                return Ok(SyncOutcome::NoValidRole {
                    rating: rating.max_rating,
                });
            }
            self.clear_band_roles(guild_id, user_id, &guild_roles, &member_roles)
                .await;
            return Ok(SyncOutcome::Demoted);
        }

        let Some(target) = guild_roles.iter().find(|r| r.name == name) else {
            return Ok(SyncOutcome::NoValidRole {
                rating: rating.max_rating,
            });
        };

        let held = held_band_roles(&member_roles, &guild_roles, &self.config.thresholds);
        let plan = plan_reconcile(&held, target);
        for role_id in &plan.remove {
            self.remove_role(guild_id, user_id, *role_id).await;
        }
        match plan.add {
            None => Ok(SyncOutcome::Unchanged),
            Some(role_id) => {
                if self.add_role(guild_id, user_id, role_id).await {
                    Ok(SyncOutcome::Applied {
                        band: target.name.clone(),
                    })
                } else {
                    Ok(SyncOutcome::AddFailed)
                }
            }
        }
    }

    /// Full role removal: strip every held band role, then restore the
    /// Unranked role if one is configured. Used on explicit removal,
    /// demotion, and (silently) when a member leaves the guild.
    pub async fn clear(&self, guild_id: GuildId, user_id: UserId) -> Result<(), AppError> {
        let guild_roles = self.http.get_guild_roles(guild_id).await?;
        let Some(member_roles) = self.member_roles(guild_id, user_id).await else {
            // Member already gone; nothing to strip.
            return Ok(());
        };
        self.clear_band_roles(guild_id, user_id, &guild_roles, &member_roles)
            .await;
        Ok(())
    }

    /// Assigns the Unranked role to a freshly joined member, if the guild
    /// has one configured.
    pub async fn assign_unranked(&self, guild_id: GuildId, user_id: UserId) -> Result<(), AppError> {
        let guild_roles = self.http.get_guild_roles(guild_id).await?;
        if let Some(unranked) = guild_roles
            .iter()
            .find(|r| r.name == self.config.unranked_role_name)
        {
            self.add_role(guild_id, user_id, unranked.id).await;
        }
        Ok(())
    }

    async fn clear_band_roles(
        &self,
        guild_id: GuildId,
        user_id: UserId,
        guild_roles: &[Role],
        member_roles: &[RoleId],
    ) {
        let held = held_band_roles(member_roles, guild_roles, &self.config.thresholds);
        for role in held
            .iter()
            .filter(|r| r.name != self.config.unranked_role_name)
        {
            self.remove_role(guild_id, user_id, role.id).await;
        }
        if let Some(unranked) = guild_roles
            .iter()
            .find(|r| r.name == self.config.unranked_role_name)
        {
            if !member_roles.contains(&unranked.id) {
                self.add_role(guild_id, user_id, unranked.id).await;
            }
        }
    }

    /// Fresh member lookup. A member that cannot be fetched is treated as
    /// departed; the caller self-heals by dropping tracking.
    async fn member_roles(&self, guild_id: GuildId, user_id: UserId) -> Option<Vec<RoleId>> {
        match self.http.get_member(guild_id, user_id).await {
            Ok(member) => Some(member.roles),
            Err(e) => {
                tracing::warn!(
                    "Member {} not found in guild {}: {}",
                    user_id,
                    guild_id,
                    e
                );
                None
            }
        }
    }

    async fn add_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> bool {
        match self
            .http
            .add_member_role(guild_id, user_id, role_id, None)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "Failed to add role {} to member {} in guild {}: {}",
                    role_id,
                    user_id,
                    guild_id,
                    e
                );
                false
            }
        }
    }

    async fn remove_role(&self, guild_id: GuildId, user_id: UserId, role_id: RoleId) -> bool {
        match self
            .http
            .remove_member_role(guild_id, user_id, role_id, None)
            .await
        {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(
                    "Failed to remove role {} from member {} in guild {}: {}",
                    role_id,
                    user_id,
                    guild_id,
                    e
                );
                false
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::rating::band::RatingThresholds;
    use test_utils::serenity::role::create_test_role;

    fn ladder() -> RatingThresholds {
        RatingThresholds::new(vec![800, 1200, 1600, 2000]).unwrap()
    }

    /// Tests that only roles with band-shaped names are collected.
    #[test]
    fn collects_only_band_roles() {
        let t = ladder();
        let guild_roles = vec![
            create_test_role(1, "1200+", 0, 1),
            create_test_role(2, "Arena", 0, 1),
            create_test_role(3, "800-", 0, 1),
            create_test_role(4, "2000++", 0, 1),
        ];
        let member = vec![RoleId::new(1), RoleId::new(2), RoleId::new(3)];

        let held = held_band_roles(&member, &guild_roles, &t);
        let names: Vec<&str> = held.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["1200+", "800-"]);
    }

    /// Tests reconciliation idempotence: applying the same (member, band)
    /// pair twice produces no second mutation.
    ///
    /// Expected: second plan is a no-op
    #[test]
    fn reconcile_is_idempotent() {
        let target = create_test_role(10, "1600+", 0, 1);

        let first = plan_reconcile(&[], &target);
        assert_eq!(first.add, Some(RoleId::new(10)));
        assert!(first.remove.is_empty());

        // After the first plan is applied the member holds the target.
        let held = vec![target.clone()];
        let second = plan_reconcile(&held, &target);
        assert!(second.is_noop());
    }

    /// Tests convergence with stray band roles: a member holding two strays
    /// plus the correct band role loses exactly the strays with zero adds.
    #[test]
    fn reconcile_converges_on_strays() {
        let target = create_test_role(10, "1600+", 0, 1);
        let held = vec![
            create_test_role(11, "800-", 0, 1),
            target.clone(),
            create_test_role(12, "1200+", 0, 1),
        ];

        let plan = plan_reconcile(&held, &target);
        assert_eq!(plan.remove, vec![RoleId::new(11), RoleId::new(12)]);
        assert_eq!(plan.add, None);
    }

    /// Tests that linking a rating that resolves to Unranked keeps the held
    /// Unranked role in place instead of stripping it.
    ///
    /// Expected: no removal when target and Unranked are the same role
    #[test]
    fn link_to_unranked_keeps_unranked_role() {
        let guild_roles = vec![
            create_test_role(1, "Unranked", 0, 1),
            create_test_role(2, "1200+", 0, 1),
        ];
        let unranked = guild_roles[0].clone();

        let plan = plan_link(&[RoleId::new(1)], &guild_roles, "Unranked", &unranked);
        assert!(plan.is_noop());

        // A member without the role still gets it added.
        let plan = plan_link(&[], &guild_roles, "Unranked", &unranked);
        assert_eq!(plan.add, Some(RoleId::new(1)));
        assert!(plan.remove.is_empty());
    }

    /// Tests the standard link: Unranked removed, band role added.
    #[test]
    fn link_swaps_unranked_for_band_role() {
        let guild_roles = vec![
            create_test_role(1, "Unranked", 0, 1),
            create_test_role(2, "1200+", 0, 1),
        ];
        let target = guild_roles[1].clone();

        let plan = plan_link(&[RoleId::new(1)], &guild_roles, "Unranked", &target);
        assert_eq!(plan.remove, vec![RoleId::new(1)]);
        assert_eq!(plan.add, Some(RoleId::new(2)));
    }

    /// Tests the first link for a roleless member at rating 1450: exactly
    /// one band-role addition, Unranked untouched because absent, and a
    /// second identical callback plans no further mutation, which is what
    /// suppresses a duplicate notification.
    #[test]
    fn first_link_adds_once_and_settles() {
        let t = ladder();
        let guild_roles = vec![
            create_test_role(1, "Unranked", 0, 1),
            create_test_role(2, "1200+", 0, 1),
        ];
        let target = band::resolve_band_role(1450, &t, &guild_roles)
            .unwrap()
            .clone();
        assert_eq!(target.name, "1200+");

        let first = plan_link(&[], &guild_roles, "Unranked", &target);
        assert_eq!(first.add, Some(RoleId::new(2)));
        assert!(first.remove.is_empty());

        let second = plan_link(&[RoleId::new(2)], &guild_roles, "Unranked", &target);
        assert!(second.is_noop());
    }

    /// Tests that a band change removes the previous band and adds the new.
    #[test]
    fn reconcile_swaps_bands() {
        let target = create_test_role(10, "2000++", 0, 1);
        let held = vec![create_test_role(11, "1600+", 0, 1)];

        let plan = plan_reconcile(&held, &target);
        assert_eq!(plan.remove, vec![RoleId::new(11)]);
        assert_eq!(plan.add, Some(RoleId::new(10)));
    }
}
