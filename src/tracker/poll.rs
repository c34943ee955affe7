//! The scheduled update cycle.
//!
//! A cron job fires every minute: forced updates queued by `!update` are
//! processed on every tick, and a full pass over all tracked accounts runs
//! every `poll_interval_minutes` ticks. Rating-update events are published
//! only when a poll observes an actual snapshot difference, so a quiet
//! account produces no channel traffic.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};

use crate::error::AppError;
use crate::tracker::{TrackerEvent, TrackerInner};

pub(super) async fn start(inner: Arc<TrackerInner>) -> Result<JobScheduler, AppError> {
    let scheduler = JobScheduler::new().await?;
    let interval = inner.config.poll_interval_minutes.max(1) as u64;
    let ticks = Arc::new(AtomicU64::new(0));

    let job_inner = inner.clone();
    let job = Job::new_async("0 * * * * *", move |_uuid, _lock| {
        let inner = job_inner.clone();
        let ticks = ticks.clone();
        Box::pin(async move {
            process_forced(&inner).await;
            if ticks.fetch_add(1, Ordering::Relaxed) % interval == 0 {
                full_pass(&inner).await;
            }
        })
    })?;

    scheduler.add(job).await?;
    scheduler.start().await?;
    tracing::info!(
        "Rating update cycle started (full pass every {} minutes)",
        interval
    );
    Ok(scheduler)
}

/// Drains the forced-update queue. A forced refresh that fails to fetch is
/// reported to the bot channel; a quiet no-change refresh stays silent.
async fn process_forced(inner: &Arc<TrackerInner>) {
    loop {
        let next = inner.forced.lock().await.pop_front();
        let Some((guild_id, user_id)) = next else {
            break;
        };
        let Some(account) = inner.store.get(guild_id, user_id).await else {
            inner.send(TrackerEvent::Error {
                guild_id,
                message: "You are not being tracked.".to_string(),
            });
            continue;
        };
        match inner.fetch(account.source, &account.username).await {
            Ok(new_rating) => {
                apply_snapshot(inner, guild_id, user_id, &account, new_rating).await;
            }
            Err(e) => {
                tracing::warn!(
                    "Forced update fetch failed for '{}' on {}: {}",
                    account.username,
                    account.source.display_name(),
                    e
                );
                inner.send(TrackerEvent::Error {
                    guild_id,
                    message: format!(
                        "Could not refresh '{}' on {}.",
                        account.username,
                        account.source.display_name()
                    ),
                });
            }
        }
    }
}

/// One poll over every tracked account in every guild.
async fn full_pass(inner: &Arc<TrackerInner>) {
    let accounts = inner.store.all_accounts().await;
    tracing::debug!("Polling {} tracked accounts", accounts.len());
    for (guild_id, user_id, account) in accounts {
        match inner.fetch(account.source, &account.username).await {
            Ok(new_rating) => {
                apply_snapshot(inner, guild_id, user_id, &account, new_rating).await;
            }
            Err(AppError::NotFound(reason)) => {
                // The external account vanished; mods should untrack it.
                inner.send(TrackerEvent::ModError {
                    guild_id,
                    message: format!(
                        "Tracked account '{}' on {} no longer exists ({reason}).",
                        account.username,
                        account.source.display_name()
                    ),
                });
            }
            Err(e) => {
                // Transient failures retry on the next pass.
                tracing::warn!(
                    "Poll failed for '{}' on {}: {}",
                    account.username,
                    account.source.display_name(),
                    e
                );
            }
        }
    }
}

async fn apply_snapshot(
    inner: &Arc<TrackerInner>,
    guild_id: u64,
    user_id: u64,
    account: &crate::store::TrackedAccount,
    new_rating: crate::rating::RatingData,
) {
    if new_rating == account.rating {
        return;
    }
    if let Err(e) = inner
        .store
        .update_rating(guild_id, user_id, new_rating.clone())
        .await
    {
        tracing::error!("Failed to persist rating update: {}", e);
        return;
    }
    inner.send(TrackerEvent::RatingUpdate {
        guild_id,
        user_id,
        old_rating: account.rating.clone(),
        new_rating,
        source: account.source,
        username: account.username.clone(),
    });
}
