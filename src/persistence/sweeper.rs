//! Background sweep for unfinished drill sessions.
//!
//! Sessions left `in_progress` longer than `stale_session_minutes` are
//! marked `abandoned` so they stop accepting attempts.

use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use super::db::Database;
use super::drill_repo::DrillRepo;
use crate::Result;

const SWEEP_INTERVAL: Duration = Duration::from_secs(300);

/// Spawn the stale-session sweep background task.
///
/// The task runs every five minutes until `cancel` fires.
#[must_use]
pub fn spawn_session_sweeper(
    db: Arc<Database>,
    stale_session_minutes: u32,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let repo = DrillRepo::new(db);
        let mut interval = tokio::time::interval(SWEEP_INTERVAL);
        loop {
            tokio::select! {
                () = cancel.cancelled() => {
                    info!("session sweeper shutting down");
                    break;
                }
                _ = interval.tick() => {
                    if let Err(err) = sweep(&repo, stale_session_minutes).await {
                        error!(?err, "session sweep failed");
                    }
                }
            }
        }
    })
}

/// Abandon every in-progress session older than `stale_session_minutes`.
///
/// Returns the number of sessions abandoned.
///
/// # Errors
///
/// Returns `AppError::Db` if the update fails.
pub async fn sweep(repo: &DrillRepo, stale_session_minutes: u32) -> Result<u64> {
    let cutoff = Utc::now() - chrono::Duration::minutes(i64::from(stale_session_minutes));
    let abandoned = repo.abandon_started_before(cutoff).await?;
    if abandoned > 0 {
        info!(abandoned, "stale drill sessions abandoned");
    } else {
        debug!("no stale drill sessions");
    }
    Ok(abandoned)
}
