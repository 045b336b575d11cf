//! Periodic purge of expired locks.
//!
//! Expired locks are already ignored and replaced by `LockRepo::take`;
//! this loop only keeps the table from accumulating rows left behind by
//! crashed holders.

use std::time::Duration;

use docport_db::repositories::LockRepo;
use sqlx::PgPool;
use tokio_util::sync::CancellationToken;

/// Run the lock reaper loop until `cancel` is triggered.
pub async fn run(pool: PgPool, every: Duration, cancel: CancellationToken) {
    tracing::info!(interval_secs = every.as_secs(), "Lock reaper started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Lock reaper stopping");
                break;
            }
            _ = interval.tick() => {
                match LockRepo::purge_expired(&pool).await {
                    Ok(0) => tracing::debug!("Lock reaper: nothing expired"),
                    Ok(purged) => tracing::info!(purged, "Lock reaper: purged expired locks"),
                    Err(e) => tracing::error!(error = %e, "Lock reaper: purge failed"),
                }
            }
        }
    }
}
