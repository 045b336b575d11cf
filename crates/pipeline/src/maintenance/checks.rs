//! Steps run under the maintenance lock.

use async_trait::async_trait;
use docport_core::ordering::DOCUMENT_ORDER_COUNTER;
use docport_db::repositories::{BatchRepo, ImportedDocumentRepo, LockRepo, OrderRepo};
use sqlx::PgPool;

use super::{MaintenanceError, MaintenanceStep};

/// Apply pending schema migrations.
pub struct MigrationStep;

#[async_trait]
impl MaintenanceStep for MigrationStep {
    fn name(&self) -> &'static str {
        "migrations"
    }

    async fn run(&self, pool: &PgPool) -> Result<(), MaintenanceError> {
        docport_db::run_migrations(pool).await?;
        tracing::info!("Database migrations applied");
        Ok(())
    }
}

/// Delete locks left behind by crashed holders.
pub struct ExpiredLockCheck;

#[async_trait]
impl MaintenanceStep for ExpiredLockCheck {
    fn name(&self) -> &'static str {
        "expired-locks"
    }

    async fn run(&self, pool: &PgPool) -> Result<(), MaintenanceError> {
        let purged = LockRepo::purge_expired(pool).await?;
        if purged > 0 {
            tracing::info!(purged, "Purged expired locks");
        }
        Ok(())
    }
}

/// Keep the document-order counter ahead of every assigned sort order.
///
/// Rows written before the counter existed (or restored from a backup)
/// would otherwise collide with the next values handed out.
pub struct OrderCounterCheck;

#[async_trait]
impl MaintenanceStep for OrderCounterCheck {
    fn name(&self) -> &'static str {
        "order-counter"
    }

    async fn run(&self, pool: &PgPool) -> Result<(), MaintenanceError> {
        let Some(max_sort_order) = ImportedDocumentRepo::max_sort_order(pool).await? else {
            return Ok(());
        };

        let before = OrderRepo::current(pool, DOCUMENT_ORDER_COUNTER).await?;
        let after = OrderRepo::ensure_at_least(pool, DOCUMENT_ORDER_COUNTER, max_sort_order).await?;
        if before != Some(after) {
            tracing::warn!(
                counter = DOCUMENT_ORDER_COUNTER,
                before = ?before,
                after,
                "Order counter was behind existing documents, raised"
            );
        }
        Ok(())
    }
}

/// Mark batches whose tasks are all processed as completed.
///
/// Covers a worker that processed the last task but died before
/// completing the batch.
pub struct FinishedBatchCheck;

#[async_trait]
impl MaintenanceStep for FinishedBatchCheck {
    fn name(&self) -> &'static str {
        "finished-batches"
    }

    async fn run(&self, pool: &PgPool) -> Result<(), MaintenanceError> {
        let completed = BatchRepo::complete_all_finished(pool).await?;
        if completed > 0 {
            tracing::info!(completed, "Completed finished batches");
        }
        Ok(())
    }
}
