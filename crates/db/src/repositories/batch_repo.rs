//! Repository for the `batches` table.
//!
//! Batches are created once and afterwards only touched by additive
//! updates: appending an error, or setting `completed_on`.

use docport_core::batch::BatchType;
use docport_core::import::normalize_host;
use docport_core::pagination::{clamp_limit, clamp_offset, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT};
use docport_core::types::DbId;
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::batch::{Batch, CreateBatch};
use crate::models::task::{CreateTask, Task};
use crate::repositories::TaskRepo;

/// Column list for `batches` queries.
const COLUMNS: &str = "id, created_by, created_on, completed_on, batch_type, batch_params, errors";

/// Provides CRUD operations for batches.
pub struct BatchRepo;

impl BatchRepo {
    /// Insert a batch and all of its tasks in one transaction.
    ///
    /// Either the batch and every task are persisted, or nothing is.
    pub async fn create_with_tasks(
        pool: &PgPool,
        input: &CreateBatch,
        tasks: &[CreateTask],
    ) -> Result<(Batch, Vec<Task>), sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO batches (created_by, batch_type, batch_params) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        let batch = sqlx::query_as::<_, Batch>(&query)
            .bind(input.created_by)
            .bind(input.batch_type.as_str())
            .bind(Json(&input.batch_params))
            .fetch_one(&mut *tx)
            .await?;

        let mut created = Vec::with_capacity(tasks.len());
        for task in tasks {
            created.push(TaskRepo::insert_in_tx(&mut tx, batch.id, task).await?);
        }

        tx.commit().await?;
        Ok((batch, created))
    }

    /// Find a batch by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM batches WHERE id = $1");
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List batches, newest first.
    pub async fn list(
        pool: &PgPool,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<Batch>, sqlx::Error> {
        let limit = clamp_limit(limit, DEFAULT_PAGE_LIMIT, MAX_PAGE_LIMIT);
        let offset = clamp_offset(offset);

        let query = format!(
            "SELECT {COLUMNS} FROM batches \
             ORDER BY created_on DESC, id DESC \
             LIMIT $1 OFFSET $2"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Find the incomplete batch of `batch_type` for a host, if any.
    pub async fn find_incomplete_for_host(
        pool: &PgPool,
        batch_type: BatchType,
        host_name: &str,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM batches \
             WHERE batch_type = $1 \
               AND batch_params->>'host_name' = $2 \
               AND completed_on IS NULL \
             ORDER BY created_on ASC \
             LIMIT 1"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(batch_type.as_str())
            .bind(normalize_host(host_name))
            .fetch_optional(pool)
            .await
    }

    /// Append a fatal error to a batch. Returns `None` if the batch does
    /// not exist.
    pub async fn append_error(
        pool: &PgPool,
        id: DbId,
        message: &str,
    ) -> Result<Option<Batch>, sqlx::Error> {
        let query = format!(
            "UPDATE batches \
             SET errors = errors || jsonb_build_array( \
                 jsonb_build_object('occurred_on', NOW(), 'message', $2::TEXT)) \
             WHERE id = $1 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Batch>(&query)
            .bind(id)
            .bind(message)
            .fetch_optional(pool)
            .await
    }

    /// Mark a batch completed if none of its tasks is left unprocessed.
    ///
    /// Returns `true` only for the call that performed the transition.
    pub async fn complete_if_finished(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE batches SET completed_on = NOW() \
             WHERE id = $1 \
               AND completed_on IS NULL \
               AND NOT EXISTS ( \
                   SELECT 1 FROM tasks \
                   WHERE tasks.batch_id = batches.id AND NOT tasks.processed \
               )",
        )
        .bind(id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Complete every open batch whose tasks are all processed.
    ///
    /// Returns the number of batches transitioned.
    pub async fn complete_all_finished(pool: &PgPool) -> Result<u64, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE batches SET completed_on = NOW() \
             WHERE completed_on IS NULL \
               AND NOT EXISTS ( \
                   SELECT 1 FROM tasks \
                   WHERE tasks.batch_id = batches.id AND NOT tasks.processed \
               )",
        )
        .execute(pool)
        .await?;
        Ok(result.rows_affected())
    }
}
