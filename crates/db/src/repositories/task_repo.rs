//! Repository for the `tasks` table.

use std::collections::HashMap;

use docport_core::progress::TaskCounts;
use docport_core::types::{DbId, Timestamp};
use sqlx::types::Json;
use sqlx::PgPool;

use crate::models::task::{CreateTask, Task};

/// Column list for `tasks` queries.
const COLUMNS: &str = "id, batch_id, task_type, processed, attempts, task_params, created_at";

/// Provides CRUD and bookkeeping operations for tasks.
pub struct TaskRepo;

impl TaskRepo {
    /// Insert a task with no attempts inside an existing transaction.
    pub(crate) async fn insert_in_tx(
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        batch_id: DbId,
        input: &CreateTask,
    ) -> Result<Task, sqlx::Error> {
        let query = format!(
            "INSERT INTO tasks (batch_id, task_type, task_params) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(batch_id)
            .bind(input.task_type.as_str())
            .bind(Json(&input.task_params))
            .fetch_one(&mut **tx)
            .await
    }

    /// Find a task by its ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE id = $1");
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// List all tasks of a batch in creation order.
    pub async fn list_for_batch(pool: &PgPool, batch_id: DbId) -> Result<Vec<Task>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM tasks WHERE batch_id = $1 ORDER BY id ASC");
        sqlx::query_as::<_, Task>(&query)
            .bind(batch_id)
            .fetch_all(pool)
            .await
    }

    /// Append one processing attempt to an unprocessed task.
    ///
    /// The attempt is `{started_on, error}`. When `error` is `None` the
    /// task becomes processed in the same statement. A task that is
    /// already processed is left untouched and `None` is returned, so a
    /// task is marked processed exactly once.
    pub async fn record_attempt(
        pool: &PgPool,
        id: DbId,
        started_on: Timestamp,
        error: Option<&str>,
    ) -> Result<Option<Task>, sqlx::Error> {
        let query = format!(
            "UPDATE tasks \
             SET attempts = attempts || jsonb_build_array( \
                     jsonb_build_object('started_on', $2::TIMESTAMPTZ, 'error', $3::TEXT)), \
                 processed = ($3::TEXT IS NULL) \
             WHERE id = $1 AND NOT processed \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Task>(&query)
            .bind(id)
            .bind(started_on)
            .bind(error)
            .fetch_optional(pool)
            .await
    }

    /// Task counts of one batch, aggregated by `processed`.
    pub async fn count_by_processed(
        pool: &PgPool,
        batch_id: DbId,
    ) -> Result<TaskCounts, sqlx::Error> {
        let rows: Vec<(bool, i64)> = sqlx::query_as(
            "SELECT processed, COUNT(*) FROM tasks WHERE batch_id = $1 GROUP BY processed",
        )
        .bind(batch_id)
        .fetch_all(pool)
        .await?;

        Ok(rows
            .into_iter()
            .fold(TaskCounts::default(), |mut counts, (processed, n)| {
                counts.total += n;
                if processed {
                    counts.processed += n;
                }
                counts
            }))
    }

    /// Task counts for several batches in one aggregation.
    ///
    /// Batches without tasks are absent from the map.
    pub async fn counts_for_batches(
        pool: &PgPool,
        batch_ids: &[DbId],
    ) -> Result<HashMap<DbId, TaskCounts>, sqlx::Error> {
        if batch_ids.is_empty() {
            return Ok(HashMap::new());
        }

        let rows: Vec<(DbId, bool, i64)> = sqlx::query_as(
            "SELECT batch_id, processed, COUNT(*) FROM tasks \
             WHERE batch_id = ANY($1) \
             GROUP BY batch_id, processed",
        )
        .bind(batch_ids)
        .fetch_all(pool)
        .await?;

        let mut counts: HashMap<DbId, TaskCounts> = HashMap::new();
        for (batch_id, processed, n) in rows {
            let entry = counts.entry(batch_id).or_default();
            entry.total += n;
            if processed {
                entry.processed += n;
            }
        }
        Ok(counts)
    }
}
