//! Attempt bookkeeping for document-import tasks.
//!
//! The loop that picks tasks and the code that actually creates documents
//! live elsewhere. [`run_task_attempt`] is what they call per task: it
//! records the attempt, marks the task processed on success, and completes
//! the batch once its last task is processed. Failures are recorded and
//! returned as an outcome; they never fail the batch. Whether a failed task
//! is tried again is the caller's policy.

use docport_core::batch::{BatchParams, BatchType, TaskParams, TaskType};
use docport_core::error::CoreError;
use docport_core::types::DbId;
use docport_db::repositories::{BatchRepo, TaskRepo};
use sqlx::PgPool;

use crate::import::ImportError;

/// Creates or updates the local document for one task.
pub trait DocumentImporter: Send + Sync {
    type Error: std::fmt::Display + Send;

    fn import_document(
        &self,
        source: &BatchParams,
        params: &TaskParams,
    ) -> impl std::future::Future<Output = Result<(), Self::Error>> + Send;
}

/// What happened to a task on this attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskOutcome {
    /// The import succeeded and the task is now processed.
    Succeeded {
        /// Whether this was the batch's last open task.
        batch_completed: bool,
    },
    /// The import failed; the attempt and its error were recorded.
    Failed { error: String },
    /// The task was already processed; nothing was attempted.
    AlreadyProcessed,
}

/// Run one attempt of a task and record its outcome.
pub async fn run_task_attempt<I: DocumentImporter>(
    pool: &PgPool,
    importer: &I,
    task_id: DbId,
) -> Result<TaskOutcome, ImportError> {
    let task = TaskRepo::find_by_id(pool, task_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Task",
            id: task_id,
        })?;
    if task.processed {
        return Ok(TaskOutcome::AlreadyProcessed);
    }

    let batch = BatchRepo::find_by_id(pool, task.batch_id)
        .await?
        .ok_or(CoreError::NotFound {
            entity: "Batch",
            id: task.batch_id,
        })?;

    // Only document imports exist today; anything else in storage is corrupt
    // and must not be recorded as an attempt.
    match (
        BatchType::from_str(&batch.batch_type),
        TaskType::from_str(&task.task_type),
    ) {
        (Ok(BatchType::DocumentImport), Ok(TaskType::DocumentImport)) => {}
        (Err(e), _) | (_, Err(e)) => {
            return Err(CoreError::Internal(format!("Task {}: {e}", task.id)).into());
        }
    }

    let started_on = chrono::Utc::now();
    let error = importer
        .import_document(&batch.batch_params.0, &task.task_params.0)
        .await
        .err()
        .map(|e| e.to_string());

    let recorded = TaskRepo::record_attempt(pool, task.id, started_on, error.as_deref()).await?;
    if recorded.is_none() {
        // Another worker finished the task while we were importing.
        return Ok(TaskOutcome::AlreadyProcessed);
    }

    match error {
        Some(error) => {
            tracing::warn!(
                task_id = task.id,
                batch_id = batch.id,
                document_key = %task.task_params.document_key,
                import_type = task.task_params.import_type.as_str(),
                error = %error,
                "Task attempt failed"
            );
            Ok(TaskOutcome::Failed { error })
        }
        None => {
            let batch_completed = BatchRepo::complete_if_finished(pool, batch.id).await?;
            tracing::info!(
                task_id = task.id,
                batch_id = batch.id,
                import_type = task.task_params.import_type.as_str(),
                batch_completed,
                "Task processed"
            );
            Ok(TaskOutcome::Succeeded { batch_completed })
        }
    }
}
