//! Import orchestrator.
//!
//! Batch creation for a host is serialized twice over: by the per-host
//! import lock, and by the rule that a host has at most one incomplete
//! batch (backed by a partial unique index). Both conflicts surface as
//! [`CoreError::Conflict`] and are never retried here.

use std::collections::HashMap;
use std::time::Duration;

use docport_core::batch::{BatchParams, BatchType, TaskParams, TaskType};
use docport_core::error::CoreError;
use docport_core::import::{
    merge_importable, normalize_host, DocumentToImport, ImportSource, ImportableDocument,
};
use docport_core::locks::LockFamily;
use docport_core::progress::{batch_progress, TaskCounts};
use docport_core::types::DbId;
use docport_db::models::batch::{Batch, CreateBatch};
use docport_db::models::task::{CreateTask, Task};
use docport_db::repositories::{BatchRepo, ImportedDocumentRepo, LockError, LockRepo, TaskRepo};
use docport_exports::ExportsApiError;
use serde::Serialize;
use sqlx::PgPool;
use validator::Validate;

use crate::source::ExportSource;

/// Errors from import orchestration.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
    /// Validation, conflict, and not-found outcomes.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// The export source could not be listed.
    #[error("Export source error: {0}")]
    Source(#[from] ExportsApiError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<LockError> for ImportError {
    fn from(err: LockError) -> Self {
        match err {
            LockError::AlreadyTaken { lock_key, .. } => ImportError::Core(CoreError::Conflict(
                format!("An import from '{lock_key}' is already in progress"),
            )),
            LockError::Database(e) => ImportError::Database(e),
        }
    }
}

/// Input of [`ImportOrchestrator::create_import_batch`].
#[derive(Debug, Clone)]
pub struct CreateImportBatch {
    pub source: ImportSource,
    pub documents: Vec<DocumentToImport>,
    pub created_by: DbId,
}

/// A batch with its computed progress, as listed.
#[derive(Debug, Clone, Serialize)]
pub struct BatchWithProgress {
    #[serde(flatten)]
    pub batch: Batch,
    pub progress: f64,
    pub processed_tasks: i64,
    pub total_tasks: i64,
}

/// A batch with its tasks and computed progress.
#[derive(Debug, Clone, Serialize)]
pub struct BatchDetails {
    #[serde(flatten)]
    pub batch: Batch,
    pub progress: f64,
    pub tasks: Vec<Task>,
}

impl BatchWithProgress {
    fn new(batch: Batch, counts: TaskCounts) -> Self {
        Self {
            progress: batch_progress(batch.completed_on, counts),
            processed_tasks: counts.processed,
            total_tasks: counts.total,
            batch,
        }
    }
}

impl BatchDetails {
    fn new(batch: Batch, tasks: Vec<Task>) -> Self {
        let counts = TaskCounts {
            processed: tasks.iter().filter(|t| t.processed).count() as i64,
            total: tasks.len() as i64,
        };
        Self {
            progress: batch_progress(batch.completed_on, counts),
            batch,
            tasks,
        }
    }
}

/// Coordinates importing documents from external hosts.
pub struct ImportOrchestrator<S> {
    pool: PgPool,
    source: S,
    lock_ttl: Option<Duration>,
}

impl<S: ExportSource> ImportOrchestrator<S> {
    /// Orchestrator using the import family's default lock TTL.
    pub fn new(pool: PgPool, source: S) -> Self {
        Self {
            pool,
            source,
            lock_ttl: LockFamily::Import.default_ttl(),
        }
    }

    pub fn with_lock_ttl(mut self, lock_ttl: Option<Duration>) -> Self {
        self.lock_ttl = lock_ttl;
        self
    }

    // -----------------------------------------------------------------------
    // Importable documents
    // -----------------------------------------------------------------------

    /// Every document the source offers, classified against what was
    /// already imported from the same host.
    pub async fn importable_documents(
        &self,
        source: &ImportSource,
    ) -> Result<Vec<ImportableDocument>, ImportError> {
        validate_source(source)?;

        let exported = self.source.list_exports(source).await?;
        let imported =
            ImportedDocumentRepo::list_revisions_for_origin(&self.pool, &source.origin_tag())
                .await?;

        let merged = merge_importable(&exported, &imported);
        tracing::debug!(
            host_name = %source.host_name,
            offered = exported.len(),
            imported = imported.len(),
            importable = merged.len(),
            "Computed importable documents",
        );
        Ok(merged)
    }

    // -----------------------------------------------------------------------
    // Batch creation
    // -----------------------------------------------------------------------

    /// Create a batch with one task per selected document.
    ///
    /// Holds the per-host import lock for the duration of the check and the
    /// insert. The lock is released whether or not creation succeeds.
    pub async fn create_import_batch(
        &self,
        input: &CreateImportBatch,
    ) -> Result<BatchDetails, ImportError> {
        validate_source(&input.source)?;
        if input.documents.is_empty() {
            return Err(CoreError::Validation("No documents selected for import".into()).into());
        }
        for doc in &input.documents {
            doc.validate()
                .map_err(|e| CoreError::Validation(format!("Document '{}': {e}", doc.key)))?;
        }

        let host = normalize_host(&input.source.host_name);
        let lock = LockRepo::take(&self.pool, LockFamily::Import, &host, self.lock_ttl).await?;

        let result = self.create_batch_locked(input, &host).await;

        if let Err(e) = LockRepo::release(&self.pool, &lock).await {
            tracing::error!(host_name = %host, error = %e, "Failed to release import lock");
        }

        result
    }

    async fn create_batch_locked(
        &self,
        input: &CreateImportBatch,
        host: &str,
    ) -> Result<BatchDetails, ImportError> {
        if let Some(existing) =
            BatchRepo::find_incomplete_for_host(&self.pool, BatchType::DocumentImport, host)
                .await?
        {
            return Err(CoreError::Conflict(format!(
                "Import batch {} for '{host}' is still in progress",
                existing.id
            ))
            .into());
        }

        let batch_input = CreateBatch {
            created_by: input.created_by,
            batch_type: BatchType::DocumentImport,
            batch_params: BatchParams::from(&input.source),
        };
        // Local revisions are read under the host lock, so the import type
        // reflects what is stored now rather than the caller's listing.
        let imported: HashMap<String, String> = ImportedDocumentRepo::list_revisions_for_origin(
            &self.pool,
            &input.source.origin_tag(),
        )
        .await?
        .into_iter()
        .map(|doc| (doc.key, doc.revision))
        .collect();

        let tasks: Vec<CreateTask> = input
            .documents
            .iter()
            .map(|doc| CreateTask {
                task_type: TaskType::DocumentImport,
                task_params: TaskParams::for_document(
                    doc,
                    imported.get(&doc.key).map(String::as_str),
                ),
            })
            .collect();

        let (batch, tasks) = BatchRepo::create_with_tasks(&self.pool, &batch_input, &tasks)
            .await
            .map_err(|e| {
                if docport_db::is_unique_violation(&e) {
                    ImportError::Core(CoreError::Conflict(format!(
                        "An import batch for '{host}' is already in progress"
                    )))
                } else {
                    ImportError::Database(e)
                }
            })?;

        tracing::info!(
            batch_id = batch.id,
            host_name = %host,
            task_count = tasks.len(),
            created_by = input.created_by,
            "Import batch created",
        );

        Ok(BatchDetails::new(batch, tasks))
    }

    // -----------------------------------------------------------------------
    // Reading batches
    // -----------------------------------------------------------------------

    /// Batches newest first, each with its progress.
    pub async fn list_import_batches(
        &self,
        limit: Option<i64>,
        offset: Option<i64>,
    ) -> Result<Vec<BatchWithProgress>, ImportError> {
        let batches = BatchRepo::list(&self.pool, limit, offset).await?;
        let ids: Vec<DbId> = batches.iter().map(|b| b.id).collect();
        let mut counts = TaskRepo::counts_for_batches(&self.pool, &ids).await?;

        Ok(batches
            .into_iter()
            .map(|batch| {
                let batch_counts = counts.remove(&batch.id).unwrap_or_default();
                BatchWithProgress::new(batch, batch_counts)
            })
            .collect())
    }

    /// One batch with its tasks and progress.
    pub async fn import_batch_details(&self, batch_id: DbId) -> Result<BatchDetails, ImportError> {
        let batch = BatchRepo::find_by_id(&self.pool, batch_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Batch",
                id: batch_id,
            })?;
        let tasks = TaskRepo::list_for_batch(&self.pool, batch_id).await?;
        Ok(BatchDetails::new(batch, tasks))
    }

    /// Progress of one batch, from the grouped task aggregation.
    pub async fn batch_progress(&self, batch_id: DbId) -> Result<f64, ImportError> {
        let batch = BatchRepo::find_by_id(&self.pool, batch_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "Batch",
                id: batch_id,
            })?;
        let counts = TaskRepo::count_by_processed(&self.pool, batch_id).await?;
        Ok(batch_progress(batch.completed_on, counts))
    }
}

fn validate_source(source: &ImportSource) -> Result<(), CoreError> {
    source
        .validate()
        .map_err(|e| CoreError::Validation(e.to_string()))?;
    if normalize_host(&source.host_name).is_empty() {
        return Err(CoreError::Validation("Host name must not be empty".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use docport_core::batch::TaskAttempt;
    use sqlx::types::Json;

    fn batch(completed: bool) -> Batch {
        Batch {
            id: 1,
            created_by: 1,
            created_on: Utc::now(),
            completed_on: completed.then(Utc::now),
            batch_type: "document-import".into(),
            batch_params: Json(BatchParams {
                name: "Docs".into(),
                host_name: "docs.example.com".into(),
                secure: true,
            }),
            errors: Json(vec![]),
        }
    }

    fn task(id: DbId, processed: bool) -> Task {
        Task {
            id,
            batch_id: 1,
            task_type: "document-import".into(),
            processed,
            attempts: Json(Vec::<TaskAttempt>::new()),
            task_params: Json(TaskParams {
                document_key: format!("k{id}"),
                source_revision: "r1".into(),
                target_revision: None,
                import_type: docport_core::import::ImportType::Add,
            }),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn details_progress_counts_processed_tasks() {
        let details = BatchDetails::new(batch(false), vec![task(1, true), task(2, false)]);
        assert_eq!(details.progress, 0.5);
    }

    #[test]
    fn details_of_completed_batch_are_done() {
        let details = BatchDetails::new(batch(true), vec![task(1, false)]);
        assert_eq!(details.progress, 1.0);
    }

    #[test]
    fn batch_fields_are_flattened_when_serialized() {
        let listed = BatchWithProgress::new(
            batch(false),
            TaskCounts {
                processed: 1,
                total: 4,
            },
        );
        let json = serde_json::to_value(&listed).unwrap();
        assert_eq!(json["id"], 1);
        assert_eq!(json["batch_params"]["host_name"], "docs.example.com");
        assert_eq!(json["progress"], 0.25);
        assert_eq!(json["total_tasks"], 4);
    }

    #[test]
    fn lock_conflict_becomes_core_conflict() {
        let err = ImportError::from(LockError::AlreadyTaken {
            family: LockFamily::Import,
            lock_key: "docs.example.com".into(),
        });
        assert!(matches!(err, ImportError::Core(CoreError::Conflict(_))));
    }

    #[test]
    fn blank_host_is_rejected() {
        let source = ImportSource {
            name: "Docs".into(),
            host_name: "   ".into(),
            secure: true,
            api_key: String::new(),
        };
        assert!(matches!(
            validate_source(&source),
            Err(CoreError::Validation(_))
        ));
    }
}
