//! Handlers for importing documents from external hosts.
//!
//! Thin wrappers over [`ImportOrchestrator`](docport_pipeline::import::ImportOrchestrator):
//! listing what a source offers, creating a batch, and reading batches
//! back with their progress.

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use docport_core::import::{DocumentToImport, ImportSource, ImportableDocument};
use docport_core::types::DbId;
use docport_pipeline::import::{BatchDetails, BatchWithProgress, CreateImportBatch};
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::acting_user::ActingUser;
use crate::query::PaginationParams;
use crate::response::DataResponse;
use crate::state::AppState;

/// Request body for creating an import batch.
#[derive(Debug, Deserialize)]
pub struct CreateImportBatchRequest {
    pub import_source: ImportSource,
    pub documents: Vec<DocumentToImport>,
}

/// POST /api/v1/imports/importable
///
/// List every document the source offers, classified as add, update, or
/// reimport against what was already imported from the same host.
pub async fn list_importable(
    State(state): State<AppState>,
    payload: Result<Json<ImportSource>, JsonRejection>,
) -> AppResult<Json<DataResponse<Vec<ImportableDocument>>>> {
    let Json(source) = payload?;
    let documents = state.imports.importable_documents(&source).await?;
    Ok(Json(DataResponse { data: documents }))
}

/// POST /api/v1/imports/batches
///
/// Create a batch with one task per selected document. Returns 409 while
/// another import for the same host is running or unfinished.
pub async fn create_batch(
    State(state): State<AppState>,
    user: ActingUser,
    payload: Result<Json<CreateImportBatchRequest>, JsonRejection>,
) -> AppResult<(StatusCode, Json<DataResponse<BatchDetails>>)> {
    let Json(body) = payload?;
    let input = CreateImportBatch {
        source: body.import_source,
        documents: body.documents,
        created_by: user.user_id,
    };
    let created = state.imports.create_import_batch(&input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: created })))
}

/// GET /api/v1/imports/batches
pub async fn list_batches(
    State(state): State<AppState>,
    query: Result<Query<PaginationParams>, QueryRejection>,
) -> AppResult<Json<DataResponse<Vec<BatchWithProgress>>>> {
    let Query(params) = query?;
    let batches = state
        .imports
        .list_import_batches(params.limit, params.offset)
        .await?;
    Ok(Json(DataResponse { data: batches }))
}

/// GET /api/v1/imports/batches/{id}
pub async fn get_batch(
    State(state): State<AppState>,
    path: Result<Path<DbId>, PathRejection>,
) -> AppResult<Json<DataResponse<BatchDetails>>> {
    let Path(id) = path?;
    let details = state.imports.import_batch_details(id).await?;
    Ok(Json(DataResponse { data: details }))
}
