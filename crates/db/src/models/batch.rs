//! Batch entity models and DTOs.

use docport_core::batch::{BatchError, BatchParams, BatchType};
use docport_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `batches` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Batch {
    pub id: DbId,
    pub created_by: DbId,
    pub created_on: Timestamp,
    pub completed_on: Option<Timestamp>,
    pub batch_type: String,
    pub batch_params: Json<BatchParams>,
    pub errors: Json<Vec<BatchError>>,
}

/// DTO for inserting a batch.
#[derive(Debug, Clone)]
pub struct CreateBatch {
    pub created_by: DbId,
    pub batch_type: BatchType,
    pub batch_params: BatchParams,
}
