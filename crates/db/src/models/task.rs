//! Task entity models and DTOs.

use docport_core::batch::{TaskAttempt, TaskParams, TaskType};
use docport_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::types::Json;
use sqlx::FromRow;

/// A row from the `tasks` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Task {
    pub id: DbId,
    pub batch_id: DbId,
    pub task_type: String,
    pub processed: bool,
    pub attempts: Json<Vec<TaskAttempt>>,
    pub task_params: Json<TaskParams>,
    pub created_at: Timestamp,
}

/// DTO for inserting a task into a new batch.
#[derive(Debug, Clone)]
pub struct CreateTask {
    pub task_type: TaskType,
    pub task_params: TaskParams,
}
