use std::sync::Arc;

use docport_exports::ExportsApi;
use docport_pipeline::import::ImportOrchestrator;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// Cheaply cloneable: the pool is reference counted and everything else
/// sits behind an `Arc`.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: docport_db::DbPool,
    /// Import orchestrator talking to real export endpoints.
    pub imports: Arc<ImportOrchestrator<ExportsApi>>,
}
