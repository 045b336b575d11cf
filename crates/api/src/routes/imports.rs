//! Route definitions for document imports.
//!
//! Mounted at `/imports`.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::imports;
use crate::state::AppState;

/// Routes mounted at `/imports`.
///
/// ```text
/// POST   /importable       -> list_importable
/// POST   /batches          -> create_batch
/// GET    /batches          -> list_batches
/// GET    /batches/{id}     -> get_batch
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/importable", post(imports::list_importable))
        .route(
            "/batches",
            post(imports::create_batch).get(imports::list_batches),
        )
        .route("/batches/{id}", get(imports::get_batch))
}
