pub mod health;
pub mod imports;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /imports/importable                  importable documents for a source (POST)
/// /imports/batches                     create (POST), list with progress (GET)
/// /imports/batches/{id}                batch with tasks and progress
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new().nest("/imports", imports::router())
}
