//! Liveness endpoint, mounted at the root rather than under `/api/v1`.

use axum::extract::State;
use axum::{routing::get, Json, Router};
use docport_core::locks::{LockFamily, MAINTENANCE_LOCK_KEY};
use docport_db::repositories::LockRepo;
use serde::Serialize;

use crate::state::AppState;

#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, `maintenance` or `degraded`.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// True while some instance holds the schema maintenance lock.
    pub maintenance_in_progress: bool,
}

impl HealthResponse {
    fn new(db_healthy: bool, maintenance_in_progress: bool) -> Self {
        let status = match (db_healthy, maintenance_in_progress) {
            (false, _) => "degraded",
            (true, true) => "maintenance",
            (true, false) => "ok",
        };
        Self {
            status,
            version: env!("CARGO_PKG_VERSION"),
            db_healthy,
            maintenance_in_progress,
        }
    }
}

/// GET /health
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = docport_db::health_check(&state.pool).await.is_ok();

    let maintenance_in_progress = if db_healthy {
        match LockRepo::find(&state.pool, LockFamily::Maintenance, MAINTENANCE_LOCK_KEY).await {
            Ok(lock) => lock.is_some(),
            Err(e) => {
                tracing::warn!(error = %e, "Could not read maintenance lock");
                false
            }
        }
    } else {
        false
    };

    Json(HealthResponse::new(db_healthy, maintenance_in_progress))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
