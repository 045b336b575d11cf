#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request};
use axum::response::Response;
use axum::Router;
use docport_api::config::ServerConfig;
use docport_api::middleware::acting_user::USER_ID_HEADER;
use docport_api::router::build_app_router;
use docport_api::state::AppState;
use docport_exports::ExportsApi;
use docport_pipeline::import::ImportOrchestrator;
use http_body_util::BodyExt;
use sqlx::PgPool;
use tower::ServiceExt;

/// User id sent with mutating requests.
pub const TEST_USER_ID: i64 = 7;

/// Build a test `ServerConfig` with safe defaults.
///
/// Uses `http://localhost:5173` as CORS origin (matching the dev default)
/// and a 30-second request timeout.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        database_url: String::new(),
        maintenance_retry_secs: 1,
        maintenance_retry_max_secs: 1,
        maintenance_lock_ttl_secs: 60,
        import_lock_ttl_secs: 60,
        lock_reaper_interval_secs: 60,
        exports_schema_version: 1,
        exports_timeout_secs: 5,
    }
}

/// Build the full application router on top of `pool`, through the same
/// `build_app_router` the binary uses.
pub fn build_test_app(pool: PgPool) -> Router {
    let config = test_config();
    let exports = ExportsApi::new(config.exports_schema_version, config.exports_timeout())
        .expect("export client");
    let imports =
        ImportOrchestrator::new(pool.clone(), exports).with_lock_ttl(config.import_lock_ttl());

    let state = AppState {
        pool,
        imports: Arc::new(imports),
    };
    build_app_router(state, &config)
}

/// Collect a response body and parse it as JSON.
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

/// Send a GET request.
pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::GET)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Send a JSON POST request on behalf of [`TEST_USER_ID`].
pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    post_json_as(app, uri, body, Some(&TEST_USER_ID.to_string())).await
}

/// Send a JSON POST request with an explicit `X-User-Id` value (or none).
pub async fn post_json_as(
    app: Router,
    uri: &str,
    body: serde_json::Value,
    user_id: Option<&str>,
) -> Response {
    let mut builder = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(id) = user_id {
        builder = builder.header(USER_ID_HEADER, id);
    }
    let request = builder
        .body(Body::from(serde_json::to_vec(&body).unwrap()))
        .unwrap();
    app.oneshot(request).await.unwrap()
}

/// Poll until `f` returns true or the deadline passes.
pub async fn eventually<F, Fut>(mut f: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: std::future::Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while tokio::time::Instant::now() < deadline {
        if f().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    false
}
