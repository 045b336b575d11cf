//! HTTP-level integration tests for the `/imports` endpoints.

mod common;

use axum::body::Body;
use axum::http::{HeaderMap, Method, Request, StatusCode};
use axum::routing::get as get_route;
use axum::{Json, Router};
use common::{body_json, build_test_app, get, post_json, post_json_as, TEST_USER_ID};
use docport_db::models::imported_document::RecordImportedDocument;
use docport_db::repositories::{ImportedDocumentRepo, TaskRepo};
use serde_json::{json, Value};
use sqlx::PgPool;
use tower::ServiceExt;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn batch_body(host: &str, keys: &[&str]) -> Value {
    let documents: Vec<Value> = keys
        .iter()
        .map(|k| json!({ "key": k, "importable_revision": "r1" }))
        .collect();
    json!({
        "import_source": { "name": "Docs", "host_name": host, "secure": true },
        "documents": documents,
    })
}

/// Serve a fake export source offering two documents; returns `host:port`.
async fn spawn_source() -> String {
    async fn exports(headers: HeaderMap) -> Result<Json<Value>, StatusCode> {
        if headers.get("x-api-key").and_then(|v| v.to_str().ok()) != Some("test-key") {
            return Err(StatusCode::UNAUTHORIZED);
        }
        Ok(Json(json!([
            {
                "key": "k1", "revision": "r2", "updatedOn": "2024-05-01T10:00:00Z",
                "title": "Getting started", "slug": "getting-started", "language": "en"
            },
            {
                "key": "k2", "revision": "r1", "updatedOn": "2024-05-02T10:00:00Z",
                "title": "FAQ", "slug": "faq", "language": "en"
            }
        ])))
    }

    let app = Router::new().route("/api/exports", get_route(exports));
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr.to_string()
}

// ---------------------------------------------------------------------------
// Importable documents
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_importable_documents_are_classified(pool: PgPool) {
    let host = spawn_source().await;
    ImportedDocumentRepo::record_import(
        &pool,
        &RecordImportedDocument {
            origin: format!("import:{host}"),
            source_key: "k1".into(),
            revision: "r1".into(),
            title: "Getting started".into(),
            slug: "getting-started".into(),
            language: "en".into(),
        },
    )
    .await
    .unwrap();

    let app = build_test_app(pool);
    let response = post_json(
        app,
        "/api/v1/imports/importable",
        json!({ "name": "Local", "host_name": host, "secure": false, "api_key": "test-key" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let json = body_json(response).await;
    let docs = json["data"].as_array().unwrap();
    assert_eq!(docs.len(), 2);
    assert_eq!(docs[0]["key"], "k1");
    assert_eq!(docs[0]["import_type"], "update");
    assert_eq!(docs[0]["imported_revision"], "r1");
    assert_eq!(docs[1]["import_type"], "add");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_importable_documents_upstream_failure_is_502(pool: PgPool) {
    let host = spawn_source().await;
    let app = build_test_app(pool);

    let response = post_json(
        app,
        "/api/v1/imports/importable",
        json!({ "name": "Local", "host_name": host, "secure": false, "api_key": "wrong" }),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(body_json(response).await["code"], "UPSTREAM_ERROR");
}

// ---------------------------------------------------------------------------
// Batch creation
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_batch_returns_201(pool: PgPool) {
    let app = build_test_app(pool.clone());
    let response = post_json(
        app,
        "/api/v1/imports/batches",
        batch_body("docs.example.com", &["k1", "k2"]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let json = body_json(response).await;
    let data = &json["data"];
    assert_eq!(data["created_by"], TEST_USER_ID);
    assert_eq!(data["batch_params"]["host_name"], "docs.example.com");
    assert_eq!(data["progress"], 0.0);
    assert_eq!(data["tasks"].as_array().unwrap().len(), 2);

    let batch_id = data["id"].as_i64().unwrap();
    assert_eq!(TaskRepo::list_for_batch(&pool, batch_id).await.unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_second_batch_for_host_conflicts(pool: PgPool) {
    let first = post_json(
        build_test_app(pool.clone()),
        "/api/v1/imports/batches",
        batch_body("docs.example.com", &["k1"]),
    )
    .await;
    assert_eq!(first.status(), StatusCode::CREATED);

    let second = post_json(
        build_test_app(pool),
        "/api/v1/imports/batches",
        batch_body("docs.example.com", &["k2"]),
    )
    .await;
    assert_eq!(second.status(), StatusCode::CONFLICT);

    let json = body_json(second).await;
    assert_eq!(json["code"], "CONFLICT");
    assert!(json["error"].as_str().unwrap().contains("in progress"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_batch_without_user_is_401(pool: PgPool) {
    let response = post_json_as(
        build_test_app(pool.clone()),
        "/api/v1/imports/batches",
        batch_body("docs.example.com", &["k1"]),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = post_json_as(
        build_test_app(pool),
        "/api/v1/imports/batches",
        batch_body("docs.example.com", &["k1"]),
        Some("not-a-number"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_batch_with_no_documents_is_400(pool: PgPool) {
    let response = post_json(
        build_test_app(pool),
        "/api/v1/imports/batches",
        batch_body("docs.example.com", &[]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_malformed_json_is_400_with_error_body(pool: PgPool) {
    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/imports/batches")
        .header("content-type", "application/json")
        .header("x-user-id", TEST_USER_ID.to_string())
        .body(Body::from("{\"import_source\": "))
        .unwrap();

    let response = build_test_app(pool).oneshot(request).await.unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let json = body_json(response).await;
    assert_eq!(json["code"], "BAD_REQUEST");
    assert!(json["error"].is_string());
}

// ---------------------------------------------------------------------------
// Reading batches
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_and_get_batches(pool: PgPool) {
    let created = body_json(
        post_json(
            build_test_app(pool.clone()),
            "/api/v1/imports/batches",
            batch_body("docs.example.com", &["k1", "k2"]),
        )
        .await,
    )
    .await;
    let batch_id = created["data"]["id"].as_i64().unwrap();
    let first_task = created["data"]["tasks"][0]["id"].as_i64().unwrap();
    TaskRepo::record_attempt(&pool, first_task, chrono::Utc::now(), None)
        .await
        .unwrap();

    let response = get(build_test_app(pool.clone()), "/api/v1/imports/batches?limit=10").await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    let batches = listed["data"].as_array().unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0]["progress"], 0.5);
    assert_eq!(batches[0]["total_tasks"], 2);

    let response = get(
        build_test_app(pool),
        &format!("/api/v1/imports/batches/{batch_id}"),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let details = body_json(response).await;
    assert_eq!(details["data"]["progress"], 0.5);
    assert_eq!(details["data"]["tasks"].as_array().unwrap().len(), 2);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_non_numeric_batch_id_is_400(pool: PgPool) {
    let response = get(build_test_app(pool), "/api/v1/imports/batches/latest").await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["code"], "BAD_REQUEST");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_get_missing_batch_is_404(pool: PgPool) {
    let response = get(build_test_app(pool), "/api/v1/imports/batches/999999").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["code"], "NOT_FOUND");
}
