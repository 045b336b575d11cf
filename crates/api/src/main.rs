use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use docport_api::background;
use docport_api::config::ServerConfig;
use docport_api::router::build_app_router;
use docport_api::state::AppState;
use docport_db::repositories::LockRepo;
use docport_exports::ExportsApi;
use docport_pipeline::import::ImportOrchestrator;
use docport_pipeline::maintenance::MaintenanceCoordinator;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    // --- Tracing ---
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "docport_api=debug,docport_pipeline=debug,tower_http=debug".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // --- Configuration ---
    let config = ServerConfig::from_env().expect("Invalid server configuration");
    tracing::info!(host = %config.host, port = %config.port, "Loaded server configuration");

    // --- Database ---
    let pool = docport_db::create_pool(&config.database_url)
        .await
        .expect("Failed to connect to database");
    tracing::info!("Database connection pool created");

    docport_db::health_check(&pool)
        .await
        .expect("Database health check failed");
    tracing::info!("Database health check passed");

    // The maintenance lock lives in `locks`, so the table must exist
    // before migrations can be serialized through it.
    LockRepo::ensure_table(&pool)
        .await
        .expect("Failed to create locks table");

    // --- Startup maintenance (migrations + consistency checks) ---
    let report = MaintenanceCoordinator::new(pool.clone())
        .with_lock_ttl(config.maintenance_lock_ttl())
        .with_backoff(config.maintenance_backoff())
        .run()
        .await
        .expect("Startup maintenance failed");
    tracing::info!(attempts = report.attempts, "Startup maintenance complete");

    // --- Import orchestrator ---
    let exports = ExportsApi::new(config.exports_schema_version, config.exports_timeout())
        .expect("Failed to build export API client");
    let imports = ImportOrchestrator::new(pool.clone(), exports)
        .with_lock_ttl(config.import_lock_ttl());

    // --- Background tasks ---
    let reaper_cancel = CancellationToken::new();
    let reaper_handle = tokio::spawn(background::lock_reaper::run(
        pool.clone(),
        config.lock_reaper_interval(),
        reaper_cancel.clone(),
    ));

    // --- App state ---
    let state = AppState {
        pool,
        imports: Arc::new(imports),
    };

    let app = build_app_router(state, &config);

    // --- Start server ---
    let addr = SocketAddr::new(
        config.host.parse().expect("Invalid HOST address"),
        config.port,
    );
    tracing::info!(%addr, "Starting server");

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");

    // --- Post-shutdown cleanup ---
    tracing::info!("Server stopped accepting connections, cleaning up");

    reaper_cancel.cancel();
    let _ = tokio::time::timeout(Duration::from_secs(5), reaper_handle).await;
    tracing::info!("Lock reaper stopped");

    tracing::info!("Graceful shutdown complete");
}

/// Wait for a termination signal to initiate graceful shutdown.
///
/// Handles both SIGINT (Ctrl-C) and SIGTERM (on Unix).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl-C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received SIGINT (Ctrl-C), starting graceful shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, starting graceful shutdown");
        }
    }
}
