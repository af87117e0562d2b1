/// Server setup and initialization
///
/// Wires together the workflow storage, registry and HTTP routes, and
/// provides the application factory used by `main` and the integration tests.

use crate::{
    api::workflows::{create_workflow_routes, AppState},
    config::Config,
    workflow::{registry::WorkflowRegistry, storage::WorkflowStorage},
};
use anyhow::{Context, Result};
use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::EnvFilter;

/// Create the main Axum application with all routes and middleware
///
/// Ensures the workflows directory exists and loads every workflow found in
/// it. A broken workflow is logged and skipped; it never stops startup.
pub fn create_app(config: &Config) -> Result<Router> {
    tracing::info!("📁 Using workflows directory: {}", config.registry.workflows_dir);
    let storage = WorkflowStorage::new(&config.registry.workflows_dir);

    tracing::info!("📊 Initializing workflow registry");
    let registry = Arc::new(WorkflowRegistry::new(storage));
    registry
        .init_from_storage()
        .context("Failed to load workflows from storage")?;

    let app = build_router(registry, &config.server.api_prefix);

    tracing::info!("✅ Application initialized successfully");

    Ok(app)
}

/// Build the HTTP router around an already initialized registry
///
/// Routes are mounted under `api_prefix`; `/health` is also served at the
/// root for liveness probes.
pub fn build_router(registry: Arc<WorkflowRegistry>, api_prefix: &str) -> Router {
    let api = Router::new()
        .route("/health", get(health_check))
        .merge(create_workflow_routes())
        .with_state(AppState { registry });

    let router = Router::new().route("/health", get(health_check));
    let router = if api_prefix.is_empty() {
        router.merge(api)
    } else {
        router.nest(api_prefix, api)
    };

    router
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Start the HTTP server with the given configuration
///
/// Creates the application and serves it on the configured address until
/// Ctrl-C is received.
pub async fn start_server(config: Config) -> Result<()> {
    // RUST_LOG wins over the configured level
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(true)
        .with_level(true)
        .init();

    tracing::info!("Starting {} server...", config.server.project_name);

    let app = create_app(&config)?;

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;

    tracing::info!("Server listening on http://{}{}", bind_addr, config.server.api_prefix);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Health check endpoint handler
async fn health_check() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("❌ Failed to listen for shutdown signal: {}", e);
    }
}
