/// Flowdock: HTTP host for pluggable Lua workflows
///
/// Main entry point for the Flowdock server. Initializes configuration and starts
/// the HTTP server with workflow management and execution capabilities.

use flowdock::{config::Config, server::start_server};

/// Application entry point
///
/// Reads configuration from FLOWDOCK_* environment variables and starts serving:
/// - Workflow management API at {prefix}/workflows/*
/// - Workflow execution at {prefix}/workflows/execute
/// - Health check at /health and {prefix}/health
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::default();

    start_server(config).await?;

    Ok(())
}
