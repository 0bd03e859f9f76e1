//! MCP server initialization for stdio and SSE transports.
//!
//! Provides [`serve_stdio`] and [`serve_sse`] entry points that select the storage
//! backend once and wire it into the MCP tool handler.

use crate::config::MemoryConfig;
use crate::db;
use crate::memory::store::MemoryStore;
use crate::tools::MemoryTools;
use anyhow::Result;
use rmcp::ServiceExt;
use std::sync::Arc;

/// Shared setup: pick the store for the lifetime of the process.
async fn setup_store(config: &MemoryConfig) -> Result<Arc<dyn MemoryStore>> {
    tracing::info!(
        database_url = %config.redacted_database_url(),
        auth_token = config.storage.auth_token.is_some(),
        "selecting storage backend"
    );
    let store = db::select_backend(&config.storage).await?;
    tracing::info!(mode = %store.mode(), "storage ready");
    Ok(store)
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MemoryConfig) -> Result<()> {
    tracing::info!("starting cursor10x MCP server on stdio");

    let store = setup_store(&config).await?;

    let tools = MemoryTools::new(store);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP (SSE) transport.
pub async fn serve_sse(config: MemoryConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting cursor10x MCP server on SSE/HTTP");

    let store = setup_store(&config).await?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(MemoryTools::new(store.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down SSE server");
        })
        .await?;

    Ok(())
}
