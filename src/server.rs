//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! retriever and MCP tool handler into a running server.

use anyhow::{Context, Result};
use rmcp::ServiceExt;
use std::sync::Arc;

use crate::tools::FindingsTools;
use findings::config::FindingsConfig;
use findings::retrieval::Retriever;

/// Shared setup: build the index client and the (lazy) embedder.
fn setup_shared_state(config: &FindingsConfig) -> Result<Arc<Retriever>> {
    let retriever = Retriever::from_config(config).context("failed to set up retriever")?;
    tracing::info!(
        index = %config.index.index_name,
        namespace = %config.index.namespace,
        model = %config.embedding.model,
        "retriever ready (embedding model loads on first query)"
    );
    Ok(Arc::new(retriever))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: FindingsConfig) -> Result<()> {
    tracing::info!("starting findings MCP server on stdio");

    let retriever = setup_shared_state(&config)?;

    let tools = FindingsTools::new(retriever);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running — waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: FindingsConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting findings MCP server on HTTP");

    let retriever = setup_shared_state(&config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || Ok(FindingsTools::new(retriever.clone())),
        rmcp::transport::streamable_http_server::session::local::LocalSessionManager::default()
            .into(),
        Default::default(),
    );

    let router = axum::Router::new().nest_service("/mcp", service);

    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {bind_addr}"))?;
    tracing::info!(addr = %bind_addr, "MCP server listening at http://{bind_addr}/mcp");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
