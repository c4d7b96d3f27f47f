//! MCP server initialization for stdio and Streamable HTTP transports.
//!
//! Provides [`serve_stdio`] and [`serve_http`] entry points that wire up the
//! database, model providers, and MCP tool handler into a running server.

use crate::tools::MemoirTools;
use anyhow::Result;
use memoir::config::MemoirConfig;
use memoir::db;
use memoir::journal::insights::InsightsOptions;
use memoir::journal::reflect::{ReflectOptions, Resolver};
use memoir::models::ModelProvider;
use rmcp::ServiceExt;
use std::sync::{Arc, Mutex};

/// Shared setup: validate options, open DB, load models, record the embedding model.
fn setup_shared_state(
    config: MemoirConfig,
) -> Result<(
    Arc<Mutex<rusqlite::Connection>>,
    Arc<Resolver>,
    Arc<MemoirConfig>,
    Arc<InsightsOptions>,
)> {
    let insights = InsightsOptions::from_config(&config.insights)?;

    let db_path = config.resolved_db_path();
    let conn = db::open_database(&db_path)?;
    tracing::info!(db = %db_path.display(), "database ready");

    let models = ModelProvider::from_config(&config)?;
    let resolver = Resolver::new(models, ReflectOptions::from_config(&config)?);
    db::sync_embedding_model(&conn, resolver.embedding_model())?;

    Ok((
        Arc::new(Mutex::new(conn)),
        Arc::new(resolver),
        Arc::new(config),
        Arc::new(insights),
    ))
}

/// Start the MCP server over stdio transport.
pub async fn serve_stdio(config: MemoirConfig) -> Result<()> {
    tracing::info!("starting memoir MCP server on stdio");

    let (db, resolver, config, insights) = setup_shared_state(config)?;

    let tools = MemoirTools::new(db, resolver, config, insights);
    let transport = rmcp::transport::stdio();

    let server = tools.serve(transport).await?;
    tracing::info!("MCP server running, waiting for client");

    server.waiting().await?;
    tracing::info!("MCP server shut down");

    Ok(())
}

/// Start the MCP server over Streamable HTTP transport.
pub async fn serve_http(config: MemoirConfig) -> Result<()> {
    let bind_addr = format!("{}:{}", config.server.host, config.server.port);

    tracing::info!(addr = %bind_addr, "starting memoir MCP server on HTTP");

    let (db, resolver, config, insights) = setup_shared_state(config)?;

    let service = rmcp::transport::streamable_http_server::StreamableHttpService::new(
        move || {
            Ok(MemoirTools::new(
                db.clone(),
                resolver.clone(),
                config.clone(),
                insights.clone(),
            ))
        },
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
            tracing::info!("shutting down HTTP server");
        })
        .await?;

    Ok(())
}
