//! mcp-docfetch server entry point.
//!
//! This is the main binary that boots the MCP server on stdio transport.
//! Logging goes to stderr to avoid interfering with the JSON-RPC protocol on stdout.

use std::sync::Arc;

use anyhow::Result;
use docfetch_client::{FetchConfig, ResilientFetcher};
use docfetch_core::{AppConfig, CacheStore};
use rmcp::service::serve_server;
use rmcp::transport::io::stdio;
use tracing_subscriber::EnvFilter;

mod cleanup;
mod handler;
mod tools;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .json()
        .init();

    let config = AppConfig::load()?;
    tracing::info!(
        cache_capacity = config.cache_capacity,
        cache_ttl_secs = config.cache_ttl_secs,
        timeout_ms = config.timeout_ms,
        "Starting mcp-docfetch server on stdio transport"
    );

    let cache = Arc::new(CacheStore::new(config.cache_capacity, config.cache_ttl()));
    let fetcher = Arc::new(ResilientFetcher::new(FetchConfig::from(&config), Arc::clone(&cache))?);
    let sweeper = cleanup::spawn_cleanup(cache, config.cleanup_interval());

    let handler = handler::DocfetchServer::new(fetcher);
    let transport = stdio();
    let server = serve_server(handler, transport).await?;

    server.waiting().await?;
    sweeper.abort();

    Ok(())
}
