//! Swarmia MCP Server - Entry Point
//!
//! Runs the MCP server over stdio for integration with Claude Desktop.

use std::sync::Arc;

use anyhow::Result;
use argh::FromArgs;
use swarmia_mcp_server::{swarmia_catalog, Config, Dispatcher, McpServer, SwarmiaClient};

/// Swarmia MCP Server - Expose Swarmia reports to AI assistants
#[derive(FromArgs)]
struct Args {
    /// swarmia API base URL (default: $SWARMIA_BASE_URL or https://app.swarmia.com/api/v0)
    #[argh(option)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI arguments
    let args: Args = argh::from_env();

    // Initialize logging to stderr (stdout is used for MCP protocol)
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    log::info!("Starting Swarmia MCP server");

    // The token is checked once, before any tool can run
    let config = Config::from_env(args.base_url.as_deref())?;
    let client = Arc::new(SwarmiaClient::new(config)?);
    log::info!("Swarmia API: {}", client.base_url());
    let server = Arc::new(McpServer::new(Dispatcher::new(
        swarmia_catalog(),
        Arc::clone(&client),
    )));

    // Run over stdio
    let served = server.run_stdio().await;

    match Arc::try_unwrap(client) {
        Ok(client) => client.close(),
        Err(_) => log::warn!("Swarmia API client still referenced at shutdown"),
    }

    served?;
    Ok(())
}
