//! Discord MCP server - entry point
//!
//! Runs the MCP server over stdio for integration with MCP clients. The
//! gateway connection is spawned as a background task; tool calls wait for
//! it behind the readiness guard.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use argh::FromArgs;

use discord_mcp::discord::{DiscordPlatform, DEFAULT_API_URL, DEFAULT_GATEWAY_URL};
use discord_mcp::McpServer;

/// Discord MCP server - expose Discord administration to AI assistants
#[derive(FromArgs)]
struct Args {
    /// discord REST API base URL (default: https://discord.com/api/v10)
    #[argh(option, default = "String::from(DEFAULT_API_URL)")]
    api_url: String,

    /// discord gateway URL (default: wss://gateway.discord.gg/?v=10&encoding=json)
    #[argh(option, default = "String::from(DEFAULT_GATEWAY_URL)")]
    gateway_url: String,

    /// seconds a tool call waits for the gateway before failing (default: 5)
    #[argh(option, default = "5")]
    ready_timeout_secs: u64,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logging goes to stderr; stdout carries the MCP protocol.
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    let args: Args = argh::from_env();
    let token = std::env::var("DISCORD_TOKEN")
        .context("DISCORD_TOKEN environment variable is required")?;

    log::info!("Starting Discord MCP server");

    let platform = DiscordPlatform::new(token, &args.api_url);
    tokio::spawn(platform.clone().run_gateway(args.gateway_url));

    let server = McpServer::new(Arc::new(platform))
        .with_ready_timeout(Duration::from_secs(args.ready_timeout_secs));
    server.run_stdio().await?;

    Ok(())
}
