//! Daemon entry point for the ALMA archive MCP server.
//!
//! Loads configuration from CLI arguments and the environment, builds the
//! archive collaborators, and serves the MCP protocol over stdio or
//! streamable HTTP.

mod config;
mod services;

use alma_core::control::AlmaControlPlane;
use alma_mcp::server::{McpHttpServerConfig, serve_stdio, serve_streamable_http};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::config::AlmaConfig;
use crate::services::build_services;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let config = AlmaConfig::from_args()?;
    // stdout belongs to the stdio transport.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_new(&config.log_filter)?)
        .with_writer(std::io::stderr)
        .init();

    let control = AlmaControlPlane::new(build_services(&config)?);
    if config.enable_stdio {
        info!("serving MCP over stdio");
        serve_stdio(control).await
    } else {
        info!(addr = %config.mcp_http_addr, stateful = config.stateful_mode, "serving MCP over streamable HTTP");
        let http = McpHttpServerConfig::new(config.mcp_http_addr)
            .with_stateful_mode(config.stateful_mode);
        serve_streamable_http(control, http).await
    }
}
