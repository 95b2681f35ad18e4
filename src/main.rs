//! Macroscope MCP server entry point
//!
//! Starts the HTTP endpoint with configuration drawn from the environment
//! and CLI flags. The dashboard's business tools are registered by the
//! embedding application; the standalone binary ships a status tool so a
//! fresh deployment can be smoke-tested end to end.

use clap::Parser;
use macroscope_core::{McpServer, Result, ServerConfig, Tool, ToolOutput, ToolRegistry};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "macroscope", version, about = "MCP request server for the Macroscope dashboard")]
struct Cli {
    /// Listen address (overrides MACROSCOPE_BIND)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log level for the server (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", env = "MACROSCOPE_LOG")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Quiet the HTTP middleware unless explicitly requested.
    let filter = EnvFilter::new(format!(
        "macroscope={level},macroscope_core={level},tower_http=warn",
        level = cli.log_level
    ));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let mut config = ServerConfig::from_env()?;
    if let Some(bind) = cli.bind {
        config.bind = bind;
    }

    debug!("Macroscope v{} starting...", env!("CARGO_PKG_VERSION"));

    let started = Instant::now();
    let mut registry = ToolRegistry::new();
    registry.register(
        Tool {
            name: "server/status".to_string(),
            description: "Report server version and uptime".to_string(),
            input_schema: json!({
                "type": "object",
                "properties": {}
            }),
        },
        move |_arguments| {
            let uptime_secs = started.elapsed().as_secs();
            async move {
                Ok(ToolOutput::Structured(json!({
                    "status": "ok",
                    "version": env!("CARGO_PKG_VERSION"),
                    "uptime_secs": uptime_secs,
                })))
            }
        },
    );
    debug!("{} tool(s) registered", registry.len());

    McpServer::new(config, Arc::new(registry)).serve().await
}
