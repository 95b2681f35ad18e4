//! Server configuration
//!
//! Loaded from the environment (prefix `MACROSCOPE_`) with serde defaults;
//! the CLI may override individual fields afterwards.

use crate::error::Result;
use serde::Deserialize;
use std::net::SocketAddr;

/// Deployment configuration for the MCP request server
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Listen address
    pub bind: SocketAddr,

    /// Accepted bearer tokens; empty disables authentication entirely
    pub bearer_tokens: Vec<String>,

    /// Exact-match Origin allow-list; an absent Origin header always passes
    pub allowed_origins: Vec<String>,

    /// Sliding session TTL in seconds
    pub session_ttl_secs: u64,

    /// When false, supplied session ids are neither validated nor renewed
    pub enforce_sessions: bool,

    /// Seconds between SSE keep-alive comments
    pub sse_keep_alive_secs: u64,

    /// Maximum lifetime of one SSE connection in seconds
    pub sse_max_lifetime_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: ([127, 0, 0, 1], 8787).into(),
            bearer_tokens: Vec::new(),
            allowed_origins: Vec::new(),
            session_ttl_secs: 3600,
            enforce_sessions: true,
            sse_keep_alive_secs: 15,
            sse_max_lifetime_secs: 300,
        }
    }
}

impl ServerConfig {
    /// Load configuration from `MACROSCOPE_*` environment variables.
    ///
    /// List values (`MACROSCOPE_BEARER_TOKENS`, `MACROSCOPE_ALLOWED_ORIGINS`)
    /// are comma-separated.
    pub fn from_env() -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(
                config::Environment::with_prefix("MACROSCOPE")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("bearer_tokens")
                    .with_list_parse_key("allowed_origins"),
            )
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
