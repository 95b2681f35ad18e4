//! Macroscope - MCP Request Server for the macro-economics dashboard
//!
//! A JSON-RPC-2.0-over-HTTP endpoint with bearer authentication, origin
//! validation, session lifecycle management, single/batch/notification
//! semantics, and a Server-Sent-Events channel for asynchronous
//! notifications.
//!
//! # Architecture
//!
//! The crate is organized around the transport/session/dispatch state
//! machine:
//! - **protocol**: JSON-RPC 2.0 wire types
//! - **dispatch**: method routing and error-code mapping
//! - **batch**: single/batch processing with notification suppression
//! - **session**: TTL-based session store (the only shared mutable state)
//! - **gate**: bearer-auth and Origin admission checks
//! - **http**: verb routing, CORS, and the SSE notification stream
//!
//! Business tools (macro dashboard, indicator lookup, momentum report, ...)
//! are external collaborators behind the [`ToolInvoker`] trait.
//!
//! # Example
//!
//! ```ignore
//! use macroscope_core::{McpServer, ServerConfig, ToolRegistry};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> macroscope_core::Result<()> {
//!     let config = ServerConfig::from_env()?;
//!     let tools = ToolRegistry::new();
//!     McpServer::new(config, Arc::new(tools)).serve().await
//! }
//! ```

pub mod config;
pub mod error;
pub mod mcp;

// Re-export commonly used types
pub use config::ServerConfig;
pub use error::{MacroscopeError, Result};
pub use mcp::{
    InMemorySessionStore, JsonRpcError, JsonRpcRequest, JsonRpcResponse, McpServer, SessionStore,
    Tool, ToolError, ToolInvoker, ToolOutput, ToolRegistry, PROTOCOL_VERSION,
};
