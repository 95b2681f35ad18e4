//! Model Context Protocol (MCP) request server
//!
//! Implements the JSON-RPC 2.0 over HTTP transport: admission gates,
//! session lifecycle, single/batch dispatch, and the SSE notification
//! stream. Business tools are reached through the [`tools::ToolInvoker`]
//! seam and live outside this module.

pub mod batch;
pub mod dispatch;
pub mod gate;
pub mod http;
pub mod protocol;
pub mod session;
pub mod tools;

pub use batch::{BatchOutcome, BatchProcessor};
pub use dispatch::{MessageDispatcher, Method};
pub use gate::{AuthGate, OriginGuard};
pub use http::McpServer;
pub use protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
pub use session::{InMemorySessionStore, SessionStore};
pub use tools::{Tool, ToolError, ToolInvoker, ToolOutput, ToolRegistry};
