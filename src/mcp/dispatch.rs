//! JSON-RPC method dispatch
//!
//! Routes a single decoded message to its handler and maps failures to
//! protocol error codes. Method routing is a closed enum so adding a
//! method is a compile-time-checked change; unknown strings fall through
//! to a single method-not-found arm.

use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, PROTOCOL_VERSION};
use super::tools::{ToolError, ToolInvoker, ToolOutput};
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, warn};

/// Supported MCP methods
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Initialize,
    /// Covers `initialized` and `notifications/initialized`
    Initialized,
    NotificationsCancelled,
    ToolsList,
    ToolsCall,
    Ping,
}

impl Method {
    /// Map a wire method string onto the closed method set
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "initialize" => Some(Self::Initialize),
            "initialized" | "notifications/initialized" => Some(Self::Initialized),
            "notifications/cancelled" => Some(Self::NotificationsCancelled),
            "tools/list" => Some(Self::ToolsList),
            "tools/call" => Some(Self::ToolsCall),
            "ping" => Some(Self::Ping),
            _ => None,
        }
    }
}

/// Processes one JSON-RPC message at a time
pub struct MessageDispatcher {
    tools: Arc<dyn ToolInvoker>,
    server_name: String,
    server_version: String,
}

impl MessageDispatcher {
    /// Create a dispatcher over the given tool invoker
    pub fn new(tools: Arc<dyn ToolInvoker>) -> Self {
        Self {
            tools,
            server_name: env!("CARGO_PKG_NAME").to_string(),
            server_version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Process a single message.
    ///
    /// Returns `None` for notification-class methods, which never produce a
    /// response even when the client attached an `id`. For everything else
    /// the response is returned and the caller decides whether to emit it
    /// (messages without an `id` key still run their side effects but have
    /// their response suppressed).
    pub async fn process(&self, request: &JsonRpcRequest) -> Option<JsonRpcResponse> {
        let id = request.response_id();

        let Some(method) = Method::parse(&request.method) else {
            debug!(method = %request.method, "unknown method");
            return Some(JsonRpcResponse::error(
                id,
                JsonRpcError::method_not_found(&request.method),
            ));
        };

        match method {
            Method::Initialize => {
                debug!("handling initialize");
                Some(JsonRpcResponse::success(id, self.initialize_result()))
            }
            Method::Initialized | Method::NotificationsCancelled => None,
            Method::ToolsList => {
                debug!("handling tools/list");
                Some(JsonRpcResponse::success(
                    id,
                    json!({"tools": self.tools.list_tools()}),
                ))
            }
            Method::ToolsCall => Some(self.call_tool(id, &request.params).await),
            Method::Ping => Some(JsonRpcResponse::success(id, json!({}))),
        }
    }

    fn initialize_result(&self) -> Value {
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "serverInfo": {
                "name": self.server_name,
                "version": self.server_version,
            },
            "capabilities": {
                "tools": {}
            }
        })
    }

    async fn call_tool(&self, id: Value, params: &Value) -> JsonRpcResponse {
        let Some(params) = params.as_object() else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params("params must be an object"),
            );
        };

        let Some(name) = params.get("name").and_then(Value::as_str) else {
            return JsonRpcResponse::error(
                id,
                JsonRpcError::invalid_params("missing 'name' field"),
            );
        };

        let arguments = params
            .get("arguments")
            .cloned()
            .unwrap_or_else(|| json!({}));

        debug!(tool = name, "handling tools/call");

        // The invoker may perform network calls; nothing is locked here.
        match self.tools.invoke(name, arguments).await {
            Ok(output) => {
                let text = match output {
                    ToolOutput::Text(text) => text,
                    ToolOutput::Structured(value) => serde_json::to_string_pretty(&value)
                        .unwrap_or_else(|_| value.to_string()),
                };
                JsonRpcResponse::success(
                    id,
                    json!({
                        "content": [
                            {
                                "type": "text",
                                "text": text
                            }
                        ]
                    }),
                )
            }
            Err(ToolError::UnknownTool(name)) => {
                warn!(tool = %name, "tool not registered");
                JsonRpcResponse::error(id, JsonRpcError::unknown_tool(name))
            }
            Err(err) => {
                warn!(tool = name, error = %err, "tool execution failed");
                JsonRpcResponse::error(id, JsonRpcError::internal_error(err.to_string()))
            }
        }
    }
}
