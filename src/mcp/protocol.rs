//! JSON-RPC 2.0 protocol types
//!
//! Defines the wire-level message types for MCP communication over HTTP.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// MCP protocol version reported by `initialize` and `/mcp/info`
pub const PROTOCOL_VERSION: &str = "2024-11-05";

/// JSON-RPC version string
pub const JSONRPC_VERSION: &str = "2.0";

/// JSON-RPC 2.0 request
#[derive(Debug, Clone, Deserialize)]
pub struct JsonRpcRequest {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,

    /// Method name to invoke
    pub method: String,

    /// Parameters (can be object or array)
    #[serde(default)]
    pub params: Value,

    /// Request ID.
    ///
    /// `None` means the `id` key was absent, which marks a notification.
    /// `Some(Value::Null)` means the client sent an explicit `null` id,
    /// which is still a request expecting a response. The two are not
    /// interchangeable.
    #[serde(default, deserialize_with = "id_if_present")]
    pub id: Option<Value>,
}

/// Captures any present `id` value, including an explicit `null`.
///
/// A plain `Option<Value>` field would collapse `"id": null` into `None`;
/// this keeps `None` reserved for an absent key (via `#[serde(default)]`).
fn id_if_present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

impl JsonRpcRequest {
    /// Whether this message is a notification (no `id` key on the wire)
    pub fn is_notification(&self) -> bool {
        self.id.is_none()
    }

    /// The id to echo in a response (`null` for notifications)
    pub fn response_id(&self) -> Value {
        self.id.clone().unwrap_or(Value::Null)
    }
}

/// JSON-RPC 2.0 response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    /// JSON-RPC version (must be "2.0")
    pub jsonrpc: String,

    /// Result (present if successful)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,

    /// Error (present if failed)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,

    /// Request ID (echoed from request)
    pub id: Value,
}

impl JsonRpcResponse {
    /// Create a success response
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: Some(result),
            error: None,
            id,
        }
    }

    /// Create an error response
    pub fn error(id: Value, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            result: None,
            error: Some(error),
            id,
        }
    }
}

/// JSON-RPC 2.0 error object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonRpcError {
    /// Error code
    pub code: i32,

    /// Error message
    pub message: String,
}

impl JsonRpcError {
    /// Parse error (-32700)
    pub fn parse_error(message: impl Into<String>) -> Self {
        Self {
            code: -32700,
            message: message.into(),
        }
    }

    /// Invalid request (-32600)
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            code: -32600,
            message: message.into(),
        }
    }

    /// Method not found (-32601)
    pub fn method_not_found(method: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("Method not found: {}", method.into()),
        }
    }

    /// Unknown tool, same code class as method-not-found (-32601)
    pub fn unknown_tool(name: impl Into<String>) -> Self {
        Self {
            code: -32601,
            message: format!("Unknown tool: {}", name.into()),
        }
    }

    /// Invalid params (-32602)
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: -32602,
            message: message.into(),
        }
    }

    /// Internal error (-32603)
    pub fn internal_error(message: impl Into<String>) -> Self {
        Self {
            code: -32603,
            message: message.into(),
        }
    }
}
