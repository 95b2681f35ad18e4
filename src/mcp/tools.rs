//! Tool invocation seam
//!
//! The request server never implements business tools itself; it reaches
//! them through the [`ToolInvoker`] trait. Dashboard capabilities (macro
//! dashboard, indicator lookup, momentum report, ...) live behind this
//! seam in the embedding application.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use thiserror::Error;

/// Tool schema definition
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (e.g., "macro/dashboard")
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// JSON Schema for input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

/// What a tool produced
#[derive(Debug, Clone)]
pub enum ToolOutput {
    /// Plain text, forwarded as-is
    Text(String),
    /// Structured JSON, serialized into the text content by the dispatcher
    Structured(Value),
}

/// Tool invocation failure
#[derive(Debug, Error)]
pub enum ToolError {
    /// The requested tool name is not registered
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// The tool ran and failed
    #[error("{0}")]
    Failed(String),
}

/// Executes named tools on behalf of the dispatcher
#[async_trait]
pub trait ToolInvoker: Send + Sync {
    /// Describe all registered tools
    fn list_tools(&self) -> Vec<Tool>;

    /// Run a tool by name
    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError>;
}

type ToolFn = Arc<
    dyn Fn(Value) -> Pin<Box<dyn Future<Output = Result<ToolOutput, ToolError>> + Send>>
        + Send
        + Sync,
>;

/// In-process [`ToolInvoker`] backed by registered async closures
///
/// Registration order is preserved in `tools/list` output.
#[derive(Default)]
pub struct ToolRegistry {
    entries: Vec<(Tool, ToolFn)>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Register a tool and its handler
    pub fn register<F, Fut>(&mut self, tool: Tool, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<ToolOutput, ToolError>> + Send + 'static,
    {
        let handler: ToolFn = Arc::new(move |arguments| Box::pin(handler(arguments)));
        self.entries.push((tool, handler));
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the registry is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl ToolInvoker for ToolRegistry {
    fn list_tools(&self) -> Vec<Tool> {
        self.entries.iter().map(|(tool, _)| tool.clone()).collect()
    }

    async fn invoke(&self, name: &str, arguments: Value) -> Result<ToolOutput, ToolError> {
        let Some((_, handler)) = self.entries.iter().find(|(tool, _)| tool.name == name) else {
            return Err(ToolError::UnknownTool(name.to_string()));
        };
        handler(arguments).await
    }
}
