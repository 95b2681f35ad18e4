//! Batch and single-message processing
//!
//! Applies the dispatcher to one or many raw JSON values, enforcing the
//! notification-suppression rules: a message without an `id` key never
//! contributes a response, and a payload made up entirely of notifications
//! yields an empty 202 at the transport layer.

use super::dispatch::MessageDispatcher;
use super::protocol::{JsonRpcError, JsonRpcRequest, JsonRpcResponse, JSONRPC_VERSION};
use serde_json::Value;
use tracing::warn;

/// Result of processing one HTTP payload
#[derive(Debug)]
pub struct BatchOutcome {
    /// Responses in processing order; empty when every element was a
    /// pure notification
    pub responses: Vec<JsonRpcResponse>,

    /// True when at least one `initialize` call produced a result. The
    /// transport mints at most one session per payload off this flag.
    pub session_initialized: bool,
}

/// Applies [`MessageDispatcher`] across a payload
pub struct BatchProcessor {
    dispatcher: MessageDispatcher,
}

impl BatchProcessor {
    pub fn new(dispatcher: MessageDispatcher) -> Self {
        Self { dispatcher }
    }

    /// Process a JSON array of messages, isolating failures per element
    pub async fn process_batch(&self, elements: Vec<Value>) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            responses: Vec::new(),
            session_initialized: false,
        };
        for element in elements {
            self.process_element(element, &mut outcome).await;
        }
        outcome
    }

    /// Process a single (non-array) message under the same rules
    pub async fn process_single(&self, element: Value) -> BatchOutcome {
        let mut outcome = BatchOutcome {
            responses: Vec::new(),
            session_initialized: false,
        };
        self.process_element(element, &mut outcome).await;
        outcome
    }

    async fn process_element(&self, element: Value, outcome: &mut BatchOutcome) {
        // Malformed entries get a synchronous in-place error bound to a
        // null id and count as non-notifications.
        if !element.is_object() {
            outcome.responses.push(JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::invalid_request("message must be a JSON object"),
            ));
            return;
        }

        let request: JsonRpcRequest = match serde_json::from_value(element) {
            Ok(request) => request,
            Err(err) => {
                warn!(error = %err, "malformed message in payload");
                outcome.responses.push(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::invalid_request(format!("Invalid request: {err}")),
                ));
                return;
            }
        };

        let had_id = !request.is_notification();

        if request.jsonrpc != JSONRPC_VERSION {
            if had_id {
                outcome.responses.push(JsonRpcResponse::error(
                    request.response_id(),
                    JsonRpcError::invalid_request("jsonrpc must be '2.0'"),
                ));
            }
            return;
        }

        let is_initialize = request.method == "initialize";

        if let Some(response) = self.dispatcher.process(&request).await {
            if is_initialize && response.result.is_some() {
                outcome.session_initialized = true;
            }
            // Side effects already ran; without an id the response is
            // suppressed entirely.
            if had_id {
                outcome.responses.push(response);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::ToolRegistry;
    use serde_json::json;
    use std::sync::Arc;

    fn processor() -> BatchProcessor {
        BatchProcessor::new(MessageDispatcher::new(Arc::new(ToolRegistry::new())))
    }

    #[tokio::test]
    async fn test_all_notifications_contribute_nothing() {
        let outcome = processor()
            .process_batch(vec![
                json!({"jsonrpc": "2.0", "method": "notifications/initialized"}),
                json!({"jsonrpc": "2.0", "method": "notifications/cancelled"}),
            ])
            .await;

        assert!(outcome.responses.is_empty());
        assert!(!outcome.session_initialized);
    }

    #[tokio::test]
    async fn test_mixed_batch_emits_one_entry_per_id() {
        let outcome = processor()
            .process_batch(vec![
                json!({"jsonrpc": "2.0", "method": "notifications/cancelled"}),
                json!({"jsonrpc": "2.0", "id": 2, "method": "ping"}),
            ])
            .await;

        assert_eq!(outcome.responses.len(), 1);
        assert_eq!(outcome.responses[0].id, json!(2));
        assert_eq!(outcome.responses[0].result, Some(json!({})));
    }

    #[tokio::test]
    async fn test_malformed_element_gets_null_id_error() {
        let outcome = processor()
            .process_batch(vec![
                json!("not an object"),
                json!({"jsonrpc": "2.0", "id": 1, "method": "ping"}),
            ])
            .await;

        assert_eq!(outcome.responses.len(), 2);
        assert_eq!(outcome.responses[0].id, Value::Null);
        assert_eq!(outcome.responses[0].error.as_ref().unwrap().code, -32600);
        // The malformed element did not abort the rest of the batch.
        assert!(outcome.responses[1].result.is_some());
    }

    #[tokio::test]
    async fn test_request_as_notification_runs_but_stays_silent() {
        // tools/call without an id still executes, but no response entry.
        let outcome = processor()
            .process_single(json!({
                "jsonrpc": "2.0",
                "method": "tools/call",
                "params": {"name": "nonexistent"}
            }))
            .await;

        assert!(outcome.responses.is_empty());
    }

    #[tokio::test]
    async fn test_initialize_flags_session_mint() {
        let outcome = processor()
            .process_batch(vec![
                json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}),
                json!({"jsonrpc": "2.0", "id": 2, "method": "initialize"}),
            ])
            .await;

        assert_eq!(outcome.responses.len(), 2);
        assert!(outcome.session_initialized);
    }

    #[tokio::test]
    async fn test_wrong_jsonrpc_version() {
        let outcome = processor()
            .process_single(json!({"jsonrpc": "1.0", "id": 1, "method": "ping"}))
            .await;

        assert_eq!(outcome.responses.len(), 1);
        assert_eq!(outcome.responses[0].error.as_ref().unwrap().code, -32600);
    }

    #[tokio::test]
    async fn test_explicit_null_id_gets_a_response() {
        let outcome = processor()
            .process_single(json!({"jsonrpc": "2.0", "id": null, "method": "ping"}))
            .await;

        assert_eq!(outcome.responses.len(), 1);
        assert_eq!(outcome.responses[0].id, Value::Null);
        assert!(outcome.responses[0].result.is_some());
    }
}
