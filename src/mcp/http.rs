//! HTTP transport gateway
//!
//! Routes HTTP verbs on `/mcp` into the protocol layer: admission checks,
//! Accept negotiation, session validation, batch processing, and the SSE
//! notification stream. Internal failures surface as JSON-RPC error bodies
//! on HTTP 200, never as 5xx.

use super::batch::{BatchOutcome, BatchProcessor};
use super::dispatch::MessageDispatcher;
use super::gate::{AuthGate, GateDenial, OriginGuard};
use super::protocol::{JsonRpcError, JsonRpcResponse, PROTOCOL_VERSION};
use super::session::{InMemorySessionStore, SessionStore};
use super::tools::ToolInvoker;
use crate::config::ServerConfig;
use crate::error::Result;
use axum::{
    body::Bytes,
    extract::State,
    http::{header, HeaderMap, HeaderName, HeaderValue, StatusCode},
    response::{sse::Event as SseEvent, IntoResponse, Response, Sse},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use tokio_stream::{wrappers::IntervalStream, StreamExt as _};
use tower_http::{set_header::SetResponseHeaderLayer, trace::TraceLayer};
use tracing::{debug, info};

/// Session header, exposed to browsers via CORS
pub const MCP_SESSION_HEADER: HeaderName = HeaderName::from_static("mcp-session-id");

const EVENT_STREAM_MIME: &str = "text/event-stream";
const JSON_MIME: &str = "application/json";

/// Shared per-request state
#[derive(Clone)]
struct AppState {
    batch: Arc<BatchProcessor>,
    sessions: Arc<dyn SessionStore>,
    tools: Arc<dyn ToolInvoker>,
    auth: Arc<AuthGate>,
    origin: Arc<OriginGuard>,
    config: Arc<ServerConfig>,
}

/// The MCP request server
pub struct McpServer {
    state: AppState,
}

impl McpServer {
    /// Create a server with an in-memory session store
    pub fn new(config: ServerConfig, tools: Arc<dyn ToolInvoker>) -> Self {
        let sessions: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(
            Duration::from_secs(config.session_ttl_secs),
        ));
        Self::with_session_store(config, tools, sessions)
    }

    /// Create a server over an injected session store (used by tests and
    /// external TTL caches)
    pub fn with_session_store(
        config: ServerConfig,
        tools: Arc<dyn ToolInvoker>,
        sessions: Arc<dyn SessionStore>,
    ) -> Self {
        let state = AppState {
            batch: Arc::new(BatchProcessor::new(MessageDispatcher::new(tools.clone()))),
            sessions,
            tools,
            auth: Arc::new(AuthGate::new(&config.bearer_tokens)),
            origin: Arc::new(OriginGuard::new(config.allowed_origins.clone())),
            config: Arc::new(config),
        };
        Self { state }
    }

    /// Build the axum router
    pub fn router(&self) -> Router {
        Router::new()
            .route(
                "/mcp",
                get(get_mcp)
                    .post(post_mcp)
                    .delete(delete_mcp)
                    .options(options_mcp)
                    .fallback(method_not_allowed),
            )
            .route("/mcp/info", get(info_handler))
            .with_state(self.state.clone())
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_ORIGIN,
                HeaderValue::from_static("*"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_METHODS,
                HeaderValue::from_static("GET, POST, DELETE, OPTIONS"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_ALLOW_HEADERS,
                HeaderValue::from_static("Authorization, Content-Type, Mcp-Session-Id"),
            ))
            .layer(SetResponseHeaderLayer::overriding(
                header::ACCESS_CONTROL_EXPOSE_HEADERS,
                HeaderValue::from_static("Mcp-Session-Id"),
            ))
            .layer(TraceLayer::new_for_http())
    }

    /// Bind and serve until Ctrl-C
    pub async fn serve(self) -> Result<()> {
        let addr = self.state.config.bind;
        let listener = tokio::net::TcpListener::bind(addr).await?;
        info!("MCP server listening on http://{}", listener.local_addr()?);

        axum::serve(listener, self.router())
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    let _ = tokio::signal::ctrl_c().await;
    info!("shutdown signal received");
}

/// Map a gate denial to its HTTP status with a JSON-RPC error body
fn deny(denial: GateDenial) -> Response {
    (
        denial.status,
        Json(JsonRpcResponse::error(
            Value::Null,
            JsonRpcError::invalid_request(denial.message),
        )),
    )
        .into_response()
}

fn not_acceptable(message: &str) -> Response {
    (
        StatusCode::NOT_ACCEPTABLE,
        Json(JsonRpcResponse::error(
            Value::Null,
            JsonRpcError::invalid_request(message),
        )),
    )
        .into_response()
}

/// Absent Accept headers and wildcards are treated as acceptance.
///
/// Matching is per media-range token, so `application/json-seq` does not
/// satisfy `application/json`. Quality and charset parameters are ignored.
fn accept_allows(headers: &HeaderMap, mime: &str) -> bool {
    let Some(accept) = headers.get(header::ACCEPT).and_then(|v| v.to_str().ok()) else {
        return true;
    };
    accept.split(',').any(|entry| {
        let media = entry.split(';').next().unwrap_or("").trim();
        media == mime
            || media == "*/*"
            || media
                .strip_suffix("/*")
                .is_some_and(|kind| mime.split('/').next() == Some(kind))
    })
}

fn session_header<'h>(headers: &'h HeaderMap) -> Option<&'h str> {
    headers
        .get(MCP_SESSION_HEADER)
        .and_then(|value| value.to_str().ok())
}

/// `OPTIONS /mcp`: CORS preflight, no auth/origin/session checks
async fn options_mcp() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// Verbs outside the supported set
async fn method_not_allowed() -> Response {
    (
        StatusCode::METHOD_NOT_ALLOWED,
        Json(JsonRpcResponse::error(
            Value::Null,
            JsonRpcError::invalid_request("Method not allowed"),
        )),
    )
        .into_response()
}

/// `GET /mcp/info`: static server descriptor; auth-gated, no origin check
async fn info_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denial) = state.auth.check(&headers) {
        return deny(denial);
    }

    let tools: Vec<String> = state
        .tools
        .list_tools()
        .into_iter()
        .map(|tool| tool.name)
        .collect();

    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
        "protocolVersion": PROTOCOL_VERSION,
        "endpoints": {
            "mcp": "/mcp",
            "info": "/mcp/info",
        },
        "tools": tools,
    }))
    .into_response()
}

/// `GET /mcp`: long-lived SSE notification stream.
///
/// Keep-alive comments only in the current design; the stream is the
/// extension point for future server-push notifications. Terminates after
/// the configured lifetime or on peer disconnect, whichever comes first.
async fn get_mcp(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denial) = state.auth.check(&headers) {
        return deny(denial);
    }
    if let Err(denial) = state.origin.check(&headers) {
        return deny(denial);
    }
    if !accept_allows(&headers, EVENT_STREAM_MIME) {
        return not_acceptable("Client must accept text/event-stream");
    }

    let keep_alive = Duration::from_secs(state.config.sse_keep_alive_secs.max(1));
    let ticks = (state.config.sse_max_lifetime_secs / keep_alive.as_secs()).max(1) as usize;

    debug!(?keep_alive, ticks, "opening notification stream");

    // The interval lives on the runtime's timer; dropping the response body
    // on peer disconnect cancels it.
    let first_tick = tokio::time::Instant::now() + keep_alive;
    let stream = IntervalStream::new(tokio::time::interval_at(first_tick, keep_alive))
        .map(|_| Ok::<SseEvent, Infallible>(SseEvent::default().comment("keep-alive")))
        .take(ticks);

    let mut response = Sse::new(stream).into_response();
    let response_headers = response.headers_mut();
    response_headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static("no-cache, no-store, must-revalidate"),
    );
    response_headers.insert(header::CONNECTION, HeaderValue::from_static("keep-alive"));
    response_headers.insert(
        HeaderName::from_static("x-accel-buffering"),
        HeaderValue::from_static("no"),
    );
    response
}

/// `POST /mcp`: single message or batch
async fn post_mcp(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    if let Err(denial) = state.auth.check(&headers) {
        return deny(denial);
    }
    if let Err(denial) = state.origin.check(&headers) {
        return deny(denial);
    }
    if !accept_allows(&headers, JSON_MIME) {
        return not_acceptable("Client must accept application/json");
    }

    let payload: Value = match serde_json::from_slice(&body) {
        Ok(payload) => payload,
        Err(err) => {
            return (
                StatusCode::BAD_REQUEST,
                Json(JsonRpcResponse::error(
                    Value::Null,
                    JsonRpcError::parse_error(format!("Invalid JSON: {err}")),
                )),
            )
                .into_response();
        }
    };

    // `initialize` is how a session is obtained, so it is exempt from
    // session validation. Other requests that present a session id must
    // present a live one.
    if state.config.enforce_sessions && !contains_initialize(&payload) {
        if let Some(session_id) = session_header(&headers) {
            if !state.sessions.validate(session_id).await {
                return (
                    StatusCode::NOT_FOUND,
                    Json(JsonRpcResponse::error(
                        Value::Null,
                        JsonRpcError::invalid_request(
                            "Session not found or expired. Please reinitialize.",
                        ),
                    )),
                )
                    .into_response();
            }
            // Renew before dispatch; tool execution happens lock-free.
            state.sessions.touch(session_id).await;
        }
    }

    let (outcome, is_batch) = match payload {
        Value::Array(elements) => (state.batch.process_batch(elements).await, true),
        message => (state.batch.process_single(message).await, false),
    };

    let mut response = render_outcome(&outcome, is_batch);

    if outcome.session_initialized {
        let session_id = state.sessions.create().await;
        info!(session_id = %session_id, "session initialized");
        if let Ok(value) = HeaderValue::from_str(&session_id) {
            response.headers_mut().insert(MCP_SESSION_HEADER, value);
        }
    }

    response
}

/// Pure notifications yield an empty 202; anything else a 200 JSON body
fn render_outcome(outcome: &BatchOutcome, is_batch: bool) -> Response {
    if outcome.responses.is_empty() {
        return StatusCode::ACCEPTED.into_response();
    }
    if is_batch {
        Json(&outcome.responses).into_response()
    } else {
        Json(&outcome.responses[0]).into_response()
    }
}

fn contains_initialize(payload: &Value) -> bool {
    let is_initialize =
        |message: &Value| message.get("method").and_then(Value::as_str) == Some("initialize");
    match payload {
        Value::Array(elements) => elements.iter().any(is_initialize),
        message => is_initialize(message),
    }
}

/// `DELETE /mcp`: explicit session teardown
async fn delete_mcp(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Err(denial) = state.auth.check(&headers) {
        return deny(denial);
    }
    if let Err(denial) = state.origin.check(&headers) {
        return deny(denial);
    }

    let Some(session_id) = session_header(&headers) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(JsonRpcResponse::error(
                Value::Null,
                JsonRpcError::invalid_request("Mcp-Session-Id header required"),
            )),
        )
            .into_response();
    };

    state.sessions.delete(session_id).await;
    StatusCode::NO_CONTENT.into_response()
}
