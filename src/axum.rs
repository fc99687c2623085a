//! Axum integration for the request dispatcher.
//!
//! This module provides an optional integration between the `RequestDispatcher`
//! and the axum web framework. Enable the `axum` feature in Cargo.toml to use it.
//!
//! The handler reads the HTTP request body, calls `RequestDispatcher::dispatch()`,
//! and returns the HTTP response. This follows the Bring Your Own Transport
//! pattern: axum handles the HTTP transport, the library handles JSON-RPC
//! message processing.
//!
//! ```toml
//! [dependencies]
//! json-rpc-host = { version = "0.1", features = ["axum"] }
//! ```
//!
//! # Example
//!
//! ```no_run
//! use json_rpc_host::{ServerBuilder, ServerConfig, axum::handler};
//! use axum::{Router, routing::post};
//! use std::sync::Arc;
//!
//! let dispatcher = ServerBuilder::new(ServerConfig::default()).build()?;
//! let app: Router = Router::new()
//!     .route("/jsonrpc", post(handler))
//!     .with_state(Arc::new(dispatcher));
//! # Ok::<(), json_rpc_host::Error>(())
//! ```

use std::sync::Arc;

use axum::{
    Router,
    extract::{Request, State},
    http::{StatusCode, header},
    response::IntoResponse,
    routing::post,
};

use crate::RequestDispatcher;

/// Maximum accepted request body size.
const BODY_LIMIT: usize = 10 * 1024 * 1024;

const PARSE_ERROR_BODY: &str =
    r#"{"jsonrpc":"2.0","id":null,"error":{"code":-32700,"message":"Parse error"}}"#;

/// Axum handler for processing JSON-RPC requests.
///
/// Returns HTTP 204 No Content for notifications and for batches made only
/// of notifications. Protocol errors are reported in the JSON-RPC body with
/// status 200; only an unreadable body yields 400.
pub async fn handler(
    State(dispatcher): State<Arc<RequestDispatcher>>,
    request: Request,
) -> impl IntoResponse {
    let bytes = match axum::body::to_bytes(request.into_body(), BODY_LIMIT).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!("Failed to read request body: {}", e);
            return json_response(StatusCode::BAD_REQUEST, PARSE_ERROR_BODY.as_bytes().to_vec());
        }
    };

    match dispatcher.dispatch(&bytes).await {
        Some(body) => json_response(StatusCode::OK, body),
        None => {
            tracing::debug!("Notification processed - no response needed");
            StatusCode::NO_CONTENT.into_response()
        }
    }
}

/// Build a router serving `handler` at `path`.
pub fn router(dispatcher: Arc<RequestDispatcher>, path: &str) -> Router {
    Router::new()
        .route(path, post(handler))
        .with_state(dispatcher)
}

fn json_response(status: StatusCode, body: Vec<u8>) -> axum::response::Response {
    (status, [(header::CONTENT_TYPE, "application/json")], body).into_response()
}
