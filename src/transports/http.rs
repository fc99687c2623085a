//! HTTP-based transport for JSON-RPC 2.0.
//!
//! This module implements HTTP-based transport for JSON-RPC 2.0 communication
//! using axum for the web server. Requests are sent via HTTP POST and
//! responses are returned in the HTTP response.

use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use crate::dispatcher::RequestDispatcher;
use crate::error::Error;
use crate::service::PortBinding;
use crate::transports::Transport;

/// Default path for JSON-RPC endpoints.
pub const DEFAULT_PATH: &str = "/jsonrpc";

/// HTTP-based transport for JSON-RPC messages.
///
/// # Example
///
/// ```no_run
/// use json_rpc_host::{Http, ServerBuilder, ServerConfig};
///
/// # async fn run() -> Result<(), json_rpc_host::Error> {
/// let config = ServerConfig::load("server.toml")?;
/// let transport = Http::bind(config.service_port()?);
/// ServerBuilder::new(config).serve(transport).await
/// # }
/// ```
pub struct Http {
    address: String,
    path: String,
}

impl Http {
    /// Serve on `address`, e.g. `"127.0.0.1:8000"`.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            path: DEFAULT_PATH.to_string(),
        }
    }

    /// Serve on the bind host and port of a configured binding.
    pub fn bind(port: &PortBinding) -> Self {
        Self::new(format!("{}:{}", port.host(), port.port()))
    }

    /// Accept requests at `path` instead of `/jsonrpc`.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn address(&self) -> &str {
        &self.address
    }
}

impl Transport for Http {
    /// Runs until the server fails. Binding errors are returned immediately.
    async fn serve(self, dispatcher: Arc<RequestDispatcher>) -> Result<(), Error> {
        let app = crate::axum::router(dispatcher, &self.path);

        let listener = tokio::net::TcpListener::bind(&self.address)
            .await
            .map_err(|e| {
                Error::TransportError(std::io::Error::new(
                    e.kind(),
                    format!("Failed to bind to {}: {}", self.address, e),
                ))
            })?;

        let local_addr: SocketAddr = listener.local_addr()?;
        info!("JSON-RPC endpoint: http://{}{}", local_addr, self.path);

        axum::serve(listener, app).await.map_err(|e| {
            Error::TransportError(std::io::Error::other(format!("HTTP server error: {}", e)))
        })
    }
}
