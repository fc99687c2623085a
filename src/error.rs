//! Error types for the service host.
//!
//! This module defines internal errors raised while booting the server or
//! invoking handlers, distinct from the JSON-RPC wire error objects defined in
//! the `types` module. Startup variants abort boot; handler variants are
//! mapped onto wire error objects by the dispatcher.

use std::io;

use crate::types::{ErrorObject, INTERNAL_ERROR, INVALID_PARAMS};

/// Internal errors that can occur while hosting JSON-RPC services.
///
/// These are implementation-level errors, separate from the JSON-RPC protocol
/// error objects that are sent over the wire (defined in `types::ErrorObject`).
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Typed RPC error raised by a handler. Passed through to the caller verbatim.
    #[error("JSON-RPC error {code}: {message}")]
    RpcError {
        code: i32,
        message: String,
        data: Option<serde_json::Value>,
    },

    /// Parameters could not be bound to the target method.
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    /// Protocol-level error raised by a handler without a specific code.
    #[error("Protocol error: {0}")]
    ProtocolError(String),

    /// Two discovered services share a name.
    #[error("Duplicate service: {0}")]
    DuplicateService(String),

    /// No service is registered under the name.
    ///
    /// Raised by registry lookups. Boot never looks services up, and dispatch
    /// reports a missing service as method not found.
    #[error("Service not found: {0}")]
    ServiceNotFound(String),

    /// The service name cannot be derived from the implementation type.
    #[error("Cannot resolve service name from {0}")]
    AmbiguousServiceName(String),

    /// Static configuration references a handler type that was never provided.
    #[error("Unknown handler class: {0}")]
    UnknownHandler(String),

    /// An exposed method does not exist on the handler.
    #[error("Service {service} has no callable method {method}")]
    UnknownMethod { service: String, method: String },

    /// The service ended up with an empty exposed method set.
    #[error("Service {0} exposes no methods")]
    NoExposedMethods(String),

    /// Configuration names a middleware that was never provided.
    #[error("Unknown middleware: {0}")]
    UnknownMiddleware(String),

    /// No configured port uses the server protocol.
    #[error("Cannot find port use {0} protocol")]
    PortNotFound(String),

    /// The wildcard bind host could not be turned into an advertised address.
    #[error("Cannot resolve advertised host: {0}")]
    HostResolution(String),

    /// Static configuration is unreadable or malformed.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Transport I/O error.
    #[error("Transport error: {0}")]
    TransportError(#[from] io::Error),

    /// JSON encoding or decoding error.
    #[error("JSON parse error: {0}")]
    ParseError(#[from] serde_json::Error),
}

impl Error {
    /// Create a typed RPC error with a specific code.
    pub fn rpc(code: i32, message: impl Into<String>) -> Self {
        Self::RpcError {
            code,
            message: message.into(),
            data: None,
        }
    }

    /// Create a typed RPC error carrying additional data.
    pub fn rpc_with_data(code: i32, message: impl Into<String>, data: serde_json::Value) -> Self {
        Self::RpcError {
            code,
            message: message.into(),
            data: Some(data),
        }
    }

    /// Create a new protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::ProtocolError(message.into())
    }

    /// Create a new invalid params error.
    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::InvalidParams(message.into())
    }

    /// Create a new transport error.
    pub fn transport(error: impl Into<io::Error>) -> Self {
        Self::TransportError(error.into())
    }

    /// Whether this error is a boot-time failure that must abort startup.
    pub fn is_startup(&self) -> bool {
        matches!(
            self,
            Self::DuplicateService(_)
                | Self::AmbiguousServiceName(_)
                | Self::UnknownHandler(_)
                | Self::UnknownMethod { .. }
                | Self::NoExposedMethods(_)
                | Self::UnknownMiddleware(_)
                | Self::PortNotFound(_)
                | Self::HostResolution(_)
                | Self::Config(_)
        )
    }

    /// Convert a handler failure into the wire error object.
    ///
    /// Typed RPC errors keep their code, message and data. Everything else is
    /// reported as an internal error; its message is only attached as `data`
    /// when `expose_details` is set.
    pub(crate) fn into_error_object(self, expose_details: bool) -> ErrorObject {
        match self {
            Self::RpcError {
                code,
                message,
                data,
            } => ErrorObject::new(code, message, data),
            Self::InvalidParams(detail) => ErrorObject::new(
                INVALID_PARAMS,
                "Invalid params",
                Some(serde_json::Value::String(detail)),
            ),
            other => {
                let data = expose_details.then(|| serde_json::Value::String(other.to_string()));
                ErrorObject::new(INTERNAL_ERROR, "Internal error", data)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn typed_error_passes_through() {
        let object = Error::rpc_with_data(-32000, "Division by zero", json!({"divisor": 0}))
            .into_error_object(false);

        assert_eq!(object.code, -32000);
        assert_eq!(object.message, "Division by zero");
        assert_eq!(object.data, Some(json!({"divisor": 0})));
    }

    #[test]
    fn untyped_error_hides_details_on_request() {
        let hidden = Error::protocol("disk on fire").into_error_object(false);
        assert_eq!(hidden.code, INTERNAL_ERROR);
        assert_eq!(hidden.data, None);

        let shown = Error::protocol("disk on fire").into_error_object(true);
        assert_eq!(shown.data, Some(json!("Protocol error: disk on fire")));
    }

    #[test]
    fn startup_errors_are_classified() {
        assert!(Error::DuplicateService("calc".into()).is_startup());
        assert!(Error::AmbiguousServiceName("Impl".into()).is_startup());
        assert!(!Error::protocol("boom").is_startup());
        assert!(!Error::ServiceNotFound("calc".into()).is_startup());
        assert!(!Error::invalid_params("arity").is_startup());
    }
}
