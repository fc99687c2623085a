//! Transport trait for JSON-RPC 2.0 communication.
//!
//! This module defines the common interface that all transport implementations
//! must support.

use std::sync::Arc;

use crate::dispatcher::RequestDispatcher;
use crate::error::Error;

/// Trait defining the interface for JSON-RPC transports.
///
/// A transport receives framed messages, hands each one to the dispatcher,
/// and writes back whatever response the dispatcher produces. Notifications
/// produce none. Different implementations support different mechanisms
/// (stdio, HTTP, in-memory, etc.).
pub trait Transport {
    /// Serve until the message source is exhausted or fails.
    async fn serve(self, dispatcher: Arc<RequestDispatcher>) -> Result<(), Error>;
}
