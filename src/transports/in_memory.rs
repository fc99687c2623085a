//! In-memory transport for JSON-RPC 2.0.
//!
//! This module implements an in-memory transport for JSON-RPC 2.0 communication
//! within the same process. It uses async channels for message passing and is primarily
//! useful for testing and in-process communication scenarios.

use std::sync::Arc;

use tokio::sync::mpsc;
use tracing::debug;

use crate::dispatcher::RequestDispatcher;
use crate::error::Error;
use crate::transports::Transport;

/// In-memory transport for JSON-RPC messages.
///
/// Each received message is dispatched on its own task, so slow handlers do
/// not hold up later messages. Responses are sent back in completion order.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use json_rpc_host::{InMemory, RequestDispatcher, Transport};
///
/// # async fn run(dispatcher: Arc<RequestDispatcher>) -> Result<(), json_rpc_host::Error> {
/// let (server, mut client) = InMemory::pair();
///
/// tokio::spawn(async move { server.serve(dispatcher).await });
///
/// let request = r#"{"jsonrpc":"2.0","method":"app.EchoService.echo","params":["hello"],"id":1}"#;
/// let response = client.send_and_receive(request).await?;
/// println!("{}", response);
/// # Ok(())
/// # }
/// ```
pub struct InMemory {
    receiver: mpsc::Receiver<String>,
    sender: mpsc::Sender<String>,
}

impl InMemory {
    /// Create a new in-memory transport with the given sender and receiver.
    pub fn new(receiver: mpsc::Receiver<String>, sender: mpsc::Sender<String>) -> Self {
        Self { receiver, sender }
    }

    /// Create a pair of connected in-memory transports.
    ///
    /// Messages sent on one end are received by the other.
    pub fn pair() -> (Self, Self) {
        let (sender_a, receiver_a) = mpsc::channel(128);
        let (sender_b, receiver_b) = mpsc::channel(128);

        let transport_a = Self::new(receiver_b, sender_a);
        let transport_b = Self::new(receiver_a, sender_b);

        (transport_a, transport_b)
    }

    /// Get a reference to the sender channel.
    pub fn sender(&self) -> &mpsc::Sender<String> {
        &self.sender
    }

    /// Send a message without waiting for a response.
    pub async fn send(&self, message: &str) -> Result<(), Error> {
        self.sender.send(message.to_string()).await.map_err(|_| {
            Error::TransportError(std::io::Error::new(
                std::io::ErrorKind::BrokenPipe,
                "Receiver disconnected",
            ))
        })
    }

    /// Wait for the next message.
    pub async fn receive(&mut self) -> Result<String, Error> {
        self.receiver.recv().await.ok_or_else(|| {
            Error::TransportError(std::io::Error::new(
                std::io::ErrorKind::ConnectionReset,
                "Sender disconnected",
            ))
        })
    }

    /// Send a JSON-RPC request and wait for a response.
    ///
    /// Only meaningful for requests that carry an `id`.
    pub async fn send_and_receive(&mut self, request: &str) -> Result<String, Error> {
        self.send(request).await?;
        self.receive().await
    }
}

impl Transport for InMemory {
    async fn serve(mut self, dispatcher: Arc<RequestDispatcher>) -> Result<(), Error> {
        while let Some(request) = self.receiver.recv().await {
            let dispatcher = Arc::clone(&dispatcher);
            let sender = self.sender.clone();
            tokio::spawn(async move {
                if let Some(response) = dispatcher.call(&request).await {
                    if sender.send(response).await.is_err() {
                        debug!("Response receiver dropped");
                    }
                }
            });
        }

        debug!("In-memory sender disconnected, stopping transport");
        Ok(())
    }
}
