//! Transport implementations for JSON-RPC 2.0 communication.
//!
//! Transports own the framing and feed raw request bytes to a shared
//! [`RequestDispatcher`](crate::RequestDispatcher). All transports implement
//! the common [`Transport`] trait, making them interchangeable.

#[cfg(feature = "axum")]
pub use http::Http;
pub use in_memory::InMemory;
pub use stdio::Stdio;
pub use transport::Transport;

#[cfg(feature = "axum")]
pub mod http;
pub mod in_memory;
pub mod stdio;
pub mod transport;
