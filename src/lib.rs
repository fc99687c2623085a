//! A JSON-RPC 2.0 service host with a registry, dispatcher and middleware chain.
//!
//! This library hosts application services behind the JSON-RPC 2.0 protocol.
//! Services are registered at startup, the registry is frozen, and every
//! incoming message is dispatched to a `Service.method` target through an
//! ordered middleware chain. It handles message parsing, batches,
//! notifications and the standard error codes; the transport is brought by
//! the caller.
//!
//! # Architecture
//!
//! The library is organized into several modules:
//!
//! [`types`] contains JSON-RPC 2.0 message types including Request, Response,
//! ErrorObject and RequestId, along with the standard error codes.
//!
//! [`methods`] holds the per-service [`MethodTable`]: async handlers registered
//! with their ordered parameter names, and the parameter binding rules.
//!
//! [`service`] describes what the application registers ([`ServiceDefinition`])
//! and the immutable [`Service`] boot builds from it, including service name
//! derivation and method exposure.
//!
//! [`registry`] maps service names to services.
//!
//! [`middleware`] defines the [`Middleware`] trait, the [`MiddlewareChain`] and
//! the built-in request logger.
//!
//! [`dispatcher`] contains the [`RequestDispatcher`], which turns request bytes
//! into response bytes.
//!
//! [`config`] and [`server`] load the static TOML configuration and boot the
//! dispatcher from it with [`ServerBuilder`].
//!
//! [`transports`] defines the Transport trait and provides implementations.
//! The Stdio transport uses NDJSON over stdin/stdout, InMemory is useful for
//! testing, and Http (feature `axum`) serves POST requests.
//!
//! [`error`] defines the error type shared by handlers and boot.
//!
//! # Quick Start
//!
//! Define a service and serve it over stdio:
//!
//! ```no_run
//! use json_rpc_host::{MethodTable, ServerBuilder, ServerConfig, ServiceDefinition, Stdio};
//!
//! # async fn run() -> Result<(), json_rpc_host::Error> {
//! let calculator = ServiceDefinition::new(
//!     "calc::CalculatorServiceImpl",
//!     MethodTable::new()
//!         .add("add", ["a", "b"], |(a, b): (f64, f64)| async move { Ok(a + b) }),
//! )
//! .implements("calc::CalculatorService")
//! .expose(["add"]);
//!
//! ServerBuilder::new(ServerConfig::default())
//!     .discover(calculator)
//!     .serve(Stdio::new())
//!     .await
//! # }
//! ```
//!
//! The service is now reachable as `calc.CalculatorService`:
//!
//! ```json
//! {"jsonrpc":"2.0","method":"calc.CalculatorService.add","params":[1,2.1],"id":1}
//! ```
//!
//! # Error Handling
//!
//! Handlers return `Result<T, Error>`. Use [`Error::rpc`] for application
//! errors with specific codes; they reach the client unchanged. Any other
//! error, and any panic, is reported as `-32603 Internal error`.
//!
//! ```no_run
//! use json_rpc_host::{Error, MethodTable};
//!
//! let methods = MethodTable::new().add("divide", ["a", "b"], |(a, b): (f64, f64)| async move {
//!     if b == 0.0 {
//!         return Err(Error::rpc(-32000, "Division by zero"));
//!     }
//!     Ok(a / b)
//! });
//! ```
//!
//! # Batch Requests
//!
//! Batch arrays are processed element by element and answered with an array
//! of responses in request order. Notifications in a batch produce no entry.
//! With the Stdio transport a batch must fit on a single line.

pub use config::ServerConfig;
pub use dispatcher::RequestDispatcher;
pub use error::Error;
pub use host::{FixedHost, HostResolver, SystemHostResolver};
pub use methods::{MethodDescriptor, MethodTable};
pub use middleware::{Middleware, MiddlewareChain};
pub use registry::ServiceRegistry;
pub use server::ServerBuilder;
pub use service::{ExposurePolicy, PortBinding, Protocol, Service, ServiceDefinition};
#[cfg(feature = "axum")]
pub use transports::Http;
pub use transports::{InMemory, Stdio, Transport};
pub use types::{ErrorObject, Reply, Request, RequestId, Response};

#[cfg(feature = "axum")]
pub mod axum;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod host;
pub mod methods;
pub mod middleware;
pub mod registry;
pub mod server;
pub mod service;
pub mod transports;
pub mod types;
