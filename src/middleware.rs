//! Request/response interceptors.
//!
//! A [`MiddlewareChain`] is an ordered list of [`Middleware`] values built once
//! at boot. Each middleware receives the resolved [`Call`] and a [`Next`]
//! handle for the rest of the chain. It may answer on its own without calling
//! `next` (short-circuit), or await `next` and adjust the response
//! (post-processing). The first middleware registered runs outermost.
//!
//! # Example
//!
//! ```no_run
//! use json_rpc_host::middleware::{MiddlewareChain, RequestLog, from_fn};
//!
//! let chain = MiddlewareChain::new()
//!     .with(RequestLog)
//!     .with(from_fn(|call, next| {
//!         Box::pin(async move {
//!             let mut response = next.run(call).await;
//!             response.jsonrpc = "2.0".to_string();
//!             response
//!         })
//!     }));
//! assert_eq!(chain.len(), 2);
//! ```

use std::fmt;
use std::sync::Arc;
use std::time::Instant;

use futures::future::BoxFuture;
use tracing::{info, warn};

use crate::service::Service;
use crate::types::{Request, Response};

/// A validated request together with the service it targets.
#[derive(Debug, Clone)]
pub struct Call {
    /// The request as received. `request.method` is the full dotted name.
    pub request: Request,
    /// The resolved service.
    pub service: Arc<Service>,
    /// Method name within the service.
    pub method: String,
}

/// An interceptor wrapping the handler invocation.
pub trait Middleware: Send + Sync {
    fn handle<'a>(&'a self, call: Call, next: Next<'a>) -> BoxFuture<'a, Response>;
}

/// The innermost step of the chain: binds params and runs the handler.
pub(crate) trait Endpoint: Send + Sync {
    fn invoke<'a>(&'a self, call: Call) -> BoxFuture<'a, Response>;
}

/// The remainder of the chain after the current middleware.
pub struct Next<'a> {
    remaining: &'a [Arc<dyn Middleware>],
    endpoint: &'a dyn Endpoint,
}

impl<'a> Next<'a> {
    /// Run the rest of the chain and the handler.
    pub fn run(self, call: Call) -> BoxFuture<'a, Response> {
        match self.remaining.split_first() {
            Some((current, remaining)) => current.handle(
                call,
                Next {
                    remaining,
                    endpoint: self.endpoint,
                },
            ),
            None => self.endpoint.invoke(call),
        }
    }
}

/// Ordered list of middleware, outermost first.
#[derive(Clone, Default)]
pub struct MiddlewareChain {
    layers: Vec<Arc<dyn Middleware>>,
}

impl MiddlewareChain {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a middleware. It runs inside every middleware added before it.
    pub fn with<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.layers.push(Arc::new(middleware));
        self
    }

    pub fn push(&mut self, middleware: Arc<dyn Middleware>) {
        self.layers.push(middleware);
    }

    pub fn len(&self) -> usize {
        self.layers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub(crate) fn run<'a>(
        &'a self,
        call: Call,
        endpoint: &'a dyn Endpoint,
    ) -> BoxFuture<'a, Response> {
        Next {
            remaining: &self.layers,
            endpoint,
        }
        .run(call)
    }
}

impl fmt::Debug for MiddlewareChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MiddlewareChain")
            .field("layers", &self.layers.len())
            .finish()
    }
}

/// Middleware built from a closure, see [`from_fn`].
pub struct FromFn<F> {
    f: F,
}

/// Turn a closure into a middleware.
///
/// The closure receives the call and the rest of the chain and returns a
/// boxed future producing the response.
pub fn from_fn<F>(f: F) -> FromFn<F>
where
    F: for<'a> Fn(Call, Next<'a>) -> BoxFuture<'a, Response> + Send + Sync,
{
    FromFn { f }
}

impl<F> Middleware for FromFn<F>
where
    F: for<'a> Fn(Call, Next<'a>) -> BoxFuture<'a, Response> + Send + Sync,
{
    fn handle<'a>(&'a self, call: Call, next: Next<'a>) -> BoxFuture<'a, Response> {
        (self.f)(call, next)
    }
}

/// Logs one summary line per call.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequestLog;

impl RequestLog {
    /// Name under which boot registers this middleware.
    pub const NAME: &'static str = "request_log";
}

impl Middleware for RequestLog {
    fn handle<'a>(&'a self, call: Call, next: Next<'a>) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let method = call.request.method.clone();
            let id = call.request.id.clone();
            let version = call.service.version().to_string();
            let started_at = Instant::now();

            let response = next.run(call).await;
            let elapsed_ms = started_at.elapsed().as_millis();

            match &response.error {
                None => info!(
                    method = %method,
                    version = %version,
                    id = ?id,
                    duration_ms = elapsed_ms,
                    "rpc call"
                ),
                Some(error) => warn!(
                    method = %method,
                    version = %version,
                    id = ?id,
                    duration_ms = elapsed_ms,
                    code = error.code,
                    "rpc call failed"
                ),
            }

            response
        })
    }
}
