//! JSON-RPC request dispatcher.
//!
//! This module provides the `RequestDispatcher`, which turns raw request bytes
//! into raw response bytes. Each request moves through the same stages:
//! parse, validate, resolve the `Service.method` target in the registry, run
//! the middleware chain around the handler, and serialize the response.
//! Any stage can fail and short-circuit to an error response. Notifications
//! run to completion but never produce a response.

use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use futures::FutureExt;
use futures::future::{BoxFuture, join_all};
use serde_json::Value;
use tracing::{debug, error};

use crate::config::DispatcherConfig;
use crate::error::Error;
use crate::middleware::{Call, Endpoint, MiddlewareChain};
use crate::registry::ServiceRegistry;
use crate::types::{ErrorObject, Reply, Request, RequestId, Response};

/// Dispatches JSON-RPC requests to registered services.
///
/// The dispatcher owns a frozen registry and middleware chain, so a single
/// instance behind an `Arc` can serve any number of concurrent requests.
///
/// # Example
///
/// ```no_run
/// use json_rpc_host::{MethodTable, RequestDispatcher, ServerBuilder, ServerConfig, ServiceDefinition};
///
/// let definition = ServiceDefinition::new(
///     "app::CalculatorServiceImpl",
///     MethodTable::new().add("add", ["a", "b"], |(a, b): (f64, f64)| async move { Ok(a + b) }),
/// )
/// .implements("app::CalculatorService")
/// .expose(["add"]);
///
/// let dispatcher: RequestDispatcher = ServerBuilder::new(ServerConfig::default())
///     .discover(definition)
///     .build()?;
///
/// # tokio::runtime::Runtime::new().unwrap().block_on(async {
/// let response = dispatcher
///     .call(r#"{"jsonrpc":"2.0","id":1,"method":"app.CalculatorService.add","params":[1,2.1]}"#)
///     .await;
/// assert_eq!(response.as_deref(), Some(r#"{"jsonrpc":"2.0","id":1,"result":3.1}"#));
/// # });
/// # Ok::<(), json_rpc_host::Error>(())
/// ```
#[derive(Debug)]
pub struct RequestDispatcher {
    registry: Arc<ServiceRegistry>,
    middleware: MiddlewareChain,
    config: DispatcherConfig,
}

impl RequestDispatcher {
    pub fn new(
        registry: impl Into<Arc<ServiceRegistry>>,
        middleware: MiddlewareChain,
        config: DispatcherConfig,
    ) -> Self {
        Self {
            registry: registry.into(),
            middleware,
            config,
        }
    }

    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    pub fn middleware(&self) -> &MiddlewareChain {
        &self.middleware
    }

    /// Process raw request bytes and return the raw response, if any.
    ///
    /// Returns `None` for notifications and for batches made only of
    /// notifications.
    pub async fn dispatch(&self, raw: &[u8]) -> Option<Vec<u8>> {
        let reply = match serde_json::from_slice::<Value>(raw) {
            Ok(value) => self.handle_value(value).await?,
            Err(e) => {
                debug!("Failed to parse request body: {}", e);
                Reply::Single(Response::error(
                    RequestId::Null,
                    ErrorObject::parse_error("Parse error"),
                ))
            }
        };

        match serde_json::to_vec(&reply) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                error!("Failed to serialize response: {}", e);
                None
            }
        }
    }

    /// Process a JSON-RPC message string and return the response string, if any.
    pub async fn call(&self, json_str: &str) -> Option<String> {
        let bytes = self.dispatch(json_str.as_bytes()).await?;
        match String::from_utf8(bytes) {
            Ok(s) => Some(s),
            Err(e) => {
                error!("Response is not valid UTF-8: {}", e);
                None
            }
        }
    }

    /// Process an already decoded message, single or batch.
    pub async fn handle_value(&self, value: Value) -> Option<Reply> {
        match value {
            Value::Array(items) => self.handle_batch(items).await,
            single => self.handle_single(single).await.map(Reply::Single),
        }
    }

    async fn handle_batch(&self, items: Vec<Value>) -> Option<Reply> {
        if items.is_empty() {
            return Some(Reply::Single(Response::error(
                RequestId::Null,
                ErrorObject::invalid_request("Invalid Request"),
            )));
        }

        debug!("Processing batch of {} messages", items.len());
        let responses: Vec<Response> =
            join_all(items.into_iter().map(|item| self.handle_single(item)))
                .await
                .into_iter()
                .flatten()
                .collect();

        if responses.is_empty() {
            debug!("Batch contains only notifications - no response sent");
            None
        } else {
            Some(Reply::Batch(responses))
        }
    }

    /// Process one request object.
    async fn handle_single(&self, value: Value) -> Option<Response> {
        let request = match Request::from_value(value) {
            Ok(request) => request,
            Err(rejected) => {
                debug!("Invalid Request: {}", rejected.reason);
                return Some(Response::error(
                    rejected.id,
                    ErrorObject::invalid_request("Invalid Request"),
                ));
            }
        };

        let id = request.id.clone();
        let call = match self.resolve(request) {
            Ok(call) => call,
            Err(response) => return id.map(|_| response),
        };

        let method = call.request.method.clone();
        let chain = AssertUnwindSafe(self.middleware.run(call, self));
        let mut response = match chain.catch_unwind().await {
            Ok(response) => response,
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                error!("Middleware for {} panicked: {}", method, message);
                Response::error(RequestId::Null, self.panic_error(message))
            }
        };

        if let Err(reason) = response.validate() {
            error!("Middleware produced a malformed response: {}", reason);
            response = Response::error(
                RequestId::Null,
                ErrorObject::internal_error("Internal error"),
            );
        }

        match id {
            Some(id) => {
                response.id = id;
                Some(response)
            }
            None => {
                debug!("Notification processed - no response needed");
                None
            }
        }
    }

    /// The internal error reported for a panic, with its message as data when
    /// error details are exposed.
    fn panic_error(&self, message: String) -> ErrorObject {
        let object = ErrorObject::internal_error("Internal error");
        if self.config.expose_error_details {
            object.with_data(Value::String(message))
        } else {
            object
        }
    }

    /// Locate the service and exposed method named by `request.method`.
    ///
    /// The method name is everything after the last dot; service names may
    /// themselves contain dots.
    fn resolve(&self, request: Request) -> Result<Call, Response> {
        let not_found = |request: &Request| {
            Response::error(
                request.id.clone().unwrap_or(RequestId::Null),
                ErrorObject::method_not_found(format!("Unknown method: {}", request.method)),
            )
        };

        let Some((service_name, method)) = request.method.rsplit_once('.') else {
            return Err(not_found(&request));
        };

        let service = match self.registry.resolve(service_name) {
            Ok(service) => Arc::clone(service),
            Err(e) => {
                debug!("{}", e);
                return Err(not_found(&request));
            }
        };

        if service.method(method).is_none() {
            debug!("Service {} does not expose {}", service_name, method);
            return Err(not_found(&request));
        }

        let method = method.to_string();
        Ok(Call {
            request,
            service,
            method,
        })
    }
}

impl Endpoint for RequestDispatcher {
    fn invoke<'a>(&'a self, call: Call) -> BoxFuture<'a, Response> {
        Box::pin(async move {
            let id = call.request.id.clone().unwrap_or(RequestId::Null);
            let Some(invocation) = call
                .service
                .handler()
                .invoke(&call.method, call.request.params.clone())
            else {
                let message = format!("Unknown method: {}", call.request.method);
                return Response::error(id, ErrorObject::method_not_found(message));
            };

            match AssertUnwindSafe(invocation).catch_unwind().await {
                Ok(Ok(result)) => Response::success(id, result),
                Ok(Err(e)) => {
                    match &e {
                        Error::RpcError { .. } | Error::InvalidParams(_) => {
                            debug!("Handler {} returned error: {}", call.request.method, e)
                        }
                        _ => error!("Handler {} failed: {}", call.request.method, e),
                    }
                    Response::error(id, e.into_error_object(self.config.expose_error_details))
                }
                Err(panic) => {
                    let message = panic_message(panic.as_ref());
                    error!("Handler {} panicked: {}", call.request.method, message);
                    Response::error(id, self.panic_error(message))
                }
            }
        })
    }
}

fn panic_message(panic: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "handler panicked".to_string()
    }
}
