//! Server boot.
//!
//! This module provides the `ServerBuilder`, which wires explicitly registered
//! service definitions, static configuration and middleware into a
//! [`RequestDispatcher`]. Boot is fail-fast: any misconfigured service or
//! middleware aborts it with an error instead of being skipped.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::dispatcher::RequestDispatcher;
use crate::error::Error;
use crate::host::{FixedHost, HostResolver, SystemHostResolver};
use crate::middleware::{Middleware, MiddlewareChain, RequestLog};
use crate::registry::ServiceRegistry;
use crate::service::{Overrides, PortBinding, ServiceDefinition};
use crate::transports::Transport;

/// Builder for a JSON-RPC server.
///
/// Services are added in two ways. [`discover`](Self::discover) registers a
/// definition unconditionally; two discovered definitions with the same
/// service name abort boot. [`provide`](Self::provide) only makes a handler
/// available to the `services` section of the configuration, which then
/// registers it. Configured services are applied after discovered ones and
/// replace any service with the same name.
///
/// # Example
///
/// ```no_run
/// use json_rpc_host::{MethodTable, ServerBuilder, ServerConfig, ServiceDefinition, Stdio};
///
/// # async fn run() -> Result<(), json_rpc_host::Error> {
/// let config = ServerConfig::load("server.toml")?;
/// let echo = ServiceDefinition::new(
///     "app::EchoServiceImpl",
///     MethodTable::new().add("echo", ["text"], |(text,): (String,)| async move { Ok(text) }),
/// )
/// .implements("app::EchoService")
/// .expose(["echo"]);
///
/// ServerBuilder::new(config)
///     .discover(echo)
///     .serve(Stdio::new())
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ServerBuilder {
    config: ServerConfig,
    discovered: Vec<ServiceDefinition>,
    provided: HashMap<String, ServiceDefinition>,
    middleware: HashMap<String, Arc<dyn Middleware>>,
    layers: Vec<Arc<dyn Middleware>>,
    resolver: Option<Box<dyn HostResolver>>,
}

impl ServerBuilder {
    /// Create a builder for the given configuration.
    ///
    /// The `request_log` middleware is always available by name.
    pub fn new(config: ServerConfig) -> Self {
        let mut middleware: HashMap<String, Arc<dyn Middleware>> = HashMap::new();
        middleware.insert(RequestLog::NAME.to_string(), Arc::new(RequestLog));

        Self {
            config,
            discovered: Vec::new(),
            provided: HashMap::new(),
            middleware,
            layers: Vec::new(),
            resolver: None,
        }
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    /// Register a service definition.
    ///
    /// The handler also becomes available to static configuration.
    pub fn discover(mut self, definition: ServiceDefinition) -> Self {
        self.provided
            .insert(definition.type_path().to_string(), definition.clone());
        self.discovered.push(definition);
        self
    }

    /// Make a handler available to static configuration without registering it.
    pub fn provide(mut self, definition: ServiceDefinition) -> Self {
        self.provided
            .insert(definition.type_path().to_string(), definition);
        self
    }

    /// Make a middleware available under `name` for `server.middleware`.
    pub fn middleware<M>(mut self, name: impl Into<String>, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.middleware.insert(name.into(), Arc::new(middleware));
        self
    }

    /// Append a middleware after the configured ones.
    pub fn layer<M>(mut self, middleware: M) -> Self
    where
        M: Middleware + 'static,
    {
        self.layers.push(Arc::new(middleware));
        self
    }

    /// Replace the resolver used for wildcard bind hosts.
    pub fn host_resolver<R>(mut self, resolver: R) -> Self
    where
        R: HostResolver + 'static,
    {
        self.resolver = Some(Box::new(resolver));
        self
    }

    /// The port binding published with every service.
    pub fn advertised_port(&self) -> Result<PortBinding, Error> {
        let port = self.config.service_port()?;
        match (&self.resolver, &self.config.server.advertised_host) {
            (Some(resolver), _) => port.advertised(resolver.as_ref()),
            (None, Some(host)) => port.advertised(&FixedHost::new(host.clone())),
            (None, None) => port.advertised(&SystemHostResolver),
        }
    }

    /// Build the service registry.
    pub fn build_registry(&self) -> Result<ServiceRegistry, Error> {
        let port = self.advertised_port()?;
        let weight = self.config.server.weight;
        let policy = self.config.server.exposure;
        let mut registry = ServiceRegistry::new();

        for definition in &self.discovered {
            let service = definition.clone().into_service(
                Overrides::default(),
                port.clone(),
                weight,
                policy,
            )?;
            debug!("Discovered service {} ({})", service.name(), service.type_path());
            registry.register(service)?;
        }

        for (key, entry) in self.config.services.entries() {
            let definition = self
                .provided
                .get(&entry.class)
                .ok_or_else(|| Error::UnknownHandler(entry.class.clone()))?;
            let overrides = Overrides {
                name: key.map(str::to_string).or(entry.name),
                version: entry.version,
                expose: entry.expose,
            };
            let service = definition
                .clone()
                .into_service(overrides, port.clone(), weight, policy)?;
            let name = service.name().to_string();
            if let Some(previous) = registry.replace(service) {
                warn!(
                    "Configured service {} replaces {} (version {})",
                    name,
                    previous.type_path(),
                    previous.version()
                );
            }
        }

        Ok(registry)
    }

    /// Build the middleware chain: configured names first, then layers.
    pub fn build_middleware(&self) -> Result<MiddlewareChain, Error> {
        let mut chain = MiddlewareChain::new();
        for name in &self.config.server.middleware {
            let middleware = self
                .middleware
                .get(name)
                .ok_or_else(|| Error::UnknownMiddleware(name.clone()))?;
            chain.push(Arc::clone(middleware));
        }
        for layer in &self.layers {
            chain.push(Arc::clone(layer));
        }
        Ok(chain)
    }

    /// Build the dispatcher.
    pub fn build(self) -> Result<RequestDispatcher, Error> {
        let registry = self.build_registry()?;
        let middleware = self.build_middleware()?;

        for service in registry.services() {
            info!(
                service = service.name(),
                version = service.version(),
                port = %service.port(),
                weight = service.weight(),
                methods = ?service.methods(),
                "Registered JSON-RPC service"
            );
        }

        Ok(RequestDispatcher::new(
            registry,
            middleware,
            self.config.dispatcher.clone(),
        ))
    }

    /// Build the dispatcher and serve it on `transport`.
    pub async fn serve<T>(self, transport: T) -> Result<(), Error>
    where
        T: Transport,
    {
        let dispatcher = Arc::new(self.build()?);
        transport.serve(dispatcher).await
    }
}
