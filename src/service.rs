//! Service definitions and the immutable services built from them.
//!
//! A [`ServiceDefinition`] is what the application registers at startup: an
//! implementation type, the interfaces it implements, and its method table.
//! The builder turns definitions into [`Service`] entries once the service
//! name, exposed methods and advertised port are settled.

use std::collections::BTreeSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::host::HostResolver;
use crate::methods::{MethodDescriptor, MethodTable};

/// Version used when neither the definition nor the configuration names one.
pub const DEFAULT_VERSION: &str = "1.0";

const WILDCARD_HOST: &str = "0.0.0.0";

/// Wire protocol served on a port.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Protocol {
    #[default]
    Http,
    Tcp,
    Stdio,
}

impl fmt::Display for Protocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Protocol::Http => write!(f, "http"),
            Protocol::Tcp => write!(f, "tcp"),
            Protocol::Stdio => write!(f, "stdio"),
        }
    }
}

/// Host, port and protocol a service is reachable on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortBinding {
    host: String,
    port: u16,
    #[serde(default)]
    protocol: Protocol,
}

impl PortBinding {
    pub fn new(host: impl Into<String>, port: u16, protocol: Protocol) -> Self {
        Self {
            host: host.into(),
            port,
            protocol,
        }
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    pub fn protocol(&self) -> Protocol {
        self.protocol
    }

    pub fn is_wildcard(&self) -> bool {
        self.host == WILDCARD_HOST
    }

    /// The binding to publish in service metadata.
    ///
    /// A wildcard host is replaced by the resolver's concrete address; any
    /// other host is kept as is.
    pub fn advertised(&self, resolver: &dyn HostResolver) -> Result<Self, Error> {
        if !self.is_wildcard() {
            return Ok(self.clone());
        }
        let host = resolver.resolve()?;
        if host == WILDCARD_HOST {
            return Err(Error::HostResolution(
                "resolver returned the wildcard address".to_string(),
            ));
        }
        Ok(Self::new(host, self.port, self.protocol))
    }
}

impl fmt::Display for PortBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}://{}:{}", self.protocol, self.host, self.port)
    }
}

/// Which handler methods are callable when a definition lists none.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ExposurePolicy {
    /// Only methods named in the definition's `expose` list are callable.
    #[default]
    DefaultDeny,
    /// Every method not flagged as ignored is callable.
    DefaultAllow,
}

/// A service as registered by the application, before boot resolves it.
///
/// # Example
///
/// ```no_run
/// use json_rpc_host::{MethodTable, ServiceDefinition};
///
/// let definition = ServiceDefinition::new(
///     "app::calc::CalculatorServiceImpl",
///     MethodTable::new().add("add", ["a", "b"], |(a, b): (f64, f64)| async move { Ok(a + b) }),
/// )
/// .implements("app::calc::CalculatorService")
/// .expose(["add"]);
///
/// assert_eq!(definition.derive_name()?, "app.calc.CalculatorService");
/// # Ok::<(), json_rpc_host::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct ServiceDefinition {
    type_path: String,
    interfaces: Vec<String>,
    is_interface: bool,
    name: Option<String>,
    version: Option<String>,
    expose: Option<Vec<String>>,
    methods: Arc<MethodTable>,
}

impl ServiceDefinition {
    /// Define a service implemented by the type at `type_path`.
    pub fn new(type_path: impl Into<String>, methods: MethodTable) -> Self {
        Self {
            type_path: type_path.into(),
            interfaces: Vec::new(),
            is_interface: false,
            name: None,
            version: None,
            expose: None,
            methods: Arc::new(methods),
        }
    }

    /// Define a service from its implementation type.
    pub fn for_type<T: ?Sized>(methods: MethodTable) -> Self {
        Self::new(std::any::type_name::<T>(), methods)
    }

    /// Define a service whose type path is itself the interface.
    pub fn interface(path: impl Into<String>, methods: MethodTable) -> Self {
        Self {
            is_interface: true,
            ..Self::new(path, methods)
        }
    }

    /// Record an interface implemented by the handler type.
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.interfaces.push(interface.into());
        self
    }

    /// Record a trait implemented by the handler type, e.g. `dyn CalculatorService`.
    pub fn implements_trait<T: ?Sized>(self) -> Self {
        let path = std::any::type_name::<T>();
        self.implements(path.strip_prefix("dyn ").unwrap_or(path))
    }

    /// Set the service name explicitly instead of deriving it.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = Some(version.into());
        self
    }

    /// List the methods callable remotely. Overrides the exposure policy.
    pub fn expose<I, S>(mut self, methods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.expose = Some(methods.into_iter().map(Into::into).collect());
        self
    }

    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    pub fn methods(&self) -> &MethodTable {
        &self.methods
    }

    /// The registry key for this service.
    ///
    /// An explicit name wins. An interface definition uses its own path.
    /// Otherwise exactly one implemented interface must have a short name
    /// that is a prefix of the type's short name, or the other way round.
    pub fn derive_name(&self) -> Result<String, Error> {
        if let Some(name) = &self.name {
            return Ok(name.clone());
        }
        if self.is_interface {
            return Ok(dotted(&self.type_path));
        }

        let short = short_name(&self.type_path);
        let mut candidates = self.interfaces.iter().filter(|interface| {
            let interface_short = short_name(interface);
            short.starts_with(interface_short) || interface_short.starts_with(short)
        });

        match (candidates.next(), candidates.next()) {
            (Some(interface), None) => Ok(dotted(interface)),
            _ => Err(Error::AmbiguousServiceName(self.type_path.clone())),
        }
    }

    /// Settle the definition into a registry entry.
    ///
    /// Configuration values (`name`, `version`, `expose`) take precedence
    /// over the definition's own.
    pub(crate) fn into_service(
        self,
        overrides: Overrides,
        port: PortBinding,
        weight: u32,
        policy: ExposurePolicy,
    ) -> Result<Service, Error> {
        let name = match overrides.name {
            Some(name) => name,
            None => self.derive_name()?,
        };
        let version = overrides
            .version
            .or(self.version)
            .unwrap_or_else(|| DEFAULT_VERSION.to_string());

        let exposed = match overrides.expose.or(self.expose) {
            Some(listed) => {
                let mut exposed = BTreeSet::new();
                for method in listed {
                    if !self.methods.is_callable(&method) {
                        return Err(Error::UnknownMethod {
                            service: name,
                            method,
                        });
                    }
                    exposed.insert(method);
                }
                exposed
            }
            None => match policy {
                ExposurePolicy::DefaultAllow => self.methods.methods_of(),
                ExposurePolicy::DefaultDeny => BTreeSet::new(),
            },
        };
        if exposed.is_empty() {
            return Err(Error::NoExposedMethods(name));
        }

        Ok(Service {
            name,
            version,
            type_path: self.type_path,
            handler: self.methods,
            methods: exposed,
            port,
            weight,
        })
    }
}

/// Per-entry values from static configuration.
#[derive(Debug, Clone, Default)]
pub(crate) struct Overrides {
    pub name: Option<String>,
    pub version: Option<String>,
    pub expose: Option<Vec<String>>,
}

/// A registered service. Immutable for the lifetime of the server.
#[derive(Debug)]
pub struct Service {
    name: String,
    version: String,
    type_path: String,
    handler: Arc<MethodTable>,
    methods: BTreeSet<String>,
    port: PortBinding,
    weight: u32,
}

impl Service {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Implementation type the service was built from.
    pub fn type_path(&self) -> &str {
        &self.type_path
    }

    /// Exposed method names.
    pub fn methods(&self) -> &BTreeSet<String> {
        &self.methods
    }

    pub fn port(&self) -> &PortBinding {
        &self.port
    }

    pub fn weight(&self) -> u32 {
        self.weight
    }

    pub fn handler(&self) -> &MethodTable {
        &self.handler
    }

    /// Descriptor of an exposed method.
    pub fn method(&self, name: &str) -> Option<&MethodDescriptor> {
        if self.methods.contains(name) {
            self.handler.descriptor(name)
        } else {
            None
        }
    }
}

fn short_name(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

fn dotted(path: &str) -> String {
    path.replace("::", ".")
}
