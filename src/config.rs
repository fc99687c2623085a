//! Static server configuration.
//!
//! The whole configuration is an explicit value handed to
//! [`ServerBuilder`](crate::ServerBuilder); there is no process-wide
//! accessor. It is usually read from a TOML document:
//!
//! ```toml
//! [server]
//! weight = 100
//! exposure = "default-deny"
//! middleware = ["request_log"]
//!
//! [[server.ports]]
//! host = "0.0.0.0"
//! port = 8000
//! protocol = "http"
//!
//! [dispatcher]
//! expose_error_details = true
//!
//! [logging]
//! level = "info"
//!
//! [services."calc.CalculatorService"]
//! class = "app::calc::CalculatorServiceImpl"
//! version = "2.0"
//! expose = ["add"]
//! ```
//!
//! `services` may also be an array of entries, in which case each entry
//! takes its name from `name` or derives it from the handler.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::service::{ExposurePolicy, PortBinding, Protocol};

/// Top-level configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Ports, weight, exposure and middleware.
    #[serde(default)]
    pub server: ServerSection,
    /// Dispatcher settings.
    #[serde(default)]
    pub dispatcher: DispatcherConfig,
    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Statically configured services.
    #[serde(default)]
    pub services: StaticServices,
}

impl ServerConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(|e| Error::Config(e.to_string()))
    }

    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, Error> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        Self::from_toml_str(&content)
    }

    /// The first configured port serving the server protocol.
    pub fn service_port(&self) -> Result<&PortBinding, Error> {
        self.server
            .ports
            .iter()
            .find(|port| port.protocol() == self.server.protocol)
            .ok_or_else(|| Error::PortNotFound(self.server.protocol.to_string()))
    }
}

/// Server-wide settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerSection {
    /// Protocol services are published on.
    #[serde(default)]
    pub protocol: Protocol,
    /// Load-balancing weight published with every service.
    #[serde(default = "default_weight")]
    pub weight: u32,
    /// Method exposure when a service lists no methods.
    #[serde(default)]
    pub exposure: ExposurePolicy,
    /// Middleware names, outermost first.
    #[serde(default)]
    pub middleware: Vec<String>,
    /// Listening ports.
    #[serde(default = "default_ports")]
    pub ports: Vec<PortBinding>,
    /// Address published instead of a wildcard bind host.
    #[serde(default)]
    pub advertised_host: Option<String>,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            protocol: Protocol::default(),
            weight: default_weight(),
            exposure: ExposurePolicy::default(),
            middleware: Vec::new(),
            ports: default_ports(),
            advertised_host: None,
        }
    }
}

fn default_weight() -> u32 {
    100
}

fn default_ports() -> Vec<PortBinding> {
    vec![PortBinding::new("127.0.0.1", 8000, Protocol::Http)]
}

/// Dispatcher settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DispatcherConfig {
    /// Attach the original message of untyped handler failures as error data.
    #[serde(default = "default_expose_error_details")]
    pub expose_error_details: bool,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            expose_error_details: default_expose_error_details(),
        }
    }
}

fn default_expose_error_details() -> bool {
    true
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    /// Log level filter (e.g. "info", "debug", "json_rpc_host=trace").
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Statically configured services, keyed by name or listed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticServices {
    Named(BTreeMap<String, StaticService>),
    Listed(Vec<StaticService>),
}

impl Default for StaticServices {
    fn default() -> Self {
        StaticServices::Listed(Vec::new())
    }
}

impl StaticServices {
    /// Entries in application order, each with its table key if any.
    pub fn entries(&self) -> Vec<(Option<&str>, StaticServiceEntry)> {
        match self {
            StaticServices::Named(named) => named
                .iter()
                .map(|(name, service)| (Some(name.as_str()), service.entry()))
                .collect(),
            StaticServices::Listed(listed) => {
                listed.iter().map(|service| (None, service.entry())).collect()
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        match self {
            StaticServices::Named(named) => named.is_empty(),
            StaticServices::Listed(listed) => listed.is_empty(),
        }
    }
}

/// A static service: either just the handler class or a full table.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StaticService {
    Class(String),
    Detailed(StaticServiceEntry),
}

impl StaticService {
    pub fn entry(&self) -> StaticServiceEntry {
        match self {
            StaticService::Class(class) => StaticServiceEntry {
                class: class.clone(),
                name: None,
                version: None,
                expose: None,
            },
            StaticService::Detailed(entry) => entry.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StaticServiceEntry {
    /// Implementation type path of a provided handler.
    pub class: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub expose: Option<Vec<String>>,
}
