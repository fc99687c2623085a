//! Service registry.
//!
//! The registry maps service names to [`Service`] entries. It is filled once
//! during boot and then frozen behind an `Arc`; dispatch only ever reads it,
//! so lookups need no locking.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::Error;
use crate::service::Service;

#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Arc<Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a service under its name. Fails if the name is already bound.
    pub fn register(&mut self, service: Service) -> Result<(), Error> {
        if self.services.contains_key(service.name()) {
            return Err(Error::DuplicateService(service.name().to_string()));
        }
        self.services
            .insert(service.name().to_string(), Arc::new(service));
        Ok(())
    }

    /// Bind a service, replacing whatever was bound under the same name.
    ///
    /// Returns the replaced service.
    pub fn replace(&mut self, service: Service) -> Option<Arc<Service>> {
        self.services
            .insert(service.name().to_string(), Arc::new(service))
    }

    pub fn resolve(&self, name: &str) -> Result<&Arc<Service>, Error> {
        self.services
            .get(name)
            .ok_or_else(|| Error::ServiceNotFound(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Registered service names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn services(&self) -> impl Iterator<Item = &Arc<Service>> {
        self.services.values()
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::methods::MethodTable;
    use crate::service::{ExposurePolicy, Overrides, PortBinding, Protocol, ServiceDefinition};

    fn service(name: &str, version: &str) -> Service {
        ServiceDefinition::new(
            "app::Echo",
            MethodTable::new().add("echo", ["text"], |(text,): (String,)| async move {
                Ok(text)
            }),
        )
        .name(name)
        .version(version)
        .into_service(
            Overrides::default(),
            PortBinding::new("127.0.0.1", 8000, Protocol::Http),
            100,
            ExposurePolicy::DefaultAllow,
        )
        .unwrap()
    }

    #[test]
    fn register_then_resolve() {
        let mut registry = ServiceRegistry::new();
        registry.register(service("echo", "1.0")).unwrap();

        let resolved = registry.resolve("echo").unwrap();
        assert_eq!(resolved.name(), "echo");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn duplicate_registration_fails() {
        let mut registry = ServiceRegistry::new();
        registry.register(service("echo", "1.0")).unwrap();

        let result = registry.register(service("echo", "2.0"));
        assert!(matches!(result, Err(Error::DuplicateService(name)) if name == "echo"));
        assert_eq!(registry.resolve("echo").unwrap().version(), "1.0");
    }

    #[test]
    fn replace_is_last_write_wins() {
        let mut registry = ServiceRegistry::new();
        registry.register(service("echo", "1.0")).unwrap();

        let previous = registry.replace(service("echo", "2.0"));
        assert_eq!(previous.unwrap().version(), "1.0");
        assert_eq!(registry.resolve("echo").unwrap().version(), "2.0");
    }

    #[test]
    fn unknown_service_is_not_found() {
        let registry = ServiceRegistry::new();
        assert!(matches!(
            registry.resolve("missing"),
            Err(Error::ServiceNotFound(name)) if name == "missing"
        ));
    }

    #[test]
    fn names_are_sorted() {
        let mut registry = ServiceRegistry::new();
        registry.register(service("b", "1.0")).unwrap();
        registry.register(service("a", "1.0")).unwrap();
        assert_eq!(registry.names(), vec!["a", "b"]);
    }
}
