//! Startup-time service registry.
//!
//! Feature modules publish collaborators into a [`RegistryBuilder`] while the
//! process boots. Freezing the builder yields a read-only [`ServiceRegistry`]
//! that can be shared across request tasks without locking.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{AppError, AppResult};

type Entry = Arc<dyn Any + Send + Sync>;

/// Mutable registry used during startup only.
#[derive(Default)]
pub struct RegistryBuilder {
    entries: HashMap<String, Entry>,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `service` under `name`, replacing any previous entry.
    pub fn provide<T>(&mut self, name: &str, service: Arc<T>) -> &mut Self
    where
        T: Send + Sync + 'static,
    {
        self.entries.insert(name.to_string(), service);
        self
    }

    /// Freezes the registry.
    #[must_use]
    pub fn build(self) -> ServiceRegistry {
        ServiceRegistry {
            entries: Arc::new(self.entries),
        }
    }
}

/// Read-only lookup table of process-wide collaborators.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    entries: Arc<HashMap<String, Entry>>,
}

impl std::fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&String> = self.entries.keys().collect();
        names.sort();
        f.debug_struct("ServiceRegistry").field("entries", &names).finish()
    }
}

impl ServiceRegistry {
    /// Looks up `name` and downcasts it to `T`.
    #[must_use]
    pub fn get<T>(&self, name: &str) -> Option<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.entries
            .get(name)
            .cloned()
            .and_then(|entry| entry.downcast::<T>().ok())
    }

    /// Like [`ServiceRegistry::get`] but reports a missing wiring as `internal`.
    pub fn require<T>(&self, name: &str) -> AppResult<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        self.get(name)
            .ok_or_else(|| AppError::internal(format!("service `{name}` is not registered")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, PartialEq)]
    struct Greeter(&'static str);

    #[test]
    fn test_lookup_by_name_and_type() {
        let mut builder = RegistryBuilder::new();
        builder.provide("greeter", Arc::new(Greeter("hi")));
        let registry = builder.build();

        assert_eq!(registry.get::<Greeter>("greeter").as_deref(), Some(&Greeter("hi")));
        assert!(registry.get::<String>("greeter").is_none());
        assert!(registry.get::<Greeter>("missing").is_none());
    }

    #[test]
    fn test_require_reports_internal() {
        let registry = RegistryBuilder::new().build();
        let err = registry.require::<Greeter>("greeter").unwrap_err();
        assert!(err.is_internal());
    }
}
