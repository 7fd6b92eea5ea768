//! Service registry - maps service names to render implementations.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use agnstk_sdk::{Capabilities, Renderable};

use super::HelloService;

/// Registry of named services.
///
/// Built once at startup; request handling only ever reads it.
#[derive(Clone, Default)]
pub struct ServiceRegistry {
    services: BTreeMap<String, Arc<dyn Renderable>>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the services that ship with the kernel.
    pub fn with_builtin() -> Self {
        Self::new().register("HelloService", HelloService)
    }

    /// Register a service under `name`, replacing any previous entry.
    pub fn register(self, name: impl Into<String>, service: impl Renderable + 'static) -> Self {
        self.register_arc(name, Arc::new(service))
    }

    /// Register an already shared service.
    pub fn register_arc(mut self, name: impl Into<String>, service: Arc<dyn Renderable>) -> Self {
        self.services.insert(name.into(), service);
        self
    }

    /// Look up a service by name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Renderable>> {
        self.services.get(name).cloned()
    }

    /// Check if a service is registered.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.services.keys().map(String::as_str)
    }

    /// Each service's name with its declared capabilities.
    pub fn capabilities(&self) -> impl Iterator<Item = (&str, Capabilities)> {
        self.services
            .iter()
            .map(|(name, service)| (name.as_str(), service.describe()))
    }

    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }
}

impl fmt::Debug for ServiceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServiceRegistry")
            .field("services", &self.services.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use agnstk_sdk::{RenderArgs, RenderError};

    struct Static(&'static str);

    impl Renderable for Static {
        fn render(&self, _args: &RenderArgs) -> Result<String, RenderError> {
            Ok(self.0.to_string())
        }
    }

    #[test]
    fn empty_registry() {
        let registry = ServiceRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.resolve("HelloService").is_none());
    }

    #[test]
    fn builtin_services() {
        let registry = ServiceRegistry::with_builtin();
        assert!(registry.contains("HelloService"));
        let caps: Vec<_> = registry.capabilities().collect();
        assert_eq!(caps.len(), 1);
        assert_eq!(caps[0].1.shortcode.as_deref(), Some("hello"));
    }

    #[test]
    fn register_and_resolve() {
        let registry = ServiceRegistry::new()
            .register("B", Static("b"))
            .register("A", Static("a"));
        assert_eq!(registry.len(), 2);
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["A", "B"]);
        let a = registry.resolve("A").unwrap();
        assert_eq!(a.render(&RenderArgs::new()).unwrap(), "a");
    }

    #[test]
    fn later_registration_replaces() {
        let registry = ServiceRegistry::new()
            .register("A", Static("first"))
            .register("A", Static("second"));
        assert_eq!(registry.len(), 1);
        let a = registry.resolve("A").unwrap();
        assert_eq!(a.render(&RenderArgs::new()).unwrap(), "second");
    }
}
