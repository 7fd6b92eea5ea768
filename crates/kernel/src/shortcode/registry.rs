//! Shortcode registry - maps shortcode names to services.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use agnstk_sdk::Renderable;
use anyhow::{Context, bail};
use tracing::debug;

use crate::service::ServiceRegistry;

/// Registry of shortcode handlers.
///
/// Built once at startup from service capabilities and the `[shortcodes]`
/// table; read-only afterwards.
#[derive(Clone, Default)]
pub struct ShortcodeRegistry {
    handlers: BTreeMap<String, Arc<dyn Renderable>>,
}

impl ShortcodeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, replacing any previous one with the same name.
    pub fn register(mut self, name: impl Into<String>, handler: Arc<dyn Renderable>) -> Self {
        self.handlers.insert(name.into(), handler);
        self
    }

    /// Build the registry for a site.
    ///
    /// Services declaring a shortcode capability are registered first;
    /// entries in `table` (shortcode name -> service name) override them.
    pub fn from_services(
        services: &ServiceRegistry,
        table: &BTreeMap<String, String>,
    ) -> anyhow::Result<Self> {
        let mut registry = Self::new();

        for (service_name, capabilities) in services.capabilities() {
            let Some(shortcode) = capabilities.shortcode else {
                continue;
            };
            validate_name(&shortcode)
                .with_context(|| format!("service {service_name} declares a shortcode"))?;
            if let Some(service) = services.resolve(service_name) {
                debug!(shortcode = %shortcode, service = %service_name, "registered shortcode");
                registry = registry.register(shortcode, service);
            }
        }

        for (shortcode, service_name) in table {
            validate_name(shortcode).context("invalid entry in [shortcodes]")?;
            let service = services.resolve(service_name).with_context(|| {
                format!("shortcode {shortcode} refers to unknown service {service_name}")
            })?;
            debug!(shortcode = %shortcode, service = %service_name, "registered shortcode");
            registry = registry.register(shortcode.clone(), service);
        }

        Ok(registry)
    }

    /// Look up a handler.
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Renderable>> {
        self.handlers.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.handlers.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for ShortcodeRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ShortcodeRegistry")
            .field("shortcodes", &self.handlers.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Shortcode names are restricted to what the token grammar can match.
fn validate_name(name: &str) -> anyhow::Result<()> {
    if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        bail!("invalid shortcode name {name:?}");
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use agnstk_sdk::{RenderArgs, RenderError};

    struct Card;

    impl Renderable for Card {
        fn render(&self, _args: &RenderArgs) -> Result<String, RenderError> {
            Ok("<div class=\"card\"></div>".to_string())
        }
    }

    #[test]
    fn capabilities_register_shortcodes() {
        let services = ServiceRegistry::with_builtin();
        let registry = ShortcodeRegistry::from_services(&services, &BTreeMap::new()).unwrap();
        assert!(registry.contains("hello"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn table_entries_add_and_override() {
        let services = ServiceRegistry::with_builtin().register("Card", Card);
        let table = BTreeMap::from([
            ("card".to_string(), "Card".to_string()),
            ("hello".to_string(), "Card".to_string()),
        ]);
        let registry = ShortcodeRegistry::from_services(&services, &table).unwrap();
        assert_eq!(registry.names().collect::<Vec<_>>(), vec!["card", "hello"]);

        let hello = registry.get("hello").unwrap();
        assert_eq!(
            hello.render(&RenderArgs::new()).unwrap(),
            "<div class=\"card\"></div>"
        );
    }

    #[test]
    fn unknown_service_fails_at_boot() {
        let services = ServiceRegistry::new();
        let table = BTreeMap::from([("card".to_string(), "Missing".to_string())]);
        let err = ShortcodeRegistry::from_services(&services, &table).unwrap_err();
        assert!(err.to_string().contains("unknown service Missing"));
    }

    #[test]
    fn invalid_names_are_rejected() {
        let services = ServiceRegistry::new().register("Card", Card);
        let table = BTreeMap::from([("my-card".to_string(), "Card".to_string())]);
        assert!(ShortcodeRegistry::from_services(&services, &table).is_err());
        assert!(validate_name("card_2").is_ok());
        assert!(validate_name("").is_err());
    }

    #[test]
    fn empty_registry() {
        let registry = ShortcodeRegistry::new();
        assert!(registry.is_empty());
        assert!(registry.get("hello").is_none());
    }
}
