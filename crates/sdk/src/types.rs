//! Capability declarations shared between services and the kernel.

use serde::{Deserialize, Serialize};

/// Menu identifier used when a declaration does not name one.
pub const DEFAULT_MENU_ID: &str = "main";

/// Sort order used when a declaration does not set one.
pub const DEFAULT_MENU_ORDER: i32 = 10;

/// A resolved menu entry declaration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuConfig {
    /// Menu this entry belongs to (e.g., "main", "user").
    pub menu_id: String,
    /// Link text.
    pub label: String,
    /// Sort weight (lower = earlier).
    pub order: i32,
    /// Whether the entry is shown at all.
    pub enabled: bool,
}

impl MenuConfig {
    /// Create an enabled entry in the default menu with the default order.
    pub fn new(label: impl Into<String>) -> Self {
        Self {
            menu_id: DEFAULT_MENU_ID.to_string(),
            label: label.into(),
            order: DEFAULT_MENU_ORDER,
            enabled: true,
        }
    }

    pub fn in_menu(mut self, menu_id: impl Into<String>) -> Self {
        self.menu_id = menu_id.into();
        self
    }

    pub fn order(mut self, order: i32) -> Self {
        self.order = order;
        self
    }

    pub fn disabled(mut self) -> Self {
        self.enabled = false;
        self
    }
}

/// What a service provides beyond rendering itself.
///
/// The kernel reads this once at startup: a `shortcode` name is added to the
/// shortcode registry, a `uri` becomes a routable page, and a `menu` entry is
/// attached to that page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Capabilities {
    #[serde(default)]
    pub shortcode: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub menu: Option<MenuConfig>,
}

impl Capabilities {
    pub fn shortcode(mut self, name: impl Into<String>) -> Self {
        self.shortcode = Some(name.into());
        self
    }

    pub fn uri(mut self, uri: impl Into<String>) -> Self {
        self.uri = Some(uri.into());
        self
    }

    pub fn menu(mut self, menu: MenuConfig) -> Self {
        self.menu = Some(menu);
        self
    }

    /// True when the service declares nothing beyond being renderable.
    pub fn is_empty(&self) -> bool {
        self.shortcode.is_none() && self.uri.is_none() && self.menu.is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_config_defaults() {
        let menu = MenuConfig::new("Hello");
        assert_eq!(menu.menu_id, "main");
        assert_eq!(menu.order, 10);
        assert!(menu.enabled);
    }

    #[test]
    fn capabilities_builder() {
        let caps = Capabilities::default()
            .shortcode("hello")
            .uri("/hello")
            .menu(MenuConfig::new("Hello").order(20));
        assert_eq!(caps.shortcode.as_deref(), Some("hello"));
        assert_eq!(caps.uri.as_deref(), Some("/hello"));
        assert_eq!(caps.menu.map(|m| m.order), Some(20));
    }

    #[test]
    fn empty_capabilities() {
        assert!(Capabilities::default().is_empty());
        assert!(!Capabilities::default().shortcode("x").is_empty());
    }
}
