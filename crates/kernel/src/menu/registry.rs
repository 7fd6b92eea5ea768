//! Menu registry - groups menu items by menu id.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::debug;

/// A navigation link to a page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MenuItem {
    /// Menu this item belongs to.
    pub menu_id: String,
    /// Page the item links to.
    pub page_id: String,
    /// Link text.
    pub label: String,
    /// Link target.
    pub uri: String,
    /// Sort weight (lower = earlier).
    pub order: i32,
    /// The target page requires login.
    pub auth_required: bool,
}

/// Menu items grouped by menu id, each menu sorted by order then label.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(transparent)]
pub struct MenuRegistry {
    menus: BTreeMap<String, Vec<MenuItem>>,
}

impl MenuRegistry {
    /// Create an empty menu registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from items in any order.
    pub fn from_items(items: impl IntoIterator<Item = MenuItem>) -> Self {
        let mut registry = Self::new();
        for item in items {
            registry.register(item);
        }
        registry.sort();
        debug!(menus = registry.menus.len(), items = registry.len(), "built menus");
        registry
    }

    /// Add an item. Call [`sort`](Self::sort) once all items are in.
    pub fn register(&mut self, item: MenuItem) {
        self.menus.entry(item.menu_id.clone()).or_default().push(item);
    }

    /// Sort every menu by order, then label.
    pub fn sort(&mut self) {
        for items in self.menus.values_mut() {
            items.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.label.cmp(&b.label)));
        }
    }

    /// Items of one menu, in display order.
    pub fn menu(&self, menu_id: &str) -> &[MenuItem] {
        self.menus.get(menu_id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Menu ids, sorted.
    pub fn menu_ids(&self) -> impl Iterator<Item = &str> {
        self.menus.keys().map(String::as_str)
    }

    /// All items, menu by menu.
    pub fn all(&self) -> impl Iterator<Item = &MenuItem> {
        self.menus.values().flatten()
    }

    /// Get item count.
    pub fn len(&self) -> usize {
        self.menus.values().map(Vec::len).sum()
    }

    /// Check if registry is empty.
    pub fn is_empty(&self) -> bool {
        self.menus.is_empty()
    }
}
