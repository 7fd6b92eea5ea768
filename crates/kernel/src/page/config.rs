//! Page definitions and their resolved form.

use std::collections::BTreeMap;

use agnstk_sdk::MenuConfig;
use agnstk_sdk::types::{DEFAULT_MENU_ID, DEFAULT_MENU_ORDER};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::auth::AuthState;
use crate::content::{BlockOptions, ContentSource, TextFormat};

/// When a page is enabled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EnabledRule {
    Always,
    LoggedIn,
    LoggedOut,
    /// Enabled for everyone, but viewing requires login.
    AuthRequired,
    Disabled,
}

impl EnabledRule {
    /// Parse a rule name. Unknown names disable the page.
    pub fn from_name(name: &str) -> Self {
        match name {
            "logged_in" => EnabledRule::LoggedIn,
            "logged_out" | "guest" => EnabledRule::LoggedOut,
            "auth_required" => EnabledRule::AuthRequired,
            other => {
                warn!(rule = %other, "unrecognised enabled rule, page disabled");
                EnabledRule::Disabled
            }
        }
    }

    /// Evaluate against the current user.
    pub fn is_enabled(&self, auth: &dyn AuthState) -> bool {
        match self {
            EnabledRule::Always | EnabledRule::AuthRequired => true,
            EnabledRule::LoggedIn => auth.is_logged_in(),
            EnabledRule::LoggedOut => !auth.is_logged_in(),
            EnabledRule::Disabled => false,
        }
    }
}

/// The `enabled` key: a bool or a rule name.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum EnabledValue {
    Flag(bool),
    Rule(String),
}

impl EnabledValue {
    pub fn rule(&self) -> EnabledRule {
        match self {
            EnabledValue::Flag(true) => EnabledRule::Always,
            EnabledValue::Flag(false) => EnabledRule::Disabled,
            EnabledValue::Rule(name) => EnabledRule::from_name(name),
        }
    }
}

/// The `menu` key: a bool, a menu id, or a table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum MenuValue {
    Flag(bool),
    Menu(String),
    Table(MenuTable),
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MenuTable {
    pub menu_id: Option<String>,
    pub label: Option<String>,
    pub order: Option<i32>,
    pub enabled: Option<bool>,
}

impl MenuValue {
    /// Fill in defaults: label from the title, and enabled from
    /// `auth_required` when the table does not say.
    pub fn resolve(&self, title: &str, auth_required: bool) -> MenuConfig {
        let table = match self {
            MenuValue::Flag(enabled) => MenuTable {
                enabled: Some(*enabled),
                ..MenuTable::default()
            },
            MenuValue::Menu(menu_id) => MenuTable {
                menu_id: Some(menu_id.clone()),
                enabled: Some(true),
                ..MenuTable::default()
            },
            MenuValue::Table(table) => table.clone(),
        };

        MenuConfig {
            menu_id: table.menu_id.unwrap_or_else(|| DEFAULT_MENU_ID.to_string()),
            label: table.label.unwrap_or_else(|| title.to_string()),
            order: table.order.unwrap_or(DEFAULT_MENU_ORDER),
            enabled: table.enabled.unwrap_or(auth_required),
        }
    }
}

/// A page as written in the site configuration (or its overrides).
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PageDefinition {
    pub title: Option<String>,
    pub uri: Option<String>,
    pub enabled: Option<EnabledValue>,
    pub auth_required: Option<bool>,
    pub menu: Option<MenuValue>,

    pub content: Option<String>,
    pub source: Option<String>,
    pub callback: Option<String>,
    pub view: Option<String>,
    pub data: Option<serde_json::Value>,
    /// Legacy source selector: `block`, `service` or `view`.
    pub content_source: Option<String>,
    /// Legacy source argument.
    pub content_id: Option<String>,

    /// Title of the page's block, when it differs from the page.
    pub block_title: Option<String>,
    pub class: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub show_title: Option<bool>,
    pub text_format: Option<TextFormat>,
}

impl PageDefinition {
    /// Whether any content key is set.
    pub fn has_content_source(&self) -> bool {
        self.content.is_some()
            || self.source.is_some()
            || self.callback.is_some()
            || self.view.is_some()
            || self.content_source.is_some()
    }

    /// Apply `overrides` on top of this definition, key by key.
    ///
    /// Content keys move as a group: an override naming any content source
    /// replaces all of them.
    pub fn merge(self, overrides: PageDefinition) -> PageDefinition {
        let content_from = if overrides.has_content_source() {
            overrides.clone()
        } else {
            self.clone()
        };

        let mut attributes = self.attributes;
        attributes.extend(overrides.attributes);

        PageDefinition {
            title: overrides.title.or(self.title),
            uri: overrides.uri.or(self.uri),
            enabled: overrides.enabled.or(self.enabled),
            auth_required: overrides.auth_required.or(self.auth_required),
            menu: overrides.menu.or(self.menu),
            content: content_from.content,
            source: content_from.source,
            callback: content_from.callback,
            view: content_from.view,
            data: content_from.data,
            content_source: content_from.content_source,
            content_id: content_from.content_id,
            block_title: overrides.block_title.or(self.block_title),
            class: overrides.class.or(self.class),
            attributes,
            show_title: overrides.show_title.or(self.show_title),
            text_format: overrides.text_format.or(self.text_format),
        }
    }
}

/// A page with defaults applied and rules evaluated for one user.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageConfig {
    pub id: String,
    pub title: String,
    pub uri: String,
    pub rule: EnabledRule,
    /// `rule` evaluated for the current user.
    pub enabled: bool,
    pub auth_required: bool,
    pub menu: MenuConfig,
    pub content_source: ContentSource,
    #[serde(skip)]
    pub block: BlockOptions,
}

impl PageConfig {
    pub fn text_format(&self) -> TextFormat {
        self.block.text_format
    }
}

/// Normalise a configured or requested uri: one leading slash, no trailing
/// slash except for the root.
pub fn normalize_uri(uri: &str) -> String {
    let trimmed = uri.trim().trim_matches('/');
    format!("/{trimmed}")
}
