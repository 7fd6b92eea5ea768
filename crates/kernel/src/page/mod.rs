//! Pages.
//!
//! A page is a routable block with a title, uri, enabled rule and menu entry.

mod config;
mod service;

pub use config::{
    EnabledRule, EnabledValue, MenuTable, MenuValue, PageConfig, PageDefinition, normalize_uri,
};
pub use service::{PageAccess, PageContext, PageService};
