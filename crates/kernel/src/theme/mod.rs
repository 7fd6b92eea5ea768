//! Theme engine and template rendering.
//!
//! Provides Tera-based template rendering with template suggestion resolution
//! and inline fallbacks for blocks and pages.

mod engine;
mod render;

pub use engine::{SharedThemeEngine, ThemeEngine};
pub use render::{block_html, page_html};
