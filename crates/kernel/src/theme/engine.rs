//! Theme engine with Tera templates and suggestion resolution.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use agnstk_sdk::RenderArgs;
use anyhow::{Context, Result, bail};
use dashmap::DashMap;
use tera::Tera;
use tracing::{debug, warn};

use super::render::{block_html, page_html};
use crate::content::{Block, TemplateRenderer};
use crate::menu::MenuRegistry;
use crate::page::PageConfig;
use crate::shortcode::{ShortcodeRegistry, render_shortcode};

/// Theme engine for rendering templates.
pub struct ThemeEngine {
    /// Tera template engine instance.
    tera: Tera,
    /// Cache mapping suggestion lists to resolved template names.
    suggestion_cache: DashMap<String, String>,
}

impl ThemeEngine {
    /// Create a new theme engine loading templates from the given directory.
    ///
    /// A missing directory yields an engine with no templates; every block
    /// and page then uses the inline fallback.
    pub fn new(template_dir: &Path) -> Result<Self> {
        if !template_dir.is_dir() {
            warn!(dir = %template_dir.display(), "template directory not found, using inline rendering");
            return Self::empty();
        }

        let pattern = template_dir.join("**/*.html");
        let pattern_str = pattern
            .to_str()
            .context("invalid template directory path")?;

        let tera = Tera::new(pattern_str).context("failed to initialize Tera templates")?;

        let template_names: Vec<_> = tera.get_template_names().collect();
        debug!(count = template_names.len(), "loaded templates");

        Ok(Self {
            tera,
            suggestion_cache: DashMap::new(),
        })
    }

    /// Create a theme engine with no templates (for testing).
    pub fn empty() -> Result<Self> {
        Ok(Self {
            tera: Tera::default(),
            suggestion_cache: DashMap::new(),
        })
    }

    /// Make `shortcode(name="...", ...)` callable from templates.
    ///
    /// Unknown shortcodes and handler errors render as nothing, or as a
    /// bracketed notice when `debug` is set.
    pub fn register_shortcodes(&mut self, shortcodes: Arc<ShortcodeRegistry>, debug: bool) {
        self.tera.register_function(
            "shortcode",
            move |args: &HashMap<String, tera::Value>| {
                let name = args
                    .get("name")
                    .and_then(|v| v.as_str())
                    .ok_or_else(|| tera::Error::msg("shortcode() requires a `name` argument"))?;

                let mut render_args = RenderArgs::new();
                for (key, value) in args.iter().filter(|(k, _)| *k != "name") {
                    let value = match value {
                        tera::Value::String(s) => s.clone(),
                        other => other.to_string(),
                    };
                    if key == "class" {
                        render_args.attributes.insert(key.clone(), value);
                    } else {
                        render_args.params.insert(key.clone(), value);
                    }
                }

                let html = match render_shortcode(name, &render_args, &shortcodes) {
                    Some(Ok(html)) => html,
                    Some(Err(e)) => {
                        warn!(shortcode = %name, error = %e, "template shortcode failed");
                        if debug {
                            format!("[shortcode error: {name}]")
                        } else {
                            String::new()
                        }
                    }
                    None if debug => format!("[shortcode '{name}' not found]"),
                    None => String::new(),
                };
                Ok(tera::Value::String(html))
            },
        );
    }

    /// Get the underlying Tera instance for custom operations.
    pub fn tera(&self) -> &Tera {
        &self.tera
    }

    /// Get a mutable reference to Tera (for adding templates at runtime).
    pub fn tera_mut(&mut self) -> &mut Tera {
        &mut self.tera
    }

    /// Resolve the best template from a list of suggestions.
    ///
    /// Templates are tried in order; the first one that exists is returned.
    /// Results are cached for performance.
    ///
    /// Example suggestions: `["components/block--about", "components/block"]`
    pub fn resolve_template(&self, suggestions: &[&str]) -> Option<String> {
        if suggestions.is_empty() {
            return None;
        }

        let cache_key = suggestions.join("|");
        if let Some(cached) = self.suggestion_cache.get(&cache_key) {
            return Some(cached.clone());
        }

        for suggestion in suggestions {
            let template_name = format!("{suggestion}.html");
            if self.tera.get_template(&template_name).is_ok() {
                self.suggestion_cache
                    .insert(cache_key, template_name.clone());
                return Some(template_name);
            }

            // Also try without .html extension (in case suggestion already has it)
            if self.tera.get_template(suggestion).is_ok() {
                let name = (*suggestion).to_string();
                self.suggestion_cache.insert(cache_key, name.clone());
                return Some(name);
            }
        }

        // Negative results are not cached so templates added later are found.
        None
    }

    /// Template suggestions for a block, most specific first.
    pub fn block_suggestions(block: &Block) -> Vec<String> {
        vec![
            format!("components/block--{}", block.id),
            "components/block".to_string(),
        ]
    }

    /// Template suggestions for a page, most specific first.
    pub fn page_suggestions(page_id: &str) -> Vec<String> {
        vec![format!("page--{page_id}"), "page".to_string()]
    }

    /// Render a block in its wrapper.
    pub fn render_block(&self, block: &Block) -> Result<String> {
        let suggestions = Self::block_suggestions(block);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let Some(template) = self.resolve_template(&suggestion_refs) else {
            debug!(block = %block.id, "no block template, rendering inline");
            return Ok(block_html(block));
        };

        let mut context = tera::Context::new();
        context.insert("block", block);
        context.insert("class", &block.class().unwrap_or_default());

        self.tera
            .render(&template, &context)
            .with_context(|| format!("failed to render block template {template}"))
    }

    /// Render a full page around its block.
    pub fn render_page(
        &self,
        page: &PageConfig,
        block: &Block,
        menus: &MenuRegistry,
        logged_in: bool,
    ) -> Result<String> {
        let block_html = self.render_block(block)?;

        let suggestions = Self::page_suggestions(&page.id);
        let suggestion_refs: Vec<&str> = suggestions.iter().map(|s| s.as_str()).collect();

        let Some(template) = self.resolve_template(&suggestion_refs) else {
            debug!(page = %page.id, "no page template, rendering inline");
            return Ok(page_html(&page.title, &block_html, menus));
        };

        let mut context = tera::Context::new();
        context.insert("title", &page.title);
        context.insert("page", page);
        context.insert("content", &block_html);
        context.insert("menus", menus);
        context.insert("logged_in", &logged_in);

        self.tera
            .render(&template, &context)
            .with_context(|| format!("failed to render page template {template}"))
    }

    /// Clear the suggestion cache (useful for development hot-reload).
    pub fn clear_cache(&self) {
        self.suggestion_cache.clear();
    }
}

impl TemplateRenderer for ThemeEngine {
    /// Views live under `views/`; a bare template name also works.
    fn render(&self, view: &str, data: &serde_json::Value) -> Result<String> {
        let scoped = format!("views/{view}");
        let Some(template) = self.resolve_template(&[scoped.as_str(), view]) else {
            bail!("view not found: {view}");
        };

        let context = match data {
            serde_json::Value::Null => tera::Context::new(),
            serde_json::Value::Object(_) => {
                tera::Context::from_value(data.clone()).context("invalid view data")?
            }
            other => {
                let mut context = tera::Context::new();
                context.insert("data", other);
                context
            }
        };

        self.tera
            .render(&template, &context)
            .with_context(|| format!("failed to render view {view}"))
    }
}

impl std::fmt::Debug for ThemeEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThemeEngine")
            .field("template_count", &self.tera.get_template_names().count())
            .field("cache_size", &self.suggestion_cache.len())
            .finish()
    }
}

/// Wrap ThemeEngine in Arc for sharing across handlers.
pub type SharedThemeEngine = Arc<ThemeEngine>;
