//! Site configuration file.
//!
//! One TOML or YAML file declares the whole site:
//!
//! ```toml
//! [pages.about]
//! title = "About"
//! uri = "/"
//! source = "README.md"
//! menu = true
//!
//! [blocks.notice]
//! content = "**Heads up**"
//!
//! [shortcodes]
//! greet = "HelloService"
//!
//! [overrides.about]
//! title = "About us"
//! ```

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use serde::Deserialize;
use tracing::info;

use crate::content::BlockDefinition;
use crate::page::PageDefinition;

/// Parsed site configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    #[serde(default)]
    pub pages: BTreeMap<String, PageDefinition>,
    #[serde(default)]
    pub blocks: BTreeMap<String, BlockDefinition>,
    /// Shortcode name -> service name.
    #[serde(default)]
    pub shortcodes: BTreeMap<String, String>,
    /// Page id -> fields replacing the page's own.
    #[serde(default)]
    pub overrides: BTreeMap<String, PageDefinition>,
}

impl SiteConfig {
    /// Load from a file, choosing the parser by extension.
    ///
    /// `.yaml`/`.yml` are YAML; everything else is TOML.
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read site config {}", path.display()))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);

        let config = match ext.as_deref() {
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            Some("toml") | None => Self::from_toml_str(&text),
            Some(other) => bail!("unsupported site config format: .{other}"),
        }
        .with_context(|| format!("invalid site config {}", path.display()))?;

        info!(
            path = %path.display(),
            pages = config.pages.len(),
            blocks = config.blocks.len(),
            shortcodes = config.shortcodes.len(),
            "site config loaded"
        );
        Ok(config)
    }

    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("failed to parse TOML")
    }

    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yml::from_str(text).context("failed to parse YAML")
    }
}
