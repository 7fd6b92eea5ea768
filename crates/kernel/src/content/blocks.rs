//! Configured blocks.
//!
//! Blocks are declared under `[blocks.<id>]` in the site configuration and
//! rendered on demand by id.

use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::debug;

use super::block::{Block, BlockOptions, ContentSource};
use super::filter::TextFormat;
use super::resolver::ContentResolver;
use crate::error::ResolutionError;

/// A block as written in the site configuration.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BlockDefinition {
    pub title: Option<String>,
    pub content: Option<String>,
    pub source: Option<String>,
    pub callback: Option<String>,
    pub view: Option<String>,
    #[serde(default)]
    pub data: Option<serde_json::Value>,
    pub class: Option<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    pub show_title: Option<bool>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default)]
    pub text_format: TextFormat,
}

fn default_enabled() -> bool {
    true
}

/// A block ready to resolve.
#[derive(Debug, Clone, PartialEq)]
pub struct BlockSpec {
    pub source: ContentSource,
    pub options: BlockOptions,
    pub enabled: bool,
}

impl BlockDefinition {
    /// The content source, by precedence: `content`, `source`, `callback`,
    /// `view`.
    pub fn content_source(&self) -> Option<ContentSource> {
        if let Some(content) = &self.content {
            return Some(ContentSource::Content(content.clone()));
        }
        if let Some(source) = &self.source {
            return Some(ContentSource::from_source(source));
        }
        if let Some(callback) = &self.callback {
            return Some(ContentSource::callback(callback));
        }
        self.view.as_ref().map(|view| ContentSource::View {
            view: view.clone(),
            data: self.data.clone().unwrap_or(serde_json::Value::Null),
        })
    }

    /// Validate the definition into a spec.
    pub fn into_spec(self, id: &str) -> Result<BlockSpec, ResolutionError> {
        let source = self
            .content_source()
            .ok_or_else(|| ResolutionError::UnknownContentSource(format!("block {id}")))?;

        let mut attributes = self.attributes;
        if let Some(class) = self.class {
            attributes.insert("class".to_string(), class);
        }

        Ok(BlockSpec {
            source,
            options: BlockOptions {
                id: id.to_string(),
                title: self.title,
                page_title: None,
                attributes,
                show_title: self.show_title,
                text_format: self.text_format,
            },
            enabled: self.enabled,
        })
    }
}

/// Renders configured blocks by id.
#[derive(Debug, Clone, Default)]
pub struct BlockService {
    blocks: BTreeMap<String, BlockSpec>,
}

impl BlockService {
    /// Build from configuration. Fails on the first block without a source.
    pub fn from_definitions(
        definitions: BTreeMap<String, BlockDefinition>,
    ) -> Result<Self, ResolutionError> {
        let blocks = definitions
            .into_iter()
            .map(|(id, def)| def.into_spec(&id).map(|spec| (id, spec)))
            .collect::<Result<_, _>>()?;
        Ok(Self { blocks })
    }

    pub fn get(&self, id: &str) -> Option<&BlockSpec> {
        self.blocks.get(id)
    }

    /// Block ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.blocks.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Render block `id`. Disabled and unknown blocks are not found.
    pub fn render(
        &self,
        id: &str,
        resolver: &ContentResolver,
        page_title: Option<&str>,
    ) -> Result<Block, ResolutionError> {
        let spec = self
            .blocks
            .get(id)
            .filter(|spec| spec.enabled)
            .ok_or_else(|| {
                debug!(block = %id, "block missing or disabled");
                ResolutionError::NotFound(format!("block {id}"))
            })?;

        let mut options = spec.options.clone();
        options.page_title = page_title.map(str::to_string);
        resolver.resolve(&spec.source, &options)
    }
}
