//! Content resolution.
//!
//! Turns a [`ContentSource`] into a [`Block`]: load the raw content, work out
//! its format and title, then run it through the filter pipeline.

use std::borrow::Cow;
use std::path::Path;
use std::sync::Arc;

use agnstk_sdk::{RenderArgs, RenderError};
use tracing::{debug, warn};

use super::block::{Block, BlockOptions, ContentSource, extract_leading_heading, humanize};
use super::detect::{SourceFormat, detect_format};
use super::filter::{FilterPipeline, TextFormat};
use super::fs::FileSystem;
use crate::error::ResolutionError;
use crate::service::ServiceRegistry;
use crate::shortcode::ShortcodeRegistry;

/// Renders named views. Implemented by the theme engine.
pub trait TemplateRenderer: Send + Sync {
    /// Render `view` with `data`. Fails when the view does not exist.
    fn render(&self, view: &str, data: &serde_json::Value) -> anyhow::Result<String>;
}

/// Raw content before post-processing.
struct Loaded {
    body: String,
    source_format: SourceFormat,
    text_format: TextFormat,
    inferred_title: Option<String>,
}

/// Resolves content sources against the boot-time registries.
#[derive(Clone)]
pub struct ContentResolver {
    fs: Arc<dyn FileSystem>,
    services: Arc<ServiceRegistry>,
    shortcodes: Arc<ShortcodeRegistry>,
    templates: Arc<dyn TemplateRenderer>,
}

impl ContentResolver {
    pub fn new(
        fs: Arc<dyn FileSystem>,
        services: Arc<ServiceRegistry>,
        shortcodes: Arc<ShortcodeRegistry>,
        templates: Arc<dyn TemplateRenderer>,
    ) -> Self {
        Self {
            fs,
            services,
            shortcodes,
            templates,
        }
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.services
    }

    pub fn shortcodes(&self) -> &ShortcodeRegistry {
        &self.shortcodes
    }

    /// Resolve `source` into a block.
    ///
    /// File, view and service lookups that fail are returned to the caller.
    /// Markdown and shortcode problems never are.
    pub fn resolve(
        &self,
        source: &ContentSource,
        options: &BlockOptions,
    ) -> Result<Block, ResolutionError> {
        debug!(block = %options.id, source = source.kind(), "resolving block");

        let loaded = match source {
            ContentSource::Content(content) => {
                self.load_text(content.clone(), None, options.text_format, options)
            }
            ContentSource::File(path) => self.load_file(path, options)?,
            ContentSource::Callback { service, method } => {
                self.load_callback(service, method, options)?
            }
            ContentSource::View { view, data } => self.load_view(view, data)?,
            // Block references go through BlockService, which owns the definitions.
            ContentSource::Block(id) => {
                return Err(ResolutionError::NotFound(format!("block {id}")));
            }
        };

        let content = self.post_process(&loaded.body, loaded.source_format, loaded.text_format);

        let title = options
            .title
            .clone()
            .or(loaded.inferred_title)
            .or_else(|| Some(humanize(&options.id)))
            .filter(|t| !t.is_empty());

        // A block repeating its page's title would render the heading twice.
        let show_title = match (&title, &options.page_title) {
            (Some(title), Some(page_title)) if title == page_title => false,
            _ => options.show_title.unwrap_or(true),
        };

        Ok(Block {
            id: options.id.clone(),
            title,
            content,
            source_format: loaded.source_format,
            attributes: options.attributes.clone(),
            show_title,
        })
    }

    /// Markdown conversion, text format and shortcode expansion.
    pub fn post_process(
        &self,
        content: &str,
        source_format: SourceFormat,
        text_format: TextFormat,
    ) -> String {
        FilterPipeline::for_block(source_format, text_format, &self.shortcodes).process(content)
    }

    /// Detect and post-process a content string in one step.
    pub fn render_content(&self, content: &str, filename: Option<&Path>) -> String {
        let format = detect_format(content, filename);
        self.post_process(content, format, TextFormat::FullHtml)
    }

    fn load_text(
        &self,
        content: String,
        filename: Option<&Path>,
        text_format: TextFormat,
        options: &BlockOptions,
    ) -> Loaded {
        // Detect before the heading is removed: it may be the only marker.
        let source_format = detect_format(&content, filename);

        let (inferred_title, body) = match options.title {
            Some(_) => (None, content),
            None => match extract_leading_heading(&content) {
                Some((title, body)) => (Some(title), body),
                None => (None, content),
            },
        };

        Loaded {
            body,
            source_format,
            text_format,
            inferred_title,
        }
    }

    fn load_file(&self, path: &Path, options: &BlockOptions) -> Result<Loaded, ResolutionError> {
        let bytes = self.fs.read(path)?;
        let content = match String::from_utf8_lossy(&bytes) {
            Cow::Borrowed(s) => s.to_string(),
            Cow::Owned(s) => {
                warn!(path = %path.display(), "content file is not valid UTF-8");
                s
            }
        };

        let is_text = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("txt"));

        if is_text {
            return Ok(Loaded {
                body: content,
                source_format: SourceFormat::Html,
                text_format: TextFormat::PlainText,
                inferred_title: None,
            });
        }

        Ok(self.load_text(content, Some(path), options.text_format, options))
    }

    fn load_callback(
        &self,
        service_name: &str,
        method: &str,
        options: &BlockOptions,
    ) -> Result<Loaded, ResolutionError> {
        let service = self
            .services
            .resolve(service_name)
            .ok_or_else(|| ResolutionError::NotFound(format!("service {service_name}")))?;

        let args = RenderArgs {
            attributes: options.attributes.clone(),
            ..RenderArgs::default()
        };

        let body = service.invoke(method, &args).map_err(|e| match e {
            RenderError::UnknownMethod(m) => {
                ResolutionError::NotFound(format!("{service_name}@{m}"))
            }
            other => {
                warn!(service = %service_name, method = %method, error = %other, "callback failed");
                ResolutionError::HandlerFailed(other.to_string())
            }
        })?;

        // Service output is trusted HTML.
        Ok(Loaded {
            body,
            source_format: SourceFormat::Html,
            text_format: TextFormat::FullHtml,
            inferred_title: service.title(),
        })
    }

    fn load_view(&self, view: &str, data: &serde_json::Value) -> Result<Loaded, ResolutionError> {
        let body = self.templates.render(view, data).map_err(|e| {
            debug!(view = %view, error = %e, "view not rendered");
            ResolutionError::NotFound(format!("view {view}"))
        })?;

        Ok(Loaded {
            body,
            source_format: SourceFormat::Html,
            text_format: TextFormat::FullHtml,
            inferred_title: None,
        })
    }
}
