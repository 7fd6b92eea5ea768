//! Content module.
//!
//! This module provides:
//! - Source format detection and markdown conversion
//! - FilterPipeline: markdown, text format and shortcode filters
//! - ContentResolver: turns content sources into blocks
//! - BlockService: configured blocks rendered by id
//! - LocalFileSystem: file access confined to the application root

mod block;
mod blocks;
pub mod detect;
mod filter;
mod fs;
pub mod markdown;
mod resolver;

pub use block::{
    Block, BlockOptions, ContentSource, DEFAULT_METHOD, extract_leading_heading, humanize,
};
pub use blocks::{BlockDefinition, BlockService, BlockSpec};
pub use detect::{SourceFormat, detect_format};
pub use filter::{
    FilterPipeline, HtmlEscapeFilter, MarkdownFilter, NewlineFilter, SanitizeFilter,
    ShortcodeFilter, ShortcodeStashFilter, TextFilter, TextFormat, html_escape,
};
pub use fs::{FileSystem, LocalFileSystem};
pub use resolver::{ContentResolver, TemplateRenderer};
