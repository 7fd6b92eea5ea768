//! Content post-processing pipeline.
//!
//! Resolved content flows through a sequence of [`TextFilter`]s:
//! - shortcode stashing and markdown conversion (markdown sources only)
//! - the text format: `full_html` passes through, `filtered_html` sanitises,
//!   `plain_text` escapes everything
//! - shortcode expansion, last, so handler output is never filtered

use serde::{Deserialize, Serialize};

use super::detect::SourceFormat;
use super::markdown;
use crate::shortcode::{ShortcodeRegistry, expand_stashed, process_shortcodes, stash_shortcodes};

/// Sanitisation level applied to block HTML.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TextFormat {
    /// Trusted configuration: no filtering.
    #[default]
    FullHtml,
    /// Safe tags only.
    FilteredHtml,
    /// Everything escaped, newlines become `<br>`.
    PlainText,
}

impl TextFormat {
    /// Parse a format name. Unknown names get the safest format.
    pub fn from_name(name: &str) -> Self {
        match name {
            "full_html" => TextFormat::FullHtml,
            "filtered_html" => TextFormat::FilteredHtml,
            _ => TextFormat::PlainText,
        }
    }
}

/// Trait for text filters in the pipeline.
pub trait TextFilter {
    /// Filter name for debugging.
    fn name(&self) -> &str;

    /// Process the input text and return filtered output.
    fn process(&self, input: &str) -> String;
}

/// Pipeline of text filters applied in sequence.
pub struct FilterPipeline<'a> {
    filters: Vec<Box<dyn TextFilter + 'a>>,
}

impl<'a> FilterPipeline<'a> {
    /// Create a new empty pipeline.
    pub fn new() -> Self {
        Self {
            filters: Vec::new(),
        }
    }

    /// Add a filter to the pipeline.
    pub fn add<F: TextFilter + 'a>(mut self, filter: F) -> Self {
        self.filters.push(Box::new(filter));
        self
    }

    /// Append the filters for a text format.
    pub fn with_text_format(self, format: TextFormat) -> Self {
        match format {
            TextFormat::FullHtml => self,
            TextFormat::FilteredHtml => self.add(SanitizeFilter),
            TextFormat::PlainText => self.add(HtmlEscapeFilter).add(NewlineFilter),
        }
    }

    /// The full post-processing chain for a block.
    ///
    /// Plain text is never run through the markdown converter. Markdown
    /// shortcodes are stashed before anything else touches the text.
    pub fn for_block(
        source_format: SourceFormat,
        text_format: TextFormat,
        shortcodes: &'a ShortcodeRegistry,
    ) -> Self {
        let mut pipeline = Self::new();
        if source_format == SourceFormat::Markdown {
            pipeline = pipeline.add(ShortcodeStashFilter::new(shortcodes));
            if text_format != TextFormat::PlainText {
                pipeline = pipeline.add(MarkdownFilter);
            }
        }
        pipeline
            .with_text_format(text_format)
            .add(ShortcodeFilter::new(shortcodes, source_format))
    }

    /// Names of the filters, in order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Process text through all filters in the pipeline.
    pub fn process(&self, input: &str) -> String {
        self.filters
            .iter()
            .fold(input.to_string(), |acc, filter| filter.process(&acc))
    }
}

impl Default for FilterPipeline<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// Escape the five HTML-significant characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Filter that converts markdown to HTML.
pub struct MarkdownFilter;

impl TextFilter for MarkdownFilter {
    fn name(&self) -> &str {
        "markdown"
    }

    fn process(&self, input: &str) -> String {
        markdown::to_html(input)
    }
}

/// Filter that escapes all HTML characters.
pub struct HtmlEscapeFilter;

impl TextFilter for HtmlEscapeFilter {
    fn name(&self) -> &str {
        "html_escape"
    }

    fn process(&self, input: &str) -> String {
        html_escape(input)
    }
}

/// Filter that converts newlines to <br> tags.
pub struct NewlineFilter;

impl TextFilter for NewlineFilter {
    fn name(&self) -> &str {
        "newline"
    }

    fn process(&self, input: &str) -> String {
        input.replace('\n', "<br>\n")
    }
}

/// Filter that keeps safe tags and strips dangerous ones.
///
/// `class` survives on `code`, `pre` and `div` so highlighted code blocks
/// and wrapper styling keep working.
pub struct SanitizeFilter;

impl TextFilter for SanitizeFilter {
    fn name(&self) -> &str {
        "filtered_html"
    }

    fn process(&self, input: &str) -> String {
        let mut builder = ammonia::Builder::default();
        builder
            .add_tag_attributes("code", &["class"])
            .add_tag_attributes("pre", &["class"])
            .add_tag_attributes("div", &["class"]);
        builder.clean(input).to_string()
    }
}

/// Filter that hides markdown shortcodes behind placeholders.
pub struct ShortcodeStashFilter<'a> {
    registry: &'a ShortcodeRegistry,
}

impl<'a> ShortcodeStashFilter<'a> {
    pub fn new(registry: &'a ShortcodeRegistry) -> Self {
        Self { registry }
    }
}

impl TextFilter for ShortcodeStashFilter<'_> {
    fn name(&self) -> &str {
        "shortcode_stash"
    }

    fn process(&self, input: &str) -> String {
        stash_shortcodes(input, self.registry)
    }
}

/// Filter that expands registered shortcodes.
///
/// For markdown sources this expands the placeholders left by
/// [`ShortcodeStashFilter`]; HTML sources are scanned directly.
pub struct ShortcodeFilter<'a> {
    registry: &'a ShortcodeRegistry,
    source_format: SourceFormat,
}

impl<'a> ShortcodeFilter<'a> {
    pub fn new(registry: &'a ShortcodeRegistry, source_format: SourceFormat) -> Self {
        Self {
            registry,
            source_format,
        }
    }
}

impl TextFilter for ShortcodeFilter<'_> {
    fn name(&self) -> &str {
        "shortcode"
    }

    fn process(&self, input: &str) -> String {
        match self.source_format {
            SourceFormat::Markdown => expand_stashed(input, self.registry),
            SourceFormat::Html => process_shortcodes(input, self.registry, SourceFormat::Html),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn html_escape_filter() {
        let filter = HtmlEscapeFilter;
        assert_eq!(
            filter.process("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
    }

    #[test]
    fn newline_filter() {
        let filter = NewlineFilter;
        assert_eq!(filter.process("line1\nline2"), "line1<br>\nline2");
    }

    #[test]
    fn sanitize_removes_scripts_and_handlers() {
        let filter = SanitizeFilter;
        let input = r#"<p>Safe</p><script>alert('xss')</script><a href="/p" onclick="x()">Link</a>"#;
        let output = filter.process(input);
        assert!(!output.contains("script"));
        assert!(!output.contains("onclick"));
        assert!(output.contains("<p>Safe</p>"));
        assert!(output.contains("Link</a>"));
    }

    #[test]
    fn sanitize_removes_javascript_urls() {
        let output = SanitizeFilter.process(r#"<a href="javascript:alert('xss')">Link</a>"#);
        assert!(!output.contains("javascript:"));
    }

    #[test]
    fn sanitize_keeps_code_language_class() {
        let output =
            SanitizeFilter.process(r#"<pre><code class="language-rust">fn x() {}</code></pre>"#);
        assert!(output.contains(r#"class="language-rust""#), "got: {output}");
    }

    #[test]
    fn markdown_filter_converts() {
        assert!(MarkdownFilter.process("**b**").contains("<strong>b</strong>"));
    }

    #[test]
    fn markdown_block_pipeline_order() {
        let registry = ShortcodeRegistry::default();
        let pipeline =
            FilterPipeline::for_block(SourceFormat::Markdown, TextFormat::FilteredHtml, &registry);
        assert_eq!(
            pipeline.filter_names(),
            vec!["shortcode_stash", "markdown", "filtered_html", "shortcode"]
        );
    }

    #[test]
    fn html_block_pipeline_order() {
        let registry = ShortcodeRegistry::default();
        let pipeline =
            FilterPipeline::for_block(SourceFormat::Html, TextFormat::FullHtml, &registry);
        assert_eq!(pipeline.filter_names(), vec!["shortcode"]);
    }

    #[test]
    fn plain_text_skips_markdown() {
        let registry = ShortcodeRegistry::default();
        let pipeline =
            FilterPipeline::for_block(SourceFormat::Markdown, TextFormat::PlainText, &registry);
        assert_eq!(
            pipeline.filter_names(),
            vec!["shortcode_stash", "html_escape", "newline", "shortcode"]
        );
        let output = pipeline.process("# <Title>\nline");
        assert_eq!(output, "# &lt;Title&gt;<br>\nline");
    }

    #[test]
    fn empty_pipeline_is_identity() {
        let input = "<script>alert('test')</script>";
        assert_eq!(FilterPipeline::new().process(input), input);
    }

    #[test]
    fn text_format_names() {
        assert_eq!(TextFormat::from_name("full_html"), TextFormat::FullHtml);
        assert_eq!(TextFormat::from_name("filtered_html"), TextFormat::FilteredHtml);
        assert_eq!(TextFormat::from_name("plain_text"), TextFormat::PlainText);
        // Unknown format defaults to plain_text
        assert_eq!(TextFormat::from_name("nonexistent"), TextFormat::PlainText);
        assert_eq!(TextFormat::default(), TextFormat::FullHtml);
    }

    #[test]
    fn filter_names() {
        assert_eq!(HtmlEscapeFilter.name(), "html_escape");
        assert_eq!(NewlineFilter.name(), "newline");
        assert_eq!(SanitizeFilter.name(), "filtered_html");
        assert_eq!(MarkdownFilter.name(), "markdown");
    }
}
