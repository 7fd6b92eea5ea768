//! Blocks and the sources they are resolved from.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use super::detect::SourceFormat;
use super::filter::TextFormat;

/// Method called when a callback names only the service.
pub const DEFAULT_METHOD: &str = "render";

/// Where a block's content comes from. Exactly one per page or block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum ContentSource {
    /// Literal content, markdown or HTML.
    Content(String),
    /// A file under the application root.
    File(PathBuf),
    /// A method on a registered service.
    Callback { service: String, method: String },
    /// A template rendered with `data`.
    View {
        view: String,
        data: serde_json::Value,
    },
    /// A configured block, rendered by [`BlockService`](super::BlockService).
    Block(String),
}

impl ContentSource {
    /// Parse a `Service@method` callback. A bare name calls `render`.
    pub fn callback(spec: &str) -> Self {
        let (service, method) = match spec.split_once('@') {
            Some((service, method)) if !method.is_empty() => (service, method),
            Some((service, _)) => (service, DEFAULT_METHOD),
            None => (spec, DEFAULT_METHOD),
        };
        ContentSource::Callback {
            service: service.trim().to_string(),
            method: method.trim().to_string(),
        }
    }

    /// A view with no data.
    pub fn view(view: impl Into<String>) -> Self {
        ContentSource::View {
            view: view.into(),
            data: serde_json::Value::Null,
        }
    }

    /// Interpret a generic `source` value.
    ///
    /// `@` means a callback, something shaped like a file name means a file,
    /// anything else is literal content.
    pub fn from_source(source: &str) -> Self {
        if source.contains('@') {
            Self::callback(source)
        } else if looks_like_path(source) {
            ContentSource::File(PathBuf::from(source))
        } else {
            ContentSource::Content(source.to_string())
        }
    }

    /// Short name of the variant, for logs.
    pub fn kind(&self) -> &'static str {
        match self {
            ContentSource::Content(_) => "content",
            ContentSource::File(_) => "file",
            ContentSource::Callback { .. } => "callback",
            ContentSource::View { .. } => "view",
            ContentSource::Block(_) => "block",
        }
    }
}

/// A dotted name with no whitespace, short enough to be a path.
fn looks_like_path(source: &str) -> bool {
    source.contains('.') && !source.contains(char::is_whitespace) && source.len() < 255
}

/// Caller-supplied settings for resolving one block.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BlockOptions {
    pub id: String,
    /// Explicit title; always wins.
    pub title: Option<String>,
    /// Title of the containing page, if any.
    pub page_title: Option<String>,
    pub attributes: BTreeMap<String, String>,
    /// Explicit visibility of the title.
    pub show_title: Option<bool>,
    pub text_format: TextFormat,
}

impl BlockOptions {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Self::default()
        }
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn page_title(mut self, title: impl Into<String>) -> Self {
        self.page_title = Some(title.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn show_title(mut self, show: bool) -> Self {
        self.show_title = Some(show);
        self
    }

    pub fn text_format(mut self, format: TextFormat) -> Self {
        self.text_format = format;
        self
    }
}

/// A titled unit of resolved HTML.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub id: String,
    pub title: Option<String>,
    /// Final HTML.
    pub content: String,
    /// Format the content was authored in.
    pub source_format: SourceFormat,
    pub attributes: BTreeMap<String, String>,
    pub show_title: bool,
}

impl Block {
    /// The CSS classes from the `class` attribute, if any.
    pub fn class(&self) -> Option<&str> {
        self.attributes.get("class").map(String::as_str)
    }
}

/// Turn an id into a title: `about-us` becomes `About us`.
pub fn humanize(id: &str) -> String {
    let spaced = id.replace(['-', '_'], " ");
    let mut chars = spaced.trim().chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[allow(clippy::expect_used)]
static LEADING_HTML_H1: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)^\s*<h1(?:\s[^>]*)?>(.*?)</h1>\s*").expect("h1 pattern")
});

#[allow(clippy::expect_used)]
static TAGS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"<[^>]*>").expect("tag pattern"));

/// Split a leading `# Heading` line or `<h1>` element off `content`.
///
/// Returns the heading text and the remaining body, or `None` when the
/// content does not start with a top-level heading.
pub fn extract_leading_heading(content: &str) -> Option<(String, String)> {
    let trimmed = content.trim_start();

    if let Some(rest) = trimmed.strip_prefix("# ") {
        let (line, body) = rest.split_once('\n').unwrap_or((rest, ""));
        let title = super::markdown::inline_text(line);
        if title.is_empty() {
            return None;
        }
        return Some((title, body.trim_start_matches(['\r', '\n']).to_string()));
    }

    let caps = LEADING_HTML_H1.captures(trimmed)?;
    let whole = caps.get(0)?;
    let inner = caps.get(1)?.as_str();
    let title = TAGS.replace_all(inner, "").trim().to_string();
    if title.is_empty() {
        return None;
    }
    Some((title, trimmed[whole.end()..].to_string()))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn callback_specs() {
        assert_eq!(
            ContentSource::callback("HelloService@render"),
            ContentSource::Callback {
                service: "HelloService".into(),
                method: "render".into()
            }
        );
        assert_eq!(
            ContentSource::callback("HelloService"),
            ContentSource::Callback {
                service: "HelloService".into(),
                method: "render".into()
            }
        );
        assert_eq!(
            ContentSource::callback("Stats@"),
            ContentSource::Callback {
                service: "Stats".into(),
                method: "render".into()
            }
        );
    }

    #[test]
    fn generic_sources() {
        assert_eq!(
            ContentSource::from_source("README.md"),
            ContentSource::File(PathBuf::from("README.md"))
        );
        assert_eq!(
            ContentSource::from_source("docs/DEVELOPERS.md"),
            ContentSource::File(PathBuf::from("docs/DEVELOPERS.md"))
        );
        assert!(matches!(
            ContentSource::from_source("HelloService@render"),
            ContentSource::Callback { .. }
        ));
        assert_eq!(
            ContentSource::from_source("# Hello. World"),
            ContentSource::Content("# Hello. World".into())
        );
        assert_eq!(
            ContentSource::from_source("<p>hi</p>"),
            ContentSource::Content("<p>hi</p>".into())
        );
    }

    #[test]
    fn humanized_ids() {
        assert_eq!(humanize("about-us"), "About us");
        assert_eq!(humanize("static_content"), "Static content");
        assert_eq!(humanize("hello"), "Hello");
        assert_eq!(humanize(""), "");
    }

    #[test]
    fn markdown_heading_is_extracted() {
        let (title, body) = extract_leading_heading("# Title\n\nHello **world**").unwrap();
        assert_eq!(title, "Title");
        assert_eq!(body, "Hello **world**");
    }

    #[test]
    fn markdown_heading_markup_is_dropped_from_title() {
        let (title, body) = extract_leading_heading("# Hello **world**\nBody").unwrap();
        assert_eq!(title, "Hello world");
        assert_eq!(body, "Body");

        let (title, _) = extract_leading_heading("# The `agnstk` *CLI*\n").unwrap();
        assert_eq!(title, "The agnstk CLI");
    }

    #[test]
    fn closing_hashes_are_dropped() {
        let (title, _) = extract_leading_heading("# Title ##\nx").unwrap();
        assert_eq!(title, "Title");
    }

    #[test]
    fn html_heading_is_extracted() {
        let (title, body) =
            extract_leading_heading("<h1 class=\"big\">About <em>us</em></h1>\n<p>x</p>").unwrap();
        assert_eq!(title, "About us");
        assert_eq!(body, "<p>x</p>");
    }

    #[test]
    fn no_leading_heading() {
        assert!(extract_leading_heading("Intro\n# Later").is_none());
        assert!(extract_leading_heading("## Sub").is_none());
        assert!(extract_leading_heading("<p>x</p><h1>Late</h1>").is_none());
        assert!(extract_leading_heading("#hashtag").is_none());
    }

    #[test]
    fn block_options_builder() {
        let options = BlockOptions::new("about")
            .title("About")
            .attribute("class", "wide")
            .show_title(false);
        assert_eq!(options.id, "about");
        assert_eq!(options.title.as_deref(), Some("About"));
        assert_eq!(options.attributes["class"], "wide");
        assert_eq!(options.show_title, Some(false));
        assert_eq!(options.text_format, TextFormat::FullHtml);
    }
}
