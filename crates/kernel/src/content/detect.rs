//! Source format detection.
//!
//! Decides whether a piece of content is markdown or HTML, first from the
//! file extension and then from a short list of markdown markers.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

/// The format content was authored in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceFormat {
    Markdown,
    Html,
}

impl SourceFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceFormat::Markdown => "markdown",
            SourceFormat::Html => "html",
        }
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Markdown markers, tried in order. The first match wins.
#[allow(clippy::expect_used)]
static MARKDOWN_MARKERS: LazyLock<[Regex; 5]> = LazyLock::new(|| {
    [
        // Headers
        Regex::new(r"(?m)^#\s").expect("header pattern"),
        // Bold
        Regex::new(r"\*\*[^*]+\*\*").expect("bold pattern"),
        // Italic
        Regex::new(r"\*[^*]+\*").expect("italic pattern"),
        // Fenced code
        Regex::new(r"```").expect("fence pattern"),
        // List items
        Regex::new(r"\n\s*\*\s").expect("list pattern"),
    ]
});

/// Format implied by a file extension, if the extension is conclusive.
pub fn format_for_extension(path: &Path) -> Option<SourceFormat> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "md" | "markdown" => Some(SourceFormat::Markdown),
        "html" | "htm" => Some(SourceFormat::Html),
        _ => None,
    }
}

/// Detect the source format of `content`.
///
/// A conclusive `filename` extension wins over the content heuristics.
/// Anything without a markdown marker is HTML.
pub fn detect_format(content: &str, filename: Option<&Path>) -> SourceFormat {
    if let Some(format) = filename.and_then(format_for_extension) {
        return format;
    }

    if MARKDOWN_MARKERS.iter().any(|re| re.is_match(content)) {
        SourceFormat::Markdown
    } else {
        SourceFormat::Html
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_decides() {
        let md = Path::new("README.md");
        let html = Path::new("page.HTM");
        assert_eq!(detect_format("<p>x</p>", Some(md)), SourceFormat::Markdown);
        assert_eq!(detect_format("# Title", Some(html)), SourceFormat::Html);
        assert_eq!(
            detect_format("plain", Some(Path::new("notes.markdown"))),
            SourceFormat::Markdown
        );
    }

    #[test]
    fn unknown_extension_falls_back_to_content() {
        let txt = Path::new("notes.txt");
        assert_eq!(detect_format("# Notes", Some(txt)), SourceFormat::Markdown);
        assert_eq!(detect_format("notes", Some(txt)), SourceFormat::Html);
    }

    #[test]
    fn header_marker() {
        assert_eq!(detect_format("# Title\n\nBody", None), SourceFormat::Markdown);
        assert_eq!(detect_format("intro\n# Later", None), SourceFormat::Markdown);
        // Not a header without the space
        assert_eq!(detect_format("#hashtag", None), SourceFormat::Html);
    }

    #[test]
    fn emphasis_markers() {
        assert_eq!(detect_format("Hello **world**", None), SourceFormat::Markdown);
        assert_eq!(detect_format("Hello *world*", None), SourceFormat::Markdown);
    }

    #[test]
    fn fence_and_list_markers() {
        assert_eq!(
            detect_format("```rust\nfn main() {}\n```", None),
            SourceFormat::Markdown
        );
        assert_eq!(detect_format("Items:\n * one", None), SourceFormat::Markdown);
    }

    #[test]
    fn html_is_default() {
        assert_eq!(detect_format("<p>Hello</p>", None), SourceFormat::Html);
        assert_eq!(detect_format("", None), SourceFormat::Html);
    }

    #[test]
    fn detection_is_deterministic() {
        let content = "Some *mixed* <b>content</b>";
        assert_eq!(detect_format(content, None), detect_format(content, None));
    }

    #[test]
    fn display_names() {
        assert_eq!(SourceFormat::Markdown.to_string(), "markdown");
        assert_eq!(SourceFormat::Html.to_string(), "html");
    }
}
