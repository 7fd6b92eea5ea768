//! Markdown to HTML conversion.
//!
//! GitHub-flavoured markdown via `pulldown-cmark`, with raw HTML stripped and
//! unsafe link schemes removed. Fenced code blocks keep their
//! `language-<lang>` class for client-side highlighting.

use pulldown_cmark::{CowStr, Event, Options, Parser, Tag, html};

/// URL schemes allowed in link and image destinations.
const SAFE_SCHEMES: &[&str] = &["http", "https", "mailto"];

/// Parser options: CommonMark plus the GitHub extensions.
pub fn markdown_options() -> Options {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);
    options.insert(Options::ENABLE_FOOTNOTES);
    options
}

/// Convert markdown to an HTML fragment.
///
/// Never fails: anything the parser does not understand is rendered as text.
pub fn to_html(markdown: &str) -> String {
    let parser = Parser::new_ext(markdown, markdown_options()).filter_map(sanitize_event);

    let mut output = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut output, parser);
    output
}

/// The plain text of one line of inline markdown, as it would read in a
/// heading: `Hello **world**` becomes `Hello world`. Raw HTML is dropped.
pub fn inline_text(line: &str) -> String {
    let heading = format!("# {}", line.trim());
    Parser::new_ext(&heading, markdown_options())
        .filter_map(|event| match event {
            Event::Text(text) | Event::Code(text) => Some(text),
            _ => None,
        })
        .fold(String::new(), |mut out, text| {
            out.push_str(&text);
            out
        })
        .trim()
        .to_string()
}

/// Drop raw HTML and neutralise unsafe destinations.
fn sanitize_event(event: Event<'_>) -> Option<Event<'_>> {
    match event {
        Event::Html(_) | Event::InlineHtml(_) => None,
        Event::Start(Tag::Link {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Link {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        })),
        Event::Start(Tag::Image {
            link_type,
            dest_url,
            title,
            id,
        }) => Some(Event::Start(Tag::Image {
            link_type,
            dest_url: safe_destination(dest_url),
            title,
            id,
        })),
        other => Some(other),
    }
}

fn safe_destination(dest: CowStr<'_>) -> CowStr<'_> {
    if is_safe_url(&dest) {
        dest
    } else {
        CowStr::Borrowed("")
    }
}

/// Whether a destination may be emitted as-is.
///
/// Relative URLs, paths and fragments are safe; absolute URLs must use one of
/// [`SAFE_SCHEMES`].
pub fn is_safe_url(url: &str) -> bool {
    let trimmed = url.trim();
    let Some(colon) = trimmed.find(':') else {
        return true;
    };

    let scheme = &trimmed[..colon];
    // A colon after a path, query or fragment delimiter is not a scheme separator.
    if scheme.contains(['/', '?', '#']) {
        return true;
    }

    let scheme = scheme.to_ascii_lowercase();
    SAFE_SCHEMES.contains(&scheme.as_str())
}
