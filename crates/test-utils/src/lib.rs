//! AGNSTK test utilities.
//!
//! Fixture services, a temporary site builder, and assertion helpers for
//! integration tests. Fixture setup panics on I/O failure.

#![allow(clippy::expect_used)]

use std::path::{Path, PathBuf};

use agnstk_sdk::{Capabilities, RenderArgs, RenderError, Renderable};
use tempfile::TempDir;

/// A service that always renders the same HTML.
#[derive(Debug, Clone, Default)]
pub struct StaticService {
    pub html: String,
    pub title: Option<String>,
    pub capabilities: Capabilities,
}

impl StaticService {
    pub fn new(html: impl Into<String>) -> Self {
        Self {
            html: html.into(),
            ..Self::default()
        }
    }

    /// Set the inferred title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Declare a shortcode name.
    pub fn with_shortcode(mut self, name: impl Into<String>) -> Self {
        self.capabilities = self.capabilities.shortcode(name);
        self
    }

    /// Declare a routable uri.
    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.capabilities = self.capabilities.uri(uri);
        self
    }
}

impl Renderable for StaticService {
    fn render(&self, _args: &RenderArgs) -> Result<String, RenderError> {
        Ok(self.html.clone())
    }

    fn title(&self) -> Option<String> {
        self.title.clone()
    }

    fn describe(&self) -> Capabilities {
        self.capabilities.clone()
    }
}

/// A service that renders its arguments back, for asserting what a call
/// received.
///
/// Output is `<echo class="..">k=v;k=v;</echo>`, params in key order. The
/// class attribute is omitted when absent.
#[derive(Debug, Clone, Default)]
pub struct EchoService {
    pub shortcode: Option<String>,
}

impl EchoService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a shortcode name.
    pub fn with_shortcode(mut self, name: impl Into<String>) -> Self {
        self.shortcode = Some(name.into());
        self
    }
}

impl Renderable for EchoService {
    fn render(&self, args: &RenderArgs) -> Result<String, RenderError> {
        let params: String = args
            .params
            .iter()
            .map(|(k, v)| format!("{k}={v};"))
            .collect();
        Ok(match args.class() {
            Some(class) => format!(r#"<echo class="{class}">{params}</echo>"#),
            None => format!("<echo>{params}</echo>"),
        })
    }

    fn invoke(&self, method: &str, args: &RenderArgs) -> Result<String, RenderError> {
        match method {
            "render" => self.render(args),
            "shout" => Ok(self.render(args)?.to_uppercase()),
            other => Err(RenderError::UnknownMethod(other.to_string())),
        }
    }

    fn describe(&self) -> Capabilities {
        match &self.shortcode {
            Some(name) => Capabilities::default().shortcode(name.clone()),
            None => Capabilities::default(),
        }
    }
}

/// A service whose every call fails.
#[derive(Debug, Clone, Default)]
pub struct FailingService {
    pub shortcode: Option<String>,
}

impl FailingService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a shortcode name.
    pub fn with_shortcode(mut self, name: impl Into<String>) -> Self {
        self.shortcode = Some(name.into());
        self
    }
}

impl Renderable for FailingService {
    fn render(&self, _args: &RenderArgs) -> Result<String, RenderError> {
        Err(RenderError::failed("fixture failure"))
    }

    fn describe(&self) -> Capabilities {
        match &self.shortcode {
            Some(name) => Capabilities::default().shortcode(name.clone()),
            None => Capabilities::default(),
        }
    }
}

/// A site in a temporary directory.
///
/// The directory is removed when the value is dropped.
#[derive(Debug)]
pub struct TestSite {
    dir: TempDir,
}

impl TestSite {
    /// Create an empty site.
    pub fn new() -> Self {
        Self {
            dir: tempfile::tempdir().expect("failed to create temp dir"),
        }
    }

    /// Write `contents` to `relative`, creating parent directories.
    pub fn file(self, relative: impl AsRef<Path>, contents: impl AsRef<[u8]>) -> Self {
        let path = self.dir.path().join(relative);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).expect("failed to create fixture directory");
        }
        std::fs::write(&path, contents).expect("failed to write fixture file");
        self
    }

    /// Write `site.toml`.
    pub fn site_toml(self, toml: &str) -> Self {
        self.file("site.toml", toml)
    }

    /// Write a template under `templates/`.
    pub fn template(self, name: &str, contents: &str) -> Self {
        self.file(Path::new("templates").join(name), contents)
    }

    /// The site root.
    pub fn root(&self) -> &Path {
        self.dir.path()
    }

    /// Absolute path of `relative` inside the site.
    pub fn path(&self, relative: impl AsRef<Path>) -> PathBuf {
        self.dir.path().join(relative)
    }
}

impl Default for TestSite {
    fn default() -> Self {
        Self::new()
    }
}

/// Assertion helpers for rendered HTML.
pub mod assert {
    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert that a string does not contain a substring.
    pub fn not_contains(haystack: &str, needle: &str) {
        assert!(
            !haystack.contains(needle),
            "Expected string to not contain '{needle}'\nActual: {haystack}"
        );
    }

    /// Assert how often a substring occurs.
    pub fn occurrences(haystack: &str, needle: &str, expected: usize) {
        let actual = haystack.matches(needle).count();
        assert_eq!(
            actual, expected,
            "Expected '{needle}' {expected} time(s), found {actual}\nActual: {haystack}"
        );
    }

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &serde_json::Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }
}
