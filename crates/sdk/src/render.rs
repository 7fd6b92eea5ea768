//! The render contract.
//!
//! Services return HTML fragments. The kernel decides where the fragment goes
//! (a shortcode substitution, a page body, a block) and never re-parses it.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::Capabilities;

/// Arguments passed to a render call.
///
/// Shortcode attributes land in `params`, except `class`, which is an HTML
/// attribute for the wrapper and lands in `attributes`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderArgs {
    #[serde(default)]
    pub params: BTreeMap<String, String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

impl RenderArgs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Look up a parameter.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.params.get(key).map(String::as_str)
    }

    /// Look up a required parameter.
    pub fn require(&self, key: &str) -> Result<&str, RenderError> {
        self.get(key)
            .ok_or_else(|| RenderError::MissingParam(key.to_string()))
    }

    /// The `class` attribute, if any.
    pub fn class(&self) -> Option<&str> {
        self.attributes.get("class").map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.attributes.is_empty()
    }
}

/// Errors a service may report from a render call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RenderError {
    #[error("render failed: {0}")]
    Failed(String),

    #[error("unknown method: {0}")]
    UnknownMethod(String),

    #[error("missing parameter: {0}")]
    MissingParam(String),
}

impl RenderError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// A named render capability.
///
/// Implementations are registered once at startup and shared across requests,
/// so they must be `Send + Sync` and must not rely on per-request mutation.
pub trait Renderable: Send + Sync {
    /// Render an HTML fragment.
    fn render(&self, args: &RenderArgs) -> Result<String, RenderError>;

    /// Invoke a named method, as written in a `Service@method` callback.
    ///
    /// Only `render` is callable unless the implementation overrides this.
    fn invoke(&self, method: &str, args: &RenderArgs) -> Result<String, RenderError> {
        match method {
            "render" => self.render(args),
            other => Err(RenderError::UnknownMethod(other.to_string())),
        }
    }

    /// Title to use when the caller does not provide one.
    fn title(&self) -> Option<String> {
        None
    }

    /// What this service provides beyond rendering.
    fn describe(&self) -> Capabilities {
        Capabilities::default()
    }
}
