//! Configuration loaded from environment variables.

use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port (default: 3000).
    pub port: u16,

    /// Root that relative content paths resolve against (default: .).
    pub app_root: PathBuf,

    /// Site configuration file, TOML or YAML (default: <app_root>/site.toml).
    pub site_config: PathBuf,

    /// Tera template directory (default: <app_root>/templates).
    pub template_dir: PathBuf,

    /// Accept absolute content paths outside the app root (default: false).
    pub trust_absolute_paths: bool,

    /// Bearer token that marks a request as logged in. When None, nobody is.
    pub auth_token: Option<String>,

    /// Where login-required pages redirect to (default: /login).
    pub login_url: String,

    /// Show warnings for missing blocks and shortcodes (default: false).
    pub debug: bool,
}

impl Config {
    /// Defaults for a site rooted at `app_root`.
    pub fn new(app_root: impl Into<PathBuf>) -> Self {
        let app_root = app_root.into();
        Self {
            port: 3000,
            site_config: app_root.join("site.toml"),
            template_dir: app_root.join("templates"),
            app_root,
            trust_absolute_paths: false,
            auth_token: None,
            login_url: "/login".to_string(),
            debug: false,
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        let port = env::var("PORT")
            .unwrap_or_else(|_| "3000".to_string())
            .parse()
            .context("PORT must be a valid u16")?;

        let app_root = env::var("APP_ROOT")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("."));

        let site_config = env::var("SITE_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_root.join("site.toml"));

        let template_dir = env::var("TEMPLATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| app_root.join("templates"));

        let trust_absolute_paths = parse_flag("TRUST_ABSOLUTE_PATHS")?;

        let auth_token = env::var("AUTH_TOKEN").ok().filter(|t| !t.is_empty());

        let login_url = env::var("LOGIN_URL").unwrap_or_else(|_| "/login".to_string());

        let debug = parse_flag("DEBUG")?;

        Ok(Self {
            port,
            app_root,
            site_config,
            template_dir,
            trust_absolute_paths,
            auth_token,
            login_url,
            debug,
        })
    }

    pub fn app_root(&self) -> &Path {
        &self.app_root
    }
}

fn parse_flag(name: &str) -> Result<bool> {
    match env::var(name) {
        Ok(value) => parse_bool(&value).with_context(|| format!("{name} must be true or false")),
        Err(_) => Ok(false),
    }
}

fn parse_bool(value: &str) -> Result<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" | "" => Ok(false),
        other => anyhow::bail!("not a boolean: {other}"),
    }
}
