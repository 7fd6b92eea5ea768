//! Application state shared across all handlers.
//!
//! Every registry is built once at startup and is read-only afterwards.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::auth::{AuthState, UserContext};
use crate::config::Config;
use crate::content::{
    Block, BlockService, ContentResolver, ContentSource, LocalFileSystem, TemplateRenderer,
    html_escape,
};
use crate::error::{AppError, AppResult, ResolutionError};
use crate::menu::MenuRegistry;
use crate::page::{PageAccess, PageConfig, PageContext, PageService};
use crate::service::ServiceRegistry;
use crate::shortcode::ShortcodeRegistry;
use crate::site::SiteConfig;
use crate::theme::{SharedThemeEngine, ThemeEngine};

/// Shared application state.
///
/// Wrapped in Arc internally so Clone is cheap.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,

    /// Renderable services by name.
    services: Arc<ServiceRegistry>,

    /// Shortcode name -> service.
    shortcodes: Arc<ShortcodeRegistry>,

    /// Named blocks from the site config.
    blocks: BlockService,

    /// Pages from the site config plus service pages.
    pages: PageService,

    /// Theme engine for template rendering.
    theme: SharedThemeEngine,

    /// Turns content sources into blocks.
    resolver: ContentResolver,
}

impl AppState {
    /// Load the site config named by `config` and build the state around the
    /// built-in services.
    pub fn new(config: Config) -> Result<Self> {
        let site = SiteConfig::load(&config.site_config)?;
        Self::from_parts(config, site, ServiceRegistry::with_builtin())
    }

    /// Build the state from an already loaded site and service registry.
    pub fn from_parts(config: Config, site: SiteConfig, services: ServiceRegistry) -> Result<Self> {
        let services = Arc::new(services);
        debug!(services = ?services, "services registered");

        let shortcodes = Arc::new(
            ShortcodeRegistry::from_services(&services, &site.shortcodes)
                .context("failed to build shortcode registry")?,
        );

        let mut theme = ThemeEngine::new(&config.template_dir)?;
        theme.register_shortcodes(Arc::clone(&shortcodes), config.debug);
        let theme: SharedThemeEngine = Arc::new(theme);

        let fs = LocalFileSystem::new(&config.app_root)
            .trust_absolute_paths(config.trust_absolute_paths);
        let templates: Arc<dyn TemplateRenderer> = theme.clone();
        let resolver = ContentResolver::new(
            Arc::new(fs),
            Arc::clone(&services),
            Arc::clone(&shortcodes),
            templates,
        );

        let blocks = BlockService::from_definitions(site.blocks)
            .context("failed to load block definitions")?;

        let pages = PageService::new(
            site.pages,
            site.overrides,
            PageContext {
                blocks: &blocks,
                services: &services,
            },
        )
        .context("failed to load page definitions")?;

        info!(
            services = services.len(),
            shortcodes = shortcodes.len(),
            blocks = blocks.len(),
            pages = pages.len(),
            "application state ready"
        );

        Ok(Self {
            inner: Arc::new(AppStateInner {
                config,
                services,
                shortcodes,
                blocks,
                pages,
                theme,
                resolver,
            }),
        })
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    pub fn services(&self) -> &ServiceRegistry {
        &self.inner.services
    }

    pub fn shortcodes(&self) -> &ShortcodeRegistry {
        &self.inner.shortcodes
    }

    pub fn blocks(&self) -> &BlockService {
        &self.inner.blocks
    }

    pub fn pages(&self) -> &PageService {
        &self.inner.pages
    }

    pub fn theme(&self) -> &ThemeEngine {
        &self.inner.theme
    }

    pub fn resolver(&self) -> &ContentResolver {
        &self.inner.resolver
    }

    /// Menus visible to the current user.
    pub fn menus(&self, auth: &dyn AuthState) -> MenuRegistry {
        self.inner.pages.menu_items(auth)
    }

    /// Resolve the content block of page `page_id` without the page chrome.
    pub fn page_block(&self, page_id: &str, auth: &UserContext) -> AppResult<Block> {
        let login_url = &self.inner.config.login_url;
        let access = self.inner.pages.check_access(page_id, auth);
        if access == PageAccess::Disabled {
            return Err(AppError::Forbidden);
        }
        let page = access
            .into_page()
            .map_err(|e| AppError::from_resolution(e, login_url))?;

        let resolved = match &page.content_source {
            ContentSource::Block(block_id) => self.configured_block(&page, block_id),
            source => self.inner.resolver.resolve(source, &page.block),
        };
        resolved.map_err(|e| {
            debug!(page = %page_id, error = %e, "page content failed to resolve");
            AppError::from_resolution(e, login_url)
        })
    }

    /// Render configured block `block_id` as the content of `page`.
    ///
    /// A missing or disabled block leaves the page empty; in debug mode it
    /// shows a warning instead.
    fn configured_block(
        &self,
        page: &PageConfig,
        block_id: &str,
    ) -> Result<Block, ResolutionError> {
        let blocks = &self.inner.blocks;
        let available = blocks.get(block_id).is_some_and(|block| block.enabled);

        match blocks.render(block_id, &self.inner.resolver, Some(&page.title)) {
            Err(ResolutionError::NotFound(_)) if !available => {
                warn!(page = %page.id, block = %block_id, "page block not found or disabled");
                let content = if self.inner.config.debug {
                    format!(
                        "<div class=\"alert alert-warning\">Block \"{}\" not found or disabled.</div>",
                        html_escape(block_id)
                    )
                } else {
                    String::new()
                };
                self.inner
                    .resolver
                    .resolve(&ContentSource::Content(content), &page.block)
            }
            rendered => rendered,
        }
    }

    /// Render page `page_id` as a full HTML document.
    pub fn render_page(&self, page_id: &str, auth: &UserContext) -> AppResult<String> {
        let block = self.page_block(page_id, auth)?;
        let page = self
            .inner
            .pages
            .get_page_config(page_id, auth)
            .ok_or(AppError::NotFound)?;
        let menus = self.menus(auth);

        let html = self
            .inner
            .theme
            .render_page(&page, &block, &menus, auth.is_logged_in())?;
        Ok(html)
    }

    /// Render the page routed at `uri`.
    pub fn render_uri(&self, uri: &str, auth: &UserContext) -> AppResult<String> {
        let page_id = self
            .inner
            .pages
            .page_id_for_uri(uri)
            .ok_or(AppError::NotFound)?
            .to_string();
        self.render_page(&page_id, auth)
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("services", &self.inner.services)
            .field("shortcodes", &self.inner.shortcodes)
            .field("pages", &self.inner.pages.len())
            .field("blocks", &self.inner.blocks.len())
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn state(toml: &str) -> (tempfile::TempDir, AppState) {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "# Welcome\n\nHello **world**.").unwrap();
        let site = SiteConfig::from_toml_str(toml).unwrap();
        let state =
            AppState::from_parts(Config::new(dir.path()), site, ServiceRegistry::with_builtin())
                .unwrap();
        (dir, state)
    }

    const SITE: &str = r#"
        [pages.about]
        uri = "/"
        source = "README.md"
        menu = true

        [pages.dashboard]
        enabled = "auth_required"
        content = "Secret"

        [pages.members]
        enabled = "logged_in"
        content = "Members"

        [pages.off]
        enabled = false
        content = "Off"
    "#;

    #[test]
    fn renders_file_page_with_menu() {
        let (_dir, state) = state(SITE);
        let html = state.render_uri("/", &UserContext::anonymous()).unwrap();
        assert!(html.contains("<strong>world</strong>"));
        assert!(html.contains("Welcome"));
        assert!(html.contains(r#"href="/""#));
    }

    #[test]
    fn access_outcomes() {
        let (_dir, state) = state(SITE);
        let anon = UserContext::anonymous();
        assert!(matches!(
            state.render_page("dashboard", &anon),
            Err(AppError::LoginRequired(url)) if url == "/login"
        ));
        assert!(matches!(state.render_page("members", &anon), Err(AppError::Forbidden)));
        assert!(matches!(state.render_page("off", &anon), Err(AppError::Forbidden)));
        assert!(matches!(state.render_page("nope", &anon), Err(AppError::NotFound)));

        let user = UserContext::authenticated();
        assert!(state.render_page("dashboard", &user).unwrap().contains("Secret"));
        assert!(state.render_page("members", &user).unwrap().contains("Members"));
    }

    #[test]
    fn service_page_from_builtin() {
        let (_dir, state) = state(SITE);
        let html = state.render_uri("/hello", &UserContext::anonymous()).unwrap();
        assert!(html.contains("Hello from AGNSTK!"));
    }

    const BLOCK_SITE: &str = r#"
        [blocks.notice]
        title = "Notice"
        content = "Read **this**."
        class = "callout"

        [blocks.hidden]
        content = "Hidden"
        enabled = false

        [blocks.broken]
        source = "missing.md"

        [pages.notice]
        title = "Notice"
        content_source = "block"

        [pages.hidden-page]
        content_source = "block"
        content_id = "hidden"

        [pages.ghost-page]
        content_source = "block"
        content_id = "ghost"

        [pages.broken-page]
        content_source = "block"
        content_id = "broken"
    "#;

    #[test]
    fn block_pages_render_the_configured_block() {
        let (_dir, state) = state(BLOCK_SITE);
        let block = state.page_block("notice", &UserContext::anonymous()).unwrap();
        assert_eq!(block.id, "notice");
        assert_eq!(block.content, "<p>Read <strong>this</strong>.</p>\n");
        assert_eq!(block.class(), Some("callout"));
        // Same title as the page.
        assert!(!block.show_title);
    }

    #[test]
    fn missing_or_disabled_blocks_leave_the_page_empty() {
        let (_dir, state) = state(BLOCK_SITE);
        let anon = UserContext::anonymous();
        for page in ["hidden-page", "ghost-page"] {
            let block = state.page_block(page, &anon).unwrap();
            assert_eq!(block.content, "", "{page}");
        }
    }

    #[test]
    fn missing_blocks_warn_in_debug_mode() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::new(dir.path());
        config.debug = true;
        let site = SiteConfig::from_toml_str(BLOCK_SITE).unwrap();
        let state = AppState::from_parts(config, site, ServiceRegistry::new()).unwrap();

        let block = state
            .page_block("ghost-page", &UserContext::anonymous())
            .unwrap();
        assert!(block.content.contains(r#"Block "ghost" not found or disabled."#));
    }

    #[test]
    fn block_source_errors_are_not_swallowed() {
        let (_dir, state) = state(BLOCK_SITE);
        assert!(matches!(
            state.page_block("broken-page", &UserContext::anonymous()),
            Err(AppError::NotFound)
        ));
    }

    #[test]
    fn unknown_shortcode_service_fails_startup() {
        let dir = tempfile::tempdir().unwrap();
        let site = SiteConfig::from_toml_str("[shortcodes]\nx = \"Missing\"").unwrap();
        assert!(
            AppState::from_parts(Config::new(dir.path()), site, ServiceRegistry::new()).is_err()
        );
    }
}
