//! Page service - resolves page ids and uris to page configs.
//!
//! Definitions are validated and defaulted once at startup. Per request only
//! the enabled rule is evaluated against the current user.

use std::collections::BTreeMap;

use agnstk_sdk::MenuConfig;
use tracing::{debug, info, warn};

use super::config::{EnabledRule, MenuValue, PageConfig, PageDefinition, normalize_uri};
use crate::auth::AuthState;
use crate::content::{BlockOptions, BlockService, ContentSource, DEFAULT_METHOD, humanize};
use crate::error::ResolutionError;
use crate::menu::{MenuItem, MenuRegistry};
use crate::service::ServiceRegistry;

/// Outcome of an access check, so callers can pick 404, 403 or a login
/// redirect.
#[derive(Debug, Clone, PartialEq)]
pub enum PageAccess {
    NotFound,
    Disabled,
    LoginRequired,
    Allowed(Box<PageConfig>),
}

impl PageAccess {
    /// The allowed page, or the pipeline error for a denied one.
    ///
    /// A disabled page reads as not found here; callers that can answer 403
    /// should check for [`PageAccess::Disabled`] first.
    pub fn into_page(self) -> Result<PageConfig, ResolutionError> {
        match self {
            PageAccess::Allowed(page) => Ok(*page),
            PageAccess::LoginRequired => Err(ResolutionError::Unauthorized),
            PageAccess::NotFound | PageAccess::Disabled => {
                Err(ResolutionError::NotFound("page".to_string()))
            }
        }
    }
}

/// Everything a page needs from the rest of the site at startup.
#[derive(Debug, Clone, Copy)]
pub struct PageContext<'a> {
    pub blocks: &'a BlockService,
    pub services: &'a ServiceRegistry,
}

/// Registry of resolved pages.
#[derive(Debug, Clone, Default)]
pub struct PageService {
    pages: BTreeMap<String, PageConfig>,
    /// Normalised uri -> page id.
    uris: BTreeMap<String, String>,
}

impl PageService {
    /// Build pages from definitions merged with their overrides, plus a page
    /// for each service that declares a uri.
    ///
    /// Fails on the first page with an unknown legacy content source.
    pub fn new(
        definitions: BTreeMap<String, PageDefinition>,
        mut overrides: BTreeMap<String, PageDefinition>,
        ctx: PageContext<'_>,
    ) -> Result<Self, ResolutionError> {
        let mut service = Self::default();

        for (id, definition) in definitions {
            let definition = match overrides.remove(&id) {
                Some(over) => definition.merge(over),
                None => definition,
            };
            let page = build_page(&id, definition, &ctx)?;
            service.insert(page);
        }

        for id in overrides.keys() {
            warn!(page = %id, "override for unknown page ignored");
        }

        service.add_service_pages(ctx.services);

        info!(pages = service.pages.len(), "pages loaded");
        Ok(service)
    }

    /// Pages from definitions alone: no overrides, blocks or service pages.
    pub fn from_definitions(
        definitions: BTreeMap<String, PageDefinition>,
    ) -> Result<Self, ResolutionError> {
        let blocks = BlockService::default();
        let services = ServiceRegistry::new();
        Self::new(
            definitions,
            BTreeMap::new(),
            PageContext {
                blocks: &blocks,
                services: &services,
            },
        )
    }

    fn insert(&mut self, page: PageConfig) {
        match self.uris.get(&page.uri) {
            Some(existing) => {
                warn!(page = %page.id, uri = %page.uri, existing = %existing, "uri already taken, page not routable");
            }
            None => {
                self.uris.insert(page.uri.clone(), page.id.clone());
            }
        }
        self.pages.insert(page.id.clone(), page);
    }

    fn add_service_pages(&mut self, services: &ServiceRegistry) {
        for (name, capabilities) in services.capabilities() {
            let Some(uri) = capabilities.uri else {
                continue;
            };
            let uri = normalize_uri(&uri);
            let id = service_page_id(&uri, name);

            if self.pages.contains_key(&id) || self.uris.contains_key(&uri) {
                debug!(service = %name, page = %id, "configured page takes precedence");
                continue;
            }

            let title = services
                .resolve(name)
                .and_then(|s| s.title())
                .unwrap_or_else(|| humanize(&id));
            let menu = capabilities
                .menu
                .unwrap_or_else(|| MenuConfig::new(title.clone()).disabled());

            debug!(service = %name, page = %id, uri = %uri, "service page added");
            self.insert(PageConfig {
                block: BlockOptions::new(id.clone()).page_title(title.clone()),
                id,
                title,
                uri,
                rule: EnabledRule::Always,
                enabled: true,
                auth_required: false,
                menu,
                content_source: ContentSource::Callback {
                    service: name.to_string(),
                    method: DEFAULT_METHOD.to_string(),
                },
            });
        }
    }

    /// The page config for `page_id`, evaluated for the current user.
    pub fn get_page_config(&self, page_id: &str, auth: &dyn AuthState) -> Option<PageConfig> {
        let mut page = self.pages.get(page_id)?.clone();
        page.enabled = page.rule.is_enabled(auth);
        Some(page)
    }

    /// Decide whether the current user may view `page_id`.
    pub fn check_access(&self, page_id: &str, auth: &dyn AuthState) -> PageAccess {
        let Some(page) = self.get_page_config(page_id, auth) else {
            return PageAccess::NotFound;
        };
        if !page.enabled {
            return PageAccess::Disabled;
        }
        if page.auth_required && !auth.is_logged_in() {
            return PageAccess::LoginRequired;
        }
        PageAccess::Allowed(Box::new(page))
    }

    /// Id of the page routed at `uri`.
    pub fn page_id_for_uri(&self, uri: &str) -> Option<&str> {
        self.uris.get(&normalize_uri(uri)).map(String::as_str)
    }

    /// The page routed at `uri`, evaluated for the current user.
    pub fn find_by_uri(&self, uri: &str, auth: &dyn AuthState) -> Option<PageConfig> {
        self.page_id_for_uri(uri)
            .and_then(|id| self.get_page_config(id, auth))
    }

    /// Pages enabled for the current user, by id.
    pub fn enabled_pages(&self, auth: &dyn AuthState) -> Vec<PageConfig> {
        self.pages
            .keys()
            .filter_map(|id| self.get_page_config(id, auth))
            .filter(|page| page.enabled)
            .collect()
    }

    /// Menus built from the enabled pages with an enabled menu entry.
    pub fn menu_items(&self, auth: &dyn AuthState) -> MenuRegistry {
        MenuRegistry::from_items(
            self.enabled_pages(auth)
                .into_iter()
                .filter(|page| page.menu.enabled)
                .map(|page| MenuItem {
                    menu_id: page.menu.menu_id,
                    page_id: page.id,
                    label: page.menu.label,
                    uri: page.uri,
                    order: page.menu.order,
                    auth_required: page.auth_required,
                }),
        )
    }

    /// Page ids, sorted.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.pages.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.pages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pages.is_empty()
    }
}

/// Derive a page id from a service uri: `/hello/world` becomes `hello-world`.
fn service_page_id(uri: &str, service: &str) -> String {
    let slug = uri.trim_matches('/').replace('/', "-");
    if slug.is_empty() {
        service.to_ascii_lowercase()
    } else {
        slug
    }
}

/// Apply defaults to one definition.
fn build_page(
    id: &str,
    definition: PageDefinition,
    ctx: &PageContext<'_>,
) -> Result<PageConfig, ResolutionError> {
    let title = definition.title.clone().unwrap_or_else(|| humanize(id));
    let uri = normalize_uri(definition.uri.as_deref().unwrap_or(id));
    let rule = definition
        .enabled
        .as_ref()
        .map_or(EnabledRule::Always, |v| v.rule());
    let auth_required =
        definition.auth_required.unwrap_or(false) || rule == EnabledRule::AuthRequired;

    // An absent menu key means no menu entry.
    let menu = definition
        .menu
        .clone()
        .unwrap_or(MenuValue::Flag(false))
        .resolve(&title, auth_required);

    let content_source = select_source(id, &definition, ctx)?;

    let mut attributes = definition.attributes;
    if let Some(class) = definition.class {
        attributes.insert("class".to_string(), class);
    }

    let block = BlockOptions {
        id: id.to_string(),
        title: definition.block_title,
        page_title: Some(title.clone()),
        attributes,
        show_title: definition.show_title,
        text_format: definition.text_format.unwrap_or_default(),
    };

    Ok(PageConfig {
        id: id.to_string(),
        title,
        uri,
        rule,
        enabled: rule != EnabledRule::Disabled,
        auth_required,
        menu,
        content_source,
        block,
    })
}

/// Pick the content source, by precedence: `content`, `source`,
/// `callback`, `view`, legacy `content_source`, then the view named
/// after the page.
fn select_source(
    id: &str,
    definition: &PageDefinition,
    ctx: &PageContext<'_>,
) -> Result<ContentSource, ResolutionError> {
    let data = definition.data.clone().unwrap_or(serde_json::Value::Null);

    if let Some(content) = &definition.content {
        return Ok(ContentSource::Content(content.clone()));
    }
    if let Some(source) = &definition.source {
        return Ok(ContentSource::from_source(source));
    }
    if let Some(callback) = &definition.callback {
        return Ok(ContentSource::callback(callback));
    }
    if let Some(view) = &definition.view {
        return Ok(ContentSource::View {
            view: view.clone(),
            data,
        });
    }

    let Some(kind) = definition.content_source.as_deref() else {
        return Ok(ContentSource::View {
            view: id.to_string(),
            data,
        });
    };

    let target = definition.content_id.as_deref().unwrap_or(id);
    match kind {
        "block" => {
            // Rendered per request; a missing block only leaves the page empty.
            if !ctx.blocks.get(target).is_some_and(|block| block.enabled) {
                warn!(page = %id, block = %target, "page block not found or disabled");
            }
            Ok(ContentSource::Block(target.to_string()))
        }
        "service" => Ok(ContentSource::callback(target)),
        "view" => Ok(ContentSource::View {
            view: target.to_string(),
            data,
        }),
        other => Err(ResolutionError::UnknownContentSource(format!(
            "page {id}: {other}"
        ))),
    }
}
