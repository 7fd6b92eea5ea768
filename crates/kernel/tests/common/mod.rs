//! Shared test infrastructure for kernel integration tests.

#![allow(dead_code)]

use agnstk_kernel::config::Config;
use agnstk_kernel::service::ServiceRegistry;
use agnstk_kernel::site::SiteConfig;
use agnstk_kernel::state::AppState;
use agnstk_test_utils::TestSite;
use axum::Router;
use axum::body::Body;
use axum::http::{Request, header};
use axum::response::Response;
use http_body_util::BodyExt;
use tower::ServiceExt;

/// Bearer token accepted by [`TestApp`].
pub const TEST_TOKEN: &str = "test-token";

/// A site on disk plus the router serving it.
pub struct TestApp {
    pub site: TestSite,
    pub state: AppState,
    pub router: Router,
}

impl TestApp {
    /// Serve `site` with the built-in services.
    pub fn new(site: TestSite) -> Self {
        Self::with_services(site, ServiceRegistry::with_builtin())
    }

    /// Serve `site` with the given services.
    pub fn with_services(site: TestSite, services: ServiceRegistry) -> Self {
        let state = build_state(&site, services);
        let router = agnstk_kernel::build_router(state.clone());
        Self {
            site,
            state,
            router,
        }
    }

    /// Send a request to the test application.
    pub async fn request(&self, request: Request<Body>) -> Response {
        self.router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request")
    }

    /// GET `uri` anonymously.
    pub async fn get(&self, uri: &str) -> Response {
        self.request(Request::get(uri).body(Body::empty()).unwrap())
            .await
    }

    /// GET `uri` with the test bearer token.
    pub async fn get_logged_in(&self, uri: &str) -> Response {
        self.request(
            Request::get(uri)
                .header(header::AUTHORIZATION, format!("Bearer {TEST_TOKEN}"))
                .body(Body::empty())
                .unwrap(),
        )
        .await
    }
}

/// Build state for `site`, reading its `site.toml` when present.
pub fn build_state(site: &TestSite, services: ServiceRegistry) -> AppState {
    let mut config = Config::new(site.root());
    config.auth_token = Some(TEST_TOKEN.to_string());

    let site_config = if config.site_config.is_file() {
        SiteConfig::load(&config.site_config).expect("failed to load site config")
    } else {
        SiteConfig::default()
    };

    AppState::from_parts(config, site_config, services).expect("failed to build state")
}

/// Collect a response body as a string.
pub async fn body_string(response: Response) -> String {
    let bytes = response
        .into_body()
        .collect()
        .await
        .expect("Failed to read body")
        .to_bytes();
    String::from_utf8(bytes.to_vec()).expect("body is not UTF-8")
}
