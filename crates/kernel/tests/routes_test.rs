#![allow(clippy::unwrap_used, clippy::expect_used)]
//! HTTP route tests against the real router.

mod common;

use agnstk_kernel::service::ServiceRegistry;
use agnstk_test_utils::{FailingService, TestSite, assert};
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use common::{TestApp, body_string};

fn app() -> TestApp {
    let site = TestSite::new()
        .file("README.md", "# Welcome\n\nHello **world**.")
        .site_toml(
            r#"
            [pages.about]
            uri = "/"
            source = "README.md"
            menu = true

            [pages.docs]
            uri = "/docs/intro"
            content = "<p>Intro</p>"

            [pages.dashboard]
            enabled = "auth_required"
            content = "<p>Secret</p>"

            [pages.members]
            enabled = "logged_in"
            content = "<p>Members</p>"

            [pages.missing-file]
            source = "nowhere.md"

            [pages.broken]
            callback = "FailingService"
            "#,
        );
    TestApp::with_services(
        site,
        ServiceRegistry::with_builtin().register("FailingService", FailingService::new()),
    )
}

#[tokio::test]
async fn test_health() {
    let app = app();
    let response = app.get("/health").await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["status"], "healthy");
    agnstk_test_utils::assert::has_key(&body, "pages");
}

#[tokio::test]
async fn test_front_page() {
    let app = app();
    let response = app.get("/").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "text/html; charset=utf-8"
    );
    let body = body_string(response).await;
    assert::contains(&body, "<strong>world</strong>");
}

#[tokio::test]
async fn test_nested_uri_and_trailing_slash() {
    let app = app();
    for uri in ["/docs/intro", "/docs/intro/"] {
        let response = app.get(uri).await;
        assert_eq!(response.status(), StatusCode::OK, "{uri}");
        assert::contains(&body_string(response).await, "<p>Intro</p>");
    }
}

#[tokio::test]
async fn test_unknown_uri_is_404() {
    let response = app().get("/no/such/page").await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_login_redirect() {
    let app = app();
    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(response.headers().get(header::LOCATION).unwrap(), "/login");

    let response = app.get_logged_in("/dashboard").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert::contains(&body_string(response).await, "Secret");
}

#[tokio::test]
async fn test_wrong_token_stays_anonymous() {
    let app = app();
    let response = app
        .request(
            Request::get("/dashboard")
                .header(header::AUTHORIZATION, "Bearer wrong")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
}

#[tokio::test]
async fn test_disabled_for_user_is_403() {
    let app = app();
    assert_eq!(app.get("/members").await.status(), StatusCode::FORBIDDEN);
    assert_eq!(app.get_logged_in("/members").await.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_missing_file_is_404() {
    assert_eq!(app().get("/missing-file").await.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_handler_failure_is_500_without_details() {
    let response = app().get("/broken").await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert::not_contains(&body_string(response).await, "fixture failure");
}

#[tokio::test]
async fn test_service_page_route() {
    let response = app().get("/hello").await;
    assert_eq!(response.status(), StatusCode::OK);
    assert::contains(&body_string(response).await, "Hello from AGNSTK!");
}
