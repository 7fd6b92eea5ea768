//! AGNSTK kernel library.
//!
//! Resolves pages and blocks from a site configuration, converts Markdown,
//! expands shortcodes and renders the result through Tera templates. The
//! `agnstk` binary serves it over HTTP and from the command line.

pub mod auth;
pub mod config;
pub mod content;
pub mod error;
pub mod menu;
pub mod middleware;
pub mod page;
pub mod routes;
pub mod service;
pub mod shortcode;
pub mod site;
pub mod state;
pub mod theme;

use axum::Router;

use crate::state::AppState;

/// All routes with the bearer middleware applied.
///
/// Page routes catch every path, so they are merged last.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::health::router())
        .merge(routes::page::router())
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::authenticate_bearer_token,
        ))
        .with_state(state)
}
