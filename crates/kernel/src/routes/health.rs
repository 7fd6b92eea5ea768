//! Health check endpoint.
//!
//! Everything is loaded at startup, so a running server is healthy. The body
//! reports what was loaded.

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::state::AppState;

/// Health check response.
#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    pages: usize,
    blocks: usize,
    services: usize,
    shortcodes: usize,
}

/// Health check handler.
async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        pages: state.pages().len(),
        blocks: state.blocks().len(),
        services: state.services().len(),
        shortcodes: state.shortcodes().len(),
    })
}

/// Create the health check router.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health_check))
}
