//! Page routes: every uri not claimed elsewhere is looked up as a page.

use axum::extract::{Path, State};
use axum::response::Html;
use axum::routing::get;
use axum::{Extension, Router};

use crate::auth::UserContext;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// Render the page at `/`.
async fn front_page(
    State(state): State<AppState>,
    user: Option<Extension<UserContext>>,
) -> AppResult<Html<String>> {
    render(state, "/".to_string(), user).await
}

/// Render the page at `/{path}`.
async fn page(
    State(state): State<AppState>,
    Path(path): Path<String>,
    user: Option<Extension<UserContext>>,
) -> AppResult<Html<String>> {
    render(state, format!("/{path}"), user).await
}

async fn render(
    state: AppState,
    uri: String,
    user: Option<Extension<UserContext>>,
) -> AppResult<Html<String>> {
    let user = user.map(|Extension(u)| u).unwrap_or_default();

    // Reads files and runs service handlers.
    let html = tokio::task::spawn_blocking(move || state.render_uri(&uri, &user))
        .await
        .map_err(|e| AppError::Internal(anyhow::anyhow!("page render task failed: {e}")))??;

    Ok(Html(html))
}

/// Create the page router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(front_page))
        .route("/{*path}", get(page))
}
