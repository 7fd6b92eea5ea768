//! Bearer token authentication middleware.
//!
//! Checks `Authorization: Bearer <token>` against the configured token and
//! sets the user context. Requests without a matching token stay anonymous.

use axum::{
    body::Body,
    extract::State,
    http::Request,
    http::header,
    middleware::Next,
    response::Response,
};
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::auth::UserContext;
use crate::state::AppState;

/// Insert a [`UserContext`] into the request extensions.
pub async fn authenticate_bearer_token(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let token = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    let user = match (token, state.config().auth_token.as_deref()) {
        (Some(token), Some(expected)) if token_matches(token, expected) => {
            UserContext::authenticated()
        }
        (Some(_), _) => {
            debug!("bearer token rejected");
            UserContext::anonymous()
        }
        (None, _) => UserContext::anonymous(),
    };

    request.extensions_mut().insert(user);
    next.run(request).await
}

/// Compare in constant time.
fn token_matches(presented: &str, expected: &str) -> bool {
    presented.as_bytes().ct_eq(expected.as_bytes()).into()
}
