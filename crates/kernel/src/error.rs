//! Error types.
//!
//! [`ResolutionError`] is what the content pipeline reports to its caller.
//! [`AppError`] is what the HTTP front turns into a response.

use axum::http::StatusCode;
use axum::http::header::LOCATION;
use axum::response::{Html, IntoResponse, Response};
use thiserror::Error;

/// Failure to turn a content source into a block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResolutionError {
    /// A file, view, service, block or page does not exist (or is outside
    /// the application root).
    #[error("not found: {0}")]
    NotFound(String),

    /// A service callback returned an error.
    #[error("handler failed: {0}")]
    HandlerFailed(String),

    /// A configuration entry names no recognised content source.
    #[error("unknown content source: {0}")]
    UnknownContentSource(String),

    /// The content requires a logged-in user.
    #[error("login required")]
    Unauthorized,
}

/// Application errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("not found")]
    NotFound,

    #[error("forbidden")]
    Forbidden,

    /// Redirect target for the login page.
    #[error("login required")]
    LoginRequired(String),

    #[error("handler failed: {0}")]
    HandlerFailed(String),
}

impl AppError {
    /// Map a pipeline error, redirecting to `login_url` when login is required.
    pub fn from_resolution(error: ResolutionError, login_url: &str) -> Self {
        match error {
            ResolutionError::NotFound(_) => AppError::NotFound,
            ResolutionError::HandlerFailed(message) => AppError::HandlerFailed(message),
            ResolutionError::UnknownContentSource(source) => {
                AppError::Internal(anyhow::anyhow!("unknown content source: {source}"))
            }
            ResolutionError::Unauthorized => AppError::LoginRequired(login_url.to_string()),
        }
    }
}

/// Maps with the default login url, `/login`.
impl From<ResolutionError> for AppError {
    fn from(error: ResolutionError) -> Self {
        Self::from_resolution(error, "/login")
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Forbidden => StatusCode::FORBIDDEN,
            AppError::LoginRequired(_) => StatusCode::SEE_OTHER,
            AppError::HandlerFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        // Handler and internal details go to the log, never to the client.
        let body = match &self {
            AppError::Internal(e) => {
                tracing::error!(error = %e, "internal server error");
                "internal server error".to_string()
            }
            AppError::HandlerFailed(message) => {
                tracing::error!(error = %message, "content handler failed");
                "internal server error".to_string()
            }
            AppError::LoginRequired(location) => {
                return (status, [(LOCATION, location.clone())]).into_response();
            }
            _ => self.to_string(),
        };

        (status, Html(body)).into_response()
    }
}

/// Result type alias using AppError.
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolution_errors_map_to_app_errors() {
        assert!(matches!(
            AppError::from_resolution(ResolutionError::NotFound("x".into()), "/login"),
            AppError::NotFound
        ));
        assert!(matches!(
            AppError::from_resolution(ResolutionError::HandlerFailed("boom".into()), "/login"),
            AppError::HandlerFailed(m) if m == "boom"
        ));
        assert!(matches!(
            AppError::from_resolution(ResolutionError::Unauthorized, "/signin"),
            AppError::LoginRequired(url) if url == "/signin"
        ));
        assert!(matches!(
            AppError::from_resolution(
                ResolutionError::UnknownContentSource("carrier-pigeon".into()),
                "/login"
            ),
            AppError::Internal(_)
        ));
    }

    #[test]
    fn status_codes() {
        assert_eq!(AppError::NotFound.into_response().status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::Forbidden.into_response().status(), StatusCode::FORBIDDEN);

        let redirect = AppError::LoginRequired("/login".into()).into_response();
        assert_eq!(redirect.status(), StatusCode::SEE_OTHER);
        assert_eq!(
            redirect.headers().get(LOCATION).and_then(|v| v.to_str().ok()),
            Some("/login")
        );
    }

    #[test]
    fn resolution_error_messages() {
        assert_eq!(
            ResolutionError::NotFound("README.md".into()).to_string(),
            "not found: README.md"
        );
        assert_eq!(ResolutionError::Unauthorized.to_string(), "login required");
    }
}
