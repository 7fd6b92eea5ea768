//! Authentication state seen by the pipeline.
//!
//! Login itself happens elsewhere; the pipeline only asks whether the
//! current user is logged in.

/// Provider of the current user's authentication state.
pub trait AuthState {
    fn is_logged_in(&self) -> bool;
}

/// User context for the current request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UserContext {
    /// Whether the user is authenticated.
    pub authenticated: bool,
}

impl UserContext {
    /// Create context for anonymous user.
    pub fn anonymous() -> Self {
        Self {
            authenticated: false,
        }
    }

    /// Create context for authenticated user.
    pub fn authenticated() -> Self {
        Self {
            authenticated: true,
        }
    }
}

impl AuthState for UserContext {
    fn is_logged_in(&self) -> bool {
        self.authenticated
    }
}

impl AuthState for bool {
    fn is_logged_in(&self) -> bool {
        *self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn anonymous_is_default() {
        assert!(!UserContext::default().is_logged_in());
        assert_eq!(UserContext::default(), UserContext::anonymous());
    }

    #[test]
    fn authenticated_user() {
        assert!(UserContext::authenticated().is_logged_in());
        assert!(true.is_logged_in());
    }
}
