//! Client-side routes and the navigation seam.
//!
//! The portal has four routes: the landing page, the login page, the
//! protected admin panel and the public share page. Components that need to
//! "redirect to login" do so through a [`Navigator`] so they can be driven
//! without a browser or terminal attached.

use std::fmt;

/// Path segment that prefixes every public share link.
pub const SHARE_PATH_PREFIX: &str = "/share/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Landing,
    Login,
    Admin,
    Share(String),
}

impl Route {
    pub fn path(&self) -> String {
        match self {
            Route::Landing => "/".to_string(),
            Route::Login => "/login".to_string(),
            Route::Admin => "/admin".to_string(),
            Route::Share(token) => format!("{}{}", SHARE_PATH_PREFIX, token),
        }
    }

    /// Parse a path into a route. Unknown paths and empty share tokens
    /// yield `None`.
    pub fn parse(path: &str) -> Option<Self> {
        let trimmed = path.trim_end_matches('/');
        match trimmed {
            "" => Some(Route::Landing),
            "/login" => Some(Route::Login),
            "/admin" => Some(Route::Admin),
            _ => {
                let token = trimmed.strip_prefix(SHARE_PATH_PREFIX)?;
                if token.is_empty() || token.contains('/') {
                    None
                } else {
                    Some(Route::Share(token.to_string()))
                }
            }
        }
    }

    /// Whether the route needs an authenticated session.
    pub fn is_protected(&self) -> bool {
        matches!(self, Route::Admin)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

/// Moves the user to another route.
///
/// Implementations must not block; the interceptor calls this while a
/// request is failing.
pub trait Navigator: Send + Sync {
    fn navigate(&self, route: Route);

    fn redirect_to_login(&self) {
        self.navigate(Route::Login);
    }
}

/// Navigator that only logs. Used when nothing is listening for redirects.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogNavigator;

impl Navigator for LogNavigator {
    fn navigate(&self, route: Route) {
        tracing::info!(route = %route, "Navigation requested");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_paths() {
        assert_eq!(Route::Landing.path(), "/");
        assert_eq!(Route::Login.path(), "/login");
        assert_eq!(Route::Admin.path(), "/admin");
        assert_eq!(Route::Share("abc".to_string()).path(), "/share/abc");
    }

    #[test]
    fn test_route_parse() {
        assert_eq!(Route::parse("/"), Some(Route::Landing));
        assert_eq!(Route::parse("/login"), Some(Route::Login));
        assert_eq!(Route::parse("/admin/"), Some(Route::Admin));
        assert_eq!(Route::parse("/share/t0k"), Some(Route::Share("t0k".to_string())));
        assert_eq!(Route::parse("/share/"), None);
        assert_eq!(Route::parse("/share/a/b"), None);
        assert_eq!(Route::parse("/unknown"), None);
    }

    #[test]
    fn test_only_admin_is_protected() {
        assert!(Route::Admin.is_protected());
        assert!(!Route::Login.is_protected());
        assert!(!Route::Landing.is_protected());
        assert!(!Route::Share("x".to_string()).is_protected());
    }
}
