//! Admin session controller: login, logout and the protected-route guard.

use std::sync::Arc;

use tracing::{error, info};

use crate::api::{ApiClient, ApiError, Field, FieldErrors};
use crate::routes::{Navigator, Route};

use super::session::{Session, SessionStores};

const USERNAME_REQUIRED: &str = "Username is required";
const PASSWORD_REQUIRED: &str = "Password is required";

/// Credentials as typed into the login form.
#[derive(Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Check that both fields are filled in. Reports every empty field.
    pub fn validate(&self) -> Result<(), FieldErrors> {
        let mut errors = FieldErrors::default();
        if self.username.is_empty() {
            errors.add(Field::Username, USERNAME_REQUIRED);
        }
        if self.password.is_empty() {
            errors.add(Field::Password, PASSWORD_REQUIRED);
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Owns the session lifecycle. Shares its stores and navigator with the
/// `ApiClient`, so tokens rotated by the refresh interceptor are visible here.
#[derive(Clone)]
pub struct AuthController {
    api: ApiClient,
}

impl AuthController {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    pub fn api(&self) -> &ApiClient {
        &self.api
    }

    fn stores(&self) -> &SessionStores {
        self.api.stores()
    }

    fn navigator(&self) -> &Arc<dyn Navigator> {
        self.api.navigator()
    }

    /// Validate the credentials, log in and persist the issued tokens.
    pub async fn login(&self, username: &str, password: &str) -> Result<Session, ApiError> {
        LoginForm::new(username, password)
            .validate()
            .map_err(ApiError::Validation)?;

        let pair = match self.api.login(username, password).await {
            Ok(pair) => pair,
            Err(e) => {
                error!(error = %e, "Login failed");
                return Err(e);
            }
        };

        self.stores().store_pair(&pair).map_err(|e| {
            error!(error = %e, "Failed to persist tokens after login");
            self.stores().clear();
            ApiError::Protocol(format!("Could not save session: {}", e))
        })?;

        info!("Login successful");
        Ok(self.stores().session())
    }

    /// Clear both stores and go back to the login page. Always succeeds.
    pub fn logout(&self) {
        self.stores().clear();
        info!("Logged out");
        self.navigator().navigate(Route::Login);
    }

    /// Guard for protected routes. Only checks that an access token is
    /// present; it is not verified with the server.
    pub fn require_auth(&self) -> bool {
        if self.stores().access_token().is_some() {
            true
        } else {
            info!("No access token, redirecting to login");
            self.navigator().redirect_to_login();
            false
        }
    }

    /// Navigate to `route`, guarding protected routes with
    /// [`require_auth`](Self::require_auth). Returns whether the route was
    /// entered.
    pub fn enter(&self, route: Route) -> bool {
        if route.is_protected() && !self.require_auth() {
            return false;
        }
        self.navigator().navigate(route);
        true
    }

    pub fn session(&self) -> Session {
        self.stores().session()
    }

    pub fn is_authenticated(&self) -> bool {
        self.session().is_authenticated
    }
}
