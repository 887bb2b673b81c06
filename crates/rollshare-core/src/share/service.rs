use tracing::{info, warn};

use crate::api::{ApiClient, ApiError};
use crate::models::{ShareLink, StudentRecord};

const NOT_AUTHENTICATED_MESSAGE: &str = "Not authenticated. Please log in again.";
const MISSING_TOKEN_MESSAGE: &str = "Share link is invalid or missing token.";

/// Mints share links for the administrator and fetches shared records for
/// anyone holding a link.
#[derive(Clone)]
pub struct ShareService {
    api: ApiClient,
    origin: String,
}

impl ShareService {
    /// `origin` is the public base URL share links point at.
    pub fn new(api: ApiClient, origin: impl Into<String>) -> Self {
        Self {
            api,
            origin: origin.into(),
        }
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    /// Ask the backend for a share token and turn it into a public link.
    ///
    /// Needs an access token up front. An expired one is refreshed once by
    /// the client pipeline before the request is retried.
    pub async fn generate_share_link(&self) -> Result<ShareLink, ApiError> {
        if self.api.stores().access_token().is_none() {
            warn!("Share link requested without an access token");
            self.api.navigator().redirect_to_login();
            return Err(ApiError::AuthExpired(NOT_AUTHENTICATED_MESSAGE.to_string()));
        }

        let token = self.api.create_share_token().await?;
        let link = ShareLink::new(&self.origin, token);
        info!(url = %link.url, "Share link generated");
        Ok(link)
    }

    /// Fetch the records behind a share token.
    pub async fn fetch_shared_data(&self, token: &str) -> Result<Vec<StudentRecord>, ApiError> {
        let token = token.trim();
        if token.is_empty() {
            return Err(ApiError::Input(MISSING_TOKEN_MESSAGE.to_string()));
        }
        self.api.fetch_shared_records(token).await
    }
}
