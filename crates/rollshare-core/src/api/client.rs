//! API client for communicating with the portal REST API.
//!
//! All traffic goes through [`ApiClient::send`], which attaches the bearer
//! token to authenticated endpoints and, when the server rejects it, refreshes
//! the session once and replays the request.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::auth::SessionStores;
use crate::config::Config;
use crate::models::{LoginRequest, ShareTokenResponse, StudentRecord, TokenPair, TokenPairResponse};
use crate::routes::Navigator;

use super::error::{truncate_body, ApiError};
use super::refresh::{RefreshContext, RefreshCoordinator, RefreshFailure};
use super::request::{should_refresh, ApiRequest, Attempt, AuthMode, Endpoint};

// ============================================================================
// User-facing messages
// ============================================================================

const NO_RESPONSE_MESSAGE: &str =
    "No response from server. Please check your internet connection or try again later.";
const REQUEST_SETUP_MESSAGE: &str = "An unexpected error occurred while setting up the request.";
const MISSING_LOGIN_TOKENS_MESSAGE: &str =
    "Login successful but no access or refresh token received.";
const NO_REFRESH_TOKEN_MESSAGE: &str =
    "Authentication expired. No refresh token found. Please log in again.";
const REFRESH_FAILED_MESSAGE: &str = "Failed to refresh token. Please log in again.";
const SESSION_REJECTED_MESSAGE: &str =
    "Session was rejected after refreshing. Please log in again.";
const MISSING_SHARE_TOKEN_MESSAGE: &str =
    "API did not return a share token in the expected format.";
const SHARE_FAILED_MESSAGE: &str = "An error occurred while generating the share link.";
const SHARE_NOT_FOUND_MESSAGE: &str = "Share link invalid or data not found.";
const SHARE_UNAUTHORIZED_MESSAGE: &str =
    "Unauthorized access. This share link may have expired or is invalid.";
const SHARE_FETCH_FAILED_MESSAGE: &str = "Failed to fetch student data.";
const UNEXPECTED_FORMAT_MESSAGE: &str = "No student data found or unexpected data format.";

/// A completed HTTP exchange: status plus the full body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    status: StatusCode,
    body: String,
}

impl ApiResponse {
    pub fn status_code(&self) -> u16 {
        self.status.as_u16()
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn json<T: DeserializeOwned>(&self) -> serde_json::Result<T> {
        serde_json::from_str(&self.body)
    }
}

/// API client for the portal.
/// Clone is cheap - reqwest::Client and the stores are reference counted.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    timeout: Duration,
    stores: SessionStores,
    navigator: Arc<dyn Navigator>,
    refresh: RefreshCoordinator,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &Config, stores: SessionStores, navigator: Arc<dyn Navigator>) -> Result<Self> {
        let timeout = config.request_timeout();
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            timeout,
            stores,
            navigator,
            refresh: RefreshCoordinator::default(),
        })
    }

    pub fn stores(&self) -> &SessionStores {
        &self.stores
    }

    pub fn navigator(&self) -> &Arc<dyn Navigator> {
        &self.navigator
    }

    fn url(&self, endpoint: Endpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    // ===== Pipeline =====

    /// Send a request through the auth pipeline.
    ///
    /// Bearer requests carry the current access token. A 401/403 on the
    /// first attempt refreshes the session (shared with any concurrent
    /// refresh) and replays the request exactly once; the replay's response
    /// is returned whatever its status.
    pub async fn send(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let bearer = match request.endpoint.auth() {
            AuthMode::Bearer => self.stores.access_token(),
            AuthMode::Public => None,
        };

        let response = self.dispatch(request, Attempt::First, bearer.as_deref()).await?;
        if !should_refresh(request.endpoint, Attempt::First, response.status_code()) {
            return Ok(response);
        }

        debug!(endpoint = ?request.endpoint, status = response.status_code(), "Access token rejected");
        let token = self.recover_session(bearer.as_deref()).await?;
        self.dispatch(request, Attempt::Replay, Some(&token)).await
    }

    async fn dispatch(
        &self,
        request: &ApiRequest,
        attempt: Attempt,
        bearer: Option<&str>,
    ) -> Result<ApiResponse, ApiError> {
        let endpoint = request.endpoint;
        let mut builder = self.client.request(endpoint.method(), self.url(endpoint));

        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(ref body) = request.body {
            builder = builder.json(body);
        }
        if endpoint.auth() == AuthMode::Bearer {
            if let Some(token) = bearer {
                builder = builder.bearer_auth(token);
            }
        }

        debug!(?endpoint, attempt = attempt.number(), "Sending request");

        let response = builder.send().await.map_err(|e| self.transport_error(e))?;
        let status = response.status();
        let body = response.text().await.map_err(|e| self.transport_error(e))?;

        debug!(?endpoint, attempt = attempt.number(), status = %status, "Response received");
        Ok(ApiResponse { status, body })
    }

    /// Get an access token to replay with, refreshing if nobody else has.
    async fn recover_session(&self, rejected: Option<&str>) -> Result<String, ApiError> {
        if let (Some(rejected), Some(current)) = (rejected, self.stores.access_token()) {
            if rejected != current {
                debug!("Access token already rotated by another request");
                return Ok(current);
            }
        }

        let context = RefreshContext {
            http: self.client.clone(),
            url: self.url(Endpoint::Refresh),
            stores: self.stores.clone(),
            navigator: self.navigator.clone(),
        };

        match self.refresh.run(move || context.into_future()).await {
            Ok(pair) => Ok(pair.access_token),
            Err(RefreshFailure::MissingRefreshToken) => {
                Err(ApiError::AuthExpired(NO_REFRESH_TOKEN_MESSAGE.to_string()))
            }
            Err(RefreshFailure::Rejected(_)) => {
                Err(ApiError::AuthExpired(REFRESH_FAILED_MESSAGE.to_string()))
            }
        }
    }

    fn transport_error(&self, e: reqwest::Error) -> ApiError {
        warn!(error = %e, "Request failed without a response");
        if e.is_timeout() {
            ApiError::Network(format!(
                "Request timed out after {} seconds.",
                self.timeout.as_secs()
            ))
        } else if e.is_builder() {
            ApiError::Network(REQUEST_SETUP_MESSAGE.to_string())
        } else {
            ApiError::Network(NO_RESPONSE_MESSAGE.to_string())
        }
    }

    fn end_session(&self) {
        self.stores.clear();
        self.navigator.redirect_to_login();
    }

    // ===== Endpoints =====

    /// Exchange credentials for a token pair. Does not touch the stores.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenPair, ApiError> {
        let request = ApiRequest::new(Endpoint::Login)
            .json(&LoginRequest { username, password })
            .map_err(|e| ApiError::Protocol(e.to_string()))?;

        let response = self.send(&request).await?;
        if !response.is_success() {
            let status = response.status_code();
            warn!(status, body = %truncate_body(response.body()), "Login rejected");
            return Err(ApiError::from_status(
                status,
                response.body(),
                format!("Login failed with status: {}", status),
            ));
        }

        response
            .json::<TokenPairResponse>()
            .ok()
            .and_then(TokenPairResponse::into_pair)
            .ok_or_else(|| {
                warn!("Login response did not contain both tokens");
                ApiError::Protocol(MISSING_LOGIN_TOKENS_MESSAGE.to_string())
            })
    }

    /// Mint a share token for the authenticated administrator.
    pub async fn create_share_token(&self) -> Result<String, ApiError> {
        let response = self.send(&ApiRequest::new(Endpoint::CreateShare)).await?;

        match response.status_code() {
            _ if response.is_success() => {}
            401 | 403 => {
                warn!(status = response.status_code(), "Share request rejected after refresh");
                self.end_session();
                return Err(ApiError::AuthExpired(SESSION_REJECTED_MESSAGE.to_string()));
            }
            status => {
                warn!(status, body = %truncate_body(response.body()), "Share request failed");
                return Err(ApiError::from_status(status, response.body(), SHARE_FAILED_MESSAGE));
            }
        }

        let token = response
            .json::<ShareTokenResponse>()
            .ok()
            .and_then(|r| r.share_token)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| ApiError::Protocol(MISSING_SHARE_TOKEN_MESSAGE.to_string()))?;

        info!("Share token created");
        Ok(token)
    }

    /// Fetch the record set behind a share token. Public; no credentials.
    ///
    /// The body must be a JSON array. Rows that are not student records are
    /// skipped with a warning; the rest are returned in server order.
    pub async fn fetch_shared_records(&self, share_token: &str) -> Result<Vec<StudentRecord>, ApiError> {
        let request = ApiRequest::new(Endpoint::SharedData).query("shareToken", share_token);
        let response = self.send(&request).await?;

        match response.status_code() {
            _ if response.is_success() => {}
            404 => {
                return Err(ApiError::Http {
                    status: 404,
                    message: SHARE_NOT_FOUND_MESSAGE.to_string(),
                })
            }
            status @ (401 | 403) => {
                return Err(ApiError::Http {
                    status,
                    message: SHARE_UNAUTHORIZED_MESSAGE.to_string(),
                })
            }
            status => {
                warn!(status, body = %truncate_body(response.body()), "Shared data request failed");
                return Err(ApiError::from_status(status, response.body(), SHARE_FETCH_FAILED_MESSAGE));
            }
        }

        let value: serde_json::Value = response
            .json()
            .map_err(|_| ApiError::DataFormat(UNEXPECTED_FORMAT_MESSAGE.to_string()))?;
        let rows = match value {
            serde_json::Value::Array(rows) => rows,
            _ => {
                warn!("Shared data response was not an array");
                return Err(ApiError::DataFormat(UNEXPECTED_FORMAT_MESSAGE.to_string()));
            }
        };

        let total = rows.len();
        let records: Vec<StudentRecord> = rows
            .into_iter()
            .filter_map(|row| match serde_json::from_value(row) {
                Ok(record) => Some(record),
                Err(e) => {
                    debug!(error = %e, "Skipping malformed shared record");
                    None
                }
            })
            .collect();
        if records.len() < total {
            warn!(skipped = total - records.len(), total, "Some shared records were malformed");
        }

        debug!(count = records.len(), "Shared records received");
        Ok(records)
    }
}
