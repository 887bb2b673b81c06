//! Request descriptions passed through the client pipeline.

use reqwest::Method;
use serde::Serialize;

/// Endpoints of the portal backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Endpoint {
    Login,
    CreateShare,
    Refresh,
    SharedData,
}

/// How a request authenticates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    /// Carries the access token; a 401/403 arms the refresh interceptor.
    Bearer,
    /// No credentials attached; status codes are passed through untouched.
    Public,
}

impl Endpoint {
    pub fn method(&self) -> Method {
        match self {
            Endpoint::Login | Endpoint::CreateShare | Endpoint::Refresh => Method::POST,
            Endpoint::SharedData => Method::GET,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Endpoint::Login => "/login",
            Endpoint::CreateShare | Endpoint::SharedData => "/share",
            Endpoint::Refresh => "/refresh",
        }
    }

    pub fn auth(&self) -> AuthMode {
        match self {
            Endpoint::CreateShare => AuthMode::Bearer,
            Endpoint::Login | Endpoint::Refresh | Endpoint::SharedData => AuthMode::Public,
        }
    }
}

/// Which send of a request this is. The pipeline creates a new value for the
/// replay rather than mutating the request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Attempt {
    First,
    /// Resent once after a successful token refresh
    Replay,
}

impl Attempt {
    /// Only a first attempt may trigger a refresh.
    pub fn may_refresh(self) -> bool {
        matches!(self, Attempt::First)
    }

    pub fn number(self) -> u8 {
        match self {
            Attempt::First => 1,
            Attempt::Replay => 2,
        }
    }
}

/// Whether a response should trigger the refresh-and-replay path.
pub fn should_refresh(endpoint: Endpoint, attempt: Attempt, status: u16) -> bool {
    matches!(status, 401 | 403)
        && endpoint != Endpoint::Refresh
        && endpoint.auth() == AuthMode::Bearer
        && attempt.may_refresh()
}

/// An outgoing request. Rebuilt into a fresh `reqwest` request per attempt.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub endpoint: Endpoint,
    pub query: Vec<(&'static str, String)>,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(endpoint: Endpoint) -> Self {
        Self {
            endpoint,
            query: Vec::new(),
            body: None,
        }
    }

    pub fn query(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.query.push((key, value.into()));
        self
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, serde_json::Error> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }
}
