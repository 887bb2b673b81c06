use serde::Deserialize;
use url::Url;

use crate::routes::Route;

/// Response of `POST /share`.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ShareTokenResponse {
    #[serde(rename = "shareToken", default)]
    pub share_token: Option<String>,
}

/// Public link for a share token. Derived on the client, never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShareLink {
    pub token: String,
    pub url: String,
}

impl ShareLink {
    /// Build `{origin}/share/{token}`.
    pub fn new(origin: &str, token: impl Into<String>) -> Self {
        let token = token.into();
        let path = Route::Share(token.clone()).path();
        let url = format!("{}{}", origin.trim_end_matches('/'), path);
        Self { token, url }
    }
}

/// Extract a share token from either a bare token or a full share URL.
pub fn parse_share_reference(input: &str) -> Option<String> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    if let Ok(url) = Url::parse(input) {
        return match Route::parse(url.path()) {
            Some(Route::Share(token)) => Some(token),
            _ => None,
        };
    }

    if input.starts_with('/') {
        return match Route::parse(input) {
            Some(Route::Share(token)) => Some(token),
            _ => None,
        };
    }

    Some(input.to_string())
}
