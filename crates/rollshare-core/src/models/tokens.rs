use serde::{Deserialize, Serialize};

/// Access and refresh tokens issued together by login and refresh.
#[derive(Clone, PartialEq, Eq)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

// Token values never end up in logs.
impl std::fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenPair")
            .field("access_token", &"<redacted>")
            .field("refresh_token", &"<redacted>")
            .finish()
    }
}

/// Wire shape of `/login` and `/refresh` responses. Either field may be
/// missing on a malformed response.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TokenPairResponse {
    #[serde(rename = "accessToken", default)]
    pub access_token: Option<String>,
    #[serde(rename = "refreshToken", default)]
    pub refresh_token: Option<String>,
}

impl TokenPairResponse {
    /// Both tokens, or `None` if either is missing or empty.
    pub fn into_pair(self) -> Option<TokenPair> {
        match (self.access_token, self.refresh_token) {
            (Some(access_token), Some(refresh_token))
                if !access_token.is_empty() && !refresh_token.is_empty() =>
            {
                Some(TokenPair {
                    access_token,
                    refresh_token,
                })
            }
            _ => None,
        }
    }
}

#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub username: &'a str,
    pub password: &'a str,
}

#[derive(Serialize)]
pub struct RefreshRequest<'a> {
    #[serde(rename = "refreshToken")]
    pub refresh_token: &'a str,
}
