//! Token refresh with coalescing.
//!
//! Every caller that sees its access token rejected goes through
//! [`RefreshCoordinator::run`]. While a refresh is in flight, later callers
//! await the same shared future instead of starting their own, so the
//! backend only ever sees one use of a given refresh token.

use std::sync::{Arc, Mutex};

use futures::future::{BoxFuture, FutureExt, Shared};
use reqwest::Client;
use tracing::{debug, info, warn};

use crate::auth::SessionStores;
use crate::models::{RefreshRequest, TokenPair, TokenPairResponse};
use crate::routes::Navigator;

use super::error::truncate_body;

/// Why a refresh could not restore the session. Tokens are already cleared
/// and the user redirected when this is returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum RefreshFailure {
    MissingRefreshToken,
    Rejected(String),
}

type SharedRefresh = Shared<BoxFuture<'static, Result<TokenPair, RefreshFailure>>>;

#[derive(Default)]
struct Slot {
    next_id: u64,
    inflight: Option<(u64, SharedRefresh)>,
}

/// Deduplicates concurrent refreshes. Clone is cheap and shares the slot.
///
/// The slot lock is never held across an await, so clearing it after a
/// refresh cannot be interrupted by a cancelled caller.
#[derive(Clone, Default)]
pub(crate) struct RefreshCoordinator {
    slot: Arc<Mutex<Slot>>,
}

impl RefreshCoordinator {
    /// Join the in-flight refresh, or start one with `start`.
    pub(crate) async fn run<F>(&self, start: F) -> Result<TokenPair, RefreshFailure>
    where
        F: FnOnce() -> BoxFuture<'static, Result<TokenPair, RefreshFailure>>,
    {
        let (id, refresh) = {
            let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
            match &slot.inflight {
                Some((id, refresh)) => {
                    debug!("Joining in-flight token refresh");
                    (*id, refresh.clone())
                }
                None => {
                    let id = slot.next_id;
                    slot.next_id += 1;
                    let refresh = start().shared();
                    slot.inflight = Some((id, refresh.clone()));
                    (id, refresh)
                }
            }
        };

        let result = refresh.await;

        let mut slot = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        if matches!(&slot.inflight, Some((current, _)) if *current == id) {
            slot.inflight = None;
        }
        result
    }
}

/// Everything one refresh needs, owned so the future can be shared.
#[derive(Clone)]
pub(crate) struct RefreshContext {
    pub(crate) http: Client,
    pub(crate) url: String,
    pub(crate) stores: SessionStores,
    pub(crate) navigator: Arc<dyn Navigator>,
}

impl RefreshContext {
    pub(crate) fn into_future(self) -> BoxFuture<'static, Result<TokenPair, RefreshFailure>> {
        async move { self.perform().await }.boxed()
    }

    async fn perform(self) -> Result<TokenPair, RefreshFailure> {
        let Some(refresh_token) = self.stores.refresh_token() else {
            warn!("Access token rejected and no refresh token stored, ending session");
            self.end_session();
            return Err(RefreshFailure::MissingRefreshToken);
        };

        info!("Access token rejected, refreshing session");

        let pair = match self.request_tokens(&refresh_token).await {
            Ok(pair) => pair,
            Err(reason) => {
                warn!(reason = %reason, "Token refresh failed, ending session");
                self.end_session();
                return Err(RefreshFailure::Rejected(reason));
            }
        };

        if let Err(e) = self.stores.store_pair(&pair) {
            warn!(error = %e, "Failed to persist refreshed tokens, ending session");
            self.end_session();
            return Err(RefreshFailure::Rejected(e.to_string()));
        }

        info!("Token refresh succeeded");
        Ok(pair)
    }

    async fn request_tokens(&self, refresh_token: &str) -> Result<TokenPair, String> {
        let response = self
            .http
            .post(&self.url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|e| format!("refresh request failed: {}", e))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| format!("failed to read refresh response: {}", e))?;

        if !status.is_success() {
            return Err(format!("status {}: {}", status, truncate_body(&body)));
        }

        let parsed: TokenPairResponse = serde_json::from_str(&body)
            .map_err(|e| format!("failed to parse refresh response: {}", e))?;
        parsed
            .into_pair()
            .ok_or_else(|| "refresh response did not contain both tokens".to_string())
    }

    fn end_session(&self) {
        self.stores.clear();
        self.navigator.redirect_to_login();
    }
}
