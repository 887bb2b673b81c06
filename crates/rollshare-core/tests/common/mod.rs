//! Shared fixtures for the HTTP integration tests.

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use rollshare_core::auth::{MemoryStore, SessionStores, TokenStore, ACCESS_TOKEN_KEY};
use rollshare_core::{ApiClient, AuthController, Config, Navigator, Route, ShareService, TokenPair};

pub const ORIGIN: &str = "http://localhost:3000";

/// Navigator that remembers every requested route.
#[derive(Default)]
pub struct RecordingNavigator {
    routes: Mutex<Vec<Route>>,
}

impl RecordingNavigator {
    pub fn routes(&self) -> Vec<Route> {
        self.routes.lock().unwrap().clone()
    }

    pub fn login_redirects(&self) -> usize {
        self.routes().iter().filter(|r| **r == Route::Login).count()
    }
}

impl Navigator for RecordingNavigator {
    fn navigate(&self, route: Route) {
        self.routes.lock().unwrap().push(route);
    }
}

pub struct Harness {
    pub api: ApiClient,
    pub auth: AuthController,
    pub share: ShareService,
    pub stores: SessionStores,
    pub volatile: Arc<MemoryStore>,
    pub durable: Arc<MemoryStore>,
    pub navigator: Arc<RecordingNavigator>,
}

impl Harness {
    pub fn new(base_url: &str) -> Self {
        Self::with_config(Config {
            api_base_url: base_url.to_string(),
            origin: ORIGIN.to_string(),
            ..Config::default()
        })
    }

    pub fn with_config(config: Config) -> Self {
        let volatile = Arc::new(MemoryStore::new());
        let durable = Arc::new(MemoryStore::new());
        let stores = SessionStores::new(volatile.clone(), durable.clone());
        let navigator = Arc::new(RecordingNavigator::default());
        let api = ApiClient::new(&config, stores.clone(), navigator.clone()).unwrap();

        Self {
            auth: AuthController::new(api.clone()),
            share: ShareService::new(api.clone(), config.origin.clone()),
            api,
            stores,
            volatile,
            durable,
            navigator,
        }
    }

    /// Harness with a session already established.
    pub fn logged_in(base_url: &str, access: &str, refresh: &str) -> Self {
        let harness = Self::new(base_url);
        harness
            .stores
            .store_pair(&TokenPair {
                access_token: access.to_string(),
                refresh_token: refresh.to_string(),
            })
            .unwrap();
        harness
    }

    /// Harness holding an access token but no refresh token.
    pub fn access_only(base_url: &str, access: &str) -> Self {
        let harness = Self::new(base_url);
        harness.volatile.set(ACCESS_TOKEN_KEY, access).unwrap();
        harness
    }
}
