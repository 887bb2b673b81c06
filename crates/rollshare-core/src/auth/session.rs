use std::sync::Arc;

use anyhow::Result;
use tracing::{debug, warn};

use crate::models::TokenPair;

use super::store::{MemoryStore, TokenStore};

/// Key of the access token in the volatile store.
pub const ACCESS_TOKEN_KEY: &str = "accessToken";

/// Key of the refresh token in the durable store.
pub const REFRESH_TOKEN_KEY: &str = "refreshToken";

/// Snapshot of the admin session.
#[derive(Clone, Default, PartialEq, Eq)]
pub struct Session {
    pub access_token: Option<String>,
    pub refresh_token: Option<String>,
    pub is_authenticated: bool,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("has_access_token", &self.access_token.is_some())
            .field("has_refresh_token", &self.refresh_token.is_some())
            .field("is_authenticated", &self.is_authenticated)
            .finish()
    }
}

/// The two token stores of a session.
///
/// The access token goes to the volatile store and the refresh token to
/// the durable one. Read failures are logged and treated as "absent" so a
/// broken store degrades to a logged-out session.
#[derive(Clone)]
pub struct SessionStores {
    volatile: Arc<dyn TokenStore>,
    durable: Arc<dyn TokenStore>,
}

impl SessionStores {
    pub fn new(volatile: Arc<dyn TokenStore>, durable: Arc<dyn TokenStore>) -> Self {
        Self { volatile, durable }
    }

    /// Both stores in memory.
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()), Arc::new(MemoryStore::new()))
    }

    pub fn access_token(&self) -> Option<String> {
        read_token(self.volatile.as_ref(), ACCESS_TOKEN_KEY)
    }

    pub fn refresh_token(&self) -> Option<String> {
        read_token(self.durable.as_ref(), REFRESH_TOKEN_KEY)
    }

    /// Persist a freshly issued pair.
    pub fn store_pair(&self, pair: &TokenPair) -> Result<()> {
        self.volatile.set(ACCESS_TOKEN_KEY, &pair.access_token)?;
        self.durable.set(REFRESH_TOKEN_KEY, &pair.refresh_token)?;
        debug!("Token pair stored");
        Ok(())
    }

    /// Remove both tokens. Never fails; store errors are logged.
    pub fn clear(&self) {
        if let Err(e) = self.volatile.remove(ACCESS_TOKEN_KEY) {
            warn!(error = %e, "Failed to clear access token");
        }
        if let Err(e) = self.durable.remove(REFRESH_TOKEN_KEY) {
            warn!(error = %e, "Failed to clear refresh token");
        }
        debug!("Session tokens cleared");
    }

    pub fn session(&self) -> Session {
        let access_token = self.access_token();
        Session {
            is_authenticated: access_token.is_some(),
            access_token,
            refresh_token: self.refresh_token(),
        }
    }
}

fn read_token(store: &dyn TokenStore, key: &str) -> Option<String> {
    match store.get(key) {
        Ok(value) => value.filter(|v| !v.is_empty()),
        Err(e) => {
            warn!(key, error = %e, "Failed to read token store");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenStore;

    impl TokenStore for BrokenStore {
        fn get(&self, _key: &str) -> Result<Option<String>> {
            Err(anyhow::anyhow!("store unavailable"))
        }
        fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(anyhow::anyhow!("store unavailable"))
        }
        fn remove(&self, _key: &str) -> Result<()> {
            Err(anyhow::anyhow!("store unavailable"))
        }
    }

    fn pair() -> TokenPair {
        TokenPair {
            access_token: "a1".to_string(),
            refresh_token: "r1".to_string(),
        }
    }

    #[test]
    fn test_tokens_go_to_separate_stores() {
        let volatile = Arc::new(MemoryStore::new());
        let durable = Arc::new(MemoryStore::new());
        let stores = SessionStores::new(volatile.clone(), durable.clone());

        stores.store_pair(&pair()).unwrap();

        assert_eq!(volatile.get(ACCESS_TOKEN_KEY).unwrap().as_deref(), Some("a1"));
        assert_eq!(volatile.get(REFRESH_TOKEN_KEY).unwrap(), None);
        assert_eq!(durable.get(REFRESH_TOKEN_KEY).unwrap().as_deref(), Some("r1"));
        assert_eq!(durable.get(ACCESS_TOKEN_KEY).unwrap(), None);
    }

    #[test]
    fn test_session_snapshot() {
        let stores = SessionStores::in_memory();
        assert_eq!(stores.session(), Session::default());

        stores.store_pair(&pair()).unwrap();
        let session = stores.session();
        assert!(session.is_authenticated);
        assert_eq!(session.access_token.as_deref(), Some("a1"));
        assert_eq!(session.refresh_token.as_deref(), Some("r1"));

        stores.clear();
        assert_eq!(stores.session(), Session::default());
    }

    #[test]
    fn test_broken_store_reads_as_absent() {
        let stores = SessionStores::new(Arc::new(BrokenStore), Arc::new(MemoryStore::new()));
        assert_eq!(stores.access_token(), None);
        assert!(stores.store_pair(&pair()).is_err());
        // clear never panics or fails
        stores.clear();
    }

    #[test]
    fn test_session_debug_hides_tokens() {
        let stores = SessionStores::in_memory();
        stores.store_pair(&pair()).unwrap();
        let rendered = format!("{:?}", stores.session());
        assert!(!rendered.contains("a1"));
        assert!(rendered.contains("has_access_token: true"));
    }
}
