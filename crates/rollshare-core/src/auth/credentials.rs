use anyhow::{Context, Result};
use keyring::Entry;

use super::store::TokenStore;

/// Keychain service name used when none is given.
pub const DEFAULT_SERVICE_NAME: &str = "rollshare";

/// Durable token store backed by the OS keychain.
pub struct KeyringStore {
    service_name: String,
}

impl KeyringStore {
    pub fn new() -> Self {
        Self::with_service_name(DEFAULT_SERVICE_NAME)
    }

    pub fn with_service_name(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        Entry::new(&self.service_name, key).context("Failed to create keyring entry")
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringStore {
    /// Retrieve a token from the OS keychain
    fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(e).context("Failed to retrieve token from keychain"),
        }
    }

    /// Store a token in the OS keychain
    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .context("Failed to store token in keychain")
    }

    /// Delete a stored token; missing entries are not an error
    fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(e).context("Failed to delete token from keychain"),
        }
    }
}
