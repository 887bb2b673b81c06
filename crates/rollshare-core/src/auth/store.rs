//! Key-value token stores.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// A string key-value store holding credentials.
///
/// Implementations are shared between the session controller and the
/// refresh interceptor, so they must be usable through `&self`.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Process-lifetime store. Contents vanish when the process exits.
#[derive(Debug, Default)]
pub struct MemoryStore {
    values: RwLock<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TokenStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let values = self.values.read().unwrap_or_else(|e| e.into_inner());
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = self.values.write().unwrap_or_else(|e| e.into_inner());
        values.remove(key);
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct StoredValue {
    value: String,
    stored_at: DateTime<Utc>,
}

/// Store persisted as a JSON file. Every call reads or rewrites the file,
/// so separate processes see each other's writes.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    lock: Mutex<()>,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// When `key` was last written.
    pub fn stored_at(&self, key: &str) -> Result<Option<DateTime<Utc>>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.get(key).map(|v| v.stored_at))
    }

    fn read_all(&self) -> Result<HashMap<String, StoredValue>> {
        if !self.path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read token file {}", self.path.display()))?;
        if contents.trim().is_empty() {
            return Ok(HashMap::new());
        }
        serde_json::from_str(&contents).context("Failed to parse token file")
    }

    fn write_all(&self, values: &HashMap<String, StoredValue>) -> Result<()> {
        if values.is_empty() {
            if self.path.exists() {
                std::fs::remove_file(&self.path).context("Failed to remove token file")?;
                debug!(path = %self.path.display(), "Token file removed");
            }
            return Ok(());
        }

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = serde_json::to_string_pretty(values)?;
        std::fs::write(&self.path, contents).context("Failed to write token file")?;
        restrict_permissions(&self.path)?;
        Ok(())
    }
}

impl TokenStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        Ok(self.read_all()?.remove(key).map(|v| v.value))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        values.insert(
            key.to_string(),
            StoredValue {
                value: value.to_string(),
                stored_at: Utc::now(),
            },
        );
        self.write_all(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let _guard = self.lock.lock().unwrap_or_else(|e| e.into_inner());
        let mut values = self.read_all()?;
        if values.remove(key).is_some() {
            self.write_all(&values)?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
        .context("Failed to restrict token file permissions")
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    Ok(())
}
