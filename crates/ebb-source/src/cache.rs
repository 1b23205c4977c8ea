//! Modification-time cache persisted as `cache.json`.

use std::collections::BTreeMap;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use serde::{Deserialize, Serialize};

/// Reserved key holding the configuration file's modification time.
pub const CONFIG_KEY: &str = "__config__";

/// Relative source path to modification time, in nanoseconds since the epoch.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CacheMap(BTreeMap<String, u64>);

/// Errors that can occur when persisting the cache.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("Failed to serialize cache: {0}")]
    Serialize(#[from] serde_json::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl CacheMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read the cache file. A missing or unreadable file yields an empty cache.
    pub async fn load(path: &Path) -> Self {
        let content = match tokio::fs::read_to_string(path).await {
            Ok(content) => content,
            Err(_) => return Self::new(),
        };
        serde_json::from_str(&content).unwrap_or_else(|e| {
            tracing::warn!("Ignoring corrupt cache {}: {}", path.display(), e);
            Self::new()
        })
    }

    pub async fn save(&self, path: &Path) -> Result<(), CacheError> {
        let json = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, json)
            .await
            .map_err(|source| CacheError::Write {
                path: path.to_path_buf(),
                source,
            })
    }

    /// True when `key` was recorded with exactly `mtime`.
    pub fn is_fresh(&self, key: &str, mtime: u64) -> bool {
        self.0.get(key) == Some(&mtime)
    }

    pub fn record(&mut self, key: impl Into<String>, mtime: u64) {
        self.0.insert(key.into(), mtime);
    }

    pub fn remove(&mut self, key: &str) -> Option<u64> {
        self.0.remove(key)
    }

    pub fn config_stamp(&self) -> Option<u64> {
        self.0.get(CONFIG_KEY).copied()
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Modification time of `metadata` in nanoseconds since the epoch.
pub fn mtime(metadata: &Metadata) -> std::io::Result<u64> {
    let modified = metadata.modified()?;
    let since = modified
        .duration_since(UNIX_EPOCH)
        .map_err(std::io::Error::other)?;
    Ok(since.as_nanos() as u64)
}
