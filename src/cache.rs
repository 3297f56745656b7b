use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::fs;
use tracing::debug;

use crate::error::{PortalError, Result};

/// Response cache for read-only ERP pages.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// `None` on a miss or an expired entry.
    async fn get(&self, key: &str) -> Option<String>;
    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()>;
    async fn delete(&self, key: &str) -> Result<()>;
    /// Remove everything. Called on login and logout.
    async fn clear(&self) -> Result<()>;
}

#[derive(Serialize, Deserialize)]
struct CacheEntry {
    data: String,
    expires_at: u64,
}

/// One JSON file per key.
pub struct FileCache {
    cache_dir: PathBuf,
}

impl FileCache {
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Self {
        Self {
            cache_dir: cache_dir.as_ref().to_path_buf(),
        }
    }

    // Keys are resource paths; keep them to one flat file name.
    fn get_path(&self, key: &str) -> PathBuf {
        let name: String = key
            .trim_matches('/')
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' { c } else { '_' })
            .collect();
        self.cache_dir.join(format!("{}.json", name))
    }

    fn now_secs() -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

fn store_err(e: impl ToString) -> PortalError {
    PortalError::Store(e.to_string())
}

#[async_trait]
impl CacheBackend for FileCache {
    async fn get(&self, key: &str) -> Option<String> {
        let path = self.get_path(key);
        // A missing or unreadable entry is a miss.
        let entry: CacheEntry = serde_json::from_str(&fs::read_to_string(&path).await.ok()?).ok()?;

        if Self::now_secs() > entry.expires_at {
            debug!(key, "cache entry expired");
            fs::remove_file(&path).await.ok();
            return None;
        }
        Some(entry.data)
    }

    async fn set(&self, key: &str, value: &str, ttl_secs: u64) -> Result<()> {
        fs::create_dir_all(&self.cache_dir).await.map_err(store_err)?;

        let path = self.get_path(key);
        let tmp_path = path.with_extension("tmp");

        let entry = CacheEntry {
            data: value.to_string(),
            expires_at: Self::now_secs() + ttl_secs,
        };

        let json = serde_json::to_string(&entry).map_err(store_err)?;
        fs::write(&tmp_path, json).await.map_err(store_err)?;
        fs::rename(&tmp_path, &path).await.map_err(store_err)
    }

    async fn delete(&self, key: &str) -> Result<()> {
        match fs::remove_file(self.get_path(key)).await {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(store_err(e)),
            _ => Ok(()),
        }
    }

    async fn clear(&self) -> Result<()> {
        if !self.cache_dir.exists() {
            return Ok(());
        }
        let mut entries = fs::read_dir(&self.cache_dir).await.map_err(store_err)?;
        while let Some(entry) = entries.next_entry().await.map_err(store_err)? {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == "json" || ext == "tmp") {
                fs::remove_file(&path).await.map_err(store_err)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn set_get_and_clear() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path().join("cache"));

        cache.set("/Student/Course", "<html>profile</html>", 60).await.unwrap();
        cache.set("/Student/Alerts", "<html>alerts</html>", 60).await.unwrap();
        assert_eq!(
            cache.get("/Student/Course").await.as_deref(),
            Some("<html>profile</html>")
        );

        cache.delete("/Student/Course").await.unwrap();
        assert!(cache.get("/Student/Course").await.is_none());

        cache.clear().await.unwrap();
        assert!(cache.get("/Student/Alerts").await.is_none());
    }

    #[tokio::test]
    async fn expired_entries_are_misses() {
        let dir = tempfile::tempdir().unwrap();
        let cache = FileCache::new(dir.path());
        let path = cache.get_path("stale");
        let entry = CacheEntry {
            data: "old".into(),
            expires_at: 1,
        };
        std::fs::write(&path, serde_json::to_string(&entry).unwrap()).unwrap();

        assert!(cache.get("stale").await.is_none());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn clearing_a_missing_dir_is_fine() {
        let dir = tempfile::tempdir().unwrap();
        FileCache::new(dir.path().join("never-created")).clear().await.unwrap();
    }
}
