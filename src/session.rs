use crate::error::{PortalError, Result};
use crate::models::SessionState;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use tokio::fs;
use tokio::sync::RwLock;
use tracing::{debug, warn};

/// Where the session survives process restarts. The format is the backend's business.
#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self) -> Result<Option<SessionState>>;
    async fn save(&self, state: &SessionState) -> Result<()>;
    async fn clear(&self) -> Result<()>;
}

/// Keeps the session for the lifetime of the process only.
#[derive(Default)]
pub struct MemorySessionStore {
    slot: Mutex<Option<SessionState>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<SessionState>> {
        self.slot.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self) -> Result<Option<SessionState>> {
        Ok(self.lock().clone())
    }

    async fn save(&self, state: &SessionState) -> Result<()> {
        *self.lock() = Some(state.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.lock() = None;
        Ok(())
    }
}

/// JSON file store.
pub struct FileSessionStore {
    path: PathBuf,
}

impl FileSessionStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl SessionStore for FileSessionStore {
    async fn load(&self) -> Result<Option<SessionState>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&self.path)
            .await
            .map_err(|e| PortalError::Store(e.to_string()))?;
        match serde_json::from_str(&content) {
            Ok(state) => Ok(Some(state)),
            Err(e) => {
                // A corrupt file is the same as no session.
                warn!(path = %self.path.display(), error = %e, "ignoring unreadable session file");
                Ok(None)
            }
        }
    }

    async fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            fs::create_dir_all(dir)
                .await
                .map_err(|e| PortalError::Store(e.to_string()))?;
        }

        let json = serde_json::to_string(state).map_err(|e| PortalError::Store(e.to_string()))?;
        let tmp_path = self.path.with_extension("tmp");

        // Atomic write: write to tmp then rename
        fs::write(&tmp_path, json)
            .await
            .map_err(|e| PortalError::Store(e.to_string()))?;
        fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|e| PortalError::Store(e.to_string()))?;
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)
                .await
                .map_err(|e| PortalError::Store(e.to_string()))?;
        }
        Ok(())
    }
}

/// Owner of the current [`SessionState`]: memory first, mirrored to a [`SessionStore`].
///
/// Only login ([`SessionHolder::replace`]) and logout ([`SessionHolder::clear`])
/// change it.
pub struct SessionHolder {
    current: RwLock<Option<SessionState>>,
    store: Arc<dyn SessionStore>,
}

impl SessionHolder {
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        Self {
            current: RwLock::new(None),
            store,
        }
    }

    /// Loads whatever the store has; a store failure starts logged out.
    pub async fn init(&self) {
        let loaded = match self.store.load().await {
            Ok(state) => state,
            Err(e) => {
                warn!(error = %e, "could not load persisted session");
                None
            }
        };
        debug!(restored = loaded.is_some(), "session holder initialised");
        *self.current.write().await = loaded;
    }

    /// The current session, or `NotAuthenticated`.
    pub async fn current(&self) -> Result<SessionState> {
        match self.current.read().await.as_ref() {
            Some(state) if state.authenticated => Ok(state.clone()),
            _ => Err(PortalError::NotAuthenticated),
        }
    }

    pub async fn is_authenticated(&self) -> bool {
        self.current().await.is_ok()
    }

    /// Persists `state`, then makes it current. A failed save leaves no session.
    pub(crate) async fn replace(&self, state: SessionState) -> Result<()> {
        let mut current = self.current.write().await;
        *current = None;
        self.store.save(&state).await?;
        *current = Some(state);
        Ok(())
    }

    /// Drops the in-memory session first so a failing store cannot keep it alive.
    pub(crate) async fn clear(&self) -> Result<()> {
        *self.current.write().await = None;
        self.store.clear().await
    }
}
