//! Local file backend
//!
//! State lives in a JSON file (default `isvpc.state.json`) and the lock in a
//! sibling `.lock` file created with `create_new`, so two processes cannot
//! both take it.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};
use crate::lock::{DEFAULT_LOCK_TIMEOUT_SECS, LockInfo};
use crate::state::StateFile;

pub struct LocalBackend {
    state_path: PathBuf,
    lock_path: PathBuf,
    lock_timeout_secs: i64,
}

impl LocalBackend {
    pub const DEFAULT_STATE_FILE: &'static str = "isvpc.state.json";

    pub fn new() -> Self {
        Self::with_path(PathBuf::from(Self::DEFAULT_STATE_FILE))
    }

    pub fn with_path(state_path: PathBuf) -> Self {
        let lock_path = state_path.with_extension("lock");
        Self {
            state_path,
            lock_path,
            lock_timeout_secs: DEFAULT_LOCK_TIMEOUT_SECS,
        }
    }

    /// Reads `path` and `lock_timeout` (seconds)
    pub fn from_config(config: &BackendConfig) -> BackendResult<Self> {
        let path = config
            .get_string("path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(Self::DEFAULT_STATE_FILE));

        let mut backend = Self::with_path(path);
        if let Some(timeout) = config.get_int("lock_timeout") {
            if timeout <= 0 {
                return Err(BackendError::configuration(format!(
                    "lock_timeout must be positive, got {}",
                    timeout
                )));
            }
            backend.lock_timeout_secs = timeout;
        }
        Ok(backend)
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    pub fn lock_path(&self) -> &Path {
        &self.lock_path
    }

    async fn read_lock(&self) -> BackendResult<Option<LockInfo>> {
        match tokio::fs::read_to_string(&self.lock_path).await {
            Ok(content) => serde_json::from_str(&content)
                .map(Some)
                .map_err(|e| BackendError::InvalidState(format!("Failed to parse lock file: {}", e))),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(BackendError::Io(format!("Failed to read lock file: {}", e))),
        }
    }

    async fn remove_lock(&self) -> BackendResult<()> {
        tokio::fs::remove_file(&self.lock_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to remove lock file: {}", e)))
    }

    async fn create_lock(&self, lock: &LockInfo) -> BackendResult<bool> {
        let content = serde_json::to_string_pretty(lock)
            .map_err(|e| BackendError::Serialization(format!("Failed to serialize lock: {}", e)))?;

        let file = tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&self.lock_path)
            .await;
        let mut file = match file {
            Ok(file) => file,
            Err(e) if e.kind() == ErrorKind::AlreadyExists => return Ok(false),
            Err(e) => return Err(BackendError::Io(format!("Failed to create lock file: {}", e))),
        };
        file.write_all(content.as_bytes())
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;
        file.flush()
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write lock file: {}", e)))?;
        Ok(true)
    }
}

impl Default for LocalBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StateBackend for LocalBackend {
    async fn read_state(&self) -> BackendResult<Option<StateFile>> {
        let content = match tokio::fs::read_to_string(&self.state_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(BackendError::Io(format!("Failed to read state file: {}", e))),
        };

        let state: StateFile = serde_json::from_str(&content).map_err(|e| {
            BackendError::InvalidState(format!("Failed to parse state file: {}", e))
        })?;

        if state.version > StateFile::CURRENT_VERSION {
            return Err(BackendError::InvalidState(format!(
                "state format version {} is newer than supported version {}",
                state.version,
                StateFile::CURRENT_VERSION
            )));
        }

        Ok(Some(state))
    }

    async fn write_state(&self, state: &StateFile) -> BackendResult<()> {
        let content = serde_json::to_string_pretty(state).map_err(|e| {
            BackendError::Serialization(format!("Failed to serialize state: {}", e))
        })?;

        // Same-directory rename replaces the file atomically
        let tmp_path = self.state_path.with_extension("json.tmp");
        tokio::fs::write(&tmp_path, content)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;
        tokio::fs::rename(&tmp_path, &self.state_path)
            .await
            .map_err(|e| BackendError::Io(format!("Failed to write state file: {}", e)))?;

        log::debug!(
            "wrote state serial {} to {}",
            state.serial,
            self.state_path.display()
        );
        Ok(())
    }

    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo> {
        let lock = LockInfo::with_timeout(operation, self.lock_timeout_secs);

        if self.create_lock(&lock).await? {
            log::debug!("acquired lock {} for {}", lock.id, operation);
            return Ok(lock);
        }

        match self.read_lock().await {
            Ok(Some(existing)) if !existing.is_expired() => {
                return Err(BackendError::locked(&existing));
            }
            Ok(Some(existing)) => {
                log::warn!(
                    "replacing expired lock {} held by {}",
                    existing.id,
                    existing.who
                );
            }
            Ok(None) => {}
            Err(BackendError::InvalidState(msg)) => {
                log::warn!("replacing unreadable lock file: {}", msg);
            }
            Err(e) => return Err(e),
        }

        match self.remove_lock().await {
            Ok(()) => {}
            Err(BackendError::Io(_)) if !self.lock_path.exists() => {}
            Err(e) => return Err(e),
        }
        if self.create_lock(&lock).await? {
            Ok(lock)
        } else {
            // Another process won the race after the stale lock was removed
            match self.read_lock().await? {
                Some(existing) => Err(BackendError::locked(&existing)),
                None => Err(BackendError::Io(
                    "lock file disappeared while acquiring".to_string(),
                )),
            }
        }
    }

    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()> {
        let existing = self
            .read_lock()
            .await?
            .ok_or_else(|| BackendError::LockNotFound(lock.id.clone()))?;

        if existing.id != lock.id {
            return Err(BackendError::LockMismatch {
                expected: lock.id.clone(),
                actual: existing.id,
            });
        }

        self.remove_lock().await?;
        log::debug!("released lock {}", lock.id);
        Ok(())
    }

    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()> {
        let existing = match self.read_lock().await {
            Ok(Some(existing)) => Some(existing),
            Ok(None) => return Err(BackendError::LockNotFound(lock_id.to_string())),
            // An unparseable lock file can still be force-removed
            Err(BackendError::InvalidState(_)) => None,
            Err(e) => return Err(e),
        };

        if let Some(existing) = existing
            && existing.id != lock_id
        {
            return Err(BackendError::LockMismatch {
                expected: lock_id.to_string(),
                actual: existing.id,
            });
        }

        self.remove_lock().await
    }

    async fn current_lock(&self) -> BackendResult<Option<LockInfo>> {
        self.read_lock().await
    }
}
