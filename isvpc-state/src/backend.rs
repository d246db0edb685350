//! State backend trait and error types

use std::collections::HashMap;

use async_trait::async_trait;
use isvpc_core::resource::Value;
use thiserror::Error;

use crate::lock::LockInfo;
use crate::state::StateFile;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("State is locked by {who} (lock ID: {lock_id}, operation: {operation})")]
    Locked {
        lock_id: String,
        who: String,
        operation: String,
    },

    #[error("Lock not found: {0}")]
    LockNotFound(String),

    #[error("Lock ID mismatch: expected {expected}, got {actual}")]
    LockMismatch { expected: String, actual: String },

    #[error("Unsupported backend type: {0}")]
    UnsupportedBackend(String),

    #[error("Backend configuration error: {0}")]
    Configuration(String),

    /// State file is corrupted or was written by a newer format
    #[error("Invalid state file: {0}")]
    InvalidState(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl BackendError {
    pub fn locked(lock: &LockInfo) -> Self {
        Self::Locked {
            lock_id: lock.id.clone(),
            who: lock.who.clone(),
            operation: lock.operation.clone(),
        }
    }

    pub fn unsupported_backend(backend_type: impl Into<String>) -> Self {
        Self::UnsupportedBackend(backend_type.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Storage for the state file and its lock
#[async_trait]
pub trait StateBackend: Send + Sync {
    /// Read the current state. `None` before the first write.
    async fn read_state(&self) -> BackendResult<Option<StateFile>>;

    /// Persist `state`. Callers bump the serial first.
    async fn write_state(&self, state: &StateFile) -> BackendResult<()>;

    /// Take the lock for `operation`, failing while another unexpired lock
    /// is held
    async fn acquire_lock(&self, operation: &str) -> BackendResult<LockInfo>;

    /// Release a lock taken by this process
    async fn release_lock(&self, lock: &LockInfo) -> BackendResult<()>;

    /// Remove a lock by ID regardless of owner
    async fn force_unlock(&self, lock_id: &str) -> BackendResult<()>;

    /// Currently held lock, if any
    async fn current_lock(&self) -> BackendResult<Option<LockInfo>>;
}

/// `backend` block of the configuration file
#[derive(Debug, Clone)]
pub struct BackendConfig {
    /// Backend type; only "local" is implemented
    pub backend_type: String,
    pub attributes: HashMap<String, Value>,
}

impl BackendConfig {
    /// Local backend writing to `path`
    pub fn local(path: impl Into<String>) -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: [("path".to_string(), Value::String(path.into()))]
                .into_iter()
                .collect(),
        }
    }

    /// Build from a JSON object such as `{"type": "local", "path": "..."}`
    pub fn from_json(value: &serde_json::Value) -> BackendResult<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| BackendError::configuration("backend must be an object"))?;
        let backend_type = object
            .get("type")
            .and_then(|t| t.as_str())
            .unwrap_or("local")
            .to_string();
        let attributes = object
            .iter()
            .filter(|(key, _)| key.as_str() != "type")
            .filter_map(|(key, v)| Value::from_json(v).map(|v| (key.clone(), v)))
            .collect();
        Ok(Self {
            backend_type,
            attributes,
        })
    }

    pub fn get_string(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    pub fn get_int(&self, key: &str) -> Option<i64> {
        self.attributes.get(key).and_then(Value::as_int)
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            backend_type: "local".to_string(),
            attributes: HashMap::new(),
        }
    }
}
