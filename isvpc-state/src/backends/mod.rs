//! Backend implementations for state storage

mod local;

pub use local::LocalBackend;

use crate::backend::{BackendConfig, BackendError, BackendResult, StateBackend};

/// Create the backend named by `config.backend_type`
pub async fn create_backend(config: &BackendConfig) -> BackendResult<Box<dyn StateBackend>> {
    match config.backend_type.as_str() {
        "local" => Ok(Box::new(LocalBackend::from_config(config)?)),
        other => Err(BackendError::unsupported_backend(other)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[tokio::test]
    async fn unsupported_backend_is_rejected() {
        let config = BackendConfig {
            backend_type: "s3".to_string(),
            attributes: HashMap::new(),
        };

        match create_backend(&config).await {
            Err(BackendError::UnsupportedBackend(name)) => assert_eq!(name, "s3"),
            Err(other) => panic!("unexpected error: {}", other),
            Ok(_) => panic!("expected UnsupportedBackend error"),
        }
    }

    #[tokio::test]
    async fn local_backend_is_created() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("isvpc.state.json");
        let backend = create_backend(&BackendConfig::local(path.to_string_lossy()))
            .await
            .unwrap();
        assert!(backend.read_state().await.unwrap().is_none());
    }
}
