//! Client error types

use isvpc_core::provider::{ErrorKind, ProviderError};
use serde::Deserialize;
use thiserror::Error;

/// Error body returned by the VPC and tagging APIs
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{status} {code}: {message}")]
pub struct ApiError {
    pub status: u16,
    pub code: String,
    pub message: String,
    pub trace: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
    #[serde(default)]
    trace: Option<String>,
    // IAM reports errors in a flat shape
    #[serde(default, rename = "errorCode")]
    error_code: Option<String>,
    #[serde(default, rename = "errorMessage")]
    error_message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    code: String,
    #[serde(default)]
    message: String,
    #[serde(default)]
    more_info: Option<String>,
}

impl ApiError {
    /// Parse an error response body. Unparseable bodies keep their raw text.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        match serde_json::from_slice::<ErrorBody>(body) {
            Ok(parsed) if !parsed.errors.is_empty() => {
                let code = parsed
                    .errors
                    .iter()
                    .map(|e| e.code.as_str())
                    .collect::<Vec<_>>()
                    .join(", ");
                let message = parsed
                    .errors
                    .iter()
                    .map(|e| match &e.more_info {
                        Some(info) => format!("{} ({})", e.message, info),
                        None => e.message.clone(),
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                Self {
                    status,
                    code,
                    message,
                    trace: parsed.trace,
                }
            }
            Ok(parsed) if parsed.error_message.is_some() => Self {
                status,
                code: parsed.error_code.unwrap_or_default(),
                message: parsed.error_message.unwrap_or_default(),
                trace: parsed.trace,
            },
            _ => Self {
                status,
                code: String::new(),
                message: String::from_utf8_lossy(body).trim().to_string(),
                trace: None,
            },
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.status == 404
    }

    pub fn is_conflict(&self) -> bool {
        self.status == 409
    }
}

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response from {path}: {source}")]
    Decode {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("authentication failed: {0}")]
    Auth(String),

    #[error("pagination of {path} returned start cursor {cursor} twice")]
    PaginationLoop { path: String, cursor: String },
}

impl ClientError {
    pub fn status(&self) -> Option<u16> {
        match self {
            ClientError::Api(e) => Some(e.status),
            _ => None,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.is_not_found())
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self, ClientError::Api(e) if e.is_conflict())
    }

    /// True if the API message contains `needle`
    pub fn message_contains(&self, needle: &str) -> bool {
        matches!(self, ClientError::Api(e) if e.message.contains(needle))
    }
}

impl From<ClientError> for ProviderError {
    fn from(err: ClientError) -> Self {
        let kind = match &err {
            ClientError::Api(e) if e.is_not_found() => ErrorKind::NotFound,
            ClientError::Api(e) if e.is_conflict() => ErrorKind::Conflict,
            ClientError::Auth(_) => ErrorKind::ClientInit,
            _ => ErrorKind::Api,
        };
        ProviderError::new(err.to_string())
            .with_kind(kind)
            .with_cause(err)
    }
}
