//! IAM authentication
//!
//! Exchanges an API key for a bearer token at `<iam>/identity/token` and
//! caches it until shortly before it expires.

use std::time::{Duration, SystemTime, UNIX_EPOCH};

use serde::Deserialize;
use tokio::sync::Mutex;

use super::error::{ApiError, ClientError};

const GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// Tokens are refreshed this long before `expiration`
const REFRESH_MARGIN_SECS: u64 = 60;

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expiration: Option<u64>,
    #[serde(default)]
    expires_in: Option<u64>,
}

#[derive(Debug, Clone)]
struct CachedToken {
    access_token: String,
    /// Unix seconds
    expires_at: u64,
}

pub enum Authenticator {
    /// Pre-issued token, never refreshed
    Static(String),
    ApiKey {
        http: reqwest::Client,
        token_url: String,
        api_key: String,
        cached: Mutex<Option<CachedToken>>,
    },
}

impl std::fmt::Debug for Authenticator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Authenticator::Static(_) => f.write_str("Authenticator::Static"),
            Authenticator::ApiKey { token_url, .. } => f
                .debug_struct("Authenticator::ApiKey")
                .field("token_url", token_url)
                .finish_non_exhaustive(),
        }
    }
}

impl Authenticator {
    pub fn api_key(http: reqwest::Client, iam_endpoint: &str, api_key: impl Into<String>) -> Self {
        Authenticator::ApiKey {
            http,
            token_url: format!("{}/identity/token", iam_endpoint.trim_end_matches('/')),
            api_key: api_key.into(),
            cached: Mutex::new(None),
        }
    }

    /// Current bearer token, exchanging the API key when the cache is stale
    pub async fn token(&self) -> Result<String, ClientError> {
        let (http, token_url, api_key, cached) = match self {
            Authenticator::Static(token) => return Ok(token.clone()),
            Authenticator::ApiKey {
                http,
                token_url,
                api_key,
                cached,
            } => (http, token_url, api_key, cached),
        };

        let mut cached = cached.lock().await;
        let now = unix_now();
        if let Some(token) = cached.as_ref()
            && now + REFRESH_MARGIN_SECS < token.expires_at
        {
            return Ok(token.access_token.clone());
        }

        log::debug!("requesting IAM token from {}", token_url);
        let response = http
            .post(token_url.as_str())
            .header("Accept", "application/json")
            .form(&[("grant_type", GRANT_TYPE), ("apikey", api_key.as_str())])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &body);
            return Err(ClientError::Auth(err.to_string()));
        }

        let parsed: TokenResponse =
            serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
                path: "/identity/token".to_string(),
                source,
            })?;
        let expires_at = parsed
            .expiration
            .or_else(|| parsed.expires_in.map(|secs| now + secs))
            .unwrap_or(now + 3600);

        *cached = Some(CachedToken {
            access_token: parsed.access_token.clone(),
            expires_at,
        });
        Ok(parsed.access_token)
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_secs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[tokio::test]
    async fn static_token_is_returned_as_is() {
        let auth = Authenticator::Static("abc".to_string());
        assert_eq!(auth.token().await.unwrap(), "abc");
    }

    #[tokio::test]
    async fn exchanges_api_key_once_and_caches() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/identity/token")
                    .body_contains("apikey=secret-key");
                then.status(200).json_body(json!({
                    "access_token": "tok-1",
                    "token_type": "Bearer",
                    "expires_in": 3600,
                    "expiration": unix_now() + 3600
                }));
            })
            .await;

        let auth = Authenticator::api_key(reqwest::Client::new(), &server.base_url(), "secret-key");
        assert_eq!(auth.token().await.unwrap(), "tok-1");
        assert_eq!(auth.token().await.unwrap(), "tok-1");
        token.assert_hits_async(1).await;
    }

    #[tokio::test]
    async fn refreshes_token_inside_margin() {
        let server = MockServer::start_async().await;
        let token = server
            .mock_async(|when, then| {
                when.method(POST).path("/identity/token");
                then.status(200).json_body(json!({
                    "access_token": "short-lived",
                    "expiration": unix_now() + 30
                }));
            })
            .await;

        let auth = Authenticator::api_key(reqwest::Client::new(), &server.base_url(), "k");
        auth.token().await.unwrap();
        auth.token().await.unwrap();
        token.assert_hits_async(2).await;
    }

    #[tokio::test]
    async fn rejected_key_is_an_auth_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/identity/token");
                then.status(400).json_body(json!({
                    "errorCode": "BXNIM0415E",
                    "errorMessage": "Provided API key could not be found"
                }));
            })
            .await;

        let auth = Authenticator::api_key(reqwest::Client::new(), &server.base_url(), "bad");
        match auth.token().await {
            Err(ClientError::Auth(msg)) => assert!(msg.contains("BXNIM0415E")),
            other => panic!("expected auth error, got {:?}", other),
        }
    }
}
