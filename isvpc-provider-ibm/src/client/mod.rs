//! VPC REST client
//!
//! Thin typed wrapper over the regional VPC API: every request carries the
//! `version` and `generation=2` query parameters and a bearer token, patches
//! use `application/merge-patch+json`, and non-2xx responses become
//! [`ApiError`].

pub mod auth;
pub mod error;
pub mod tagging;

use std::collections::HashSet;
use std::sync::Arc;

use reqwest::{Method, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;

pub use auth::Authenticator;
pub use error::{ApiError, ClientError};
pub use tagging::TaggingClient;

pub type ClientResult<T> = Result<T, ClientError>;

const MERGE_PATCH: &str = "application/merge-patch+json";

/// Page size requested from list endpoints
const PAGE_LIMIT: &str = "50";

#[derive(Debug, Clone)]
pub struct VpcClient {
    http: reqwest::Client,
    base_url: String,
    version: String,
    auth: Arc<Authenticator>,
}

impl VpcClient {
    pub fn new(
        http: reqwest::Client,
        base_url: impl Into<String>,
        version: impl Into<String>,
        auth: Arc<Authenticator>,
    ) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            version: version.into(),
            auth,
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn request(&self, method: Method, path: &str) -> ClientResult<RequestBuilder> {
        let token = self.auth.token().await?;
        log::debug!("{} {}{}", method, self.base_url, path);
        Ok(self
            .http
            .request(method, format!("{}{}", self.base_url, path))
            .bearer_auth(token)
            .header("Accept", "application/json")
            .query(&[("version", self.version.as_str()), ("generation", "2")]))
    }

    async fn send(&self, builder: RequestBuilder) -> ClientResult<Vec<u8>> {
        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?.to_vec();
        if !status.is_success() {
            let err = ApiError::from_response(status.as_u16(), &body);
            log::debug!("-> {} {}", status.as_u16(), err.message);
            return Err(err.into());
        }
        Ok(body)
    }

    fn decode<T: DeserializeOwned>(path: &str, body: &[u8]) -> ClientResult<T> {
        serde_json::from_slice(body).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ClientResult<T> {
        self.get_with_query(path, &[]).await
    }

    pub async fn get_with_query<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<T> {
        let builder = self.request(Method::GET, path).await?.query(query);
        let body = self.send(builder).await?;
        Self::decode(path, &body)
    }

    /// GET an endpoint that answers 204 when the object exists
    pub async fn exists(&self, path: &str) -> ClientResult<bool> {
        let builder = self.request(Method::GET, path).await?;
        match self.send(builder).await {
            Ok(_) => Ok(true),
            Err(e) if e.is_not_found() => Ok(false),
            Err(e) => Err(e),
        }
    }

    pub async fn post<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.request(Method::POST, path).await?.json(body);
        let body = self.send(builder).await?;
        Self::decode(path, &body)
    }

    pub async fn put<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let builder = self.request(Method::PUT, path).await?.json(body);
        let body = self.send(builder).await?;
        Self::decode(path, &body)
    }

    /// PUT without a request or response body
    pub async fn put_empty(&self, path: &str) -> ClientResult<()> {
        let builder = self.request(Method::PUT, path).await?;
        self.send(builder).await.map(|_| ())
    }

    /// JSON merge patch
    pub async fn patch<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> ClientResult<T> {
        let payload = serde_json::to_vec(body).map_err(|source| ClientError::Decode {
            path: path.to_string(),
            source,
        })?;
        let builder = self
            .request(Method::PATCH, path)
            .await?
            .header("Content-Type", MERGE_PATCH)
            .body(payload);
        let body = self.send(builder).await?;
        Self::decode(path, &body)
    }

    pub async fn delete(&self, path: &str) -> ClientResult<()> {
        let builder = self.request(Method::DELETE, path).await?;
        self.send(builder).await.map(|_| ())
    }

    /// Collect every page of a list endpoint.
    ///
    /// `items_key` names the array in each page (`"subnets"`, `"rules"`, ...).
    /// Pages are chained through `next.href`'s `start` cursor; a cursor seen
    /// twice is an error.
    pub async fn list_all<T: DeserializeOwned>(
        &self,
        path: &str,
        items_key: &str,
        query: &[(&str, &str)],
    ) -> ClientResult<Vec<T>> {
        let mut items = Vec::new();
        let mut start: Option<String> = None;
        let mut seen: HashSet<String> = HashSet::new();

        loop {
            let mut page_query: Vec<(&str, &str)> = query.to_vec();
            page_query.push(("limit", PAGE_LIMIT));
            if let Some(cursor) = start.as_deref() {
                page_query.push(("start", cursor));
            }

            let mut page: serde_json::Value = self.get_with_query(path, &page_query).await?;
            if let Some(serde_json::Value::Array(values)) =
                page.get_mut(items_key).map(serde_json::Value::take)
            {
                for value in values {
                    items.push(serde_json::from_value(value).map_err(|source| {
                        ClientError::Decode {
                            path: path.to_string(),
                            source,
                        }
                    })?);
                }
            }

            start = page
                .get("next")
                .and_then(|next| next.get("href"))
                .and_then(|href| href.as_str())
                .and_then(start_cursor);
            match &start {
                None => return Ok(items),
                Some(cursor) if !seen.insert(cursor.clone()) => {
                    return Err(ClientError::PaginationLoop {
                        path: path.to_string(),
                        cursor: cursor.clone(),
                    });
                }
                Some(_) => {}
            }
        }
    }
}

/// Extract the `start` query parameter from a pagination link
pub fn start_cursor(href: &str) -> Option<String> {
    let url = reqwest::Url::parse(href).ok()?;
    url.query_pairs()
        .find(|(key, _)| key == "start")
        .map(|(_, value)| value.into_owned())
}
