//! Global tagging client
//!
//! User and access tags live outside the VPC API and are attached by CRN.
//! Callers treat every failure here as non-fatal.

use std::collections::BTreeSet;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use super::error::{ApiError, ClientError};
use super::{Authenticator, ClientResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagType {
    User,
    Access,
}

impl TagType {
    pub fn as_str(&self) -> &'static str {
        match self {
            TagType::User => "user",
            TagType::Access => "access",
        }
    }
}

#[derive(Debug, Deserialize)]
struct TagList {
    #[serde(default)]
    items: Vec<TagItem>,
}

#[derive(Debug, Deserialize)]
struct TagItem {
    name: String,
}

#[derive(Debug, Serialize)]
struct TagRequest<'a> {
    resources: Vec<TagResource<'a>>,
    tag_names: &'a [String],
}

#[derive(Debug, Serialize)]
struct TagResource<'a> {
    resource_id: &'a str,
}

/// Tags to attach and detach to move from `old` to `new`
#[derive(Debug, Default, PartialEq, Eq)]
pub struct TagChanges {
    pub attach: Vec<String>,
    pub detach: Vec<String>,
}

impl TagChanges {
    /// `env_tags` are always attached and never detached
    pub fn between(old: &[String], new: &[String], env_tags: &[String]) -> Self {
        let old: BTreeSet<&str> = old.iter().map(String::as_str).collect();
        let new: BTreeSet<&str> = new
            .iter()
            .chain(env_tags.iter())
            .map(String::as_str)
            .collect();

        Self {
            attach: new.difference(&old).map(|s| s.to_string()).collect(),
            detach: old.difference(&new).map(|s| s.to_string()).collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.attach.is_empty() && self.detach.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct TaggingClient {
    http: reqwest::Client,
    base_url: String,
    auth: Arc<Authenticator>,
}

impl TaggingClient {
    pub fn new(http: reqwest::Client, base_url: impl Into<String>, auth: Arc<Authenticator>) -> Self {
        Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            auth,
        }
    }

    /// Names of tags of `tag_type` attached to `crn`, sorted
    pub async fn get_tags(&self, crn: &str, tag_type: TagType) -> ClientResult<Vec<String>> {
        let token = self.auth.token().await?;
        let response = self
            .http
            .get(format!("{}/v3/tags", self.base_url))
            .bearer_auth(token)
            .query(&[
                ("attached_to", crn),
                ("tag_type", tag_type.as_str()),
                ("limit", "1000"),
            ])
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        if !status.is_success() {
            return Err(ApiError::from_response(status.as_u16(), &body).into());
        }
        let list: TagList = serde_json::from_slice(&body).map_err(|source| ClientError::Decode {
            path: "/v3/tags".to_string(),
            source,
        })?;
        let mut names: Vec<String> = list.items.into_iter().map(|t| t.name).collect();
        names.sort();
        Ok(names)
    }

    pub async fn attach(&self, crn: &str, tags: &[String], tag_type: TagType) -> ClientResult<()> {
        self.post_tags("attach", crn, tags, tag_type).await
    }

    pub async fn detach(&self, crn: &str, tags: &[String], tag_type: TagType) -> ClientResult<()> {
        self.post_tags("detach", crn, tags, tag_type).await
    }

    async fn post_tags(
        &self,
        action: &str,
        crn: &str,
        tags: &[String],
        tag_type: TagType,
    ) -> ClientResult<()> {
        if tags.is_empty() {
            return Ok(());
        }
        let token = self.auth.token().await?;
        log::debug!("{} {} tags {:?} on {}", action, tag_type.as_str(), tags, crn);
        let response = self
            .http
            .post(format!("{}/v3/tags/{}", self.base_url, action))
            .bearer_auth(token)
            .query(&[("tag_type", tag_type.as_str())])
            .json(&TagRequest {
                resources: vec![TagResource { resource_id: crn }],
                tag_names: tags,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.bytes().await?;
            return Err(ApiError::from_response(status.as_u16(), &body).into());
        }
        Ok(())
    }

    /// Move `crn` from `old` to `new` tags. Failures are logged, never returned.
    pub async fn update_tags(
        &self,
        crn: &str,
        old: &[String],
        new: &[String],
        env_tags: &[String],
        tag_type: TagType,
    ) {
        let changes = TagChanges::between(old, new, env_tags);
        if changes.is_empty() {
            return;
        }
        if let Err(e) = self.detach(crn, &changes.detach, tag_type).await {
            log::warn!(
                "failed to detach {} tags {:?} from {}: {}",
                tag_type.as_str(),
                changes.detach,
                crn,
                e
            );
        }
        if let Err(e) = self.attach(crn, &changes.attach, tag_type).await {
            log::warn!(
                "failed to attach {} tags {:?} to {}: {}",
                tag_type.as_str(),
                changes.attach,
                crn,
                e
            );
        }
    }

    /// Attached tags, or `None` (logged) when the lookup fails
    pub async fn read_tags(&self, crn: &str, tag_type: TagType) -> Option<Vec<String>> {
        match self.get_tags(crn, tag_type).await {
            Ok(tags) => Some(tags),
            Err(e) => {
                log::warn!(
                    "failed to read {} tags of {}: {}",
                    tag_type.as_str(),
                    crn,
                    e
                );
                None
            }
        }
    }
}
