//! IBM Cloud VPC provider
//!
//! Holds the REST clients, the keyed lock table, and the polling cadence
//! shared by every resource handler.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use isvpc_core::mutex_kv::MutexKv;
use isvpc_core::provider::ProviderResult;
use isvpc_core::resource::Value;
use isvpc_core::waiter::{Observation, PollConfig, WaitError, WaitSpec, wait_for};

use crate::client::tagging::TagType;
use crate::client::{Authenticator, TaggingClient, VpcClient};
use crate::config::{ConfigError, ProviderConfig};
use crate::utils::string_list;

const USER_AGENT: &str = concat!("isvpc/", env!("CARGO_PKG_VERSION"));

pub struct IbmProvider {
    pub(crate) vpc: VpcClient,
    pub(crate) tagging: TaggingClient,
    pub(crate) env_tags: Vec<String>,
    pub(crate) poll: PollConfig,
    pub(crate) locks: MutexKv,
}

impl IbmProvider {
    /// Build clients for `config`. No request is sent until the first operation.
    pub fn new(config: &ProviderConfig) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(ConfigError::HttpClient)?;

        let auth = match (&config.iam_token, &config.api_key) {
            (Some(token), _) => Authenticator::Static(token.clone()),
            (None, Some(key)) => Authenticator::api_key(http.clone(), &config.iam_endpoint, key),
            (None, None) => return Err(ConfigError::MissingCredentials),
        };
        let auth = Arc::new(auth);

        log::debug!(
            "IBM VPC provider: region {}, endpoint {}",
            config.region,
            config.vpc_base_url()
        );

        let vpc = VpcClient::new(
            http.clone(),
            config.vpc_base_url(),
            config.api_version.clone(),
            auth.clone(),
        );
        let tagging = TaggingClient::new(http, config.tagging_endpoint.clone(), auth);
        let poll = PollConfig {
            delay: config.poll_delay,
            interval: config.poll_interval,
            ..PollConfig::default()
        };
        Ok(Self::with_clients(vpc, tagging, config.env_tags.clone(), poll))
    }

    pub fn with_clients(
        vpc: VpcClient,
        tagging: TaggingClient,
        env_tags: Vec<String>,
        poll: PollConfig,
    ) -> Self {
        Self {
            vpc,
            tagging,
            env_tags,
            poll,
            locks: MutexKv::new(),
        }
    }

    /// Poll `refresh` under `spec` for at most `timeout`
    pub(crate) async fn wait<F, Fut>(
        &self,
        spec: &WaitSpec,
        timeout: Duration,
        refresh: F,
    ) -> Result<String, WaitError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = ProviderResult<Observation>>,
    {
        wait_for(spec, &self.poll.with_timeout(timeout), refresh).await
    }

    /// Move the tags of `crn` from `from` to `to` (user tags include env tags)
    pub(crate) async fn write_tags(
        &self,
        crn: &str,
        from: Option<&HashMap<String, Value>>,
        to: &HashMap<String, Value>,
    ) {
        let old = |key: &str| from.map(|attrs| string_list(attrs, key)).unwrap_or_default();

        self.tagging
            .update_tags(
                crn,
                &old("tags"),
                &string_list(to, "tags"),
                &self.env_tags,
                TagType::User,
            )
            .await;
        self.tagging
            .update_tags(
                crn,
                &old("access_tags"),
                &string_list(to, "access_tags"),
                &[],
                TagType::Access,
            )
            .await;
    }

    /// Add `tags` (without env tags) and `access_tags` read from the tagging API
    pub(crate) async fn read_tags_into(&self, crn: &str, attrs: &mut HashMap<String, Value>) {
        if let Some(tags) = self.tagging.read_tags(crn, TagType::User).await {
            let user: Vec<Value> = tags
                .into_iter()
                .filter(|t| !self.env_tags.contains(t))
                .map(Value::String)
                .collect();
            attrs.insert("tags".to_string(), Value::List(user));
        }
        if let Some(tags) = self.tagging.read_tags(crn, TagType::Access).await {
            attrs.insert(
                "access_tags".to_string(),
                Value::List(tags.into_iter().map(Value::String).collect()),
            );
        }
    }
}


#[cfg(test)]
mod tests {
    use super::testing::*;
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    #[test]
    fn new_requires_credentials() {
        assert!(matches!(
            IbmProvider::new(&ProviderConfig::default()),
            Err(ConfigError::MissingCredentials)
        ));

        let config = ProviderConfig {
            iam_token: Some("token".to_string()),
            poll_interval: Duration::from_secs(3),
            ..ProviderConfig::default()
        };
        let provider = IbmProvider::new(&config).unwrap();
        assert_eq!(provider.poll.interval, Duration::from_secs(3));
        assert_eq!(
            provider.vpc.base_url(),
            "https://us-south.iaas.cloud.ibm.com/v1"
        );
    }

    #[tokio::test]
    async fn read_tags_strips_env_tags() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/tags").query_param("tag_type", "user");
                then.status(200)
                    .json_body(json!({"items": [{"name": "env:ci"}, {"name": "team:net"}]}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/tags").query_param("tag_type", "access");
                then.status(500).body("unavailable");
            })
            .await;

        let provider = provider_with_env_tags(&server, vec!["env:ci".to_string()]);
        let mut attrs = HashMap::new();
        provider.read_tags_into("crn:v1:vpc", &mut attrs).await;
        assert_eq!(
            attrs.get("tags"),
            Some(&Value::List(vec![Value::String("team:net".to_string())]))
        );
        assert!(!attrs.contains_key("access_tags"));
    }

    #[tokio::test]
    async fn write_tags_attaches_env_tags_on_create() {
        let server = MockServer::start_async().await;
        let attach = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v3/tags/attach")
                    .query_param("tag_type", "user")
                    .json_body(json!({
                        "resources": [{"resource_id": "crn:v1:subnet"}],
                        "tag_names": ["env:ci", "team:web"]
                    }));
                then.status(200).json_body(json!({"results": []}));
            })
            .await;

        let provider = provider_with_env_tags(&server, vec!["env:ci".to_string()]);
        let mut to = HashMap::new();
        to.insert(
            "tags".to_string(),
            Value::List(vec![Value::String("team:web".to_string())]),
        );
        provider.write_tags("crn:v1:subnet", None, &to).await;
        attach.assert_async().await;
    }
}
