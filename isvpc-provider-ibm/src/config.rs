//! Provider configuration
//!
//! Built from the environment, then overridden by the `provider` block of the
//! configuration file.

use std::time::Duration;

use thiserror::Error;

pub const DEFAULT_REGION: &str = "us-south";
pub const DEFAULT_IAM_ENDPOINT: &str = "https://iam.cloud.ibm.com";
pub const DEFAULT_TAGGING_ENDPOINT: &str = "https://tags.global-search-tagging.cloud.ibm.com";
/// `version` query parameter sent on every VPC API call
pub const DEFAULT_API_VERSION: &str = "2024-04-30";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("no credentials: set IC_API_KEY (or IBMCLOUD_API_KEY) or provider.iam_token")]
    MissingCredentials,

    #[error("invalid duration for {key}: {source}")]
    InvalidDuration {
        key: String,
        #[source]
        source: humantime::DurationError,
    },

    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[source] reqwest::Error),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    pub api_key: Option<String>,
    /// Bearer token used as-is instead of exchanging the API key
    pub iam_token: Option<String>,
    pub region: String,
    /// Full VPC API base URL including `/v1`
    pub vpc_endpoint: Option<String>,
    pub iam_endpoint: String,
    pub tagging_endpoint: String,
    pub api_version: String,
    /// Tags from `IC_ENV_TAGS`, attached to every taggable resource
    pub env_tags: Vec<String>,
    pub poll_interval: Duration,
    pub poll_delay: Duration,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            iam_token: None,
            region: DEFAULT_REGION.to_string(),
            vpc_endpoint: None,
            iam_endpoint: DEFAULT_IAM_ENDPOINT.to_string(),
            tagging_endpoint: DEFAULT_TAGGING_ENDPOINT.to_string(),
            api_version: DEFAULT_API_VERSION.to_string(),
            env_tags: Vec::new(),
            poll_interval: Duration::from_secs(10),
            poll_delay: Duration::from_secs(10),
        }
    }
}

impl ProviderConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary variable source; empty values count as unset
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |keys: &[&str]| {
            keys.iter()
                .filter_map(|key| lookup(key))
                .find(|v| !v.trim().is_empty())
        };

        let mut config = Self::default();
        config.api_key = get(&["IC_API_KEY", "IBMCLOUD_API_KEY"]);
        if let Some(region) = get(&["IC_REGION", "IBMCLOUD_REGION"]) {
            config.region = region;
        }
        config.vpc_endpoint = get(&["IBMCLOUD_IS_NG_API_ENDPOINT"]);
        if let Some(iam) = get(&["IBMCLOUD_IAM_API_ENDPOINT"]) {
            config.iam_endpoint = iam;
        }
        if let Some(gt) = get(&["IBMCLOUD_GT_API_ENDPOINT"]) {
            config.tagging_endpoint = gt;
        }
        if let Some(version) = get(&["IBMCLOUD_IS_API_VERSION"]) {
            config.api_version = version;
        }
        if let Some(tags) = get(&["IC_ENV_TAGS"]) {
            config.env_tags = split_tags(&tags);
        }
        config
    }

    /// Apply a `provider` block such as `{"region": "eu-de", "poll_interval": "5s"}`
    pub fn apply_overrides(&mut self, block: &serde_json::Value) -> Result<(), ConfigError> {
        let Some(object) = block.as_object() else {
            if block.is_null() {
                return Ok(());
            }
            return Err(ConfigError::InvalidValue {
                key: "provider".to_string(),
                message: "expected an object".to_string(),
            });
        };

        for (key, value) in object {
            let text = || {
                value
                    .as_str()
                    .map(str::to_string)
                    .ok_or_else(|| ConfigError::InvalidValue {
                        key: key.clone(),
                        message: "expected a string".to_string(),
                    })
            };
            match key.as_str() {
                "api_key" => self.api_key = Some(text()?),
                "iam_token" => self.iam_token = Some(text()?),
                "region" => self.region = text()?,
                "vpc_endpoint" => self.vpc_endpoint = Some(text()?),
                "iam_endpoint" => self.iam_endpoint = text()?,
                "tagging_endpoint" => self.tagging_endpoint = text()?,
                "api_version" => self.api_version = text()?,
                "poll_interval" => self.poll_interval = parse_duration(key, &text()?)?,
                "poll_delay" => self.poll_delay = parse_duration(key, &text()?)?,
                "env_tags" => {
                    self.env_tags = match value {
                        serde_json::Value::Array(items) => items
                            .iter()
                            .filter_map(|v| v.as_str())
                            .map(str::to_string)
                            .collect(),
                        _ => split_tags(&text()?),
                    }
                }
                other => {
                    return Err(ConfigError::InvalidValue {
                        key: other.to_string(),
                        message: "unknown provider setting".to_string(),
                    });
                }
            }
        }
        Ok(())
    }

    /// Fail early when no credential source is configured
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.is_none() && self.iam_token.is_none() {
            return Err(ConfigError::MissingCredentials);
        }
        Ok(())
    }

    pub fn vpc_base_url(&self) -> String {
        match &self.vpc_endpoint {
            Some(endpoint) => endpoint.trim_end_matches('/').to_string(),
            None => format!("https://{}.iaas.cloud.ibm.com/v1", self.region),
        }
    }
}

fn parse_duration(key: &str, text: &str) -> Result<Duration, ConfigError> {
    humantime::parse_duration(text).map_err(|source| ConfigError::InvalidDuration {
        key: key.to_string(),
        source,
    })
}

fn split_tags(text: &str) -> Vec<String> {
    text.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_without_environment() {
        let config = ProviderConfig::from_lookup(lookup(&[]));
        assert_eq!(config.region, "us-south");
        assert_eq!(config.vpc_base_url(), "https://us-south.iaas.cloud.ibm.com/v1");
        assert_eq!(config.api_version, DEFAULT_API_VERSION);
        assert!(matches!(
            config.validate(),
            Err(ConfigError::MissingCredentials)
        ));
    }

    #[test]
    fn reads_environment_with_fallbacks() {
        let config = ProviderConfig::from_lookup(lookup(&[
            ("IC_API_KEY", ""),
            ("IBMCLOUD_API_KEY", "key-123"),
            ("IBMCLOUD_REGION", "eu-de"),
            ("IC_ENV_TAGS", "env:test, team:net ,"),
            ("IBMCLOUD_IS_NG_API_ENDPOINT", "https://private.eu-de.iaas.cloud.ibm.com/v1/"),
        ]));

        assert_eq!(config.api_key.as_deref(), Some("key-123"));
        assert_eq!(config.region, "eu-de");
        assert_eq!(config.env_tags, vec!["env:test", "team:net"]);
        assert_eq!(
            config.vpc_base_url(),
            "https://private.eu-de.iaas.cloud.ibm.com/v1"
        );
        assert!(config.validate().is_ok());
    }

    #[test]
    fn overrides_from_provider_block() {
        let mut config = ProviderConfig::from_lookup(lookup(&[("IC_REGION", "us-east")]));
        config
            .apply_overrides(&json!({
                "region": "jp-tok",
                "iam_token": "token-abc",
                "poll_interval": "2s",
                "poll_delay": "500ms",
                "env_tags": ["owner:ops"]
            }))
            .unwrap();

        assert_eq!(config.region, "jp-tok");
        assert_eq!(config.iam_token.as_deref(), Some("token-abc"));
        assert_eq!(config.poll_interval, Duration::from_secs(2));
        assert_eq!(config.poll_delay, Duration::from_millis(500));
        assert_eq!(config.env_tags, vec!["owner:ops"]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn rejects_bad_overrides() {
        let mut config = ProviderConfig::default();
        assert!(matches!(
            config.apply_overrides(&json!({"poll_interval": "soon"})),
            Err(ConfigError::InvalidDuration { .. })
        ));
        assert!(matches!(
            config.apply_overrides(&json!({"zone": "us-south-1"})),
            Err(ConfigError::InvalidValue { .. })
        ));
        assert!(config.apply_overrides(&serde_json::Value::Null).is_ok());
    }
}
