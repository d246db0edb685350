//! Configuration file loading
//!
//! ```json
//! {
//!   "provider": {"region": "us-south"},
//!   "backend": {"type": "local", "path": "isvpc.state.json"},
//!   "resources": [{"type": "is_vpc", "name": "main", "attributes": {"name": "prod"}}],
//!   "data": [{"type": "is_security_group", "name": "default", "attributes": {"name": "d"}}]
//! }
//! ```

use std::fs;
use std::path::Path;

use isvpc_core::resource::{Resource, Value};
use isvpc_state::BackendConfig;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct RawConfig {
    #[serde(default)]
    provider: serde_json::Value,
    #[serde(default)]
    backend: Option<serde_json::Value>,
    #[serde(default)]
    resources: Vec<RawResource>,
    #[serde(default)]
    data: Vec<RawResource>,
}

#[derive(Debug, Deserialize)]
struct RawResource {
    #[serde(rename = "type")]
    resource_type: String,
    name: String,
    #[serde(default)]
    attributes: serde_json::Map<String, serde_json::Value>,
}

impl RawResource {
    fn into_resource(self, read_only: bool) -> Resource {
        let mut resource = Resource::new(self.resource_type, self.name).with_read_only(read_only);
        for (key, value) in &self.attributes {
            if let Some(value) = Value::from_json(value) {
                resource.attributes.insert(key.clone(), value);
            }
        }
        resource
    }
}

/// A parsed configuration file
#[derive(Debug)]
pub struct Configuration {
    /// Raw `provider` block, applied over the environment
    pub provider: serde_json::Value,
    pub backend: BackendConfig,
    /// Managed resources followed by data sources
    pub resources: Vec<Resource>,
}

impl Configuration {
    pub fn parse(content: &str) -> Result<Self, String> {
        let raw: RawConfig =
            serde_json::from_str(content).map_err(|e| format!("Parse error: {}", e))?;

        let backend = match &raw.backend {
            Some(block) => BackendConfig::from_json(block).map_err(|e| e.to_string())?,
            None => BackendConfig::local(DEFAULT_STATE_PATH),
        };

        let mut resources: Vec<Resource> = Vec::new();
        let entries = raw
            .resources
            .into_iter()
            .map(|r| r.into_resource(false))
            .chain(raw.data.into_iter().map(|r| r.into_resource(true)));
        for resource in entries {
            if resources.iter().any(|r| r.id.name == resource.id.name) {
                return Err(format!(
                    "Duplicate binding name '{}': names are shared by resources and data sources",
                    resource.id.name
                ));
            }
            resources.push(resource);
        }

        Ok(Self {
            provider: raw.provider,
            backend,
            resources,
        })
    }

    pub fn load(path: &Path) -> Result<Self, String> {
        let content = fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        Self::parse(&content)
    }

    /// Backend settings only; a missing file falls back to the default local backend
    pub fn load_backend(path: &Path) -> Result<BackendConfig, String> {
        if !path.exists() {
            return Ok(BackendConfig::local(DEFAULT_STATE_PATH));
        }
        Ok(Self::load(path)?.backend)
    }
}

pub const DEFAULT_STATE_PATH: &str = "isvpc.state.json";
