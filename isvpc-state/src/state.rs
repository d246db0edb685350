//! State file structures

use std::collections::HashMap;

use isvpc_core::resource::{ResourceId, State, Value};
use serde::{Deserialize, Serialize};

/// Everything `apply` has created, persisted to the backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StateFile {
    /// Format version
    pub version: u32,
    /// Bumped on every write
    pub serial: u64,
    /// Fixed at creation; distinguishes unrelated state files
    pub lineage: String,
    /// isvpc version that last wrote the file
    pub tool_version: String,
    pub resources: Vec<ResourceState>,
}

impl StateFile {
    pub const CURRENT_VERSION: u32 = 1;

    pub fn new() -> Self {
        Self::with_lineage(uuid::Uuid::new_v4().to_string())
    }

    pub fn with_lineage(lineage: String) -> Self {
        Self {
            version: Self::CURRENT_VERSION,
            serial: 0,
            lineage,
            tool_version: env!("CARGO_PKG_VERSION").to_string(),
            resources: Vec::new(),
        }
    }

    pub fn increment_serial(&mut self) {
        self.serial += 1;
        self.tool_version = env!("CARGO_PKG_VERSION").to_string();
    }

    pub fn find_resource(&self, resource_type: &str, name: &str) -> Option<&ResourceState> {
        self.resources
            .iter()
            .find(|r| r.resource_type == resource_type && r.name == name)
    }

    /// Find by `type.name` address as printed by `state list`
    pub fn find_by_address(&self, address: &str) -> Option<&ResourceState> {
        let (resource_type, name) = address.split_once('.')?;
        self.find_resource(resource_type, name)
    }

    /// Insert or replace the entry with the same type and name
    pub fn upsert_resource(&mut self, resource: ResourceState) {
        match self
            .resources
            .iter_mut()
            .find(|r| r.resource_type == resource.resource_type && r.name == resource.name)
        {
            Some(existing) => *existing = resource,
            None => self.resources.push(resource),
        }
    }

    pub fn remove_resource(&mut self, resource_type: &str, name: &str) -> Option<ResourceState> {
        let pos = self
            .resources
            .iter()
            .position(|r| r.resource_type == resource_type && r.name == name)?;
        Some(self.resources.remove(pos))
    }

    /// Core states keyed by resource ID, as the differ consumes them
    pub fn current_states(&self) -> HashMap<ResourceId, State> {
        self.resources
            .iter()
            .map(|r| (r.resource_id(), r.to_state()))
            .collect()
    }

    /// Sorted `type.name` addresses
    pub fn addresses(&self) -> Vec<String> {
        let mut addresses: Vec<String> = self
            .resources
            .iter()
            .map(|r| r.resource_id().to_string())
            .collect();
        addresses.sort();
        addresses
    }
}

impl Default for StateFile {
    fn default() -> Self {
        Self::new()
    }
}

/// One managed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    /// e.g. "is_subnet"
    pub resource_type: String,
    /// Binding name from configuration
    pub name: String,
    pub provider: String,
    /// Backend ID, possibly composite such as `<sg>.<rule>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,
    pub attributes: HashMap<String, serde_json::Value>,
}

impl ResourceState {
    pub fn new(
        resource_type: impl Into<String>,
        name: impl Into<String>,
        provider: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
            provider: provider.into(),
            identifier: None,
            attributes: HashMap::new(),
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }

    /// Capture a provider-returned state
    pub fn from_state(state: &State, provider: impl Into<String>) -> Self {
        Self {
            resource_type: state.id.resource_type.clone(),
            name: state.id.name.clone(),
            provider: provider.into(),
            identifier: state.identifier.clone(),
            attributes: state
                .attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.to_json()))
                .collect(),
        }
    }

    pub fn resource_id(&self) -> ResourceId {
        ResourceId::new(&self.resource_type, &self.name)
    }

    pub fn to_state(&self) -> State {
        let attributes: HashMap<String, Value> = self
            .attributes
            .iter()
            .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
            .collect();
        let state = State::existing(self.resource_id(), attributes);
        match &self.identifier {
            Some(identifier) => state.with_identifier(identifier),
            None => state,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn new_state_file_is_empty() {
        let state = StateFile::new();
        assert_eq!(state.version, StateFile::CURRENT_VERSION);
        assert_eq!(state.serial, 0);
        assert!(!state.lineage.is_empty());
        assert!(state.resources.is_empty());
    }

    #[test]
    fn increment_serial() {
        let mut state = StateFile::new();
        state.increment_serial();
        state.increment_serial();
        assert_eq!(state.serial, 2);
    }

    #[test]
    fn upsert_replaces_same_address() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("is_subnet", "web", "ibm").with_attribute("name", json!("web-1")),
        );
        state.upsert_resource(
            ResourceState::new("is_subnet", "web", "ibm").with_attribute("name", json!("web-2")),
        );

        assert_eq!(state.resources.len(), 1);
        assert_eq!(
            state.resources[0].attributes.get("name"),
            Some(&json!("web-2"))
        );
    }

    #[test]
    fn remove_resource() {
        let mut state = StateFile::new();
        state.upsert_resource(ResourceState::new("is_vpc", "main", "ibm"));

        assert!(state.remove_resource("is_vpc", "main").is_some());
        assert!(state.resources.is_empty());
        assert!(state.remove_resource("is_vpc", "other").is_none());
    }

    #[test]
    fn find_by_address() {
        let mut state = StateFile::new();
        state.upsert_resource(
            ResourceState::new("is_security_group_rule", "ssh", "ibm")
                .with_identifier("r006-sg.r006-rule"),
        );
        state.upsert_resource(ResourceState::new("is_vpc", "main", "ibm"));

        let rule = state.find_by_address("is_security_group_rule.ssh").unwrap();
        assert_eq!(rule.identifier.as_deref(), Some("r006-sg.r006-rule"));
        assert!(state.find_by_address("is_vpc").is_none());
        assert_eq!(
            state.addresses(),
            vec!["is_security_group_rule.ssh", "is_vpc.main"]
        );
    }

    #[test]
    fn converts_to_and_from_core_state() {
        let mut attributes = HashMap::new();
        attributes.insert("name".to_string(), Value::String("web".to_string()));
        attributes.insert("total_ipv4_address_count".to_string(), Value::Int(256));
        let state = State::existing(ResourceId::new("is_subnet", "web"), attributes)
            .with_identifier("0717-subnet");

        let stored = ResourceState::from_state(&state, "ibm");
        assert_eq!(stored.identifier.as_deref(), Some("0717-subnet"));
        assert_eq!(stored.attributes.get("total_ipv4_address_count"), Some(&json!(256)));
        assert_eq!(stored.to_state(), state);

        let mut file = StateFile::new();
        file.upsert_resource(stored);
        let current = file.current_states();
        assert_eq!(current.get(&ResourceId::new("is_subnet", "web")), Some(&state));
    }

    #[test]
    fn identifier_is_optional_in_json() {
        let stored: ResourceState = serde_json::from_value(json!({
            "resource_type": "is_vpc",
            "name": "main",
            "provider": "ibm",
            "attributes": {}
        }))
        .unwrap();
        assert!(stored.identifier.is_none());

        let json = serde_json::to_value(&stored).unwrap();
        assert!(json.get("identifier").is_none());
    }
}
