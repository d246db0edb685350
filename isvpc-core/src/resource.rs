//! Resource - Representing resources and their state

use std::collections::HashMap;

/// Unique identifier for a resource
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceId {
    /// Resource type (e.g., "is_vpc", "is_subnet")
    pub resource_type: String,
    /// Resource name (binding name declared in configuration)
    pub name: String,
}

impl ResourceId {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ResourceId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.resource_type, self.name)
    }
}

/// Attribute value of a resource
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    String(String),
    Int(i64),
    Bool(bool),
    List(Vec<Value>),
    Map(HashMap<String, Value>),
    /// Reference to another resource's attribute (binding_name, attribute_name)
    ResourceRef(String, String),
}

impl Value {
    /// Parse a `${binding.attribute}` reference string
    pub fn parse_reference(s: &str) -> Option<Value> {
        let inner = s.strip_prefix("${")?.strip_suffix('}')?;
        let (binding, attribute) = inner.split_once('.')?;
        if binding.is_empty() || attribute.is_empty() {
            return None;
        }
        Some(Value::ResourceRef(
            binding.to_string(),
            attribute.to_string(),
        ))
    }

    /// Convert configuration/state JSON into a Value.
    ///
    /// Strings shaped like `${binding.attr}` become references. `null` has no
    /// counterpart and yields `None`.
    pub fn from_json(value: &serde_json::Value) -> Option<Value> {
        match value {
            serde_json::Value::Null => None,
            serde_json::Value::String(s) => {
                Some(Value::parse_reference(s).unwrap_or_else(|| Value::String(s.clone())))
            }
            serde_json::Value::Bool(b) => Some(Value::Bool(*b)),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Some(Value::Int(i))
                } else {
                    n.as_f64().map(|f| Value::Int(f as i64))
                }
            }
            serde_json::Value::Array(arr) => {
                Some(Value::List(arr.iter().filter_map(Value::from_json).collect()))
            }
            serde_json::Value::Object(obj) => Some(Value::Map(
                obj.iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k.clone(), v)))
                    .collect(),
            )),
        }
    }

    /// Convert to JSON. References are written back in `${binding.attr}` form.
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Int(i) => serde_json::Value::from(*i),
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::List(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(map) => serde_json::Value::Object(
                map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
            Value::ResourceRef(binding, attr) => {
                serde_json::Value::String(format!("${{{}.{}}}", binding, attr))
            }
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// True if this value or anything nested in it is an unresolved reference
    pub fn has_unresolved_ref(&self) -> bool {
        match self {
            Value::ResourceRef(_, _) => true,
            Value::List(items) => items.iter().any(Value::has_unresolved_ref),
            Value::Map(map) => map.values().any(Value::has_unresolved_ref),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<i64> for Value {
    fn from(i: i64) -> Self {
        Value::Int(i)
    }
}

/// Desired state declared in configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub id: ResourceId,
    pub attributes: HashMap<String, Value>,
    /// If true, this is a data source (read-only) that won't be modified
    pub read_only: bool,
}

impl Resource {
    pub fn new(resource_type: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: ResourceId::new(resource_type, name),
            attributes: HashMap::new(),
            read_only: false,
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    pub fn with_read_only(mut self, read_only: bool) -> Self {
        self.read_only = read_only;
        self
    }

    /// Returns true if this resource is a data source (read-only)
    pub fn is_data_source(&self) -> bool {
        self.read_only
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

/// Current state fetched from actual infrastructure
#[derive(Debug, Clone, PartialEq)]
pub struct State {
    pub id: ResourceId,
    /// Backend identifier, possibly composite (e.g. "r006-sg.r006-rule")
    pub identifier: Option<String>,
    pub attributes: HashMap<String, Value>,
    /// Whether this state exists
    pub exists: bool,
}

impl State {
    pub fn not_found(id: ResourceId) -> Self {
        Self {
            id,
            identifier: None,
            attributes: HashMap::new(),
            exists: false,
        }
    }

    pub fn existing(id: ResourceId, attributes: HashMap<String, Value>) -> Self {
        Self {
            id,
            identifier: None,
            attributes,
            exists: true,
        }
    }

    pub fn with_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.identifier = Some(identifier.into());
        self
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_reference_string() {
        assert_eq!(
            Value::parse_reference("${main.id}"),
            Some(Value::ResourceRef("main".to_string(), "id".to_string()))
        );
        assert_eq!(Value::parse_reference("main.id"), None);
        assert_eq!(Value::parse_reference("${main}"), None);
        assert_eq!(Value::parse_reference("${.id}"), None);
    }

    #[test]
    fn from_json_converts_nested_values() {
        let value = Value::from_json(&json!({
            "name": "web",
            "count": 3,
            "enabled": true,
            "vpc": "${main.id}",
            "tags": ["env:dev"],
            "gone": null
        }))
        .unwrap();

        let Value::Map(map) = value else {
            panic!("expected map");
        };
        assert_eq!(map.get("name"), Some(&Value::String("web".to_string())));
        assert_eq!(map.get("count"), Some(&Value::Int(3)));
        assert_eq!(map.get("enabled"), Some(&Value::Bool(true)));
        assert_eq!(
            map.get("vpc"),
            Some(&Value::ResourceRef("main".to_string(), "id".to_string()))
        );
        assert_eq!(
            map.get("tags"),
            Some(&Value::List(vec![Value::String("env:dev".to_string())]))
        );
        assert!(!map.contains_key("gone"));
    }

    #[test]
    fn to_json_writes_references_back() {
        let value = Value::ResourceRef("main".to_string(), "crn".to_string());
        assert_eq!(value.to_json(), json!("${main.crn}"));
    }

    #[test]
    fn unresolved_ref_detection() {
        let nested = Value::List(vec![
            Value::String("a".to_string()),
            Value::ResourceRef("sg".to_string(), "id".to_string()),
        ]);
        assert!(nested.has_unresolved_ref());
        assert!(!Value::String("a".to_string()).has_unresolved_ref());
    }
}
