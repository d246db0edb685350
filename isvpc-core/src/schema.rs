//! Schema - Define type schemas for resources
//!
//! Providers define schemas for each resource type,
//! enabling type validation before any API call is made.

use std::collections::HashMap;
use std::fmt;

use crate::resource::Value;

/// Attribute type
#[derive(Debug, Clone)]
pub enum AttributeType {
    /// String
    String,
    /// Integer
    Int,
    /// Boolean
    Bool,
    /// Enum (list of allowed values)
    Enum(Vec<String>),
    /// Custom type (with validation function)
    Custom {
        name: String,
        base: Box<AttributeType>,
        validate: fn(&Value) -> Result<(), String>,
    },
    /// List
    List(Box<AttributeType>),
    /// Map
    Map(Box<AttributeType>),
}

impl AttributeType {
    /// Check if a value conforms to this type
    pub fn validate(&self, value: &Value) -> Result<(), TypeError> {
        match (self, value) {
            // References are checked once they resolve
            (_, Value::ResourceRef(_, _)) => Ok(()),
            (AttributeType::String, Value::String(_)) => Ok(()),
            (AttributeType::Int, Value::Int(_)) => Ok(()),
            (AttributeType::Bool, Value::Bool(_)) => Ok(()),

            (AttributeType::Enum(variants), Value::String(s)) => {
                if variants.iter().any(|v| v == s) {
                    Ok(())
                } else {
                    Err(TypeError::InvalidEnumVariant {
                        value: s.clone(),
                        expected: variants.clone(),
                    })
                }
            }

            (AttributeType::Custom { validate, base, .. }, v) => {
                base.validate(v)?;
                validate(v).map_err(|msg| TypeError::ValidationFailed { message: msg })
            }

            (AttributeType::List(inner), Value::List(items)) => {
                for (i, item) in items.iter().enumerate() {
                    inner.validate(item).map_err(|e| TypeError::ListItemError {
                        index: i,
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            (AttributeType::Map(inner), Value::Map(map)) => {
                for (k, v) in map {
                    inner.validate(v).map_err(|e| TypeError::MapValueError {
                        key: k.clone(),
                        inner: Box::new(e),
                    })?;
                }
                Ok(())
            }

            _ => Err(TypeError::TypeMismatch {
                expected: self.type_name(),
                got: value.type_name(),
            }),
        }
    }

    fn type_name(&self) -> String {
        match self {
            AttributeType::String => "String".to_string(),
            AttributeType::Int => "Int".to_string(),
            AttributeType::Bool => "Bool".to_string(),
            AttributeType::Enum(variants) => format!("Enum({})", variants.join(" | ")),
            AttributeType::Custom { name, .. } => name.clone(),
            AttributeType::List(inner) => format!("List<{}>", inner.type_name()),
            AttributeType::Map(inner) => format!("Map<{}>", inner.type_name()),
        }
    }
}

impl fmt::Display for AttributeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name())
    }
}

/// Type error
#[derive(Debug, Clone, thiserror::Error)]
pub enum TypeError {
    #[error("Type mismatch: expected {expected}, got {got}")]
    TypeMismatch { expected: String, got: String },

    #[error("Invalid enum variant '{value}', expected one of: {}", expected.join(", "))]
    InvalidEnumVariant {
        value: String,
        expected: Vec<String>,
    },

    #[error("Validation failed: {message}")]
    ValidationFailed { message: String },

    #[error("Required attribute '{name}' is missing")]
    MissingRequired { name: String },

    #[error("Unknown attribute '{name}'")]
    UnknownAttribute { name: String },

    #[error("Attribute '{name}' is computed and cannot be set")]
    ComputedAttribute { name: String },

    #[error("Attributes '{first}' and '{second}' conflict")]
    Conflicting { first: String, second: String },

    #[error("List item at index {index}: {inner}")]
    ListItemError { index: usize, inner: Box<TypeError> },

    #[error("Map value for key '{key}': {inner}")]
    MapValueError { key: String, inner: Box<TypeError> },
}

impl Value {
    fn type_name(&self) -> String {
        match self {
            Value::String(_) => "String".to_string(),
            Value::Int(_) => "Int".to_string(),
            Value::Bool(_) => "Bool".to_string(),
            Value::List(_) => "List".to_string(),
            Value::Map(_) => "Map".to_string(),
            Value::ResourceRef(binding, attr) => format!("ResourceRef({}.{})", binding, attr),
        }
    }
}

/// Attribute schema
#[derive(Debug, Clone)]
pub struct AttributeSchema {
    pub name: String,
    pub attr_type: AttributeType,
    pub required: bool,
    /// Set by the backend, never by configuration
    pub computed: bool,
    /// Changing the value requires replacing the resource
    pub force_new: bool,
    /// Dropping the attribute from configuration clears it remotely. Left
    /// unset for attributes the API fills in when they are omitted.
    pub removable: bool,
    pub default: Option<Value>,
    pub description: Option<String>,
    /// API-side property name when it differs from the attribute name
    pub provider_name: Option<String>,
}

impl AttributeSchema {
    pub fn new(name: impl Into<String>, attr_type: AttributeType) -> Self {
        Self {
            name: name.into(),
            attr_type,
            required: false,
            computed: false,
            force_new: false,
            removable: false,
            default: None,
            description: None,
            provider_name: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    pub fn removable(mut self) -> Self {
        self.removable = true;
        self
    }

    pub fn with_default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn with_provider_name(mut self, name: impl Into<String>) -> Self {
        self.provider_name = Some(name.into());
        self
    }
}

/// Resource schema
#[derive(Debug, Clone)]
pub struct ResourceSchema {
    pub resource_type: String,
    pub attributes: HashMap<String, AttributeSchema>,
    pub description: Option<String>,
    /// Pairs of attributes that may not both be set
    pub conflicts: Vec<(String, String)>,
}

impl ResourceSchema {
    pub fn new(resource_type: impl Into<String>) -> Self {
        Self {
            resource_type: resource_type.into(),
            attributes: HashMap::new(),
            description: None,
            conflicts: Vec::new(),
        }
    }

    pub fn attribute(mut self, schema: AttributeSchema) -> Self {
        self.attributes.insert(schema.name.clone(), schema);
        self
    }

    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    pub fn conflicting(mut self, first: &str, second: &str) -> Self {
        self.conflicts.push((first.to_string(), second.to_string()));
        self
    }

    /// Attribute names whose change forces replacement
    pub fn force_new_attributes(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .attributes
            .values()
            .filter(|a| a.force_new)
            .map(|a| a.name.as_str())
            .collect();
        names.sort();
        names
    }

    /// Fill in declared defaults for attributes absent from `attributes`
    pub fn apply_defaults(&self, attributes: &mut HashMap<String, Value>) {
        for (name, schema) in &self.attributes {
            if let Some(default) = &schema.default {
                attributes
                    .entry(name.clone())
                    .or_insert_with(|| default.clone());
            }
        }
    }

    /// Validate resource attributes as declared in configuration
    pub fn validate(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let mut errors = Vec::new();

        for (name, schema) in &self.attributes {
            if schema.required && !attributes.contains_key(name) && schema.default.is_none() {
                errors.push(TypeError::MissingRequired { name: name.clone() });
            }
        }

        for (name, value) in attributes {
            match self.attributes.get(name) {
                Some(schema) if schema.computed => {
                    errors.push(TypeError::ComputedAttribute { name: name.clone() });
                }
                Some(schema) => {
                    if let Err(e) = schema.attr_type.validate(value) {
                        errors.push(e);
                    }
                }
                None => errors.push(TypeError::UnknownAttribute { name: name.clone() }),
            }
        }

        for (first, second) in &self.conflicts {
            if attributes.contains_key(first) && attributes.contains_key(second) {
                errors.push(TypeError::Conflicting {
                    first: first.clone(),
                    second: second.clone(),
                });
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Validate lookup attributes of a data source: only known attributes
    pub fn validate_lookup(&self, attributes: &HashMap<String, Value>) -> Result<(), Vec<TypeError>> {
        let errors: Vec<TypeError> = attributes
            .keys()
            .filter(|name| !self.attributes.contains_key(*name))
            .map(|name| TypeError::UnknownAttribute { name: name.clone() })
            .collect();
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

/// Helper functions for common types
pub mod types {
    use super::*;

    /// Positive integer type
    pub fn positive_int() -> AttributeType {
        AttributeType::Custom {
            name: "PositiveInt".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if *n > 0 => Ok(()),
                Value::Int(_) => Err("Value must be positive".to_string()),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// TCP/UDP port (1-65535)
    pub fn port() -> AttributeType {
        AttributeType::Custom {
            name: "Port".to_string(),
            base: Box::new(AttributeType::Int),
            validate: |value| match value {
                Value::Int(n) if (1..=65535).contains(n) => Ok(()),
                Value::Int(n) => Err(format!("Port {} must be between 1 and 65535", n)),
                _ => Err("Expected integer".to_string()),
            },
        }
    }

    /// CIDR block type (e.g., "10.0.0.0/16")
    pub fn cidr() -> AttributeType {
        AttributeType::Custom {
            name: "Cidr".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_cidr(s),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// IPv4 address (e.g., "10.240.0.4")
    pub fn ipv4_address() -> AttributeType {
        AttributeType::Custom {
            name: "Ipv4Address".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_ipv4(s),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    /// Lower-case resource name: letters, digits and hyphens, starting with a letter
    pub fn resource_name() -> AttributeType {
        AttributeType::Custom {
            name: "ResourceName".to_string(),
            base: Box::new(AttributeType::String),
            validate: |value| match value {
                Value::String(s) => validate_resource_name(s),
                _ => Err("Expected string".to_string()),
            },
        }
    }

    pub fn string_list() -> AttributeType {
        AttributeType::List(Box::new(AttributeType::String))
    }

    pub fn enumeration(values: &[&str]) -> AttributeType {
        AttributeType::Enum(values.iter().map(|v| v.to_string()).collect())
    }
}

/// Validate IPv4 dotted-quad format
pub fn validate_ipv4(ip: &str) -> Result<(), String> {
    let octets: Vec<&str> = ip.split('.').collect();
    if octets.len() != 4 {
        return Err(format!("Invalid IP address '{}': expected 4 octets", ip));
    }

    for octet in &octets {
        if octet.parse::<u8>().is_err() {
            return Err(format!(
                "Invalid octet '{}' in IP address: must be 0-255",
                octet
            ));
        }
    }
    Ok(())
}

/// Validate CIDR block format (e.g., "10.0.0.0/16")
pub fn validate_cidr(cidr: &str) -> Result<(), String> {
    let Some((ip, prefix)) = cidr.split_once('/') else {
        return Err(format!(
            "Invalid CIDR format '{}': expected IP/prefix",
            cidr
        ));
    };

    validate_ipv4(ip)?;

    match prefix.parse::<u8>() {
        Ok(p) if p <= 32 => Ok(()),
        Ok(p) => Err(format!("Invalid prefix length '{}': must be 0-32", p)),
        Err(_) => Err(format!(
            "Invalid prefix length '{}': must be a number",
            prefix
        )),
    }
}

/// Validate the VPC naming rule `^([a-z]|[a-z][-a-z0-9]*[a-z0-9])$`, at most 63 chars
pub fn validate_resource_name(name: &str) -> Result<(), String> {
    let invalid = || {
        Err(format!(
            "Invalid name '{}': use lowercase letters, digits and hyphens, starting with a letter",
            name
        ))
    };
    if name.is_empty() || name.len() > 63 {
        return Err(format!("Invalid name '{}': length must be 1-63", name));
    }
    let bytes = name.as_bytes();
    if !bytes[0].is_ascii_lowercase() {
        return invalid();
    }
    if !bytes
        .iter()
        .all(|b| b.is_ascii_lowercase() || b.is_ascii_digit() || *b == b'-')
    {
        return invalid();
    }
    if bytes[bytes.len() - 1] == b'-' {
        return invalid();
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_string_type() {
        let t = AttributeType::String;
        assert!(t.validate(&Value::String("hello".to_string())).is_ok());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn references_pass_any_type() {
        let r = Value::ResourceRef("vpc".to_string(), "id".to_string());
        assert!(AttributeType::Int.validate(&r).is_ok());
        assert!(types::cidr().validate(&r).is_ok());
    }

    #[test]
    fn validate_enum_type() {
        let t = types::enumeration(&["inbound", "outbound"]);
        assert!(t.validate(&Value::String("inbound".to_string())).is_ok());
        assert!(t.validate(&Value::String("sideways".to_string())).is_err());
    }

    #[test]
    fn validate_port() {
        let t = types::port();
        assert!(t.validate(&Value::Int(22)).is_ok());
        assert!(t.validate(&Value::Int(0)).is_err());
        assert!(t.validate(&Value::Int(65536)).is_err());
        assert!(t.validate(&Value::String("22".to_string())).is_err());
    }

    #[test]
    fn validate_resource_schema() {
        let schema = ResourceSchema::new("resource")
            .attribute(AttributeSchema::new("name", AttributeType::String).required())
            .attribute(AttributeSchema::new("count", types::positive_int()))
            .attribute(AttributeSchema::new("enabled", AttributeType::Bool));

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("my-resource".to_string()));
        attrs.insert("count".to_string(), Value::Int(5));
        attrs.insert("enabled".to_string(), Value::Bool(true));

        assert!(schema.validate(&attrs).is_ok());
    }

    #[test]
    fn missing_required_attribute() {
        let schema = ResourceSchema::new("is_vpc")
            .attribute(AttributeSchema::new("name", AttributeType::String).required());

        let result = schema.validate(&HashMap::new());
        assert!(matches!(
            result.unwrap_err().as_slice(),
            [TypeError::MissingRequired { .. }]
        ));
    }

    #[test]
    fn computed_and_unknown_attributes_rejected() {
        let schema = ResourceSchema::new("is_vpc")
            .attribute(AttributeSchema::new("crn", AttributeType::String).computed());

        let mut attrs = HashMap::new();
        attrs.insert("crn".to_string(), Value::String("crn:v1".to_string()));
        attrs.insert("colour".to_string(), Value::String("blue".to_string()));

        let errors = schema.validate(&attrs).unwrap_err();
        assert_eq!(errors.len(), 2);
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::ComputedAttribute { name } if name == "crn"))
        );
        assert!(
            errors
                .iter()
                .any(|e| matches!(e, TypeError::UnknownAttribute { name } if name == "colour"))
        );
    }

    #[test]
    fn conflicting_attributes_rejected() {
        let schema = ResourceSchema::new("is_subnet")
            .attribute(AttributeSchema::new("ipv4_cidr_block", types::cidr()))
            .attribute(AttributeSchema::new(
                "total_ipv4_address_count",
                AttributeType::Int,
            ))
            .conflicting("ipv4_cidr_block", "total_ipv4_address_count");

        let mut attrs = HashMap::new();
        attrs.insert(
            "ipv4_cidr_block".to_string(),
            Value::String("10.240.0.0/24".to_string()),
        );
        attrs.insert("total_ipv4_address_count".to_string(), Value::Int(256));

        assert!(matches!(
            schema.validate(&attrs).unwrap_err().as_slice(),
            [TypeError::Conflicting { .. }]
        ));
    }

    #[test]
    fn apply_defaults_fills_missing() {
        let schema = ResourceSchema::new("is_security_group_rule").attribute(
            AttributeSchema::new("ip_version", AttributeType::String)
                .with_default(Value::String("ipv4".to_string())),
        );
        let mut attrs = HashMap::new();
        schema.apply_defaults(&mut attrs);
        assert_eq!(
            attrs.get("ip_version"),
            Some(&Value::String("ipv4".to_string()))
        );
    }

    #[test]
    fn validate_cidr_type() {
        let t = types::cidr();

        assert!(t.validate(&Value::String("10.0.0.0/16".to_string())).is_ok());
        assert!(t.validate(&Value::String("0.0.0.0/0".to_string())).is_ok());

        assert!(t.validate(&Value::String("10.0.0.0".to_string())).is_err());
        assert!(t.validate(&Value::String("10.0.0.0/33".to_string())).is_err());
        assert!(t.validate(&Value::String("10.0.0.256/16".to_string())).is_err());
        assert!(t.validate(&Value::String("10.0.0/16".to_string())).is_err());
        assert!(t.validate(&Value::Int(42)).is_err());
    }

    #[test]
    fn validate_names() {
        assert!(validate_resource_name("my-vpc-1").is_ok());
        assert!(validate_resource_name("a").is_ok());
        assert!(validate_resource_name("My-vpc").is_err());
        assert!(validate_resource_name("1vpc").is_err());
        assert!(validate_resource_name("vpc-").is_err());
        assert!(validate_resource_name("vpc_1").is_err());
        assert!(validate_resource_name("").is_err());
    }
}
