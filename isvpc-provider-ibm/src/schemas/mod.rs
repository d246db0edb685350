//! Attribute schemas of the IBM VPC resource types

pub mod network;
pub mod security_group;
pub mod subnet;
pub mod vpc;

use isvpc_core::resource::Value;
use isvpc_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

/// Returns the schema of every resource type
pub fn all_schemas() -> Vec<ResourceSchema> {
    vec![
        vpc::vpc_schema(),
        vpc::address_prefix_schema(),
        subnet::subnet_schema(),
        subnet::reserved_ip_schema(),
        subnet::public_gateway_schema(),
        subnet::public_gateway_attachment_schema(),
        security_group::security_group_schema(),
        security_group::rule_schema(),
        security_group::target_schema(),
        network::virtual_network_interface_schema(),
        network::flow_log_schema(),
        network::resource_binding_schema(),
        network::advertised_cidr_schema(),
    ]
}

/// Operations accepted as keys of `timeouts`
const TIMEOUT_OPERATIONS: &[&str] = &["create", "update", "delete"];

/// `timeouts = { create = "20m", delete = "30m" }`
pub fn timeouts_type() -> AttributeType {
    AttributeType::Custom {
        name: "Timeouts".to_string(),
        base: Box::new(AttributeType::Map(Box::new(AttributeType::String))),
        validate: |value| {
            let Value::Map(map) = value else {
                return Err("Expected map".to_string());
            };
            for (operation, duration) in map {
                if !TIMEOUT_OPERATIONS.contains(&operation.as_str()) {
                    return Err(format!(
                        "Unknown timeout '{}', expected one of: {}",
                        operation,
                        TIMEOUT_OPERATIONS.join(", ")
                    ));
                }
                if let Value::String(text) = duration {
                    humantime::parse_duration(text)
                        .map_err(|e| format!("Invalid {} timeout '{}': {}", operation, text, e))?;
                }
            }
            Ok(())
        },
    }
}

/// Non-empty identifier of another object
pub fn object_id() -> AttributeType {
    AttributeType::Custom {
        name: "Id".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if s.trim().is_empty() => Err("Id must not be empty".to_string()),
            Value::String(_) => Ok(()),
            _ => Err("Expected string".to_string()),
        },
    }
}

/// Tag names: `key:value` or bare labels, at most 128 characters
pub fn tag_list() -> AttributeType {
    AttributeType::List(Box::new(AttributeType::Custom {
        name: "Tag".to_string(),
        base: Box::new(AttributeType::String),
        validate: |value| match value {
            Value::String(s) if s.is_empty() || s.len() > 128 => {
                Err(format!("Invalid tag '{}': length must be 1-128", s))
            }
            Value::String(s) if s.chars().any(|c| c == ',' || c.is_control()) => {
                Err(format!("Invalid tag '{}'", s))
            }
            Value::String(_) => Ok(()),
            _ => Err("Expected string".to_string()),
        },
    }))
}

/// `name`, validated against the VPC naming rule
pub fn name_attribute(required: bool) -> AttributeSchema {
    let attr = AttributeSchema::new("name", types::resource_name());
    if required { attr.required() } else { attr }
}

/// `tags` and `access_tags` on taggable types
pub fn with_tags(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(
            AttributeSchema::new("tags", tag_list())
                .removable()
                .with_description("User tags attached through the global tagging API"),
        )
        .attribute(
            AttributeSchema::new("access_tags", tag_list())
                .removable()
                .with_description("Access management tags (`key:value`)"),
        )
}

/// `timeouts`, `resource_group` and the computed `id`/`crn` pair
pub fn with_common(schema: ResourceSchema) -> ResourceSchema {
    schema
        .attribute(AttributeSchema::new("timeouts", timeouts_type()))
        .attribute(AttributeSchema::new("resource_group", object_id()).force_new())
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("crn", AttributeType::String).computed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn every_type_has_a_unique_schema() {
        let schemas = all_schemas();
        let mut names: Vec<&str> = schemas.iter().map(|s| s.resource_type.as_str()).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 13);
        assert!(schemas.iter().all(|s| s.attributes.contains_key("id")));
    }

    #[test]
    fn timeouts_validation() {
        let t = timeouts_type();
        let mut ok = HashMap::new();
        ok.insert("create".to_string(), Value::String("20m".to_string()));
        assert!(t.validate(&Value::Map(ok)).is_ok());

        let mut unknown = HashMap::new();
        unknown.insert("read".to_string(), Value::String("1m".to_string()));
        assert!(t.validate(&Value::Map(unknown)).is_err());

        let mut bad = HashMap::new();
        bad.insert("delete".to_string(), Value::String("soon".to_string()));
        assert!(t.validate(&Value::Map(bad)).is_err());
    }

    #[test]
    fn tags_reject_commas() {
        let t = tag_list();
        assert!(
            t.validate(&Value::List(vec![Value::String("env:prod".into())]))
                .is_ok()
        );
        assert!(
            t.validate(&Value::List(vec![Value::String("a,b".into())]))
                .is_err()
        );
    }
}
