//! Security groups, rules, and targets

use isvpc_core::resource::Value;
use isvpc_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{name_attribute, object_id, with_common, with_tags};

pub const PROTOCOLS: &[&str] = &["all", "any", "icmp_tcp_udp", "icmp", "tcp", "udp"];

pub fn security_group_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_security_group")
        .with_description("A security group of a VPC")
        .attribute(name_attribute(false))
        .attribute(AttributeSchema::new("vpc", object_id()).required().force_new())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed());
    with_tags(with_common(schema))
}

/// ICMP type (0-254)
fn icmp_type() -> AttributeType {
    AttributeType::Custom {
        name: "IcmpType".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| match value {
            Value::Int(n) if (0..=254).contains(n) => Ok(()),
            Value::Int(n) => Err(format!("ICMP type {} must be between 0 and 254", n)),
            _ => Err("Expected integer".to_string()),
        },
    }
}

/// ICMP code (0-255)
fn icmp_code() -> AttributeType {
    AttributeType::Custom {
        name: "IcmpCode".to_string(),
        base: Box::new(AttributeType::Int),
        validate: |value| match value {
            Value::Int(n) if (0..=255).contains(n) => Ok(()),
            Value::Int(n) => Err(format!("ICMP code {} must be between 0 and 255", n)),
            _ => Err("Expected integer".to_string()),
        },
    }
}

pub fn rule_schema() -> ResourceSchema {
    ResourceSchema::new("is_security_group_rule")
        .with_description("One rule of a security group")
        .attribute(AttributeSchema::new("group", object_id()).required().force_new())
        .attribute(
            AttributeSchema::new("direction", types::enumeration(&["inbound", "outbound"]))
                .required(),
        )
        .attribute(
            AttributeSchema::new("ip_version", types::enumeration(&["ipv4"]))
                .with_default(Value::String("ipv4".to_string())),
        )
        .attribute(
            AttributeSchema::new("protocol", types::enumeration(PROTOCOLS))
                .with_default(Value::String("icmp_tcp_udp".to_string()))
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("remote", AttributeType::String)
                .with_description("IP address, CIDR block, or security group id"),
        )
        .attribute(
            AttributeSchema::new("local", AttributeType::String)
                .with_description("IP address or CIDR block on the local side"),
        )
        .attribute(AttributeSchema::new("type", icmp_type()))
        .attribute(AttributeSchema::new("code", icmp_code()))
        .attribute(AttributeSchema::new("port_min", types::port()))
        .attribute(AttributeSchema::new("port_max", types::port()))
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("rule_id", AttributeType::String).computed())
}

pub fn target_schema() -> ResourceSchema {
    ResourceSchema::new("is_security_group_target")
        .with_description("Binding of a security group to a network interface, load balancer, endpoint gateway, VPN server, or virtual network interface")
        .attribute(
            AttributeSchema::new("security_group", object_id())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("target", object_id()).required().force_new())
        .attribute(AttributeSchema::new("timeouts", super::timeouts_type()))
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("crn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("resource_type", AttributeType::String).computed())
        .attribute(AttributeSchema::new("more_info", AttributeType::String).computed())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn rule(extra: &[(&str, Value)]) -> HashMap<String, Value> {
        let mut a: HashMap<String, Value> = HashMap::new();
        a.insert("group".into(), Value::String("r006-sg".into()));
        a.insert("direction".into(), Value::String("inbound".into()));
        for (k, v) in extra {
            a.insert(k.to_string(), v.clone());
        }
        a
    }

    #[test]
    fn rule_defaults() {
        let schema = rule_schema();
        let mut a = rule(&[]);
        assert!(schema.validate(&a).is_ok());
        schema.apply_defaults(&mut a);
        assert_eq!(a.get("protocol"), Some(&Value::String("icmp_tcp_udp".into())));
        assert_eq!(a.get("ip_version"), Some(&Value::String("ipv4".into())));
    }

    #[test]
    fn rule_ranges() {
        let schema = rule_schema();
        assert!(
            schema
                .validate(&rule(&[
                    ("protocol", Value::String("tcp".into())),
                    ("port_min", Value::Int(0)),
                ]))
                .is_err()
        );
        assert!(
            schema
                .validate(&rule(&[
                    ("protocol", Value::String("icmp".into())),
                    ("type", Value::Int(8)),
                    ("code", Value::Int(0)),
                ]))
                .is_ok()
        );
        assert!(
            schema
                .validate(&rule(&[("type", Value::Int(255))]))
                .is_err()
        );
        assert!(
            schema
                .validate(&rule(&[("direction", Value::String("both".into()))]))
                .is_err()
        );
    }

    #[test]
    fn target_needs_both_sides() {
        let schema = target_schema();
        let mut a: HashMap<String, Value> = HashMap::new();
        a.insert("security_group".into(), Value::String("r006-sg".into()));
        assert!(schema.validate(&a).is_err());
        a.insert("target".into(), Value::String("r006-lb".into()));
        assert!(schema.validate(&a).is_ok());
    }
}
