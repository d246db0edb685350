//! Subnets, their reserved IPs, and public gateways

use isvpc_core::resource::Value;
use isvpc_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{name_attribute, object_id, with_common, with_tags};

pub fn subnet_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_subnet")
        .with_description("A subnet in one zone of a VPC")
        .attribute(name_attribute(true))
        .attribute(AttributeSchema::new("vpc", object_id()).required().force_new())
        .attribute(
            AttributeSchema::new("zone", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("ipv4_cidr_block", types::cidr()).force_new())
        .attribute(
            AttributeSchema::new("total_ipv4_address_count", types::positive_int())
                .force_new()
                .with_description("Size of the subnet when no CIDR block is given"),
        )
        .attribute(
            AttributeSchema::new("ip_version", types::enumeration(&["ipv4"]))
                .with_default(Value::String("ipv4".to_string()))
                .force_new(),
        )
        .attribute(AttributeSchema::new("network_acl", object_id()))
        .attribute(AttributeSchema::new("public_gateway", object_id()).removable())
        .attribute(AttributeSchema::new("routing_table", object_id()))
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("available_ipv4_address_count", AttributeType::Int).computed(),
        )
        .conflicting("ipv4_cidr_block", "total_ipv4_address_count");
    with_tags(with_common(schema))
}

pub fn reserved_ip_schema() -> ResourceSchema {
    ResourceSchema::new("is_subnet_reserved_ip")
        .with_description("A reserved IP address in a subnet")
        .attribute(AttributeSchema::new("subnet", object_id()).required().force_new())
        .attribute(name_attribute(false))
        .attribute(AttributeSchema::new("address", types::ipv4_address()).force_new())
        .attribute(
            AttributeSchema::new("auto_delete", AttributeType::Bool)
                .with_description("Delete the reserved IP when its target is deleted"),
        )
        .attribute(
            AttributeSchema::new("target", object_id())
                .with_description("Endpoint gateway or virtual network interface to bind to"),
        )
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("reserved_ip", AttributeType::String).computed())
        .attribute(AttributeSchema::new("owner", AttributeType::String).computed())
        .attribute(AttributeSchema::new("lifecycle_state", AttributeType::String).computed())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(
                "target_reference",
                AttributeType::Map(Box::new(AttributeType::String)),
            )
            .computed(),
        )
}

pub fn public_gateway_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_public_gateway")
        .with_description("A public gateway for outbound traffic of a zone's subnets")
        .attribute(name_attribute(false))
        .attribute(AttributeSchema::new("vpc", object_id()).required().force_new())
        .attribute(
            AttributeSchema::new("zone", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("floating_ip_id", object_id()).force_new())
        .attribute(AttributeSchema::new("floating_ip_address", types::ipv4_address()).force_new())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .conflicting("floating_ip_id", "floating_ip_address");
    with_tags(with_common(schema))
}

pub fn public_gateway_attachment_schema() -> ResourceSchema {
    ResourceSchema::new("is_subnet_public_gateway_attachment")
        .with_description("Attachment of a public gateway to a subnet")
        .attribute(AttributeSchema::new("subnet", object_id()).required().force_new())
        .attribute(AttributeSchema::new("public_gateway", object_id()).required())
        .attribute(AttributeSchema::new("timeouts", super::timeouts_type()))
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("name", AttributeType::String).computed())
        .attribute(AttributeSchema::new("crn", AttributeType::String).computed())
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("vpc", AttributeType::String).computed())
        .attribute(AttributeSchema::new("zone", AttributeType::String).computed())
        .attribute(AttributeSchema::new("floating_ip_address", AttributeType::String).computed())
}
