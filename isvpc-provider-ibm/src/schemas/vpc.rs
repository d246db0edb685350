//! `is_vpc` and `is_vpc_address_prefix`

use isvpc_core::resource::Value;
use isvpc_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{name_attribute, object_id, with_common, with_tags};

pub fn vpc_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_vpc")
        .with_description("A virtual private cloud")
        .attribute(name_attribute(true))
        .attribute(
            AttributeSchema::new(
                "address_prefix_management",
                types::enumeration(&["auto", "manual"]),
            )
            .with_default(Value::String("auto".to_string()))
            .force_new()
            .with_description("`auto` creates a default address prefix in every zone"),
        )
        .attribute(
            AttributeSchema::new("classic_access", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .force_new(),
        )
        .attribute(AttributeSchema::new("status", AttributeType::String).computed())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(AttributeSchema::new("default_network_acl", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("default_security_group", AttributeType::String).computed(),
        )
        .attribute(
            AttributeSchema::new("default_routing_table", AttributeType::String).computed(),
        );
    with_tags(with_common(schema))
}

pub fn address_prefix_schema() -> ResourceSchema {
    ResourceSchema::new("is_vpc_address_prefix")
        .with_description("An address prefix of a VPC with manual prefix management")
        .attribute(name_attribute(true))
        .attribute(AttributeSchema::new("vpc", object_id()).required().force_new())
        .attribute(
            AttributeSchema::new("zone", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("cidr", types::cidr()).required().force_new())
        .attribute(
            AttributeSchema::new("is_default", AttributeType::Bool)
                .with_default(Value::Bool(false))
                .with_description("Default prefix for subnets created in this zone"),
        )
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("address_prefix", AttributeType::String).computed())
        .attribute(AttributeSchema::new("has_subnets", AttributeType::Bool).computed())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
}
