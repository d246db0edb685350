//! Virtual network interfaces, flow logs, endpoint gateway bindings, and VPN
//! advertised CIDRs

use isvpc_core::resource::Value;
use isvpc_core::schema::{AttributeSchema, AttributeType, ResourceSchema, types};

use super::{name_attribute, object_id, timeouts_type, with_common, with_tags};

pub fn virtual_network_interface_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_virtual_network_interface")
        .with_description("A virtual network interface")
        .attribute(name_attribute(false))
        .attribute(AttributeSchema::new("subnet", object_id()).required().force_new())
        .attribute(AttributeSchema::new("primary_ip_id", object_id()).force_new())
        .attribute(
            AttributeSchema::new("primary_ip_address", types::ipv4_address()).force_new(),
        )
        .attribute(
            AttributeSchema::new("security_groups", types::string_list())
                .with_description("Security group ids; the VPC default group when empty"),
        )
        .attribute(AttributeSchema::new("allow_ip_spoofing", AttributeType::Bool))
        .attribute(AttributeSchema::new("auto_delete", AttributeType::Bool))
        .attribute(AttributeSchema::new("enable_infrastructure_nat", AttributeType::Bool))
        .attribute(AttributeSchema::new(
            "protocol_state_filtering_mode",
            types::enumeration(&["auto", "enabled", "disabled"]),
        ))
        .attribute(AttributeSchema::new("lifecycle_state", AttributeType::String).computed())
        .attribute(AttributeSchema::new("vpc", AttributeType::String).computed())
        .attribute(AttributeSchema::new("zone", AttributeType::String).computed())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new(
                "primary_ip",
                AttributeType::Map(Box::new(AttributeType::String)),
            )
            .computed(),
        )
        .attribute(
            AttributeSchema::new("target", AttributeType::Map(Box::new(AttributeType::String)))
                .computed(),
        )
        .conflicting("primary_ip_id", "primary_ip_address");
    with_tags(with_common(schema))
}

pub fn flow_log_schema() -> ResourceSchema {
    let schema = ResourceSchema::new("is_flow_log")
        .with_description("A flow log collector writing to a Cloud Object Storage bucket")
        .attribute(name_attribute(true))
        .attribute(
            AttributeSchema::new("target", object_id())
                .required()
                .force_new()
                .with_description("VPC, subnet, instance, or network interface id"),
        )
        .attribute(
            AttributeSchema::new("storage_bucket", AttributeType::String)
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("active", AttributeType::Bool)
                .with_default(Value::Bool(true)),
        )
        .attribute(AttributeSchema::new("auto_delete", AttributeType::Bool).computed())
        .attribute(AttributeSchema::new("lifecycle_state", AttributeType::String).computed())
        .attribute(
            AttributeSchema::new("target_resource_type", AttributeType::String).computed(),
        )
        .attribute(AttributeSchema::new("vpc", AttributeType::String).computed())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed());
    with_tags(with_common(schema))
}

pub fn resource_binding_schema() -> ResourceSchema {
    ResourceSchema::new("is_virtual_endpoint_gateway_resource_binding")
        .with_description("A service resource bound to an endpoint gateway")
        .attribute(
            AttributeSchema::new("endpoint_gateway", object_id())
                .required()
                .force_new(),
        )
        .attribute(
            AttributeSchema::new("target", AttributeType::String)
                .required()
                .force_new()
                .with_description("CRN of the bound service resource"),
        )
        .attribute(name_attribute(false))
        .attribute(AttributeSchema::new("timeouts", timeouts_type()))
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("binding_id", AttributeType::String).computed())
        .attribute(AttributeSchema::new("lifecycle_state", AttributeType::String).computed())
        .attribute(AttributeSchema::new("service_endpoint", AttributeType::String).computed())
        .attribute(AttributeSchema::new("type", AttributeType::String).computed())
        .attribute(AttributeSchema::new("created_at", AttributeType::String).computed())
        .attribute(AttributeSchema::new("href", AttributeType::String).computed())
}

pub fn advertised_cidr_schema() -> ResourceSchema {
    ResourceSchema::new("is_vpn_gateway_advertised_cidr")
        .with_description("A CIDR advertised by a VPN gateway")
        .attribute(
            AttributeSchema::new("vpn_gateway", object_id())
                .required()
                .force_new(),
        )
        .attribute(AttributeSchema::new("cidr", types::cidr()).required().force_new())
        .attribute(AttributeSchema::new("timeouts", timeouts_type()))
        .attribute(AttributeSchema::new("id", AttributeType::String).computed())
}
