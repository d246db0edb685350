//! Resource type definitions and CRUD handlers
//!
//! Each submodule adds `create_*`, `read_*`, `update_*` and `delete_*`
//! methods to [`IbmProvider`](crate::IbmProvider) for one area of the API.

pub mod address_prefix;
pub mod endpoint_gateway;
pub mod flow_log;
pub mod public_gateway;
pub mod reserved_ip;
pub mod security_group;
pub mod security_group_rule;
pub mod security_group_target;
pub mod subnet;
pub mod virtual_network_interface;
pub mod vpc;
pub mod vpn_gateway;

use isvpc_core::provider::{ProviderError, ProviderResult, ResourceType};
use isvpc_core::schema::ResourceSchema;

use crate::schemas;

macro_rules! define_resource_type {
    ($name:ident, $type_name:expr, $schema:path) => {
        define_resource_type!($name, $type_name, $schema, false);
    };
    ($name:ident, $type_name:expr, $schema:path, $data_source:expr) => {
        pub struct $name;
        impl ResourceType for $name {
            fn name(&self) -> &'static str {
                $type_name
            }
            fn schema(&self) -> ResourceSchema {
                $schema()
            }
            fn supports_data_source(&self) -> bool {
                $data_source
            }
        }
    };
}

define_resource_type!(VpcType, "is_vpc", schemas::vpc::vpc_schema, true);
define_resource_type!(
    AddressPrefixType,
    "is_vpc_address_prefix",
    schemas::vpc::address_prefix_schema
);
define_resource_type!(SubnetType, "is_subnet", schemas::subnet::subnet_schema, true);
define_resource_type!(
    ReservedIpType,
    "is_subnet_reserved_ip",
    schemas::subnet::reserved_ip_schema
);
define_resource_type!(
    PublicGatewayType,
    "is_public_gateway",
    schemas::subnet::public_gateway_schema,
    true
);
define_resource_type!(
    PublicGatewayAttachmentType,
    "is_subnet_public_gateway_attachment",
    schemas::subnet::public_gateway_attachment_schema
);
define_resource_type!(
    SecurityGroupType,
    "is_security_group",
    schemas::security_group::security_group_schema,
    true
);
define_resource_type!(
    SecurityGroupRuleType,
    "is_security_group_rule",
    schemas::security_group::rule_schema
);
define_resource_type!(
    SecurityGroupTargetType,
    "is_security_group_target",
    schemas::security_group::target_schema
);
define_resource_type!(
    VirtualNetworkInterfaceType,
    "is_virtual_network_interface",
    schemas::network::virtual_network_interface_schema
);
define_resource_type!(FlowLogType, "is_flow_log", schemas::network::flow_log_schema);
define_resource_type!(
    ResourceBindingType,
    "is_virtual_endpoint_gateway_resource_binding",
    schemas::network::resource_binding_schema
);
define_resource_type!(
    AdvertisedCidrType,
    "is_vpn_gateway_advertised_cidr",
    schemas::network::advertised_cidr_schema
);

/// Returns all resource types supported by this provider
pub fn resource_types() -> Vec<Box<dyn ResourceType>> {
    vec![
        Box::new(VpcType),
        Box::new(AddressPrefixType),
        Box::new(SubnetType),
        Box::new(ReservedIpType),
        Box::new(PublicGatewayType),
        Box::new(PublicGatewayAttachmentType),
        Box::new(SecurityGroupType),
        Box::new(SecurityGroupRuleType),
        Box::new(SecurityGroupTargetType),
        Box::new(VirtualNetworkInterfaceType),
        Box::new(FlowLogType),
        Box::new(ResourceBindingType),
        Box::new(AdvertisedCidrType),
    ]
}

/// Label errors with where they happened
pub(crate) trait Labeled<T> {
    fn at(self, resource_type: &str, operation: &str, step: &str) -> ProviderResult<T>;
}

impl<T, E: Into<ProviderError>> Labeled<T> for Result<T, E> {
    fn at(self, resource_type: &str, operation: &str, step: &str) -> ProviderResult<T> {
        self.map_err(|e| e.into().at_step(resource_type, operation, step))
    }
}

/// Treat a 404 as success
pub(crate) fn ignore_not_found<E: Into<ProviderError>>(result: Result<(), E>) -> ProviderResult<()> {
    match result.map_err(Into::into) {
        Err(e) if e.is_not_found() => Ok(()),
        other => other,
    }
}
