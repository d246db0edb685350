//! Flatteners: API models to state attribute maps
//!
//! Every flattener emits an `id` attribute holding the identifier stored in
//! state, which for child types is the composite `<parent>/<child>` (or
//! `<sg>.<rule>`) form.

use std::collections::HashMap;

use isvpc_core::composite_id::{make_slash_id, make_terraform_id};
use isvpc_core::resource::Value;

use crate::models::address_prefix::AddressPrefix;
use crate::models::endpoint_gateway::ResourceBinding;
use crate::models::flow_log::FlowLogCollector;
use crate::models::public_gateway::PublicGateway;
use crate::models::reserved_ip::ReservedIp;
use crate::models::security_group::{SecurityGroup, SecurityGroupRule, SecurityGroupRuleProtocol};
use crate::models::subnet::Subnet;
use crate::models::virtual_network_interface::VirtualNetworkInterface;
use crate::models::vpc::Vpc;
use crate::models::{Reference, ReservedIpReference, TargetReference};

/// Attribute map under construction
#[derive(Debug, Default)]
pub struct Attrs(HashMap<String, Value>);

impl Attrs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Set `key` only when `value` is present
    pub fn set_opt<V: Into<Value>>(self, key: &str, value: Option<V>) -> Self {
        match value {
            Some(v) => self.set(key, v),
            None => self,
        }
    }

    pub fn set_list(self, key: &str, items: impl IntoIterator<Item = String>) -> Self {
        let list = Value::List(items.into_iter().map(Value::String).collect());
        self.set(key, list)
    }

    pub fn build(self) -> HashMap<String, Value> {
        self.0
    }
}

/// `{id, name, crn, href, more_info}` of a reference, skipping absent fields
pub fn reference_map(r: &Reference) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", r.id.as_str())
        .set_opt("name", r.name.clone())
        .set_opt("crn", r.crn.clone())
        .set_opt("href", r.href.clone())
        .set_opt("more_info", r.deleted.as_ref().map(|d| d.more_info.clone()))
        .build()
}

/// Flat map of one union variant, with its `resource_type` discriminator
pub fn target_map(resource_type: &str, r: &TargetReference) -> HashMap<String, Value> {
    Attrs::new()
        .set("resource_type", resource_type)
        .set("id", r.id.as_str())
        .set_opt("name", r.name.clone())
        .set_opt("crn", r.crn.clone())
        .set_opt("href", r.href.clone())
        .set_opt("more_info", r.deleted.as_ref().map(|d| d.more_info.clone()))
        .build()
}

pub fn reserved_ip_map(ip: &ReservedIpReference) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", ip.id.as_str())
        .set("address", ip.address.as_str())
        .set_opt("name", ip.name.clone())
        .set_opt("more_info", ip.deleted.as_ref().map(|d| d.more_info.clone()))
        .build()
}

fn id_of(r: &Option<Reference>) -> Option<String> {
    r.as_ref().map(|r| r.id.clone())
}

pub fn flatten_vpc(vpc: &Vpc) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", vpc.id.as_str())
        .set("name", vpc.name.as_str())
        .set("crn", vpc.crn.as_str())
        .set("status", vpc.status.as_str())
        .set("classic_access", vpc.classic_access)
        .set_opt("created_at", vpc.created_at.clone())
        .set_opt("default_network_acl", id_of(&vpc.default_network_acl))
        .set_opt("default_security_group", id_of(&vpc.default_security_group))
        .set_opt("default_routing_table", id_of(&vpc.default_routing_table))
        .set_opt("resource_group", id_of(&vpc.resource_group))
        .build()
}

pub fn flatten_subnet(subnet: &Subnet) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", subnet.id.as_str())
        .set("name", subnet.name.as_str())
        .set("crn", subnet.crn.as_str())
        .set("status", subnet.status.as_str())
        .set("vpc", subnet.vpc.id.as_str())
        .set("zone", subnet.zone.name.as_str())
        .set("ipv4_cidr_block", subnet.ipv4_cidr_block.as_str())
        .set_opt("ip_version", subnet.ip_version.clone())
        .set("total_ipv4_address_count", subnet.total_ipv4_address_count)
        .set(
            "available_ipv4_address_count",
            subnet.available_ipv4_address_count,
        )
        .set_opt("network_acl", id_of(&subnet.network_acl))
        .set_opt("public_gateway", id_of(&subnet.public_gateway))
        .set_opt("routing_table", id_of(&subnet.routing_table))
        .set_opt("resource_group", id_of(&subnet.resource_group))
        .build()
}

pub fn flatten_public_gateway(gateway: &PublicGateway) -> HashMap<String, Value> {
    let floating_ip = gateway.floating_ip.as_ref();
    Attrs::new()
        .set("id", gateway.id.as_str())
        .set("name", gateway.name.as_str())
        .set("crn", gateway.crn.as_str())
        .set("status", gateway.status.as_str())
        .set("vpc", gateway.vpc.id.as_str())
        .set("zone", gateway.zone.name.as_str())
        .set_opt("floating_ip_id", floating_ip.map(|f| f.id.clone()))
        .set_opt("floating_ip_address", floating_ip.map(|f| f.address.clone()))
        .set_opt("resource_group", id_of(&gateway.resource_group))
        .build()
}

/// Gateway attached to `subnet`, keyed by the subnet
pub fn flatten_public_gateway_attachment(
    subnet: &str,
    gateway: &PublicGateway,
) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", subnet)
        .set("subnet", subnet)
        .set("public_gateway", gateway.id.as_str())
        .set("name", gateway.name.as_str())
        .set("crn", gateway.crn.as_str())
        .set("status", gateway.status.as_str())
        .set("vpc", gateway.vpc.id.as_str())
        .set("zone", gateway.zone.name.as_str())
        .set_opt(
            "floating_ip_address",
            gateway.floating_ip.as_ref().map(|f| f.address.clone()),
        )
        .build()
}

pub fn flatten_security_group(sg: &SecurityGroup) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", sg.id.as_str())
        .set("name", sg.name.as_str())
        .set("crn", sg.crn.as_str())
        .set("vpc", sg.vpc.id.as_str())
        .set_opt("resource_group", id_of(&sg.resource_group))
        .set_opt("created_at", sg.created_at.clone())
        .build()
}

pub fn flatten_security_group_rule(group: &str, rule: &SecurityGroupRule) -> HashMap<String, Value> {
    let mut attrs = Attrs::new()
        .set("id", make_terraform_id(group, &rule.id))
        .set("group", group)
        .set("rule_id", rule.id.as_str())
        .set("direction", rule.direction.as_str())
        .set_opt("ip_version", rule.ip_version.clone())
        .set("protocol", rule.protocol.name())
        .set_opt("remote", rule.remote.as_ref().map(|r| r.as_config().to_string()))
        .set_opt("local", rule.local.as_ref().map(|l| l.as_config().to_string()));

    attrs = match &rule.protocol {
        SecurityGroupRuleProtocol::Icmp { icmp_type, code } => {
            attrs.set_opt("type", *icmp_type).set_opt("code", *code)
        }
        SecurityGroupRuleProtocol::Tcp { port_min, port_max }
        | SecurityGroupRuleProtocol::Udp { port_min, port_max } => attrs
            .set_opt("port_min", *port_min)
            .set_opt("port_max", *port_max),
        _ => attrs,
    };
    attrs.build()
}

/// Binding of `group` to a target, as listed under the group's targets
pub fn flatten_security_group_target(
    group: &str,
    resource_type: &str,
    target: &TargetReference,
) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", make_slash_id(group, &target.id))
        .set("security_group", group)
        .set("target", target.id.as_str())
        .set("resource_type", resource_type)
        .set_opt("name", target.name.clone())
        .set_opt("crn", target.crn.clone())
        .set_opt(
            "more_info",
            target.deleted.as_ref().map(|d| d.more_info.clone()),
        )
        .build()
}

pub fn flatten_flow_log(collector: &FlowLogCollector) -> HashMap<String, Value> {
    let attrs = Attrs::new()
        .set("id", collector.id.as_str())
        .set("name", collector.name.as_str())
        .set("crn", collector.crn.as_str())
        .set("active", collector.active)
        .set("auto_delete", collector.auto_delete)
        .set("lifecycle_state", collector.lifecycle_state.as_str())
        .set("storage_bucket", collector.storage_bucket.name.as_str())
        .set("target_resource_type", collector.target.resource_type())
        .set_opt("vpc", id_of(&collector.vpc))
        .set_opt("resource_group", id_of(&collector.resource_group))
        .set_opt("created_at", collector.created_at.clone());
    attrs
        .set_opt(
            "target",
            collector.target.reference().map(|r| r.id.clone()),
        )
        .build()
}

pub fn flatten_reserved_ip(subnet: &str, rip: &ReservedIp) -> HashMap<String, Value> {
    let target = rip.target.as_ref();
    Attrs::new()
        .set("id", make_slash_id(subnet, &rip.id))
        .set("subnet", subnet)
        .set("reserved_ip", rip.id.as_str())
        .set("name", rip.name.as_str())
        .set("address", rip.address.as_str())
        .set("auto_delete", rip.auto_delete)
        .set_opt("owner", rip.owner.clone())
        .set_opt("lifecycle_state", rip.lifecycle_state.clone())
        .set_opt("created_at", rip.created_at.clone())
        .set_opt(
            "target",
            target.and_then(|t| t.reference()).map(|r| r.id.clone()),
        )
        .set_opt(
            "target_reference",
            target
                .and_then(|t| t.reference().map(|r| target_map(t.resource_type(), r)))
                .map(Value::Map),
        )
        .build()
}

pub fn flatten_virtual_network_interface(vni: &VirtualNetworkInterface) -> HashMap<String, Value> {
    let primary_ip = vni.primary_ip.as_ref();
    let target = vni.target.as_ref();
    Attrs::new()
        .set("id", vni.id.as_str())
        .set("name", vni.name.as_str())
        .set("crn", vni.crn.as_str())
        .set("lifecycle_state", vni.lifecycle_state.as_str())
        .set("allow_ip_spoofing", vni.allow_ip_spoofing)
        .set("auto_delete", vni.auto_delete)
        .set("enable_infrastructure_nat", vni.enable_infrastructure_nat)
        .set_opt(
            "protocol_state_filtering_mode",
            vni.protocol_state_filtering_mode.clone(),
        )
        .set_opt("subnet", id_of(&vni.subnet))
        .set_opt("vpc", id_of(&vni.vpc))
        .set_opt("zone", vni.zone.as_ref().map(|z| z.name.clone()))
        .set_opt("primary_ip", primary_ip.map(reserved_ip_map).map(Value::Map))
        .set_opt("primary_ip_id", primary_ip.map(|ip| ip.id.clone()))
        .set_opt("primary_ip_address", primary_ip.map(|ip| ip.address.clone()))
        .set_list(
            "security_groups",
            vni.security_groups.iter().map(|sg| sg.id.clone()),
        )
        .set_opt("resource_group", id_of(&vni.resource_group))
        .set_opt(
            "target",
            target
                .and_then(|t| t.reference().map(|r| target_map(t.resource_type(), r)))
                .map(Value::Map),
        )
        .set_opt("created_at", vni.created_at.clone())
        .build()
}

pub fn flatten_resource_binding(gateway: &str, binding: &ResourceBinding) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", make_slash_id(gateway, &binding.id))
        .set("endpoint_gateway", gateway)
        .set("binding_id", binding.id.as_str())
        .set("name", binding.name.as_str())
        .set("target", binding.target.crn.as_str())
        .set("lifecycle_state", binding.lifecycle_state.as_str())
        .set_opt("service_endpoint", binding.service_endpoint.clone())
        .set_opt("type", binding.binding_type.clone())
        .set_opt("created_at", binding.created_at.clone())
        .set_opt("href", binding.href.clone())
        .build()
}

pub fn flatten_advertised_cidr(gateway: &str, cidr: &str) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", make_slash_id(gateway, cidr))
        .set("vpn_gateway", gateway)
        .set("cidr", cidr)
        .build()
}

pub fn flatten_address_prefix(vpc: &str, prefix: &AddressPrefix) -> HashMap<String, Value> {
    Attrs::new()
        .set("id", make_slash_id(vpc, &prefix.id))
        .set("vpc", vpc)
        .set("address_prefix", prefix.id.as_str())
        .set("name", prefix.name.as_str())
        .set("cidr", prefix.cidr.as_str())
        .set("zone", prefix.zone.name.as_str())
        .set("is_default", prefix.is_default)
        .set("has_subnets", prefix.has_subnets)
        .set_opt("created_at", prefix.created_at.clone())
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::reserved_ip::ReservedIpTarget;
    use serde_json::json;

    fn s(v: &str) -> Value {
        Value::String(v.to_string())
    }

    #[test]
    fn reference_map_carries_deleted_info() {
        let r: Reference = serde_json::from_value(json!({
            "id": "r006-acl",
            "name": "old-acl",
            "deleted": {"more_info": "https://cloud.ibm.com/apidocs/vpc#deleted-resources"}
        }))
        .unwrap();
        let map = reference_map(&r);
        assert_eq!(map.get("id"), Some(&s("r006-acl")));
        assert_eq!(map.get("name"), Some(&s("old-acl")));
        assert_eq!(
            map.get("more_info"),
            Some(&s("https://cloud.ibm.com/apidocs/vpc#deleted-resources"))
        );
        assert!(!map.contains_key("crn"));
    }

    #[test]
    fn vpc_defaults_flatten_to_ids() {
        let vpc: Vpc = serde_json::from_value(json!({
            "id": "r006-vpc",
            "name": "prod",
            "crn": "crn:vpc",
            "status": "available",
            "classic_access": false,
            "default_network_acl": {"id": "r006-acl", "name": "acl"},
            "default_security_group": {"id": "r006-sg"},
            "default_routing_table": {"id": "r006-rt"}
        }))
        .unwrap();
        let attrs = flatten_vpc(&vpc);
        assert_eq!(attrs.get("id"), Some(&s("r006-vpc")));
        assert_eq!(attrs.get("classic_access"), Some(&Value::Bool(false)));
        assert_eq!(attrs.get("default_network_acl"), Some(&s("r006-acl")));
        assert_eq!(attrs.get("default_security_group"), Some(&s("r006-sg")));
        assert_eq!(attrs.get("default_routing_table"), Some(&s("r006-rt")));
        assert!(!attrs.contains_key("resource_group"));
    }

    #[test]
    fn rule_flattens_protocol_fields() {
        let rule: SecurityGroupRule = serde_json::from_value(json!({
            "id": "r006-rule",
            "direction": "inbound",
            "ip_version": "ipv4",
            "protocol": "udp",
            "port_min": 53,
            "port_max": 53,
            "remote": {"address": "10.0.0.2"}
        }))
        .unwrap();
        let attrs = flatten_security_group_rule("r006-sg", &rule);
        assert_eq!(attrs.get("id"), Some(&s("r006-sg.r006-rule")));
        assert_eq!(attrs.get("protocol"), Some(&s("udp")));
        assert_eq!(attrs.get("port_min"), Some(&Value::Int(53)));
        assert_eq!(attrs.get("remote"), Some(&s("10.0.0.2")));
        assert!(!attrs.contains_key("type"));
        assert!(!attrs.contains_key("local"));
    }

    #[test]
    fn reserved_ip_flattens_target_union() {
        let rip = ReservedIp {
            id: "0717-rip".to_string(),
            name: "vpe-ip".to_string(),
            address: "10.240.0.9".to_string(),
            auto_delete: true,
            owner: Some("user".to_string()),
            lifecycle_state: Some("stable".to_string()),
            created_at: None,
            target: Some(ReservedIpTarget::EndpointGateway(TargetReference {
                id: "r006-eg".to_string(),
                name: Some("cos".to_string()),
                ..Default::default()
            })),
        };
        let attrs = flatten_reserved_ip("0717-subnet", &rip);
        assert_eq!(attrs.get("id"), Some(&s("0717-subnet/0717-rip")));
        assert_eq!(attrs.get("target"), Some(&s("r006-eg")));

        let Some(Value::Map(target)) = attrs.get("target_reference") else {
            panic!("target_reference missing");
        };
        assert_eq!(target.get("resource_type"), Some(&s("endpoint_gateway")));
        assert_eq!(target.get("name"), Some(&s("cos")));
    }

    #[test]
    fn unknown_target_is_left_out() {
        let rip = ReservedIp {
            id: "0717-rip".to_string(),
            name: "ip".to_string(),
            address: "10.240.0.9".to_string(),
            auto_delete: false,
            owner: None,
            lifecycle_state: None,
            created_at: None,
            target: Some(ReservedIpTarget::Unknown),
        };
        let attrs = flatten_reserved_ip("0717-subnet", &rip);
        assert!(!attrs.contains_key("target"));
        assert!(!attrs.contains_key("target_reference"));
    }

    #[test]
    fn advertised_cidr_keeps_slash_in_child() {
        let attrs = flatten_advertised_cidr("r006-vpngw", "10.45.0.0/24");
        assert_eq!(attrs.get("id"), Some(&s("r006-vpngw/10.45.0.0/24")));
        assert_eq!(attrs.get("cidr"), Some(&s("10.45.0.0/24")));
    }
}
