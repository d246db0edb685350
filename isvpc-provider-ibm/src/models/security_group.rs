use serde::{Deserialize, Serialize};

use super::{Identity, Reference, reference_union};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityGroup {
    pub id: String,
    pub name: String,
    pub crn: String,
    pub vpc: Reference,
    #[serde(default)]
    pub resource_group: Option<Reference>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupPrototype {
    pub vpc: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityGroupPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SecurityGroupRule {
    pub id: String,
    /// `inbound` or `outbound`
    pub direction: String,
    #[serde(default)]
    pub ip_version: Option<String>,
    #[serde(flatten)]
    pub protocol: SecurityGroupRuleProtocol,
    #[serde(default)]
    pub remote: Option<SecurityGroupRuleRemote>,
    #[serde(default)]
    pub local: Option<SecurityGroupRuleLocal>,
}

/// Protocol-specific part of a rule, discriminated by `protocol`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "protocol", rename_all = "snake_case")]
pub enum SecurityGroupRuleProtocol {
    All,
    Any,
    IcmpTcpUdp,
    Icmp {
        #[serde(default, rename = "type")]
        icmp_type: Option<i64>,
        #[serde(default)]
        code: Option<i64>,
    },
    Tcp {
        #[serde(default)]
        port_min: Option<i64>,
        #[serde(default)]
        port_max: Option<i64>,
    },
    Udp {
        #[serde(default)]
        port_min: Option<i64>,
        #[serde(default)]
        port_max: Option<i64>,
    },
    #[serde(other)]
    Unknown,
}

impl SecurityGroupRuleProtocol {
    pub fn name(&self) -> &'static str {
        match self {
            SecurityGroupRuleProtocol::All => "all",
            SecurityGroupRuleProtocol::Any => "any",
            SecurityGroupRuleProtocol::IcmpTcpUdp => "icmp_tcp_udp",
            SecurityGroupRuleProtocol::Icmp { .. } => "icmp",
            SecurityGroupRuleProtocol::Tcp { .. } => "tcp",
            SecurityGroupRuleProtocol::Udp { .. } => "udp",
            SecurityGroupRuleProtocol::Unknown => "unknown",
        }
    }
}

/// Rule remote: an address, a CIDR block, or a security group
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SecurityGroupRuleRemote {
    Address { address: String },
    CidrBlock { cidr_block: String },
    SecurityGroup(Reference),
}

impl SecurityGroupRuleRemote {
    /// The single string this remote is configured as
    pub fn as_config(&self) -> &str {
        match self {
            SecurityGroupRuleRemote::Address { address } => address,
            SecurityGroupRuleRemote::CidrBlock { cidr_block } => cidr_block,
            SecurityGroupRuleRemote::SecurityGroup(r) => &r.id,
        }
    }
}

/// Rule local side: an address or a CIDR block
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SecurityGroupRuleLocal {
    Address { address: String },
    CidrBlock { cidr_block: String },
}

impl SecurityGroupRuleLocal {
    pub fn as_config(&self) -> &str {
        match self {
            SecurityGroupRuleLocal::Address { address } => address,
            SecurityGroupRuleLocal::CidrBlock { cidr_block } => cidr_block,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecurityGroupRulePrototype {
    pub direction: String,
    pub ip_version: String,
    pub protocol: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<SecurityGroupRuleRemote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<SecurityGroupRuleLocal>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_max: Option<i64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SecurityGroupRulePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub direction: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote: Option<SecurityGroupRuleRemote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub local: Option<SecurityGroupRuleLocal>,
    #[serde(rename = "type", skip_serializing_if = "Option::is_none")]
    pub icmp_type: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_min: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port_max: Option<i64>,
}

impl From<SecurityGroupRulePrototype> for SecurityGroupRulePatch {
    fn from(p: SecurityGroupRulePrototype) -> Self {
        Self {
            direction: Some(p.direction),
            ip_version: Some(p.ip_version),
            remote: p.remote,
            local: p.local,
            icmp_type: p.icmp_type,
            code: p.code,
            port_min: p.port_min,
            port_max: p.port_max,
        }
    }
}

reference_union! {
    /// Object a security group is bound to
    SecurityGroupTargetReference {
        NetworkInterface => "network_interface",
        LoadBalancer => "load_balancer",
        EndpointGateway => "endpoint_gateway",
        VpnServer => "vpn_server",
        VirtualNetworkInterface => "virtual_network_interface",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct LoadBalancer {
    pub id: String,
    /// `active`, `create_pending`, `update_pending`, `delete_pending`, `maintenance_pending`, `failed`
    pub provisioning_status: String,
}
