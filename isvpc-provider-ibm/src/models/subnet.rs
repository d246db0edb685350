use serde::{Deserialize, Serialize};

use super::{Identity, NameIdentity, Reference, ZoneReference};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subnet {
    pub id: String,
    pub name: String,
    pub crn: String,
    /// `pending`, `available`, `deleting`, `failed`
    pub status: String,
    pub ipv4_cidr_block: String,
    #[serde(default)]
    pub ip_version: Option<String>,
    #[serde(default)]
    pub total_ipv4_address_count: i64,
    #[serde(default)]
    pub available_ipv4_address_count: i64,
    pub zone: ZoneReference,
    pub vpc: Reference,
    #[serde(default)]
    pub network_acl: Option<Reference>,
    #[serde(default)]
    pub public_gateway: Option<Reference>,
    #[serde(default)]
    pub routing_table: Option<Reference>,
    #[serde(default)]
    pub resource_group: Option<Reference>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubnetPrototype {
    pub name: String,
    pub vpc: Identity,
    pub zone: NameIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ipv4_cidr_block: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total_ipv4_address_count: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ip_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub network_acl: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub public_gateway: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_table: Option<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SubnetPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
