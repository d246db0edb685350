use serde::{Deserialize, Serialize};

use super::{Identity, NameIdentity, Reference, ZoneReference};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PublicGateway {
    pub id: String,
    pub name: String,
    pub crn: String,
    /// `pending`, `available`, `deleting`, `failed`
    pub status: String,
    pub vpc: Reference,
    pub zone: ZoneReference,
    #[serde(default)]
    pub floating_ip: Option<FloatingIpReference>,
    #[serde(default)]
    pub resource_group: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct FloatingIpReference {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub crn: Option<String>,
}

/// Floating IP to bind at creation: an existing one by id, or by address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum FloatingIpIdentity {
    Id { id: String },
    Address { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicGatewayPrototype {
    pub vpc: Identity,
    pub zone: NameIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub floating_ip: Option<FloatingIpIdentity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PublicGatewayPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}
