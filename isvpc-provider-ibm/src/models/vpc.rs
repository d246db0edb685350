use serde::{Deserialize, Serialize};

use super::{Identity, Reference};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Vpc {
    pub id: String,
    pub name: String,
    pub crn: String,
    /// `pending`, `available`, `deleting`, `failed`
    pub status: String,
    #[serde(default)]
    pub classic_access: bool,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub default_network_acl: Option<Reference>,
    #[serde(default)]
    pub default_security_group: Option<Reference>,
    #[serde(default)]
    pub default_routing_table: Option<Reference>,
    #[serde(default)]
    pub resource_group: Option<Reference>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VpcPrototype {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address_prefix_management: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub classic_access: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VpcPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

impl VpcPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
    }
}
