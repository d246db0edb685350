use serde::{Deserialize, Serialize};

use super::{NameIdentity, ZoneReference};

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AddressPrefix {
    pub id: String,
    pub name: String,
    pub cidr: String,
    pub zone: ZoneReference,
    #[serde(default)]
    pub is_default: bool,
    #[serde(default)]
    pub has_subnets: bool,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AddressPrefixPrototype {
    pub cidr: String,
    pub zone: NameIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AddressPrefixPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_default: Option<bool>,
}

impl AddressPrefixPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.is_default.is_none()
    }
}
