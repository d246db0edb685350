use serde::{Deserialize, Serialize};

use super::{Identity, NameIdentity, Reference, reference_union};

reference_union! {
    /// Object whose traffic a collector records
    FlowLogCollectorTarget {
        Vpc => "vpc",
        Subnet => "subnet",
        Instance => "instance",
        NetworkInterface => "network_interface",
        VirtualNetworkInterface => "virtual_network_interface",
        InstanceNetworkAttachment => "instance_network_attachment",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FlowLogCollector {
    pub id: String,
    pub name: String,
    pub crn: String,
    pub active: bool,
    pub auto_delete: bool,
    pub lifecycle_state: String,
    pub storage_bucket: StorageBucket,
    pub target: FlowLogCollectorTarget,
    #[serde(default)]
    pub vpc: Option<Reference>,
    #[serde(default)]
    pub resource_group: Option<Reference>,
    #[serde(default)]
    pub created_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct StorageBucket {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FlowLogCollectorPrototype {
    pub target: Identity,
    pub storage_bucket: NameIdentity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FlowLogCollectorPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub active: Option<bool>,
}

impl FlowLogCollectorPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.active.is_none()
    }
}
