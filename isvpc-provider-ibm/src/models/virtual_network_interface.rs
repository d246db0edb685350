use serde::{Deserialize, Serialize};

use super::{Identity, Reference, ReservedIpReference, ZoneReference, reference_union};

reference_union! {
    /// Object a virtual network interface is attached to
    VirtualNetworkInterfaceTarget {
        ShareMountTarget => "share_mount_target",
        InstanceNetworkAttachment => "instance_network_attachment",
        BareMetalServerNetworkAttachment => "bare_metal_server_network_attachment",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct VirtualNetworkInterface {
    pub id: String,
    pub name: String,
    pub crn: String,
    pub lifecycle_state: String,
    pub allow_ip_spoofing: bool,
    pub auto_delete: bool,
    pub enable_infrastructure_nat: bool,
    #[serde(default)]
    pub protocol_state_filtering_mode: Option<String>,
    #[serde(default)]
    pub primary_ip: Option<ReservedIpReference>,
    #[serde(default)]
    pub subnet: Option<Reference>,
    #[serde(default)]
    pub vpc: Option<Reference>,
    #[serde(default)]
    pub zone: Option<ZoneReference>,
    #[serde(default)]
    pub security_groups: Vec<Reference>,
    #[serde(default)]
    pub resource_group: Option<Reference>,
    #[serde(default)]
    pub target: Option<VirtualNetworkInterfaceTarget>,
    #[serde(default)]
    pub created_at: Option<String>,
}

/// `primary_ip` in a prototype: an existing reserved IP or a new address
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum PrimaryIpPrototype {
    Id { id: String },
    Address {
        address: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        auto_delete: Option<bool>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct VirtualNetworkInterfacePrototype {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub subnet: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub primary_ip: Option<PrimaryIpPrototype>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub security_groups: Vec<Identity>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ip_spoofing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_infrastructure_nat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_state_filtering_mode: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub resource_group: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct VirtualNetworkInterfacePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_ip_spoofing: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub enable_infrastructure_nat: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub protocol_state_filtering_mode: Option<String>,
}

impl VirtualNetworkInterfacePatch {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_with_target() {
        let vni: VirtualNetworkInterface = serde_json::from_value(json!({
            "id": "0717-vni",
            "name": "app-vni",
            "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::virtual-network-interface:0717-vni",
            "lifecycle_state": "stable",
            "allow_ip_spoofing": false,
            "auto_delete": false,
            "enable_infrastructure_nat": true,
            "primary_ip": {"id": "0717-rip", "address": "10.240.0.6", "name": "app-ip"},
            "subnet": {"id": "0717-subnet", "name": "app"},
            "security_groups": [{"id": "r006-sg1"}, {"id": "r006-sg2"}],
            "target": {"resource_type": "share_mount_target", "id": "r006-smt", "name": "mnt"}
        }))
        .unwrap();
        assert_eq!(vni.security_groups.len(), 2);
        assert_eq!(vni.primary_ip.unwrap().address, "10.240.0.6");
        assert_eq!(vni.target.unwrap().resource_type(), "share_mount_target");
    }

    #[test]
    fn primary_ip_prototype_shapes() {
        assert_eq!(
            serde_json::to_value(PrimaryIpPrototype::Id { id: "0717-rip".into() }).unwrap(),
            json!({"id": "0717-rip"})
        );
        assert_eq!(
            serde_json::to_value(PrimaryIpPrototype::Address {
                address: "10.240.0.7".into(),
                auto_delete: Some(true)
            })
            .unwrap(),
            json!({"address": "10.240.0.7", "auto_delete": true})
        );
    }
}
