use serde::{Deserialize, Serialize};

use super::{Identity, reference_union};

reference_union! {
    /// Object a reserved IP is bound to
    ReservedIpTarget {
        EndpointGateway => "endpoint_gateway",
        NetworkInterface => "network_interface",
        BareMetalServerNetworkInterface => "bare_metal_server_network_interface",
        VirtualNetworkInterface => "virtual_network_interface",
        LoadBalancer => "load_balancer",
        VpnGateway => "vpn_gateway",
        VpnServer => "vpn_server",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReservedIp {
    pub id: String,
    pub name: String,
    pub address: String,
    pub auto_delete: bool,
    #[serde(default)]
    pub owner: Option<String>,
    #[serde(default)]
    pub lifecycle_state: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
    #[serde(default)]
    pub target: Option<ReservedIpTarget>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReservedIpPrototype {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<Identity>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReservedIpPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auto_delete: Option<bool>,
}

impl ReservedIpPatch {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.auto_delete.is_none()
    }
}
