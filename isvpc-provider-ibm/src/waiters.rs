//! Wait conditions of every asynchronous call site
//!
//! Each constant lists exactly the statuses its call site expects; anything
//! else ends the wait with an unexpected-state error.

use isvpc_core::provider::ProviderResult;
use isvpc_core::waiter::{Observation, OnNotFound, WaitSpec};

use crate::client::ClientResult;

pub const VPC_AVAILABLE: WaitSpec = WaitSpec::new("vpc available")
    .pending(&["pending"])
    .target(&["available"])
    .failed(&["failed"]);

pub const VPC_DELETED: WaitSpec = WaitSpec::new("vpc deleted")
    .pending(&["deleting", "available", "pending"])
    .failed(&["failed"])
    .on_not_found(OnNotFound::Done);

pub const SUBNET_AVAILABLE: WaitSpec = WaitSpec::new("subnet available")
    .pending(&["pending"])
    .target(&["available"])
    .failed(&["failed"]);

/// Re-issued DELETE while the subnet still has attachments
pub const SUBNET_DELETE_RETRY: WaitSpec = WaitSpec::new("subnet delete retry")
    .target(&["deleting"])
    .on_not_found(OnNotFound::Done)
    .conflict_pending();

pub const SUBNET_DELETED: WaitSpec = WaitSpec::new("subnet deleted")
    .pending(&["deleting", "pending", "available"])
    .failed(&["failed"])
    .on_not_found(OnNotFound::Done);

/// Message of the 404-like error a subnet reports while interfaces drain
pub const SUBNET_DETACH_INTERFACES: &str =
    "please detach all network interfaces from subnet before deleting it";

pub const PUBLIC_GATEWAY_AVAILABLE: WaitSpec = WaitSpec::new("public gateway available")
    .pending(&["pending"])
    .target(&["available"])
    .failed(&["failed"]);

/// `GET /subnets/{id}/public_gateway` answering 404
pub const PUBLIC_GATEWAY_DETACHED: WaitSpec = WaitSpec::new("public gateway detached")
    .pending(&["retry", "wait"])
    .target(&["done", ""])
    .on_not_found(OnNotFound::Done);

pub const PUBLIC_GATEWAY_DELETED: WaitSpec = WaitSpec::new("public gateway deleted")
    .pending(&["deleting"])
    .failed(&["failed"])
    .on_not_found(OnNotFound::Done);

/// Message of the 409 returned while subnets still use the gateway
pub const PUBLIC_GATEWAY_IN_USE: &str = "the public gateway is in use by subnet";

pub const VNI_TARGET_STABLE: WaitSpec = WaitSpec::new("virtual network interface stable")
    .pending(&["pending", "updating", "waiting"])
    .target(&["done", "", "stable"])
    .failed(&["failed"]);

/// Load balancer settled after a security group (un)bind
pub const LOAD_BALANCER_READY: WaitSpec = WaitSpec::new("load balancer ready")
    .pending(&["retry", "provisioning", "update_pending"])
    .target(&["done"]);

pub const SECURITY_GROUP_TARGET_UNBOUND: WaitSpec =
    WaitSpec::new("security group target removed")
        .pending(&["deleting"])
        .on_not_found(OnNotFound::Done);

pub const FLOW_LOG_STABLE: WaitSpec = WaitSpec::new("flow log stable")
    .pending(&["pending", "updating", "waiting"])
    .target(&["stable"])
    .failed(&["failed", "suspended"]);

pub const FLOW_LOG_DELETED: WaitSpec = WaitSpec::new("flow log deleted")
    .pending(&["deleting", "stable", "pending", "updating", "waiting"])
    .failed(&["failed"])
    .on_not_found(OnNotFound::Done);

pub const RESERVED_IP_READY: WaitSpec = WaitSpec::new("reserved ip available")
    .pending(&["pending"])
    .target(&["done", ""])
    .failed(&["failed"]);

pub const VNI_AVAILABLE: WaitSpec = WaitSpec::new("virtual network interface available")
    .pending(&["", "pending"])
    .target(&["done", "stable"])
    .failed(&["failed", "suspended"]);

pub const VNI_DELETED: WaitSpec = WaitSpec::new("virtual network interface deleted")
    .pending(&["", "pending", "deleting", "updating", "waiting"])
    .failed(&["failed", "suspended"])
    .on_not_found(OnNotFound::Done);

pub const BINDING_STABLE: WaitSpec = WaitSpec::new("endpoint gateway binding stable")
    .pending(&["pending", "updating", "waiting"])
    .target(&["stable"])
    .failed(&["failed", "suspended"]);

pub const BINDING_DELETED: WaitSpec = WaitSpec::new("endpoint gateway binding deleted")
    .pending(&["deleting", "stable", "pending", "updating", "waiting"])
    .failed(&["failed"])
    .on_not_found(OnNotFound::Done);

pub const ADVERTISED_CIDR_DELETED: WaitSpec = WaitSpec::new("advertised cidr removed")
    .pending(&["deleting"])
    .on_not_found(OnNotFound::Done);

/// One poll: success maps through `status`, 404 and 409 become observations,
/// any other error ends the wait
pub fn observe<T>(
    result: ClientResult<T>,
    status: impl FnOnce(T) -> String,
) -> ProviderResult<Observation> {
    match result {
        Ok(value) => Ok(Observation::Status(status(value))),
        Err(e) if e.is_not_found() => Ok(Observation::NotFound),
        Err(e) if e.is_conflict() => Ok(Observation::Conflict(e.to_string())),
        Err(e) => Err(e.into()),
    }
}

/// Collapse a lifecycle state: `stable` is done, `failed` and `""` pass
/// through, anything else pends
pub fn stable_or_pending(lifecycle_state: &str) -> String {
    match lifecycle_state {
        "stable" => "done",
        "failed" => "failed",
        "" => "",
        _ => "pending",
    }
    .to_string()
}

/// Load balancer provisioning status as seen by [`LOAD_BALANCER_READY`]
pub fn load_balancer_status(provisioning_status: &str) -> String {
    match provisioning_status {
        "active" | "failed" => "done".to_string(),
        _ => "provisioning".to_string(),
    }
}
