//! `is_security_group_target`
//!
//! Binding of a security group to a target, identified by `<sg>/<target>`.
//! Load balancers reject binds while provisioning, so those are waited out.

use std::time::Duration;

use isvpc_core::composite_id::{id_parts, make_slash_id};
use isvpc_core::mutex_kv::security_group_target_key;
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::client::ClientError;
use crate::flatten::flatten_security_group_target;
use crate::models::TargetReference;
use crate::models::security_group::{LoadBalancer, SecurityGroupTargetReference};
use crate::models::virtual_network_interface::VirtualNetworkInterface;
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, required_str};
use crate::waiters::{
    LOAD_BALANCER_READY, SECURITY_GROUP_TARGET_UNBOUND, VNI_TARGET_STABLE, load_balancer_status,
    observe,
};

const TYPE: &str = "is_security_group_target";

impl IbmProvider {
    pub(crate) async fn create_security_group_target(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let group = required_str(attrs, "security_group").at(TYPE, "create", "config")?;
        let target = required_str(attrs, "target").at(TYPE, "create", "config")?;
        let timeout = operation_timeout(attrs, "create")?;
        let path = target_path(group, target);

        {
            let _guard = self.locks.lock(security_group_target_key(target)).await;
            match self.vpc.put_empty(&path).await {
                Err(e) if load_balancer_pending(&e) => {
                    log::info!("load balancer {} is busy, waiting before binding", target);
                    self.wait_load_balancer(target, timeout)
                        .await
                        .at(TYPE, "create", "wait-load-balancer")?;
                    self.vpc.put_empty(&path).await.at(TYPE, "create", "bind")?;
                }
                other => other.at(TYPE, "create", "bind")?,
            }
        }
        log::info!("bound security group {} to {}", group, target);

        let bound: SecurityGroupTargetReference =
            self.vpc.get(&path).await.at(TYPE, "create", "get")?;
        let crn = bound
            .reference()
            .and_then(|r| r.crn.clone())
            .unwrap_or_default();
        if crn.contains("load-balancer") {
            self.wait_load_balancer(target, timeout)
                .await
                .at(TYPE, "create", "wait-load-balancer")?;
        } else if crn.contains("virtual-network-interface") {
            let vni = format!("/virtual_network_interfaces/{}", target);
            self.wait(&VNI_TARGET_STABLE, timeout, || async {
                observe(
                    self.vpc.get::<VirtualNetworkInterface>(&vni).await,
                    |v| v.lifecycle_state,
                )
            })
            .await
            .at(TYPE, "create", "wait-virtual-network-interface")?;
        }

        Ok(target_state(resource, group, target, &bound))
    }

    pub(crate) async fn read_security_group_target(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "read", "parse-id")?;
        let (group, target) = (&parts[0], &parts[1]);
        match self
            .vpc
            .get::<SecurityGroupTargetReference>(&target_path(group, target))
            .await
        {
            Ok(bound) => Ok(target_state(resource, group, target, &bound)),
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    /// Both sides force replacement, so an update only refreshes
    pub(crate) async fn update_security_group_target(
        &self,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        self.read_security_group_target(to, identifier).await
    }

    pub(crate) async fn delete_security_group_target(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let parts = id_parts(identifier, 2).at(TYPE, "delete", "parse-id")?;
        let (group, target) = (&parts[0], &parts[1]);
        let path = target_path(group, target);

        let bound: SecurityGroupTargetReference = match self.vpc.get(&path).await {
            Ok(bound) => bound,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(ProviderError::from(e).at_step(TYPE, "delete", "get")),
        };

        {
            let _guard = self.locks.lock(security_group_target_key(target)).await;
            ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "unbind")?;
        }
        log::info!("unbound security group {} from {}", group, target);

        let is_load_balancer = bound
            .reference()
            .and_then(|r| r.crn.as_deref())
            .is_some_and(|crn| crn.contains("load-balancer"));
        if is_load_balancer {
            self.wait(&SECURITY_GROUP_TARGET_UNBOUND, timeout, || async {
                observe(
                    self.vpc.get::<SecurityGroupTargetReference>(&path).await,
                    |_| "deleting".to_string(),
                )
            })
            .await
            .at(TYPE, "delete", "wait-unbound")?;
            self.wait_load_balancer(target, timeout)
                .await
                .at(TYPE, "delete", "wait-load-balancer")?;
        }
        Ok(())
    }

    async fn wait_load_balancer(&self, id: &str, timeout: Duration) -> ProviderResult<()> {
        let path = format!("/load_balancers/{}", id);
        self.wait(&LOAD_BALANCER_READY, timeout, || async {
            observe(self.vpc.get::<LoadBalancer>(&path).await, |lb| {
                load_balancer_status(&lb.provisioning_status)
            })
        })
        .await?;
        Ok(())
    }
}

fn target_path(group: &str, target: &str) -> String {
    format!("/security_groups/{}/targets/{}", group, target)
}

/// Bind refused because the load balancer is still provisioning
fn load_balancer_pending(err: &ClientError) -> bool {
    let ClientError::Api(api) = err else {
        return false;
    };
    let message = api.message.to_lowercase();
    message.contains("load balancer")
        && (message.contains("update_pending") || message.contains("create_pending"))
}

fn target_state(
    resource: &Resource,
    group: &str,
    target: &str,
    bound: &SecurityGroupTargetReference,
) -> State {
    let fallback = TargetReference {
        id: target.to_string(),
        ..Default::default()
    };
    let reference = bound.reference().unwrap_or(&fallback);
    let mut attrs = flatten_security_group_target(group, bound.resource_type(), reference);
    keep_config(&mut attrs, resource, &["timeouts"]);
    State::existing(resource.id.clone(), attrs).with_identifier(make_slash_id(group, target))
}
