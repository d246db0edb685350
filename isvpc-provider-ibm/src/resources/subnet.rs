//! `is_subnet`

use std::time::Duration;

use isvpc_core::mutex_kv::subnet_key;
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};
use isvpc_core::waiter::Observation;

use super::vpc::no_match;
use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_subnet;
use crate::models::subnet::{Subnet, SubnetPatch, SubnetPrototype};
use crate::models::{Identity, NameIdentity, Reference};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, optional_int, optional_str, required_str};
use crate::waiters::{
    SUBNET_AVAILABLE, SUBNET_DELETE_RETRY, SUBNET_DELETED, SUBNET_DETACH_INTERFACES, observe,
};

const TYPE: &str = "is_subnet";
const WRITE_ONLY: &[&str] = &["timeouts"];

impl IbmProvider {
    pub(crate) async fn create_subnet(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let vpc = required_str(attrs, "vpc").at(TYPE, "create", "config")?;
        let zone = required_str(attrs, "zone").at(TYPE, "create", "config")?;
        let body = SubnetPrototype {
            name: required_str(attrs, "name").at(TYPE, "create", "config")?.to_string(),
            vpc: Identity::new(vpc),
            zone: NameIdentity::new(zone),
            ipv4_cidr_block: optional_str(attrs, "ipv4_cidr_block"),
            total_ipv4_address_count: optional_int(attrs, "total_ipv4_address_count"),
            ip_version: optional_str(attrs, "ip_version"),
            network_acl: optional_str(attrs, "network_acl").map(Identity::new),
            public_gateway: optional_str(attrs, "public_gateway").map(Identity::new),
            routing_table: optional_str(attrs, "routing_table").map(Identity::new),
            resource_group: optional_str(attrs, "resource_group").map(Identity::new),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let _guard = self.locks.lock(subnet_key(vpc, zone)).await;
        let subnet: Subnet = self
            .vpc
            .post("/subnets", &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("created subnet {} ({})", subnet.name, subnet.id);

        let subnet = self
            .wait_subnet_available(&subnet.id, timeout)
            .await
            .at(TYPE, "create", "wait-available")?;
        self.write_tags(&subnet.crn, None, attrs).await;

        self.subnet_state(resource, subnet).await
    }

    pub(crate) async fn read_subnet(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        match self.vpc.get::<Subnet>(&format!("/subnets/{}", identifier)).await {
            Ok(subnet) => self.subnet_state(resource, subnet).await,
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    /// Data source: find a subnet by name, optionally within `vpc`
    pub(crate) async fn lookup_subnet(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let name = required_str(attrs, "name").at(TYPE, "lookup", "config")?;
        let vpc = optional_str(attrs, "vpc");
        let query: Vec<(&str, &str)> = vpc.iter().map(|v| ("vpc.id", v.as_str())).collect();

        let subnets: Vec<Subnet> = self
            .vpc
            .list_all("/subnets", "subnets", &query)
            .await
            .at(TYPE, "lookup", "list")?;
        match subnets.into_iter().find(|s| s.name == name) {
            Some(subnet) => self.subnet_state(resource, subnet).await,
            None => Err(no_match(TYPE, name)),
        }
    }

    pub(crate) async fn update_subnet(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let path = format!("/subnets/{}", identifier);
        let timeout = operation_timeout(attrs, "update")?;
        let changed = |key: &str| -> Option<String> {
            let desired = optional_str(attrs, key)?;
            (Some(desired.as_str()) != from.get_str(key)).then_some(desired)
        };

        if let Some(name) = changed("name") {
            let _: Subnet = self
                .vpc
                .patch(&path, &SubnetPatch { name: Some(name) })
                .await
                .at(TYPE, "update", "patch")?;
        }
        if let Some(acl) = changed("network_acl") {
            let _: Reference = self
                .vpc
                .put(&format!("{}/network_acl", path), &Identity::new(acl))
                .await
                .at(TYPE, "update", "network-acl")?;
        }
        if let Some(table) = changed("routing_table") {
            let _: Reference = self
                .vpc
                .put(&format!("{}/routing_table", path), &Identity::new(table))
                .await
                .at(TYPE, "update", "routing-table")?;
        }
        // An empty or missing gateway detaches the current one
        let desired_gateway = optional_str(attrs, "public_gateway").filter(|g| !g.is_empty());
        let current_gateway = from.get_str("public_gateway").filter(|g| !g.is_empty());
        match (current_gateway, desired_gateway) {
            (current, Some(gateway)) if current != Some(gateway.as_str()) => {
                self.attach_subnet_gateway(identifier, &gateway, timeout)
                    .await
                    .at(TYPE, "update", "attach-public-gateway")?;
            }
            (Some(gateway), None) => {
                log::info!("detaching public gateway {} from subnet {}", gateway, identifier);
                self.detach_subnet_gateway(identifier, timeout)
                    .await
                    .at(TYPE, "update", "detach-public-gateway")?;
            }
            _ => {}
        }

        let subnet: Subnet = self.vpc.get(&path).await.at(TYPE, "update", "get")?;
        self.write_tags(&subnet.crn, Some(&from.attributes), attrs).await;
        self.subnet_state(to, subnet).await
    }

    pub(crate) async fn delete_subnet(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let path = format!("/subnets/{}", identifier);
        let subnet: Subnet = match self.vpc.get(&path).await {
            Ok(subnet) => subnet,
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(ProviderError::from(e).at_step(TYPE, "delete", "get")),
        };

        if subnet.public_gateway.is_some() {
            self.detach_subnet_gateway(identifier, timeout)
                .await
                .at(TYPE, "delete", "detach-public-gateway")?;
        }

        match self.vpc.delete(&path).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_conflict() => {
                log::info!("subnet {} still has attachments, retrying delete", identifier);
                self.wait(&SUBNET_DELETE_RETRY, timeout, || async {
                    observe(self.vpc.delete(&path).await, |()| "deleting".to_string())
                })
                .await
                .at(TYPE, "delete", "retry-delete")?;
            }
            Err(e) => return Err(ProviderError::from(e).at_step(TYPE, "delete", "delete")),
        }

        self.wait(&SUBNET_DELETED, timeout, || async {
            match self.vpc.get::<Subnet>(&path).await {
                Err(e) if e.message_contains(SUBNET_DETACH_INTERFACES) => {
                    Ok(Observation::status("deleting"))
                }
                other => observe(other, |s| s.status),
            }
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("deleted subnet {}", identifier);
        Ok(())
    }

    /// Attach `gateway` and wait for the subnet to settle
    pub(crate) async fn attach_subnet_gateway(
        &self,
        subnet: &str,
        gateway: &str,
        timeout: Duration,
    ) -> ProviderResult<Subnet> {
        let _: Reference = self
            .vpc
            .put(
                &format!("/subnets/{}/public_gateway", subnet),
                &Identity::new(gateway),
            )
            .await?;
        log::info!("attached public gateway {} to subnet {}", gateway, subnet);
        self.wait_subnet_available(subnet, timeout).await
    }

    /// Detach the public gateway of `subnet` and wait for the subnet to settle
    async fn detach_subnet_gateway(&self, subnet: &str, timeout: Duration) -> ProviderResult<()> {
        ignore_not_found(
            self.vpc
                .delete(&format!("/subnets/{}/public_gateway", subnet))
                .await,
        )?;
        self.wait_subnet_available(subnet, timeout).await?;
        Ok(())
    }

    pub(crate) async fn wait_subnet_available(
        &self,
        id: &str,
        timeout: Duration,
    ) -> ProviderResult<Subnet> {
        let path = format!("/subnets/{}", id);
        self.wait(&SUBNET_AVAILABLE, timeout, || async {
            observe(self.vpc.get::<Subnet>(&path).await, |s| s.status)
        })
        .await?;
        Ok(self.vpc.get(&path).await?)
    }

    async fn subnet_state(&self, resource: &Resource, subnet: Subnet) -> ProviderResult<State> {
        let mut attrs = flatten_subnet(&subnet);
        keep_config(&mut attrs, resource, WRITE_ONLY);
        self.read_tags_into(&subnet.crn, &mut attrs).await;
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(subnet.id))
    }
}
