//! `is_public_gateway` and `is_subnet_public_gateway_attachment`

use std::time::Duration;

use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::vpc::no_match;
use super::{Labeled, ignore_not_found};
use crate::client::ClientError;
use crate::flatten::{flatten_public_gateway, flatten_public_gateway_attachment};
use crate::models::public_gateway::{
    FloatingIpIdentity, PublicGateway, PublicGatewayPatch, PublicGatewayPrototype,
};
use crate::models::subnet::Subnet;
use crate::models::{Identity, NameIdentity};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, optional_str, required_str};
use crate::waiters::{
    PUBLIC_GATEWAY_AVAILABLE, PUBLIC_GATEWAY_DELETED, PUBLIC_GATEWAY_DETACHED,
    PUBLIC_GATEWAY_IN_USE, observe,
};

const TYPE: &str = "is_public_gateway";
const ATTACHMENT: &str = "is_subnet_public_gateway_attachment";
const WRITE_ONLY: &[&str] = &["timeouts"];

impl IbmProvider {
    pub(crate) async fn create_public_gateway(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let floating_ip = match (
            optional_str(attrs, "floating_ip_id"),
            optional_str(attrs, "floating_ip_address"),
        ) {
            (Some(id), _) => Some(FloatingIpIdentity::Id { id }),
            (None, Some(address)) => Some(FloatingIpIdentity::Address { address }),
            (None, None) => None,
        };
        let body = PublicGatewayPrototype {
            vpc: Identity::new(required_str(attrs, "vpc").at(TYPE, "create", "config")?),
            zone: NameIdentity::new(required_str(attrs, "zone").at(TYPE, "create", "config")?),
            name: optional_str(attrs, "name"),
            floating_ip,
            resource_group: optional_str(attrs, "resource_group").map(Identity::new),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let gateway: PublicGateway = self
            .vpc
            .post("/public_gateways", &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("created public gateway {} ({})", gateway.name, gateway.id);

        let path = format!("/public_gateways/{}", gateway.id);
        self.wait(&PUBLIC_GATEWAY_AVAILABLE, timeout, || async {
            observe(self.vpc.get::<PublicGateway>(&path).await, |g| g.status)
        })
        .await
        .at(TYPE, "create", "wait-available")?;

        let gateway: PublicGateway = self.vpc.get(&path).await.at(TYPE, "create", "get")?;
        self.write_tags(&gateway.crn, None, attrs).await;
        self.public_gateway_state(resource, gateway).await
    }

    pub(crate) async fn read_public_gateway(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let path = format!("/public_gateways/{}", identifier);
        match self.vpc.get::<PublicGateway>(&path).await {
            Ok(gateway) => self.public_gateway_state(resource, gateway).await,
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn lookup_public_gateway(&self, resource: &Resource) -> ProviderResult<State> {
        let name = required_str(&resource.attributes, "name").at(TYPE, "lookup", "config")?;
        let gateways: Vec<PublicGateway> = self
            .vpc
            .list_all("/public_gateways", "public_gateways", &[])
            .await
            .at(TYPE, "lookup", "list")?;
        match gateways.into_iter().find(|g| g.name == name) {
            Some(gateway) => self.public_gateway_state(resource, gateway).await,
            None => Err(no_match(TYPE, name)),
        }
    }

    pub(crate) async fn update_public_gateway(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let path = format!("/public_gateways/{}", identifier);
        let name = optional_str(attrs, "name");

        let gateway: PublicGateway = if name.is_some() && name.as_deref() != from.get_str("name") {
            self.vpc
                .patch(&path, &PublicGatewayPatch { name })
                .await
                .at(TYPE, "update", "patch")?
        } else {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        };
        self.write_tags(&gateway.crn, Some(&from.attributes), attrs).await;
        self.public_gateway_state(to, gateway).await
    }

    /// Delete the gateway, detaching it from subnets that still use it
    pub(crate) async fn delete_public_gateway(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let path = format!("/public_gateways/{}", identifier);
        match self.vpc.delete(&path).await {
            Ok(()) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) if e.is_conflict() && in_use(&e) => {
                log::info!("public gateway {} is in use, detaching subnets", identifier);
                self.detach_from_subnets(identifier, timeout)
                    .await
                    .at(TYPE, "delete", "detach-subnets")?;
                ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;
            }
            Err(e) => return Err(ProviderError::from(e).at_step(TYPE, "delete", "delete")),
        }

        self.wait(&PUBLIC_GATEWAY_DELETED, timeout, || async {
            observe(self.vpc.get::<PublicGateway>(&path).await, |g| {
                if g.status == "failed" {
                    g.status
                } else {
                    "deleting".to_string()
                }
            })
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("deleted public gateway {}", identifier);
        Ok(())
    }

    async fn detach_from_subnets(
        &self,
        gateway_id: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let gateway: PublicGateway = self
            .vpc
            .get(&format!("/public_gateways/{}", gateway_id))
            .await?;
        let subnets: Vec<Subnet> = self
            .vpc
            .list_all("/subnets", "subnets", &[("vpc.id", gateway.vpc.id.as_str())])
            .await?;

        for subnet in subnets
            .iter()
            .filter(|s| s.public_gateway.as_ref().is_some_and(|g| g.id == gateway_id))
        {
            ignore_not_found(
                self.vpc
                    .delete(&format!("/subnets/{}/public_gateway", subnet.id))
                    .await,
            )?;
            self.wait_gateway_detached(&subnet.id, timeout).await?;
            log::info!("detached public gateway {} from subnet {}", gateway_id, subnet.id);
        }
        Ok(())
    }

    /// Poll the subnet's gateway until the API stops returning one
    async fn wait_gateway_detached(&self, subnet: &str, timeout: Duration) -> ProviderResult<()> {
        let path = format!("/subnets/{}/public_gateway", subnet);
        self.wait(&PUBLIC_GATEWAY_DETACHED, timeout, || async {
            observe(self.vpc.get::<PublicGateway>(&path).await, |_| "wait".to_string())
        })
        .await?;
        Ok(())
    }

    async fn public_gateway_state(
        &self,
        resource: &Resource,
        gateway: PublicGateway,
    ) -> ProviderResult<State> {
        let mut attrs = flatten_public_gateway(&gateway);
        keep_config(&mut attrs, resource, WRITE_ONLY);
        self.read_tags_into(&gateway.crn, &mut attrs).await;
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(gateway.id))
    }

    pub(crate) async fn create_public_gateway_attachment(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let subnet = required_str(attrs, "subnet").at(ATTACHMENT, "create", "config")?;
        let gateway = required_str(attrs, "public_gateway").at(ATTACHMENT, "create", "config")?;
        let timeout = operation_timeout(attrs, "create")?;

        self.attach_subnet_gateway(subnet, gateway, timeout)
            .await
            .at(ATTACHMENT, "create", "attach")?;
        self.attachment_state(resource, subnet, "create").await
    }

    pub(crate) async fn read_public_gateway_attachment(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        self.attachment_state(resource, identifier, "read").await
    }

    pub(crate) async fn update_public_gateway_attachment(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let gateway = required_str(attrs, "public_gateway").at(ATTACHMENT, "update", "config")?;
        if from.get_str("public_gateway") != Some(gateway) {
            let timeout = operation_timeout(attrs, "update")?;
            self.attach_subnet_gateway(identifier, gateway, timeout)
                .await
                .at(ATTACHMENT, "update", "attach")?;
        }
        self.attachment_state(to, identifier, "update").await
    }

    pub(crate) async fn delete_public_gateway_attachment(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let path = format!("/subnets/{}/public_gateway", identifier);
        ignore_not_found(self.vpc.delete(&path).await).at(ATTACHMENT, "delete", "delete")?;
        self.wait_gateway_detached(identifier, timeout)
            .await
            .at(ATTACHMENT, "delete", "wait-detached")?;
        log::info!("detached public gateway from subnet {}", identifier);
        Ok(())
    }

    async fn attachment_state(
        &self,
        resource: &Resource,
        subnet: &str,
        operation: &str,
    ) -> ProviderResult<State> {
        let path = format!("/subnets/{}/public_gateway", subnet);
        match self.vpc.get::<PublicGateway>(&path).await {
            Ok(gateway) => {
                let mut attrs = flatten_public_gateway_attachment(subnet, &gateway);
                keep_config(&mut attrs, resource, WRITE_ONLY);
                Ok(State::existing(resource.id.clone(), attrs).with_identifier(subnet))
            }
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(ATTACHMENT, operation, "get")),
        }
    }
}

/// 409 raised while subnets still route through the gateway
fn in_use(err: &ClientError) -> bool {
    matches!(err, ClientError::Api(api) if api.message.to_lowercase().contains(PUBLIC_GATEWAY_IN_USE))
}
