//! `is_virtual_endpoint_gateway_resource_binding`

use std::time::Duration;

use isvpc_core::composite_id::{id_parts, make_slash_id};
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_resource_binding;
use crate::models::CrnIdentity;
use crate::models::endpoint_gateway::{
    ResourceBinding, ResourceBindingPatch, ResourceBindingPrototype,
};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, optional_str, required_str};
use crate::waiters::{BINDING_DELETED, BINDING_STABLE, observe};

const TYPE: &str = "is_virtual_endpoint_gateway_resource_binding";

fn binding_path(gateway: &str, binding: &str) -> String {
    format!("/endpoint_gateways/{}/resource_bindings/{}", gateway, binding)
}

impl IbmProvider {
    pub(crate) async fn create_resource_binding(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let gateway = required_str(attrs, "endpoint_gateway").at(TYPE, "create", "config")?;
        let body = ResourceBindingPrototype {
            target: CrnIdentity {
                crn: required_str(attrs, "target").at(TYPE, "create", "config")?.to_string(),
            },
            name: optional_str(attrs, "name"),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let binding: ResourceBinding = self
            .vpc
            .post(
                &format!("/endpoint_gateways/{}/resource_bindings", gateway),
                &body,
            )
            .await
            .at(TYPE, "create", "post")?;
        log::info!("bound {} to endpoint gateway {}", binding.target.crn, gateway);

        let path = binding_path(gateway, &binding.id);
        self.wait(&BINDING_STABLE, timeout, || async {
            observe(
                self.vpc.get::<ResourceBinding>(&path).await,
                |b| b.lifecycle_state,
            )
        })
        .await
        .at(TYPE, "create", "wait-stable")?;

        let binding: ResourceBinding = self.vpc.get(&path).await.at(TYPE, "create", "get")?;
        Ok(binding_state(resource, gateway, &binding))
    }

    pub(crate) async fn read_resource_binding(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "read", "parse-id")?;
        match self
            .vpc
            .get::<ResourceBinding>(&binding_path(&parts[0], &parts[1]))
            .await
        {
            Ok(binding) => Ok(binding_state(resource, &parts[0], &binding)),
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn update_resource_binding(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "update", "parse-id")?;
        let path = binding_path(&parts[0], &parts[1]);
        let name = optional_str(&to.attributes, "name");

        let binding: ResourceBinding = if name.is_some() && name.as_deref() != from.get_str("name")
        {
            self.vpc
                .patch(&path, &ResourceBindingPatch { name })
                .await
                .at(TYPE, "update", "patch")?
        } else {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        };
        Ok(binding_state(to, &parts[0], &binding))
    }

    pub(crate) async fn delete_resource_binding(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let parts = id_parts(identifier, 2).at(TYPE, "delete", "parse-id")?;
        let path = binding_path(&parts[0], &parts[1]);
        ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;

        self.wait(&BINDING_DELETED, timeout, || async {
            observe(
                self.vpc.get::<ResourceBinding>(&path).await,
                |b| b.lifecycle_state,
            )
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("removed endpoint gateway binding {}", identifier);
        Ok(())
    }
}

fn binding_state(resource: &Resource, gateway: &str, binding: &ResourceBinding) -> State {
    let mut attrs = flatten_resource_binding(gateway, binding);
    keep_config(&mut attrs, resource, &["timeouts"]);
    State::existing(resource.id.clone(), attrs)
        .with_identifier(make_slash_id(gateway, &binding.id))
}
