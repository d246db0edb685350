//! `is_vpc_address_prefix`

use isvpc_core::composite_id::{id_parts, make_slash_id};
use isvpc_core::mutex_kv::vpc_address_prefix_key;
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_address_prefix;
use crate::models::NameIdentity;
use crate::models::address_prefix::{AddressPrefix, AddressPrefixPatch, AddressPrefixPrototype};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, optional_bool, optional_str, required_str};

const TYPE: &str = "is_vpc_address_prefix";

fn prefix_path(vpc: &str, prefix: &str) -> String {
    format!("/vpcs/{}/address_prefixes/{}", vpc, prefix)
}

impl IbmProvider {
    pub(crate) async fn create_address_prefix(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let vpc = required_str(attrs, "vpc").at(TYPE, "create", "config")?;
        let body = AddressPrefixPrototype {
            cidr: required_str(attrs, "cidr").at(TYPE, "create", "config")?.to_string(),
            zone: NameIdentity::new(required_str(attrs, "zone").at(TYPE, "create", "config")?),
            name: optional_str(attrs, "name"),
            is_default: optional_bool(attrs, "is_default"),
        };

        let _guard = self.locks.lock(vpc_address_prefix_key(vpc)).await;
        let prefix: AddressPrefix = self
            .vpc
            .post(&format!("/vpcs/{}/address_prefixes", vpc), &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("added address prefix {} to VPC {}", prefix.cidr, vpc);

        Ok(prefix_state(resource, vpc, &prefix))
    }

    pub(crate) async fn read_address_prefix(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "read", "parse-id")?;
        match self
            .vpc
            .get::<AddressPrefix>(&prefix_path(&parts[0], &parts[1]))
            .await
        {
            Ok(prefix) => Ok(prefix_state(resource, &parts[0], &prefix)),
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn update_address_prefix(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "update", "parse-id")?;
        let path = prefix_path(&parts[0], &parts[1]);
        let attrs = &to.attributes;

        let patch = AddressPrefixPatch {
            name: optional_str(attrs, "name").filter(|n| Some(n.as_str()) != from.get_str("name")),
            is_default: optional_bool(attrs, "is_default").filter(|d| {
                from.attributes.get("is_default").and_then(|v| v.as_bool()) != Some(*d)
            }),
        };
        let prefix: AddressPrefix = if patch.is_empty() {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        } else {
            let _guard = self.locks.lock(vpc_address_prefix_key(&parts[0])).await;
            self.vpc
                .patch(&path, &patch)
                .await
                .at(TYPE, "update", "patch")?
        };
        Ok(prefix_state(to, &parts[0], &prefix))
    }

    pub(crate) async fn delete_address_prefix(&self, identifier: &str) -> ProviderResult<()> {
        let parts = id_parts(identifier, 2).at(TYPE, "delete", "parse-id")?;
        let _guard = self.locks.lock(vpc_address_prefix_key(&parts[0])).await;
        ignore_not_found(self.vpc.delete(&prefix_path(&parts[0], &parts[1])).await)
            .at(TYPE, "delete", "delete")?;
        log::info!("removed address prefix {}", identifier);
        Ok(())
    }
}

fn prefix_state(resource: &Resource, vpc: &str, prefix: &AddressPrefix) -> State {
    let mut attrs = flatten_address_prefix(vpc, prefix);
    keep_config(&mut attrs, resource, &["timeouts"]);
    State::existing(resource.id.clone(), attrs).with_identifier(make_slash_id(vpc, &prefix.id))
}
