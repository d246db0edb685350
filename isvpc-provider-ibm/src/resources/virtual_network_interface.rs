//! `is_virtual_network_interface`

use std::collections::BTreeSet;
use std::time::Duration;

use isvpc_core::mutex_kv::security_group_target_key;
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_virtual_network_interface;
use crate::models::Identity;
use crate::models::virtual_network_interface::{
    PrimaryIpPrototype, VirtualNetworkInterface, VirtualNetworkInterfacePatch,
    VirtualNetworkInterfacePrototype,
};
use crate::provider::IbmProvider;
use crate::utils::{
    keep_config, operation_timeout, optional_bool, optional_str, required_str, string_list,
};
use crate::waiters::{VNI_AVAILABLE, VNI_DELETED, VNI_TARGET_STABLE, observe};

const TYPE: &str = "is_virtual_network_interface";
const WRITE_ONLY: &[&str] = &["timeouts"];

impl IbmProvider {
    pub(crate) async fn create_virtual_network_interface(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let primary_ip = match (
            optional_str(attrs, "primary_ip_id"),
            optional_str(attrs, "primary_ip_address"),
        ) {
            (Some(id), _) => Some(PrimaryIpPrototype::Id { id }),
            (None, Some(address)) => Some(PrimaryIpPrototype::Address {
                address,
                auto_delete: None,
            }),
            (None, None) => None,
        };
        let body = VirtualNetworkInterfacePrototype {
            name: optional_str(attrs, "name"),
            subnet: Identity::new(required_str(attrs, "subnet").at(TYPE, "create", "config")?),
            primary_ip,
            security_groups: string_list(attrs, "security_groups")
                .into_iter()
                .map(Identity::new)
                .collect(),
            allow_ip_spoofing: optional_bool(attrs, "allow_ip_spoofing"),
            auto_delete: optional_bool(attrs, "auto_delete"),
            enable_infrastructure_nat: optional_bool(attrs, "enable_infrastructure_nat"),
            protocol_state_filtering_mode: optional_str(attrs, "protocol_state_filtering_mode"),
            resource_group: optional_str(attrs, "resource_group").map(Identity::new),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let vni: VirtualNetworkInterface = self
            .vpc
            .post("/virtual_network_interfaces", &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("created virtual network interface {} ({})", vni.name, vni.id);

        let path = format!("/virtual_network_interfaces/{}", vni.id);
        self.wait(&VNI_AVAILABLE, timeout, || async {
            observe(
                self.vpc.get::<VirtualNetworkInterface>(&path).await,
                |v| v.lifecycle_state,
            )
        })
        .await
        .at(TYPE, "create", "wait-available")?;

        let vni: VirtualNetworkInterface = self.vpc.get(&path).await.at(TYPE, "create", "get")?;
        self.write_tags(&vni.crn, None, attrs).await;
        self.vni_state(resource, vni).await
    }

    pub(crate) async fn read_virtual_network_interface(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let path = format!("/virtual_network_interfaces/{}", identifier);
        match self.vpc.get::<VirtualNetworkInterface>(&path).await {
            Ok(vni) => self.vni_state(resource, vni).await,
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn update_virtual_network_interface(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let path = format!("/virtual_network_interfaces/{}", identifier);
        let timeout = operation_timeout(attrs, "update")?;
        let changed_bool = |key: &str| {
            optional_bool(attrs, key)
                .filter(|v| from.attributes.get(key).and_then(|old| old.as_bool()) != Some(*v))
        };
        let changed_str =
            |key: &str| optional_str(attrs, key).filter(|v| Some(v.as_str()) != from.get_str(key));

        let patch = VirtualNetworkInterfacePatch {
            name: changed_str("name"),
            allow_ip_spoofing: changed_bool("allow_ip_spoofing"),
            auto_delete: changed_bool("auto_delete"),
            enable_infrastructure_nat: changed_bool("enable_infrastructure_nat"),
            protocol_state_filtering_mode: changed_str("protocol_state_filtering_mode"),
        };
        if !patch.is_empty() {
            let _: VirtualNetworkInterface = self
                .vpc
                .patch(&path, &patch)
                .await
                .at(TYPE, "update", "patch")?;
        }

        if attrs.contains_key("security_groups") {
            let old: BTreeSet<String> = string_list(&from.attributes, "security_groups")
                .into_iter()
                .collect();
            let new: BTreeSet<String> = string_list(attrs, "security_groups").into_iter().collect();
            if old != new {
                let _guard = self.locks.lock(security_group_target_key(identifier)).await;
                for sg in new.difference(&old) {
                    self.vpc
                        .put_empty(&format!("/security_groups/{}/targets/{}", sg, identifier))
                        .await
                        .at(TYPE, "update", "bind-security-group")?;
                }
                for sg in old.difference(&new) {
                    ignore_not_found(
                        self.vpc
                            .delete(&format!("/security_groups/{}/targets/{}", sg, identifier))
                            .await,
                    )
                    .at(TYPE, "update", "unbind-security-group")?;
                }
                self.wait(&VNI_TARGET_STABLE, timeout, || async {
                    observe(
                        self.vpc.get::<VirtualNetworkInterface>(&path).await,
                        |v| v.lifecycle_state,
                    )
                })
                .await
                .at(TYPE, "update", "wait-stable")?;
            }
        }

        let vni: VirtualNetworkInterface = self.vpc.get(&path).await.at(TYPE, "update", "get")?;
        self.write_tags(&vni.crn, Some(&from.attributes), attrs).await;
        self.vni_state(to, vni).await
    }

    pub(crate) async fn delete_virtual_network_interface(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let path = format!("/virtual_network_interfaces/{}", identifier);
        ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;

        self.wait(&VNI_DELETED, timeout, || async {
            observe(
                self.vpc.get::<VirtualNetworkInterface>(&path).await,
                |v| v.lifecycle_state,
            )
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("deleted virtual network interface {}", identifier);
        Ok(())
    }

    async fn vni_state(
        &self,
        resource: &Resource,
        vni: VirtualNetworkInterface,
    ) -> ProviderResult<State> {
        let mut attrs = flatten_virtual_network_interface(&vni);
        keep_config(&mut attrs, resource, WRITE_ONLY);
        self.read_tags_into(&vni.crn, &mut attrs).await;
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(vni.id))
    }
}

#[cfg(test)]
mod tests {
    use crate::provider::testing::{provider, until_hits};
    use crate::utils::DEFAULT_TIMEOUT;
    use httpmock::prelude::*;
    use isvpc_core::resource::{Resource, State, Value};
    use serde_json::{Value as Json, json};
    use std::collections::HashMap;

    fn vni_json(lifecycle_state: &str, security_groups: &[&str]) -> Json {
        json!({
            "id": "0717-vni",
            "name": "app-vni",
            "crn": "crn:v1:bluemix:public:is:us-south-1:a/123::virtual-network-interface:0717-vni",
            "lifecycle_state": lifecycle_state,
            "allow_ip_spoofing": false,
            "auto_delete": false,
            "enable_infrastructure_nat": true,
            "primary_ip": {"id": "0717-rip", "address": "10.240.0.6", "name": "app-ip"},
            "subnet": {"id": "0717-subnet"},
            "vpc": {"id": "r006-vpc"},
            "zone": {"name": "us-south-1"},
            "security_groups": security_groups
                .iter()
                .map(|id| json!({"id": id}))
                .collect::<Vec<_>>()
        })
    }

    fn groups(ids: &[&str]) -> Value {
        Value::List(ids.iter().map(|id| Value::String(id.to_string())).collect())
    }

    fn desired() -> Resource {
        Resource::new("is_virtual_network_interface", "app")
            .with_attribute("name", "app-vni")
            .with_attribute("subnet", "0717-subnet")
            .with_attribute("primary_ip_address", "10.240.0.6")
    }

    #[tokio::test]
    async fn create_with_primary_address() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/virtual_network_interfaces").json_body(json!({
                    "name": "app-vni",
                    "subnet": {"id": "0717-subnet"},
                    "primary_ip": {"address": "10.240.0.6"}
                }));
                then.status(201).json_body(vni_json("pending", &["r006-default"]));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/virtual_network_interfaces/0717-vni");
                then.status(200).json_body(vni_json("stable", &["r006-default"]));
            })
            .await;

        let state = provider(&server)
            .create_virtual_network_interface(&desired())
            .await
            .unwrap();
        post.assert_async().await;
        assert_eq!(state.get_str("primary_ip_id"), Some("0717-rip"));
        assert_eq!(state.attributes.get("security_groups"), Some(&groups(&["r006-default"])));
    }

    #[tokio::test]
    async fn update_rebinds_security_groups() {
        let server = MockServer::start_async().await;
        let bind = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path("/v1/security_groups/r006-new/targets/0717-vni");
                then.status(201);
            })
            .await;
        let unbind = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path("/v1/security_groups/r006-old/targets/0717-vni");
                then.status(204);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/virtual_network_interfaces/0717-vni");
                then.status(200).json_body(vni_json("stable", &["r006-new"]));
            })
            .await;

        let mut from_attrs = HashMap::new();
        from_attrs.insert("name".to_string(), Value::String("app-vni".into()));
        from_attrs.insert("security_groups".to_string(), groups(&["r006-old"]));
        let from = State::existing(desired().id, from_attrs).with_identifier("0717-vni");

        let provider = provider(&server);
        let state = provider
            .update_virtual_network_interface(
                "0717-vni",
                &from,
                &desired().with_attribute("security_groups", groups(&["r006-new"])),
            )
            .await
            .unwrap();
        bind.assert_async().await;
        unbind.assert_async().await;
        assert_eq!(state.attributes.get("security_groups"), Some(&groups(&["r006-new"])));
        assert!(provider.locks.is_empty());
    }

    #[tokio::test]
    async fn delete_waits_through_deleting() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/virtual_network_interfaces/0717-vni");
                then.status(202);
            })
            .await;
        let mut deleting = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/virtual_network_interfaces/0717-vni");
                then.status(200).json_body(vni_json("deleting", &[]));
            })
            .await;

        let provider = provider(&server);
        let scenario = async {
            until_hits(&deleting, 2).await;
            server
                .mock_async(|when, then| {
                    when.method(GET).path("/v1/virtual_network_interfaces/0717-vni");
                    then.status(404);
                })
                .await;
            deleting.delete_async().await;
        };

        let (result, ()) = tokio::join!(
            provider.delete_virtual_network_interface("0717-vni", DEFAULT_TIMEOUT),
            scenario
        );
        result.unwrap();
    }
}
