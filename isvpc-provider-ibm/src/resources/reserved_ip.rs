//! `is_subnet_reserved_ip`

use isvpc_core::composite_id::{id_parts, make_slash_id};
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_reserved_ip;
use crate::models::Identity;
use crate::models::reserved_ip::{ReservedIp, ReservedIpPatch, ReservedIpPrototype};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, optional_bool, optional_str, required_str};
use crate::waiters::{RESERVED_IP_READY, observe, stable_or_pending};

const TYPE: &str = "is_subnet_reserved_ip";

fn reserved_ip_path(subnet: &str, id: &str) -> String {
    format!("/subnets/{}/reserved_ips/{}", subnet, id)
}

impl IbmProvider {
    pub(crate) async fn create_reserved_ip(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let subnet = required_str(attrs, "subnet").at(TYPE, "create", "config")?;
        let body = ReservedIpPrototype {
            name: optional_str(attrs, "name"),
            address: optional_str(attrs, "address"),
            auto_delete: optional_bool(attrs, "auto_delete"),
            target: optional_str(attrs, "target").map(Identity::new),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let rip: ReservedIp = self
            .vpc
            .post(&format!("/subnets/{}/reserved_ips", subnet), &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("reserved {} in subnet {} ({})", rip.address, subnet, rip.id);

        let path = reserved_ip_path(subnet, &rip.id);
        self.wait(&RESERVED_IP_READY, timeout, || async {
            observe(self.vpc.get::<ReservedIp>(&path).await, |r| {
                stable_or_pending(r.lifecycle_state.as_deref().unwrap_or_default())
            })
        })
        .await
        .at(TYPE, "create", "wait-available")?;

        let rip: ReservedIp = self.vpc.get(&path).await.at(TYPE, "create", "get")?;
        Ok(reserved_ip_state(resource, subnet, &rip))
    }

    pub(crate) async fn read_reserved_ip(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "read", "parse-id")?;
        match self
            .vpc
            .get::<ReservedIp>(&reserved_ip_path(&parts[0], &parts[1]))
            .await
        {
            Ok(rip) => Ok(reserved_ip_state(resource, &parts[0], &rip)),
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn update_reserved_ip(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let parts = id_parts(identifier, 2).at(TYPE, "update", "parse-id")?;
        let path = reserved_ip_path(&parts[0], &parts[1]);
        let attrs = &to.attributes;

        let patch = ReservedIpPatch {
            name: optional_str(attrs, "name").filter(|n| Some(n.as_str()) != from.get_str("name")),
            auto_delete: optional_bool(attrs, "auto_delete").filter(|a| {
                from.attributes.get("auto_delete").and_then(|v| v.as_bool()) != Some(*a)
            }),
        };
        let rip: ReservedIp = if patch.is_empty() {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        } else {
            self.vpc
                .patch(&path, &patch)
                .await
                .at(TYPE, "update", "patch")?
        };
        Ok(reserved_ip_state(to, &parts[0], &rip))
    }

    pub(crate) async fn delete_reserved_ip(&self, identifier: &str) -> ProviderResult<()> {
        let parts = id_parts(identifier, 2).at(TYPE, "delete", "parse-id")?;
        ignore_not_found(
            self.vpc
                .delete(&reserved_ip_path(&parts[0], &parts[1]))
                .await,
        )
        .at(TYPE, "delete", "delete")?;
        log::info!("released reserved IP {}", identifier);
        Ok(())
    }
}

fn reserved_ip_state(resource: &Resource, subnet: &str, rip: &ReservedIp) -> State {
    let mut attrs = flatten_reserved_ip(subnet, rip);
    keep_config(&mut attrs, resource, &["timeouts"]);
    State::existing(resource.id.clone(), attrs).with_identifier(make_slash_id(subnet, &rip.id))
}

#[cfg(test)]
mod tests {
    use crate::provider::testing::provider;
    use httpmock::prelude::*;
    use isvpc_core::provider::ErrorKind;
    use isvpc_core::resource::{Resource, Value};
    use serde_json::{Value as Json, json};

    fn rip_json(lifecycle_state: &str) -> Json {
        json!({
            "id": "0717-rip",
            "name": "db-ip",
            "address": "10.240.0.10",
            "auto_delete": false,
            "owner": "user",
            "lifecycle_state": lifecycle_state,
            "target": {
                "resource_type": "endpoint_gateway",
                "id": "r006-eg",
                "name": "cos-gateway"
            }
        })
    }

    fn desired() -> Resource {
        Resource::new("is_subnet_reserved_ip", "db")
            .with_attribute("subnet", "0717-subnet")
            .with_attribute("name", "db-ip")
            .with_attribute("address", "10.240.0.10")
    }

    #[tokio::test]
    async fn create_waits_until_stable() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/subnets/0717-subnet/reserved_ips")
                    .json_body(json!({"name": "db-ip", "address": "10.240.0.10"}));
                then.status(201).json_body(rip_json("pending"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/subnets/0717-subnet/reserved_ips/0717-rip");
                then.status(200).json_body(rip_json("stable"));
            })
            .await;

        let state = provider(&server).create_reserved_ip(&desired()).await.unwrap();
        post.assert_async().await;
        assert_eq!(state.identifier.as_deref(), Some("0717-subnet/0717-rip"));
        assert_eq!(state.get_str("target"), Some("r006-eg"));
        match state.attributes.get("target_reference") {
            Some(Value::Map(target)) => assert_eq!(
                target.get("resource_type"),
                Some(&Value::String("endpoint_gateway".into()))
            ),
            other => panic!("unexpected target_reference {:?}", other),
        }
    }

    #[tokio::test]
    async fn failed_reservation_is_an_error() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/subnets/0717-subnet/reserved_ips");
                then.status(201).json_body(rip_json("pending"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path("/v1/subnets/0717-subnet/reserved_ips/0717-rip");
                then.status(200).json_body(rip_json("failed"));
            })
            .await;

        let err = provider(&server)
            .create_reserved_ip(&desired())
            .await
            .unwrap_err();
        assert!(err.message.contains("failed"));
    }

    #[tokio::test]
    async fn malformed_identifier_is_a_state_error() {
        let server = MockServer::start_async().await;
        let err = provider(&server)
            .delete_reserved_ip("0717-rip")
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::State);
    }
}
