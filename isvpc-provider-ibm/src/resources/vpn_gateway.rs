//! `is_vpn_gateway_advertised_cidr`
//!
//! The CIDR itself is the child identifier, so `<gateway>/<cidr>` is split at
//! the first `/` only.

use std::time::Duration;

use isvpc_core::composite_id::{make_slash_id, split_parent_id};
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};
use isvpc_core::waiter::Observation;

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_advertised_cidr;
use crate::provider::IbmProvider;
use crate::utils::{encode_path_segment, keep_config, required_str};
use crate::waiters::ADVERTISED_CIDR_DELETED;

const TYPE: &str = "is_vpn_gateway_advertised_cidr";

fn advertised_cidr_path(gateway: &str, cidr: &str) -> String {
    format!(
        "/vpn_gateways/{}/advertised_cidrs/{}",
        gateway,
        encode_path_segment(cidr)
    )
}

impl IbmProvider {
    pub(crate) async fn create_advertised_cidr(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let gateway = required_str(attrs, "vpn_gateway").at(TYPE, "create", "config")?;
        let cidr = required_str(attrs, "cidr").at(TYPE, "create", "config")?;

        self.vpc
            .put_empty(&advertised_cidr_path(gateway, cidr))
            .await
            .at(TYPE, "create", "put")?;
        log::info!("advertising {} on VPN gateway {}", cidr, gateway);

        Ok(advertised_cidr_state(resource, gateway, cidr))
    }

    pub(crate) async fn read_advertised_cidr(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let (gateway, cidr) = split_parent_id(identifier).at(TYPE, "read", "parse-id")?;
        let exists = self
            .vpc
            .exists(&advertised_cidr_path(&gateway, &cidr))
            .await
            .at(TYPE, "read", "get")?;
        if exists {
            Ok(advertised_cidr_state(resource, &gateway, &cidr))
        } else {
            Ok(State::not_found(resource.id.clone()))
        }
    }

    /// Both attributes force replacement
    pub(crate) async fn update_advertised_cidr(
        &self,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        self.read_advertised_cidr(to, identifier).await
    }

    pub(crate) async fn delete_advertised_cidr(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let (gateway, cidr) = split_parent_id(identifier).at(TYPE, "delete", "parse-id")?;
        let path = advertised_cidr_path(&gateway, &cidr);
        ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;

        self.wait(&ADVERTISED_CIDR_DELETED, timeout, || async {
            match self.vpc.exists(&path).await {
                Ok(true) => Ok(Observation::status("deleting")),
                Ok(false) => Ok(Observation::NotFound),
                Err(e) => Err(ProviderError::from(e)),
            }
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("stopped advertising {} on VPN gateway {}", cidr, gateway);
        Ok(())
    }
}

fn advertised_cidr_state(resource: &Resource, gateway: &str, cidr: &str) -> State {
    let mut attrs = flatten_advertised_cidr(gateway, cidr);
    keep_config(&mut attrs, resource, &["timeouts"]);
    State::existing(resource.id.clone(), attrs).with_identifier(make_slash_id(gateway, cidr))
}

#[cfg(test)]
mod tests {
    use crate::provider::testing::{provider, until_hits};
    use crate::utils::DEFAULT_TIMEOUT;
    use httpmock::prelude::*;
    use isvpc_core::resource::Resource;

    fn desired() -> Resource {
        Resource::new("is_vpn_gateway_advertised_cidr", "onprem")
            .with_attribute("vpn_gateway", "r006-vpngw")
            .with_attribute("cidr", "10.45.0.0/24")
    }

    #[tokio::test]
    async fn create_and_read() {
        let server = MockServer::start_async().await;
        let put = server
            .mock_async(|when, then| {
                when.method(PUT)
                    .path_contains("/v1/vpn_gateways/r006-vpngw/advertised_cidrs/10.45.0.0");
                then.status(201);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_contains("/v1/vpn_gateways/r006-vpngw/advertised_cidrs/10.45.0.0");
                then.status(204);
            })
            .await;

        let provider = provider(&server);
        let created = provider.create_advertised_cidr(&desired()).await.unwrap();
        put.assert_async().await;
        assert_eq!(created.identifier.as_deref(), Some("r006-vpngw/10.45.0.0/24"));

        let read = provider
            .read_advertised_cidr(&desired(), "r006-vpngw/10.45.0.0/24")
            .await
            .unwrap();
        assert!(read.exists);
        assert_eq!(read.get_str("cidr"), Some("10.45.0.0/24"));
    }

    #[tokio::test]
    async fn read_404_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_contains("/v1/vpn_gateways/r006-vpngw/advertised_cidrs/");
                then.status(404);
            })
            .await;

        let state = provider(&server)
            .read_advertised_cidr(&desired(), "r006-vpngw/10.45.0.0/24")
            .await
            .unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn delete_waits_until_absent() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE)
                    .path_contains("/v1/vpn_gateways/r006-vpngw/advertised_cidrs/");
                then.status(202);
            })
            .await;
        let mut present = server
            .mock_async(|when, then| {
                when.method(GET)
                    .path_contains("/v1/vpn_gateways/r006-vpngw/advertised_cidrs/");
                then.status(204);
            })
            .await;

        let provider = provider(&server);
        let scenario = async {
            until_hits(&present, 2).await;
            server
                .mock_async(|when, then| {
                    when.method(GET)
                        .path_contains("/v1/vpn_gateways/r006-vpngw/advertised_cidrs/");
                    then.status(404);
                })
                .await;
            present.delete_async().await;
        };

        let (result, ()) = tokio::join!(
            provider.delete_advertised_cidr("r006-vpngw/10.45.0.0/24", DEFAULT_TIMEOUT),
            scenario
        );
        result.unwrap();
        delete.assert_async().await;
    }
}
