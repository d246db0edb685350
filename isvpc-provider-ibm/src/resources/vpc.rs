//! `is_vpc`

use std::time::Duration;

use isvpc_core::provider::{ErrorKind, ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_vpc;
use crate::models::Identity;
use crate::models::vpc::{Vpc, VpcPatch, VpcPrototype};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, optional_bool, optional_str, required_str};
use crate::waiters::{VPC_AVAILABLE, VPC_DELETED, observe};

const TYPE: &str = "is_vpc";

/// Accepted at create time only, never returned by the API
const WRITE_ONLY: &[&str] = &["address_prefix_management", "timeouts"];

impl IbmProvider {
    pub(crate) async fn create_vpc(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let body = VpcPrototype {
            name: Some(required_str(attrs, "name").at(TYPE, "create", "config")?.to_string()),
            address_prefix_management: optional_str(attrs, "address_prefix_management"),
            classic_access: optional_bool(attrs, "classic_access"),
            resource_group: optional_str(attrs, "resource_group").map(Identity::new),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let vpc: Vpc = self.vpc.post("/vpcs", &body).await.at(TYPE, "create", "post")?;
        log::info!("created VPC {} ({})", vpc.name, vpc.id);

        let vpc = self
            .wait_vpc_available(&vpc.id, timeout)
            .await
            .at(TYPE, "create", "wait-available")?;
        self.write_tags(&vpc.crn, None, attrs).await;

        self.vpc_state(resource, vpc).await
    }

    pub(crate) async fn read_vpc(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        match self.vpc.get::<Vpc>(&format!("/vpcs/{}", identifier)).await {
            Ok(vpc) => self.vpc_state(resource, vpc).await,
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    /// Data source: find a VPC by name
    pub(crate) async fn lookup_vpc(&self, resource: &Resource) -> ProviderResult<State> {
        let name = required_str(&resource.attributes, "name").at(TYPE, "lookup", "config")?;
        let vpcs: Vec<Vpc> = self
            .vpc
            .list_all("/vpcs", "vpcs", &[])
            .await
            .at(TYPE, "lookup", "list")?;
        match vpcs.into_iter().find(|v| v.name == name) {
            Some(vpc) => self.vpc_state(resource, vpc).await,
            None => Err(no_match(TYPE, name)),
        }
    }

    pub(crate) async fn update_vpc(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let path = format!("/vpcs/{}", identifier);
        let name = optional_str(attrs, "name");

        let vpc: Vpc = if name.is_some() && name.as_deref() != from.get_str("name") {
            self.vpc
                .patch(&path, &VpcPatch { name })
                .await
                .at(TYPE, "update", "patch")?
        } else {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        };
        self.write_tags(&vpc.crn, Some(&from.attributes), attrs).await;

        self.vpc_state(to, vpc).await
    }

    pub(crate) async fn delete_vpc(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let path = format!("/vpcs/{}", identifier);
        ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;

        self.wait(&VPC_DELETED, timeout, || async {
            observe(self.vpc.get::<Vpc>(&path).await, |v| v.status)
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("deleted VPC {}", identifier);
        Ok(())
    }

    async fn wait_vpc_available(
        &self,
        id: &str,
        timeout: Duration,
    ) -> ProviderResult<Vpc> {
        let path = format!("/vpcs/{}", id);
        self.wait(&VPC_AVAILABLE, timeout, || async {
            observe(self.vpc.get::<Vpc>(&path).await, |v| v.status)
        })
        .await?;
        Ok(self.vpc.get(&path).await?)
    }

    async fn vpc_state(&self, resource: &Resource, vpc: Vpc) -> ProviderResult<State> {
        let mut attrs = flatten_vpc(&vpc);
        keep_config(&mut attrs, resource, WRITE_ONLY);
        self.read_tags_into(&vpc.crn, &mut attrs).await;
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(vpc.id))
    }
}

/// Error for a data source lookup without a match
pub(crate) fn no_match(resource_type: &str, name: &str) -> ProviderError {
    ProviderError::new(format!("no {} named '{}' found", resource_type, name))
        .with_kind(ErrorKind::NotFound)
        .at_step(resource_type, "lookup", "match")
}

#[cfg(test)]
mod tests {
    use crate::provider::testing::provider;
    use crate::utils::DEFAULT_TIMEOUT;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use isvpc_core::provider::ErrorKind;
    use isvpc_core::resource::{Resource, State, Value};
    use serde_json::{Value as Json, json};

    fn vpc_json(status: &str) -> Json {
        json!({
            "id": "r006-vpc",
            "name": "prod-vpc",
            "crn": "crn:v1:bluemix:public:is:us-south:a/123::vpc:r006-vpc",
            "status": status,
            "classic_access": false,
            "default_network_acl": {"id": "r006-acl"},
            "default_security_group": {"id": "r006-sg"},
            "default_routing_table": {"id": "r006-rt"}
        })
    }

    fn desired() -> Resource {
        Resource::new("is_vpc", "main")
            .with_attribute("name", "prod-vpc")
            .with_attribute("address_prefix_management", "manual")
    }

    #[tokio::test]
    async fn create_posts_and_waits_for_available() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/vpcs").json_body(json!({
                    "name": "prod-vpc",
                    "address_prefix_management": "manual"
                }));
                then.status(201).json_body(vpc_json("pending"));
            })
            .await;
        let get = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/vpcs/r006-vpc");
                then.status(200).json_body(vpc_json("available"));
            })
            .await;

        let provider = provider(&server);
        let state = provider.create_vpc(&desired()).await.unwrap();

        post.assert_async().await;
        assert!(get.hits_async().await >= 2);
        assert_eq!(state.identifier.as_deref(), Some("r006-vpc"));
        assert_eq!(state.get_str("status"), Some("available"));
        assert_eq!(state.get_str("default_security_group"), Some("r006-sg"));
        assert_eq!(state.get_str("address_prefix_management"), Some("manual"));
    }

    #[tokio::test]
    async fn create_fails_on_failed_status() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/vpcs");
                then.status(201).json_body(vpc_json("pending"));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/vpcs/r006-vpc");
                then.status(200).json_body(vpc_json("failed"));
            })
            .await;

        let err = provider(&server).create_vpc(&desired()).await.unwrap_err();
        assert!(err.message.contains("failed"));
        assert_eq!(err.labels.unwrap().step.as_deref(), Some("wait-available"));
    }

    #[tokio::test]
    async fn read_404_is_not_found() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/vpcs/r006-gone");
                then.status(404).json_body(json!({
                    "errors": [{"code": "not_found", "message": "VPC not found"}]
                }));
            })
            .await;

        let state = provider(&server)
            .read_vpc(&desired(), "r006-gone")
            .await
            .unwrap();
        assert!(!state.exists);
        assert!(state.identifier.is_none());
    }

    #[tokio::test]
    async fn update_patches_changed_name() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/v1/vpcs/r006-vpc")
                    .json_body(json!({"name": "prod-vpc"}));
                then.status(200).json_body(vpc_json("available"));
            })
            .await;

        let mut from_attrs = std::collections::HashMap::new();
        from_attrs.insert("name".to_string(), Value::String("old-name".to_string()));
        let from = State::existing(desired().id, from_attrs).with_identifier("r006-vpc");

        let state = provider(&server)
            .update_vpc("r006-vpc", &from, &desired())
            .await
            .unwrap();
        patch.assert_async().await;
        assert_eq!(state.get_str("name"), Some("prod-vpc"));
    }

    #[tokio::test]
    async fn delete_waits_until_gone() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/vpcs/r006-vpc");
                then.status(204);
            })
            .await;
        let gone = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/vpcs/r006-vpc");
                then.status(404);
            })
            .await;

        provider(&server).delete_vpc("r006-vpc", DEFAULT_TIMEOUT).await.unwrap();
        delete.assert_async().await;
        gone.assert_async().await;
    }

    #[tokio::test]
    async fn lookup_by_name() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/vpcs");
                then.status(200).json_body(json!({"vpcs": [vpc_json("available")]}));
            })
            .await;

        let provider = provider(&server);
        let found = provider
            .lookup_vpc(
                &Resource::new("is_vpc", "existing")
                    .with_attribute("name", "prod-vpc")
                    .with_read_only(true),
            )
            .await
            .unwrap();
        assert_eq!(found.identifier.as_deref(), Some("r006-vpc"));

        let missing = provider
            .lookup_vpc(
                &Resource::new("is_vpc", "other")
                    .with_attribute("name", "nope")
                    .with_read_only(true),
            )
            .await
            .unwrap_err();
        assert_eq!(missing.kind, ErrorKind::NotFound);
    }
}
