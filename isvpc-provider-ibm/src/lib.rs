//! IBM Cloud VPC provider for isvpc
//!
//! ## Module Structure
//!
//! - `client` - VPC REST, IAM token, and global tagging clients
//! - `models` - Typed API payloads
//! - `flatten` - Model to attribute-map conversion
//! - `resources` - Resource type definitions and CRUD handlers
//! - `schemas` - Attribute schemas per resource type
//! - `waiters` - Wait conditions per call site

pub mod client;
pub mod config;
pub mod flatten;
pub mod models;
pub mod provider;
pub mod resources;
pub mod schemas;
pub mod utils;
pub mod waiters;

pub use config::{ConfigError, ProviderConfig};
pub use provider::IbmProvider;

use isvpc_core::provider::{
    BoxFuture, ErrorKind, Provider, ProviderError, ProviderResult, ResourceType,
};
use isvpc_core::resource::{Resource, ResourceId, State};

use resources::resource_types;
use utils::operation_timeout;

fn unknown_type(resource_type: &str) -> ProviderError {
    ProviderError::new(format!("Unknown resource type: {}", resource_type))
        .with_kind(ErrorKind::Validation)
}

impl IbmProvider {
    async fn read_resource(
        &self,
        resource: &Resource,
        identifier: Option<&str>,
    ) -> ProviderResult<State> {
        let resource_type = resource.id.resource_type.as_str();
        let Some(identifier) = identifier else {
            if !resource.is_data_source() {
                return Ok(State::not_found(resource.id.clone()));
            }
            return match resource_type {
                "is_vpc" => self.lookup_vpc(resource).await,
                "is_subnet" => self.lookup_subnet(resource).await,
                "is_public_gateway" => self.lookup_public_gateway(resource).await,
                "is_security_group" => self.lookup_security_group(resource).await,
                other => Err(ProviderError::validation(format!(
                    "{} cannot be used as a data source",
                    other
                ))),
            };
        };

        match resource_type {
            "is_vpc" => self.read_vpc(resource, identifier).await,
            "is_vpc_address_prefix" => self.read_address_prefix(resource, identifier).await,
            "is_subnet" => self.read_subnet(resource, identifier).await,
            "is_subnet_reserved_ip" => self.read_reserved_ip(resource, identifier).await,
            "is_public_gateway" => self.read_public_gateway(resource, identifier).await,
            "is_subnet_public_gateway_attachment" => {
                self.read_public_gateway_attachment(resource, identifier)
                    .await
            }
            "is_security_group" => self.read_security_group(resource, identifier).await,
            "is_security_group_rule" => self.read_security_group_rule(resource, identifier).await,
            "is_security_group_target" => {
                self.read_security_group_target(resource, identifier).await
            }
            "is_virtual_network_interface" => {
                self.read_virtual_network_interface(resource, identifier)
                    .await
            }
            "is_flow_log" => self.read_flow_log(resource, identifier).await,
            "is_virtual_endpoint_gateway_resource_binding" => {
                self.read_resource_binding(resource, identifier).await
            }
            "is_vpn_gateway_advertised_cidr" => {
                self.read_advertised_cidr(resource, identifier).await
            }
            other => Err(unknown_type(other)),
        }
    }

    async fn create_resource(&self, resource: &Resource) -> ProviderResult<State> {
        match resource.id.resource_type.as_str() {
            "is_vpc" => self.create_vpc(resource).await,
            "is_vpc_address_prefix" => self.create_address_prefix(resource).await,
            "is_subnet" => self.create_subnet(resource).await,
            "is_subnet_reserved_ip" => self.create_reserved_ip(resource).await,
            "is_public_gateway" => self.create_public_gateway(resource).await,
            "is_subnet_public_gateway_attachment" => {
                self.create_public_gateway_attachment(resource).await
            }
            "is_security_group" => self.create_security_group(resource).await,
            "is_security_group_rule" => self.create_security_group_rule(resource).await,
            "is_security_group_target" => self.create_security_group_target(resource).await,
            "is_virtual_network_interface" => {
                self.create_virtual_network_interface(resource).await
            }
            "is_flow_log" => self.create_flow_log(resource).await,
            "is_virtual_endpoint_gateway_resource_binding" => {
                self.create_resource_binding(resource).await
            }
            "is_vpn_gateway_advertised_cidr" => self.create_advertised_cidr(resource).await,
            other => Err(unknown_type(other)),
        }
    }

    async fn update_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        match id.resource_type.as_str() {
            "is_vpc" => self.update_vpc(identifier, from, to).await,
            "is_vpc_address_prefix" => self.update_address_prefix(identifier, from, to).await,
            "is_subnet" => self.update_subnet(identifier, from, to).await,
            "is_subnet_reserved_ip" => self.update_reserved_ip(identifier, from, to).await,
            "is_public_gateway" => self.update_public_gateway(identifier, from, to).await,
            "is_subnet_public_gateway_attachment" => {
                self.update_public_gateway_attachment(identifier, from, to)
                    .await
            }
            "is_security_group" => self.update_security_group(identifier, from, to).await,
            "is_security_group_rule" => {
                self.update_security_group_rule(identifier, from, to).await
            }
            "is_security_group_target" => {
                self.update_security_group_target(identifier, from, to)
                    .await
            }
            "is_virtual_network_interface" => {
                self.update_virtual_network_interface(identifier, from, to)
                    .await
            }
            "is_flow_log" => self.update_flow_log(identifier, from, to).await,
            "is_virtual_endpoint_gateway_resource_binding" => {
                self.update_resource_binding(identifier, from, to).await
            }
            "is_vpn_gateway_advertised_cidr" => {
                self.update_advertised_cidr(identifier, from, to).await
            }
            other => Err(unknown_type(other)),
        }
    }

    /// `timeouts.delete` is taken from the last recorded state
    async fn delete_resource(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> ProviderResult<()> {
        let timeout = operation_timeout(&from.attributes, "delete")?;
        match id.resource_type.as_str() {
            "is_vpc" => self.delete_vpc(identifier, timeout).await,
            "is_vpc_address_prefix" => self.delete_address_prefix(identifier).await,
            "is_subnet" => self.delete_subnet(identifier, timeout).await,
            "is_subnet_reserved_ip" => self.delete_reserved_ip(identifier).await,
            "is_public_gateway" => self.delete_public_gateway(identifier, timeout).await,
            "is_subnet_public_gateway_attachment" => {
                self.delete_public_gateway_attachment(identifier, timeout).await
            }
            "is_security_group" => self.delete_security_group(identifier).await,
            "is_security_group_rule" => self.delete_security_group_rule(identifier).await,
            "is_security_group_target" => {
                self.delete_security_group_target(identifier, timeout).await
            }
            "is_virtual_network_interface" => {
                self.delete_virtual_network_interface(identifier, timeout).await
            }
            "is_flow_log" => self.delete_flow_log(identifier, timeout).await,
            "is_virtual_endpoint_gateway_resource_binding" => {
                self.delete_resource_binding(identifier, timeout).await
            }
            "is_vpn_gateway_advertised_cidr" => {
                self.delete_advertised_cidr(identifier, timeout).await
            }
            other => Err(unknown_type(other)),
        }
    }
}

// =============================================================================
// Provider Trait Implementation
// =============================================================================

impl Provider for IbmProvider {
    fn name(&self) -> &'static str {
        "ibm"
    }

    fn resource_types(&self) -> Vec<Box<dyn ResourceType>> {
        resource_types()
    }

    fn read(
        &self,
        resource: &Resource,
        identifier: Option<&str>,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        let identifier = identifier.map(|s| s.to_string());
        Box::pin(async move {
            self.read_resource(&resource, identifier.as_deref())
                .await
                .map_err(|e| e.for_resource(resource.id.clone()))
        })
    }

    fn create(&self, resource: &Resource) -> BoxFuture<'_, ProviderResult<State>> {
        let resource = resource.clone();
        Box::pin(async move {
            self.create_resource(&resource)
                .await
                .map_err(|e| e.for_resource(resource.id.clone()))
        })
    }

    fn update(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> BoxFuture<'_, ProviderResult<State>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        let to = to.clone();
        Box::pin(async move {
            self.update_resource(&id, &identifier, &from, &to)
                .await
                .map_err(|e| e.for_resource(id.clone()))
        })
    }

    fn delete(
        &self,
        id: &ResourceId,
        identifier: &str,
        from: &State,
    ) -> BoxFuture<'_, ProviderResult<()>> {
        let id = id.clone();
        let identifier = identifier.to_string();
        let from = from.clone();
        Box::pin(async move {
            self.delete_resource(&id, &identifier, &from)
                .await
                .map_err(|e| e.for_resource(id.clone()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::testing::provider;
    use httpmock::prelude::*;
    use isvpc_core::resource::Value;
    use serde_json::json;
    use std::collections::HashMap;
    use std::time::{Duration, Instant};

    #[tokio::test]
    async fn managed_resource_without_identifier_is_not_found() {
        let server = MockServer::start_async().await;
        let provider = provider(&server);
        let state = Provider::read(
            &provider,
            &Resource::new("is_subnet", "web").with_attribute("name", "web"),
            None,
        )
        .await
        .unwrap();
        assert!(!state.exists);
    }

    #[tokio::test]
    async fn data_source_is_looked_up_by_name() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/security_groups");
                then.status(200).json_body(json!({"security_groups": [{
                    "id": "r006-sg",
                    "name": "default-sg",
                    "crn": "crn:v1:sg:r006-sg",
                    "vpc": {"id": "r006-vpc"}
                }]}));
            })
            .await;

        let provider = provider(&server);
        let state = Provider::read(
            &provider,
            &Resource::new("is_security_group", "default")
                .with_attribute("name", "default-sg")
                .with_read_only(true),
            None,
        )
        .await
        .unwrap();
        assert_eq!(state.identifier.as_deref(), Some("r006-sg"));

        let err = Provider::read(
            &provider,
            &Resource::new("is_flow_log", "logs")
                .with_attribute("name", "x")
                .with_read_only(true),
            None,
        )
        .await
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }

    #[tokio::test]
    async fn errors_carry_resource_and_labels() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/vpcs/r006-vpc");
                then.status(500).json_body(json!({
                    "errors": [{"code": "internal_error", "message": "try again"}],
                    "trace": "abc"
                }));
            })
            .await;

        let provider = provider(&server);
        let resource = Resource::new("is_vpc", "main").with_attribute("name", "prod");
        let err = Provider::read(&provider, &resource, Some("r006-vpc"))
            .await
            .unwrap_err();
        assert_eq!(err.resource_id, Some(resource.id.clone()));
        let rendered = err.to_string();
        assert!(rendered.contains("try again"));
        assert!(rendered.contains("is_vpc/read/get"));
    }

    #[tokio::test]
    async fn unknown_types_are_rejected() {
        let server = MockServer::start_async().await;
        let provider = provider(&server);
        let id = ResourceId::new("is_instance", "vm");
        let err = Provider::delete(&provider, &id, "x", &State::not_found(id.clone()))
            .await
            .unwrap_err();
        assert!(err.message.contains("Unknown resource type"));
        assert_eq!(Provider::name(&provider), "ibm");
        assert_eq!(Provider::resource_types(&provider).len(), 13);
    }

    #[tokio::test]
    async fn delete_honours_recorded_timeout() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/flow_log_collectors/r006-fl");
                then.status(202);
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flow_log_collectors/r006-fl");
                then.status(200).json_body(json!({
                    "id": "r006-fl",
                    "name": "subnet-logs",
                    "crn": "crn:v1:flow-log-collector:r006-fl",
                    "active": true,
                    "auto_delete": true,
                    "lifecycle_state": "deleting",
                    "storage_bucket": {"name": "flow-logs-bucket"},
                    "target": {"resource_type": "subnet", "id": "0717-subnet", "name": "web"},
                    "vpc": {"id": "r006-vpc"}
                }));
            })
            .await;

        let provider = provider(&server);
        let id = ResourceId::new("is_flow_log", "logs");
        let mut timeouts = HashMap::new();
        timeouts.insert("delete".to_string(), Value::String("100ms".to_string()));
        let mut attrs = HashMap::new();
        attrs.insert("timeouts".to_string(), Value::Map(timeouts));
        let from = State::existing(id.clone(), attrs).with_identifier("r006-fl");

        let started = Instant::now();
        let err = Provider::delete(&provider, &id, "r006-fl", &from)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Timeout);
        assert!(err.to_string().contains("is_flow_log/delete/wait-deleted"));
        assert!(started.elapsed() < Duration::from_secs(5));

        let mut bad = from.clone();
        let mut timeouts = HashMap::new();
        timeouts.insert("delete".to_string(), Value::String("soon".to_string()));
        bad.attributes.insert("timeouts".to_string(), Value::Map(timeouts));
        let err = Provider::delete(&provider, &id, "r006-fl", &bad)
            .await
            .unwrap_err();
        assert_eq!(err.kind, ErrorKind::Validation);
    }
}
