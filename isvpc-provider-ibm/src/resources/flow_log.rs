//! `is_flow_log`

use std::time::Duration;

use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_flow_log;
use crate::models::flow_log::{FlowLogCollector, FlowLogCollectorPatch, FlowLogCollectorPrototype};
use crate::models::{Identity, NameIdentity};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, operation_timeout, optional_bool, optional_str, required_str};
use crate::waiters::{FLOW_LOG_DELETED, FLOW_LOG_STABLE, observe};

const TYPE: &str = "is_flow_log";

impl IbmProvider {
    pub(crate) async fn create_flow_log(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let body = FlowLogCollectorPrototype {
            target: Identity::new(required_str(attrs, "target").at(TYPE, "create", "config")?),
            storage_bucket: NameIdentity::new(
                required_str(attrs, "storage_bucket").at(TYPE, "create", "config")?,
            ),
            name: optional_str(attrs, "name"),
            active: optional_bool(attrs, "active"),
            resource_group: optional_str(attrs, "resource_group").map(Identity::new),
        };
        let timeout = operation_timeout(attrs, "create")?;

        let collector: FlowLogCollector = self
            .vpc
            .post("/flow_log_collectors", &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("created flow log collector {} ({})", collector.name, collector.id);

        let path = format!("/flow_log_collectors/{}", collector.id);
        self.wait(&FLOW_LOG_STABLE, timeout, || async {
            observe(
                self.vpc.get::<FlowLogCollector>(&path).await,
                |c| c.lifecycle_state,
            )
        })
        .await
        .at(TYPE, "create", "wait-stable")?;

        let collector: FlowLogCollector = self.vpc.get(&path).await.at(TYPE, "create", "get")?;
        self.write_tags(&collector.crn, None, attrs).await;
        self.flow_log_state(resource, collector).await
    }

    pub(crate) async fn read_flow_log(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let path = format!("/flow_log_collectors/{}", identifier);
        match self.vpc.get::<FlowLogCollector>(&path).await {
            Ok(collector) => self.flow_log_state(resource, collector).await,
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn update_flow_log(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let path = format!("/flow_log_collectors/{}", identifier);

        let name = optional_str(attrs, "name").filter(|n| Some(n.as_str()) != from.get_str("name"));
        let active = optional_bool(attrs, "active")
            .filter(|a| from.attributes.get("active").and_then(|v| v.as_bool()) != Some(*a));
        let patch = FlowLogCollectorPatch { name, active };

        let collector: FlowLogCollector = if patch.is_empty() {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        } else {
            self.vpc
                .patch(&path, &patch)
                .await
                .at(TYPE, "update", "patch")?
        };
        self.write_tags(&collector.crn, Some(&from.attributes), attrs).await;
        self.flow_log_state(to, collector).await
    }

    pub(crate) async fn delete_flow_log(
        &self,
        identifier: &str,
        timeout: Duration,
    ) -> ProviderResult<()> {
        let path = format!("/flow_log_collectors/{}", identifier);
        ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;

        self.wait(&FLOW_LOG_DELETED, timeout, || async {
            observe(
                self.vpc.get::<FlowLogCollector>(&path).await,
                |c| c.lifecycle_state,
            )
        })
        .await
        .at(TYPE, "delete", "wait-deleted")?;
        log::info!("deleted flow log collector {}", identifier);
        Ok(())
    }

    async fn flow_log_state(
        &self,
        resource: &Resource,
        collector: FlowLogCollector,
    ) -> ProviderResult<State> {
        let mut attrs = flatten_flow_log(&collector);
        keep_config(&mut attrs, resource, &["timeouts"]);
        self.read_tags_into(&collector.crn, &mut attrs).await;
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(collector.id))
    }
}

#[cfg(test)]
mod tests {
    use crate::provider::testing::provider;
    use crate::utils::DEFAULT_TIMEOUT;
    use httpmock::prelude::*;
    use httpmock::Method::PATCH;
    use isvpc_core::resource::{Resource, State, Value};
    use serde_json::{Value as Json, json};
    use std::collections::HashMap;

    fn collector_json(lifecycle_state: &str, active: bool) -> Json {
        json!({
            "id": "r006-fl",
            "name": "subnet-logs",
            "crn": "crn:v1:bluemix:public:is:us-south:a/123::flow-log-collector:r006-fl",
            "active": active,
            "auto_delete": true,
            "lifecycle_state": lifecycle_state,
            "storage_bucket": {"name": "flow-logs-bucket"},
            "target": {"resource_type": "subnet", "id": "0717-subnet", "name": "web"},
            "vpc": {"id": "r006-vpc"}
        })
    }

    fn desired() -> Resource {
        Resource::new("is_flow_log", "logs")
            .with_attribute("name", "subnet-logs")
            .with_attribute("target", "0717-subnet")
            .with_attribute("storage_bucket", "flow-logs-bucket")
    }

    #[tokio::test]
    async fn create_waits_for_stable() {
        let server = MockServer::start_async().await;
        let post = server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/flow_log_collectors").json_body(json!({
                    "target": {"id": "0717-subnet"},
                    "storage_bucket": {"name": "flow-logs-bucket"},
                    "name": "subnet-logs"
                }));
                then.status(201).json_body(collector_json("pending", true));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flow_log_collectors/r006-fl");
                then.status(200).json_body(collector_json("stable", true));
            })
            .await;

        let state = provider(&server).create_flow_log(&desired()).await.unwrap();
        post.assert_async().await;
        assert_eq!(state.get_str("target_resource_type"), Some("subnet"));
        assert_eq!(state.get_str("storage_bucket"), Some("flow-logs-bucket"));
    }

    #[tokio::test]
    async fn suspended_collector_fails_create() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/flow_log_collectors");
                then.status(201).json_body(collector_json("pending", true));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flow_log_collectors/r006-fl");
                then.status(200).json_body(collector_json("suspended", true));
            })
            .await;

        let err = provider(&server)
            .create_flow_log(&desired())
            .await
            .unwrap_err();
        assert!(err.message.contains("suspended"));
    }

    #[tokio::test]
    async fn update_patches_only_active() {
        let server = MockServer::start_async().await;
        let patch = server
            .mock_async(|when, then| {
                when.method(PATCH)
                    .path("/v1/flow_log_collectors/r006-fl")
                    .json_body(json!({"active": false}));
                then.status(200).json_body(collector_json("stable", false));
            })
            .await;

        let mut from_attrs = HashMap::new();
        from_attrs.insert("name".to_string(), Value::String("subnet-logs".into()));
        from_attrs.insert("active".to_string(), Value::Bool(true));
        let from = State::existing(desired().id, from_attrs).with_identifier("r006-fl");

        let state = provider(&server)
            .update_flow_log("r006-fl", &from, &desired().with_attribute("active", false))
            .await
            .unwrap();
        patch.assert_async().await;
        assert_eq!(state.attributes.get("active"), Some(&Value::Bool(false)));
    }

    #[tokio::test]
    async fn delete_waits_for_404() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/flow_log_collectors/r006-fl");
                then.status(202);
            })
            .await;
        let gone = server
            .mock_async(|when, then| {
                when.method(GET).path("/v1/flow_log_collectors/r006-fl");
                then.status(404);
            })
            .await;

        provider(&server).delete_flow_log("r006-fl", DEFAULT_TIMEOUT).await.unwrap();
        gone.assert_async().await;
    }
}
