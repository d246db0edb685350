//! `is_security_group`

use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};

use super::vpc::no_match;
use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_security_group;
use crate::models::Identity;
use crate::models::security_group::{SecurityGroup, SecurityGroupPatch, SecurityGroupPrototype};
use crate::provider::IbmProvider;
use crate::utils::{keep_config, optional_str, required_str};

const TYPE: &str = "is_security_group";

impl IbmProvider {
    pub(crate) async fn create_security_group(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let body = SecurityGroupPrototype {
            vpc: Identity::new(required_str(attrs, "vpc").at(TYPE, "create", "config")?),
            name: optional_str(attrs, "name"),
            resource_group: optional_str(attrs, "resource_group").map(Identity::new),
        };
        let sg: SecurityGroup = self
            .vpc
            .post("/security_groups", &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("created security group {} ({})", sg.name, sg.id);

        self.write_tags(&sg.crn, None, attrs).await;
        self.security_group_state(resource, sg).await
    }

    pub(crate) async fn read_security_group(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let path = format!("/security_groups/{}", identifier);
        match self.vpc.get::<SecurityGroup>(&path).await {
            Ok(sg) => self.security_group_state(resource, sg).await,
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    /// Data source: find a security group by name, optionally within `vpc`
    pub(crate) async fn lookup_security_group(&self, resource: &Resource) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let name = required_str(attrs, "name").at(TYPE, "lookup", "config")?;
        let vpc = optional_str(attrs, "vpc");
        let query: Vec<(&str, &str)> = vpc.iter().map(|v| ("vpc.id", v.as_str())).collect();

        let groups: Vec<SecurityGroup> = self
            .vpc
            .list_all("/security_groups", "security_groups", &query)
            .await
            .at(TYPE, "lookup", "list")?;
        match groups.into_iter().find(|g| g.name == name) {
            Some(sg) => self.security_group_state(resource, sg).await,
            None => Err(no_match(TYPE, name)),
        }
    }

    pub(crate) async fn update_security_group(
        &self,
        identifier: &str,
        from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &to.attributes;
        let path = format!("/security_groups/{}", identifier);
        let name = optional_str(attrs, "name");

        let sg: SecurityGroup = if name.is_some() && name.as_deref() != from.get_str("name") {
            self.vpc
                .patch(&path, &SecurityGroupPatch { name })
                .await
                .at(TYPE, "update", "patch")?
        } else {
            self.vpc.get(&path).await.at(TYPE, "update", "get")?
        };
        self.write_tags(&sg.crn, Some(&from.attributes), attrs).await;
        self.security_group_state(to, sg).await
    }

    pub(crate) async fn delete_security_group(&self, identifier: &str) -> ProviderResult<()> {
        ignore_not_found(
            self.vpc
                .delete(&format!("/security_groups/{}", identifier))
                .await,
        )
        .at(TYPE, "delete", "delete")?;
        log::info!("deleted security group {}", identifier);
        Ok(())
    }

    async fn security_group_state(
        &self,
        resource: &Resource,
        sg: SecurityGroup,
    ) -> ProviderResult<State> {
        let mut attrs = flatten_security_group(&sg);
        keep_config(&mut attrs, resource, &["timeouts"]);
        self.read_tags_into(&sg.crn, &mut attrs).await;
        Ok(State::existing(resource.id.clone(), attrs).with_identifier(sg.id))
    }
}

#[cfg(test)]
mod tests {
    use crate::provider::testing::provider;
    use httpmock::prelude::*;
    use isvpc_core::resource::{Resource, Value};
    use serde_json::{Value as Json, json};

    fn sg_json() -> Json {
        json!({
            "id": "r006-sg",
            "name": "web-sg",
            "crn": "crn:v1:bluemix:public:is:us-south:a/123::security-group:r006-sg",
            "vpc": {"id": "r006-vpc"},
            "created_at": "2024-05-01T10:00:00Z"
        })
    }

    #[tokio::test]
    async fn create_writes_tags() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/v1/security_groups")
                    .json_body(json!({"vpc": {"id": "r006-vpc"}, "name": "web-sg"}));
                then.status(201).json_body(sg_json());
            })
            .await;
        let attach = server
            .mock_async(|when, then| {
                when.method(POST).path("/v3/tags/attach").json_body(json!({
                    "resources": [{"resource_id": "crn:v1:bluemix:public:is:us-south:a/123::security-group:r006-sg"}],
                    "tag_names": ["tier:web"]
                }));
                then.status(200).json_body(json!({"results": []}));
            })
            .await;
        server
            .mock_async(|when, then| {
                when.method(GET).path("/v3/tags").query_param("tag_type", "user");
                then.status(200).json_body(json!({"items": [{"name": "tier:web"}]}));
            })
            .await;

        let resource = Resource::new("is_security_group", "web")
            .with_attribute("name", "web-sg")
            .with_attribute("vpc", "r006-vpc")
            .with_attribute("tags", Value::List(vec![Value::String("tier:web".into())]));
        let state = provider(&server)
            .create_security_group(&resource)
            .await
            .unwrap();
        attach.assert_async().await;
        assert_eq!(state.identifier.as_deref(), Some("r006-sg"));
        assert_eq!(
            state.attributes.get("tags"),
            Some(&Value::List(vec![Value::String("tier:web".into())]))
        );
    }

    #[tokio::test]
    async fn tag_failures_do_not_fail_create() {
        let server = MockServer::start_async().await;
        server
            .mock_async(|when, then| {
                when.method(POST).path("/v1/security_groups");
                then.status(201).json_body(sg_json());
            })
            .await;
        server
            .mock_async(|when, then| {
                when.path_contains("/v3/tags");
                then.status(503).body("tagging unavailable");
            })
            .await;

        let resource = Resource::new("is_security_group", "web")
            .with_attribute("vpc", "r006-vpc")
            .with_attribute("tags", Value::List(vec![Value::String("tier:web".into())]));
        let state = provider(&server)
            .create_security_group(&resource)
            .await
            .unwrap();
        assert!(state.exists);
        assert!(!state.attributes.contains_key("tags"));
    }

    #[tokio::test]
    async fn delete_ignores_404() {
        let server = MockServer::start_async().await;
        let delete = server
            .mock_async(|when, then| {
                when.method(DELETE).path("/v1/security_groups/r006-sg");
                then.status(404);
            })
            .await;
        provider(&server)
            .delete_security_group("r006-sg")
            .await
            .unwrap();
        delete.assert_async().await;
    }
}
