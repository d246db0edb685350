//! `is_security_group_rule`
//!
//! Identified by `<security group>.<rule>`. Every write to a group's rules runs
//! under that group's lock.

use isvpc_core::composite_id::{make_terraform_id, parse_terraform_id};
use isvpc_core::mutex_kv::security_group_rule_key;
use isvpc_core::provider::{ProviderError, ProviderResult};
use isvpc_core::resource::{Resource, State};
use isvpc_core::schema::{validate_cidr, validate_ipv4};

use super::{Labeled, ignore_not_found};
use crate::flatten::flatten_security_group_rule;
use crate::models::Reference;
use crate::models::security_group::{
    SecurityGroup, SecurityGroupRule, SecurityGroupRuleLocal, SecurityGroupRulePatch,
    SecurityGroupRulePrototype, SecurityGroupRuleRemote,
};
use crate::provider::IbmProvider;
use crate::utils::{optional_int, optional_str, required_str};

const TYPE: &str = "is_security_group_rule";

impl IbmProvider {
    pub(crate) async fn create_security_group_rule(
        &self,
        resource: &Resource,
    ) -> ProviderResult<State> {
        let attrs = &resource.attributes;
        let group = required_str(attrs, "group").at(TYPE, "create", "config")?;
        let body = self
            .rule_prototype(resource)
            .await
            .at(TYPE, "create", "config")?;

        let _guard = self.locks.lock(security_group_rule_key(group)).await;
        let rule: SecurityGroupRule = self
            .vpc
            .post(&format!("/security_groups/{}/rules", group), &body)
            .await
            .at(TYPE, "create", "post")?;
        log::info!("created rule {} in security group {}", rule.id, group);

        Ok(rule_state(resource, group, &rule))
    }

    pub(crate) async fn read_security_group_rule(
        &self,
        resource: &Resource,
        identifier: &str,
    ) -> ProviderResult<State> {
        let (group, rule_id) = parse_terraform_id(identifier).at(TYPE, "read", "parse-id")?;
        let path = format!("/security_groups/{}/rules/{}", group, rule_id);
        match self.vpc.get::<SecurityGroupRule>(&path).await {
            Ok(rule) => Ok(rule_state(resource, &group, &rule)),
            Err(e) if e.is_not_found() => Ok(State::not_found(resource.id.clone())),
            Err(e) => Err(ProviderError::from(e).at_step(TYPE, "read", "get")),
        }
    }

    pub(crate) async fn update_security_group_rule(
        &self,
        identifier: &str,
        _from: &State,
        to: &Resource,
    ) -> ProviderResult<State> {
        let (group, rule_id) = parse_terraform_id(identifier).at(TYPE, "update", "parse-id")?;
        let patch = SecurityGroupRulePatch::from(
            self.rule_prototype(to).await.at(TYPE, "update", "config")?,
        );

        let _guard = self.locks.lock(security_group_rule_key(&group)).await;
        let rule: SecurityGroupRule = self
            .vpc
            .patch(
                &format!("/security_groups/{}/rules/{}", group, rule_id),
                &patch,
            )
            .await
            .at(TYPE, "update", "patch")?;
        Ok(rule_state(to, &group, &rule))
    }

    pub(crate) async fn delete_security_group_rule(&self, identifier: &str) -> ProviderResult<()> {
        let (group, rule_id) = parse_terraform_id(identifier).at(TYPE, "delete", "parse-id")?;
        let path = format!("/security_groups/{}/rules/{}", group, rule_id);

        let _guard = self.locks.lock(security_group_rule_key(&group)).await;
        match self.vpc.get::<SecurityGroupRule>(&path).await {
            Ok(_) => {}
            Err(e) if e.is_not_found() => return Ok(()),
            Err(e) => return Err(ProviderError::from(e).at_step(TYPE, "delete", "get")),
        }
        ignore_not_found(self.vpc.delete(&path).await).at(TYPE, "delete", "delete")?;
        log::info!("deleted rule {} of security group {}", rule_id, group);
        Ok(())
    }

    /// Request body for the rule `resource` describes
    async fn rule_prototype(&self, resource: &Resource) -> ProviderResult<SecurityGroupRulePrototype> {
        let attrs = &resource.attributes;
        let protocol = optional_str(attrs, "protocol").unwrap_or_else(|| "icmp_tcp_udp".to_string());

        let icmp_only = ["type", "code"];
        let port_only = ["port_min", "port_max"];
        for key in icmp_only.iter().filter(|k| attrs.contains_key(**k)) {
            if protocol != "icmp" {
                return Err(ProviderError::validation(format!(
                    "'{}' is only valid for protocol icmp, not {}",
                    key, protocol
                )));
            }
        }
        for key in port_only.iter().filter(|k| attrs.contains_key(**k)) {
            if protocol != "tcp" && protocol != "udp" {
                return Err(ProviderError::validation(format!(
                    "'{}' is only valid for protocol tcp or udp, not {}",
                    key, protocol
                )));
            }
        }

        let remote = match optional_str(attrs, "remote") {
            Some(remote) => Some(self.rule_remote(&remote).await?),
            None => None,
        };
        let local = optional_str(attrs, "local")
            .map(|local| rule_local(&local))
            .transpose()?;

        Ok(SecurityGroupRulePrototype {
            direction: required_str(attrs, "direction")?.to_string(),
            ip_version: optional_str(attrs, "ip_version").unwrap_or_else(|| "ipv4".to_string()),
            protocol,
            remote,
            local,
            icmp_type: optional_int(attrs, "type"),
            code: optional_int(attrs, "code"),
            port_min: optional_int(attrs, "port_min"),
            port_max: optional_int(attrs, "port_max"),
        })
    }

    /// An address, a CIDR block, or the id of an existing security group
    async fn rule_remote(&self, remote: &str) -> ProviderResult<SecurityGroupRuleRemote> {
        if validate_ipv4(remote).is_ok() {
            return Ok(SecurityGroupRuleRemote::Address {
                address: remote.to_string(),
            });
        }
        if validate_cidr(remote).is_ok() {
            return Ok(SecurityGroupRuleRemote::CidrBlock {
                cidr_block: remote.to_string(),
            });
        }
        match self
            .vpc
            .get::<SecurityGroup>(&format!("/security_groups/{}", remote))
            .await
        {
            Ok(sg) => Ok(SecurityGroupRuleRemote::SecurityGroup(Reference::with_id(sg.id))),
            Err(e) if e.is_not_found() => Err(ProviderError::validation(format!(
                "Invalid remote provided ({})",
                remote
            ))),
            Err(e) => Err(e.into()),
        }
    }
}

fn rule_local(local: &str) -> ProviderResult<SecurityGroupRuleLocal> {
    if validate_ipv4(local).is_ok() {
        Ok(SecurityGroupRuleLocal::Address {
            address: local.to_string(),
        })
    } else if validate_cidr(local).is_ok() {
        Ok(SecurityGroupRuleLocal::CidrBlock {
            cidr_block: local.to_string(),
        })
    } else {
        Err(ProviderError::validation(format!(
            "Invalid local provided ({}): expected an IP address or CIDR block",
            local
        )))
    }
}

fn rule_state(resource: &Resource, group: &str, rule: &SecurityGroupRule) -> State {
    State::existing(
        resource.id.clone(),
        flatten_security_group_rule(group, rule),
    )
    .with_identifier(make_terraform_id(group, &rule.id))
}
