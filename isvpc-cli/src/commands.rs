//! Engine steps shared by the subcommands: validation, refresh, planning,
//! and state-persisting execution

use std::collections::HashMap;

use colored::Colorize;
use isvpc_core::differ::create_plan;
use isvpc_core::effect::Effect;
use isvpc_core::interpreter::Interpreter;
use isvpc_core::plan::Plan;
use isvpc_core::provider::{Provider, ResourceType};
use isvpc_core::resolver::{
    BindingMap, build_binding_map, resolve_resource, sort_resources_by_dependencies,
    unresolved_attributes,
};
use isvpc_core::resource::{Resource, ResourceId, State};
use isvpc_core::schema::ResourceSchema;
use isvpc_provider_ibm::resources::resource_types;
use isvpc_provider_ibm::{IbmProvider, ProviderConfig};
use isvpc_state::{ResourceState, StateBackend, StateFile};

use crate::config::Configuration;

pub fn get_schemas() -> HashMap<String, ResourceSchema> {
    resource_types()
        .iter()
        .map(|rt| (rt.name().to_string(), rt.schema()))
        .collect()
}

/// Check every resource against its schema and fill in declared defaults
pub fn validate_resources(resources: &mut [Resource]) -> Result<(), String> {
    let types: HashMap<&'static str, Box<dyn ResourceType>> =
        resource_types().into_iter().map(|rt| (rt.name(), rt)).collect();
    let mut all_errors = Vec::new();

    for resource in resources.iter_mut() {
        let Some(rt) = types.get(resource.id.resource_type.as_str()) else {
            all_errors.push(format!(
                "{}: Unknown resource type: {}",
                resource.id, resource.id.resource_type
            ));
            continue;
        };
        let schema = rt.schema();

        let result = if resource.is_data_source() {
            if !rt.supports_data_source() {
                all_errors.push(format!(
                    "{}: {} cannot be used as a data source",
                    resource.id, resource.id.resource_type
                ));
                continue;
            }
            schema.validate_lookup(&resource.attributes)
        } else {
            schema.apply_defaults(&mut resource.attributes);
            schema.validate(&resource.attributes)
        };

        if let Err(errors) = result {
            for error in errors {
                all_errors.push(format!("{}: {}", resource.id, error));
            }
        }
    }

    if all_errors.is_empty() {
        Ok(())
    } else {
        Err(all_errors.join("\n"))
    }
}

/// Environment settings overridden by the configuration's `provider` block
pub fn get_provider(config: &Configuration) -> Result<Box<dyn Provider>, String> {
    let mut provider_config = ProviderConfig::from_env();
    provider_config
        .apply_overrides(&config.provider)
        .map_err(|e| format!("Provider configuration error: {}", e))?;
    let provider = IbmProvider::new(&provider_config)
        .map_err(|e| format!("Provider configuration error: {}", e))?;
    Ok(Box::new(provider))
}

/// Re-read every resource recorded in state and look up data sources.
///
/// Entries in state that configuration no longer declares are kept as they
/// are so the plan deletes them.
pub async fn refresh(
    provider: &dyn Provider,
    resources: &[Resource],
    state: &StateFile,
) -> Result<HashMap<ResourceId, State>, String> {
    let mut states = state.current_states();

    for resource in resources {
        let bindings = build_binding_map(resources, &states);
        let resolved = resolve_resource(resource, &bindings);

        if resource.is_data_source() {
            // Lookups naming resources that do not exist yet run during apply
            if !unresolved_attributes(&resolved).is_empty() {
                continue;
            }
            let found = provider
                .read(&resolved, None)
                .await
                .map_err(|e| format!("Failed to read data source: {}", e))?;
            states.insert(resource.id.clone(), found);
            continue;
        }

        let Some(identifier) = states
            .get(&resource.id)
            .and_then(|s| s.identifier.clone())
        else {
            continue;
        };
        let current = provider
            .read(&resolved, Some(&identifier))
            .await
            .map_err(|e| format!("Failed to read state: {}", e))?;
        if !current.exists {
            log::info!("{} no longer exists, it will be recreated", resource.id);
        }
        states.insert(resource.id.clone(), current);
    }

    Ok(states)
}

/// A plan together with the bindings its references resolve against
pub struct PreparedPlan {
    pub plan: Plan,
    pub bindings: BindingMap,
}

/// Refresh, resolve known references, and diff
pub async fn prepare_plan(
    provider: &dyn Provider,
    resources: &[Resource],
    state: &StateFile,
) -> Result<PreparedPlan, String> {
    let sorted = sort_resources_by_dependencies(resources);
    let states = refresh(provider, &sorted, state).await?;

    let bindings = build_binding_map(&sorted, &states);
    let desired: Vec<Resource> = sorted
        .iter()
        .map(|r| resolve_resource(r, &bindings))
        .collect();
    let plan = create_plan(&desired, &states, &get_schemas());

    Ok(PreparedPlan { plan, bindings })
}

/// Delete effects for every declared resource recorded in state, dependents first.
///
/// `timeouts` from the configuration win over the recorded ones.
pub fn destroy_plan(resources: &[Resource], state: &StateFile) -> Plan {
    let mut plan = Plan::new();
    for resource in sort_resources_by_dependencies(resources).iter().rev() {
        if resource.is_data_source() {
            continue;
        }
        let Some(recorded) = state.find_resource(&resource.id.resource_type, &resource.id.name)
        else {
            continue;
        };
        let Some(identifier) = recorded.identifier.clone() else {
            continue;
        };
        let mut from = recorded.to_state();
        if let Some(timeouts) = resource.get("timeouts") {
            from.attributes.insert("timeouts".to_string(), timeouts.clone());
        }
        plan.add(Effect::Delete {
            id: resource.id.clone(),
            identifier,
            from,
        });
    }
    plan
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecutionSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Execute `plan` in order, persisting state after every mutating effect.
///
/// Execution stops at the first failure; everything completed before it is
/// already in the backend.
pub async fn execute_plan(
    provider: Box<dyn Provider>,
    prepared: PreparedPlan,
    state: &mut StateFile,
    backend: &dyn StateBackend,
) -> Result<ExecutionSummary, String> {
    let provider_name = provider.name();
    let interpreter = Interpreter::new(provider);
    let PreparedPlan { plan, mut bindings } = prepared;
    let mut summary = ExecutionSummary::default();

    for effect in plan.effects() {
        match interpreter.execute_effect(effect, &mut bindings).await {
            Ok(outcome) => {
                if effect.is_mutating() {
                    let id = effect.resource_id();
                    match outcome.state() {
                        Some(new_state) => state
                            .upsert_resource(ResourceState::from_state(new_state, provider_name)),
                        None => {
                            state.remove_resource(&id.resource_type, &id.name);
                        }
                    }
                    state.increment_serial();
                    backend
                        .write_state(state)
                        .await
                        .map_err(|e| format!("Failed to write state: {}", e))?;
                    println!("  {} {}", "✓".green(), effect);
                }
                summary.succeeded += 1;
            }
            Err(e) => {
                println!("  {} {} - {}", "✗".red(), effect, e);
                summary.failed += 1;
                break;
            }
        }
    }

    Ok(summary)
}
