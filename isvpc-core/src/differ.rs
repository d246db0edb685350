//! Differ - Compare desired state with current state to generate a Plan
//!
//! Compares the desired resources declared in configuration with the current
//! state fetched from the Provider, and generates the required Effects.

use std::collections::{HashMap, HashSet};

use crate::effect::Effect;
use crate::plan::Plan;
use crate::resource::{Resource, ResourceId, State, Value};
use crate::schema::ResourceSchema;

/// Result of a diff operation
#[derive(Debug, Clone, PartialEq)]
pub enum Diff {
    /// Resource does not exist -> needs creation
    Create(Resource),
    /// Resource exists with differences -> needs update
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// A force-new attribute differs -> delete and recreate
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Resource exists with no differences -> no action needed
    NoChange(ResourceId),
}

impl Diff {
    /// Returns whether this Diff involves a change
    pub fn is_change(&self) -> bool {
        !matches!(self, Diff::NoChange(_))
    }
}

/// Compare desired state with current state to compute a Diff
pub fn diff(desired: &Resource, current: &State, schema: Option<&ResourceSchema>) -> Diff {
    if !current.exists {
        return Diff::Create(desired.clone());
    }

    let changed = find_changed_attributes(&desired.attributes, &current.attributes, schema);

    if changed.is_empty() {
        return Diff::NoChange(desired.id.clone());
    }

    let force_new = schema.is_some_and(|s| {
        changed
            .iter()
            .any(|name| s.attributes.get(name).is_some_and(|a| a.force_new))
    });

    if force_new {
        Diff::Replace {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    } else {
        Diff::Update {
            id: desired.id.clone(),
            from: current.clone(),
            to: desired.clone(),
            changed_attributes: changed,
        }
    }
}

/// Find changed attributes between desired and current state.
///
/// Attributes present in the desired state are compared. An attribute only
/// present in the current state counts as changed when the schema marks it
/// removable and it still holds a value. Lists of strings compare as sets,
/// matching how the API returns tags and security group references in no
/// particular order.
fn find_changed_attributes(
    desired: &HashMap<String, Value>,
    current: &HashMap<String, Value>,
    schema: Option<&ResourceSchema>,
) -> Vec<String> {
    let mut changed = Vec::new();

    for (key, desired_value) in desired {
        if key.starts_with('_') || key == "timeouts" {
            continue;
        }
        if let Some(s) = schema
            && s.attributes.get(key).is_some_and(|a| a.computed)
        {
            continue;
        }

        match current.get(key) {
            Some(current_value) if values_equal(desired_value, current_value) => {}
            _ => changed.push(key.clone()),
        }
    }

    if let Some(s) = schema {
        for (key, current_value) in current {
            if desired.contains_key(key) || is_unset(current_value) {
                continue;
            }
            if s.attributes.get(key).is_some_and(|a| a.removable && !a.computed) {
                changed.push(key.clone());
            }
        }
    }

    changed.sort();
    changed
}

fn is_unset(value: &Value) -> bool {
    match value {
        Value::String(s) => s.is_empty(),
        Value::List(items) => items.is_empty(),
        Value::Map(map) => map.is_empty(),
        _ => false,
    }
}

fn values_equal(desired: &Value, current: &Value) -> bool {
    match (desired, current) {
        (Value::List(a), Value::List(b)) if a.iter().all(|v| matches!(v, Value::String(_))) => {
            let a: HashSet<&str> = a.iter().filter_map(Value::as_str).collect();
            let b: HashSet<&str> = b.iter().filter_map(Value::as_str).collect();
            a == b
        }
        _ => desired == current,
    }
}

/// Compute Diff for multiple resources and generate a Plan.
///
/// Data sources become Read effects. Resources present in `current_states`
/// with an identifier but absent from `desired` become Delete effects.
pub fn create_plan(
    desired: &[Resource],
    current_states: &HashMap<ResourceId, State>,
    schemas: &HashMap<String, ResourceSchema>,
) -> Plan {
    let mut plan = Plan::new();

    for resource in desired {
        if resource.read_only {
            plan.add(Effect::Read(resource.clone()));
            continue;
        }

        let current = current_states
            .get(&resource.id)
            .cloned()
            .unwrap_or_else(|| State::not_found(resource.id.clone()));

        match diff(resource, &current, schemas.get(&resource.id.resource_type)) {
            Diff::Create(r) => plan.add(Effect::Create(r)),
            Diff::Update {
                id,
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Update {
                id,
                from,
                to,
                changed_attributes,
            }),
            Diff::Replace {
                id,
                from,
                to,
                changed_attributes,
            } => plan.add(Effect::Replace {
                id,
                from,
                to,
                changed_attributes,
            }),
            Diff::NoChange(_) => {}
        }
    }

    let desired_ids: HashSet<&ResourceId> = desired.iter().map(|r| &r.id).collect();
    let mut orphans: Vec<&State> = current_states
        .values()
        .filter(|s| s.exists && !desired_ids.contains(&s.id))
        .collect();
    orphans.sort_by(|a, b| a.id.cmp(&b.id));
    for state in orphans {
        if let Some(identifier) = &state.identifier {
            plan.add(Effect::Delete {
                id: state.id.clone(),
                identifier: identifier.clone(),
                from: state.clone(),
            });
        }
    }

    plan
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{AttributeSchema, AttributeType};

    fn subnet_schema() -> ResourceSchema {
        ResourceSchema::new("is_subnet")
            .attribute(AttributeSchema::new("name", AttributeType::String))
            .attribute(AttributeSchema::new("zone", AttributeType::String).force_new())
            .attribute(AttributeSchema::new("status", AttributeType::String).computed())
    }

    #[test]
    fn diff_create_when_not_exists() {
        let desired = Resource::new("is_vpc", "main");
        let current = State::not_found(ResourceId::new("is_vpc", "main"));

        let result = diff(&desired, &current, None);
        assert!(matches!(result, Diff::Create(_)));
    }

    #[test]
    fn diff_no_change_when_same() {
        let desired = Resource::new("is_vpc", "main").with_attribute("name", "prod");

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("prod".to_string()));
        attrs.insert("crn".to_string(), Value::String("crn:v1:vpc".to_string()));
        let current = State::existing(ResourceId::new("is_vpc", "main"), attrs);

        assert!(matches!(
            diff(&desired, &current, None),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn diff_update_when_different() {
        let desired = Resource::new("is_subnet", "web").with_attribute("name", "web-2");

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));
        let current = State::existing(ResourceId::new("is_subnet", "web"), attrs);

        match diff(&desired, &current, Some(&subnet_schema())) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(changed_attributes, vec!["name".to_string()]),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn diff_replace_on_force_new_change() {
        let desired = Resource::new("is_subnet", "web").with_attribute("zone", "us-south-2");

        let mut attrs = HashMap::new();
        attrs.insert("zone".to_string(), Value::String("us-south-1".to_string()));
        let current = State::existing(ResourceId::new("is_subnet", "web"), attrs);

        assert!(matches!(
            diff(&desired, &current, Some(&subnet_schema())),
            Diff::Replace { .. }
        ));
    }

    #[test]
    fn string_lists_compare_as_sets() {
        let desired = Resource::new("is_vpc", "main").with_attribute(
            "tags",
            Value::List(vec!["b".into(), "a".into()]),
        );
        let mut attrs = HashMap::new();
        attrs.insert(
            "tags".to_string(),
            Value::List(vec!["a".into(), "b".into()]),
        );
        let current = State::existing(ResourceId::new("is_vpc", "main"), attrs);

        assert!(matches!(
            diff(&desired, &current, None),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn timeouts_are_not_compared() {
        let mut timeouts = HashMap::new();
        timeouts.insert("create".to_string(), Value::String("20m".to_string()));
        let desired =
            Resource::new("is_vpc", "main").with_attribute("timeouts", Value::Map(timeouts));
        let current = State::existing(ResourceId::new("is_vpc", "main"), HashMap::new());

        assert!(matches!(
            diff(&desired, &current, None),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn removing_a_removable_attribute_is_a_change() {
        let schema = subnet_schema()
            .attribute(AttributeSchema::new("public_gateway", AttributeType::String).removable())
            .attribute(
                AttributeSchema::new("tags", AttributeType::List(Box::new(AttributeType::String)))
                    .removable(),
            )
            .attribute(AttributeSchema::new("network_acl", AttributeType::String));
        let desired = Resource::new("is_subnet", "web").with_attribute("name", "web");

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));
        attrs.insert("public_gateway".to_string(), Value::String("r006-pgw".to_string()));
        attrs.insert("tags".to_string(), Value::List(vec!["env:dev".into()]));
        // filled in by the API when omitted
        attrs.insert("network_acl".to_string(), Value::String("r006-acl".to_string()));
        attrs.insert("status".to_string(), Value::String("available".to_string()));
        let current = State::existing(ResourceId::new("is_subnet", "web"), attrs);

        match diff(&desired, &current, Some(&schema)) {
            Diff::Update {
                changed_attributes, ..
            } => assert_eq!(
                changed_attributes,
                vec!["public_gateway".to_string(), "tags".to_string()]
            ),
            other => panic!("Expected Update, got {:?}", other),
        }
    }

    #[test]
    fn empty_removable_attribute_is_not_a_change() {
        let schema = subnet_schema().attribute(
            AttributeSchema::new("tags", AttributeType::List(Box::new(AttributeType::String)))
                .removable(),
        );
        let desired = Resource::new("is_subnet", "web").with_attribute("name", "web");

        let mut attrs = HashMap::new();
        attrs.insert("name".to_string(), Value::String("web".to_string()));
        attrs.insert("tags".to_string(), Value::List(vec![]));
        let current = State::existing(ResourceId::new("is_subnet", "web"), attrs);

        assert!(matches!(
            diff(&desired, &current, Some(&schema)),
            Diff::NoChange(_)
        ));
    }

    #[test]
    fn create_plan_from_resources() {
        let resources = vec![
            Resource::new("is_vpc", "new"),
            Resource::new("is_vpc", "existing").with_attribute("classic_access", true),
            Resource::new("is_vpc", "lookup").with_read_only(true),
        ];

        let mut current_states = HashMap::new();
        let mut attrs = HashMap::new();
        attrs.insert("classic_access".to_string(), Value::Bool(false));
        current_states.insert(
            ResourceId::new("is_vpc", "existing"),
            State::existing(ResourceId::new("is_vpc", "existing"), attrs)
                .with_identifier("r006-existing"),
        );
        current_states.insert(
            ResourceId::new("is_vpc", "orphan"),
            State::existing(ResourceId::new("is_vpc", "orphan"), HashMap::new())
                .with_identifier("r006-orphan"),
        );

        let plan = create_plan(&resources, &current_states, &HashMap::new());

        assert_eq!(plan.effects().len(), 4);
        assert!(matches!(plan.effects()[0], Effect::Create(_)));
        assert!(matches!(plan.effects()[1], Effect::Update { .. }));
        assert!(matches!(plan.effects()[2], Effect::Read(_)));
        match &plan.effects()[3] {
            Effect::Delete { id, identifier, .. } => {
                assert_eq!(id.name, "orphan");
                assert_eq!(identifier, "r006-orphan");
            }
            other => panic!("Expected Delete, got {:?}", other),
        }
    }
}
