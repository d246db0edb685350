//! Resolver - Reference resolution and dependency ordering
//!
//! Resources refer to each other with `${binding.attribute}` values. The
//! binding name of a resource is its declared name.

use std::collections::{HashMap, HashSet};

use crate::resource::{Resource, ResourceId, State, Value};

/// Binding name -> attributes known for that binding
pub type BindingMap = HashMap<String, HashMap<String, Value>>;

/// Dependency edges between bindings
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    /// Binding -> bindings it depends on
    pub edges: HashMap<String, HashSet<String>>,
    /// Binding -> bindings that depend on it
    pub reverse_edges: HashMap<String, HashSet<String>>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the graph from declared resources
    pub fn from_resources(resources: &[Resource]) -> Self {
        let mut graph = Self::new();
        for resource in resources {
            graph.edges.entry(resource.id.name.clone()).or_default();
            for dep in resource_dependencies(resource) {
                graph.add_edge(&resource.id.name, &dep);
            }
        }
        graph
    }

    pub fn add_edge(&mut self, from: &str, target: &str) {
        self.edges
            .entry(from.to_string())
            .or_default()
            .insert(target.to_string());
        self.reverse_edges
            .entry(target.to_string())
            .or_default()
            .insert(from.to_string());
    }

    pub fn dependencies_of(&self, binding: &str) -> Vec<&str> {
        let mut deps: Vec<&str> = self
            .edges
            .get(binding)
            .map(|d| d.iter().map(String::as_str).collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    pub fn dependents_of(&self, binding: &str) -> Vec<&str> {
        let mut deps: Vec<&str> = self
            .reverse_edges
            .get(binding)
            .map(|d| d.iter().map(String::as_str).collect())
            .unwrap_or_default();
        deps.sort();
        deps
    }

    /// Check for cycles with a depth-first walk
    pub fn has_cycle(&self) -> bool {
        fn visit(
            node: &str,
            graph: &DependencyGraph,
            visiting: &mut HashSet<String>,
            visited: &mut HashSet<String>,
        ) -> bool {
            if visiting.contains(node) {
                return true;
            }
            if visited.contains(node) {
                return false;
            }
            visiting.insert(node.to_string());
            for dep in graph.dependencies_of(node) {
                if visit(dep, graph, visiting, visited) {
                    return true;
                }
            }
            visiting.remove(node);
            visited.insert(node.to_string());
            false
        }

        let mut visiting = HashSet::new();
        let mut visited = HashSet::new();
        let mut nodes: Vec<&String> = self.edges.keys().collect();
        nodes.sort();
        nodes
            .into_iter()
            .any(|n| visit(n, self, &mut visiting, &mut visited))
    }
}

/// Binding names a resource depends on
pub fn resource_dependencies(resource: &Resource) -> HashSet<String> {
    let mut deps = HashSet::new();
    for value in resource.attributes.values() {
        collect_dependencies(value, &mut deps);
    }
    deps
}

fn collect_dependencies(value: &Value, deps: &mut HashSet<String>) {
    match value {
        Value::ResourceRef(binding_name, _) => {
            deps.insert(binding_name.clone());
        }
        Value::List(items) => {
            for item in items {
                collect_dependencies(item, deps);
            }
        }
        Value::Map(map) => {
            for v in map.values() {
                collect_dependencies(v, deps);
            }
        }
        _ => {}
    }
}

/// Sort resources so that every resource comes after the ones it references.
///
/// Declaration order is kept among independent resources. Cycles are broken
/// at the point of detection; `DependencyGraph::has_cycle` reports them.
pub fn sort_resources_by_dependencies(resources: &[Resource]) -> Vec<Resource> {
    let by_binding: HashMap<&str, &Resource> = resources
        .iter()
        .map(|r| (r.id.name.as_str(), r))
        .collect();

    let mut sorted = Vec::new();
    let mut visited: HashSet<String> = HashSet::new();
    let mut visiting: HashSet<String> = HashSet::new();

    fn visit(
        resource: &Resource,
        by_binding: &HashMap<&str, &Resource>,
        visited: &mut HashSet<String>,
        visiting: &mut HashSet<String>,
        sorted: &mut Vec<Resource>,
    ) {
        let binding = resource.id.name.clone();
        if visited.contains(&binding) || visiting.contains(&binding) {
            return;
        }
        visiting.insert(binding.clone());

        let mut deps: Vec<String> = resource_dependencies(resource).into_iter().collect();
        deps.sort();
        for dep in deps {
            if let Some(dep_resource) = by_binding.get(dep.as_str()) {
                visit(dep_resource, by_binding, visited, visiting, sorted);
            }
        }

        visiting.remove(&binding);
        visited.insert(binding);
        sorted.push(resource.clone());
    }

    for resource in resources {
        visit(
            resource,
            &by_binding,
            &mut visited,
            &mut visiting,
            &mut sorted,
        );
    }

    sorted
}

/// Build a binding map from declared attributes merged with known state.
///
/// State attributes fill in what configuration does not declare, such as
/// `id` and `crn`.
pub fn build_binding_map(
    resources: &[Resource],
    states: &HashMap<ResourceId, State>,
) -> BindingMap {
    let mut bindings = BindingMap::new();
    for resource in resources {
        bindings.insert(
            resource.id.name.clone(),
            merged_attributes(resource, states.get(&resource.id)),
        );
    }
    bindings
}

/// Declared attributes overlaid on top of state attributes
pub fn merged_attributes(resource: &Resource, state: Option<&State>) -> HashMap<String, Value> {
    let mut attrs = resource.attributes.clone();
    if let Some(state) = state
        && state.exists
    {
        for (k, v) in &state.attributes {
            attrs.entry(k.clone()).or_insert_with(|| v.clone());
        }
        if let Some(identifier) = &state.identifier {
            attrs
                .entry("id".to_string())
                .or_insert_with(|| Value::String(identifier.clone()));
        }
    }
    attrs
}

/// Reference chains longer than this are left unresolved
const MAX_REFERENCE_DEPTH: usize = 32;

/// Resolve references inside a value. Unknown references stay as they are.
pub fn resolve_value(value: &Value, bindings: &BindingMap) -> Value {
    resolve_with_depth(value, bindings, 0)
}

fn resolve_with_depth(value: &Value, bindings: &BindingMap, depth: usize) -> Value {
    match value {
        Value::ResourceRef(binding_name, attr_name) => {
            if depth < MAX_REFERENCE_DEPTH
                && let Some(attrs) = bindings.get(binding_name)
                && let Some(attr_value) = attrs.get(attr_name)
                && attr_value != value
            {
                return resolve_with_depth(attr_value, bindings, depth + 1);
            }
            value.clone()
        }
        Value::List(items) => Value::List(
            items
                .iter()
                .map(|v| resolve_with_depth(v, bindings, depth))
                .collect(),
        ),
        Value::Map(map) => Value::Map(
            map.iter()
                .map(|(k, v)| (k.clone(), resolve_with_depth(v, bindings, depth)))
                .collect(),
        ),
        _ => value.clone(),
    }
}

/// Resolve all references in a resource's attributes
pub fn resolve_resource(resource: &Resource, bindings: &BindingMap) -> Resource {
    let mut resolved = resource.clone();
    resolved.attributes = resource
        .attributes
        .iter()
        .map(|(k, v)| (k.clone(), resolve_value(v, bindings)))
        .collect();
    resolved
}

/// Names of attributes that still hold references after resolution
pub fn unresolved_attributes(resource: &Resource) -> Vec<String> {
    let mut names: Vec<String> = resource
        .attributes
        .iter()
        .filter(|(_, v)| v.has_unresolved_ref())
        .map(|(k, _)| k.clone())
        .collect();
    names.sort();
    names
}
