//! Effect - A single side effect, represented as a value
//!
//! Effects describe what should happen to a resource. Nothing runs until an
//! Interpreter executes them.

use crate::resource::{Resource, ResourceId, State};

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Look up a data source
    Read(Resource),
    /// Create a new resource
    Create(Resource),
    /// Update an existing resource in place
    Update {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete and recreate because a force-new attribute changed
    Replace {
        id: ResourceId,
        from: State,
        to: Resource,
        changed_attributes: Vec<String>,
    },
    /// Delete a resource by its backend identifier. `from` is the last known
    /// state, which still carries settings such as `timeouts`.
    Delete {
        id: ResourceId,
        identifier: String,
        from: State,
    },
}

impl Effect {
    /// Whether executing this effect changes infrastructure
    pub fn is_mutating(&self) -> bool {
        !matches!(self, Effect::Read(_))
    }

    pub fn resource_id(&self) -> &ResourceId {
        match self {
            Effect::Read(r) | Effect::Create(r) => &r.id,
            Effect::Update { id, .. } | Effect::Replace { id, .. } | Effect::Delete { id, .. } => {
                id
            }
        }
    }

    /// Desired resource carried by the effect, if any
    pub fn desired(&self) -> Option<&Resource> {
        match self {
            Effect::Read(r) | Effect::Create(r) => Some(r),
            Effect::Update { to, .. } | Effect::Replace { to, .. } => Some(to),
            Effect::Delete { .. } => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Effect::Read(_) => "<=",
            Effect::Create(_) => "+",
            Effect::Update { .. } => "~",
            Effect::Replace { .. } => "-/+",
            Effect::Delete { .. } => "-",
        }
    }
}

impl std::fmt::Display for Effect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verb = match self {
            Effect::Read(_) => "Read",
            Effect::Create(_) => "Create",
            Effect::Update { .. } => "Update",
            Effect::Replace { .. } => "Replace",
            Effect::Delete { .. } => "Delete",
        };
        write!(f, "{} {}", verb, self.resource_id())
    }
}
