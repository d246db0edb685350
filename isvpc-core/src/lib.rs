//! isvpc core
//!
//! Core library for declarative IBM Cloud VPC management: the resource model,
//! planning, effect interpretation, and the primitives providers share
//! (composite identifiers, keyed locks, completion pollers).

pub mod composite_id;
pub mod differ;
pub mod effect;
pub mod interpreter;
pub mod mutex_kv;
pub mod plan;
pub mod provider;
pub mod resolver;
pub mod resource;
pub mod schema;
pub mod waiter;
