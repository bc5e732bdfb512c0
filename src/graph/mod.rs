//! Object relationship graph
//!
//! Starting from one root object, discovers every object related to it
//! through ownership, label selection, by-name references, volume mounts,
//! routing and autoscaling. The traversal only talks to the cluster through
//! a [`ResourceAccessor`], so it runs the same against a live API server or
//! an in-memory fixture.

pub mod accessor;
mod builder;
mod error;
mod models;
pub mod rules;
mod selector;
pub mod value;

pub use accessor::{AccessError, Gvr, ResolvedKind, ResourceAccessor, with_deadline};
pub use builder::{
    BuildOptions, CancelHandle, CancelSignal, DEFAULT_CONCURRENCY, DEFAULT_NODE_CAP,
    DEFAULT_REQUEST_TIMEOUT, GraphBuilder, build, cancel_pair,
};
pub use error::GraphError;
pub use models::{Graph, Node, NodeContent, ObjectKey, Relation, RelationKind, ResourceRef};
pub use selector::{LabelSelector, SelectorOperator, SelectorRequirement};
