//! kubegraph library
//!
//! Builds a graph of the objects related to one Kubernetes object and renders
//! it as an indented tree or Graphviz DOT. Used by the `kubegraph` binary and
//! by the integration tests.

pub mod cli;
pub mod config;
pub mod graph;
pub mod kube;
pub mod render;
pub mod services;

// Re-export commonly used types for convenience
pub use graph::{
    AccessError, BuildOptions, Graph, GraphBuilder, GraphError, RelationKind, ResourceAccessor,
};
pub use render::OutputMode;
pub use services::{GraphRequest, GraphService};
