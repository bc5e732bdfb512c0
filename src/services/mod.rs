//! Service layer
//!
//! Ties graph building and rendering together behind one entry point so the
//! binary and tests drive the same code path.

pub mod graph_service;

pub use graph_service::{GraphRequest, GraphService};
