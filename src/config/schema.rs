//! Configuration schema definitions
//!
//! Defines the structure of configuration files using serde for serialization.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::graph::{BuildOptions, DEFAULT_CONCURRENCY, DEFAULT_NODE_CAP, DEFAULT_REQUEST_TIMEOUT};
use crate::render::OutputMode;

/// Root configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Namespace used when `-n` is not given; empty uses the kubeconfig context
    #[serde(default)]
    pub default_namespace: String,

    /// Output format used when `--dot` is not given
    #[serde(default)]
    pub output: OutputMode,

    /// Traversal limits
    #[serde(default)]
    pub graph: GraphConfig,
}

/// Traversal configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GraphConfig {
    /// Maximum number of objects in one graph
    #[serde(default = "default_max_nodes")]
    pub max_nodes: usize,

    /// Objects fetched in parallel
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Deadline for each API call, in seconds
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_max_nodes() -> usize {
    DEFAULT_NODE_CAP
}

fn default_concurrency() -> usize {
    DEFAULT_CONCURRENCY
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT.as_secs()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_namespace: String::new(),
            output: OutputMode::default(),
            graph: GraphConfig::default(),
        }
    }
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            max_nodes: default_max_nodes(),
            concurrency: default_concurrency(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl GraphConfig {
    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            node_cap: self.max_nodes,
            concurrency: self.concurrency,
            request_timeout: Duration::from_secs(self.request_timeout_secs),
        }
    }
}
