//! Kubernetes client module
//!
//! Handles connection to the Kubernetes API server and provides the
//! kube-backed [`ResourceAccessor`](crate::graph::ResourceAccessor).
//!
//! Supports HTTP/HTTPS/SOCKS5 proxies via the standard environment variables
//! (`HTTP_PROXY`, `HTTPS_PROXY`) through kube-rs.

mod accessor;
pub mod fixture;
mod registry;

pub use accessor::KubeAccessor;
pub use fixture::FixtureAccessor;
pub use registry::{KindEntry, KindRegistry};

use anyhow::{Context, Result};
use kube::config::{KubeConfigOptions, Kubeconfig};
use kube::{Client, Config};
use std::path::Path;

/// A connected client and the namespace of its kubeconfig context
pub struct ClusterConnection {
    pub client: Client,
    /// Namespace of the selected context, `default` when it has none
    pub default_namespace: String,
}

/// Connect to the cluster
///
/// Without overrides this uses the default kubeconfig loading strategy:
/// 1. In-cluster config (if running in a pod)
/// 2. KUBECONFIG environment variable
/// 3. ~/.kube/config
///
/// `context` selects a kubeconfig context other than the current one and
/// `kubeconfig` reads an explicit file instead of the default locations.
pub async fn connect(
    context: Option<&str>,
    kubeconfig: Option<&Path>,
) -> Result<ClusterConnection> {
    let options = KubeConfigOptions {
        context: context.map(str::to_string),
        ..KubeConfigOptions::default()
    };

    let config = match kubeconfig {
        Some(path) => {
            let kubeconfig = Kubeconfig::read_from(path)
                .with_context(|| format!("Failed to read kubeconfig {}", path.display()))?;
            Config::from_custom_kubeconfig(kubeconfig, &options).await?
        }
        None if context.is_some() => Config::from_kubeconfig(&options).await?,
        None => Config::infer().await?,
    };

    tracing::debug!(
        "Using cluster {} (namespace {})",
        config.cluster_url,
        config.default_namespace
    );

    let default_namespace = config.default_namespace.clone();
    let client = Client::try_from(config).context("Failed to create Kubernetes client")?;
    Ok(ClusterConnection {
        client,
        default_namespace,
    })
}
