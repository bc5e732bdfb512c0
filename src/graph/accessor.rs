//! Resource accessor capability
//!
//! The graph builder reads the cluster only through [`ResourceAccessor`]:
//! kind resolution, fetch-by-identity and list-by-selector. The kube-backed
//! implementation lives in `crate::kube`; tests use the in-memory fixture.

use async_trait::async_trait;
use serde_json::Value;
use std::fmt;
use std::future::Future;
use std::time::Duration;

use super::selector::LabelSelector;

/// Fully qualified resource type
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Gvr {
    pub group: String,
    pub version: String,
    /// Plural resource name, e.g. `deployments`
    pub resource: String,
}

impl Gvr {
    pub fn new(
        group: impl Into<String>,
        version: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            group: group.into(),
            version: version.into(),
            resource: resource.into(),
        }
    }

    /// `apiVersion` string (`v1`, `apps/v1`)
    pub fn api_version(&self) -> String {
        if self.group.is_empty() {
            self.version.clone()
        } else {
            format!("{}/{}", self.group, self.version)
        }
    }
}

impl fmt::Display for Gvr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}.{}", self.resource, self.version)
        } else {
            write!(f, "{}.{}.{}", self.resource, self.version, self.group)
        }
    }
}

/// Result of resolving a kind name
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedKind {
    pub gvr: Gvr,
    /// Canonical kind, e.g. `Deployment` for `deploy`
    pub kind: String,
    pub namespaced: bool,
}

/// Accessor errors
///
/// Any of these on the root object stops a build. Below the root they are
/// recorded on a stub node.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AccessError {
    #[error("the server doesn't have a resource type \"{0}\"")]
    KindNotFound(String),

    #[error("\"{name}\" is ambiguous, it matches {}", .candidates.join(", "))]
    AmbiguousKind {
        name: String,
        candidates: Vec<String>,
    },

    #[error("{resource} \"{name}\" not found")]
    NotFound { resource: String, name: String },

    #[error("access failed: {0}")]
    Access(String),

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("object uid is {found}, reference expects {expected}")]
    UidMismatch { expected: String, found: String },
}

/// Read-only access to cluster objects
#[async_trait]
pub trait ResourceAccessor: Send + Sync {
    /// Resolve a kind name, plural, singular or short name
    ///
    /// `name` may be group-qualified (`deployments.apps`); an empty group
    /// after the dot (`Pod.`) selects the core group.
    async fn resolve_kind(&self, name: &str) -> Result<ResolvedKind, AccessError>;

    /// Fetch one object; `namespace` is empty for cluster-scoped resources
    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<Value, AccessError>;

    /// List objects in `namespace` matching `selector` (empty selector lists all)
    async fn list(
        &self,
        gvr: &Gvr,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Value>, AccessError>;
}

/// Run an accessor call under a deadline
pub async fn with_deadline<T>(
    deadline: Duration,
    call: impl Future<Output = Result<T, AccessError>>,
) -> Result<T, AccessError> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(AccessError::Timeout(deadline)),
    }
}
