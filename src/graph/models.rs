//! Graph data structures for object relationships
//!
//! A [`Graph`] is produced once by the builder and then only read by the
//! renderers. Nodes keep their insertion order so output is stable across runs.

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;

use super::accessor::{AccessError, Gvr};
use super::value::{object_api_version, object_kind, object_name, object_namespace, object_uid};

/// Reference to a cluster object as declared by another object or the user
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ResourceRef {
    pub kind: String,
    /// Empty when unknown (e.g. a kind typed on the command line)
    pub api_version: String,
    /// Empty for cluster-scoped objects
    pub namespace: String,
    pub name: String,
    pub uid: Option<String>,
}

impl ResourceRef {
    pub fn new(
        kind: impl Into<String>,
        api_version: impl Into<String>,
        namespace: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            kind: kind.into(),
            api_version: api_version.into(),
            namespace: namespace.into(),
            name: name.into(),
            uid: None,
        }
    }

    pub fn with_uid(mut self, uid: Option<&str>) -> Self {
        self.uid = uid.map(|u| u.to_string());
        self
    }

    /// Build a reference from an object's own `kind`, `apiVersion` and metadata
    pub fn from_object(obj: &Value) -> Option<Self> {
        Some(
            Self::new(
                object_kind(obj)?,
                object_api_version(obj).unwrap_or(""),
                object_namespace(obj),
                object_name(obj)?,
            )
            .with_uid(object_uid(obj)),
        )
    }

    /// API group from `apiVersion` ("" for the core group)
    pub fn group(&self) -> &str {
        self.api_version
            .split_once('/')
            .map(|(group, _)| group)
            .unwrap_or("")
    }

    /// Query string for kind resolution
    ///
    /// Group-qualified (`Deployment.apps`, `Pod.` for core) when the API
    /// version is known, so that kinds sharing a name across groups resolve
    /// to the one the reference actually points at.
    pub fn kind_query(&self) -> String {
        if self.api_version.is_empty() {
            self.kind.clone()
        } else {
            format!("{}.{}", self.kind, self.group())
        }
    }

    /// `Kind/Name` label used by both renderers
    pub fn display_name(&self) -> String {
        format!("{}/{}", self.kind, self.name)
    }
}

impl fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace.is_empty() {
            write!(f, "{}/{}", self.kind, self.name)
        } else {
            write!(f, "{}/{}/{}", self.kind, self.namespace, self.name)
        }
    }
}

/// Deduplication identity of a node: resource type, namespace and name
///
/// The version is deliberately left out so the same object reached through
/// two API versions maps to one node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectKey {
    pub group: String,
    pub resource: String,
    pub namespace: String,
    pub name: String,
}

impl ObjectKey {
    pub fn new(gvr: &Gvr, namespace: &str, name: &str) -> Self {
        Self {
            group: gvr.group.clone(),
            resource: gvr.resource.clone(),
            namespace: namespace.to_string(),
            name: name.to_string(),
        }
    }

    /// Key for a reference whose kind could not be resolved
    pub fn unresolved(reference: &ResourceRef) -> Self {
        Self {
            group: reference.group().to_string(),
            resource: reference.kind.to_lowercase(),
            namespace: reference.namespace.clone(),
            name: reference.name.clone(),
        }
    }
}

impl fmt::Display for ObjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.group.is_empty() {
            write!(f, "{}", self.resource)?;
        } else {
            write!(f, "{}.{}", self.resource, self.group)?;
        }
        if !self.namespace.is_empty() {
            write!(f, "/{}", self.namespace)?;
        }
        write!(f, "/{}", self.name)
    }
}

/// Type of relationship between nodes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelationKind {
    /// Points from a dependent to its owner
    Owns,
    /// Points from the object declaring a label selector to each match
    Selects,
    /// Env, pull-secret, service-account and similar by-name references
    References,
    /// Volume sources
    Mounts,
    /// Ingress / route backends
    Routes,
    /// Autoscaler targets
    ScaleTargets,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Owns => "Owns",
            RelationKind::Selects => "Selects",
            RelationKind::References => "References",
            RelationKind::Mounts => "Mounts",
            RelationKind::Routes => "Routes",
            RelationKind::ScaleTargets => "ScaleTargets",
        }
    }
}

impl fmt::Display for RelationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A directed edge recorded on its `from` node
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub from: ObjectKey,
    pub to: ObjectKey,
    pub kind: RelationKind,
    /// Graph-wide discovery sequence number
    pub order: u64,
}

/// What the builder learned about a node
#[derive(Debug, Clone)]
pub enum NodeContent {
    /// The live object as returned by the API server
    Resolved(Value),
    /// The object could not be fetched; never expanded
    Stub(AccessError),
}

/// A node in the relationship graph
#[derive(Debug, Clone)]
pub struct Node {
    pub key: ObjectKey,
    pub reference: ResourceRef,
    pub content: NodeContent,
    pub relations: Vec<Relation>,
}

impl Node {
    pub fn is_stub(&self) -> bool {
        matches!(self.content, NodeContent::Stub(_))
    }

    pub fn object(&self) -> Option<&Value> {
        match &self.content {
            NodeContent::Resolved(obj) => Some(obj),
            NodeContent::Stub(_) => None,
        }
    }

    pub fn error(&self) -> Option<&AccessError> {
        match &self.content {
            NodeContent::Resolved(_) => None,
            NodeContent::Stub(err) => Some(err),
        }
    }

    pub fn has_relation(&self, to: &ObjectKey, kind: RelationKind) -> bool {
        self.relations.iter().any(|r| &r.to == to && r.kind == kind)
    }
}

/// The relationship graph rooted at one object
#[derive(Debug, Clone)]
pub struct Graph {
    root: ObjectKey,
    nodes: Vec<Node>,
    node_index: HashMap<ObjectKey, usize>,
    truncated: bool,
    node_cap: usize,
}

impl Graph {
    pub(crate) fn new(root: ObjectKey, node_cap: usize) -> Self {
        Self {
            root,
            nodes: Vec::new(),
            node_index: HashMap::new(),
            truncated: false,
            node_cap,
        }
    }

    /// Insert a node; the caller guarantees the key is new
    pub(crate) fn insert(&mut self, node: Node) -> usize {
        let index = self.nodes.len();
        self.node_index.insert(node.key.clone(), index);
        self.nodes.push(node);
        index
    }

    pub(crate) fn node_mut(&mut self, index: usize) -> &mut Node {
        &mut self.nodes[index]
    }

    pub(crate) fn mark_truncated(&mut self) {
        self.truncated = true;
    }

    /// Drop relations whose target never became a node
    pub(crate) fn prune_dangling(&mut self) {
        let index = &self.node_index;
        for node in &mut self.nodes {
            node.relations.retain(|r| index.contains_key(&r.to));
        }
    }

    pub fn root(&self) -> &ObjectKey {
        &self.root
    }

    pub fn root_node(&self) -> Option<&Node> {
        self.node(&self.root)
    }

    /// Nodes in insertion (discovery) order
    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn node(&self, key: &ObjectKey) -> Option<&Node> {
        self.node_index.get(key).map(|&i| &self.nodes[i])
    }

    pub fn contains(&self, key: &ObjectKey) -> bool {
        self.node_index.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All relations, grouped by source node in insertion order
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.nodes.iter().flat_map(|n| n.relations.iter())
    }

    pub fn relation_count(&self) -> usize {
        self.nodes.iter().map(|n| n.relations.len()).sum()
    }

    pub fn truncated(&self) -> bool {
        self.truncated
    }

    pub fn node_cap(&self) -> usize {
        self.node_cap
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_kind_query() {
        let deploy = ResourceRef::new("Deployment", "apps/v1", "default", "web");
        assert_eq!(deploy.kind_query(), "Deployment.apps");

        let pod = ResourceRef::new("Pod", "v1", "default", "web-1");
        assert_eq!(pod.kind_query(), "Pod.");

        let typed = ResourceRef::new("svc", "", "default", "web");
        assert_eq!(typed.kind_query(), "svc");
    }

    #[test]
    fn test_ref_from_object() {
        let obj = json!({
            "apiVersion": "apps/v1",
            "kind": "ReplicaSet",
            "metadata": {"name": "web-7f9c", "namespace": "default", "uid": "rs-1"}
        });
        let reference = ResourceRef::from_object(&obj).unwrap();
        assert_eq!(reference.display_name(), "ReplicaSet/web-7f9c");
        assert_eq!(reference.uid.as_deref(), Some("rs-1"));
        assert_eq!(reference.to_string(), "ReplicaSet/default/web-7f9c");
    }

    #[test]
    fn test_object_key_display() {
        let gvr = Gvr::new("apps", "v1", "deployments");
        assert_eq!(
            ObjectKey::new(&gvr, "default", "web").to_string(),
            "deployments.apps/default/web"
        );
        let pv = Gvr::new("", "v1", "persistentvolumes");
        assert_eq!(ObjectKey::new(&pv, "", "pv-1").to_string(), "persistentvolumes/pv-1");
    }
}
