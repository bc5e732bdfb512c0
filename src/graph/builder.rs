//! Graph builder for discovering object relationships
//!
//! Breadth-first traversal from a root object. Each BFS level is expanded
//! concurrently (fetch + every relation rule) on a bounded pool, and the
//! results are merged into the graph one at a time in frontier order. The
//! merge step is the only place the graph and the visited set change, which
//! keeps "each identity expanded once" true and the output deterministic.

use futures::stream::{self, StreamExt};
use serde_json::Value;
use std::collections::HashSet;
use std::time::Duration;
use tokio::sync::watch;

use super::accessor::{AccessError, ResolvedKind, ResourceAccessor, with_deadline};
use super::error::GraphError;
use super::models::{Graph, Node, NodeContent, ObjectKey, Relation, RelationKind, ResourceRef};
use super::rules::{RelationRule, RuleContext, default_rules};
use super::value::{object_api_version, object_kind, object_uid};

/// Default maximum number of nodes in a graph
pub const DEFAULT_NODE_CAP: usize = 500;

/// Default number of objects expanded in parallel
pub const DEFAULT_CONCURRENCY: usize = 8;

/// Default deadline for a single accessor call
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Traversal limits
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildOptions {
    /// Maximum number of nodes; values below 1 are raised to 1 so the root
    /// is always kept
    pub node_cap: usize,
    pub concurrency: usize,
    pub request_timeout: Duration,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            node_cap: DEFAULT_NODE_CAP,
            concurrency: DEFAULT_CONCURRENCY,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// Sending half of a cancellation pair
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        // Nobody listening means nothing left to cancel
        let _ = self.tx.send(true);
    }
}

/// Receiving half of a cancellation pair
#[derive(Debug, Clone)]
pub struct CancelSignal {
    rx: watch::Receiver<bool>,
}

impl CancelSignal {
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolves once cancellation is requested; never resolves if the handle
    /// is dropped without cancelling
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        if rx.wait_for(|cancelled| *cancelled).await.is_err() {
            std::future::pending::<()>().await;
        }
    }
}

/// Create a linked cancel handle and signal
pub fn cancel_pair() -> (CancelHandle, CancelSignal) {
    let (tx, rx) = watch::channel(false);
    (CancelHandle { tx }, CancelSignal { rx })
}

/// A reference waiting in the frontier, already resolved to its identity
struct Pending {
    key: ObjectKey,
    reference: ResourceRef,
    resolved: Result<ResolvedKind, AccessError>,
}

struct Target {
    pending: Pending,
    kind: RelationKind,
}

/// Outcome of expanding one object, merged later by the traversal
struct Expansion {
    key: ObjectKey,
    reference: ResourceRef,
    content: NodeContent,
    targets: Vec<Target>,
}

impl Expansion {
    fn stub(key: ObjectKey, reference: ResourceRef, error: AccessError) -> Self {
        Self {
            key,
            reference,
            content: NodeContent::Stub(error),
            targets: Vec::new(),
        }
    }
}

/// Mutable traversal state, owned by the single merging task
struct Traversal {
    graph: Graph,
    visited: HashSet<ObjectKey>,
    sequence: u64,
}

impl Traversal {
    fn new(root: ObjectKey, node_cap: usize) -> Self {
        let mut visited = HashSet::new();
        visited.insert(root.clone());
        Self {
            graph: Graph::new(root, node_cap),
            visited,
            sequence: 0,
        }
    }

    fn capacity_left(&self) -> usize {
        self.graph.node_cap().saturating_sub(self.graph.len())
    }

    /// Insert the expanded node, record its relations and return newly seen targets
    fn merge(&mut self, expansion: Expansion) -> Vec<Pending> {
        let Expansion {
            key,
            reference,
            content,
            targets,
        } = expansion;

        let index = self.graph.insert(Node {
            key: key.clone(),
            reference,
            content,
            relations: Vec::new(),
        });

        let mut discovered = Vec::new();
        for Target { pending, kind } in targets {
            let to = pending.key.clone();

            // Another rule already declared the same edge
            if self.graph.nodes()[index].has_relation(&to, kind) {
                continue;
            }
            // The selected object already points back at us through ownership
            if kind == RelationKind::Selects
                && self
                    .graph
                    .node(&to)
                    .is_some_and(|n| n.has_relation(&key, RelationKind::Owns))
            {
                continue;
            }

            self.sequence += 1;
            self.graph.node_mut(index).relations.push(Relation {
                from: key.clone(),
                to: to.clone(),
                kind,
                order: self.sequence,
            });

            if self.visited.insert(to) {
                discovered.push(pending);
            }
        }
        discovered
    }

    fn finish(mut self) -> Graph {
        if self.graph.truncated() {
            self.graph.prune_dangling();
        }
        self.graph
    }
}

/// Builds a relationship graph through a [`ResourceAccessor`]
pub struct GraphBuilder<'a> {
    accessor: &'a dyn ResourceAccessor,
    rules: Vec<Box<dyn RelationRule>>,
    options: BuildOptions,
    cancel: Option<CancelSignal>,
}

impl<'a> GraphBuilder<'a> {
    pub fn new(accessor: &'a dyn ResourceAccessor) -> Self {
        Self {
            accessor,
            rules: default_rules(),
            options: BuildOptions::default(),
            cancel: None,
        }
    }

    pub fn with_options(mut self, options: BuildOptions) -> Self {
        self.options = options;
        self
    }

    /// Replace the registered rule set
    pub fn with_rules(mut self, rules: Vec<Box<dyn RelationRule>>) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_cancel(mut self, cancel: CancelSignal) -> Self {
        self.cancel = Some(cancel);
        self
    }

    /// Build the graph rooted at `kind`/`name` in `namespace`
    ///
    /// Fails only when the root cannot be resolved or fetched, or when the
    /// build is cancelled. Every other failure becomes a stub node.
    pub async fn build(
        &self,
        kind: &str,
        namespace: &str,
        name: &str,
    ) -> Result<Graph, GraphError> {
        let Some(cancel) = &self.cancel else {
            return self.traverse(kind, namespace, name).await;
        };
        if cancel.is_cancelled() {
            return Err(GraphError::Cancelled);
        }

        tokio::select! {
            biased;
            _ = cancel.cancelled() => {
                tracing::debug!("Graph build for {}/{} cancelled", kind, name);
                Err(GraphError::Cancelled)
            }
            result = self.traverse(kind, namespace, name) => result,
        }
    }

    async fn traverse(&self, kind: &str, namespace: &str, name: &str) -> Result<Graph, GraphError> {
        let deadline = self.options.request_timeout;

        let resolved = with_deadline(deadline, self.accessor.resolve_kind(kind))
            .await
            .map_err(|e| GraphError::from_root(e, kind, namespace, name))?;
        let namespace = if resolved.namespaced { namespace } else { "" };

        let object = with_deadline(deadline, self.accessor.get(&resolved.gvr, namespace, name))
            .await
            .map_err(|e| GraphError::from_root(e, &resolved.kind, namespace, name))?;

        let root_key = ObjectKey::new(&resolved.gvr, namespace, name);
        let root_ref = canonical_ref(
            ResourceRef::new(
                resolved.kind.as_str(),
                resolved.gvr.api_version(),
                namespace,
                name,
            ),
            &object,
        );
        tracing::debug!("Building graph rooted at {}", root_ref);

        let mut traversal = Traversal::new(root_key.clone(), self.options.node_cap.max(1));
        let root = self.discover(root_key, root_ref, object).await;
        let mut frontier = traversal.merge(root);
        let mut depth = 0usize;

        while !frontier.is_empty() {
            let remaining = traversal.capacity_left();
            if remaining == 0 {
                traversal.graph.mark_truncated();
                break;
            }
            if frontier.len() > remaining {
                frontier.truncate(remaining);
                traversal.graph.mark_truncated();
            }

            depth += 1;
            let level = std::mem::take(&mut frontier);
            tracing::debug!("Expanding {} objects at depth {}", level.len(), depth);

            let expansions: Vec<Expansion> = stream::iter(level)
                .map(|pending| self.expand(pending))
                .buffered(self.options.concurrency.max(1))
                .collect()
                .await;

            for expansion in expansions {
                frontier.extend(traversal.merge(expansion));
            }
        }

        if traversal.graph.truncated() {
            tracing::warn!(
                "Graph truncated at {} nodes",
                traversal.graph.node_cap()
            );
        }
        tracing::debug!(
            "Graph complete: {} nodes, {} relations",
            traversal.graph.len(),
            traversal.graph.relation_count()
        );

        Ok(traversal.finish())
    }

    /// Fetch a frontier object and run the rules over it
    async fn expand(&self, pending: Pending) -> Expansion {
        let Pending {
            key,
            reference,
            resolved,
        } = pending;

        let resolved = match resolved {
            Ok(resolved) => resolved,
            Err(e) => return Expansion::stub(key, reference, e),
        };

        let fetched = with_deadline(
            self.options.request_timeout,
            self.accessor
                .get(&resolved.gvr, &reference.namespace, &reference.name),
        )
        .await;

        let object = match fetched {
            Ok(object) => object,
            Err(e) => {
                tracing::warn!("Failed to fetch {}: {}", reference, e);
                return Expansion::stub(key, reference, e);
            }
        };

        if let Err(e) = check_uid(&reference, &object) {
            tracing::warn!("Stale reference to {}: {}", reference, e);
            return Expansion::stub(key, reference, e);
        }

        let reference = canonical_ref(reference, &object);
        self.discover(key, reference, object).await
    }

    /// Apply every rule in order and resolve the targets they declare
    async fn discover(&self, key: ObjectKey, reference: ResourceRef, object: Value) -> Expansion {
        let ctx = RuleContext::new(self.accessor, self.options.request_timeout);

        let mut candidates = Vec::new();
        for rule in &self.rules {
            let found = rule.inspect(&reference, &object, &ctx).await;
            if !found.is_empty() {
                tracing::debug!("{}: {} found {} relations", reference, rule.name(), found.len());
            }
            candidates.extend(found);
        }

        let mut targets = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            targets.push(Target {
                pending: self.resolve_target(candidate.target, &reference).await,
                kind: candidate.kind,
            });
        }

        Expansion {
            key,
            reference,
            content: NodeContent::Resolved(object),
            targets,
        }
    }

    /// Resolve a declared reference to its identity, normalising its namespace
    async fn resolve_target(&self, mut reference: ResourceRef, source: &ResourceRef) -> Pending {
        if reference.namespace.is_empty() {
            reference.namespace = source.namespace.clone();
        }

        let query = reference.kind_query();
        let mut resolved =
            with_deadline(self.options.request_timeout, self.accessor.resolve_kind(&query)).await;
        // Legacy group in apiVersion (e.g. extensions/v1beta1)
        if matches!(resolved, Err(AccessError::KindNotFound(_))) && query != reference.kind {
            resolved = with_deadline(
                self.options.request_timeout,
                self.accessor.resolve_kind(&reference.kind),
            )
            .await;
        }

        match resolved {
            Ok(resolved) => {
                if !resolved.namespaced {
                    reference.namespace.clear();
                }
                reference.kind = resolved.kind.clone();
                let key = ObjectKey::new(&resolved.gvr, &reference.namespace, &reference.name);
                Pending {
                    key,
                    reference,
                    resolved: Ok(resolved),
                }
            }
            Err(e) => {
                tracing::warn!("Cannot resolve {} referenced by {}: {}", query, source, e);
                Pending {
                    key: ObjectKey::unresolved(&reference),
                    reference,
                    resolved: Err(e),
                }
            }
        }
    }
}

/// Build a graph with default rules and the given node cap
///
/// A `node_cap` of 0 behaves like 1: the graph holds only the root.
pub async fn build(
    accessor: &dyn ResourceAccessor,
    kind: &str,
    namespace: &str,
    name: &str,
    node_cap: usize,
) -> Result<Graph, GraphError> {
    GraphBuilder::new(accessor)
        .with_options(BuildOptions {
            node_cap,
            ..BuildOptions::default()
        })
        .build(kind, namespace, name)
        .await
}

/// Take kind, apiVersion and uid from the live object
fn canonical_ref(mut reference: ResourceRef, object: &Value) -> ResourceRef {
    if let Some(kind) = object_kind(object) {
        reference.kind = kind.to_string();
    }
    if let Some(api_version) = object_api_version(object) {
        reference.api_version = api_version.to_string();
    }
    if let Some(uid) = object_uid(object) {
        reference.uid = Some(uid.to_string());
    }
    reference
}

/// A reference carrying a uid must point at that exact object
fn check_uid(reference: &ResourceRef, object: &Value) -> Result<(), AccessError> {
    match (reference.uid.as_deref(), object_uid(object)) {
        (Some(expected), Some(found)) if expected != found => Err(AccessError::UidMismatch {
            expected: expected.to_string(),
            found: found.to_string(),
        }),
        _ => Ok(()),
    }
}
