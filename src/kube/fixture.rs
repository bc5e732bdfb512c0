//! In-memory accessor for tests and offline use
//!
//! Holds a fixed set of objects and answers `get`/`list` from them, with
//! optional per-object denials and artificial latency.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use super::registry::{KindEntry, KindRegistry};
use crate::graph::value::{object_api_version, object_kind, object_name, object_namespace};
use crate::graph::{AccessError, Gvr, LabelSelector, ResolvedKind, ResourceAccessor};

/// (group, resource, namespace, name)
type StoreKey = (String, String, String, String);

/// [`ResourceAccessor`] over a static set of objects
pub struct FixtureAccessor {
    registry: KindRegistry,
    objects: BTreeMap<StoreKey, Value>,
    denied_gets: HashSet<StoreKey>,
    /// (group, resource, namespace)
    denied_lists: HashSet<(String, String, String)>,
    latency: Option<Duration>,
    get_counts: Mutex<HashMap<StoreKey, usize>>,
}

impl Default for FixtureAccessor {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureAccessor {
    /// Empty fixture with the built-in kinds registered
    pub fn new() -> Self {
        Self::with_registry(KindRegistry::builtin())
    }

    pub fn with_registry(registry: KindRegistry) -> Self {
        Self {
            registry,
            objects: BTreeMap::new(),
            denied_gets: HashSet::new(),
            denied_lists: HashSet::new(),
            latency: None,
            get_counts: Mutex::new(HashMap::new()),
        }
    }

    /// Register an extra resource type, e.g. a CRD
    pub fn with_kind(mut self, entry: KindEntry) -> Self {
        self.registry.add(entry);
        self
    }

    /// Add an object; its `apiVersion` and `kind` must resolve
    ///
    /// Objects whose type cannot be resolved are ignored with a warning.
    pub fn with_object(mut self, object: Value) -> Self {
        match self.store_key(&object) {
            Some(key) => {
                self.objects.insert(key, object);
            }
            None => tracing::warn!("Ignoring fixture object with unknown type: {}", object),
        }
        self
    }

    pub fn with_objects(self, objects: impl IntoIterator<Item = Value>) -> Self {
        objects.into_iter().fold(self, |acc, obj| acc.with_object(obj))
    }

    /// Make `get` of one object fail with a permission error
    pub fn deny_get(mut self, kind: &str, namespace: &str, name: &str) -> Self {
        if let Ok(resolved) = self.registry.resolve(kind) {
            self.denied_gets.insert(key_for(&resolved.gvr, namespace, name));
        }
        self
    }

    /// Make `list` of a kind in a namespace fail with a permission error
    pub fn deny_list(mut self, kind: &str, namespace: &str) -> Self {
        if let Ok(resolved) = self.registry.resolve(kind) {
            self.denied_lists.insert((
                resolved.gvr.group,
                resolved.gvr.resource,
                namespace.to_string(),
            ));
        }
        self
    }

    /// Delay every `get` and `list` call
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// How many times `get` was called for an object
    pub fn get_count(&self, kind: &str, namespace: &str, name: &str) -> usize {
        let Ok(resolved) = self.registry.resolve(kind) else {
            return 0;
        };
        let key = key_for(&resolved.gvr, namespace, name);
        self.get_counts
            .lock()
            .map(|counts| counts.get(&key).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    /// Total `get` calls across all objects
    pub fn total_gets(&self) -> usize {
        self.get_counts
            .lock()
            .map(|counts| counts.values().sum())
            .unwrap_or(0)
    }

    fn store_key(&self, object: &Value) -> Option<StoreKey> {
        let api_version = object_api_version(object)?;
        let kind = object_kind(object)?;
        let group = api_version
            .split_once('/')
            .map(|(group, _)| group)
            .unwrap_or("");
        let resolved = self.registry.resolve(&format!("{}.{}", kind, group)).ok()?;
        let namespace = if resolved.namespaced {
            object_namespace(object)
        } else {
            ""
        };
        Some(key_for(&resolved.gvr, namespace, object_name(object)?))
    }

    async fn delay(&self) {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
    }
}

fn key_for(gvr: &Gvr, namespace: &str, name: &str) -> StoreKey {
    (
        gvr.group.clone(),
        gvr.resource.clone(),
        namespace.to_string(),
        name.to_string(),
    )
}

#[async_trait]
impl ResourceAccessor for FixtureAccessor {
    async fn resolve_kind(&self, name: &str) -> Result<ResolvedKind, AccessError> {
        self.registry.resolve(name)
    }

    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<Value, AccessError> {
        self.delay().await;
        let key = key_for(gvr, namespace, name);

        if let Ok(mut counts) = self.get_counts.lock() {
            *counts.entry(key.clone()).or_insert(0) += 1;
        }

        if self.denied_gets.contains(&key) {
            return Err(AccessError::Access(format!(
                "{} \"{}\" is forbidden",
                gvr.resource, name
            )));
        }

        self.objects
            .get(&key)
            .cloned()
            .ok_or_else(|| AccessError::NotFound {
                resource: gvr.resource.clone(),
                name: name.to_string(),
            })
    }

    async fn list(
        &self,
        gvr: &Gvr,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Value>, AccessError> {
        self.delay().await;

        let denied = (
            gvr.group.clone(),
            gvr.resource.clone(),
            namespace.to_string(),
        );
        if self.denied_lists.contains(&denied) {
            return Err(AccessError::Access(format!(
                "cannot list {} in namespace \"{}\"",
                gvr.resource, namespace
            )));
        }

        Ok(self
            .objects
            .iter()
            .filter(|((group, resource, ns, _), _)| {
                group == &gvr.group
                    && resource == &gvr.resource
                    && (namespace.is_empty() || ns == namespace)
            })
            .map(|(_, obj)| obj)
            .filter(|obj| selector.matches(obj))
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn pod(name: &str, app: &str) -> Value {
        json!({
            "apiVersion": "v1",
            "kind": "Pod",
            "metadata": {"name": name, "namespace": "default", "labels": {"app": app}}
        })
    }

    #[tokio::test]
    async fn test_get_and_list() {
        let fixture = FixtureAccessor::new()
            .with_object(pod("web-1", "web"))
            .with_object(pod("db-1", "db"));
        let pods = fixture.resolve_kind("po").await.unwrap();

        let obj = fixture.get(&pods.gvr, "default", "web-1").await.unwrap();
        assert_eq!(obj["metadata"]["name"], "web-1");
        assert_eq!(fixture.get_count("Pod", "default", "web-1"), 1);

        let web = LabelSelector::from_labels([("app", "web")]);
        let listed = fixture.list(&pods.gvr, "default", &web).await.unwrap();
        assert_eq!(listed.len(), 1);

        let missing = fixture.get(&pods.gvr, "default", "nope").await;
        assert!(matches!(missing, Err(AccessError::NotFound { .. })));
    }

    #[tokio::test]
    async fn test_denials() {
        let fixture = FixtureAccessor::new()
            .with_object(pod("web-1", "web"))
            .deny_get("Pod", "default", "web-1")
            .deny_list("Pod", "default");
        let pods = fixture.resolve_kind("Pod").await.unwrap();

        assert!(matches!(
            fixture.get(&pods.gvr, "default", "web-1").await,
            Err(AccessError::Access(_))
        ));
        assert!(matches!(
            fixture
                .list(&pods.gvr, "default", &LabelSelector::default())
                .await,
            Err(AccessError::Access(_))
        ));
    }
}
