//! Live cluster accessor
//!
//! Reads objects through `Api<DynamicObject>` so any kind the API server
//! serves can be fetched, CRDs included.

use async_trait::async_trait;
use kube::Client;
use kube::api::{Api, ListParams};
use kube::core::{ApiResource, DynamicObject};
use serde_json::Value;
use tokio::sync::OnceCell;

use super::registry::KindRegistry;
use crate::graph::{AccessError, Gvr, LabelSelector, ResolvedKind, ResourceAccessor};

/// [`ResourceAccessor`] backed by a kube client
///
/// The kind registry is discovered on first use and kept for the lifetime
/// of the accessor.
pub struct KubeAccessor {
    client: Client,
    registry: OnceCell<KindRegistry>,
}

impl KubeAccessor {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            registry: OnceCell::new(),
        }
    }

    /// Use a prepared registry instead of API discovery
    pub fn with_registry(client: Client, registry: KindRegistry) -> Self {
        Self {
            client,
            registry: OnceCell::new_with(Some(registry)),
        }
    }

    async fn registry(&self) -> Result<&KindRegistry, AccessError> {
        self.registry
            .get_or_try_init(|| async {
                KindRegistry::discover(&self.client)
                    .await
                    .map_err(|e| AccessError::Access(format!("API discovery failed: {}", e)))
            })
            .await
    }

    async fn api(&self, gvr: &Gvr, namespace: &str) -> Result<Api<DynamicObject>, AccessError> {
        let registry = self.registry().await?;
        let kind = registry.kind_for(gvr).unwrap_or(gvr.resource.as_str());

        let api_resource = ApiResource {
            group: gvr.group.clone(),
            version: gvr.version.clone(),
            api_version: gvr.api_version(),
            kind: kind.to_string(),
            plural: gvr.resource.clone(),
        };

        Ok(if namespace.is_empty() {
            Api::all_with(self.client.clone(), &api_resource)
        } else {
            Api::namespaced_with(self.client.clone(), namespace, &api_resource)
        })
    }
}

#[async_trait]
impl ResourceAccessor for KubeAccessor {
    async fn resolve_kind(&self, name: &str) -> Result<ResolvedKind, AccessError> {
        self.registry().await?.resolve(name)
    }

    async fn get(&self, gvr: &Gvr, namespace: &str, name: &str) -> Result<Value, AccessError> {
        let api = self.api(gvr, namespace).await?;
        let obj = api.get(name).await.map_err(|e| map_error(e, gvr, name))?;
        let mut value = to_value(&obj)?;
        fill_type_meta(&mut value, &gvr.api_version(), kind_of(&obj));
        Ok(value)
    }

    async fn list(
        &self,
        gvr: &Gvr,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Value>, AccessError> {
        let api = self.api(gvr, namespace).await?;
        let params = if selector.is_empty() {
            ListParams::default()
        } else {
            ListParams::default().labels(&selector.to_query())
        };

        let list = api
            .list(&params)
            .await
            .map_err(|e| map_error(e, gvr, ""))?;

        let kind = self.registry().await?.kind_for(gvr).map(str::to_string);
        let api_version = gvr.api_version();

        let mut items = Vec::with_capacity(list.items.len());
        for obj in &list.items {
            let mut value = to_value(obj)?;
            // List items come back without apiVersion/kind
            fill_type_meta(&mut value, &api_version, kind.as_deref());
            // The server already filtered; re-check for set-based requirements
            // it may not support
            if selector.matches(&value) {
                items.push(value);
            }
        }

        tracing::debug!(
            "Listed {} {} in {:?} matching {}",
            items.len(),
            gvr,
            namespace,
            selector
        );
        Ok(items)
    }
}

fn kind_of(obj: &DynamicObject) -> Option<&str> {
    obj.types.as_ref().map(|t| t.kind.as_str())
}

fn to_value(obj: &DynamicObject) -> Result<Value, AccessError> {
    serde_json::to_value(obj).map_err(|e| AccessError::Access(format!("invalid object: {}", e)))
}

fn fill_type_meta(value: &mut Value, api_version: &str, kind: Option<&str>) {
    let Some(map) = value.as_object_mut() else {
        return;
    };
    if !map.contains_key("apiVersion") {
        map.insert("apiVersion".to_string(), Value::from(api_version));
    }
    if let Some(kind) = kind {
        if !map.contains_key("kind") {
            map.insert("kind".to_string(), Value::from(kind));
        }
    }
}

/// Map a kube error to the accessor's error kinds
fn map_error(err: kube::Error, gvr: &Gvr, name: &str) -> AccessError {
    match err {
        kube::Error::Api(ae) if ae.code == 404 => AccessError::NotFound {
            resource: gvr.resource.clone(),
            name: name.to_string(),
        },
        kube::Error::Api(ae) => AccessError::Access(format!("{} ({})", ae.message, ae.code)),
        other => AccessError::Access(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fill_type_meta_keeps_existing() {
        let mut value = json!({"apiVersion": "apps/v1", "kind": "ReplicaSet", "metadata": {}});
        fill_type_meta(&mut value, "apps/v2", Some("Other"));
        assert_eq!(value["apiVersion"], "apps/v1");
        assert_eq!(value["kind"], "ReplicaSet");
    }

    #[test]
    fn test_fill_type_meta_on_list_item() {
        let mut value = json!({"metadata": {"name": "web-1"}});
        fill_type_meta(&mut value, "v1", Some("Pod"));
        assert_eq!(value["apiVersion"], "v1");
        assert_eq!(value["kind"], "Pod");
    }
}
