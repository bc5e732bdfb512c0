use async_trait::async_trait;
use serde_json::Value;

use super::{Candidate, RelationRule, RuleContext};
use crate::graph::models::{RelationKind, ResourceRef};
use crate::graph::selector::LabelSelector;
use crate::graph::value::{object_name, object_namespace, object_uid};

/// Kind listed by a selector, keyed by the kind declaring it
///
/// Deployments select through their ReplicaSets; ServiceMonitors select
/// Services; everything else (Services, ReplicaSets, StatefulSets, DaemonSets,
/// Jobs, PodDisruptionBudgets, NetworkPolicies, unknown CRDs) selects Pods.
fn selection_target(kind: &str) -> (&'static str, &'static str) {
    match kind {
        "Deployment" => ("ReplicaSet", "apps/v1"),
        "ServiceMonitor" => ("Service", "v1"),
        _ => ("Pod", "v1"),
    }
}

/// Declared label selector → `Selects` edges to every match in the namespace
pub struct LabelSelectorRule;

#[async_trait]
impl RelationRule for LabelSelectorRule {
    fn name(&self) -> &'static str {
        "label-selector"
    }

    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        ctx: &RuleContext<'_>,
    ) -> Vec<Candidate> {
        let Some(selector) = LabelSelector::from_object(object) else {
            return Vec::new();
        };
        // An empty selector would pull in the whole namespace
        if selector.is_empty() {
            return Vec::new();
        }

        let (target_kind, target_api_version) = selection_target(&subject.kind);
        let target_ref = ResourceRef::new(target_kind, target_api_version, "", "");

        let matches = match ctx
            .list(&target_ref.kind_query(), &subject.namespace, &selector)
            .await
        {
            Ok(items) => items,
            Err(e) => {
                tracing::warn!(
                    "Failed to list {} selected by {}: {}",
                    target_kind,
                    subject,
                    e
                );
                return Vec::new();
            }
        };

        tracing::debug!(
            "{} selector '{}' matched {} {} objects",
            subject,
            selector,
            matches.len(),
            target_kind
        );

        matches
            .iter()
            .filter_map(|item| {
                let name = object_name(item)?;
                // A cluster-scoped selector owner lists across namespaces
                let namespace = match object_namespace(item) {
                    "" => subject.namespace.as_str(),
                    ns => ns,
                };
                let target = ResourceRef::new(target_kind, target_api_version, namespace, name)
                .with_uid(object_uid(item));
                Some(target)
            })
            .filter(|target| {
                !(target.kind == subject.kind
                    && target.namespace == subject.namespace
                    && target.name == subject.name)
            })
            .map(|target| Candidate::new(target, RelationKind::Selects))
            .collect()
    }
}
