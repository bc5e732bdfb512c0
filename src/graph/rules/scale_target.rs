use async_trait::async_trait;
use serde_json::Value;

use super::{Candidate, RelationRule, RuleContext};
use crate::graph::models::{RelationKind, ResourceRef};
use crate::graph::value::{lookup, str_at};

/// Autoscaler `spec.scaleTargetRef` (or VPA-style `spec.targetRef`) → `ScaleTargets`
///
/// Missing `kind` / `apiVersion` default to `apps/v1` Deployment, matching
/// what KEDA assumes for ScaledObjects.
pub struct ScaleTargetRule;

#[async_trait]
impl RelationRule for ScaleTargetRule {
    fn name(&self) -> &'static str {
        "scale-target"
    }

    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Vec<Candidate> {
        let Some(target) = lookup(object, &["spec", "scaleTargetRef"])
            .or_else(|| lookup(object, &["spec", "targetRef"]))
        else {
            return Vec::new();
        };
        let Some(name) = str_at(target, &["name"]) else {
            return Vec::new();
        };

        let kind = str_at(target, &["kind"]).unwrap_or("Deployment");
        let api_version = str_at(target, &["apiVersion"]).unwrap_or("apps/v1");

        vec![Candidate::new(
            ResourceRef::new(kind, api_version, subject.namespace.as_str(), name),
            RelationKind::ScaleTargets,
        )]
    }
}
