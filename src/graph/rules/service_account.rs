use async_trait::async_trait;
use serde_json::Value;

use super::{Candidate, RelationRule, RuleContext, core_ref};
use crate::graph::models::{RelationKind, ResourceRef};
use crate::graph::value::{pod_spec, str_at};

/// Pod-spec service account → `References` edge
pub struct ServiceAccountRule;

#[async_trait]
impl RelationRule for ServiceAccountRule {
    fn name(&self) -> &'static str {
        "service-account"
    }

    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Vec<Candidate> {
        let Some(spec) = pod_spec(object) else {
            return Vec::new();
        };

        // serviceAccount is the deprecated alias
        str_at(spec, &["serviceAccountName"])
            .or_else(|| str_at(spec, &["serviceAccount"]))
            .map(|name| {
                Candidate::new(
                    core_ref("ServiceAccount", subject, name),
                    RelationKind::References,
                )
            })
            .into_iter()
            .collect()
    }
}
