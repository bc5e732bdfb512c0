use async_trait::async_trait;
use serde_json::Value;

use super::{Candidate, RelationRule, RuleContext};
use crate::graph::models::{RelationKind, ResourceRef};
use crate::graph::value::{array_at, str_at};

/// `metadata.ownerReferences[]` → `Owns` edges pointing at each owner
pub struct OwnerReferenceRule;

#[async_trait]
impl RelationRule for OwnerReferenceRule {
    fn name(&self) -> &'static str {
        "owner-references"
    }

    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Vec<Candidate> {
        array_at(object, &["metadata", "ownerReferences"])
            .iter()
            .filter_map(|owner| {
                let kind = str_at(owner, &["kind"])?;
                let name = str_at(owner, &["name"])?;
                let api_version = str_at(owner, &["apiVersion"]).unwrap_or("");
                // Owners live in the dependent's namespace or are cluster scoped
                let target = ResourceRef::new(kind, api_version, subject.namespace.as_str(), name)
                    .with_uid(str_at(owner, &["uid"]));
                Some(Candidate::new(target, RelationKind::Owns))
            })
            .collect()
    }
}
