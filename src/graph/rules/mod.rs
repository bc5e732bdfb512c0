//! Relation rules
//!
//! Each rule inspects one resolved object and declares the related objects
//! it recognises. Rules are duck-typed: they probe fields through the safe
//! lookups in [`crate::graph::value`] and simply return nothing when a shape
//! does not match, so they work on CRDs as well as built-in kinds.
//!
//! Rules run in the order returned by [`default_rules`], which fixes the
//! relation order within every node. New relation types are added by
//! appending a rule, never by touching the traversal.

mod owner;
mod routing;
mod scale_target;
mod selector;
mod service_account;
mod volume;

pub use owner::OwnerReferenceRule;
pub use routing::RoutingRule;
pub use scale_target::ScaleTargetRule;
pub use selector::LabelSelectorRule;
pub use service_account::ServiceAccountRule;
pub use volume::VolumeReferenceRule;

use async_trait::async_trait;
use serde_json::Value;
use std::time::Duration;

use super::accessor::{AccessError, ResourceAccessor, with_deadline};
use super::models::{RelationKind, ResourceRef};
use super::selector::LabelSelector;

/// A related object declared by a rule
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    pub target: ResourceRef,
    pub kind: RelationKind,
}

impl Candidate {
    pub fn new(target: ResourceRef, kind: RelationKind) -> Self {
        Self { target, kind }
    }
}

/// Accessor handle given to rules
///
/// Every call is bounded by the per-request deadline of the build.
pub struct RuleContext<'a> {
    accessor: &'a dyn ResourceAccessor,
    request_timeout: Duration,
}

impl<'a> RuleContext<'a> {
    pub fn new(accessor: &'a dyn ResourceAccessor, request_timeout: Duration) -> Self {
        Self {
            accessor,
            request_timeout,
        }
    }

    /// List objects of `kind_query` matching `selector` in `namespace`
    pub async fn list(
        &self,
        kind_query: &str,
        namespace: &str,
        selector: &LabelSelector,
    ) -> Result<Vec<Value>, AccessError> {
        let resolved =
            with_deadline(self.request_timeout, self.accessor.resolve_kind(kind_query)).await?;
        with_deadline(
            self.request_timeout,
            self.accessor.list(&resolved.gvr, namespace, selector),
        )
        .await
    }
}

/// One relation-discovery strategy
#[async_trait]
pub trait RelationRule: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Relations `object` declares; never fails
    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        ctx: &RuleContext<'_>,
    ) -> Vec<Candidate>;
}

/// The registered rule set, in evaluation order
pub fn default_rules() -> Vec<Box<dyn RelationRule>> {
    vec![
        Box::new(OwnerReferenceRule),
        Box::new(LabelSelectorRule),
        Box::new(VolumeReferenceRule),
        Box::new(ServiceAccountRule),
        Box::new(RoutingRule),
        Box::new(ScaleTargetRule),
    ]
}

/// Reference to a core-group object in the subject's namespace
fn core_ref(kind: &str, subject: &ResourceRef, name: &str) -> ResourceRef {
    ResourceRef::new(kind, "v1", subject.namespace.as_str(), name)
}
