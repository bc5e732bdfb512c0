use async_trait::async_trait;
use serde_json::Value;

use super::{Candidate, RelationRule, RuleContext, core_ref};
use crate::graph::models::{RelationKind, ResourceRef};
use crate::graph::value::{array_at, lookup, str_at};

/// Ingress and route backends → `Routes` edges to Services
///
/// Recognised shapes:
/// - Ingress `networking.k8s.io/v1` (`backend.service.name`) and the legacy
///   `extensions/v1beta1` form (`backend.serviceName`), both for the default
///   backend and every `rules[].http.paths[]`
/// - OpenShift-style routes (`spec.to`, `spec.alternateBackends[]` of kind Service)
/// - Gateway API routes (`spec.rules[].backendRefs[]`)
///
/// Ingress TLS secrets are reported as `References`. The Service to Pod hop is
/// left to the selector rule when the Service itself is expanded.
pub struct RoutingRule;

#[async_trait]
impl RelationRule for RoutingRule {
    fn name(&self) -> &'static str {
        "routing"
    }

    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Vec<Candidate> {
        let Some(spec) = lookup(object, &["spec"]) else {
            return Vec::new();
        };

        let mut services: Vec<ResourceRef> = Vec::new();

        // Ingress
        let default_backend =
            lookup(spec, &["defaultBackend"]).or_else(|| lookup(spec, &["backend"]));
        if let Some(name) = default_backend.and_then(ingress_backend_service) {
            services.push(core_ref("Service", subject, name));
        }
        for rule in array_at(spec, &["rules"]) {
            for path in array_at(rule, &["http", "paths"]) {
                if let Some(name) = lookup(path, &["backend"]).and_then(ingress_backend_service) {
                    services.push(core_ref("Service", subject, name));
                }
            }
        }

        // Route
        let route_targets = lookup(spec, &["to"])
            .into_iter()
            .chain(array_at(spec, &["alternateBackends"]));
        for target in route_targets {
            if str_at(target, &["kind"]) == Some("Service") {
                if let Some(name) = str_at(target, &["name"]) {
                    services.push(core_ref("Service", subject, name));
                }
            }
        }

        // Gateway API
        for rule in array_at(spec, &["rules"]) {
            for backend in array_at(rule, &["backendRefs"]) {
                let kind = str_at(backend, &["kind"]).unwrap_or("Service");
                let group = str_at(backend, &["group"]).unwrap_or("");
                if kind != "Service" || !group.is_empty() {
                    continue;
                }
                if let Some(name) = str_at(backend, &["name"]) {
                    let namespace =
                        str_at(backend, &["namespace"]).unwrap_or(subject.namespace.as_str());
                    services.push(ResourceRef::new("Service", "v1", namespace, name));
                }
            }
        }

        let mut found: Vec<Candidate> = services
            .into_iter()
            .map(|svc| Candidate::new(svc, RelationKind::Routes))
            .collect();

        for tls in array_at(spec, &["tls"]) {
            if let Some(secret) = str_at(tls, &["secretName"]) {
                found.push(Candidate::new(
                    core_ref("Secret", subject, secret),
                    RelationKind::References,
                ));
            }
        }

        found
    }
}

/// Service name of an Ingress backend in either API version
fn ingress_backend_service(backend: &Value) -> Option<&str> {
    str_at(backend, &["service", "name"]).or_else(|| str_at(backend, &["serviceName"]))
}
