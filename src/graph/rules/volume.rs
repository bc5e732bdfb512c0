use async_trait::async_trait;
use serde_json::Value;

use super::{Candidate, RelationRule, RuleContext, core_ref};
use crate::graph::models::{RelationKind, ResourceRef};
use crate::graph::value::{array_at, pod_spec, str_at};

/// Pod-spec volumes, env sources and pull secrets → `Mounts` / `References`
///
/// Also links a PersistentVolumeClaim to the PersistentVolume it is bound to.
pub struct VolumeReferenceRule;

#[async_trait]
impl RelationRule for VolumeReferenceRule {
    fn name(&self) -> &'static str {
        "volume-references"
    }

    async fn inspect(
        &self,
        subject: &ResourceRef,
        object: &Value,
        _ctx: &RuleContext<'_>,
    ) -> Vec<Candidate> {
        let mut found = Vec::new();

        if let Some(spec) = pod_spec(object) {
            volume_candidates(subject, spec, &mut found);
            env_candidates(subject, spec, &mut found);

            for secret in array_at(spec, &["imagePullSecrets"]) {
                if let Some(name) = str_at(secret, &["name"]) {
                    found.push(Candidate::new(
                        core_ref("Secret", subject, name),
                        RelationKind::References,
                    ));
                }
            }
        }

        if subject.kind == "PersistentVolumeClaim" {
            if let Some(volume) = str_at(object, &["spec", "volumeName"]) {
                found.push(Candidate::new(
                    ResourceRef::new("PersistentVolume", "v1", "", volume),
                    RelationKind::References,
                ));
            }
        }

        found
    }
}

fn volume_candidates(subject: &ResourceRef, spec: &Value, found: &mut Vec<Candidate>) {
    let mounts = |kind: &str, name: &str| {
        Candidate::new(core_ref(kind, subject, name), RelationKind::Mounts)
    };

    for volume in array_at(spec, &["volumes"]) {
        if let Some(name) = str_at(volume, &["configMap", "name"]) {
            found.push(mounts("ConfigMap", name));
        }
        if let Some(name) = str_at(volume, &["secret", "secretName"]) {
            found.push(mounts("Secret", name));
        }
        if let Some(name) = str_at(volume, &["persistentVolumeClaim", "claimName"]) {
            found.push(mounts("PersistentVolumeClaim", name));
        }
        for source in array_at(volume, &["projected", "sources"]) {
            if let Some(name) = str_at(source, &["configMap", "name"]) {
                found.push(mounts("ConfigMap", name));
            }
            if let Some(name) = str_at(source, &["secret", "name"]) {
                found.push(mounts("Secret", name));
            }
        }
    }
}

fn env_candidates(subject: &ResourceRef, spec: &Value, found: &mut Vec<Candidate>) {
    let references = |kind: &str, name: &str| {
        Candidate::new(core_ref(kind, subject, name), RelationKind::References)
    };

    let containers = array_at(spec, &["initContainers"])
        .iter()
        .chain(array_at(spec, &["containers"]));

    for container in containers {
        for source in array_at(container, &["envFrom"]) {
            if let Some(name) = str_at(source, &["configMapRef", "name"]) {
                found.push(references("ConfigMap", name));
            }
            if let Some(name) = str_at(source, &["secretRef", "name"]) {
                found.push(references("Secret", name));
            }
        }
        for var in array_at(container, &["env"]) {
            if let Some(name) = str_at(var, &["valueFrom", "configMapKeyRef", "name"]) {
                found.push(references("ConfigMap", name));
            }
            if let Some(name) = str_at(var, &["valueFrom", "secretKeyRef", "name"]) {
                found.push(references("Secret", name));
            }
        }
    }
}
