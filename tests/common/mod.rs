//! Shared cluster fixtures for integration tests

#![allow(dead_code)]

use kubegraph::kube::FixtureAccessor;
use serde_json::{Value, json};

pub const NS: &str = "default";

pub fn owner(kind: &str, api_version: &str, name: &str, uid: &str) -> Value {
    json!({
        "apiVersion": api_version,
        "kind": kind,
        "name": name,
        "uid": uid,
        "controller": true
    })
}

pub fn service(name: &str, selector: Value) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "Service",
        "metadata": {"name": name, "namespace": NS, "uid": format!("svc-{}", name)},
        "spec": {
            "selector": selector,
            "ports": [{"port": 80, "targetPort": 8080}]
        }
    })
}

/// Pod labelled `app=<app>`, optionally owned and mounting a ConfigMap
pub fn pod(name: &str, app: &str, owned_by: Option<Value>, config_map: Option<&str>) -> Value {
    let mut pod = json!({
        "apiVersion": "v1",
        "kind": "Pod",
        "metadata": {
            "name": name,
            "namespace": NS,
            "uid": format!("pod-{}", name),
            "labels": {"app": app}
        },
        "spec": {
            "containers": [{"name": "app", "image": "nginx:1.27"}]
        }
    });
    if let Some(owner) = owned_by {
        pod["metadata"]["ownerReferences"] = json!([owner]);
    }
    if let Some(cm) = config_map {
        pod["spec"]["volumes"] = json!([{"name": "config", "configMap": {"name": cm}}]);
    }
    pod
}

pub fn replica_set(name: &str, app: &str, uid: &str, owned_by: Option<Value>) -> Value {
    let mut rs = json!({
        "apiVersion": "apps/v1",
        "kind": "ReplicaSet",
        "metadata": {
            "name": name,
            "namespace": NS,
            "uid": uid,
            "labels": {"app": app}
        },
        "spec": {
            "replicas": 2,
            "selector": {"matchLabels": {"app": app}},
            "template": {
                "metadata": {"labels": {"app": app}},
                "spec": {"containers": [{"name": "app", "image": "nginx:1.27"}]}
            }
        }
    });
    if let Some(owner) = owned_by {
        rs["metadata"]["ownerReferences"] = json!([owner]);
    }
    rs
}

pub fn deployment(name: &str, app: &str, uid: &str) -> Value {
    json!({
        "apiVersion": "apps/v1",
        "kind": "Deployment",
        "metadata": {
            "name": name,
            "namespace": NS,
            "uid": uid,
            "labels": {"app": app}
        },
        "spec": {
            "replicas": 2,
            "selector": {"matchLabels": {"app": app}},
            "template": {
                "metadata": {"labels": {"app": app}},
                "spec": {"containers": [{"name": "app", "image": "nginx:1.27"}]}
            }
        }
    })
}

pub fn config_map(name: &str) -> Value {
    json!({
        "apiVersion": "v1",
        "kind": "ConfigMap",
        "metadata": {"name": name, "namespace": NS, "uid": format!("cm-{}", name)},
        "data": {"LOG_LEVEL": "info"}
    })
}

/// Objects of the web scenario
///
/// Service `web` selects Pods `web-1` and `web-2`; both are owned by
/// ReplicaSet `web-7f9c` (owned by Deployment `web`) and mount ConfigMap
/// `web-config`.
pub fn web_objects(rs_uid_seen_by_pods: &str) -> Vec<Value> {
    let rs_owner = owner("ReplicaSet", "apps/v1", "web-7f9c", rs_uid_seen_by_pods);
    vec![
        service("web", json!({"app": "web"})),
        pod("web-1", "web", Some(rs_owner.clone()), Some("web-config")),
        pod("web-2", "web", Some(rs_owner), Some("web-config")),
        replica_set(
            "web-7f9c",
            "web",
            "rs-uid",
            Some(owner("Deployment", "apps/v1", "web", "deploy-uid")),
        ),
        deployment("web", "web", "deploy-uid"),
        config_map("web-config"),
    ]
}

pub fn web_scenario() -> FixtureAccessor {
    FixtureAccessor::new().with_objects(web_objects("rs-uid"))
}

pub const WEB_TREE: &str = "\
Service/web
  Pod/web-1 [Selects]
    ReplicaSet/web-7f9c [Owns]
      Deployment/web [Owns]
    ConfigMap/web-config [Mounts]
  Pod/web-2 [Selects]
    ReplicaSet/web-7f9c [Owns] (see above)
    ConfigMap/web-config [Mounts] (see above)
";
