//! Safe path lookups over raw object content
//!
//! Relation rules never know the schema of the object they inspect. Every
//! field access goes through these helpers, which return `None` (or an empty
//! slice) when a segment is missing or has the wrong shape.

use serde_json::{Map, Value};

/// Walk `path` from `value`, returning the value at the end if every segment exists
pub fn lookup<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Value> {
    path.iter().try_fold(value, |current, segment| current.get(segment))
}

/// Non-empty string at `path`
pub fn str_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a str> {
    lookup(value, path)
        .and_then(|v| v.as_str())
        .filter(|s| !s.is_empty())
}

/// Array at `path`, or an empty slice
pub fn array_at<'a>(value: &'a Value, path: &[&str]) -> &'a [Value] {
    lookup(value, path)
        .and_then(|v| v.as_array())
        .map(|a| a.as_slice())
        .unwrap_or(&[])
}

/// Object at `path`
pub fn object_at<'a>(value: &'a Value, path: &[&str]) -> Option<&'a Map<String, Value>> {
    lookup(value, path).and_then(|v| v.as_object())
}

pub fn object_name(obj: &Value) -> Option<&str> {
    str_at(obj, &["metadata", "name"])
}

pub fn object_namespace(obj: &Value) -> &str {
    str_at(obj, &["metadata", "namespace"]).unwrap_or("")
}

pub fn object_uid(obj: &Value) -> Option<&str> {
    str_at(obj, &["metadata", "uid"])
}

pub fn object_kind(obj: &Value) -> Option<&str> {
    str_at(obj, &["kind"])
}

pub fn object_api_version(obj: &Value) -> Option<&str> {
    str_at(obj, &["apiVersion"])
}

/// Labels as string pairs; non-string label values are ignored
pub fn object_labels(obj: &Value) -> impl Iterator<Item = (&str, &str)> {
    object_at(obj, &["metadata", "labels"])
        .into_iter()
        .flat_map(|labels| labels.iter())
        .filter_map(|(k, v)| v.as_str().map(|v| (k.as_str(), v)))
}

/// Locate the pod spec inside pod-shaped and pod-template-shaped objects
///
/// Checks, in order: `spec.template.spec` (Deployment, ReplicaSet, Job, ...),
/// `spec.jobTemplate.spec.template.spec` (CronJob) and finally `spec` itself
/// when it carries containers (Pod).
pub fn pod_spec(obj: &Value) -> Option<&Value> {
    if let Some(spec) = lookup(obj, &["spec", "template", "spec"]) {
        return Some(spec);
    }
    if let Some(spec) = lookup(obj, &["spec", "jobTemplate", "spec", "template", "spec"]) {
        return Some(spec);
    }
    lookup(obj, &["spec"]).filter(|spec| spec.get("containers").is_some())
}
