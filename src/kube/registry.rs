//! Kind registry for resolving user-typed and declared kind names
//!
//! Resolution follows kubectl: a name may be the kind, plural, singular or a
//! short name, optionally qualified with the API group (`deployments.apps`,
//! `Pod.` for the core group). The registry is filled either from API
//! discovery or from the built-in table below.

use kube::Client;
use k8s_openapi::apimachinery::pkg::apis::meta::v1::APIResource;

use crate::graph::{AccessError, Gvr, ResolvedKind};

/// One resource type known to the registry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KindEntry {
    pub group: String,
    pub version: String,
    pub kind: String,
    pub plural: String,
    pub singular: String,
    pub short_names: Vec<String>,
    pub namespaced: bool,
    /// Whether `version` is the group's preferred version
    pub preferred: bool,
}

impl KindEntry {
    pub fn new(group: &str, version: &str, kind: &str, plural: &str, namespaced: bool) -> Self {
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: kind.to_string(),
            plural: plural.to_string(),
            singular: kind.to_lowercase(),
            short_names: Vec::new(),
            namespaced,
            preferred: true,
        }
    }

    pub fn with_short_names(mut self, short_names: &[&str]) -> Self {
        self.short_names = short_names.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Mark the entry as served from a non-preferred version
    pub fn not_preferred(mut self) -> Self {
        self.preferred = false;
        self
    }

    fn from_api_resource(group: &str, version: &str, preferred: bool, res: &APIResource) -> Self {
        let singular = if res.singular_name.is_empty() {
            res.kind.to_lowercase()
        } else {
            res.singular_name.clone()
        };
        Self {
            group: group.to_string(),
            version: version.to_string(),
            kind: res.kind.clone(),
            plural: res.name.clone(),
            singular,
            short_names: res.short_names.clone().unwrap_or_default(),
            namespaced: res.namespaced,
            preferred,
        }
    }

    pub fn gvr(&self) -> Gvr {
        Gvr::new(self.group.as_str(), self.version.as_str(), self.plural.as_str())
    }

    fn resolved(&self) -> ResolvedKind {
        ResolvedKind {
            gvr: self.gvr(),
            kind: self.kind.clone(),
            namespaced: self.namespaced,
        }
    }

    /// kubectl-style name shown in ambiguity errors (`events.events.k8s.io`)
    fn qualified_name(&self) -> String {
        if self.group.is_empty() {
            self.plural.clone()
        } else {
            format!("{}.{}", self.plural, self.group)
        }
    }

    fn is_subresource(&self) -> bool {
        self.plural.contains('/')
    }
}

/// Built-in resource type
struct BuiltinKind {
    group: &'static str,
    version: &'static str,
    kind: &'static str,
    plural: &'static str,
    short_names: &'static [&'static str],
    namespaced: bool,
}

/// Kinds known without discovery
///
/// Covers every kind the relation rules emit plus the usual suspects typed
/// on the command line.
const BUILTIN_KINDS: &[BuiltinKind] = &[
    // core
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Pod",
        plural: "pods",
        short_names: &["po"],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Service",
        plural: "services",
        short_names: &["svc"],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "ConfigMap",
        plural: "configmaps",
        short_names: &["cm"],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Secret",
        plural: "secrets",
        short_names: &[],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "ServiceAccount",
        plural: "serviceaccounts",
        short_names: &["sa"],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "PersistentVolumeClaim",
        plural: "persistentvolumeclaims",
        short_names: &["pvc"],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "PersistentVolume",
        plural: "persistentvolumes",
        short_names: &["pv"],
        namespaced: false,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Namespace",
        plural: "namespaces",
        short_names: &["ns"],
        namespaced: false,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Node",
        plural: "nodes",
        short_names: &["no"],
        namespaced: false,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Endpoints",
        plural: "endpoints",
        short_names: &["ep"],
        namespaced: true,
    },
    BuiltinKind {
        group: "",
        version: "v1",
        kind: "Event",
        plural: "events",
        short_names: &["ev"],
        namespaced: true,
    },
    BuiltinKind {
        group: "events.k8s.io",
        version: "v1",
        kind: "Event",
        plural: "events",
        short_names: &["ev"],
        namespaced: true,
    },
    // apps
    BuiltinKind {
        group: "apps",
        version: "v1",
        kind: "Deployment",
        plural: "deployments",
        short_names: &["deploy"],
        namespaced: true,
    },
    BuiltinKind {
        group: "apps",
        version: "v1",
        kind: "ReplicaSet",
        plural: "replicasets",
        short_names: &["rs"],
        namespaced: true,
    },
    BuiltinKind {
        group: "apps",
        version: "v1",
        kind: "StatefulSet",
        plural: "statefulsets",
        short_names: &["sts"],
        namespaced: true,
    },
    BuiltinKind {
        group: "apps",
        version: "v1",
        kind: "DaemonSet",
        plural: "daemonsets",
        short_names: &["ds"],
        namespaced: true,
    },
    // batch
    BuiltinKind {
        group: "batch",
        version: "v1",
        kind: "Job",
        plural: "jobs",
        short_names: &[],
        namespaced: true,
    },
    BuiltinKind {
        group: "batch",
        version: "v1",
        kind: "CronJob",
        plural: "cronjobs",
        short_names: &["cj"],
        namespaced: true,
    },
    // networking
    BuiltinKind {
        group: "networking.k8s.io",
        version: "v1",
        kind: "Ingress",
        plural: "ingresses",
        short_names: &["ing"],
        namespaced: true,
    },
    BuiltinKind {
        group: "networking.k8s.io",
        version: "v1",
        kind: "NetworkPolicy",
        plural: "networkpolicies",
        short_names: &["netpol"],
        namespaced: true,
    },
    // autoscaling and policy
    BuiltinKind {
        group: "autoscaling",
        version: "v2",
        kind: "HorizontalPodAutoscaler",
        plural: "horizontalpodautoscalers",
        short_names: &["hpa"],
        namespaced: true,
    },
    BuiltinKind {
        group: "policy",
        version: "v1",
        kind: "PodDisruptionBudget",
        plural: "poddisruptionbudgets",
        short_names: &["pdb"],
        namespaced: true,
    },
];

type Matcher = fn(&KindEntry, &str) -> bool;

/// Matchers in precedence order; the first one with any hit decides
const MATCHERS: [Matcher; 4] = [
    |e, name| e.kind.eq_ignore_ascii_case(name),
    |e, name| e.plural.eq_ignore_ascii_case(name),
    |e, name| e.singular.eq_ignore_ascii_case(name),
    |e, name| e.short_names.iter().any(|s| s.eq_ignore_ascii_case(name)),
];

/// Table of resource types used for kind resolution
#[derive(Debug, Clone, Default)]
pub struct KindRegistry {
    entries: Vec<KindEntry>,
}

impl KindRegistry {
    /// Registry of the built-in Kubernetes kinds
    pub fn builtin() -> Self {
        Self::from_entries(BUILTIN_KINDS.iter().map(|b| {
            KindEntry::new(b.group, b.version, b.kind, b.plural, b.namespaced)
                .with_short_names(b.short_names)
        }))
    }

    pub fn from_entries(entries: impl IntoIterator<Item = KindEntry>) -> Self {
        Self {
            entries: entries.into_iter().collect(),
        }
    }

    pub fn add(&mut self, entry: KindEntry) {
        self.entries.push(entry);
    }

    pub fn entries(&self) -> &[KindEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a kind, plural, singular or short name
    pub fn resolve(&self, query: &str) -> Result<ResolvedKind, AccessError> {
        let (name, group) = match query.split_once('.') {
            Some((name, group)) => (name, Some(group)),
            None => (query, None),
        };

        let candidates: Vec<&KindEntry> = self
            .entries
            .iter()
            .filter(|e| !e.is_subresource())
            .filter(|e| group.is_none_or(|g| e.group.eq_ignore_ascii_case(g)))
            .collect();

        for matcher in MATCHERS {
            let mut found: Vec<&KindEntry> = Vec::new();
            for entry in candidates.iter().copied().filter(|e| matcher(e, name)) {
                // Same resource served at several versions
                match found
                    .iter_mut()
                    .find(|f| f.group == entry.group && f.plural == entry.plural)
                {
                    Some(existing) => {
                        if entry.preferred && !existing.preferred {
                            *existing = entry;
                        }
                    }
                    None => found.push(entry),
                }
            }

            match found.as_slice() {
                [] => continue,
                [entry] => return Ok(entry.resolved()),
                many => {
                    return Err(AccessError::AmbiguousKind {
                        name: query.to_string(),
                        candidates: many.iter().map(|e| e.qualified_name()).collect(),
                    });
                }
            }
        }

        Err(AccessError::KindNotFound(query.to_string()))
    }

    /// Look up the kind served under a resource type
    pub fn kind_for(&self, gvr: &Gvr) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.group == gvr.group && e.plural == gvr.resource)
            .map(|e| e.kind.as_str())
    }

    /// Build the registry from API discovery
    ///
    /// Group versions that fail to answer (commonly an unavailable
    /// aggregated API) are skipped.
    pub async fn discover(client: &Client) -> anyhow::Result<Self> {
        let mut registry = Self::default();

        let core = client.list_core_api_versions().await?;
        for (i, version) in core.versions.iter().enumerate() {
            match client.list_core_api_resources(version).await {
                Ok(list) => {
                    for res in &list.resources {
                        registry.add(KindEntry::from_api_resource("", version, i == 0, res));
                    }
                }
                Err(e) => tracing::warn!("Skipping core API {}: {}", version, e),
            }
        }

        let groups = client.list_api_groups().await?;
        for group in &groups.groups {
            let preferred = group
                .preferred_version
                .as_ref()
                .map(|p| p.version.as_str());

            for gv in &group.versions {
                match client.list_api_group_resources(&gv.group_version).await {
                    Ok(list) => {
                        let is_preferred = preferred.is_none_or(|p| p == gv.version);
                        for res in &list.resources {
                            registry.add(KindEntry::from_api_resource(
                                &group.name,
                                &gv.version,
                                is_preferred,
                                res,
                            ));
                        }
                    }
                    Err(e) => tracing::warn!("Skipping API group {}: {}", gv.group_version, e),
                }
            }
        }

        tracing::debug!("Discovered {} resource types", registry.len());
        Ok(registry)
    }
}
