//! Fatal graph errors

use super::accessor::AccessError;

/// Errors that abort a build or a render
///
/// Anything not listed here is absorbed into the graph as a stub node or the
/// truncated flag.
#[derive(Debug, thiserror::Error)]
pub enum GraphError {
    #[error("{kind} \"{name}\" not found{}", namespace_suffix(.namespace))]
    RootNotFound {
        kind: String,
        namespace: String,
        name: String,
    },

    #[error("the server doesn't have a resource type \"{0}\"")]
    KindNotFound(String),

    #[error("\"{name}\" is ambiguous, it matches {}", .candidates.join(", "))]
    AmbiguousKind {
        name: String,
        candidates: Vec<String>,
    },

    #[error("failed to fetch {kind} \"{name}\": {source}")]
    RootAccess {
        kind: String,
        name: String,
        #[source]
        source: AccessError,
    },

    #[error("graph build cancelled")]
    Cancelled,

    #[error("failed to write graph output: {0}")]
    Render(#[from] std::io::Error),
}

fn namespace_suffix(namespace: &str) -> String {
    if namespace.is_empty() {
        String::new()
    } else {
        format!(" in namespace \"{}\"", namespace)
    }
}

impl GraphError {
    /// Map a root-resolution failure to its fatal counterpart
    pub(crate) fn from_root(err: AccessError, kind: &str, namespace: &str, name: &str) -> Self {
        match err {
            AccessError::KindNotFound(k) => GraphError::KindNotFound(k),
            AccessError::AmbiguousKind { name, candidates } => {
                GraphError::AmbiguousKind { name, candidates }
            }
            AccessError::NotFound { .. } => GraphError::RootNotFound {
                kind: kind.to_string(),
                namespace: namespace.to_string(),
                name: name.to_string(),
            },
            other => GraphError::RootAccess {
                kind: kind.to_string(),
                name: name.to_string(),
                source: other,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_root_not_found_message() {
        let err = GraphError::from_root(
            AccessError::NotFound {
                resource: "services".to_string(),
                name: "web".to_string(),
            },
            "Service",
            "default",
            "web",
        );
        assert_eq!(
            err.to_string(),
            "Service \"web\" not found in namespace \"default\""
        );
    }

    #[test]
    fn test_timeout_is_root_access() {
        let err = GraphError::from_root(
            AccessError::Timeout(std::time::Duration::from_secs(1)),
            "Pod",
            "default",
            "web-1",
        );
        assert!(matches!(err, GraphError::RootAccess { .. }));
    }
}
