//! Label selectors
//!
//! Parses both selector shapes found in the wild: the plain equality map used
//! by Services and the `matchLabels` / `matchExpressions` form used by
//! workloads, disruption budgets and network policies.

use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

use super::value::{lookup, object_labels};

/// Set-based requirement operator
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl SelectorOperator {
    fn parse(op: &str) -> Option<Self> {
        match op {
            "In" => Some(Self::In),
            "NotIn" => Some(Self::NotIn),
            "Exists" => Some(Self::Exists),
            "DoesNotExist" => Some(Self::DoesNotExist),
            _ => None,
        }
    }
}

/// One `matchExpressions` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorRequirement {
    pub key: String,
    pub operator: SelectorOperator,
    pub values: Vec<String>,
}

impl SelectorRequirement {
    fn matches(&self, labels: &BTreeMap<&str, &str>) -> bool {
        let value = labels.get(self.key.as_str());
        match self.operator {
            SelectorOperator::In => value.is_some_and(|v| self.values.iter().any(|x| x == v)),
            SelectorOperator::NotIn => value.is_none_or(|v| !self.values.iter().any(|x| x == v)),
            SelectorOperator::Exists => value.is_some(),
            SelectorOperator::DoesNotExist => value.is_none(),
        }
    }
}

/// A parsed label selector
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LabelSelector {
    pub match_labels: BTreeMap<String, String>,
    pub match_expressions: Vec<SelectorRequirement>,
}

impl LabelSelector {
    /// Selector matching objects carrying every `(key, value)` pair
    pub fn from_labels<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
            match_expressions: Vec::new(),
        }
    }

    /// Find the selector an object declares, if any
    ///
    /// Looks at `spec.selector` (either shape) and `spec.podSelector`.
    pub fn from_object(obj: &Value) -> Option<Self> {
        lookup(obj, &["spec", "selector"])
            .or_else(|| lookup(obj, &["spec", "podSelector"]))
            .and_then(Self::parse)
    }

    /// Parse a selector value in either the structured or the plain-map shape
    pub fn parse(value: &Value) -> Option<Self> {
        let map = value.as_object()?;

        if map.contains_key("matchLabels") || map.contains_key("matchExpressions") {
            let match_labels = map
                .get("matchLabels")
                .and_then(|m| m.as_object())
                .map(|m| {
                    m.iter()
                        .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
                        .collect()
                })
                .unwrap_or_default();

            // One malformed requirement voids the selector rather than widening it
            let match_expressions = match map.get("matchExpressions").and_then(|e| e.as_array()) {
                Some(exprs) => exprs
                    .iter()
                    .map(parse_requirement)
                    .collect::<Option<Vec<_>>>()?,
                None => Vec::new(),
            };

            return Some(Self {
                match_labels,
                match_expressions,
            });
        }

        // Service-style selector: every string entry is an equality requirement
        let match_labels: BTreeMap<String, String> = map
            .iter()
            .filter_map(|(k, v)| v.as_str().map(|v| (k.clone(), v.to_string())))
            .collect();
        Some(Self {
            match_labels,
            match_expressions: Vec::new(),
        })
    }

    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }

    /// Check an object's labels against this selector
    pub fn matches(&self, obj: &Value) -> bool {
        let labels: BTreeMap<&str, &str> = object_labels(obj).collect();
        self.match_labels
            .iter()
            .all(|(k, v)| labels.get(k.as_str()) == Some(&v.as_str()))
            && self.match_expressions.iter().all(|r| r.matches(&labels))
    }

    /// Render as a label selector query string for the API server
    pub fn to_query(&self) -> String {
        self.to_string()
    }
}

fn parse_requirement(expr: &Value) -> Option<SelectorRequirement> {
    let key = expr.get("key")?.as_str()?.to_string();
    let operator = SelectorOperator::parse(expr.get("operator")?.as_str()?)?;
    let values = expr
        .get("values")
        .and_then(|v| v.as_array())
        .map(|vals| {
            vals.iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect()
        })
        .unwrap_or_default();
    Some(SelectorRequirement {
        key,
        operator,
        values,
    })
}

impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts: Vec<String> = self
            .match_labels
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect();

        for req in &self.match_expressions {
            parts.push(match req.operator {
                SelectorOperator::In => format!("{} in ({})", req.key, req.values.join(",")),
                SelectorOperator::NotIn => format!("{} notin ({})", req.key, req.values.join(",")),
                SelectorOperator::Exists => req.key.clone(),
                SelectorOperator::DoesNotExist => format!("!{}", req.key),
            });
        }

        write!(f, "{}", parts.join(","))
    }
}
