//! Kubernetes object metadata shared by every kind.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label set attached to an object.
///
/// Ordered so that rendered manifests are stable across runs.
pub type Labels = BTreeMap<String, String>;

/// The subset of `metadata` the operator resources need.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object name, unique within its namespace.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Namespace; the API server assigns `default` when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,

    /// Object labels.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: Labels,
}

impl ObjectMeta {
    /// Creates metadata with only a name.
    #[must_use]
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: Option<String>) -> Self {
        self.namespace = namespace;
        self
    }

    /// Sets the labels.
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }
}

/// Equality-based label selector.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Labels an object must carry to be selected.
    pub match_labels: Labels,
}

impl LabelSelector {
    /// Creates a selector matching exactly the given labels.
    #[must_use]
    pub const fn match_labels(labels: Labels) -> Self {
        Self {
            match_labels: labels,
        }
    }
}
