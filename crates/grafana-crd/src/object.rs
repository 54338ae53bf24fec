//! The generic Kubernetes object envelope.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CrdError;
use crate::meta::ObjectMeta;

/// API group and version served by the Grafana operator.
pub const GROUP_VERSION: &str = "integreatly.org/v1alpha1";

/// A `spec` type that belongs to one operator kind.
pub trait CustomResource: Serialize {
    /// The `kind` written into the envelope.
    const KIND: &'static str;

    /// The `apiVersion` written into the envelope.
    const API_VERSION: &'static str = GROUP_VERSION;
}

/// `apiVersion` + `kind` + `metadata` + `spec`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiObject<S> {
    /// API group/version of the kind.
    pub api_version: String,
    /// Resource kind.
    pub kind: String,
    /// Object metadata.
    pub metadata: ObjectMeta,
    /// Kind-specific payload.
    pub spec: S,
}

impl<S: CustomResource> ApiObject<S> {
    /// Wraps a spec in its envelope.
    #[must_use]
    pub fn new(metadata: ObjectMeta, spec: S) -> Self {
        Self {
            api_version: S::API_VERSION.to_string(),
            kind: S::KIND.to_string(),
            metadata,
            spec,
        }
    }

    /// Renders the object as a JSON document.
    ///
    /// # Errors
    ///
    /// Returns an error if the spec cannot be represented as JSON.
    pub fn to_value(&self) -> Result<Value, CrdError> {
        serde_json::to_value(self).map_err(|source| CrdError::Serialization {
            kind: S::KIND,
            source,
        })
    }
}
