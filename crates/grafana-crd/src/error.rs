//! Error types for the grafana-crd crate.

use thiserror::Error;

/// Errors that can occur while rendering a custom resource.
#[derive(Debug, Error)]
pub enum CrdError {
    /// The object could not be converted to a JSON document.
    #[error("failed to serialize {kind}: {source}")]
    Serialization {
        /// Kind of the object being serialized.
        kind: &'static str,
        /// Underlying serde error.
        #[source]
        source: serde_json::Error,
    },
}
