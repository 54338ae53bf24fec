//! Error types for manifest construction.
//!
//! Every error is raised synchronously by the call that caused it, before
//! any manifest for the offending object exists.

use thiserror::Error;

/// Result type alias for manifest operations.
pub type ManifestResult<T> = Result<T, ManifestError>;

/// Errors that can occur while building or synthesizing manifests.
#[derive(Debug, Error)]
pub enum ManifestError {
    /// A required property was empty.
    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// A construct id cannot be used.
    #[error("invalid construct id: {0}")]
    InvalidId(String),

    /// Two children of the same scope share an id.
    #[error("there is already a construct with id '{id}' in {scope}")]
    DuplicateId {
        /// Path of the scope the child was added to
        scope: String,
        /// The conflicting id
        id: String,
    },

    /// A duration that must be rendered in whole seconds has a fractional part.
    #[error("{field} must be a whole number of seconds, got {duration}")]
    NonIntegralDuration {
        /// Property holding the duration
        field: &'static str,
        /// The offending duration, formatted for humans
        duration: String,
    },

    /// Rendering a custom resource failed.
    #[error(transparent)]
    Crd(#[from] grafana_crd::CrdError),

    /// Encoding a dashboard model or manifest list as JSON failed.
    #[error("json serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Encoding manifests as YAML failed.
    #[error("yaml serialization failed: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A declarative chart description could not be loaded.
    #[error("configuration error: {0}")]
    Config(String),
}

impl ManifestError {
    /// Creates a duplicate id error.
    #[must_use]
    pub fn duplicate_id(scope: impl std::fmt::Display, id: impl std::fmt::Display) -> Self {
        Self::DuplicateId {
            scope: scope.to_string(),
            id: id.to_string(),
        }
    }
}
