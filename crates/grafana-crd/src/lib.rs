//! # grafana-crd
//!
//! Typed bindings for the custom resources understood by the Grafana
//! operator (`integreatly.org/v1alpha1`).
//!
//! Each kind is a plain serde record wrapped in the generic Kubernetes
//! envelope [`ApiObject`]. The field names mirror the operator's CRD schema,
//! so serializing an object yields a manifest the operator can apply.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod dashboard;
pub mod datasource;
pub mod error;
pub mod grafana;
pub mod meta;
pub mod object;

pub use dashboard::{DashboardDataSource, GrafanaDashboardSpec, GrafanaPlugin};
pub use datasource::{AccessType, DataSourceFields, GrafanaDataSourceSpec};
pub use error::CrdError;
pub use grafana::{
    AnonymousAuthConfig, GrafanaClient, GrafanaConfig, GrafanaDeployment, GrafanaIngress,
    GrafanaSpec, LogConfig, SecurityConfig,
};
pub use meta::{LabelSelector, Labels, ObjectMeta};
pub use object::{ApiObject, CustomResource, GROUP_VERSION};
