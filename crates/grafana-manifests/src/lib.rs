//! # grafana-manifests
//!
//! Builders that describe Grafana instances, data sources and dashboards and
//! render them as manifests for the Grafana operator.
//!
//! Nothing here talks to Grafana or to a cluster. A [`Chart`] is built up
//! through `&mut` handles and then rendered once by [`Chart::synth`]; the
//! output is deterministic for a given sequence of calls.
//!
//! ## Example
//!
//! ```rust
//! use grafana_manifests::{AccessType, Chart, DashboardProps, DataSourceProps, GrafanaProps};
//! use serde_json::json;
//!
//! let mut chart = Chart::new("monitoring")?;
//! let grafana = chart.add_grafana("grafana", GrafanaProps::default().with_namespace("obs"))?;
//!
//! let prometheus = grafana.add_data_source(
//!     "prometheus",
//!     DataSourceProps::new("Prometheus", "prometheus", AccessType::Proxy)
//!         .with_url("http://prometheus-service:9090"),
//! )?;
//! let props = DashboardProps::new("Cluster").with_data_source(prometheus);
//!
//! grafana
//!     .add_dashboard("cluster", props)?
//!     .add_panels([json!({"type": "text", "title": "Hello"})]);
//!
//! let manifests = chart.synth()?;
//! assert_eq!(manifests.len(), 3);
//! assert_eq!(manifests[2]["spec"]["datasources"][0]["inputName"], "DS_PROMETHEUS");
//! # Ok::<(), grafana_manifests::ManifestError>(())
//! ```
//!
//! ## Modules
//!
//! - [`chart`]: tree root, naming and the synthesis pass
//! - [`grafana`]: the Grafana instance and label/namespace propagation
//! - [`datasource`]: data sources and their dashboard variables
//! - [`dashboard`]: dashboard model assembly
//! - [`config`]: TOML chart descriptions
//! - [`naming`]: construct paths and generated object names
//! - [`error`]: error types and results

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod chart;
pub mod config;
pub mod dashboard;
pub mod datasource;
pub mod error;
pub mod grafana;
pub mod naming;

pub use chart::{Chart, ChartProps};
pub use config::{ChartConfig, DashboardConfig, DataSourceConfig, InstanceConfig};
pub use dashboard::{Dashboard, DashboardProps};
pub use datasource::{data_source_variable, DataSource, DataSourceProps};
pub use error::{ManifestError, ManifestResult};
pub use grafana::{Grafana, GrafanaProps};
pub use naming::ConstructPath;

pub use grafana_crd::{AccessType, GrafanaPlugin, Labels};
