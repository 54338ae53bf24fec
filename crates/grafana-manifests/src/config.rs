//! Declarative chart descriptions.
//!
//! A chart can be described in TOML instead of code. The file mirrors the
//! builder API one to one:
//!
//! ```toml
//! id = "monitoring"
//! namespace = "observability"
//!
//! [[grafana]]
//! id = "my-grafana"
//! require_login = true
//!
//! [[grafana.data_sources]]
//! id = "prometheus"
//! name = "Prometheus"
//! type = "prometheus"
//! access = "proxy"
//! url = "http://prometheus-service:9090"
//!
//! [[grafana.dashboards]]
//! id = "my-dashboard"
//! title = "My Dashboard"
//! refresh_rate = "10s"
//! ```
//!
//! Unknown keys are rejected at every level, so a misspelled property fails
//! the load instead of silently falling back to its default.

use std::collections::BTreeMap;
use std::path::Path;

use grafana_crd::Labels;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::chart::{Chart, ChartProps};
use crate::dashboard::DashboardProps;
use crate::datasource::DataSourceProps;
use crate::error::{ManifestError, ManifestResult};
use crate::grafana::GrafanaProps;

// Keys left over after the flattened props took theirs.
type UnknownKeys = BTreeMap<String, toml::Value>;

/// A whole chart.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ChartConfig {
    /// Chart id.
    pub id: String,

    /// Chart-wide namespace.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Chart-wide labels.
    #[serde(default)]
    pub labels: Labels,

    /// See [`ChartProps::disable_name_hashes`].
    #[serde(default)]
    pub disable_name_hashes: bool,

    /// Grafana instances.
    #[serde(default)]
    pub grafana: Vec<InstanceConfig>,

    /// Dashboards outside any instance.
    #[serde(default)]
    pub dashboards: Vec<DashboardConfig>,

    /// Data sources outside any instance.
    #[serde(default)]
    pub data_sources: Vec<DataSourceConfig>,
}

/// One Grafana instance and its children.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InstanceConfig {
    /// Construct id.
    pub id: String,

    /// Data sources, added before the dashboards.
    #[serde(default)]
    pub data_sources: Vec<DataSourceConfig>,

    /// Dashboards.
    #[serde(default)]
    pub dashboards: Vec<DashboardConfig>,

    /// Instance properties.
    #[serde(flatten)]
    pub props: GrafanaProps,

    #[serde(flatten)]
    unknown: UnknownKeys,
}

/// One dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DashboardConfig {
    /// Construct id.
    pub id: String,

    /// Panels added after construction.
    #[serde(default)]
    pub panels: Vec<Value>,

    /// Dashboard properties.
    #[serde(flatten)]
    pub props: DashboardProps,

    #[serde(flatten)]
    unknown: UnknownKeys,
}

/// One data source.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DataSourceConfig {
    /// Construct id.
    pub id: String,

    /// Data source properties.
    #[serde(flatten)]
    pub props: DataSourceProps,

    #[serde(flatten)]
    unknown: UnknownKeys,
}

impl ChartConfig {
    /// Loads a chart description from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: impl AsRef<Path>) -> ManifestResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            ManifestError::Config(format!(
                "failed to read chart file '{}': {e}",
                path.display()
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Parses a chart description from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid or does not describe a chart.
    pub fn from_toml(content: &str) -> ManifestResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ManifestError::Config(format!("invalid TOML: {e}")))?;
        config.check_unknown_keys()?;
        debug!(
            chart = %config.id,
            instances = config.grafana.len(),
            "parsed chart description"
        );
        Ok(config)
    }

    fn check_unknown_keys(&self) -> ManifestResult<()> {
        for instance in &self.grafana {
            reject_unknown("grafana", &instance.id, &instance.unknown)?;
            for ds in &instance.data_sources {
                reject_unknown("data source", &ds.id, &ds.unknown)?;
            }
            for dashboard in &instance.dashboards {
                reject_unknown("dashboard", &dashboard.id, &dashboard.unknown)?;
            }
        }
        for ds in &self.data_sources {
            reject_unknown("data source", &ds.id, &ds.unknown)?;
        }
        for dashboard in &self.dashboards {
            reject_unknown("dashboard", &dashboard.id, &dashboard.unknown)?;
        }
        Ok(())
    }

    /// Replays the description through the builder API.
    ///
    /// # Errors
    ///
    /// Returns the first error any builder raises.
    pub fn build(&self) -> ManifestResult<Chart> {
        let props = ChartProps {
            namespace: self.namespace.clone(),
            labels: self.labels.clone(),
            disable_name_hashes: self.disable_name_hashes,
        };
        let mut chart = Chart::with_props(&self.id, props)?;

        for instance in &self.grafana {
            let grafana = chart.add_grafana(&instance.id, instance.props.clone())?;
            for ds in &instance.data_sources {
                grafana.add_data_source(&ds.id, ds.props.clone())?;
            }
            for dashboard in &instance.dashboards {
                grafana
                    .add_dashboard(&dashboard.id, dashboard.props.clone())?
                    .add_panels(dashboard.panels.iter().cloned());
            }
        }
        for ds in &self.data_sources {
            chart.add_data_source(&ds.id, ds.props.clone())?;
        }
        for dashboard in &self.dashboards {
            chart
                .add_dashboard(&dashboard.id, dashboard.props.clone())?
                .add_panels(dashboard.panels.iter().cloned());
        }
        Ok(chart)
    }
}

fn reject_unknown(kind: &str, id: &str, unknown: &UnknownKeys) -> ManifestResult<()> {
    match unknown.keys().next() {
        Some(key) => Err(ManifestError::Config(format!(
            "unknown key '{key}' in {kind} '{id}'"
        ))),
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::time::Duration;
    use tempfile::NamedTempFile;
    use test_case::test_case;

    const FULL: &str = r#"
        id = "monitoring"
        namespace = "observability"

        [labels]
        team = "sre"

        [[grafana]]
        id = "my-grafana"
        require_login = true
        admin_user = "admin"

        [grafana.default_data_source]
        name = "Prometheus"
        type = "prometheus"
        access = "proxy"
        url = "http://prometheus-service:9090"

        [[grafana.data_sources]]
        id = "loki"
        name = "Loki"
        type = "loki"
        access = "direct"

        [[grafana.dashboards]]
        id = "my-dashboard"
        title = "My Dashboard"
        folder = "special-dashboards"
        refresh_rate = "10s"
        plugins = [{ name = "grafana-clock-panel", version = "1.0.2" }]

        [grafana.dashboards.data_source_variables]
        DS_PROMETHEUS = "Prometheus"

        [[grafana.dashboards.panels]]
        type = "text"
        title = "Panel Title"

        [[dashboards]]
        id = "standalone"
        title = "Standalone"
    "#;

    fn create_temp_config(content: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().expect("failed to create temp file");
        file.write_all(content.as_bytes())
            .expect("failed to write temp file");
        file
    }

    #[test]
    fn parse_minimal_config() {
        let config = ChartConfig::from_toml(r#"id = "test""#).expect("parse");
        assert_eq!(config.id, "test");
        assert!(config.grafana.is_empty());
        assert!(config.build().expect("build").synth().expect("synth").is_empty());
    }

    #[test]
    fn parse_full_config() {
        let config = ChartConfig::from_toml(FULL).expect("parse");
        let instance = &config.grafana[0];

        assert!(instance.props.require_login);
        assert_eq!(instance.props.admin_user, "admin");
        assert_eq!(instance.props.admin_password, "secret");
        assert!(instance.props.default_data_source.is_some());
        assert_eq!(instance.data_sources[0].props.name, "Loki");

        let dashboard = &instance.dashboards[0];
        assert_eq!(dashboard.props.refresh_rate, Duration::from_secs(10));
        assert_eq!(dashboard.props.plugins.len(), 1);
        assert_eq!(dashboard.panels.len(), 1);
    }

    #[test]
    fn build_replays_builder_calls() {
        let chart = ChartConfig::from_toml(FULL)
            .and_then(|config| config.build())
            .expect("build");
        let manifests = chart.synth().expect("synth");

        let kinds: Vec<&str> = manifests
            .iter()
            .filter_map(|m| m["kind"].as_str())
            .collect();
        assert_eq!(
            kinds,
            [
                "Grafana",
                "GrafanaDataSource",
                "GrafanaDataSource",
                "GrafanaDashboard",
                "GrafanaDashboard"
            ]
        );

        assert_eq!(manifests[0]["spec"]["config"]["auth.anonymous"]["enabled"], false);
        assert_eq!(manifests[1]["spec"]["name"], "Prometheus");
        assert_eq!(manifests[3]["metadata"]["labels"]["team"], "sre");
        assert_eq!(manifests[3]["metadata"]["namespace"], "observability");
        let json = manifests[3]["spec"]["json"].as_str().expect("json");
        assert!(json.contains("Panel Title"));
        assert!(json.contains("\"refresh\": \"10s\""));
    }

    #[test]
    fn load_from_file() {
        let file = create_temp_config(FULL);
        let config = ChartConfig::from_file(file.path()).expect("load");
        assert_eq!(config.id, "monitoring");
    }

    #[test]
    fn file_not_found() {
        let err = ChartConfig::from_file("/nonexistent/path/chart.toml").expect_err("missing");
        assert!(matches!(err, ManifestError::Config(_)));
    }

    #[test]
    fn missing_required_dashboard_field() {
        let err = ChartConfig::from_toml(
            r#"
            id = "test"
            [[dashboards]]
            id = "untitled"
            "#,
        )
        .expect_err("title is required");
        assert!(err.to_string().contains("title"));
    }

    #[test_case(
        "[[dashboards]]\nid = \"d\"\ntitle = \"D\"\nrefresh-rate = \"10s\"",
        "unknown key 'refresh-rate' in dashboard 'd'" ;
        "dashboard"
    )]
    #[test_case(
        "[[data_sources]]\nid = \"ds\"\nname = \"x\"\ntype = \"x\"\naccess = \"proxy\"\nuri = \"http://x\"",
        "unknown key 'uri' in data source 'ds'" ;
        "data source"
    )]
    #[test_case(
        "[[grafana]]\nid = \"g\"\nrequire-login = true",
        "unknown key 'require-login' in grafana 'g'" ;
        "grafana instance"
    )]
    #[test_case(
        "[[grafana]]\nid = \"g\"\n[[grafana.dashboards]]\nid = \"d\"\ntitle = \"D\"\nfolders = \"x\"",
        "unknown key 'folders' in dashboard 'd'" ;
        "nested dashboard"
    )]
    fn unknown_keys_are_rejected(body: &str, message: &str) {
        let err = ChartConfig::from_toml(&format!("id = \"test\"\n{body}")).expect_err("unknown key");
        assert_eq!(err.to_string(), format!("configuration error: {message}"));
    }

    #[test]
    fn unknown_top_level_key_is_rejected() {
        let result = ChartConfig::from_toml("id = \"test\"\nnamespaces = \"x\"");
        assert!(matches!(result, Err(ManifestError::Config(_))));
    }

    #[test]
    fn invalid_access_mode() {
        let result = ChartConfig::from_toml(
            r#"
            id = "test"
            [[data_sources]]
            id = "ds"
            name = "x"
            type = "x"
            access = "tunnel"
            "#,
        );
        assert!(matches!(result, Err(ManifestError::Config(_))));
    }
}
