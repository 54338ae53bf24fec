//! The `GrafanaDashboard` kind.

use serde::{Deserialize, Serialize};

use crate::object::CustomResource;

/// Spec of a `GrafanaDashboard` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaDashboardSpec {
    /// Dashboard file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Folder the dashboard is placed in; the general folder when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_folder_name: Option<String>,

    /// Bindings from `__inputs` variables to provisioned data sources.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub datasources: Vec<DashboardDataSource>,

    /// Plugins the dashboard needs installed.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub plugins: Vec<GrafanaPlugin>,

    /// The dashboard JSON model, as a string.
    pub json: String,
}

impl CustomResource for GrafanaDashboardSpec {
    const KIND: &'static str = "GrafanaDashboard";
}

/// One `spec.datasources` entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardDataSource {
    /// Name of the provisioned data source.
    pub datasource_name: String,
    /// Name of the `__inputs` variable, e.g. `DS_PROMETHEUS`.
    pub input_name: String,
}

/// A Grafana plugin required by a dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GrafanaPlugin {
    /// Plugin id, e.g. `grafana-piechart-panel`.
    pub name: String,
    /// Plugin version, e.g. `1.3.6`.
    pub version: String,
}

impl GrafanaPlugin {
    /// Creates a plugin reference.
    #[must_use]
    pub fn new(name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: version.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_bindings_are_omitted() {
        let spec = GrafanaDashboardSpec {
            name: None,
            custom_folder_name: None,
            datasources: Vec::new(),
            plugins: Vec::new(),
            json: "{}".to_string(),
        };
        let value = serde_json::to_value(&spec).expect("serialize");
        assert_eq!(value, json!({"json": "{}"}));
    }

    #[test]
    fn bindings_use_operator_field_names() {
        let spec = GrafanaDashboardSpec {
            name: Some("my-dashboard.json".to_string()),
            custom_folder_name: Some("special".to_string()),
            datasources: vec![DashboardDataSource {
                datasource_name: "Prometheus".to_string(),
                input_name: "DS_PROMETHEUS".to_string(),
            }],
            plugins: vec![GrafanaPlugin::new("grafana-clock-panel", "1.0.2")],
            json: "{}".to_string(),
        };
        let value = serde_json::to_value(&spec).expect("serialize");
        assert_eq!(
            value,
            json!({
                "name": "my-dashboard.json",
                "customFolderName": "special",
                "datasources": [{"datasourceName": "Prometheus", "inputName": "DS_PROMETHEUS"}],
                "plugins": [{"name": "grafana-clock-panel", "version": "1.0.2"}],
                "json": "{}"
            })
        );
    }
}
