//! Grafana dashboards.
//!
//! A [`Dashboard`] accumulates panels and plugins while the chart is being
//! built. Its JSON model is only assembled when the chart is synthesized, so
//! anything added after [`crate::Grafana::add_dashboard`] returns still ends
//! up in the manifest.
//!
//! The model is layered, lowest precedence first:
//!
//! 1. static defaults (`style: "dark"`, `schemaVersion: 17`, ...)
//! 2. computed fields (`title`, `time`, `refresh`, `panels`)
//! 3. the caller's `json_model`, merged shallowly: a top-level key there
//!    replaces the computed value wholesale.

use std::collections::BTreeMap;
use std::time::Duration;

use grafana_crd::{ApiObject, DashboardDataSource, GrafanaDashboardSpec, GrafanaPlugin, Labels};
use humantime::format_duration;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use tracing::debug;

use crate::chart::ChartProps;
use crate::datasource::DataSource;
use crate::error::{ManifestError, ManifestResult};
use crate::naming::ConstructPath;

/// Default auto-refresh interval.
pub const DEFAULT_REFRESH_RATE: Duration = Duration::from_secs(5);

/// Default time range shown by the dashboard.
pub const DEFAULT_TIME_RANGE: Duration = Duration::from_secs(6 * 60 * 60);

/// Grafana dashboard schema version written into the model.
pub const SCHEMA_VERSION: u32 = 17;

const fn default_refresh_rate() -> Duration {
    DEFAULT_REFRESH_RATE
}

const fn default_time_range() -> Duration {
    DEFAULT_TIME_RANGE
}

/// Properties of a dashboard.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardProps {
    /// Title of the dashboard.
    pub title: String,

    /// Dashboard file name, rendered as `spec.name`.
    #[serde(default)]
    pub name: Option<String>,

    /// Folder to group the dashboard into. The general folder when absent.
    #[serde(default)]
    pub folder: Option<String>,

    /// Mapping from `__inputs` variables to data source names, e.g.
    /// `DS_PROMETHEUS -> "my-prometheus"`. Only needed when importing a
    /// dashboard exported with variables.
    #[serde(default)]
    pub data_source_variables: BTreeMap<String, String>,

    /// Auto-refresh interval.
    #[serde(default = "default_refresh_rate", with = "humantime_serde")]
    pub refresh_rate: Duration,

    /// Time range, e.g. the last 6 hours.
    #[serde(default = "default_time_range", with = "humantime_serde")]
    pub time_range: Duration,

    /// Plugins the dashboard needs.
    #[serde(default)]
    pub plugins: Vec<GrafanaPlugin>,

    /// Labels for the resource. When added through a Grafana instance they
    /// are layered over the instance labels.
    #[serde(default)]
    pub labels: Labels,

    /// Namespace for the resource. Inherited from the Grafana instance when
    /// absent.
    #[serde(default)]
    pub namespace: Option<String>,

    /// Any other dashboard model fields. Replaces computed top-level keys.
    #[serde(default)]
    pub json_model: Map<String, Value>,
}

impl DashboardProps {
    /// Creates props with a title and defaults for everything else.
    #[must_use]
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            name: None,
            folder: None,
            data_source_variables: BTreeMap::new(),
            refresh_rate: DEFAULT_REFRESH_RATE,
            time_range: DEFAULT_TIME_RANGE,
            plugins: Vec::new(),
            labels: Labels::new(),
            namespace: None,
            json_model: Map::new(),
        }
    }

    /// Sets the dashboard file name.
    #[must_use]
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Sets the folder.
    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = Some(folder.into());
        self
    }

    /// Sets the refresh rate.
    #[must_use]
    pub const fn with_refresh_rate(mut self, refresh_rate: Duration) -> Self {
        self.refresh_rate = refresh_rate;
        self
    }

    /// Sets the time range.
    #[must_use]
    pub const fn with_time_range(mut self, time_range: Duration) -> Self {
        self.time_range = time_range;
        self
    }

    /// Binds an `__inputs` variable to a data source name.
    #[must_use]
    pub fn with_data_source_variable(
        mut self,
        variable: impl Into<String>,
        data_source_name: impl Into<String>,
    ) -> Self {
        self.data_source_variables
            .insert(variable.into(), data_source_name.into());
        self
    }

    /// Binds a data source under its derived variable.
    #[must_use]
    pub fn with_data_source(self, data_source: &DataSource) -> Self {
        self.with_data_source_variable(data_source.variable(), data_source.name())
    }

    /// Adds plugins.
    #[must_use]
    pub fn with_plugins(mut self, plugins: impl IntoIterator<Item = GrafanaPlugin>) -> Self {
        self.plugins.extend(plugins);
        self
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Sets the model overrides.
    #[must_use]
    pub fn with_json_model(mut self, json_model: Map<String, Value>) -> Self {
        self.json_model = json_model;
        self
    }
}

/// A Grafana dashboard.
#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    path: ConstructPath,
    title: String,
    name: Option<String>,
    folder: Option<String>,
    data_source_variables: BTreeMap<String, String>,
    refresh_secs: u64,
    time_range_secs: u64,
    labels: Labels,
    namespace: Option<String>,
    json_model: Map<String, Value>,
    plugins: Vec<GrafanaPlugin>,
    panels: Vec<Value>,
}

impl Dashboard {
    pub(crate) fn new(path: ConstructPath, props: DashboardProps) -> ManifestResult<Self> {
        if props.title.is_empty() {
            return Err(ManifestError::MissingField("title"));
        }
        let refresh_secs = whole_seconds("refresh_rate", props.refresh_rate)?;
        let time_range_secs = whole_seconds("time_range", props.time_range)?;

        debug!(path = %path, title = %props.title, "created dashboard");

        let mut dashboard = Self {
            path,
            title: props.title,
            name: props.name,
            folder: props.folder,
            data_source_variables: props.data_source_variables,
            refresh_secs,
            time_range_secs,
            labels: props.labels,
            namespace: props.namespace,
            json_model: props.json_model,
            plugins: Vec::new(),
            panels: Vec::new(),
        };
        dashboard.add_plugins(props.plugins);
        Ok(dashboard)
    }

    /// Construct id within its scope.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Dashboard title.
    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Folder, if any.
    #[must_use]
    pub fn folder(&self) -> Option<&str> {
        self.folder.as_deref()
    }

    /// Effective labels.
    #[must_use]
    pub const fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Effective namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Plugins added so far, in order, duplicates included.
    #[must_use]
    pub fn plugins(&self) -> &[GrafanaPlugin] {
        &self.plugins
    }

    /// Panels added so far, with their assigned ids.
    #[must_use]
    pub fn panels(&self) -> &[Value] {
        &self.panels
    }

    /// Adds plugins. Nothing is deduplicated: the same plugin added twice is
    /// listed twice.
    pub fn add_plugins(&mut self, plugins: impl IntoIterator<Item = GrafanaPlugin>) -> &mut Self {
        let before = self.plugins.len();
        self.plugins.extend(plugins);
        debug!(
            path = %self.path,
            added = self.plugins.len() - before,
            total = self.plugins.len(),
            "added plugins"
        );
        self
    }

    /// Adds panels, stamping each with the next sequential `id`.
    ///
    /// Ids start at 0 and follow call order across batches. An `id` already
    /// present on a panel is overwritten. Values that are not JSON objects
    /// are kept verbatim but still consume an id.
    pub fn add_panels(&mut self, panels: impl IntoIterator<Item = Value>) -> &mut Self {
        let before = self.panels.len();
        for mut panel in panels {
            let id = self.panels.len();
            if let Value::Object(fields) = &mut panel {
                fields.insert("id".to_string(), json!(id));
            }
            self.panels.push(panel);
        }
        debug!(
            path = %self.path,
            added = self.panels.len() - before,
            total = self.panels.len(),
            "added panels"
        );
        self
    }

    fn input_bindings(&self) -> Vec<DashboardDataSource> {
        self.data_source_variables
            .iter()
            .map(|(variable, name)| DashboardDataSource {
                datasource_name: name.clone(),
                input_name: variable.clone(),
            })
            .collect()
    }

    fn model(&self) -> Map<String, Value> {
        let mut model = default_model();
        model.insert("title".to_string(), json!(self.title));
        model.insert("panels".to_string(), Value::Array(self.panels.clone()));
        model.insert(
            "time".to_string(),
            json!({
                "from": format!("now-{}s", self.time_range_secs),
                "to": "now",
            }),
        );
        model.insert("refresh".to_string(), json!(format!("{}s", self.refresh_secs)));

        for (key, value) in &self.json_model {
            model.insert(key.clone(), value.clone());
        }
        model
    }

    pub(crate) fn to_manifest(&self, chart: &ChartProps) -> ManifestResult<Value> {
        let json = serde_json::to_string_pretty(&Value::Object(self.model()))?;
        let metadata = chart.metadata(&self.path, &self.labels, self.namespace.as_deref());
        let spec = GrafanaDashboardSpec {
            name: self.name.clone(),
            custom_folder_name: self.folder.clone(),
            datasources: self.input_bindings(),
            plugins: self.plugins.clone(),
            json,
        };
        Ok(ApiObject::new(metadata, spec).to_value()?)
    }
}

// Key order here is the key order of the rendered model.
fn default_model() -> Map<String, Value> {
    let defaults = json!({
        "title": "",
        "id": null,
        "tags": [],
        "style": "dark",
        "timezone": "browser",
        "editable": true,
        "hideControls": false,
        "graphTooltip": 1,
        "panels": [],
        "time": {},
        "timepicker": {
            "time_options": [],
            "refresh_intervals": []
        },
        "templating": {
            "list": []
        },
        "annotations": {
            "list": []
        },
        "refresh": "",
        "schemaVersion": SCHEMA_VERSION,
        "version": 0,
        "links": []
    });
    match defaults {
        Value::Object(map) => map,
        _ => Map::new(),
    }
}

fn whole_seconds(field: &'static str, duration: Duration) -> ManifestResult<u64> {
    if duration.subsec_nanos() != 0 {
        return Err(ManifestError::NonIntegralDuration {
            field,
            duration: format_duration(duration).to_string(),
        });
    }
    Ok(duration.as_secs())
}
