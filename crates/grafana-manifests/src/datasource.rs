//! Grafana data sources.
//!
//! A [`DataSource`] renders one `GrafanaDataSource` resource provisioning a
//! single data source. Dashboards refer to it through [`DataSource::variable`]
//! and [`DataSource::name`], never through the object itself.

use grafana_crd::{AccessType, ApiObject, DataSourceFields, GrafanaDataSourceSpec, Labels};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::chart::ChartProps;
use crate::error::{ManifestError, ManifestResult};
use crate::naming::ConstructPath;

/// Prefix of the dashboard input variable derived from a data source name.
pub const VARIABLE_PREFIX: &str = "DS_";

/// Returns the `__inputs` variable name Grafana exports for a data source.
///
/// Only ASCII letters are upper-cased; other characters are kept as-is.
#[must_use]
pub fn data_source_variable(name: &str) -> String {
    format!("{VARIABLE_PREFIX}{}", name.to_ascii_uppercase())
}

/// Properties of a data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceProps {
    /// Name of the data source.
    pub name: String,

    /// Type of the data source, e.g. `prometheus`.
    #[serde(rename = "type")]
    pub type_: String,

    /// Access mode.
    pub access: AccessType,

    /// URL of the data source.
    #[serde(default)]
    pub url: Option<String>,

    /// Free-text description.
    #[serde(default)]
    pub description: Option<String>,

    /// Labels for the resource. When added through a Grafana instance they
    /// are layered over the instance labels.
    #[serde(default)]
    pub labels: Labels,

    /// Namespace for the resource. Inherited from the Grafana instance when
    /// absent.
    #[serde(default)]
    pub namespace: Option<String>,
}

impl DataSourceProps {
    /// Creates props with the required fields.
    #[must_use]
    pub fn new(name: impl Into<String>, type_: impl Into<String>, access: AccessType) -> Self {
        Self {
            name: name.into(),
            type_: type_.into(),
            access,
            url: None,
            description: None,
            labels: Labels::new(),
            namespace: None,
        }
    }

    /// Sets the URL.
    #[must_use]
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
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

    fn validate(&self) -> ManifestResult<()> {
        if self.name.is_empty() {
            return Err(ManifestError::MissingField("name"));
        }
        if self.type_.is_empty() {
            return Err(ManifestError::MissingField("type"));
        }
        Ok(())
    }
}

/// A Grafana data source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSource {
    path: ConstructPath,
    props: DataSourceProps,
    variable: String,
}

impl DataSource {
    pub(crate) fn new(path: ConstructPath, props: DataSourceProps) -> ManifestResult<Self> {
        props.validate()?;
        let variable = data_source_variable(&props.name);
        debug!(path = %path, name = %props.name, variable = %variable, "created data source");
        Ok(Self {
            path,
            props,
            variable,
        })
    }

    /// Construct id within its scope.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Name of the data source.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.props.name
    }

    /// Variable name dashboards use to refer to this data source.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    /// Type of the data source.
    #[must_use]
    pub fn type_(&self) -> &str {
        &self.props.type_
    }

    /// Access mode.
    #[must_use]
    pub const fn access(&self) -> AccessType {
        self.props.access
    }

    /// URL, if any.
    #[must_use]
    pub fn url(&self) -> Option<&str> {
        self.props.url.as_deref()
    }

    /// Description, if any.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.props.description.as_deref()
    }

    /// Effective labels.
    #[must_use]
    pub const fn labels(&self) -> &Labels {
        &self.props.labels
    }

    /// Effective namespace.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.props.namespace.as_deref()
    }

    pub(crate) fn to_manifest(&self, chart: &ChartProps) -> ManifestResult<Value> {
        let metadata = chart.metadata(&self.path, &self.props.labels, self.props.namespace.as_deref());
        let spec = GrafanaDataSourceSpec {
            name: self.props.name.clone(),
            datasources: vec![DataSourceFields {
                name: self.props.name.clone(),
                type_: self.props.type_.clone(),
                access: self.props.access,
                url: self.props.url.clone(),
            }],
        };
        Ok(ApiObject::new(metadata, spec).to_value()?)
    }
}
