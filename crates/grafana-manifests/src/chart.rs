//! The chart: root of a construct tree and its single synthesis pass.
//!
//! Building and rendering are two separate phases. While the chart is being
//! built, builders are mutated through `&mut` handles. [`Chart::synth`] takes
//! `&self`, so nothing can be mutated while manifests are being rendered, and
//! every panel or plugin added before the call is part of the output.

use std::collections::BTreeSet;

use grafana_crd::{Labels, ObjectMeta};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::dashboard::{Dashboard, DashboardProps};
use crate::datasource::{DataSource, DataSourceProps};
use crate::error::{ManifestError, ManifestResult};
use crate::grafana::{merge_labels, Grafana, GrafanaProps};
use crate::naming::ConstructPath;

/// Defaults applied to every object in a chart.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartProps {
    /// Namespace for objects that do not set one.
    pub namespace: Option<String>,

    /// Labels layered under every object's own labels.
    pub labels: Labels,

    /// Use the readable path alone as `metadata.name`, without the hash
    /// suffix. Names may then collide.
    pub disable_name_hashes: bool,
}

impl ChartProps {
    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }

    /// Adds a label.
    #[must_use]
    pub fn with_label(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.labels.insert(key.into(), value.into());
        self
    }

    /// Turns off the hash suffix on generated names.
    #[must_use]
    pub const fn without_name_hashes(mut self) -> Self {
        self.disable_name_hashes = true;
        self
    }

    pub(crate) fn metadata(
        &self,
        path: &ConstructPath,
        labels: &Labels,
        namespace: Option<&str>,
    ) -> ObjectMeta {
        ObjectMeta::named(path.to_dns_label(!self.disable_name_hashes))
            .with_namespace(namespace.map(str::to_string).or_else(|| self.namespace.clone()))
            .with_labels(merge_labels(&self.labels, labels.clone()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Node {
    Grafana(usize),
    Dashboard(usize),
    DataSource(usize),
}

/// Root of a construct tree.
#[derive(Debug, Clone, PartialEq)]
pub struct Chart {
    path: ConstructPath,
    props: ChartProps,
    grafanas: Vec<Grafana>,
    dashboards: Vec<Dashboard>,
    data_sources: Vec<DataSource>,
    ids: BTreeSet<String>,
    order: Vec<Node>,
}

impl Chart {
    /// Creates an empty chart.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn new(id: &str) -> ManifestResult<Self> {
        Self::with_props(id, ChartProps::default())
    }

    /// Creates an empty chart with chart-wide defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the id is empty or contains `/`.
    pub fn with_props(id: &str, props: ChartProps) -> ManifestResult<Self> {
        let path = ConstructPath::root(id)?;
        debug!(chart = %path, "created chart");
        Ok(Self {
            path,
            props,
            grafanas: Vec::new(),
            dashboards: Vec::new(),
            data_sources: Vec::new(),
            ids: BTreeSet::new(),
            order: Vec::new(),
        })
    }

    /// Chart id.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Chart-wide defaults.
    #[must_use]
    pub const fn props(&self) -> &ChartProps {
        &self.props
    }

    /// Adds a Grafana instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is invalid or already used in this chart, or
    /// if the default data source is invalid.
    pub fn add_grafana(&mut self, id: &str, props: GrafanaProps) -> ManifestResult<&mut Grafana> {
        let path = self.claim(id)?;
        let grafana = Grafana::new(path, props)?;
        self.ids.insert(id.to_string());
        self.order.push(Node::Grafana(self.grafanas.len()));
        self.grafanas.push(grafana);
        debug!(scope = %self.path, id, "attached grafana instance");
        let last = self.grafanas.len() - 1;
        Ok(&mut self.grafanas[last])
    }

    /// Adds a dashboard that belongs to no Grafana instance. Labels and
    /// namespace must be set on the props.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is invalid or already used in this chart, or
    /// if the props are invalid.
    pub fn add_dashboard(
        &mut self,
        id: &str,
        props: DashboardProps,
    ) -> ManifestResult<&mut Dashboard> {
        let path = self.claim(id)?;
        let dashboard = Dashboard::new(path, props)?;
        self.ids.insert(id.to_string());
        self.order.push(Node::Dashboard(self.dashboards.len()));
        self.dashboards.push(dashboard);
        debug!(scope = %self.path, id, "attached dashboard");
        let last = self.dashboards.len() - 1;
        Ok(&mut self.dashboards[last])
    }

    /// Adds a data source that belongs to no Grafana instance.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is invalid or already used in this chart, or
    /// if the props are missing a required field.
    pub fn add_data_source(
        &mut self,
        id: &str,
        props: DataSourceProps,
    ) -> ManifestResult<&DataSource> {
        let path = self.claim(id)?;
        let data_source = DataSource::new(path, props)?;
        self.ids.insert(id.to_string());
        self.order.push(Node::DataSource(self.data_sources.len()));
        self.data_sources.push(data_source);
        debug!(scope = %self.path, id, "attached data source");
        Ok(&self.data_sources[self.data_sources.len() - 1])
    }

    /// Looks up a Grafana instance by id.
    #[must_use]
    pub fn grafana(&self, id: &str) -> Option<&Grafana> {
        self.grafanas.iter().find(|g| g.id() == id)
    }

    /// Looks up a Grafana instance by id for further changes.
    pub fn grafana_mut(&mut self, id: &str) -> Option<&mut Grafana> {
        self.grafanas.iter_mut().find(|g| g.id() == id)
    }

    /// Looks up a stand-alone dashboard by id for further changes.
    pub fn dashboard_mut(&mut self, id: &str) -> Option<&mut Dashboard> {
        self.dashboards.iter_mut().find(|d| d.id() == id)
    }

    fn claim(&self, id: &str) -> ManifestResult<ConstructPath> {
        let path = self.path.child(id)?;
        if self.ids.contains(id) {
            return Err(ManifestError::duplicate_id(&self.path, id));
        }
        Ok(path)
    }

    /// Renders every object in the chart, depth first in creation order.
    ///
    /// # Errors
    ///
    /// Returns an error if any object fails to serialize. No documents are
    /// returned in that case.
    pub fn synth(&self) -> ManifestResult<Vec<Value>> {
        let mut manifests = Vec::new();
        for node in &self.order {
            match *node {
                Node::Grafana(index) => {
                    manifests.extend(self.grafanas[index].to_manifests(&self.props)?);
                }
                Node::Dashboard(index) => {
                    manifests.push(self.dashboards[index].to_manifest(&self.props)?);
                }
                Node::DataSource(index) => {
                    manifests.push(self.data_sources[index].to_manifest(&self.props)?);
                }
            }
        }
        info!(chart = %self.path, documents = manifests.len(), "synthesized chart");
        Ok(manifests)
    }

    /// Renders the chart as a pretty-printed JSON array.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis or encoding fails.
    pub fn to_json(&self) -> ManifestResult<String> {
        Ok(serde_json::to_string_pretty(&self.synth()?)?)
    }

    /// Renders the chart as a multi-document YAML stream.
    ///
    /// # Errors
    ///
    /// Returns an error if synthesis or encoding fails.
    pub fn to_yaml(&self) -> ManifestResult<String> {
        let documents = self
            .synth()?
            .iter()
            .map(serde_yaml::to_string)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(documents.join("---\n"))
    }
}
