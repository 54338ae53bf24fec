//! Grafana instances.
//!
//! A [`Grafana`] renders the operator's `Grafana` resource and owns the data
//! sources and dashboards created through it. Children inherit the
//! instance's labels (their own labels win on conflict) and namespace (unless
//! they set one), so the operator's label selector picks them up.

use std::collections::BTreeSet;

use grafana_crd::{
    AnonymousAuthConfig, ApiObject, GrafanaClient, GrafanaConfig, GrafanaDeployment,
    GrafanaIngress, GrafanaSpec, LabelSelector, Labels, LogConfig, SecurityConfig,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::chart::ChartProps;
use crate::dashboard::{Dashboard, DashboardProps};
use crate::datasource::{DataSource, DataSourceProps};
use crate::error::{ManifestError, ManifestResult};
use crate::naming::ConstructPath;

/// Default Grafana image.
pub const DEFAULT_IMAGE: &str = "public.ecr.aws/ubuntu/grafana:latest";

/// Id of the data source created from [`GrafanaProps::default_data_source`].
pub const DEFAULT_DATA_SOURCE_ID: &str = "default-datasource";

/// Properties of a Grafana instance. Every field has a default.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GrafanaProps {
    /// Container image.
    pub image: String,

    /// Create an ingress for external access.
    pub ingress: bool,

    /// Initial admin user.
    pub admin_user: String,

    /// Initial admin password.
    pub admin_password: String,

    /// Require login to view or manage dashboards.
    pub require_login: bool,

    /// Data source added on construction, as if by `add_data_source`.
    pub default_data_source: Option<DataSourceProps>,

    /// Labels applied to the instance and to every child.
    pub labels: Labels,

    /// Namespace for the instance and its children. The operator must watch
    /// this namespace.
    pub namespace: Option<String>,
}

impl Default for GrafanaProps {
    fn default() -> Self {
        let mut labels = Labels::new();
        labels.insert("app".to_string(), "grafana".to_string());
        Self {
            image: DEFAULT_IMAGE.to_string(),
            ingress: true,
            admin_user: "root".to_string(),
            admin_password: "secret".to_string(),
            require_login: false,
            default_data_source: None,
            labels,
            namespace: None,
        }
    }
}

impl GrafanaProps {
    /// Sets the image.
    #[must_use]
    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = image.into();
        self
    }

    /// Enables or disables the ingress.
    #[must_use]
    pub const fn with_ingress(mut self, ingress: bool) -> Self {
        self.ingress = ingress;
        self
    }

    /// Sets the admin credentials.
    #[must_use]
    pub fn with_admin(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.admin_user = user.into();
        self.admin_password = password.into();
        self
    }

    /// Sets whether login is required.
    #[must_use]
    pub const fn with_require_login(mut self, require_login: bool) -> Self {
        self.require_login = require_login;
        self
    }

    /// Sets the default data source.
    #[must_use]
    pub fn with_default_data_source(mut self, props: DataSourceProps) -> Self {
        self.default_data_source = Some(props);
        self
    }

    /// Replaces the labels, dropping the `app: grafana` default.
    #[must_use]
    pub fn with_labels(mut self, labels: Labels) -> Self {
        self.labels = labels;
        self
    }

    /// Sets the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = Some(namespace.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Child {
    DataSource(usize),
    Dashboard(usize),
}

/// A Grafana instance.
#[derive(Debug, Clone, PartialEq)]
pub struct Grafana {
    path: ConstructPath,
    image: String,
    ingress: bool,
    admin_user: String,
    admin_password: String,
    require_login: bool,
    labels: Labels,
    namespace: Option<String>,
    data_sources: Vec<DataSource>,
    dashboards: Vec<Dashboard>,
    ids: BTreeSet<String>,
    order: Vec<Child>,
}

impl Grafana {
    pub(crate) fn new(path: ConstructPath, props: GrafanaProps) -> ManifestResult<Self> {
        debug!(path = %path, labels = props.labels.len(), "created grafana instance");

        let mut grafana = Self {
            path,
            image: props.image,
            ingress: props.ingress,
            admin_user: props.admin_user,
            admin_password: props.admin_password,
            require_login: props.require_login,
            labels: props.labels,
            namespace: props.namespace,
            data_sources: Vec::new(),
            dashboards: Vec::new(),
            ids: BTreeSet::new(),
            order: Vec::new(),
        };

        if let Some(default_data_source) = props.default_data_source {
            grafana.add_data_source(DEFAULT_DATA_SOURCE_ID, default_data_source)?;
        }
        Ok(grafana)
    }

    /// Construct id within its scope.
    #[must_use]
    pub fn id(&self) -> &str {
        self.path.id()
    }

    /// Base labels shared with every child.
    #[must_use]
    pub const fn labels(&self) -> &Labels {
        &self.labels
    }

    /// Namespace shared with every child.
    #[must_use]
    pub fn namespace(&self) -> Option<&str> {
        self.namespace.as_deref()
    }

    /// Data sources in creation order.
    #[must_use]
    pub fn data_sources(&self) -> &[DataSource] {
        &self.data_sources
    }

    /// Dashboards in creation order.
    #[must_use]
    pub fn dashboards(&self) -> &[Dashboard] {
        &self.dashboards
    }

    /// Looks up a data source by construct id.
    #[must_use]
    pub fn data_source(&self, id: &str) -> Option<&DataSource> {
        self.data_sources.iter().find(|ds| ds.id() == id)
    }

    /// Looks up a dashboard by construct id for further changes.
    pub fn dashboard_mut(&mut self, id: &str) -> Option<&mut Dashboard> {
        self.dashboards.iter_mut().find(|d| d.id() == id)
    }

    /// Adds a data source carrying the instance labels and namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is invalid or already used in this instance,
    /// or if the props are missing a required field.
    pub fn add_data_source(
        &mut self,
        id: &str,
        props: DataSourceProps,
    ) -> ManifestResult<&DataSource> {
        let path = self.claim(id)?;
        let props = DataSourceProps {
            labels: merge_labels(&self.labels, props.labels),
            namespace: props.namespace.or_else(|| self.namespace.clone()),
            ..props
        };
        let data_source = DataSource::new(path, props)?;

        self.ids.insert(id.to_string());
        self.order.push(Child::DataSource(self.data_sources.len()));
        self.data_sources.push(data_source);
        debug!(scope = %self.path, id, "attached data source");
        Ok(&self.data_sources[self.data_sources.len() - 1])
    }

    /// Adds a dashboard carrying the instance labels and namespace.
    ///
    /// # Errors
    ///
    /// Returns an error if `id` is invalid or already used in this instance,
    /// or if the props are invalid.
    pub fn add_dashboard(
        &mut self,
        id: &str,
        props: DashboardProps,
    ) -> ManifestResult<&mut Dashboard> {
        let path = self.claim(id)?;
        let props = DashboardProps {
            labels: merge_labels(&self.labels, props.labels),
            namespace: props.namespace.or_else(|| self.namespace.clone()),
            ..props
        };
        let dashboard = Dashboard::new(path, props)?;

        self.ids.insert(id.to_string());
        self.order.push(Child::Dashboard(self.dashboards.len()));
        self.dashboards.push(dashboard);
        debug!(scope = %self.path, id, "attached dashboard");
        let last = self.dashboards.len() - 1;
        Ok(&mut self.dashboards[last])
    }

    // Validates the id without recording it; callers insert once the child
    // was built so a failed construction leaves no trace.
    fn claim(&self, id: &str) -> ManifestResult<ConstructPath> {
        let path = self.path.child(id)?;
        if self.ids.contains(id) {
            return Err(ManifestError::duplicate_id(&self.path, id));
        }
        Ok(path)
    }

    fn spec(&self) -> GrafanaSpec {
        GrafanaSpec {
            base_image: self.image.clone(),
            ingress: GrafanaIngress {
                enabled: self.ingress,
            },
            // Dashboards are not discovered reliably through the ingress.
            client: GrafanaClient {
                prefer_service: true,
            },
            config: GrafanaConfig {
                log: LogConfig::default(),
                auth_anonymous: AnonymousAuthConfig {
                    enabled: !self.require_login,
                },
                security: SecurityConfig {
                    admin_user: self.admin_user.clone(),
                    admin_password: self.admin_password.clone(),
                },
            },
            deployment: GrafanaDeployment {
                labels: self.labels.clone(),
            },
            dashboard_label_selector: vec![LabelSelector::match_labels(self.labels.clone())],
        }
    }

    /// Renders the instance followed by its children in creation order.
    pub(crate) fn to_manifests(&self, chart: &ChartProps) -> ManifestResult<Vec<Value>> {
        let metadata = chart.metadata(&self.path, &self.labels, self.namespace.as_deref());
        let mut manifests = Vec::with_capacity(1 + self.order.len());
        manifests.push(ApiObject::new(metadata, self.spec()).to_value()?);

        for child in &self.order {
            let manifest = match *child {
                Child::DataSource(index) => self.data_sources[index].to_manifest(chart)?,
                Child::Dashboard(index) => self.dashboards[index].to_manifest(chart)?,
            };
            manifests.push(manifest);
        }
        Ok(manifests)
    }
}

/// Layers `overrides` over `base`; keys in `overrides` win.
#[must_use]
pub fn merge_labels(base: &Labels, overrides: Labels) -> Labels {
    let mut merged = base.clone();
    merged.extend(overrides);
    merged
}

#[cfg(test)]
mod tests {
    use super::*;
    use grafana_crd::AccessType;
    use serde_json::json;

    fn grafana(props: GrafanaProps) -> Grafana {
        let path = ConstructPath::root("test")
            .and_then(|root| root.child("my-grafana"))
            .expect("path");
        Grafana::new(path, props).expect("grafana")
    }

    fn prometheus() -> DataSourceProps {
        DataSourceProps::new("Prometheus", "prometheus", AccessType::Proxy)
            .with_url("http://prometheus-service:9090")
    }

    fn render(grafana: &Grafana) -> Vec<Value> {
        grafana.to_manifests(&ChartProps::default()).expect("render")
    }

    #[test]
    fn default_spec() {
        let manifests = render(&grafana(GrafanaProps::default()));
        assert_eq!(manifests.len(), 1);

        let manifest = &manifests[0];
        assert_eq!(manifest["kind"], "Grafana");
        assert_eq!(manifest["metadata"]["labels"], json!({"app": "grafana"}));
        assert_eq!(
            manifest["spec"],
            json!({
                "baseImage": "public.ecr.aws/ubuntu/grafana:latest",
                "ingress": {"enabled": true},
                "client": {"preferService": true},
                "config": {
                    "log": {"mode": "console", "level": "info"},
                    "auth.anonymous": {"enabled": true},
                    "security": {"admin_user": "root", "admin_password": "secret"}
                },
                "deployment": {"labels": {"app": "grafana"}},
                "dashboardLabelSelector": [{"matchLabels": {"app": "grafana"}}]
            })
        );
    }

    #[test]
    fn customized_auth() {
        let manifests = render(&grafana(
            GrafanaProps::default()
                .with_admin("admin", "this-is-a-bad-password")
                .with_require_login(true),
        ));
        let config = &manifests[0]["spec"]["config"];
        assert_eq!(config["auth.anonymous"]["enabled"], false);
        assert_eq!(config["security"]["admin_user"], "admin");
        assert_eq!(config["security"]["admin_password"], "this-is-a-bad-password");
    }

    #[test]
    fn default_data_source_is_created_first() {
        let mut instance = grafana(GrafanaProps::default().with_default_data_source(prometheus()));
        instance
            .add_data_source("loki", DataSourceProps::new("Loki", "loki", AccessType::Proxy))
            .expect("add");

        assert_eq!(instance.data_sources().len(), 2);
        assert_eq!(instance.data_sources()[0].id(), DEFAULT_DATA_SOURCE_ID);
        let first = instance.data_source(DEFAULT_DATA_SOURCE_ID).expect("lookup");
        assert_eq!(first.name(), "Prometheus");
        assert_eq!(instance.data_source("loki").map(DataSource::name), Some("Loki"));
        assert!(instance.data_source("missing").is_none());

        let manifests = render(&instance);
        assert_eq!(manifests[1]["spec"]["name"], "Prometheus");
        assert_eq!(manifests[2]["spec"]["name"], "Loki");
    }

    #[test]
    fn children_inherit_labels_and_namespace() {
        let mut labels = Labels::new();
        labels.insert("stage".to_string(), "prod".to_string());
        let mut instance = grafana(
            GrafanaProps::default()
                .with_labels(labels)
                .with_namespace("my-namespace"),
        );
        instance.add_data_source("prometheus", prometheus()).expect("add");
        instance
            .add_dashboard("my-dashboard", DashboardProps::new("My Dashboard"))
            .expect("add");

        for manifest in render(&instance) {
            assert_eq!(manifest["metadata"]["labels"]["stage"], "prod");
            assert_eq!(manifest["metadata"]["namespace"], "my-namespace");
        }
    }

    #[test]
    fn child_labels_and_namespace_win() {
        let mut instance = grafana(GrafanaProps::default().with_namespace("shared"));
        let dashboard = instance
            .add_dashboard(
                "my-dashboard",
                DashboardProps::new("d")
                    .with_label("app", "custom")
                    .with_label("team", "sre")
                    .with_namespace("elsewhere"),
            )
            .expect("add");

        assert_eq!(dashboard.labels().get("app").map(String::as_str), Some("custom"));
        assert_eq!(dashboard.labels().get("team").map(String::as_str), Some("sre"));
        assert_eq!(dashboard.namespace(), Some("elsewhere"));
    }

    #[test]
    fn duplicate_child_ids_fail() {
        let mut instance = grafana(GrafanaProps::default());
        instance.add_data_source("shared", prometheus()).expect("add");
        let err = instance
            .add_dashboard("shared", DashboardProps::new("d"))
            .expect_err("duplicate");
        assert!(matches!(err, ManifestError::DuplicateId { .. }));
        assert!(instance.dashboards().is_empty());
    }

    #[test]
    fn failed_child_does_not_reserve_id() {
        let mut instance = grafana(GrafanaProps::default());
        assert!(instance.add_dashboard("d", DashboardProps::new("")).is_err());
        assert!(instance.add_dashboard("d", DashboardProps::new("ok")).is_ok());
    }

    #[test]
    fn children_render_in_call_order() {
        let mut instance = grafana(GrafanaProps::default());
        instance.add_dashboard("first", DashboardProps::new("First")).expect("add");
        instance.add_data_source("second", prometheus()).expect("add");
        instance.add_dashboard("third", DashboardProps::new("Third")).expect("add");

        let kinds: Vec<String> = render(&instance)
            .iter()
            .map(|m| m["kind"].as_str().unwrap_or_default().to_string())
            .collect();
        assert_eq!(
            kinds,
            ["Grafana", "GrafanaDashboard", "GrafanaDataSource", "GrafanaDashboard"]
        );
    }

    #[test]
    fn dashboards_can_be_found_again() {
        let mut instance = grafana(GrafanaProps::default());
        instance
            .add_dashboard("my-dashboard", DashboardProps::new("d").with_folder("ops"))
            .expect("add");
        let dashboard = instance.dashboard_mut("my-dashboard").expect("lookup");
        assert_eq!(dashboard.title(), "d");
        assert_eq!(dashboard.folder(), Some("ops"));
        dashboard.add_panels([json!({"type": "text"})]);

        assert_eq!(instance.dashboards()[0].panels().len(), 1);
        assert!(instance.dashboard_mut("missing").is_none());
    }

    #[test]
    fn merge_labels_prefers_overrides() {
        let mut base = Labels::new();
        base.insert("app".to_string(), "grafana".to_string());
        base.insert("stage".to_string(), "prod".to_string());
        let mut overrides = Labels::new();
        overrides.insert("app".to_string(), "custom".to_string());

        let merged = merge_labels(&base, overrides);
        assert_eq!(merged.get("app").map(String::as_str), Some("custom"));
        assert_eq!(merged.get("stage").map(String::as_str), Some("prod"));
    }

    #[test]
    fn props_deserialize_with_defaults() {
        let props: GrafanaProps = toml::from_str(
            r#"
            require_login = true
            namespace = "monitoring"
            "#,
        )
        .expect("parse");
        assert!(props.require_login);
        assert_eq!(props.image, DEFAULT_IMAGE);
        assert_eq!(props.labels.get("app").map(String::as_str), Some("grafana"));
    }
}
