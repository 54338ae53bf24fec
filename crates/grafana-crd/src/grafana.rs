//! The `Grafana` kind: one Grafana deployment managed by the operator.

use serde::{Deserialize, Serialize};

use crate::meta::{LabelSelector, Labels};
use crate::object::CustomResource;

/// Spec of a `Grafana` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaSpec {
    /// Container image for the Grafana deployment.
    pub base_image: String,
    /// Ingress settings.
    pub ingress: GrafanaIngress,
    /// How the operator talks to the Grafana API.
    pub client: GrafanaClient,
    /// Contents of `grafana.ini`.
    pub config: GrafanaConfig,
    /// Deployment overrides.
    pub deployment: GrafanaDeployment,
    /// Selectors used by the operator to discover dashboards.
    pub dashboard_label_selector: Vec<LabelSelector>,
}

impl CustomResource for GrafanaSpec {
    const KIND: &'static str = "Grafana";
}

/// `spec.ingress`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrafanaIngress {
    /// Whether an ingress is created.
    pub enabled: bool,
}

/// `spec.client`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrafanaClient {
    /// Reach Grafana through its service instead of the ingress.
    pub prefer_service: bool,
}

/// `spec.config`, keyed by `grafana.ini` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrafanaConfig {
    /// `[log]`
    pub log: LogConfig,
    /// `[auth.anonymous]`
    #[serde(rename = "auth.anonymous")]
    pub auth_anonymous: AnonymousAuthConfig,
    /// `[security]`
    pub security: SecurityConfig,
}

/// `[log]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogConfig {
    /// Log output mode, e.g. `console`.
    pub mode: String,
    /// Log level, e.g. `info`.
    pub level: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            mode: "console".to_string(),
            level: "info".to_string(),
        }
    }
}

/// `[auth.anonymous]` section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct AnonymousAuthConfig {
    /// Allow viewing dashboards without logging in.
    pub enabled: bool,
}

/// `[security]` section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// Initial admin user.
    pub admin_user: String,
    /// Initial admin password.
    pub admin_password: String,
}

/// `spec.deployment`
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct GrafanaDeployment {
    /// Labels applied to the Grafana pods.
    pub labels: Labels,
}
