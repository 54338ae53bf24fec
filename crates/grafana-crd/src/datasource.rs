//! The `GrafanaDataSource` kind.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::object::CustomResource;

/// Spec of a `GrafanaDataSource` resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GrafanaDataSourceSpec {
    /// Name of the provisioning file.
    pub name: String,
    /// Data sources provisioned by this resource.
    pub datasources: Vec<DataSourceFields>,
}

impl CustomResource for GrafanaDataSourceSpec {
    const KIND: &'static str = "GrafanaDataSource";
}

/// One provisioned data source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataSourceFields {
    /// Display name inside Grafana.
    pub name: String,
    /// Data source plugin type, e.g. `prometheus`.
    #[serde(rename = "type")]
    pub type_: String,
    /// How Grafana reaches the data source.
    pub access: AccessType,
    /// Endpoint of the data source.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Mode for accessing a data source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessType {
    /// Requests go through the Grafana backend.
    Proxy,
    /// The browser talks to the data source directly.
    Direct,
}

impl AccessType {
    /// Wire name of the access mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Proxy => "proxy",
            Self::Direct => "direct",
        }
    }
}

impl fmt::Display for AccessType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use test_case::test_case;

    #[test_case(AccessType::Proxy, "proxy" ; "proxy")]
    #[test_case(AccessType::Direct, "direct" ; "direct")]
    fn access_wire_name(access: AccessType, expected: &str) {
        assert_eq!(access.as_str(), expected);
        assert_eq!(access.to_string(), expected);
        assert_eq!(serde_json::to_value(access).expect("serialize"), json!(expected));
    }

    #[test]
    fn url_is_omitted_when_absent() {
        let fields = DataSourceFields {
            name: "Loki".to_string(),
            type_: "loki".to_string(),
            access: AccessType::Direct,
            url: None,
        };
        let value = serde_json::to_value(&fields).expect("serialize");
        assert_eq!(value, json!({"name": "Loki", "type": "loki", "access": "direct"}));
    }
}
