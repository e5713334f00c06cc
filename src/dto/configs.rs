use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

/// Effective configuration of one cluster as seen from one host.
///
/// `configurations` maps a config type (e.g. `core-site`) to its properties.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterConfigs {
    #[serde(default)]
    pub configurations: BTreeMap<String, BTreeMap<String, String>>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub configuration_attributes: BTreeMap<String, BTreeMap<String, BTreeMap<String, String>>>,
}

impl ClusterConfigs {
    pub fn with_property(
        mut self,
        config_type: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.configurations
            .entry(config_type.into())
            .or_default()
            .insert(key.into(), value.into());
        self
    }
}

/// Full configuration snapshot of a single host, keyed by cluster id.
///
/// Always replaced as a whole; there is no property-level merge.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HostConfigs {
    #[serde(default)]
    pub timestamp: u64,
    #[serde(default)]
    pub clusters: BTreeMap<String, ClusterConfigs>,
}

impl HostConfigs {
    pub fn with_cluster(
        mut self,
        cluster_id: impl Into<String>,
        configs: ClusterConfigs,
    ) -> Self {
        self.clusters.insert(cluster_id.into(), configs);
        self
    }
}
