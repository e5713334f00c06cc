use serde::Deserialize;
use serde::Serialize;

use super::validate_destination;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TopologyConfig {
    /// Topic every topology change is broadcast on
    #[serde(default = "default_topology_destination")]
    pub destination: String,
}

impl Default for TopologyConfig {
    fn default() -> Self {
        Self {
            destination: default_topology_destination(),
        }
    }
}

impl TopologyConfig {
    pub fn validate(&self) -> Result<()> {
        validate_destination("topology.destination", &self.destination)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ConfigsConfig {
    /// Per-host topic configuration snapshots are published on
    #[serde(default = "default_configs_destination")]
    pub destination: String,
}

impl Default for ConfigsConfig {
    fn default() -> Self {
        Self {
            destination: default_configs_destination(),
        }
    }
}

impl ConfigsConfig {
    pub fn validate(&self) -> Result<()> {
        validate_destination("configs.destination", &self.destination)
    }
}

fn default_topology_destination() -> String {
    "/events/topologies".to_string()
}
fn default_configs_destination() -> String {
    "/user/configs".to_string()
}
