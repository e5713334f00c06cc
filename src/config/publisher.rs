use serde::Deserialize;
use serde::Serialize;

use super::validate_destination;
use super::validate_not_empty;
use crate::Result;

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct PublisherConfig {
    /// Per-host topic command batches are published on
    #[serde(default = "default_commands_destination")]
    pub destination: String,

    /// Cluster key for execution commands that name no cluster
    #[serde(default = "default_unassigned_cluster_id")]
    pub unassigned_cluster_id: String,

    /// Command parameter that names a custom command (e.g. `SET_KEYTAB`)
    #[serde(default = "default_custom_command_param")]
    pub custom_command_param: String,

    /// Dump every dispatched command as JSON at debug level
    #[serde(default)]
    pub trace_commands: bool,
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            destination: default_commands_destination(),
            unassigned_cluster_id: default_unassigned_cluster_id(),
            custom_command_param: default_custom_command_param(),
            trace_commands: false,
        }
    }
}

impl PublisherConfig {
    pub fn validate(&self) -> Result<()> {
        validate_destination("publisher.destination", &self.destination)?;
        validate_not_empty("publisher.unassigned_cluster_id", &self.unassigned_cluster_id)?;
        validate_not_empty("publisher.custom_command_param", &self.custom_command_param)
    }
}

fn default_commands_destination() -> String {
    "/user/commands".to_string()
}
fn default_unassigned_cluster_id() -> String {
    "-1".to_string()
}
fn default_custom_command_param() -> String {
    "custom_command".to_string()
}
