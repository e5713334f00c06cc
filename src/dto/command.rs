use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Serialize;

use super::HostId;
use super::KeytabParams;

/// Commands the controller sends to agents.
///
/// The variant is the discriminant; dispatch matches on it exhaustively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "commandType")]
pub enum AgentCommand {
    #[serde(rename = "EXECUTION_COMMAND")]
    Execution(ExecutionCommand),
    #[serde(rename = "BACKGROUND_EXECUTION_COMMAND")]
    BackgroundExecution(ExecutionCommand),
    #[serde(rename = "CANCEL_COMMAND")]
    Cancel(CancelCommand),
}

impl AgentCommand {
    pub fn kind(&self) -> &'static str {
        match self {
            AgentCommand::Execution(_) => "EXECUTION_COMMAND",
            AgentCommand::BackgroundExecution(_) => "BACKGROUND_EXECUTION_COMMAND",
            AgentCommand::Cancel(_) => "CANCEL_COMMAND",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionCommand {
    #[serde(rename = "hostname")]
    pub host_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_name: Option<String>,
    /// Filled in by the publisher once the cluster name is resolved
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cluster_id: Option<String>,
    pub role: String,
    pub role_command: String,
    pub task_id: u64,
    pub command_id: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub background: bool,
    #[serde(default)]
    pub command_params: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub kerberos_command_params: Vec<KeytabParams>,
}

impl ExecutionCommand {
    pub fn new(
        host_name: impl Into<String>,
        cluster_name: Option<&str>,
        role: impl Into<String>,
        role_command: impl Into<String>,
        task_id: u64,
        command_id: impl Into<String>,
    ) -> Self {
        Self {
            host_name: host_name.into(),
            cluster_name: cluster_name.map(str::to_owned),
            role: role.into(),
            role_command: role_command.into(),
            task_id,
            command_id: command_id.into(),
            ..Default::default()
        }
    }

    pub fn with_command_param(
        mut self,
        key: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.command_params.insert(key.into(), value.into());
        self
    }

    pub fn command_param(
        &self,
        key: &str,
    ) -> Option<&str> {
        self.command_params.get(key).map(String::as_str)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CancelCommand {
    #[serde(rename = "hostname")]
    pub host_name: String,
    pub target_task_id: u64,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub reason: String,
}

impl CancelCommand {
    pub fn new(
        host_name: impl Into<String>,
        target_task_id: u64,
        reason: impl Into<String>,
    ) -> Self {
        Self {
            host_name: host_name.into(),
            target_task_id,
            reason: reason.into(),
        }
    }
}

/// Commands for one host within one cluster, built fresh for every publish
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExecutionCommandsCluster {
    pub execution_commands: Vec<ExecutionCommand>,
    pub cancel_commands: Vec<CancelCommand>,
}

impl ExecutionCommandsCluster {
    pub fn is_empty(&self) -> bool {
        self.execution_commands.is_empty() && self.cancel_commands.is_empty()
    }
}

/// Everything published to one host in one dispatch call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExecutionCommandEvent {
    #[serde(rename = "host")]
    pub host_id: HostId,
    pub clusters: BTreeMap<String, ExecutionCommandsCluster>,
}
