use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use tracing::debug;
use tracing::info;
use tracing::instrument;

use super::KeytabAction;
use crate::keytab_location;
use crate::metrics::INJECTED_KEYTABS;
use crate::read_keytab;
use crate::AgentCommand;
use crate::AgentSyncConfig;
use crate::CancelCommand;
use crate::ClusterRegistry;
use crate::Destination;
use crate::ExecutionCommand;
use crate::ExecutionCommandEvent;
use crate::ExecutionCommandsCluster;
use crate::HostId;
use crate::KeytabParams;
use crate::OutboundEvent;
use crate::PublisherConfig;
use crate::ResolutionError;
use crate::Result;
use crate::SecretStore;
use crate::SecretsConfig;
use crate::TaskLookup;
use crate::Transport;

/// A command whose cluster has been resolved, ready to be bundled
enum Routed {
    Execution(ExecutionCommand),
    Cancel(CancelCommand),
}

/// Batches agent commands per host and hands them to the transport.
///
/// Safe to share between threads; a dispatch call holds no lock.
pub struct CommandPublisher {
    registry: Arc<dyn ClusterRegistry>,
    tasks: Arc<dyn TaskLookup>,
    secrets: Arc<dyn SecretStore>,
    transport: Arc<dyn Transport>,
    config: PublisherConfig,
    secrets_config: SecretsConfig,
}

impl std::fmt::Debug for CommandPublisher {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("CommandPublisher")
            .field("config", &self.config)
            .field("secrets_config", &self.secrets_config)
            .finish()
    }
}

impl CommandPublisher {
    pub fn new(
        config: &AgentSyncConfig,
        registry: Arc<dyn ClusterRegistry>,
        tasks: Arc<dyn TaskLookup>,
        secrets: Arc<dyn SecretStore>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            registry,
            tasks,
            secrets,
            transport,
            config: config.publisher.clone(),
            secrets_config: config.secrets.clone(),
        }
    }

    /// Publishes `commands` with one transport call per distinct host.
    ///
    /// Every command is resolved to its cluster and enriched before anything
    /// is published, so a resolution or secret access failure leaves all
    /// hosts untouched. Hosts are published in ascending order of their id's
    /// string form; commands keep their relative order within a host.
    ///
    /// Returns the number of host events published.
    ///
    /// # Errors
    /// - [`ResolutionError`] for an unknown cluster name, task or host
    /// - [`SecretAccessError`](crate::SecretAccessError) when keytab material
    ///   cannot be read
    #[instrument(skip_all)]
    pub fn dispatch<I>(
        &self,
        commands: I,
    ) -> Result<usize>
    where
        I: IntoIterator<Item = (HostId, AgentCommand)>,
    {
        let mut routed = Vec::new();
        for (host_id, command) in commands {
            self.trace_command(&command);
            let (cluster_id, command) = self.resolve(command)?;
            routed.push((host_id, cluster_id, command));
        }

        for (host_id, _, command) in routed.iter_mut() {
            if let Routed::Execution(command) = command {
                self.enrich(*host_id, command)?;
            }
        }

        let mut hosts: BTreeMap<String, ExecutionCommandEvent> = BTreeMap::new();
        for (host_id, cluster_id, command) in routed {
            let bundle = hosts
                .entry(host_id.to_string())
                .or_insert_with(|| ExecutionCommandEvent {
                    host_id,
                    clusters: BTreeMap::new(),
                })
                .clusters
                .entry(cluster_id)
                .or_insert_with(ExecutionCommandsCluster::default);
            match command {
                Routed::Execution(command) => bundle.execution_commands.push(command),
                Routed::Cancel(command) => bundle.cancel_commands.push(command),
            }
        }

        let published = hosts.len();
        for (_, event) in hosts {
            let destination = Destination::host(event.host_id, self.config.destination.clone());
            self.transport
                .publish(destination, OutboundEvent::Commands(event))?;
        }
        Ok(published)
    }

    /// Publishes a single command to `host_id`
    pub fn dispatch_one(
        &self,
        host_id: HostId,
        command: AgentCommand,
    ) -> Result<usize> {
        self.dispatch([(host_id, command)])
    }

    fn resolve(
        &self,
        command: AgentCommand,
    ) -> Result<(String, Routed)> {
        match command {
            AgentCommand::Execution(command) => self.resolve_execution(command, false),
            AgentCommand::BackgroundExecution(command) => self.resolve_execution(command, true),
            AgentCommand::Cancel(command) => {
                let cluster_id = self
                    .tasks
                    .stage_cluster_id(command.target_task_id)
                    .ok_or(ResolutionError::UnknownTask {
                        task_id: command.target_task_id,
                    })?;
                Ok((cluster_id.to_string(), Routed::Cancel(command)))
            }
        }
    }

    fn resolve_execution(
        &self,
        mut command: ExecutionCommand,
        background: bool,
    ) -> Result<(String, Routed)> {
        info!(
            "sending execution command for host {}, role {}, roleCommand {}, command id {}, task id {}",
            command.host_name, command.role, command.role_command, command.command_id, command.task_id
        );
        let cluster_id = match command.cluster_name.as_deref() {
            Some(cluster_name) => self
                .registry
                .cluster_id_by_name(cluster_name)
                .ok_or_else(|| ResolutionError::UnknownCluster {
                    cluster_name: cluster_name.to_string(),
                })?
                .to_string(),
            None => self.config.unassigned_cluster_id.clone(),
        };
        command.cluster_id = Some(cluster_id.clone());
        command.background |= background;
        Ok((cluster_id, Routed::Execution(command)))
    }

    fn enrich(
        &self,
        host_id: HostId,
        command: &mut ExecutionCommand,
    ) -> Result<()> {
        let Some(action) = command
            .command_param(&self.config.custom_command_param)
            .and_then(KeytabAction::from_custom_command)
        else {
            return Ok(());
        };
        info!("{} called", action.as_str());
        let target_host = self
            .registry
            .host_name(host_id)
            .ok_or(ResolutionError::UnknownHost { host_id })?;
        self.inject_secret(command, action, &target_host)
    }

    /// Appends keytab entries for `target_host` to the command's kerberos
    /// parameters.
    ///
    /// A command without a data directory parameter is left as it is.
    pub fn inject_secret(
        &self,
        command: &mut ExecutionCommand,
        action: KeytabAction,
        target_host: &str,
    ) -> Result<()> {
        let Some(data_dir) = command.command_param(&self.secrets_config.data_directory_param) else {
            debug!(
                "command {} has no {} parameter, nothing to inject",
                command.command_id, self.secrets_config.data_directory_param
            );
            return Ok(());
        };
        let data_dir = Path::new(data_dir).to_path_buf();

        let mut entries = Vec::new();
        // Dropped on every return below, which closes the record source
        let records = self.secrets.open(&data_dir)?;
        for record in records {
            let record = record?;
            if !record.hostname.eq_ignore_ascii_case(target_host) {
                continue;
            }
            match action {
                KeytabAction::Set => {
                    let Some(keytab_path) = record.keytab_file_path.as_deref() else {
                        continue;
                    };
                    let location = keytab_location(&data_dir, &record.hostname, keytab_path);
                    if let Some(content) = read_keytab(&location)? {
                        entries.push(KeytabParams::with_content(&record, STANDARD.encode(content)));
                    }
                }
                KeytabAction::Remove => entries.push(KeytabParams::for_removal(&record)),
            }
        }

        INJECTED_KEYTABS
            .with_label_values(&[action.as_str()])
            .inc_by(entries.len() as u64);
        debug!(
            "injected {} {} entries into command {} for {}",
            entries.len(),
            action.as_str(),
            command.command_id,
            target_host
        );
        command.kerberos_command_params.extend(entries);
        Ok(())
    }

    fn trace_command(
        &self,
        command: &AgentCommand,
    ) {
        if !self.config.trace_commands {
            return;
        }
        match serde_json::to_string(command) {
            Ok(json) => debug!("sending command string = {}", json),
            Err(e) => debug!("could not render {} for tracing: {}", command.kind(), e),
        }
    }
}
