//! Per-host configuration holder.
//!
//! Scopes are host ids. A host's snapshot is always replaced as a whole and
//! every change is sent to that host only.

use std::fmt::Debug;
use std::sync::Arc;

use tracing::debug;
use tracing::warn;

use super::replace_scope;
use super::scope_fingerprint;
use super::DataSource;
use super::HeldState;
use super::ScopeMerge;
use super::StateHolder;
use super::StateStrategy;
use crate::ClusterId;
use crate::ClusterRegistry;
use crate::ConfigsConfig;
use crate::Destination;
use crate::EventType;
use crate::HostConfigs;
use crate::HostId;
use crate::OutboundEvent;
use crate::Result;
use crate::StateError;
use crate::Transport;
use crate::UpdateEvent;

#[derive(Debug, Clone)]
pub struct ConfigsStrategy {
    destination: String,
}

impl ConfigsStrategy {
    pub fn new(config: &ConfigsConfig) -> Self {
        Self {
            destination: config.destination.clone(),
        }
    }
}

impl StateStrategy for ConfigsStrategy {
    type Value = HostConfigs;

    fn name(&self) -> &'static str {
        "configs"
    }

    fn empty_value(&self) -> HostConfigs {
        HostConfigs::default()
    }

    /// Whole-value replacement, restricted to numeric host scopes
    fn merge_update(
        &self,
        scope: &str,
        existing: Option<&mut HostConfigs>,
        incoming: &HostConfigs,
        event_type: EventType,
    ) -> Result<ScopeMerge<HostConfigs>> {
        host_scope(scope)?;
        replace_scope(scope, existing, incoming, event_type)
    }

    /// One event per host, each stamped with that host's own fingerprint
    fn outbound(
        &self,
        update: &UpdateEvent<HostConfigs>,
    ) -> Result<Vec<(Destination, OutboundEvent)>> {
        update
            .scopes
            .iter()
            .map(|(scope, configs)| {
                let host_id = host_scope(scope)?;
                let event = UpdateEvent::single(scope.clone(), configs.clone(), update.event_type)
                    .with_fingerprint(scope_fingerprint(configs)?);
                Ok((
                    Destination::host(host_id, self.destination.clone()),
                    OutboundEvent::Configs(event),
                ))
            })
            .collect()
    }
}

fn host_scope(scope: &str) -> Result<HostId> {
    scope.parse().map_err(|_| {
        warn!("rejecting configs for non-numeric host scope {:?}", scope);
        StateError::InvalidScope {
            scope: scope.to_string(),
        }
        .into()
    })
}

/// Owner of the configuration snapshot of every agent host
pub struct ConfigHolder {
    inner: StateHolder<ConfigsStrategy>,
    source: Arc<dyn DataSource<HostConfigs>>,
    registry: Arc<dyn ClusterRegistry>,
}

impl Debug for ConfigHolder {
    fn fmt(
        &self,
        f: &mut std::fmt::Formatter<'_>,
    ) -> std::fmt::Result {
        f.debug_struct("ConfigHolder").field("inner", &self.inner).finish()
    }
}

impl ConfigHolder {
    pub fn new(
        config: &ConfigsConfig,
        source: Arc<dyn DataSource<HostConfigs>>,
        registry: Arc<dyn ClusterRegistry>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: StateHolder::new(ConfigsStrategy::new(config), source.clone(), transport),
            source,
            registry,
        }
    }

    pub fn initialize(&self) -> Result<bool> {
        self.inner.initialize()
    }

    pub fn current_data(&self) -> Result<UpdateEvent<HostConfigs>> {
        self.inner.current_data()
    }

    /// Change check for the agent on `host_id`, against that host's
    /// fingerprint. Loads the host's snapshot if it is not held yet.
    pub fn host_update_if_changed(
        &self,
        host_id: HostId,
        prior_fingerprint: &str,
    ) -> Result<UpdateEvent<HostConfigs>> {
        self.inner
            .scope_update_if_changed(&host_id.to_string(), prior_fingerprint)
    }

    /// Replaces the snapshot of one host and notifies it
    pub fn update_host(
        &self,
        host_id: HostId,
        configs: HostConfigs,
    ) -> Result<bool> {
        self.update_data(UpdateEvent::single(host_id.to_string(), configs, EventType::Update))
    }

    pub fn remove_host(
        &self,
        host_id: HostId,
    ) -> Result<bool> {
        let empty = self.inner.strategy().empty_value();
        self.update_data(UpdateEvent::single(host_id.to_string(), empty, EventType::Delete))
    }

    pub fn apply_update(
        &self,
        update: &UpdateEvent<HostConfigs>,
    ) -> Result<bool> {
        self.inner.apply_update(update)
    }

    pub fn update_data(
        &self,
        update: UpdateEvent<HostConfigs>,
    ) -> Result<bool> {
        self.inner.update_data(update)
    }

    /// Rebuilds and pushes the snapshots of `host_ids`.
    ///
    /// An empty `host_ids` means every host of `cluster_id`; a cluster
    /// without hosts falls back to every registered host. All snapshots are
    /// fetched before anything is applied. Returns the number of hosts that
    /// were notified.
    ///
    /// # Errors
    /// [`StateError::ScopeNotFound`] if `cluster_id` is unknown and no host
    /// ids were given.
    pub fn refresh_hosts(
        &self,
        cluster_id: ClusterId,
        host_ids: &[HostId],
    ) -> Result<usize> {
        let targets = if host_ids.is_empty() {
            let view = self
                .registry
                .cluster(cluster_id)
                .ok_or_else(|| StateError::ScopeNotFound {
                    scope: cluster_id.to_string(),
                })?;
            if view.hosts.is_empty() {
                self.registry.host_ids()
            } else {
                view.hosts.iter().map(|host| host.host_id).collect()
            }
        } else {
            host_ids.to_vec()
        };

        let mut fetched = Vec::with_capacity(targets.len());
        for host_id in targets {
            let scope = host_id.to_string();
            let configs = self.source.fetch(&scope)?;
            fetched.push((scope, configs));
        }

        let mut notified = 0;
        for (scope, configs) in fetched {
            if self.update_data(UpdateEvent::single(scope, configs, EventType::Update))? {
                notified += 1;
            }
        }
        debug!("refreshed configs of {} hosts in cluster {}", notified, cluster_id);
        Ok(notified)
    }

    pub fn snapshot(&self) -> Arc<HeldState<HostConfigs>> {
        self.inner.snapshot()
    }

    pub fn host(
        &self,
        host_id: HostId,
    ) -> Option<HostConfigs> {
        self.inner.snapshot().scopes.get(&host_id.to_string()).cloned()
    }

    pub fn fingerprint(&self) -> String {
        self.inner.fingerprint()
    }
}
