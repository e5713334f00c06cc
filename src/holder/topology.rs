//! Cluster topology holder.
//!
//! Tracks, per cluster id, which components run on which hosts. Deltas are
//! merged at component granularity (see [`TopologyCluster::update`]).
//!
//! Component host names are controller-internal: every event leaving the
//! controller is built from a copy with those names cleared, and the held
//! state is never sanitized in place.

use std::collections::BTreeMap;
use std::sync::Arc;

use tracing::debug;
use tracing::info;
use tracing::instrument;

use super::DataSource;
use super::HeldState;
use super::ScopeMerge;
use super::StateHolder;
use super::StateStrategy;
use crate::ClusterId;
use crate::ClusterRegistry;
use crate::ClusterView;
use crate::Destination;
use crate::EventType;
use crate::OutboundEvent;
use crate::Result;
use crate::ScopeKey;
use crate::StateError;
use crate::TopologyCluster;
use crate::TopologyComponent;
use crate::TopologyConfig;
use crate::Transport;
use crate::UpdateEvent;

/// Copy of a topology event with all component host names cleared
pub fn agent_topology(update: &UpdateEvent<TopologyCluster>) -> UpdateEvent<TopologyCluster> {
    UpdateEvent {
        scopes: update
            .scopes
            .iter()
            .map(|(scope, cluster)| (scope.clone(), cluster.agent_copy()))
            .collect(),
        event_type: update.event_type,
        fingerprint: update.fingerprint.clone(),
    }
}

#[derive(Debug, Clone)]
pub struct TopologyStrategy {
    destination: String,
}

impl TopologyStrategy {
    pub fn new(config: &TopologyConfig) -> Self {
        Self {
            destination: config.destination.clone(),
        }
    }
}

impl StateStrategy for TopologyStrategy {
    type Value = TopologyCluster;

    fn name(&self) -> &'static str {
        "topology"
    }

    fn empty_value(&self) -> TopologyCluster {
        TopologyCluster::default()
    }

    /// Any merge into a known cluster is reported as a change, even when
    /// the delta turned out to be a no-op. Agents may receive a redundant
    /// event but never miss one.
    fn merge_update(
        &self,
        scope: &str,
        existing: Option<&mut TopologyCluster>,
        incoming: &TopologyCluster,
        event_type: EventType,
    ) -> Result<ScopeMerge<TopologyCluster>> {
        match existing {
            Some(current) => {
                if event_type == EventType::Delete && current.is_empty() {
                    info!("removing empty cluster {} from topology", scope);
                    return Ok(ScopeMerge::Remove);
                }
                if !current.update(&incoming.components, &incoming.hosts, event_type) {
                    debug!(
                        "{:?} delta for cluster {} did not alter it, propagating anyway",
                        event_type, scope
                    );
                }
                Ok(ScopeMerge::Changed)
            }
            None => match event_type {
                EventType::Create | EventType::Update => Ok(ScopeMerge::Insert(incoming.clone())),
                EventType::Delete => Err(StateError::ScopeNotFound {
                    scope: scope.to_string(),
                }
                .into()),
            },
        }
    }

    fn outbound(
        &self,
        update: &UpdateEvent<TopologyCluster>,
    ) -> Result<Vec<(Destination, OutboundEvent)>> {
        Ok(vec![(
            Destination::broadcast(self.destination.clone()),
            OutboundEvent::Topology(agent_topology(update)),
        )])
    }
}

/// Builds cluster topologies from the cluster registry
pub struct RegistryTopologySource {
    registry: Arc<dyn ClusterRegistry>,
}

impl RegistryTopologySource {
    pub fn new(registry: Arc<dyn ClusterRegistry>) -> Self {
        Self { registry }
    }
}

impl DataSource<TopologyCluster> for RegistryTopologySource {
    fn scopes(&self) -> Result<Vec<ScopeKey>> {
        Ok(self
            .registry
            .cluster_ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect())
    }

    fn fetch(
        &self,
        scope: &str,
    ) -> Result<TopologyCluster> {
        let cluster_id: ClusterId = scope.parse().map_err(|_| StateError::InvalidScope {
            scope: scope.to_string(),
        })?;
        let view = self
            .registry
            .cluster(cluster_id)
            .ok_or_else(|| StateError::ScopeUnavailable {
                scope: scope.to_string(),
                reason: "cluster is not registered".to_string(),
            })?;
        Ok(build_topology(&view))
    }
}

/// Cross-references component assignments with the cluster's hosts.
///
/// Components without any assigned host are left out. Host ids are resolved
/// by matching the component's host names against the cluster's host list;
/// names that match no registered host are kept as names only.
pub fn build_topology(view: &ClusterView) -> TopologyCluster {
    let components = view
        .components
        .iter()
        .filter(|assignment| !assignment.host_names.is_empty())
        .map(|assignment| {
            let host_ids = view
                .hosts
                .iter()
                .filter(|host| assignment.host_names.contains(&host.host_name))
                .map(|host| host.host_id);
            TopologyComponent {
                component_name: assignment.component_name.clone(),
                service_name: assignment.service_name.clone(),
                display_name: None,
                version: assignment.version.clone(),
                host_ids: host_ids.collect(),
                host_names: assignment.host_names.clone(),
                public_host_names: assignment.public_host_names.clone(),
                component_level_params: assignment.component_level_params.clone(),
                command_params: assignment.command_params.clone(),
            }
        })
        .collect();
    TopologyCluster::new(components, view.hosts.clone())
}

/// Owner of the controller's view of every cluster's topology
#[derive(Debug)]
pub struct TopologyHolder {
    inner: StateHolder<TopologyStrategy>,
}

impl TopologyHolder {
    pub fn new(
        config: &TopologyConfig,
        registry: Arc<dyn ClusterRegistry>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self::with_source(config, Arc::new(RegistryTopologySource::new(registry)), transport)
    }

    pub fn with_source(
        config: &TopologyConfig,
        source: Arc<dyn DataSource<TopologyCluster>>,
        transport: Arc<dyn Transport>,
    ) -> Self {
        Self {
            inner: StateHolder::new(TopologyStrategy::new(config), source, transport),
        }
    }

    /// Loads the topology of every registered cluster
    pub fn initialize(&self) -> Result<bool> {
        self.inner.initialize()
    }

    /// Rebuilds from the registry and broadcasts if anything moved
    pub fn resync(&self) -> Result<bool> {
        self.inner.resync()
    }

    /// Canonical topology of every registered cluster, host names included.
    /// Sanitize with [`agent_topology`] before sending it anywhere.
    pub fn current_data(&self) -> Result<UpdateEvent<TopologyCluster>> {
        self.inner.current_data()
    }

    pub fn full_snapshot(
        &self,
        cluster_id: &str,
    ) -> Result<TopologyCluster> {
        self.inner.full_snapshot(cluster_id)
    }

    /// Agent-safe change check: the returned event never carries host names
    pub fn update_if_changed(
        &self,
        prior_fingerprint: &str,
    ) -> UpdateEvent<TopologyCluster> {
        let update = self.inner.update_if_changed(prior_fingerprint);
        if update.is_no_op() {
            return update;
        }
        agent_topology(&update)
    }

    /// Merges `update` without publishing
    pub fn apply_update(
        &self,
        update: &UpdateEvent<TopologyCluster>,
    ) -> Result<bool> {
        self.inner.apply_update(update)
    }

    /// Merges `update` and broadcasts a sanitized copy if anything changed
    #[instrument(skip(self, update))]
    pub fn update_data(
        &self,
        update: UpdateEvent<TopologyCluster>,
    ) -> Result<bool> {
        self.inner.update_data(update)
    }

    /// Asks for a cluster to be dropped. Only honored once the held
    /// cluster has neither components nor hosts left.
    pub fn remove_cluster(
        &self,
        cluster_id: &str,
    ) -> Result<bool> {
        let empty = self.inner.strategy().empty_value();
        self.update_data(UpdateEvent::single(cluster_id, empty, EventType::Delete))
    }

    pub fn snapshot(&self) -> Arc<HeldState<TopologyCluster>> {
        self.inner.snapshot()
    }

    /// Held topology of one cluster, host names included
    pub fn cluster(
        &self,
        cluster_id: &str,
    ) -> Option<TopologyCluster> {
        self.inner.snapshot().scopes.get(cluster_id).cloned()
    }

    pub fn clusters(&self) -> BTreeMap<ScopeKey, TopologyCluster> {
        self.inner.snapshot().scopes.clone()
    }

    pub fn fingerprint(&self) -> String {
        self.inner.fingerprint()
    }
}
