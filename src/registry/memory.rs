use dashmap::DashMap;
use tracing::debug;

use super::ClusterRegistry;
use super::ClusterView;
use super::TaskLookup;
use crate::ClusterId;
use crate::HostId;

/// Registry kept entirely in memory.
///
/// Suitable for embedding the holders without a persistence layer and for
/// driving them in tests. All maps are concurrent, so writers and readers
/// on different threads never block each other for long.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    clusters: DashMap<ClusterId, ClusterView>,
    hosts: DashMap<HostId, String>,
    tasks: DashMap<u64, ClusterId>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts or replaces a cluster. Its hosts are registered as well.
    pub fn upsert_cluster(
        &self,
        view: ClusterView,
    ) {
        for host in &view.hosts {
            self.hosts.insert(host.host_id, host.host_name.clone());
        }
        debug!("upsert cluster {}({})", view.cluster_name, view.cluster_id);
        self.clusters.insert(view.cluster_id, view);
    }

    pub fn remove_cluster(
        &self,
        cluster_id: ClusterId,
    ) -> Option<ClusterView> {
        self.clusters.remove(&cluster_id).map(|(_, view)| view)
    }

    /// Registers a host that is not (yet) part of any cluster
    pub fn register_host(
        &self,
        host_id: HostId,
        host_name: impl Into<String>,
    ) {
        self.hosts.insert(host_id, host_name.into());
    }

    /// Records which cluster's stage owns `task_id`
    pub fn record_task(
        &self,
        task_id: u64,
        cluster_id: ClusterId,
    ) {
        self.tasks.insert(task_id, cluster_id);
    }
}

impl ClusterRegistry for InMemoryRegistry {
    fn cluster_ids(&self) -> Vec<ClusterId> {
        let mut ids: Vec<ClusterId> = self.clusters.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }

    fn cluster(
        &self,
        cluster_id: ClusterId,
    ) -> Option<ClusterView> {
        self.clusters.get(&cluster_id).map(|e| e.value().clone())
    }

    fn cluster_id_by_name(
        &self,
        cluster_name: &str,
    ) -> Option<ClusterId> {
        self.clusters
            .iter()
            .find(|e| e.value().cluster_name == cluster_name)
            .map(|e| *e.key())
    }

    fn host_name(
        &self,
        host_id: HostId,
    ) -> Option<String> {
        self.hosts.get(&host_id).map(|e| e.value().clone())
    }

    fn host_ids(&self) -> Vec<HostId> {
        let mut ids: Vec<HostId> = self.hosts.iter().map(|e| *e.key()).collect();
        ids.sort_unstable();
        ids
    }
}

impl TaskLookup for InMemoryRegistry {
    fn stage_cluster_id(
        &self,
        task_id: u64,
    ) -> Option<ClusterId> {
        self.tasks.get(&task_id).map(|e| *e.value())
    }
}
