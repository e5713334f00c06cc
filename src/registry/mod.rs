//! Read-only lookups into controller state owned by other subsystems.
//!
//! Cluster, host and service metadata (and the task/stage records used to
//! route cancel commands) are maintained elsewhere. The holders and the
//! command publisher only ever read them through these traits.
mod memory;
pub use memory::*;

#[cfg(test)]
mod memory_test;

use std::collections::BTreeMap;
use std::collections::BTreeSet;

#[cfg(test)]
use mockall::automock;

use crate::ClusterId;
use crate::HostId;
use crate::TopologyHost;

/// One component of one service, with the hosts it is assigned to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComponentAssignment {
    pub service_name: String,
    pub component_name: String,
    pub version: Option<String>,
    pub host_names: BTreeSet<String>,
    pub public_host_names: BTreeSet<String>,
    pub component_level_params: BTreeMap<String, String>,
    pub command_params: BTreeMap<String, String>,
}

impl ComponentAssignment {
    pub fn new(
        service_name: impl Into<String>,
        component_name: impl Into<String>,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            component_name: component_name.into(),
            ..Default::default()
        }
    }

    pub fn on_hosts<S: Into<String>>(
        mut self,
        host_names: impl IntoIterator<Item = S>,
    ) -> Self {
        self.host_names = host_names.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_version(
        mut self,
        version: impl Into<String>,
    ) -> Self {
        self.version = Some(version.into());
        self
    }
}

/// Current membership of one cluster
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClusterView {
    pub cluster_id: ClusterId,
    pub cluster_name: String,
    pub hosts: Vec<TopologyHost>,
    pub components: Vec<ComponentAssignment>,
}

#[cfg_attr(test, automock)]
pub trait ClusterRegistry: Send + Sync + 'static {
    /// Ids of every known cluster
    fn cluster_ids(&self) -> Vec<ClusterId>;

    /// Membership snapshot of one cluster, `None` if unknown
    fn cluster(
        &self,
        cluster_id: ClusterId,
    ) -> Option<ClusterView>;

    fn cluster_id_by_name(
        &self,
        cluster_name: &str,
    ) -> Option<ClusterId>;

    fn host_name(
        &self,
        host_id: HostId,
    ) -> Option<String>;

    /// Ids of every registered host, in or out of a cluster
    fn host_ids(&self) -> Vec<HostId>;
}

#[cfg_attr(test, automock)]
pub trait TaskLookup: Send + Sync + 'static {
    /// Cluster id of the stage that owns `task_id`
    fn stage_cluster_id(
        &self,
        task_id: u64,
    ) -> Option<ClusterId>;
}
