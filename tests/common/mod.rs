use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use agent_sync::keytab_location;
use agent_sync::ClusterConfigs;
use agent_sync::ClusterRegistry;
use agent_sync::ClusterView;
use agent_sync::ComponentAssignment;
use agent_sync::DataSource;
use agent_sync::Envelope;
use agent_sync::HostConfigs;
use agent_sync::InMemoryRegistry;
use agent_sync::Result;
use agent_sync::StateError;
use agent_sync::TopologyHost;
use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedReceiver;

pub const CLUSTER_ID: i64 = 1;
pub const CLUSTER_NAME: &str = "c1";

/// One cluster ("c1", id 1) with HDFS spread over three hosts, plus one
/// host that is registered but not part of any cluster
pub fn seeded_registry() -> Arc<InMemoryRegistry> {
    let registry = InMemoryRegistry::new();
    registry.upsert_cluster(ClusterView {
        cluster_id: CLUSTER_ID,
        cluster_name: CLUSTER_NAME.to_string(),
        hosts: vec![
            TopologyHost::new(1, "h1").with_rack("/r1"),
            TopologyHost::new(2, "h2").with_rack("/r1"),
            TopologyHost::new(3, "h3").with_rack("/r2"),
        ],
        components: vec![
            ComponentAssignment::new("HDFS", "NAMENODE")
                .on_hosts(["h1"])
                .with_version("3.1.1"),
            ComponentAssignment::new("HDFS", "DATANODE")
                .on_hosts(["h2", "h3"])
                .with_version("3.1.1"),
        ],
    });
    registry.register_host(4, "h4");
    Arc::new(registry)
}

/// Per-host configs that can be edited between refreshes
pub struct EditableConfigs {
    registry: Arc<InMemoryRegistry>,
    tags: Mutex<BTreeMap<String, String>>,
}

impl EditableConfigs {
    pub fn new(registry: Arc<InMemoryRegistry>) -> Self {
        Self {
            registry,
            tags: Mutex::new(BTreeMap::new()),
        }
    }

    pub fn set_tag(
        &self,
        host_id: i64,
        tag: &str,
    ) {
        self.tags.lock().insert(host_id.to_string(), tag.to_string());
    }
}

impl DataSource<HostConfigs> for EditableConfigs {
    fn scopes(&self) -> Result<Vec<String>> {
        Ok(self
            .registry
            .host_ids()
            .into_iter()
            .map(|id| id.to_string())
            .collect())
    }

    fn fetch(
        &self,
        scope: &str,
    ) -> Result<HostConfigs> {
        let known = scope
            .parse()
            .ok()
            .and_then(|id| self.registry.host_name(id))
            .is_some();
        if !known {
            return Err(StateError::ScopeUnavailable {
                scope: scope.to_string(),
                reason: "host is not registered".to_string(),
            }
            .into());
        }
        let tag = self.tags.lock().get(scope).cloned().unwrap_or_else(|| "initial".to_string());
        Ok(HostConfigs::default().with_cluster(
            CLUSTER_ID.to_string(),
            ClusterConfigs::default().with_property("core-site", "fs.defaultFS", format!("hdfs://{tag}")),
        ))
    }
}

pub fn drain(rx: &mut UnboundedReceiver<Envelope>) -> Vec<Envelope> {
    let mut envelopes = vec![];
    while let Ok(envelope) = rx.try_recv() {
        envelopes.push(envelope);
    }
    envelopes
}

/// Writes an identity file and keytab payloads for `(hostname, keytab path,
/// content)` triples
pub fn write_secrets(
    data_dir: &Path,
    keytabs: &[(&str, &str, &[u8])],
) {
    let mut lines = vec!["hostname,service,principal,keytab_file_path,keytab_file_owner_name,keytab_file_owner_access".to_string()];
    for (hostname, keytab_path, content) in keytabs {
        lines.push(format!("{hostname},HDFS,hdfs/{hostname}@EXAMPLE.COM,{keytab_path},hdfs,r"));
        let location = keytab_location(data_dir, hostname, keytab_path);
        fs::create_dir_all(location.parent().unwrap()).unwrap();
        fs::write(location, content).unwrap();
    }
    fs::write(data_dir.join("identity.dat"), lines.join("\n")).unwrap();
}
