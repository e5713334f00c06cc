use super::*;
use crate::TopologyHost;

fn cluster(
    id: i64,
    name: &str,
    hosts: &[(i64, &str)],
) -> ClusterView {
    ClusterView {
        cluster_id: id,
        cluster_name: name.to_string(),
        hosts: hosts
            .iter()
            .map(|(host_id, host_name)| TopologyHost::new(*host_id, *host_name))
            .collect(),
        components: vec![],
    }
}

#[test]
fn upsert_cluster_registers_its_hosts() {
    let registry = InMemoryRegistry::new();
    registry.upsert_cluster(cluster(1, "c1", &[(10, "h10"), (11, "h11")]));
    registry.register_host(12, "h12");

    assert_eq!(registry.cluster_ids(), vec![1]);
    assert_eq!(registry.cluster_id_by_name("c1"), Some(1));
    assert_eq!(registry.cluster_id_by_name("missing"), None);
    assert_eq!(registry.host_name(11).as_deref(), Some("h11"));
    assert_eq!(registry.host_ids(), vec![10, 11, 12]);
}

#[test]
fn removed_cluster_is_no_longer_resolvable() {
    let registry = InMemoryRegistry::new();
    registry.upsert_cluster(cluster(2, "c2", &[]));

    assert!(registry.remove_cluster(2).is_some());
    assert!(registry.cluster(2).is_none());
    assert!(registry.cluster_ids().is_empty());
}

#[test]
fn task_lookup_returns_recorded_stage_cluster() {
    let registry = InMemoryRegistry::new();
    registry.record_task(100, 2);

    assert_eq!(registry.stage_cluster_id(100), Some(2));
    assert_eq!(registry.stage_cluster_id(101), None);
}
