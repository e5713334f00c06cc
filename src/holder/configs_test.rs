use std::collections::BTreeMap;
use std::sync::Arc;

use tokio::sync::mpsc::UnboundedReceiver;

use super::*;
use crate::ChannelTransport;
use crate::ClusterConfigs;
use crate::ClusterView;
use crate::ConfigsConfig;
use crate::Envelope;
use crate::Error;
use crate::HostConfigs;
use crate::HostId;
use crate::InMemoryRegistry;
use crate::MockClusterRegistry;
use crate::TopologyHost;

fn host_configs(
    timestamp: u64,
    tag: &str,
) -> HostConfigs {
    let mut configs = HostConfigs::default()
        .with_cluster("1", ClusterConfigs::default().with_property("core-site", "fs.tag", tag));
    configs.timestamp = timestamp;
    configs
}

/// Source answering for hosts 10, 11 and 12
fn source(tag: &'static str) -> MockDataSource<HostConfigs> {
    let mut source = MockDataSource::<HostConfigs>::new();
    source
        .expect_scopes()
        .returning(|| Ok(vec!["10".to_string(), "11".to_string(), "12".to_string()]));
    source.expect_fetch().returning(move |scope: &str| match scope {
        "10" | "11" | "12" => Ok(host_configs(1, tag)),
        _ => Err(StateError::ScopeUnavailable {
            scope: scope.to_string(),
            reason: "host not registered".to_string(),
        }
        .into()),
    });
    source
}

fn registry() -> Arc<InMemoryRegistry> {
    let registry = InMemoryRegistry::new();
    registry.upsert_cluster(ClusterView {
        cluster_id: 1,
        cluster_name: "c1".to_string(),
        hosts: vec![TopologyHost::new(10, "h10"), TopologyHost::new(11, "h11")],
        components: vec![],
    });
    registry.upsert_cluster(ClusterView {
        cluster_id: 2,
        cluster_name: "empty".to_string(),
        ..Default::default()
    });
    registry.register_host(12, "h12");
    Arc::new(registry)
}

fn holder(tag: &'static str) -> (ConfigHolder, UnboundedReceiver<Envelope>) {
    let (transport, rx) = ChannelTransport::new();
    let holder = ConfigHolder::new(&ConfigsConfig::default(), Arc::new(source(tag)), registry(), Arc::new(transport));
    (holder, rx)
}

fn drain(rx: &mut UnboundedReceiver<Envelope>) -> BTreeMap<HostId, UpdateEvent<HostConfigs>> {
    let mut received = BTreeMap::new();
    while let Ok((destination, event)) = rx.try_recv() {
        match (destination, event) {
            (Destination::Host { host_id, topic }, OutboundEvent::Configs(event)) => {
                assert_eq!(topic, "/user/configs");
                received.insert(host_id, event);
            }
            other => panic!("unexpected envelope {other:?}"),
        }
    }
    received
}

#[test]
fn every_host_gets_its_own_event_and_fingerprint() {
    let (holder, mut rx) = holder("a");

    let update = UpdateEvent::single("10", host_configs(1, "x"), EventType::Update)
        .with_scope("11", host_configs(1, "y"));
    assert!(holder.update_data(update).unwrap());

    let received = drain(&mut rx);
    assert_eq!(received.keys().copied().collect::<Vec<_>>(), vec![10, 11]);
    let for_10 = &received[&10];
    assert_eq!(for_10.scopes.keys().collect::<Vec<_>>(), vec!["10"]);
    assert_eq!(
        for_10.fingerprint,
        Some(scope_fingerprint(&host_configs(1, "x")).unwrap())
    );
    assert_ne!(received[&10].fingerprint, received[&11].fingerprint);
}

#[test]
fn host_update_if_changed_compares_against_host_fingerprint() {
    let (holder, _rx) = holder("a");
    holder.update_host(10, host_configs(5, "x")).unwrap();

    let current = scope_fingerprint(&host_configs(5, "x")).unwrap();
    assert!(holder.host_update_if_changed(10, &current).unwrap().is_no_op());

    let stale = holder.host_update_if_changed(10, "old").unwrap();
    assert_eq!(stale.event_type, EventType::Create);
    assert_eq!(stale.scopes["10"], host_configs(5, "x"));
    assert_eq!(stale.fingerprint, Some(current));
}

#[test]
fn host_update_if_changed_loads_unknown_host() {
    let (holder, mut rx) = holder("loaded");

    let update = holder.host_update_if_changed(12, "").unwrap();

    assert_eq!(update.scopes["12"], host_configs(1, "loaded"));
    assert_eq!(holder.host(12), Some(host_configs(1, "loaded")));
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn refresh_hosts_without_ids_covers_the_cluster() {
    let (holder, mut rx) = holder("fresh");

    assert_eq!(holder.refresh_hosts(1, &[]).unwrap(), 2);

    assert_eq!(drain(&mut rx).keys().copied().collect::<Vec<_>>(), vec![10, 11]);
    assert!(holder.host(12).is_none());
}

#[test]
fn refresh_hosts_of_cluster_without_hosts_covers_every_host() {
    let (holder, mut rx) = holder("fresh");

    assert_eq!(holder.refresh_hosts(2, &[]).unwrap(), 3);

    assert_eq!(drain(&mut rx).len(), 3);
}

#[test]
fn refresh_hosts_with_ids_only_touches_those_hosts() {
    let (holder, mut rx) = holder("fresh");

    assert_eq!(holder.refresh_hosts(1, &[12]).unwrap(), 1);

    assert_eq!(drain(&mut rx).keys().copied().collect::<Vec<_>>(), vec![12]);
}

#[test]
fn refresh_hosts_of_unknown_cluster_fails() {
    let (holder, mut rx) = holder("fresh");

    assert!(matches!(
        holder.refresh_hosts(99, &[]),
        Err(Error::State(StateError::ScopeNotFound { .. }))
    ));
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn refresh_hosts_fetches_everything_before_applying() {
    let (holder, mut rx) = holder("fresh");

    let err = holder.refresh_hosts(1, &[10, 404]).unwrap_err();

    assert!(err.is_scope_unavailable());
    assert!(holder.host(10).is_none());
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn remove_host_drops_its_snapshot() {
    let (holder, mut rx) = holder("a");
    holder.update_host(11, host_configs(1, "x")).unwrap();
    let _ = drain(&mut rx);

    assert!(holder.remove_host(11).unwrap());
    assert!(holder.host(11).is_none());
    assert_eq!(holder.fingerprint(), "");

    assert!(holder.remove_host(11).unwrap_err().is_scope_not_found());
}

#[test]
fn non_numeric_scope_rejects_the_whole_update() {
    let mut registry = MockClusterRegistry::new();
    registry.expect_cluster().never();
    let (transport, mut rx) = ChannelTransport::new();
    let holder = ConfigHolder::new(
        &ConfigsConfig::default(),
        Arc::new(source("a")),
        Arc::new(registry),
        Arc::new(transport),
    );

    let update = UpdateEvent::single("10", host_configs(1, "x"), EventType::Update)
        .with_scope("host-a", host_configs(1, "y"));
    let err = holder.update_data(update).unwrap_err();

    assert!(matches!(err, Error::State(StateError::InvalidScope { ref scope }) if scope == "host-a"));
    assert!(holder.host(10).is_none());
    assert_eq!(holder.fingerprint(), "");
    assert!(drain(&mut rx).is_empty());
}

#[test]
fn debug_output_describes_held_state() {
    let (holder, _rx) = holder("a");
    holder.update_host(10, host_configs(1, "x")).unwrap();

    let printed = format!("{holder:?}");

    assert!(printed.starts_with("ConfigHolder"));
    assert!(printed.contains("\"configs\""));
    assert!(printed.contains(&holder.fingerprint()));
}
