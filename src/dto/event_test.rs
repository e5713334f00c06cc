use serde_json::json;

use super::*;

#[test]
fn update_event_serializes_scopes_under_clusters() {
    let event = UpdateEvent::single(
        "1",
        TopologyCluster::new(
            vec![TopologyComponent::new("DATANODE", "HDFS").with_host_ids([3])],
            vec![TopologyHost::new(3, "h3").with_ipv4("10.0.0.3")],
        ),
        EventType::Create,
    )
    .with_fingerprint("abc");

    let value = serde_json::to_value(&event).unwrap();

    assert_eq!(
        value,
        json!({
            "clusters": {
                "1": {
                    "components": [
                        { "componentName": "DATANODE", "serviceName": "HDFS", "hostIds": [3] }
                    ],
                    "hosts": [
                        { "hostId": 3, "hostName": "h3", "ipv4": "10.0.0.3" }
                    ]
                }
            },
            "eventType": "CREATE",
            "fingerprint": "abc"
        })
    );
}

#[test]
fn update_event_round_trips_delete_type() {
    let raw = r#"{"clusters":{"7":{}},"eventType":"DELETE"}"#;

    let event: UpdateEvent<TopologyCluster> = serde_json::from_str(raw).unwrap();

    assert_eq!(event.event_type, EventType::Delete);
    assert!(event.scopes["7"].is_empty());
    assert!(event.fingerprint.is_none());
}

#[test]
fn no_op_event_carries_no_work() {
    let event: UpdateEvent<HostConfigs> = UpdateEvent::no_op();

    assert!(event.is_no_op());
    assert!(!UpdateEvent::single("1", HostConfigs::default(), EventType::Update).is_no_op());
}

#[test]
fn emptied_state_is_not_a_no_op() {
    let event: UpdateEvent<HostConfigs> = UpdateEvent::new(EventType::Create).with_fingerprint("");

    assert!(!event.is_no_op());
}
