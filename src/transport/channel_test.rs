use std::collections::BTreeMap;
use std::thread;

use super::*;
use crate::Error;
use crate::ExecutionCommandEvent;
use crate::SystemError;

fn commands_for(host_id: i64) -> OutboundEvent {
    OutboundEvent::Commands(ExecutionCommandEvent {
        host_id,
        clusters: BTreeMap::new(),
    })
}

#[tokio::test]
async fn events_from_one_publisher_arrive_in_publish_order() {
    let (transport, mut rx) = ChannelTransport::new();

    for host_id in [3, 1, 2] {
        transport
            .publish(Destination::host(host_id, "/user/commands"), commands_for(host_id))
            .unwrap();
    }

    let mut received = vec![];
    for _ in 0..3 {
        let (destination, _) = rx.recv().await.unwrap();
        received.push(destination);
    }
    assert_eq!(
        received,
        vec![
            Destination::host(3, "/user/commands"),
            Destination::host(1, "/user/commands"),
            Destination::host(2, "/user/commands"),
        ]
    );
}

#[tokio::test]
async fn publish_from_plain_threads_does_not_block() {
    let (transport, mut rx) = ChannelTransport::new();

    thread::scope(|s| {
        for host_id in 0..4 {
            let transport = transport.clone();
            s.spawn(move || {
                transport
                    .publish(Destination::host(host_id, "/user/commands"), commands_for(host_id))
                    .unwrap();
            });
        }
    });

    let mut hosts = vec![];
    while let Ok((_, OutboundEvent::Commands(event))) = rx.try_recv() {
        hosts.push(event.host_id);
    }
    hosts.sort_unstable();
    assert_eq!(hosts, vec![0, 1, 2, 3]);
}

#[test]
fn publish_fails_once_receiver_is_dropped() {
    let (transport, rx) = ChannelTransport::new();
    drop(rx);

    let result = transport.publish(Destination::broadcast("/events/topologies"), commands_for(1));

    assert!(matches!(
        result,
        Err(Error::System(SystemError::Transport(_)))
    ));
}
