//! Outbound side of the controller: where holder events and command batches
//! are handed off for delivery to agents.
//!
//! Delivery semantics belong to the [`Transport`] implementation. The only
//! guarantee this crate relies on is per-destination ordering for events
//! published by the same caller.
mod channel;
pub use channel::*;

#[cfg(test)]
mod channel_test;

#[cfg(test)]
use mockall::automock;
use serde::Serialize;

use crate::ExecutionCommandEvent;
use crate::HostConfigs;
use crate::HostId;
use crate::Result;
use crate::TopologyCluster;
use crate::UpdateEvent;

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Destination {
    /// Every connected agent subscribed to `topic`
    Broadcast { topic: String },
    /// The agent running on `host_id`
    Host { host_id: HostId, topic: String },
}

impl Destination {
    pub fn broadcast(topic: impl Into<String>) -> Self {
        Destination::Broadcast {
            topic: topic.into(),
        }
    }

    pub fn host(
        host_id: HostId,
        topic: impl Into<String>,
    ) -> Self {
        Destination::Host {
            host_id,
            topic: topic.into(),
        }
    }
}

/// Agent-facing payloads. Topology events are always sanitized copies.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum OutboundEvent {
    Topology(UpdateEvent<TopologyCluster>),
    Configs(UpdateEvent<HostConfigs>),
    Commands(ExecutionCommandEvent),
}

impl OutboundEvent {
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundEvent::Topology(_) => "topology",
            OutboundEvent::Configs(_) => "configs",
            OutboundEvent::Commands(_) => "commands",
        }
    }
}

#[cfg_attr(test, automock)]
pub trait Transport: Send + Sync + 'static {
    /// Enqueues `event` for delivery to `destination`.
    ///
    /// Events published by one caller for the same destination must be
    /// delivered in publish order.
    ///
    /// # Errors
    /// Returns [`SystemError::Transport`](crate::SystemError::Transport) if
    /// the event cannot be enqueued.
    fn publish(
        &self,
        destination: Destination,
        event: OutboundEvent,
    ) -> Result<()>;
}
