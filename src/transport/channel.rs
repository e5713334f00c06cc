use tokio::sync::mpsc;
use tokio::sync::mpsc::UnboundedReceiver;
use tokio::sync::mpsc::UnboundedSender;
use tracing::trace;
use tracing::warn;

use super::Destination;
use super::OutboundEvent;
use super::Transport;
use crate::metrics::PUBLISHED_EVENTS;
use crate::Result;
use crate::SystemError;

pub type Envelope = (Destination, OutboundEvent);

/// Transport that forwards every event into an unbounded channel.
///
/// A single channel is used for all destinations, so publish order is kept
/// globally and therefore per destination. `publish` never blocks and can be
/// called from plain threads as well as from inside a runtime.
#[derive(Debug, Clone)]
pub struct ChannelTransport {
    tx: UnboundedSender<Envelope>,
}

impl ChannelTransport {
    pub fn new() -> (Self, UnboundedReceiver<Envelope>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }
}

impl Transport for ChannelTransport {
    fn publish(
        &self,
        destination: Destination,
        event: OutboundEvent,
    ) -> Result<()> {
        let kind = event.kind();
        trace!("publish {} event to {:?}", kind, destination);
        self.tx.send((destination, event)).map_err(|e| {
            warn!("outbound channel closed, dropping {} event to {:?}", kind, e.0 .0);
            SystemError::Transport(format!("outbound channel closed while publishing {kind} event"))
        })?;
        PUBLISHED_EVENTS.with_label_values(&[kind]).inc();
        Ok(())
    }
}
