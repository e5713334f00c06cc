use lazy_static::lazy_static;
use prometheus::Encoder;
use prometheus::IntCounterVec;
use prometheus::Opts;
use prometheus::Registry;
use tracing::error;

#[cfg(test)]
mod metrics_test;

lazy_static! {
    pub static ref HOLDER_UPDATES: IntCounterVec = IntCounterVec::new(
        Opts::new("holder_updates_total", "Updates applied to a state holder"),
        &["holder", "changed"]
    )
    .expect("metric can not be created");

    pub static ref PUBLISHED_EVENTS: IntCounterVec = IntCounterVec::new(
        Opts::new("published_events_total", "Events handed to the transport"),
        &["kind"]
    )
    .expect("metric can not be created");

    pub static ref INJECTED_KEYTABS: IntCounterVec = IntCounterVec::new(
        Opts::new("injected_keytabs_total", "Keytab entries attached to agent commands"),
        &["action"]
    )
    .expect("metric can not be created");
}

/// Registers every collector of this crate on `registry`
pub fn register_custom_metrics(registry: &Registry) -> prometheus::Result<()> {
    registry.register(Box::new(HOLDER_UPDATES.clone()))?;
    registry.register(Box::new(PUBLISHED_EVENTS.clone()))?;
    registry.register(Box::new(INJECTED_KEYTABS.clone()))?;
    Ok(())
}

/// Renders `registry` in the Prometheus text format
pub fn gather_text(registry: &Registry) -> String {
    let encoder = prometheus::TextEncoder::new();
    let mut buffer = Vec::new();
    if let Err(e) = encoder.encode(&registry.gather(), &mut buffer) {
        error!("could not encode custom metrics: {}", e);
    }
    match String::from_utf8(buffer) {
        Ok(v) => v,
        Err(e) => {
            error!("custom metrics could not be from_utf8'd: {}", e);
            String::default()
        }
    }
}
