use async_trait::async_trait;
use event_store::EventEnvelope;

use crate::{EventBus, Result};

/// Write-side port for forwarding committed events onto the durable log.
///
/// Called by the command handler after a successful event-store append;
/// never before, so nothing unconfirmed reaches the read side.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Publishes the envelopes in order, one record per event.
    async fn publish(&self, events: &[EventEnvelope]) -> Result<()>;
}

/// Publisher backed by an [`EventBus`].
///
/// Topic = event variant name, key = aggregate identifier; a key-ordered log
/// then preserves per-account ordering end to end.
#[derive(Clone)]
pub struct BusEventPublisher<B: EventBus> {
    bus: B,
}

impl<B: EventBus> BusEventPublisher<B> {
    /// Creates a publisher over the given bus.
    pub fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Returns a reference to the underlying bus.
    pub fn bus(&self) -> &B {
        &self.bus
    }
}

#[async_trait]
impl<B: EventBus> EventPublisher for BusEventPublisher<B> {
    async fn publish(&self, events: &[EventEnvelope]) -> Result<()> {
        for event in events {
            let payload = serde_json::to_value(event)?;
            self.bus
                .publish(&event.event_type, event.aggregate_id.as_str(), payload)
                .await?;
            tracing::debug!(
                topic = %event.event_type,
                key = %event.aggregate_id,
                version = %event.version,
                "event published"
            );
            metrics::counter!("events_published_total").increment(1);
        }
        Ok(())
    }
}
