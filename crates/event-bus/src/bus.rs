use std::time::Duration;

use async_trait::async_trait;

use crate::Result;

/// A message on the durable log.
///
/// `partition` and `offset` identify the record's position for offset
/// commits; consumers treat them as opaque.
#[derive(Debug, Clone)]
pub struct Record {
    /// Logical topic, one per event variant (e.g. "FundsDeposited").
    pub topic: String,

    /// Partition key; the aggregate identifier on this log.
    pub key: String,

    /// The serialized event envelope.
    pub payload: serde_json::Value,

    /// Partition the record was routed to by its key.
    pub partition: usize,

    /// Position of the record within its partition.
    pub offset: u64,
}

/// A consumer-group subscription over a set of topics.
///
/// Polling is the only way to receive records; a record remains owned by the
/// group until [`Subscription::commit`] advances past it, so an uncommitted
/// record is redelivered when the group resubscribes (at-least-once).
#[async_trait]
pub trait Subscription: Send {
    /// Blocking poll for the next record.
    ///
    /// Returns `None` when `timeout` elapses with nothing to deliver; an
    /// empty poll is not an error, callers simply poll again.
    async fn poll(&mut self, timeout: Duration) -> Result<Option<Record>>;

    /// Commits the group's read position past this record.
    ///
    /// Must be called only after the record's side effects are durable;
    /// committing first turns a crash into message loss.
    async fn commit(&mut self, record: &Record) -> Result<()>;

    /// Closes the subscription. Subsequent polls fail with `Closed`.
    async fn close(&mut self) -> Result<()>;
}

/// A partitioned, durable, at-least-once event log.
///
/// Records sharing a key land in the same partition and are delivered in
/// publish order; no ordering exists across keys.
#[async_trait]
pub trait EventBus: Send + Sync {
    /// Publishes a record to a topic, routed by key.
    async fn publish(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<()>;

    /// Subscribes a consumer group to a set of topics.
    ///
    /// The subscription resumes from the group's last committed offsets.
    async fn subscribe(&self, topics: &[String], group: &str) -> Result<Box<dyn Subscription>>;
}
