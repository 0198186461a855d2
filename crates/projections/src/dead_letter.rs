//! Dead-letter sink for messages the consumer cannot process.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use event_bus::Record;
use tokio::sync::RwLock;

use crate::Result;

/// A message that could not be projected, preserved for inspection.
#[derive(Debug, Clone)]
pub struct DeadLetter {
    /// Topic the record arrived on.
    pub topic: String,

    /// Partition key of the record.
    pub key: String,

    /// The raw payload as received.
    pub payload: serde_json::Value,

    /// Why the record was dead-lettered.
    pub reason: String,

    /// When the record was parked.
    pub received_at: DateTime<Utc>,
}

impl DeadLetter {
    /// Builds a dead letter from a record and the error that killed it.
    pub fn from_record(record: &Record, reason: impl std::fmt::Display) -> Self {
        Self {
            topic: record.topic.clone(),
            key: record.key.clone(),
            payload: record.payload.clone(),
            reason: reason.to_string(),
            received_at: Utc::now(),
        }
    }
}

/// Sink for dead letters.
///
/// Sinks preserve; they never drop. A production deployment points this at a
/// durable store or a dead-letter topic.
#[async_trait]
pub trait DeadLetterSink: Send + Sync {
    /// Parks a dead letter.
    async fn push(&self, letter: DeadLetter) -> Result<()>;
}

/// In-memory dead-letter sink for testing and local runs.
#[derive(Clone, Default)]
pub struct InMemoryDeadLetterSink {
    letters: Arc<RwLock<Vec<DeadLetter>>>,
}

impl InMemoryDeadLetterSink {
    /// Creates a new empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns all parked letters.
    pub async fn letters(&self) -> Vec<DeadLetter> {
        self.letters.read().await.clone()
    }

    /// Returns the number of parked letters.
    pub async fn len(&self) -> usize {
        self.letters.read().await.len()
    }

    /// True if nothing has been parked.
    pub async fn is_empty(&self) -> bool {
        self.letters.read().await.is_empty()
    }
}

#[async_trait]
impl DeadLetterSink for InMemoryDeadLetterSink {
    async fn push(&self, letter: DeadLetter) -> Result<()> {
        tracing::warn!(
            topic = %letter.topic,
            key = %letter.key,
            reason = %letter.reason,
            "message dead-lettered"
        );
        self.letters.write().await.push(letter);
        Ok(())
    }
}
