use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::{Notify, RwLock};

use crate::{
    EventBusError, Result,
    bus::{EventBus, Record, Subscription},
};

const DEFAULT_PARTITIONS: usize = 4;

#[derive(Default)]
struct BusState {
    /// Per topic, a fixed set of append-only partition logs.
    topics: HashMap<String, Vec<Vec<Record>>>,

    /// Committed read positions: group -> (topic, partition) -> next offset.
    committed: HashMap<String, HashMap<(String, usize), u64>>,
}

/// In-memory partitioned event bus for testing and local runs.
///
/// Mirrors the delivery contract of a keyed broker: records with the same
/// key share a partition and arrive in publish order, offsets are committed
/// per consumer group, and an uncommitted record is delivered again to the
/// group's next subscription.
#[derive(Clone)]
pub struct InMemoryEventBus {
    partitions: usize,
    state: Arc<RwLock<BusState>>,
    notify: Arc<Notify>,
}

impl InMemoryEventBus {
    /// Creates a bus with the default partition count.
    pub fn new() -> Self {
        Self::with_partitions(DEFAULT_PARTITIONS)
    }

    /// Creates a bus with an explicit partition count.
    pub fn with_partitions(partitions: usize) -> Self {
        Self {
            partitions: partitions.max(1),
            state: Arc::new(RwLock::new(BusState::default())),
            notify: Arc::new(Notify::new()),
        }
    }

    /// Returns the total number of records across all topics.
    pub async fn record_count(&self) -> usize {
        let state = self.state.read().await;
        state
            .topics
            .values()
            .flat_map(|partitions| partitions.iter())
            .map(|log| log.len())
            .sum()
    }

    fn partition_for(&self, key: &str) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.partitions
    }
}

impl Default for InMemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for InMemoryEventBus {
    async fn publish(&self, topic: &str, key: &str, payload: serde_json::Value) -> Result<()> {
        let partition = self.partition_for(key);

        let mut state = self.state.write().await;
        let logs = state
            .topics
            .entry(topic.to_string())
            .or_insert_with(|| vec![Vec::new(); self.partitions]);

        let offset = logs[partition].len() as u64;
        logs[partition].push(Record {
            topic: topic.to_string(),
            key: key.to_string(),
            payload,
            partition,
            offset,
        });
        drop(state);

        self.notify.notify_waiters();
        Ok(())
    }

    async fn subscribe(&self, topics: &[String], group: &str) -> Result<Box<dyn Subscription>> {
        // Start each (topic, partition) cursor from the group's committed
        // offset so uncommitted records are delivered again.
        let state = self.state.read().await;
        let committed = state.committed.get(group).cloned().unwrap_or_default();
        drop(state);

        let mut positions = HashMap::new();
        for topic in topics {
            for partition in 0..self.partitions {
                let key = (topic.clone(), partition);
                let offset = committed.get(&key).copied().unwrap_or(0);
                positions.insert(key, offset);
            }
        }

        Ok(Box::new(InMemorySubscription {
            bus: self.clone(),
            topics: topics.to_vec(),
            group: group.to_string(),
            positions,
            closed: false,
        }))
    }
}

/// Subscription over the in-memory bus, holding per-partition cursors.
struct InMemorySubscription {
    bus: InMemoryEventBus,
    topics: Vec<String>,
    group: String,
    positions: HashMap<(String, usize), u64>,
    closed: bool,
}

impl InMemorySubscription {
    async fn try_fetch(&mut self) -> Option<Record> {
        let found = {
            let state = self.bus.state.read().await;
            let mut found = None;
            'topics: for topic in &self.topics {
                let Some(logs) = state.topics.get(topic) else {
                    continue;
                };
                for (partition, log) in logs.iter().enumerate() {
                    let cursor = self
                        .positions
                        .get(&(topic.clone(), partition))
                        .copied()
                        .unwrap_or(0);
                    if let Some(record) = log.get(cursor as usize) {
                        found = Some((topic.clone(), partition, cursor, record.clone()));
                        break 'topics;
                    }
                }
            }
            found
        };

        let (topic, partition, cursor, record) = found?;
        self.positions.insert((topic, partition), cursor + 1);
        Some(record)
    }
}

#[async_trait]
impl Subscription for InMemorySubscription {
    async fn poll(&mut self, timeout: Duration) -> Result<Option<Record>> {
        if self.closed {
            return Err(EventBusError::Closed);
        }

        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            // Register for wakeups before checking, so a publish racing the
            // check cannot be missed.
            let notify = self.bus.notify.clone();
            let notified = notify.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(record) = self.try_fetch().await {
                return Ok(Some(record));
            }

            if tokio::time::timeout_at(deadline, notified).await.is_err() {
                return Ok(None);
            }
        }
    }

    async fn commit(&mut self, record: &Record) -> Result<()> {
        if self.closed {
            return Err(EventBusError::Closed);
        }

        let mut state = self.bus.state.write().await;
        state
            .committed
            .entry(self.group.clone())
            .or_default()
            .insert(
                (record.topic.clone(), record.partition),
                record.offset + 1,
            );
        Ok(())
    }

    async fn close(&mut self) -> Result<()> {
        self.closed = true;
        Ok(())
    }
}
